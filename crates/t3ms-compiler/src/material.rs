//! Material model: the GPU state a mesh chunk is drawn with.
//!
//! Every field is optional. An unset field inherits whatever state the
//! previous draw left behind, so "unset" and "explicitly zero" stay distinct.

/// Define a closed set of named values as they appear in material JSON.
macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Accepted names, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            /// Look up a variant by its JSON name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// The JSON name of the variant.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }
    };
}

named_enum! {
    /// Color combiner input A (subtracted from).
    ColorA {
        Combined => "COMBINED",
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        Noise => "NOISE",
        One => "1",
        Zero => "0",
    }
}

named_enum! {
    /// Color combiner input B (subtracted).
    ColorB {
        Combined => "COMBINED",
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        Center => "CENTER",
        K4 => "K4",
        Zero => "0",
    }
}

named_enum! {
    /// Color combiner input C (multiplier).
    ColorC {
        Combined => "COMBINED",
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        Scale => "SCALE",
        CombinedAlpha => "COMBINED_ALPHA",
        Tex0Alpha => "TEX0_ALPHA",
        Tex1Alpha => "TEX1_ALPHA",
        PrimAlpha => "PRIM_ALPHA",
        ShadeAlpha => "SHADE_ALPHA",
        EnvAlpha => "ENV_ALPHA",
        LodFraction => "LOD_FRACTION",
        PrimLodFrac => "PRIM_LOD_FRAC",
        K5 => "K5",
        Zero => "0",
    }
}

named_enum! {
    /// Color combiner input D (added).
    ColorD {
        Combined => "COMBINED",
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        One => "1",
        Zero => "0",
    }
}

named_enum! {
    /// Alpha combiner input A.
    AlphaA {
        Combined => "COMBINED",
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        One => "1",
        Zero => "0",
    }
}

named_enum! {
    /// Alpha combiner input B.
    AlphaB {
        Combined => "COMBINED",
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        One => "1",
        Zero => "0",
    }
}

named_enum! {
    /// Alpha combiner input C.
    AlphaC {
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        LodFraction => "LOD_FRACTION",
        PrimLodFrac => "PRIM_LOD_FRAC",
        Zero => "0",
    }
}

named_enum! {
    /// Alpha combiner input D.
    AlphaD {
        Combined => "COMBINED",
        Tex0 => "TEX0",
        Tex1 => "TEX1",
        Prim => "PRIM",
        Shade => "SHADE",
        Env => "ENV",
        One => "1",
        Zero => "0",
    }
}

named_enum! {
    /// Framebuffer blending preset.
    BlendMode {
        Opaque => "OPAQUE",
        Transparent => "TRANSPARENT",
        Additive => "ADD",
        AlphaClip => "ALPHA_CLIP",
    }
}

named_enum! {
    /// Texture coordinate generation.
    UvGen {
        /// Use the mesh UVs.
        Disabled => "NONE",
        /// Spherical environment mapping from normals.
        Sphere => "SPHERE",
    }
}

/// 8-bit RGBA constant color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// One combiner cycle: `(A - B) * C + D` for color and for alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombineModeCycle {
    pub color: (ColorA, ColorB, ColorC, ColorD),
    pub alpha: (AlphaA, AlphaB, AlphaC, AlphaD),
}

impl CombineModeCycle {
    /// Alpha inputs used when a cycle does not specify any: constant 1.
    pub const DEFAULT_ALPHA: (AlphaA, AlphaB, AlphaC, AlphaD) =
        (AlphaA::Zero, AlphaB::Zero, AlphaC::Zero, AlphaD::One);
}

/// Texture combiner configuration, one or two cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombineMode {
    pub cycle1: CombineModeCycle,
    pub cycle2: Option<CombineModeCycle>,
}

impl CombineMode {
    pub fn cycle_count(&self) -> usize {
        if self.cycle2.is_some() {
            2
        } else {
            1
        }
    }
}

/// A texture binding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Texture {
    /// Source image; `None` binds a texture slot without loading new texels.
    pub filename: Option<String>,
}

/// Full or partial GPU material state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub combine_mode: Option<CombineMode>,
    pub blend_mode: Option<BlendMode>,
    pub env_color: Option<Color>,
    pub prim_color: Option<Color>,
    pub blend_color: Option<Color>,
    pub lighting: Option<bool>,
    pub tex0: Option<Texture>,
    pub tex1: Option<Texture>,
    pub culling: Option<bool>,
    pub z_buffer: Option<bool>,
    pub uv_gen: Option<UvGen>,
}

/// Field overrides to move from one material to another.
///
/// Same shape as [`Material`]; each set field replaces the running state.
pub type MaterialDelta = Material;

impl Material {
    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Material::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_names_round_trip() {
        for name in ColorC::NAMES {
            let op = ColorC::from_name(name).unwrap();
            assert_eq!(op.name(), *name);
        }
    }

    #[test]
    fn test_operand_slots_are_distinct() {
        // NOISE is only valid for color input A.
        assert_eq!(ColorA::from_name("NOISE"), Some(ColorA::Noise));
        assert_eq!(ColorB::from_name("NOISE"), None);
        // COMBINED is not a valid alpha multiplier.
        assert_eq!(AlphaC::from_name("COMBINED"), None);
        assert_eq!(AlphaA::from_name("COMBINED"), Some(AlphaA::Combined));
    }

    #[test]
    fn test_empty_material() {
        assert!(Material::default().is_empty());
        let material = Material {
            lighting: Some(false),
            ..Default::default()
        };
        assert!(!material.is_empty());
    }

    #[test]
    fn test_cycle_count() {
        let cycle = CombineModeCycle {
            color: (ColorA::Tex0, ColorB::Zero, ColorC::Shade, ColorD::Zero),
            alpha: CombineModeCycle::DEFAULT_ALPHA,
        };
        let one = CombineMode {
            cycle1: cycle,
            cycle2: None,
        };
        let two = CombineMode {
            cycle1: cycle,
            cycle2: Some(cycle),
        };
        assert_eq!(one.cycle_count(), 1);
        assert_eq!(two.cycle_count(), 2);
    }
}
