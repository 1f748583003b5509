//! Material deltas and the state-change cost model.
//!
//! Costs are rough microsecond estimates per state change. They only need to
//! order candidate chunk sequences, not predict frame time.

use crate::material::{Material, MaterialDelta, Texture};

// TODO: re-measure these against the microcode; they were taken from the
// stock fixed-function driver.
pub const COMBINE_MODE_TIME: f32 = 0.395;
pub const BLEND_MODE_TIME: f32 = 0.751;
pub const COLOR_CHANGE_TIME: f32 = 0.395;
pub const CHANGE_MODE_TIME: f32 = 0.7;

/// Fixed part of binding a texture.
pub const TEXTURE_BIND_TIME: f32 = 2.0;
/// Texel count assumed for every texture load.
pub const ESTIMATED_TEXEL_COUNT: f32 = 2048.0;
/// Per-texel upload time.
pub const TEXEL_LOAD_TIME: f32 = 0.0072;

/// Field in `end` when it is set and `start` lacks it or differs.
fn changed<T: PartialEq + Clone>(start: &Option<T>, end: &Option<T>) -> Option<T> {
    match (start, end) {
        (Some(s), Some(e)) if s == e => None,
        (_, e) => e.clone(),
    }
}

/// Texture part of a delta.
///
/// Palette changes cannot be detected yet, so a texture that is set on `end`
/// always counts as changed, even when the filename matches.
fn texture_delta(_start: &Option<Texture>, end: &Option<Texture>) -> Option<Texture> {
    end.clone()
}

/// Minimal set of overrides that moves the GPU from `start` state to `end`.
pub fn material_delta(start: &Material, end: &Material) -> MaterialDelta {
    Material {
        combine_mode: changed(&start.combine_mode, &end.combine_mode),
        blend_mode: changed(&start.blend_mode, &end.blend_mode),
        env_color: changed(&start.env_color, &end.env_color),
        prim_color: changed(&start.prim_color, &end.prim_color),
        blend_color: changed(&start.blend_color, &end.blend_color),
        lighting: changed(&start.lighting, &end.lighting),
        tex0: texture_delta(&start.tex0, &end.tex0),
        tex1: texture_delta(&start.tex1, &end.tex1),
        culling: changed(&start.culling, &end.culling),
        z_buffer: changed(&start.z_buffer, &end.z_buffer),
        uv_gen: changed(&start.uv_gen, &end.uv_gen),
    }
}

/// Cost of loading one texture.
///
/// Uses a fixed texel estimate rather than the real image size.
pub fn texture_cost(texture: &Option<Texture>) -> f32 {
    match texture {
        None => 0.0,
        Some(tex) => {
            let mut cost = TEXTURE_BIND_TIME;
            if tex.filename.is_some() {
                cost += ESTIMATED_TEXEL_COUNT * TEXEL_LOAD_TIME;
            }
            cost
        }
    }
}

/// Estimated time to apply `delta`: the sum of a fixed cost per set field.
///
/// Culling, z-buffer and UV generation share one render-mode write, so they
/// are charged once between them.
pub fn material_cost(delta: &MaterialDelta) -> f32 {
    let mut cost = 0.0;

    if delta.combine_mode.is_some() {
        cost += COMBINE_MODE_TIME;
    }
    if delta.blend_mode.is_some() {
        cost += BLEND_MODE_TIME;
    }
    for color in [&delta.env_color, &delta.prim_color, &delta.blend_color] {
        if color.is_some() {
            cost += COLOR_CHANGE_TIME;
        }
    }
    if delta.lighting.is_some() {
        cost += CHANGE_MODE_TIME;
    }

    cost += texture_cost(&delta.tex0);
    cost += texture_cost(&delta.tex1);

    if delta.culling.is_some() || delta.z_buffer.is_some() || delta.uv_gen.is_some() {
        cost += CHANGE_MODE_TIME;
    }

    cost
}

/// Overwrite the fields of `into` that are set in `delta`.
pub fn apply_delta(delta: &MaterialDelta, into: &mut Material) {
    fn apply<T: Clone>(from: &Option<T>, to: &mut Option<T>) {
        if let Some(value) = from {
            *to = Some(value.clone());
        }
    }

    apply(&delta.combine_mode, &mut into.combine_mode);
    apply(&delta.blend_mode, &mut into.blend_mode);
    apply(&delta.env_color, &mut into.env_color);
    apply(&delta.prim_color, &mut into.prim_color);
    apply(&delta.blend_color, &mut into.blend_color);
    apply(&delta.lighting, &mut into.lighting);
    apply(&delta.tex0, &mut into.tex0);
    apply(&delta.tex1, &mut into.tex1);
    apply(&delta.culling, &mut into.culling);
    apply(&delta.z_buffer, &mut into.z_buffer);
    apply(&delta.uv_gen, &mut into.uv_gen);
}

/// Total state-change cost of drawing `materials` in order, starting from
/// `initial` state.
pub fn sequence_cost<'a, I>(initial: &Material, materials: I) -> f32
where
    I: IntoIterator<Item = &'a Material>,
{
    let mut state = initial.clone();
    let mut total = 0.0;

    for material in materials {
        let delta = material_delta(&state, material);
        total += material_cost(&delta);
        apply_delta(&delta, &mut state);
    }

    total
}
