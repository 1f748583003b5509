//! Material JSON loading and validation.
//!
//! Validation errors name the offending field path (e.g.
//! `combineMode[1].alpha[2]`) and the accepted values.

use crate::error::CompileError;
use crate::material::{
    AlphaA, AlphaB, AlphaC, AlphaD, BlendMode, Color, ColorA, ColorB, ColorC, ColorD, CombineMode,
    CombineModeCycle, Material, Texture, UvGen,
};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load and validate a material JSON file.
pub fn load_material(path: &Path) -> Result<Material, CompileError> {
    let text = fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&text).map_err(|e| CompileError::MaterialJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_material(&json)
}

/// Validate a parsed JSON document into a [`Material`].
///
/// Keys that are absent (or `null`) leave the field unset.
pub fn parse_material(json: &Value) -> Result<Material, CompileError> {
    let object = json
        .as_object()
        .ok_or_else(|| invalid("material", "must be a JSON object"))?;

    let field = |key: &str| object.get(key).filter(|v| !v.is_null());

    Ok(Material {
        combine_mode: field("combineMode").map(parse_combine_mode).transpose()?,
        blend_mode: field("blendMode")
            .map(|v| parse_enum(v, "blendMode", BlendMode::NAMES, BlendMode::from_name))
            .transpose()?,
        env_color: field("envColor")
            .map(|v| parse_color(v, "envColor"))
            .transpose()?,
        prim_color: field("primColor")
            .map(|v| parse_color(v, "primColor"))
            .transpose()?,
        blend_color: field("blendColor")
            .map(|v| parse_color(v, "blendColor"))
            .transpose()?,
        lighting: field("lighting")
            .map(|v| parse_bool(v, "lighting"))
            .transpose()?,
        tex0: field("tex0").map(|v| parse_texture(v, "tex0")).transpose()?,
        tex1: field("tex1").map(|v| parse_texture(v, "tex1")).transpose()?,
        culling: field("culling")
            .map(|v| parse_bool(v, "culling"))
            .transpose()?,
        z_buffer: field("zBuffer")
            .map(|v| parse_bool(v, "zBuffer"))
            .transpose()?,
        uv_gen: field("uvGen")
            .map(|v| parse_enum(v, "uvGen", UvGen::NAMES, UvGen::from_name))
            .transpose()?,
    })
}

fn invalid(path: &str, message: impl Into<String>) -> CompileError {
    CompileError::MaterialValidation {
        path: path.to_string(),
        message: message.into(),
    }
}

fn parse_enum<T>(
    value: &Value,
    path: &str,
    names: &[&str],
    lookup: fn(&str) -> Option<T>,
) -> Result<T, CompileError> {
    if let Some(found) = value.as_str().and_then(lookup) {
        return Ok(found);
    }

    let got = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    Err(invalid(
        path,
        format!(
            "is not a valid value. got '{}' expected {}",
            got,
            names.join(", ")
        ),
    ))
}

fn parse_bool(value: &Value, path: &str) -> Result<bool, CompileError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(path, "must be true or false"))
}

fn parse_color(value: &Value, path: &str) -> Result<Color, CompileError> {
    let channels = value
        .as_array()
        .filter(|a| a.len() == 4)
        .ok_or_else(|| invalid(path, "should be an array of 4 numbers [0,255]"))?;

    let mut rgba = [0u8; 4];
    for (i, channel) in channels.iter().enumerate() {
        rgba[i] = channel
            .as_u64()
            .and_then(|c| u8::try_from(c).ok())
            .ok_or_else(|| invalid(&format!("{}[{}]", path, i), "must be an int between 0 and 255"))?;
    }

    Ok(Color::new(rgba[0], rgba[1], rgba[2], rgba[3]))
}

fn parse_texture(value: &Value, path: &str) -> Result<Texture, CompileError> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid(path, "must be an object"))?;

    let filename = match object.get("filename") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => return Err(invalid(&format!("{}.filename", path), "must be a string")),
    };

    Ok(Texture { filename })
}

/// Four-element operand array of a cycle.
fn operands<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], CompileError> {
    value
        .as_array()
        .filter(|a| a.len() == 4)
        .map(|a| a.as_slice())
        .ok_or_else(|| invalid(path, "must be an array of length 4"))
}

fn parse_combine_mode_cycle(value: &Value, path: &str) -> Result<CombineModeCycle, CompileError> {
    let color_path = format!("{}.color", path);
    let color = match value.get("color") {
        None | Some(Value::Null) => return Err(invalid(&color_path, "must be defined")),
        Some(color) => operands(color, &color_path)?,
    };

    let slot = |i: usize| format!("{}[{}]", color_path, i);
    let color = (
        parse_enum(&color[0], &slot(0), ColorA::NAMES, ColorA::from_name)?,
        parse_enum(&color[1], &slot(1), ColorB::NAMES, ColorB::from_name)?,
        parse_enum(&color[2], &slot(2), ColorC::NAMES, ColorC::from_name)?,
        parse_enum(&color[3], &slot(3), ColorD::NAMES, ColorD::from_name)?,
    );

    let alpha_path = format!("{}.alpha", path);
    let alpha = match value.get("alpha") {
        None | Some(Value::Null) => CombineModeCycle::DEFAULT_ALPHA,
        Some(alpha) => {
            let alpha = operands(alpha, &alpha_path)?;
            let slot = |i: usize| format!("{}[{}]", alpha_path, i);
            (
                parse_enum(&alpha[0], &slot(0), AlphaA::NAMES, AlphaA::from_name)?,
                parse_enum(&alpha[1], &slot(1), AlphaB::NAMES, AlphaB::from_name)?,
                parse_enum(&alpha[2], &slot(2), AlphaC::NAMES, AlphaC::from_name)?,
                parse_enum(&alpha[3], &slot(3), AlphaD::NAMES, AlphaD::from_name)?,
            )
        }
    };

    Ok(CombineModeCycle { color, alpha })
}

fn parse_combine_mode(value: &Value) -> Result<CombineMode, CompileError> {
    match value {
        Value::Array(cycles) => {
            if cycles.is_empty() {
                return Err(invalid("combineMode", "must have at least one cycle"));
            }
            if cycles.len() > 2 {
                return Err(invalid("combineMode", "can only have up to two cycles"));
            }
            let cycle1 = parse_combine_mode_cycle(&cycles[0], "combineMode[0]")?;
            let cycle2 = cycles
                .get(1)
                .map(|c| parse_combine_mode_cycle(c, "combineMode[1]"))
                .transpose()?;
            Ok(CombineMode { cycle1, cycle2 })
        }
        Value::Object(_) => Ok(CombineMode {
            cycle1: parse_combine_mode_cycle(value, "combineMode")?,
            cycle2: None,
        }),
        _ => Err(invalid(
            "combineMode",
            "must be a cycle object or an array of cycles",
        )),
    }
}
