//! T3MS serialization: vertex quantization, command encoding and the file
//! container. All multi-byte values are big-endian.

use crate::error::CompileError;
use crate::slot_layout::{padded_len, BatchLayout};
use crate::types::{Command, CompiledMesh, ExportSettings, MeshData, VERTEX_PAIR_SIZE};
use std::io::Write;

pub const MAGIC: &[u8; 4] = b"T3MS";

pub const VERTICES_COMMAND: u8 = 0;
pub const TRIANGLES_COMMAND: u8 = 1;

/// Largest triangle count a single TRIANGLES command can carry.
pub const MAX_TRIANGLES_PER_COMMAND: usize = u8::MAX as usize;

/// Normal components map `[-1, 1]` onto 5-bit signed `[-16, 15]`.
pub const NORMAL_SCALE: f32 = 15.5;

/// UV fixed-point scale (32×32 texel reference texture, 5 fractional bits).
pub const UV_SCALE: f32 = 32.0 * 32.0;

fn to_i16(value: f32, what: &str) -> Result<i16, CompileError> {
    if value.is_finite() && (i16::MIN as f32..=i16::MAX as f32).contains(&value) {
        Ok(value as i16)
    } else {
        Err(CompileError::Quantization(format!(
            "{} {} does not fit in 16 bits",
            what, value
        )))
    }
}

/// Position as 3 × i16, scaled and truncated toward zero.
pub fn pack_position(position: [f32; 3], settings: &ExportSettings) -> Result<[u8; 6], CompileError> {
    let mut out = [0u8; 6];
    for (axis, &p) in position.iter().enumerate() {
        let fixed = to_i16((p * settings.fixed_point_scale).trunc(), "position")?;
        out[axis * 2..axis * 2 + 2].copy_from_slice(&fixed.to_be_bytes());
    }
    Ok(out)
}

/// One normal component as a 5-bit two's-complement field.
fn normal_field(n: f32) -> u16 {
    let q = (n * NORMAL_SCALE).round_ties_even().clamp(-16.0, 15.0) as i16;
    (q as u16) & 0b11111
}

/// Normal packed into one word: x in bits 10–14, y in 5–9, z in 0–4.
pub fn pack_normal(normal: [f32; 3]) -> [u8; 2] {
    let word = normal_field(normal[0]) << 10 | normal_field(normal[1]) << 5 | normal_field(normal[2]);
    word.to_be_bytes()
}

/// RGBA color, each channel scaled to 0–255 and truncated.
pub fn pack_color(color: [f32; 4]) -> Result<[u8; 4], CompileError> {
    let mut out = [0u8; 4];
    for (channel, &c) in out.iter_mut().zip(&color) {
        let scaled = (c * 255.0).trunc();
        if !(0.0..=255.0).contains(&scaled) {
            return Err(CompileError::Quantization(format!(
                "color channel {} is outside [0, 1]",
                c
            )));
        }
        *channel = scaled as u8;
    }
    Ok(out)
}

/// Texture coordinates as 2 × i16 fixed point.
///
/// Both halves are currently derived from `u`; `v` is not encoded.
// TODO: write uv[1] into the second half once the microcode's expected UV
// layout is confirmed.
pub fn pack_uv(uv: [f32; 2]) -> Result<[u8; 4], CompileError> {
    let u = to_i16((uv[0] * UV_SCALE).round_ties_even(), "uv")?;
    let mut out = [0u8; 4];
    out[0..2].copy_from_slice(&u.to_be_bytes());
    out[2..4].copy_from_slice(&u.to_be_bytes());
    Ok(out)
}

/// One 32-byte vertex pair record. A missing second vertex is zero-filled.
pub fn pack_vertex_pair(
    mesh: &MeshData,
    first: u32,
    second: Option<u32>,
    settings: &ExportSettings,
) -> Result<[u8; VERTEX_PAIR_SIZE], CompileError> {
    let mut record = [0u8; VERTEX_PAIR_SIZE];
    let a = first as usize;

    record[0..6].copy_from_slice(&pack_position(mesh.positions[a], settings)?);
    record[6..8].copy_from_slice(&pack_normal(mesh.normals[a]));
    record[16..20].copy_from_slice(&pack_color(mesh.colors[a])?);
    record[24..28].copy_from_slice(&pack_uv(mesh.uvs[a])?);

    if let Some(second) = second {
        let b = second as usize;
        record[8..14].copy_from_slice(&pack_position(mesh.positions[b], settings)?);
        record[14..16].copy_from_slice(&pack_normal(mesh.normals[b]));
        record[20..24].copy_from_slice(&pack_color(mesh.colors[b])?);
        record[28..32].copy_from_slice(&pack_uv(mesh.uvs[b])?);
    }

    Ok(record)
}

/// Append one batch's vertex records and its VERTICES + TRIANGLES commands.
pub fn emit_batch(
    layout: &BatchLayout,
    mesh: &MeshData,
    settings: &ExportSettings,
    out: &mut CompiledMesh,
) -> Result<(), CompileError> {
    let source_index = u16::try_from(out.vertex_pairs.len()).map_err(|_| {
        CompileError::Encoding(format!(
            "vertex table index {} exceeds 16 bits",
            out.vertex_pairs.len()
        ))
    })?;
    let offset = u8::try_from(layout.offset)
        .map_err(|_| CompileError::Encoding(format!("slot offset {} exceeds 8 bits", layout.offset)))?;
    let pair_count = padded_len(layout.new_indices.len()) / 2;

    out.commands.push(Command::Vertices {
        offset,
        pair_count: pair_count as u8,
        source_index,
    });

    for pair in layout.new_indices.chunks(2) {
        let record = pack_vertex_pair(mesh, pair[0], pair.get(1).copied(), settings)?;
        out.vertex_pairs.push(record);
    }

    for slots in layout.triangles.chunks(MAX_TRIANGLES_PER_COMMAND) {
        out.commands.push(Command::Triangles {
            slots: slots.to_vec(),
        });
    }

    Ok(())
}

/// Serialize one command.
pub fn encode_command(command: &Command, buf: &mut Vec<u8>) {
    match command {
        Command::Vertices {
            offset,
            pair_count,
            source_index,
        } => {
            buf.extend_from_slice(&[VERTICES_COMMAND, *offset, *pair_count]);
            buf.extend_from_slice(&source_index.to_be_bytes());
        }
        Command::Triangles { slots } => {
            buf.extend_from_slice(&[TRIANGLES_COMMAND, slots.len() as u8]);
            for triangle in slots {
                buf.extend_from_slice(triangle);
            }
        }
    }
}

fn count_u16(count: usize, what: &str) -> Result<[u8; 2], CompileError> {
    u16::try_from(count)
        .map(u16::to_be_bytes)
        .map_err(|_| CompileError::Encoding(format!("{} count {} exceeds 16 bits", what, count)))
}

/// Serialize a compiled mesh into the T3MS container.
pub fn encode_t3ms(mesh: &CompiledMesh) -> Result<Vec<u8>, CompileError> {
    let mut buf = Vec::with_capacity(8 + mesh.vertex_pairs.len() * VERTEX_PAIR_SIZE);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&count_u16(mesh.vertex_pairs.len(), "vertex pair")?);
    for record in &mesh.vertex_pairs {
        buf.extend_from_slice(record);
    }

    buf.extend_from_slice(&count_u16(mesh.commands.len(), "command")?);
    for command in &mesh.commands {
        encode_command(command, &mut buf);
    }

    Ok(buf)
}

/// Write a compiled mesh as T3MS.
pub fn write_t3ms<W: Write>(mesh: &CompiledMesh, mut writer: W) -> Result<(), CompileError> {
    let bytes = encode_t3ms(mesh)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
