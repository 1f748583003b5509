//! T3MS decoding, for inspection and for checking compiler output.

use crate::error::CompileError;
use crate::t3ms_writer::{MAGIC, NORMAL_SCALE, TRIANGLES_COMMAND, UV_SCALE, VERTICES_COMMAND};
use crate::types::{Command, MAX_BATCH_SIZE, VERTEX_PAIR_SIZE};

/// One vertex as stored in the vertex table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedVertex {
    pub position: [i16; 3],
    /// Sign-extended 5-bit normal components.
    pub normal: [i8; 3],
    pub color: [u8; 4],
    pub uv: [i16; 2],
}

impl PackedVertex {
    /// Position back in model space.
    pub fn position_f32(&self, fixed_point_scale: f32) -> [f32; 3] {
        self.position.map(|p| p as f32 / fixed_point_scale)
    }

    pub fn normal_f32(&self) -> [f32; 3] {
        self.normal.map(|n| n as f32 / NORMAL_SCALE)
    }

    pub fn color_f32(&self) -> [f32; 4] {
        self.color.map(|c| c as f32 / 255.0)
    }

    pub fn uv_f32(&self) -> [f32; 2] {
        self.uv.map(|t| t as f32 / UV_SCALE)
    }
}

/// Decoded T3MS file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct T3msFile {
    pub vertex_pairs: Vec<[PackedVertex; 2]>,
    pub commands: Vec<Command>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], CompileError> {
        let end = self.pos + len;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            CompileError::Decode(format!("truncated {} at byte {}", what, self.pos))
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8, CompileError> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16, CompileError> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}

/// Sign-extend the three 5-bit fields of a packed normal.
pub fn unpack_normal(word: u16) -> [i8; 3] {
    let field = |shift: u16| {
        let raw = ((word >> shift) & 0b11111) as i8;
        (raw << 3) >> 3
    };
    [field(10), field(5), field(0)]
}

fn be_i16(b: &[u8]) -> i16 {
    i16::from_be_bytes([b[0], b[1]])
}

fn unpack_pair(record: &[u8]) -> [PackedVertex; 2] {
    let vertex = |pos: usize, color: usize, uv: usize| PackedVertex {
        position: [
            be_i16(&record[pos..]),
            be_i16(&record[pos + 2..]),
            be_i16(&record[pos + 4..]),
        ],
        normal: unpack_normal(u16::from_be_bytes([record[pos + 6], record[pos + 7]])),
        color: [
            record[color],
            record[color + 1],
            record[color + 2],
            record[color + 3],
        ],
        uv: [be_i16(&record[uv..]), be_i16(&record[uv + 2..])],
    };
    [vertex(0, 16, 24), vertex(8, 20, 28)]
}

/// Parse a T3MS byte stream.
pub fn decode_t3ms(bytes: &[u8]) -> Result<T3msFile, CompileError> {
    let mut reader = Reader { bytes, pos: 0 };

    if reader.take(4, "magic")? != MAGIC {
        return Err(CompileError::Decode("missing T3MS magic".to_string()));
    }

    let pair_count = reader.u16("vertex pair count")? as usize;
    let mut vertex_pairs = Vec::with_capacity(pair_count);
    for _ in 0..pair_count {
        vertex_pairs.push(unpack_pair(reader.take(VERTEX_PAIR_SIZE, "vertex pair")?));
    }

    let command_count = reader.u16("command count")? as usize;
    let mut commands = Vec::with_capacity(command_count);
    for _ in 0..command_count {
        let command = match reader.u8("command tag")? {
            VERTICES_COMMAND => Command::Vertices {
                offset: reader.u8("VERTICES offset")?,
                pair_count: reader.u8("VERTICES pair count")?,
                source_index: reader.u16("VERTICES source index")?,
            },
            TRIANGLES_COMMAND => {
                let count = reader.u8("TRIANGLES count")? as usize;
                let data = reader.take(count * 3, "TRIANGLES slots")?;
                Command::Triangles {
                    slots: data.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect(),
                }
            }
            tag => {
                return Err(CompileError::Decode(format!(
                    "unknown command tag {} at byte {}",
                    tag,
                    reader.pos - 1
                )))
            }
        };
        commands.push(command);
    }

    if reader.pos != bytes.len() {
        return Err(CompileError::Decode(format!(
            "{} trailing bytes after command list",
            bytes.len() - reader.pos
        )));
    }

    Ok(T3msFile {
        vertex_pairs,
        commands,
    })
}

impl T3msFile {
    /// Replay the command stream against a simulated vertex buffer and
    /// return, per TRIANGLES command, the vertices each triangle draws.
    pub fn replay(&self) -> Result<Vec<Vec<[PackedVertex; 3]>>, CompileError> {
        let mut slots: [Option<PackedVertex>; MAX_BATCH_SIZE] = [None; MAX_BATCH_SIZE];
        let mut draws = Vec::new();

        for command in &self.commands {
            match command {
                Command::Vertices {
                    offset,
                    pair_count,
                    source_index,
                } => {
                    let start = *source_index as usize;
                    let pairs = self
                        .vertex_pairs
                        .get(start..start + *pair_count as usize)
                        .ok_or_else(|| {
                            CompileError::Decode(format!(
                                "VERTICES reads pairs {}..{} of {}",
                                start,
                                start + *pair_count as usize,
                                self.vertex_pairs.len()
                            ))
                        })?;
                    for (i, vertex) in pairs.iter().flatten().enumerate() {
                        let slot = *offset as usize + i;
                        let target = slots.get_mut(slot).ok_or_else(|| {
                            CompileError::Decode(format!("VERTICES writes past slot {}", slot))
                        })?;
                        *target = Some(*vertex);
                    }
                }
                Command::Triangles { slots: triangles } => {
                    let mut drawn = Vec::with_capacity(triangles.len());
                    for triangle in triangles {
                        let mut vertices = [PackedVertex::default(); 3];
                        for (out, &slot) in vertices.iter_mut().zip(triangle) {
                            *out = slots
                                .get(slot as usize)
                                .copied()
                                .flatten()
                                .ok_or_else(|| {
                                    CompileError::Decode(format!("triangle reads empty slot {}", slot))
                                })?;
                        }
                        drawn.push(vertices);
                    }
                    draws.push(drawn);
                }
            }
        }

        Ok(draws)
    }
}
