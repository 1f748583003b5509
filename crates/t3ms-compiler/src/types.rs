use crate::error::CompileError;
use crate::material::Material;

/// Hardware vertex buffer capacity. The slot layout assumes exactly this many
/// slots, so it is not a tunable.
pub const MAX_BATCH_SIZE: usize = 64;

/// Size of one vertex pair record in the T3MS vertex table.
pub const VERTEX_PAIR_SIZE: usize = 32;

/// Export settings consumed by the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    /// Multiplier applied to model-space positions before truncation to i16.
    pub fixed_point_scale: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fixed_point_scale: 64.0,
        }
    }
}

/// Triangle mesh with per-vertex attribute arrays (all the same length) and
/// a flat triangle-list index buffer.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Position (x, y, z) in model space.
    pub positions: Vec<[f32; 3]>,
    /// Unit normal (x, y, z).
    pub normals: Vec<[f32; 3]>,
    /// RGBA color, each channel in `[0, 1]`.
    pub colors: Vec<[f32; 4]>,
    /// Texture coordinates (u, v).
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list; each consecutive triple is one triangle.
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The three vertex indices of the triangle starting at index offset `triangle`.
    pub fn triangle_vertices(&self, triangle: usize) -> [u32; 3] {
        [
            self.indices[triangle],
            self.indices[triangle + 1],
            self.indices[triangle + 2],
        ]
    }

    /// Check attribute lengths and index bounds.
    ///
    /// Everything downstream indexes attribute arrays directly, so a mesh
    /// must pass this before it is scheduled.
    pub fn validate(&self) -> Result<(), CompileError> {
        let count = self.positions.len();
        let lengths = [
            ("normals", self.normals.len()),
            ("colors", self.colors.len()),
            ("uvs", self.uvs.len()),
        ];
        for (name, len) in lengths {
            if len != count {
                return Err(CompileError::MalformedMesh(format!(
                    "{} has {} entries but there are {} positions",
                    name, len, count
                )));
            }
        }

        if self.indices.len() % 3 != 0 {
            return Err(CompileError::MalformedMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }

        if let Some((at, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= count)
        {
            return Err(CompileError::MalformedMesh(format!(
                "index {} at offset {} is out of range for {} vertices",
                index, at, count
            )));
        }

        Ok(())
    }
}

/// One mesh chunk with its resolved material, in final draw order.
#[derive(Debug, Clone)]
pub struct MeshChunk {
    /// Source object name (for logging).
    pub name: String,
    pub mesh: MeshData,
    pub material: Material,
}

/// One command in the T3MS command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load `pair_count` vertex pairs from the vertex table, starting at pair
    /// record `source_index`, into slots beginning at `offset`.
    Vertices {
        offset: u8,
        pair_count: u8,
        source_index: u16,
    },
    /// Draw triangles from resident slots.
    Triangles { slots: Vec<[u8; 3]> },
}

/// Counters gathered while compiling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileStats {
    pub chunk_count: usize,
    pub triangle_count: usize,
    pub batch_count: usize,
    /// Vertices uploaded across all batches (excluding pair padding).
    pub loaded_vertex_count: usize,
    /// Estimated material state-change cost over the chunk order.
    pub state_change_cost: f32,
}

/// Fully compiled mesh: file-wide vertex table and command stream.
#[derive(Debug, Clone, Default)]
pub struct CompiledMesh {
    pub vertex_pairs: Vec<[u8; VERTEX_PAIR_SIZE]>,
    pub commands: Vec<Command>,
    pub stats: CompileStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_mesh() -> MeshData {
        MeshData {
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 1.0, 0.0]; 3],
            colors: vec![[1.0; 4]; 3],
            uvs: vec![[0.0; 2]; 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(triangle_mesh().validate().is_ok());
    }

    #[test]
    fn test_validate_index_out_of_range() {
        let mut mesh = triangle_mesh();
        mesh.indices[2] = 3;
        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, CompileError::MalformedMesh(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_validate_attribute_mismatch() {
        let mut mesh = triangle_mesh();
        mesh.colors.pop();
        let err = mesh.validate().unwrap_err();
        assert!(err.to_string().contains("colors"));
    }

    #[test]
    fn test_validate_partial_triangle() {
        let mut mesh = triangle_mesh();
        mesh.indices.push(0);
        assert!(matches!(
            mesh.validate(),
            Err(CompileError::MalformedMesh(_))
        ));
    }
}
