use crate::types::MeshData;
use std::collections::BTreeSet;

/// Per-vertex list of the unconsumed triangles that reference it.
///
/// Triangles are identified by the offset of their first index in the
/// mesh index buffer.
pub struct VertexUsage<'a> {
    mesh: &'a MeshData,
    /// Triangle offsets per vertex, in index-buffer order.
    usages: Vec<Vec<usize>>,
    remaining: usize,
}

impl<'a> VertexUsage<'a> {
    /// Index every triangle of a validated mesh.
    pub fn new(mesh: &'a MeshData) -> Self {
        let mut usages = vec![Vec::new(); mesh.vertex_count()];

        for triangle in (0..mesh.indices.len()).step_by(3) {
            for vertex in mesh.triangle_vertices(triangle) {
                usages[vertex as usize].push(triangle);
            }
        }

        Self {
            mesh,
            usages,
            remaining: mesh.triangle_count(),
        }
    }

    /// Remove a triangle from consideration.
    ///
    /// Does nothing if the triangle was already consumed.
    pub fn mark_triangle_used(&mut self, triangle: usize) {
        let vertices = self.mesh.triangle_vertices(triangle);
        let mut removed = false;

        for vertex in vertices {
            let list = &mut self.usages[vertex as usize];
            // A degenerate triangle lists the same vertex more than once.
            while let Some(pos) = list.iter().position(|&t| t == triangle) {
                list.remove(pos);
                removed = true;
            }
        }

        if removed {
            self.remaining -= 1;
        }
    }

    /// Number of the triangle's vertices missing from `current`.
    pub fn needed_vertex_count(&self, triangle: usize, current: &BTreeSet<u32>) -> usize {
        self.mesh
            .triangle_vertices(triangle)
            .iter()
            .filter(|&&v| !current.contains(&v))
            .count()
    }

    /// Members of `vertices` that still have unconsumed triangles.
    pub fn usable_vertices(&self, vertices: &BTreeSet<u32>) -> BTreeSet<u32> {
        vertices
            .iter()
            .copied()
            .filter(|&v| !self.usages[v as usize].is_empty())
            .collect()
    }

    /// Unconsumed triangles that reference `vertex`.
    pub fn triangles_using(&self, vertex: u32) -> &[usize] {
        &self.usages[vertex as usize]
    }

    /// Every unconsumed triangle, grouped by vertex in ascending order.
    ///
    /// A triangle is yielded once per distinct vertex it references.
    pub fn all_pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.usages.iter().flatten().copied()
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn has_more(&self) -> bool {
        self.remaining > 0
    }
}
