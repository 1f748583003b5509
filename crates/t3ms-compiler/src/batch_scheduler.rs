use crate::types::{MeshData, MAX_BATCH_SIZE};
use crate::vertex_usage::VertexUsage;
use std::collections::{BTreeMap, BTreeSet};

/// A group of at most [`MAX_BATCH_SIZE`] vertices and the triangles drawn
/// from them.
///
/// Uses `BTreeSet`/`BTreeMap` so iteration order, and therefore the emitted
/// stream, is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBatch {
    pub vertices: BTreeSet<u32>,
    /// Triangle offsets into the mesh index buffer, in draw order.
    pub triangles: Vec<usize>,
    /// Number of batches (this one included) each vertex must stay resident for.
    pub vertex_lifetime: BTreeMap<u32, usize>,
    /// Largest value in `vertex_lifetime`.
    pub max_vertex_lifetime: usize,
}

impl VertexBatch {
    pub fn new(vertices: BTreeSet<u32>, triangles: Vec<usize>) -> Self {
        let vertex_lifetime = vertices.iter().map(|&v| (v, 1)).collect();
        Self {
            vertices,
            triangles,
            vertex_lifetime,
            max_vertex_lifetime: 1,
        }
    }

    /// Lifetime of a member vertex (1 for non-members).
    pub fn lifetime(&self, vertex: u32) -> usize {
        self.vertex_lifetime.get(&vertex).copied().unwrap_or(1)
    }
}

/// Outcome of scanning triangles adjacent to the batch.
enum LocalCandidate {
    /// Needs no new vertices.
    Free(usize),
    /// Fewest new vertices among reachable triangles (earliest wins ties).
    Best { triangle: usize, needed: usize },
    /// No unconsumed triangle touches the batch.
    Unreachable,
}

/// Scan the triangles that reference vertices already in the batch.
fn local_candidate(usage: &VertexUsage<'_>, current: &BTreeSet<u32>) -> LocalCandidate {
    let mut best: Option<(usize, usize)> = None;

    for &vertex in current {
        for &triangle in usage.triangles_using(vertex) {
            let needed = usage.needed_vertex_count(triangle, current);
            if needed == 0 {
                return LocalCandidate::Free(triangle);
            }
            if best.map_or(true, |(_, best_needed)| needed < best_needed) {
                best = Some((triangle, needed));
            }
        }
    }

    match best {
        Some((triangle, needed)) => LocalCandidate::Best { triangle, needed },
        None => LocalCandidate::Unreachable,
    }
}

/// Scan every unconsumed triangle for the first that fits in `space`.
///
/// Sees triangles the local scan cannot reach, e.g. when the batch shares
/// nothing with the rest of the mesh.
fn global_candidate(usage: &VertexUsage<'_>, current: &BTreeSet<u32>, space: usize) -> Option<usize> {
    usage
        .all_pending()
        .find(|&triangle| usage.needed_vertex_count(triangle, current) <= space)
}

/// Pick and consume the next triangle for the batch, or `None` if nothing fits.
fn find_next_triangle(usage: &mut VertexUsage<'_>, current: &BTreeSet<u32>) -> Option<usize> {
    let space = MAX_BATCH_SIZE.saturating_sub(current.len());

    let picked = match local_candidate(usage, current) {
        LocalCandidate::Free(triangle) => Some(triangle),
        LocalCandidate::Best { triangle, needed } if needed <= space => Some(triangle),
        LocalCandidate::Best { .. } => None,
        LocalCandidate::Unreachable => global_candidate(usage, current, space),
    };

    if let Some(triangle) = picked {
        usage.mark_triangle_used(triangle);
    }
    picked
}

/// Split a validated mesh into batches that each fit the vertex buffer.
///
/// Greedy: each batch starts from the previous batch's vertices that still
/// have work left, keeps adding the triangle needing the fewest new
/// vertices, and evicts carried-over vertices when it runs out of room.
/// Every triangle lands in exactly one batch.
pub fn schedule_batches(mesh: &MeshData) -> Vec<VertexBatch> {
    let mut usage = VertexUsage::new(mesh);
    let mut carry_over: BTreeSet<u32> = BTreeSet::new();
    let mut batches = Vec::new();

    while usage.has_more() {
        let mut current = carry_over.clone();
        let mut triangles = Vec::new();

        while usage.has_more() && (current.len() < MAX_BATCH_SIZE || !carry_over.is_empty()) {
            match find_next_triangle(&mut usage, &current) {
                Some(triangle) => {
                    for vertex in mesh.triangle_vertices(triangle) {
                        current.insert(vertex);
                        carry_over.remove(&vertex);
                    }
                    triangles.push(triangle);
                }
                None => match carry_over.pop_first() {
                    Some(evicted) => {
                        current.remove(&evicted);
                    }
                    None => break,
                },
            }
        }

        log::debug!(
            "batch {}: {} vertices, {} triangles",
            batches.len(),
            current.len(),
            triangles.len()
        );

        carry_over = usage.usable_vertices(&current);
        batches.push(VertexBatch::new(current, triangles));
    }

    batches
}
