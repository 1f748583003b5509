use crate::batch_scheduler::VertexBatch;
use std::collections::BTreeSet;

/// Extend lifetimes of `batch` vertices that are also in the batch
/// `distance` positions ahead.
///
/// Only vertices that survived every batch up to `distance` are extended.
/// Returns whether anything is still alive at `distance`, i.e. whether it is
/// worth looking one batch further.
fn extend_lifetimes(batch: &mut VertexBatch, next_vertices: &BTreeSet<u32>, distance: usize) -> bool {
    for vertex in next_vertices {
        if let Some(life) = batch.vertex_lifetime.get_mut(vertex) {
            if *life == distance {
                *life = distance + 1;
                batch.max_vertex_lifetime = distance + 1;
            }
        }
    }

    batch.max_vertex_lifetime > distance
}

/// Record, for every batch, how many consecutive batches each of its
/// vertices stays in use.
///
/// A vertex whose lifetime is `L` in batch `i` is a member of every batch
/// from `i` to `i + L - 1`.
pub fn analyze_lifetimes(batches: &mut [VertexBatch]) {
    for i in 0..batches.len() {
        let (head, tail) = batches.split_at_mut(i + 1);
        let batch = &mut head[i];

        for (offset, next) in tail.iter().enumerate() {
            if !extend_lifetimes(batch, &next.vertices, offset + 1) {
                break;
            }
        }
    }
}
