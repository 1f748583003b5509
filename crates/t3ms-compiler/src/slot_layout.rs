use crate::batch_scheduler::VertexBatch;
use crate::error::CompileError;
use crate::types::{MeshData, MAX_BATCH_SIZE};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Slots touched by loading `count` vertices: loads happen in pairs.
pub fn padded_len(count: usize) -> usize {
    (count + 1) & !1
}

/// Physical realization of one batch in the vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLayout {
    /// First slot the new vertices are loaded into.
    pub offset: usize,
    /// Vertices to load, in slot order starting at `offset`.
    pub new_indices: Vec<u32>,
    /// Slot triple for every triangle of the batch, in draw order.
    pub triangles: Vec<[u8; 3]>,
}

/// The hardware vertex buffer as seen by the compiler.
///
/// Persists across all batches of a chunk so that vertices still needed by
/// upcoming batches can stay where they are.
#[derive(Debug, Clone)]
pub struct SlotArray {
    occupants: [Option<u32>; MAX_BATCH_SIZE],
    /// Batches the occupant must still survive, counted from when it was loaded.
    life: [usize; MAX_BATCH_SIZE],
}

impl Default for SlotArray {
    fn default() -> Self {
        Self {
            occupants: [None; MAX_BATCH_SIZE],
            life: [1; MAX_BATCH_SIZE],
        }
    }
}

impl SlotArray {
    pub fn occupant(&self, slot: usize) -> Option<u32> {
        self.occupants[slot]
    }

    pub fn remaining_life(&self, slot: usize) -> usize {
        self.life[slot]
    }

    /// Lowest slot currently holding `vertex`.
    pub fn slot_of(&self, vertex: u32) -> Option<usize> {
        self.occupants.iter().position(|&o| o == Some(vertex))
    }

    /// A slot keeps its occupant if the batch uses it and it lives at least
    /// as long as the longest-lived vertex of the batch.
    fn is_stable(&self, slot: usize, batch: &VertexBatch) -> bool {
        self.occupants[slot].is_some_and(|v| batch.vertices.contains(&v))
            && self.life[slot] >= batch.max_vertex_lifetime
    }

    /// Assign slots for `batch` and update the buffer state.
    ///
    /// Stable runs at either end of the buffer are kept. Everything else is
    /// loaded, longest-lived first, into the gap between them, packed against
    /// the larger of the two runs. The load span is rounded up to whole pairs
    /// so the pad vertex never lands on a stable slot.
    pub fn layout_batch(
        &mut self,
        batch: &VertexBatch,
        mesh: &MeshData,
    ) -> Result<BatchLayout, CompileError> {
        let mut ordered: Vec<u32> = batch.vertices.iter().copied().collect();
        ordered.sort_by_key(|&v| Reverse(batch.lifetime(v)));

        let mut start = 0;
        while start < MAX_BATCH_SIZE && self.is_stable(start, batch) {
            start += 1;
        }

        let mut end = MAX_BATCH_SIZE;
        while end > 0 && self.is_stable(end - 1, batch) {
            end -= 1;
        }

        let reused: BTreeSet<u32> = self.occupants[..start]
            .iter()
            .chain(&self.occupants[end..])
            .flatten()
            .copied()
            .collect();

        let mut new_indices: Vec<u32> = ordered
            .iter()
            .copied()
            .filter(|v| !reused.contains(v))
            .collect();

        let mut span = padded_len(new_indices.len());
        let offset = if span > end.saturating_sub(start) {
            // The gap cannot take the padded load (a duplicated occupant or an
            // odd count filling the gap exactly). Reload the batch from slot 0.
            log::debug!(
                "{} new vertices do not fit between slots {} and {}, reloading batch",
                new_indices.len(),
                start,
                end
            );
            new_indices = ordered;
            span = padded_len(new_indices.len());
            0
        } else if start < MAX_BATCH_SIZE - end {
            end - span
        } else {
            start
        };

        for (i, &vertex) in new_indices.iter().enumerate() {
            self.occupants[offset + i] = Some(vertex);
            self.life[offset + i] = batch.lifetime(vertex) - 1;
        }
        // The zero-filled pad vertex overwrites whatever sat after the load.
        for slot in offset + new_indices.len()..offset + span {
            self.occupants[slot] = None;
            self.life[slot] = 1;
        }

        let mut triangles = Vec::with_capacity(batch.triangles.len());
        for &triangle in &batch.triangles {
            let mut slots = [0u8; 3];
            for (slot, vertex) in slots.iter_mut().zip(mesh.triangle_vertices(triangle)) {
                let index = self
                    .slot_of(vertex)
                    .ok_or(CompileError::SlotResolution { vertex })?;
                *slot = index as u8;
            }
            triangles.push(slots);
        }

        Ok(BatchLayout {
            offset,
            new_indices,
            triangles,
        })
    }
}

/// Lay out all batches of one chunk against a fresh slot array.
pub fn layout_batches(
    batches: &[VertexBatch],
    mesh: &MeshData,
) -> Result<Vec<BatchLayout>, CompileError> {
    let mut slots = SlotArray::default();
    batches
        .iter()
        .map(|batch| slots.layout_batch(batch, mesh))
        .collect()
}
