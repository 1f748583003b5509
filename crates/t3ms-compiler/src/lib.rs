/// Error types for mesh compilation.
pub mod error;

/// Core type definitions: meshes, chunks, commands, settings.
pub mod types;

/// Material state model.
pub mod material;

/// Material deltas and state-change cost estimation.
pub mod material_delta;

/// Material JSON parsing and validation.
pub mod material_json;

/// OBJ to mesh chunk conversion.
pub mod obj_converter;

/// Per-vertex index of unconsumed triangles.
pub mod vertex_usage;

/// Greedy triangle batching for the 64-slot vertex buffer.
pub mod batch_scheduler;

/// Cross-batch vertex lifetime analysis.
pub mod lifetime;

/// Slot assignment for batches.
pub mod slot_layout;

/// Vertex quantization and T3MS serialization.
pub mod t3ms_writer;

/// T3MS decoding.
pub mod t3ms_reader;

pub use error::CompileError;
pub use material::Material;
pub use t3ms_reader::{decode_t3ms, T3msFile};
pub use t3ms_writer::{encode_t3ms, write_t3ms};
pub use types::{Command, CompileStats, CompiledMesh, ExportSettings, MeshChunk, MeshData};

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Compile chunks, in the given order, into one vertex table and command
/// stream.
///
/// Each chunk is batched and laid out against its own slot array; vertex
/// buffer contents are never assumed to survive a chunk boundary.
pub fn compile_chunks(
    chunks: &[MeshChunk],
    settings: &ExportSettings,
) -> Result<CompiledMesh, CompileError> {
    let mut out = CompiledMesh::default();

    for chunk in chunks {
        chunk.mesh.validate()?;

        let mut batches = batch_scheduler::schedule_batches(&chunk.mesh);
        lifetime::analyze_lifetimes(&mut batches);
        let layouts = slot_layout::layout_batches(&batches, &chunk.mesh)?;

        let pairs_before = out.vertex_pairs.len();
        for layout in &layouts {
            t3ms_writer::emit_batch(layout, &chunk.mesh, settings, &mut out)?;
            out.stats.loaded_vertex_count += layout.new_indices.len();
        }

        log::info!(
            "Chunk '{}': {} triangles, {} vertices -> {} batches, {} vertex pairs",
            chunk.name,
            chunk.mesh.triangle_count(),
            chunk.mesh.vertex_count(),
            batches.len(),
            out.vertex_pairs.len() - pairs_before
        );

        out.stats.chunk_count += 1;
        out.stats.triangle_count += chunk.mesh.triangle_count();
        out.stats.batch_count += batches.len();
    }

    out.stats.state_change_cost =
        material_delta::sequence_cost(&Material::default(), chunks.iter().map(|c| &c.material));

    Ok(out)
}

/// Load an OBJ file, compile it, and write the T3MS result to `output`.
pub fn convert_obj(
    input: &Path,
    output: &Path,
    materials_dir: Option<&Path>,
    settings: &ExportSettings,
) -> Result<CompiledMesh, CompileError> {
    let chunks = obj_converter::load_chunks(input, materials_dir)?;
    let compiled = compile_chunks(&chunks, settings)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_t3ms(&compiled, BufWriter::new(File::create(output)?))?;

    log::info!(
        "Wrote {} ({} vertex pairs, {} commands)",
        output.display(),
        compiled.vertex_pairs.len(),
        compiled.commands.len()
    );

    Ok(compiled)
}
