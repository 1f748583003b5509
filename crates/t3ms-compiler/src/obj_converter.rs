use crate::error::CompileError;
use crate::material::Material;
use crate::material_json::load_material;
use crate::types::{MeshChunk, MeshData};
use std::path::Path;

/// Load an OBJ file and return one chunk per object/group, in file order.
///
/// A chunk's material is read from `<materials_dir>/<mtl name>.json` when
/// that file exists; otherwise the chunk gets the default material.
pub fn load_chunks(path: &Path, materials_dir: Option<&Path>) -> Result<Vec<MeshChunk>, CompileError> {
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, materials) =
        tobj::load_obj(path, &load_options).map_err(|e| CompileError::ObjParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let obj_materials = materials.unwrap_or_else(|e| {
        log::warn!("No MTL materials for {}: {}", path.display(), e);
        Vec::new()
    });

    let mut chunks = Vec::with_capacity(models.len());
    for model in &models {
        if model.mesh.indices.is_empty() {
            log::warn!("Skipping '{}': no faces", model.name);
            continue;
        }

        let material_name = model
            .mesh
            .material_id
            .and_then(|id| obj_materials.get(id))
            .map(|m| m.name.as_str());

        chunks.push(MeshChunk {
            name: model.name.clone(),
            mesh: convert_mesh(&model.name, &model.mesh),
            material: resolve_material(material_name, materials_dir)?,
        });
    }

    if chunks.is_empty() {
        return Err(CompileError::ObjParse {
            path: path.to_path_buf(),
            message: "OBJ file has no geometry".to_string(),
        });
    }

    Ok(chunks)
}

fn resolve_material(name: Option<&str>, materials_dir: Option<&Path>) -> Result<Material, CompileError> {
    let (Some(name), Some(dir)) = (name, materials_dir) else {
        return Ok(Material::default());
    };

    let file = dir.join(format!("{}.json", name));
    if !file.is_file() {
        log::warn!("No material file {}, using default material", file.display());
        return Ok(Material::default());
    }

    log::debug!("Loading material '{}' from {}", name, file.display());
    load_material(&file)
}

/// Copy tobj's flat attribute arrays into a `MeshData`, filling in defaults
/// for attributes the file does not provide.
fn convert_mesh(name: &str, mesh: &tobj::Mesh) -> MeshData {
    let vert_count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() >= vert_count * 3;
    let has_uvs = mesh.texcoords.len() >= vert_count * 2;
    let has_colors = mesh.vertex_color.len() >= vert_count * 3;

    if !has_normals {
        log::warn!("Mesh '{}' has no normals, using (0, 0, 0)", name);
    }
    if !has_uvs {
        log::warn!("Mesh '{}' has no UV coordinates, using (0, 0)", name);
    }
    if !has_colors {
        log::debug!("Mesh '{}' has no vertex colors, using white", name);
    }

    let mut data = MeshData {
        indices: mesh.indices.clone(),
        ..Default::default()
    };

    for i in 0..vert_count {
        data.positions.push([
            mesh.positions[i * 3],
            mesh.positions[i * 3 + 1],
            mesh.positions[i * 3 + 2],
        ]);
        data.normals.push(if has_normals {
            [mesh.normals[i * 3], mesh.normals[i * 3 + 1], mesh.normals[i * 3 + 2]]
        } else {
            [0.0; 3]
        });
        data.colors.push(if has_colors {
            [
                mesh.vertex_color[i * 3],
                mesh.vertex_color[i * 3 + 1],
                mesh.vertex_color[i * 3 + 2],
                1.0,
            ]
        } else {
            [1.0; 4]
        });
        data.uvs.push(if has_uvs {
            [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
        } else {
            [0.0; 2]
        });
    }

    data
}
