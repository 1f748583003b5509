//! End-to-end tests: compile meshes, encode to T3MS, decode the bytes and
//! replay the command stream against a simulated vertex buffer.

use std::collections::HashMap;
use t3ms_compiler::material_json::parse_material;
use t3ms_compiler::t3ms_reader::PackedVertex;
use t3ms_compiler::types::MAX_BATCH_SIZE;
use t3ms_compiler::{
    compile_chunks, decode_t3ms, encode_t3ms, Command, CompiledMesh, ExportSettings, Material,
    MeshChunk, MeshData,
};

const SCALE: f32 = 64.0;

fn settings() -> ExportSettings {
    ExportSettings {
        fixed_point_scale: SCALE,
    }
}

fn chunk(mesh: MeshData) -> MeshChunk {
    MeshChunk {
        name: "test".to_string(),
        mesh,
        material: Material::default(),
    }
}

/// `w`×`h` quad grid; every vertex gets a distinct position and color.
fn grid(w: u32, h: u32) -> MeshData {
    let stride = w + 1;
    let mut mesh = MeshData::default();
    for y in 0..=h {
        for x in 0..=w {
            mesh.positions.push([x as f32 * 0.25, y as f32 * 0.25, -0.5]);
            let n = [x as f32 - 5.0, y as f32 - 5.0, 3.0];
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            mesh.normals.push([n[0] / len, n[1] / len, n[2] / len]);
            mesh.colors.push([x as f32 / w as f32, y as f32 / h as f32, 0.3, 1.0]);
            mesh.uvs.push([x as f32 / w as f32, y as f32 / h as f32]);
        }
    }
    for y in 0..h {
        for x in 0..w {
            let a = y * stride + x;
            mesh.indices
                .extend_from_slice(&[a, a + 1, a + stride, a + stride, a + 1, a + stride + 1]);
        }
    }
    mesh
}

/// `count` triangles sharing no vertices.
fn disconnected(count: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for i in 0..count * 3 {
        mesh.positions.push([i as f32 * 0.5, 1.0, 0.0]);
        mesh.normals.push([0.0, 1.0, 0.0]);
        mesh.colors.push([1.0; 4]);
        mesh.uvs.push([0.0; 2]);
        mesh.indices.push(i);
    }
    mesh
}

fn compile_one(mesh: MeshData) -> (CompiledMesh, Vec<u8>) {
    let compiled = compile_chunks(&[chunk(mesh)], &settings()).unwrap();
    let bytes = encode_t3ms(&compiled).unwrap();
    (compiled, bytes)
}

/// Map every drawn triangle back to source vertex indices via its
/// (unique) quantized position, sorted for comparison.
fn drawn_triangles(mesh: &MeshData, bytes: &[u8]) -> Vec<[u32; 3]> {
    let by_position: HashMap<[i16; 3], u32> = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| (p.map(|c| (c * SCALE) as i16), i as u32))
        .collect();

    let file = decode_t3ms(bytes).unwrap();
    let mut triangles: Vec<[u32; 3]> = file
        .replay()
        .unwrap()
        .into_iter()
        .flatten()
        .map(|tri| tri.map(|v| by_position[&v.position]))
        .collect();
    triangles.sort_unstable();
    triangles
}

fn source_triangles(mesh: &MeshData) -> Vec<[u32; 3]> {
    let mut triangles: Vec<[u32; 3]> = mesh
        .indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();
    triangles.sort_unstable();
    triangles
}

fn assert_vertices_within_tolerance(mesh: &MeshData, bytes: &[u8]) {
    let file = decode_t3ms(bytes).unwrap();
    let by_position: HashMap<[i16; 3], usize> = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| (p.map(|c| (c * SCALE) as i16), i))
        .collect();

    let loaded: Vec<&PackedVertex> = file.vertex_pairs.iter().flatten().collect();
    let mut checked = 0;
    for vertex in loaded {
        let Some(&i) = by_position.get(&vertex.position) else {
            // Pad vertex.
            assert_eq!(*vertex, PackedVertex::default());
            continue;
        };
        for (d, s) in vertex.position_f32(SCALE).iter().zip(mesh.positions[i]) {
            assert!((d - s).abs() < 1.0 / SCALE);
        }
        for (d, s) in vertex.normal_f32().iter().zip(mesh.normals[i]) {
            assert!((d - s).abs() <= 1.0 / 15.5, "normal {} vs {}", d, s);
        }
        for (d, s) in vertex.color_f32().iter().zip(mesh.colors[i]) {
            assert!((d - s).abs() <= 1.0 / 255.0);
        }
        let uv = vertex.uv_f32();
        assert!((uv[0] - mesh.uvs[i][0]).abs() <= 0.5 / 1024.0 + 1e-6);
        // The second half currently repeats u.
        assert_eq!(uv[1], uv[0]);
        checked += 1;
    }
    assert!(checked >= mesh.vertex_count());
}

mod single_triangle {
    use super::*;

    fn mesh() -> MeshData {
        MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            colors: vec![[1.0, 0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0; 2]; 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn one_load_one_draw() {
        let (compiled, _) = compile_one(mesh());
        assert_eq!(
            compiled.commands,
            vec![
                Command::Vertices {
                    offset: 0,
                    pair_count: 2,
                    source_index: 0
                },
                Command::Triangles {
                    slots: vec![[0, 1, 2]]
                },
            ]
        );
        assert_eq!(compiled.stats.batch_count, 1);
        assert_eq!(compiled.stats.loaded_vertex_count, 3);
    }

    #[test]
    fn pad_vertex_is_zero_filled() {
        let (compiled, _) = compile_one(mesh());
        assert_eq!(compiled.vertex_pairs.len(), 2);
        let second = &compiled.vertex_pairs[1];
        assert!(second[8..16].iter().all(|&b| b == 0));
        assert!(second[20..24].iter().all(|&b| b == 0));
        assert!(second[28..32].iter().all(|&b| b == 0));
    }

    #[test]
    fn byte_layout() {
        let (_, bytes) = compile_one(mesh());
        // magic + pair count + 2 records + command count + VERTICES + TRIANGLES
        assert_eq!(bytes.len(), 4 + 2 + 2 * 32 + 2 + 5 + 5);
        assert_eq!(&bytes[0..4], b"T3MS");
        assert_eq!(&bytes[4..6], &[0, 2]);
        assert_eq!(&bytes[70..72], &[0, 2]);
        assert_eq!(&bytes[72..77], &[0, 0, 2, 0, 0]);
        assert_eq!(&bytes[77..82], &[1, 1, 0, 1, 2]);
        // Second vertex x = 1.0 * 64, big-endian.
        assert_eq!(&bytes[6 + 8..6 + 10], &[0x00, 0x40]);
    }
}

mod batching {
    use super::*;

    #[test]
    fn disconnected_triangles_need_several_batches() {
        let mesh = disconnected(65);
        let (compiled, bytes) = compile_one(mesh.clone());

        assert!(compiled.stats.batch_count >= 2);
        for command in &compiled.commands {
            if let Command::Vertices {
                offset, pair_count, ..
            } = command
            {
                assert!(*offset as usize + *pair_count as usize * 2 <= MAX_BATCH_SIZE);
            }
        }
        assert_eq!(drawn_triangles(&mesh, &bytes), source_triangles(&mesh));
    }

    #[test]
    fn grid_draws_every_triangle_once() {
        let mesh = grid(20, 20);
        let (compiled, bytes) = compile_one(mesh.clone());

        assert_eq!(compiled.stats.triangle_count, 800);
        assert_eq!(drawn_triangles(&mesh, &bytes), source_triangles(&mesh));
    }

    #[test]
    fn grid_reuses_resident_vertices() {
        let mesh = grid(20, 20);
        let (compiled, _) = compile_one(mesh.clone());
        let naive: usize = 3 * mesh.triangle_count();
        assert!(compiled.stats.loaded_vertex_count < naive / 2);
    }

    #[test]
    fn output_is_deterministic() {
        let (_, first) = compile_one(grid(13, 7));
        let (_, second) = compile_one(grid(13, 7));
        assert_eq!(first, second);
    }
}

mod quantization {
    use super::*;

    #[test]
    fn decoded_attributes_within_tolerance() {
        let mesh = grid(10, 10);
        let (_, bytes) = compile_one(mesh.clone());
        assert_vertices_within_tolerance(&mesh, &bytes);
    }

    #[test]
    fn position_overflow_is_an_error() {
        let mut mesh = disconnected(1);
        mesh.positions[0][0] = 1000.0;
        assert!(compile_chunks(&[chunk(mesh)], &settings()).is_err());
    }
}

mod materials {
    use super::*;

    #[test]
    fn combine_mode_only_change_cost() {
        let json = serde_json::json!({
            "combineMode": { "color": ["TEX0", "0", "SHADE", "0"] }
        });
        let material = parse_material(&json).unwrap();

        let chunks = [MeshChunk {
            material,
            ..chunk(disconnected(1))
        }];
        let compiled = compile_chunks(&chunks, &settings()).unwrap();
        assert!((compiled.stats.state_change_cost - 0.395).abs() < 1e-6);
    }

    #[test]
    fn repeated_material_is_free() {
        let material = parse_material(&serde_json::json!({ "lighting": true })).unwrap();
        let chunks = [
            MeshChunk {
                material: material.clone(),
                ..chunk(disconnected(1))
            },
            MeshChunk {
                material,
                ..chunk(disconnected(1))
            },
        ];
        let compiled = compile_chunks(&chunks, &settings()).unwrap();
        assert!((compiled.stats.state_change_cost - 0.7).abs() < 1e-6);
    }
}

mod obj_files {
    use super::*;
    use std::fs;

    #[test]
    fn convert_obj_writes_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tri.obj");
        let output = dir.path().join("out").join("tri.t3ms");
        fs::write(&input, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();

        let compiled =
            t3ms_compiler::convert_obj(&input, &output, None, &ExportSettings::default()).unwrap();
        assert_eq!(compiled.stats.triangle_count, 1);

        let file = decode_t3ms(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(file.commands, compiled.commands);
        let drawn = file.replay().unwrap();
        assert_eq!(drawn[0][0][1].position, [64, 0, 0]);
    }

    #[test]
    fn convert_obj_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("never.t3ms");
        let result = t3ms_compiler::convert_obj(
            &dir.path().join("missing.obj"),
            &output,
            None,
            &ExportSettings::default(),
        );
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
