//! # Seam Continuity Integration Test
//!
//! Proves that two chunks generated independently agree along their shared
//! edge: same heights, and (at full detail) the same normals.

use endless_core::{Vec2, Vec3};
use endless_procedural::{
    ChunkCoord, MeshConfig, MeshData, NoiseSettings, NormalizeMode, TerrainGenerator, WorldSeed,
};

const FIELD_SIZE: usize = 33;
const TOLERANCE: f32 = 1e-5;

fn generator() -> TerrainGenerator {
    let noise = NoiseSettings {
        seed: WorldSeed::new(2024),
        scale: 18.0,
        octaves: 5,
        persistence: 0.5,
        lacunarity: 2.0,
        offset: Vec2::new(13.0, -7.0),
        normalize_mode: NormalizeMode::Global,
    };
    let mesh = MeshConfig {
        field_size: FIELD_SIZE,
        height_multiplier: 25.0,
        ..MeshConfig::default()
    };
    TerrainGenerator::new(noise, &mesh)
}

fn mesh_for(generator: &TerrainGenerator, coord: ChunkCoord, lod: u32) -> MeshData {
    let terrain = generator.generate_chunk(coord.centre(generator.chunk_size()));
    generator.build_mesh(&terrain.elevation, lod)
}

fn assert_close(a: Vec3, b: Vec3, what: &str) {
    let diff = a - b;
    assert!(
        diff.x.abs() < TOLERANCE && diff.y.abs() < TOLERANCE && diff.z.abs() < TOLERANCE,
        "{what}: {a:?} vs {b:?}"
    );
}

/// Test: east/west neighbours share their boundary column.
#[test]
fn test_east_west_seam_normals_match() {
    let generator = generator();
    let west = mesh_for(&generator, ChunkCoord::new(0, 0), 0);
    let east = mesh_for(&generator, ChunkCoord::new(1, 0), 0);
    let line = west.vertices_per_line();
    assert_eq!(line, FIELD_SIZE);

    for row in 0..line {
        let w = row * line + (line - 1);
        let e = row * line;

        assert_eq!(
            west.vertices()[w].y.to_bits(),
            east.vertices()[e].y.to_bits(),
            "Height mismatch on row {row}"
        );
        assert_close(west.normals()[w], east.normals()[e], &format!("Normal on row {row}"));
    }
}

/// Test: north/south neighbours share their boundary row.
#[test]
fn test_north_south_seam_normals_match() {
    let generator = generator();
    let south = mesh_for(&generator, ChunkCoord::new(-2, 3), 0);
    let north = mesh_for(&generator, ChunkCoord::new(-2, 4), 0);
    let line = south.vertices_per_line();

    // Rows run towards -Z: the south chunk's first row meets the north
    // chunk's last row
    for column in 0..line {
        let s = column;
        let n = (line - 1) * line + column;

        assert_eq!(south.vertices()[s].y.to_bits(), north.vertices()[n].y.to_bits());
        assert_close(south.normals()[s], north.normals()[n], &format!("Normal on column {column}"));
    }
}

/// Test: world positions of the seam vertices coincide once each mesh is
/// placed at its chunk centre.
#[test]
fn test_seam_vertices_coincide_in_world_space() {
    let generator = generator();
    let size = generator.chunk_size();
    let a = ChunkCoord::new(5, -1);
    let b = a.offset(1, 0);
    let west = mesh_for(&generator, a, 0);
    let east = mesh_for(&generator, b, 0);
    let line = west.vertices_per_line();

    let place = |coord: ChunkCoord, v: Vec3| {
        let centre = coord.centre(size);
        Vec3::new(v.x + centre.x, v.y, v.z + centre.y)
    };
    for row in [0, line / 2, line - 1] {
        let w = place(a, west.vertices()[row * line + line - 1]);
        let e = place(b, east.vertices()[row * line]);
        assert_close(w, e, "Seam vertex");
    }
}

/// Test: coarser LODs still meet on the same heights. Their seam normals
/// only roughly agree, but stay unit length and face up on both sides.
#[test]
fn test_coarse_lod_seam_heights_match() {
    let generator = generator();
    for lod in 1..=2 {
        let west = mesh_for(&generator, ChunkCoord::new(0, 0), lod);
        let east = mesh_for(&generator, ChunkCoord::new(1, 0), lod);
        let line = west.vertices_per_line();

        for row in 0..line {
            assert_eq!(
                west.vertices()[row * line + line - 1].y.to_bits(),
                east.vertices()[row * line].y.to_bits(),
                "LOD {lod} height mismatch on row {row}"
            );
            for normal in [west.normals()[row * line + line - 1], east.normals()[row * line]] {
                assert!((normal.length() - 1.0).abs() < 1e-4);
                assert!(normal.y > 0.0, "LOD {lod} seam normal {normal:?} points down");
            }
        }
    }
}
