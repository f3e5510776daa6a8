//! # Terrain Mesh Builder
//!
//! Turns an `ElevationField` into a triangulated height mesh at one LOD.
//!
//! ## Border Ring
//!
//! A field of side `N + 2` carries one extra ring of samples around the
//! `N x N` interior. The ring is turned into border vertices that feed the
//! normal pass and are never rendered. Because the ring holds exactly the
//! samples a neighbouring chunk uses for its own edge, both chunks compute the
//! same normal along the shared seam without ever seeing each other.
//!
//! That holds exactly at LOD 0 only. At coarser LODs seam heights still match,
//! but the ring sits one sample outside the edge while the interior neighbour
//! sits `step` samples inside, so the two chunks see mirrored stencils and
//! their seam normals only roughly agree.
//!
//! ```text
//!   B  B  B  B  B        B = border vertex (normal source only)
//!   B  i  i  i  B        i = interior vertex (rendered)
//!   B  i  i  i  B
//!   B  i  i  i  B
//!   B  B  B  B  B
//! ```
//!
//! ## LOD Sampling
//!
//! `step = max(1, lod * 2)`. The interior keeps every `step`-th sample,
//! `(N - 1) / step + 1` per line. The leading border is always sample `0`;
//! the trailing border is one `step` past the last kept interior sample,
//! clamped to the field edge.

use bytemuck::cast_slice;

use endless_core::{Vec2, Vec3};

use crate::height_curve::HeightCurve;
use crate::noise_field::ElevationField;

/// Sample step for a LOD: `1` for LOD 0, `lod * 2` otherwise.
#[inline]
#[must_use]
pub const fn simplification_step(lod: u32) -> usize {
    if lod == 0 {
        1
    } else {
        lod as usize * 2
    }
}

/// Interior vertices per line for an interior side `interior` at `lod`.
#[inline]
#[must_use]
pub const fn vertices_per_line(interior: usize, lod: u32) -> usize {
    if interior == 0 {
        0
    } else {
        (interior - 1) / simplification_step(lod) + 1
    }
}

/// Reference to a vertex in one of the two vertex spaces of a `MeshData`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexRef {
    /// Index into `MeshData::vertices`.
    Interior(u32),
    /// Index into `MeshData::border_vertices`.
    Border(u32),
}

impl VertexRef {
    /// True for border vertices.
    #[inline]
    #[must_use]
    pub const fn is_border(self) -> bool {
        matches!(self, Self::Border(_))
    }
}

// =============================================================================
// MESH DATA
// =============================================================================

/// A built terrain mesh.
///
/// Interior vertices, UVs and normals share indexing. `triangles` only holds
/// fully interior triangles and is ready for an index buffer; triangles that
/// touch the border ring live in `border_triangles`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    lod: u32,
    vertices_per_line: usize,
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    triangles: Vec<u32>,
    border_vertices: Vec<Vec3>,
    border_triangles: Vec<[VertexRef; 3]>,
}

impl MeshData {
    /// LOD this mesh was built at.
    #[inline]
    #[must_use]
    pub const fn lod(&self) -> u32 {
        self.lod
    }

    /// Interior vertices per line.
    #[inline]
    #[must_use]
    pub const fn vertices_per_line(&self) -> usize {
        self.vertices_per_line
    }

    /// Rendered vertex positions.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Texture coordinates, one per interior vertex, in `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Unit normals, one per interior vertex. Edge normals match the
    /// neighbouring chunk's exactly at LOD 0 and approximately above it.
    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Interior triangle indices, three per triangle.
    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Number of interior triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Border-ring positions (normal sources only).
    #[inline]
    #[must_use]
    pub fn border_vertices(&self) -> &[Vec3] {
        &self.border_vertices
    }

    /// Triangles with at least one border vertex.
    #[inline]
    #[must_use]
    pub fn border_triangles(&self) -> &[[VertexRef; 3]] {
        &self.border_triangles
    }

    /// True if nothing would be rendered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex positions as raw bytes for buffer upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        cast_slice(&self.vertices)
    }

    /// Normals as raw bytes for buffer upload.
    #[must_use]
    pub fn normal_bytes(&self) -> &[u8] {
        cast_slice(&self.normals)
    }

    /// UVs as raw bytes for buffer upload.
    #[must_use]
    pub fn uv_bytes(&self) -> &[u8] {
        cast_slice(&self.uvs)
    }

    /// Triangle indices as raw bytes for buffer upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        cast_slice(&self.triangles)
    }

    fn position(&self, vertex: VertexRef) -> Vec3 {
        match vertex {
            VertexRef::Interior(i) => self.vertices[i as usize],
            VertexRef::Border(i) => self.border_vertices[i as usize],
        }
    }

    /// Accumulates face normals into interior vertices, then normalizes.
    fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        let interior = self
            .triangles
            .chunks_exact(3)
            .map(|t| [VertexRef::Interior(t[0]), VertexRef::Interior(t[1]), VertexRef::Interior(t[2])]);

        for triangle in interior.chain(self.border_triangles.iter().copied()) {
            let [a, b, c] = triangle;
            let pa = self.position(a);
            let face = (self.position(b) - pa).cross(self.position(c) - pa).normalized();

            for vertex in triangle {
                if let VertexRef::Interior(i) = vertex {
                    normals[i as usize] += face;
                }
            }
        }

        for normal in &mut normals {
            *normal = normal.normalized();
        }
        self.normals = normals;
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Field indices sampled along one axis: border, interior samples, border.
///
/// Empty when the side is too small to hold an interior.
fn axis_samples(side: usize, step: usize) -> Vec<usize> {
    if side < 3 {
        return Vec::new();
    }
    let count = (side - 3) / step + 1;

    let mut samples = Vec::with_capacity(count + 2);
    samples.push(0);
    samples.extend((0..count).map(|k| 1 + k * step));
    let last = 1 + (count - 1) * step;
    samples.push((last + step).min(side - 1));
    samples
}

/// Builds the mesh for `field` at `lod`.
///
/// Vertex height is `curve(elevation) * height_multiplier`. The mesh is
/// centred on the origin in X/Z with one world unit per field sample; field
/// rows run towards -Z. Fields smaller than `3 x 3` have no interior and
/// produce an empty mesh.
#[must_use]
pub fn build_terrain_mesh(
    field: &ElevationField,
    height_multiplier: f32,
    curve: &HeightCurve,
    lod: u32,
) -> MeshData {
    let step = simplification_step(lod);
    let columns = axis_samples(field.width(), step);
    let rows = axis_samples(field.height(), step);

    let mut mesh = MeshData {
        lod,
        ..MeshData::default()
    };
    if columns.is_empty() || rows.is_empty() {
        return mesh;
    }

    let interior_w = field.width() - 2;
    let interior_h = field.height() - 2;
    let half_w = (interior_w - 1) as f32 / 2.0;
    let half_h = (interior_h - 1) as f32 / 2.0;
    let uv_w = interior_w.saturating_sub(1).max(1) as f32;
    let uv_h = interior_h.saturating_sub(1).max(1) as f32;

    mesh.vertices_per_line = columns.len() - 2;

    // Vertex pass: assign every grid point to one of the two spaces
    let mut refs = Vec::with_capacity(columns.len() * rows.len());
    for (gy, &fy) in rows.iter().enumerate() {
        for (gx, &fx) in columns.iter().enumerate() {
            let height = curve.evaluate(field.get(fx, fy)) * height_multiplier;
            let local_x = fx as f32 - 1.0;
            let local_y = fy as f32 - 1.0;
            let position = Vec3::new(local_x - half_w, height, half_h - local_y);

            let on_border = gx == 0 || gy == 0 || gx == columns.len() - 1 || gy == rows.len() - 1;
            if on_border {
                refs.push(VertexRef::Border(mesh.border_vertices.len() as u32));
                mesh.border_vertices.push(position);
            } else {
                refs.push(VertexRef::Interior(mesh.vertices.len() as u32));
                mesh.vertices.push(position);
                mesh.uvs.push(Vec2::new(local_x / uv_w, local_y / uv_h));
            }
        }
    }

    // Triangle pass: (a, d, c) and (d, a, b) per cell
    let line = columns.len();
    for gy in 0..rows.len() - 1 {
        for gx in 0..line - 1 {
            let a = refs[gy * line + gx];
            let b = refs[gy * line + gx + 1];
            let c = refs[(gy + 1) * line + gx];
            let d = refs[(gy + 1) * line + gx + 1];

            for triangle in [[a, d, c], [d, a, b]] {
                match triangle {
                    [VertexRef::Interior(i0), VertexRef::Interior(i1), VertexRef::Interior(i2)] => {
                        mesh.triangles.extend_from_slice(&[i0, i1, i2]);
                    }
                    _ => mesh.border_triangles.push(triangle),
                }
            }
        }
    }

    mesh.compute_normals();
    mesh
}
