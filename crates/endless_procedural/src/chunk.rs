//! # Chunk Model
//!
//! The world is a grid of square chunks, each `chunk_size` world units wide
//! and centred on `coord * chunk_size`. A chunk owns its terrain once the
//! elevation job returns, plus one mesh slot per LOD level.
//!
//! ## Lifecycle
//!
//! ```text
//! NoDataPending -> NoiseRequested -> NoiseReady
//!     -> MeshRequested -> MeshReady -> Active
//! ```
//!
//! Chunks are never destroyed. Only the owning `StreamingManager` mutates
//! them; everything here is read-only from the outside.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use endless_core::Vec2;

use crate::error::{TerrainError, TerrainResult};
use crate::generator::ChunkTerrain;
use crate::mesh::MeshData;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not world units).
    pub x: i32,
    /// Y coordinate (in chunks). Maps to world Z.
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk whose centre is nearest to `position`.
    ///
    /// Halfway points round away from zero.
    #[inline]
    #[must_use]
    pub fn from_position(position: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (position.x / chunk_size).round() as i32,
            y: (position.y / chunk_size).round() as i32,
        }
    }

    /// Centre of the chunk in world units.
    #[inline]
    #[must_use]
    pub fn centre(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.y as f32 * chunk_size)
    }

    /// Offsets this coordinate.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned world-space square covered by a chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    centre: Vec2,
    half_size: f32,
}

impl ChunkBounds {
    /// Bounds of `coord`.
    #[must_use]
    pub fn of(coord: ChunkCoord, chunk_size: f32) -> Self {
        Self {
            centre: coord.centre(chunk_size),
            half_size: chunk_size / 2.0,
        }
    }

    /// Centre point.
    #[inline]
    #[must_use]
    pub const fn centre(&self) -> Vec2 {
        self.centre
    }

    /// Half the edge length.
    #[inline]
    #[must_use]
    pub const fn half_size(&self) -> f32 {
        self.half_size
    }

    /// Distance from `point` to the nearest point of the square; `0` inside.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let dx = ((point.x - self.centre.x).abs() - self.half_size).max(0.0);
        let dy = ((point.y - self.centre.y).abs() - self.half_size).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

// =============================================================================
// LEVEL OF DETAIL
// =============================================================================

/// One LOD tier: mesh detail `lod`, used up to `visible_threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Mesh LOD (simplification step is `max(1, lod * 2)`).
    pub lod: u32,
    /// Largest viewer distance this tier is used for.
    pub visible_threshold: f32,
}

impl LodLevel {
    /// Creates a tier.
    #[must_use]
    pub const fn new(lod: u32, visible_threshold: f32) -> Self {
        Self { lod, visible_threshold }
    }
}

/// Ordered LOD tiers, ascending by threshold. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct LodSpec {
    levels: Vec<LodLevel>,
}

impl LodSpec {
    /// Validates and wraps a tier list.
    ///
    /// # Errors
    ///
    /// - `EmptyLodSpec` for an empty list
    /// - `LodThresholdsNotAscending` unless thresholds strictly increase
    /// - `InvalidConfig` for a non-finite or negative threshold, or a LOD
    ///   value used twice
    pub fn new(levels: Vec<LodLevel>) -> TerrainResult<Self> {
        if levels.is_empty() {
            return Err(TerrainError::EmptyLodSpec);
        }

        for (index, level) in levels.iter().enumerate() {
            if !level.visible_threshold.is_finite() || level.visible_threshold < 0.0 {
                return Err(TerrainError::InvalidConfig(format!(
                    "LOD level {index} has threshold {}",
                    level.visible_threshold
                )));
            }
            if index > 0 {
                let previous = levels[index - 1].visible_threshold;
                if level.visible_threshold <= previous {
                    return Err(TerrainError::LodThresholdsNotAscending {
                        index,
                        threshold: level.visible_threshold,
                        previous,
                    });
                }
            }
            if levels[..index].iter().any(|other| other.lod == level.lod) {
                return Err(TerrainError::InvalidConfig(format!(
                    "LOD {} appears more than once",
                    level.lod
                )));
            }
        }

        Ok(Self { levels })
    }

    /// The tiers.
    #[must_use]
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    /// Number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; kept for symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The visibility horizon: the last tier's threshold.
    #[must_use]
    pub fn max_view_distance(&self) -> f32 {
        self.levels.last().map_or(0.0, |level| level.visible_threshold)
    }

    /// Tier index for `distance`: the first tier whose threshold is at least
    /// the distance, or the last tier beyond every threshold.
    #[must_use]
    pub fn select(&self, distance: f32) -> usize {
        self.levels
            .iter()
            .position(|level| distance <= level.visible_threshold)
            .unwrap_or(self.levels.len() - 1)
    }
}

// =============================================================================
// CHUNK
// =============================================================================

/// Coarse lifecycle state of a chunk, derived from its flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Nothing requested yet.
    NoDataPending,
    /// Elevation job in flight.
    NoiseRequested,
    /// Terrain present, no mesh requested.
    NoiseReady,
    /// A mesh job is in flight and nothing is built yet.
    MeshRequested,
    /// At least one mesh is built but none is active.
    MeshReady,
    /// A mesh is active.
    Active,
}

/// Per-LOD mesh storage.
#[derive(Clone, Debug)]
pub struct MeshSlot {
    lod: u32,
    requested: bool,
    mesh: Option<Arc<MeshData>>,
}

impl MeshSlot {
    fn new(lod: u32) -> Self {
        Self {
            lod,
            requested: false,
            mesh: None,
        }
    }

    /// LOD this slot holds.
    #[must_use]
    pub const fn lod(&self) -> u32 {
        self.lod
    }

    /// A build job is in flight.
    #[must_use]
    pub const fn is_requested(&self) -> bool {
        self.requested
    }

    /// The mesh is built.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.mesh.is_some()
    }

    /// The built mesh.
    #[must_use]
    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        self.mesh.as_ref()
    }

    pub(crate) fn mark_requested(&mut self, requested: bool) {
        self.requested = requested;
    }

    pub(crate) fn store(&mut self, mesh: Arc<MeshData>) {
        self.requested = false;
        self.mesh = Some(mesh);
    }
}

/// A streamed terrain chunk.
#[derive(Debug)]
pub struct TerrainChunk {
    coord: ChunkCoord,
    bounds: ChunkBounds,
    terrain: Option<Arc<ChunkTerrain>>,
    terrain_requested: bool,
    slots: Vec<MeshSlot>,
    active_slot: Option<usize>,
    visible: bool,
}

impl TerrainChunk {
    /// Creates an empty, invisible chunk with one slot per tier.
    #[must_use]
    pub fn new(coord: ChunkCoord, chunk_size: f32, lods: &LodSpec) -> Self {
        Self {
            coord,
            bounds: ChunkBounds::of(coord, chunk_size),
            terrain: None,
            terrain_requested: false,
            slots: lods.levels().iter().map(|level| MeshSlot::new(level.lod)).collect(),
            active_slot: None,
            visible: false,
        }
    }

    /// Grid coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// World bounds (in streaming units, before world scale).
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &ChunkBounds {
        &self.bounds
    }

    /// Elevation and regions, once generated.
    #[must_use]
    pub fn terrain(&self) -> Option<&Arc<ChunkTerrain>> {
        self.terrain.as_ref()
    }

    /// Whether the chunk is currently shown.
    #[inline]
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Mesh slots, in LOD tier order.
    #[must_use]
    pub fn slots(&self) -> &[MeshSlot] {
        &self.slots
    }

    /// Tier index of the active mesh.
    #[inline]
    #[must_use]
    pub const fn active_slot(&self) -> Option<usize> {
        self.active_slot
    }

    /// LOD of the active mesh.
    #[must_use]
    pub fn active_lod(&self) -> Option<u32> {
        self.active_slot.map(|slot| self.slots[slot].lod)
    }

    /// The active mesh.
    #[must_use]
    pub fn active_mesh(&self) -> Option<&Arc<MeshData>> {
        self.active_slot.and_then(|slot| self.slots[slot].mesh())
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChunkState {
        if self.active_slot.is_some() {
            ChunkState::Active
        } else if self.slots.iter().any(MeshSlot::is_ready) {
            ChunkState::MeshReady
        } else if self.slots.iter().any(MeshSlot::is_requested) {
            ChunkState::MeshRequested
        } else if self.terrain.is_some() {
            ChunkState::NoiseReady
        } else if self.terrain_requested {
            ChunkState::NoiseRequested
        } else {
            ChunkState::NoDataPending
        }
    }

    pub(crate) const fn is_terrain_requested(&self) -> bool {
        self.terrain_requested
    }

    pub(crate) fn mark_terrain_requested(&mut self, requested: bool) {
        self.terrain_requested = requested;
    }

    pub(crate) fn store_terrain(&mut self, terrain: Arc<ChunkTerrain>) {
        self.terrain_requested = false;
        self.terrain = Some(terrain);
    }

    pub(crate) fn slot_mut(&mut self, slot: usize) -> &mut MeshSlot {
        &mut self.slots[slot]
    }

    pub(crate) fn set_active_slot(&mut self, slot: usize) {
        self.active_slot = Some(slot);
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> LodSpec {
        LodSpec::new(vec![
            LodLevel::new(0, 100.0),
            LodLevel::new(1, 200.0),
            LodLevel::new(4, 300.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_coord_from_position_rounds() {
        assert_eq!(ChunkCoord::from_position(Vec2::new(0.0, 0.0), 240.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_position(Vec2::new(119.0, -121.0), 240.0), ChunkCoord::new(0, -1));
        assert_eq!(ChunkCoord::from_position(Vec2::new(120.0, -120.0), 240.0), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::new(2, -3).centre(10.0), Vec2::new(20.0, -30.0));
    }

    #[test]
    fn test_bounds_distance() {
        let bounds = ChunkBounds::of(ChunkCoord::new(1, 0), 10.0);
        assert_eq!(bounds.distance_to(Vec2::new(10.0, 0.0)), 0.0);
        assert_eq!(bounds.distance_to(Vec2::new(12.0, 4.0)), 0.0);
        assert!((bounds.distance_to(Vec2::new(0.0, 0.0)) - 5.0).abs() < 1e-6);
        assert!((bounds.distance_to(Vec2::new(18.0, 9.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_lod_spec_rejects_bad_tables() {
        assert!(matches!(LodSpec::new(Vec::new()), Err(TerrainError::EmptyLodSpec)));
        assert!(matches!(
            LodSpec::new(vec![LodLevel::new(0, 100.0), LodLevel::new(1, 100.0)]),
            Err(TerrainError::LodThresholdsNotAscending { index: 1, .. })
        ));
        assert!(matches!(
            LodSpec::new(vec![LodLevel::new(0, 100.0), LodLevel::new(0, 200.0)]),
            Err(TerrainError::InvalidConfig(_))
        ));
        assert!(matches!(
            LodSpec::new(vec![LodLevel::new(0, f32::NAN)]),
            Err(TerrainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_lod_select_bounds() {
        let spec = spec();
        assert_eq!(spec.max_view_distance(), 300.0);
        assert_eq!(spec.select(0.0), 0);
        assert_eq!(spec.select(100.0), 0);
        assert_eq!(spec.select(100.5), 1);
        assert_eq!(spec.select(250.0), 2);
        assert_eq!(spec.select(10_000.0), 2, "Beyond every threshold uses the last tier");
    }

    #[test]
    fn test_lod_select_is_monotonic() {
        let spec = spec();
        let mut previous = 0;
        for step in 0..4000 {
            let selected = spec.select(step as f32 * 0.1);
            assert!(selected >= previous, "LOD decreased at distance {}", step as f32 * 0.1);
            previous = selected;
        }
    }

    #[test]
    fn test_new_chunk_state() {
        let mut chunk = TerrainChunk::new(ChunkCoord::new(3, 4), 10.0, &spec());
        assert_eq!(chunk.state(), ChunkState::NoDataPending);
        assert!(!chunk.is_visible());
        assert_eq!(chunk.slots().len(), 3);
        assert_eq!(chunk.slots()[2].lod(), 4);
        assert_eq!(chunk.active_lod(), None);

        chunk.mark_terrain_requested(true);
        assert_eq!(chunk.state(), ChunkState::NoiseRequested);

        chunk.slot_mut(1).store(Arc::new(MeshData::default()));
        assert_eq!(chunk.state(), ChunkState::MeshReady);

        chunk.set_active_slot(1);
        assert_eq!(chunk.state(), ChunkState::Active);
        assert_eq!(chunk.active_lod(), Some(1));
        assert!(chunk.active_mesh().is_some());
    }
}
