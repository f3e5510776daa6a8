//! # Chunk Streaming
//!
//! `StreamingManager` owns every chunk and decides, from viewer movement,
//! which chunks exist, which are visible and which LOD mesh each one shows.
//!
//! ## Frame Flow
//!
//! ```text
//! update(viewer)
//!   |- update_viewer: moved > threshold since last recompute?
//!   |     yes -> recompute window (create / refresh chunks)
//!   |- tick: drain field results -> store terrain -> refresh chunk
//!            drain mesh results  -> store mesh    -> refresh chunk
//! ```
//!
//! Heavy work (noise fields, meshes) runs on the shared `WorkerPool`. All
//! chunk state is mutated here, on the owning thread, when results are
//! drained. Nothing ever blocks on a worker.
//!
//! ## Retention
//!
//! Chunks are created on first sight and kept for the whole session. The
//! count is exposed through `loaded_chunk_count` and a warning is logged once
//! it passes `StreamingConfig::retention_warning`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use endless_core::{Completion, Submission, TaskQueue, Vec2, Vec3, WorkerPool};

use crate::chunk::{ChunkCoord, LodSpec, TerrainChunk};
use crate::config::{StreamingConfig, TerrainConfig};
use crate::error::{TerrainError, TerrainResult};
use crate::generator::{ChunkTerrain, TerrainGenerator};
use crate::mesh::{simplification_step, MeshData};

/// What a background job produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskPurpose {
    /// Elevation field plus regions.
    Elevation,
    /// Mesh at one LOD.
    Mesh {
        /// LOD being built.
        lod: u32,
    },
}

/// Dedup key for background jobs: one in-flight job per chunk and purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskKey {
    /// Chunk the job is for.
    pub coord: ChunkCoord,
    /// What the job builds.
    pub purpose: TaskPurpose,
}

impl TaskKey {
    /// Key for a chunk's elevation job.
    #[must_use]
    pub const fn elevation(coord: ChunkCoord) -> Self {
        Self {
            coord,
            purpose: TaskPurpose::Elevation,
        }
    }

    /// Key for a chunk's mesh job at `lod`.
    #[must_use]
    pub const fn mesh(coord: ChunkCoord, lod: u32) -> Self {
        Self {
            coord,
            purpose: TaskPurpose::Mesh { lod },
        }
    }
}

/// Something that happened to a chunk, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    /// A chunk entered the collection.
    Created {
        /// The chunk.
        coord: ChunkCoord,
    },
    /// Elevation and regions arrived.
    FieldReady {
        /// The chunk.
        coord: ChunkCoord,
    },
    /// The chunk now shows the mesh for `lod`.
    MeshActivated {
        /// The chunk.
        coord: ChunkCoord,
        /// LOD of the new active mesh.
        lod: u32,
    },
    /// The chunk was shown or hidden.
    VisibilityChanged {
        /// The chunk.
        coord: ChunkCoord,
        /// New visibility.
        visible: bool,
    },
}

/// Running counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Chunks created.
    pub chunks_created: u64,
    /// Elevation jobs completed successfully.
    pub fields_generated: u64,
    /// Mesh jobs completed successfully.
    pub meshes_built: u64,
    /// Active-mesh changes, first activation included.
    pub lod_swaps: u64,
    /// Visible-window recomputations.
    pub recomputes: u64,
    /// Jobs that failed or panicked.
    pub failed_tasks: u64,
}

/// Streams terrain chunks around a moving viewer.
pub struct StreamingManager {
    generator: Arc<TerrainGenerator>,
    lods: LodSpec,
    config: StreamingConfig,
    chunk_size: f32,
    visible_radius: i32,

    chunks: HashMap<ChunkCoord, TerrainChunk>,
    visible: HashSet<ChunkCoord>,

    /// Viewer in streaming units (world position / world scale).
    viewer: Vec2,
    last_recompute: Option<Vec2>,

    field_queue: TaskQueue<TaskKey, ChunkTerrain>,
    mesh_queue: TaskQueue<TaskKey, MeshData>,

    events: Vec<ChunkEvent>,
    stats: StreamingStats,
    retention_warned: bool,
}

impl StreamingManager {
    /// Creates a manager and starts its worker pool.
    ///
    /// # Errors
    ///
    /// - Any `LodSpec` validation error
    /// - `InvalidConfig` for a non-positive world scale or a negative
    ///   movement threshold
    /// - `Worker` if the pool cannot start
    pub fn new(generator: TerrainGenerator, config: StreamingConfig) -> TerrainResult<Self> {
        let lods = config.lod_spec()?;
        if !config.world_scale.is_finite() || config.world_scale <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "world_scale must be positive, got {}",
                config.world_scale
            )));
        }
        if config.movement_threshold.is_nan() || config.movement_threshold < 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "movement_threshold must not be negative, got {}",
                config.movement_threshold
            )));
        }

        let chunk_size = generator.chunk_size();
        let visible_radius = (lods.max_view_distance() / chunk_size).round() as i32;

        let interior_span = generator.field_size() - 1;
        for level in lods.levels() {
            if interior_span % simplification_step(level.lod) != 0 {
                tracing::warn!(
                    "LOD {} step does not divide chunk size {}; its meshes will leave gaps at seams",
                    level.lod,
                    interior_span
                );
            }
        }

        let pool = Arc::new(WorkerPool::new(config.worker_threads)?);
        tracing::info!(
            "Streaming started: chunk size {}, view distance {}, radius {} ({} workers)",
            chunk_size,
            lods.max_view_distance(),
            visible_radius,
            pool.thread_count()
        );

        Ok(Self {
            generator: Arc::new(generator),
            lods,
            config,
            chunk_size,
            visible_radius,
            chunks: HashMap::new(),
            visible: HashSet::new(),
            viewer: Vec2::ZERO,
            last_recompute: None,
            field_queue: TaskQueue::new(Arc::clone(&pool)),
            mesh_queue: TaskQueue::new(pool),
            events: Vec::new(),
            stats: StreamingStats::default(),
            retention_warned: false,
        })
    }

    /// Builds generator and manager from one config document.
    ///
    /// # Errors
    ///
    /// See `TerrainGenerator::from_config` and `StreamingManager::new`.
    pub fn from_config(config: &TerrainConfig) -> TerrainResult<Self> {
        let config = config.sanitized();
        let generator = TerrainGenerator::from_config(&config)?;
        Self::new(generator, config.streaming)
    }

    // =========================================================================
    // FRAME
    // =========================================================================

    /// Moves the viewer and applies finished work. Call once per frame.
    ///
    /// Returns the number of completions applied.
    pub fn update(&mut self, viewer_world: Vec2) -> usize {
        self.update_viewer(viewer_world);
        self.tick()
    }

    /// Moves the viewer (world units). Recomputes the visible window when
    /// the viewer has moved more than the movement threshold since the last
    /// recompute, and always on the first call.
    ///
    /// Returns `true` if the window was recomputed.
    pub fn update_viewer(&mut self, viewer_world: Vec2) -> bool {
        self.viewer = viewer_world / self.config.world_scale;

        let threshold_sq = self.config.movement_threshold * self.config.movement_threshold;
        let moved_enough = match self.last_recompute {
            Some(last) => last.distance_squared(self.viewer) > threshold_sq,
            None => true,
        };

        if moved_enough {
            self.last_recompute = Some(self.viewer);
            self.recompute_visible();
        }
        moved_enough
    }

    /// Drains both result queues and applies every completion: fields
    /// first, then meshes.
    ///
    /// Returns the number of completions applied.
    pub fn tick(&mut self) -> usize {
        let fields = self.field_queue.drain();
        let meshes = self.mesh_queue.drain();
        let applied = fields.len() + meshes.len();

        for done in fields {
            self.apply_field(done);
        }
        for done in meshes {
            self.apply_mesh(done);
        }
        applied
    }

    /// Returns and clears the pending events.
    pub fn take_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// True when no job is in flight or waiting to be drained.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.field_queue.in_flight_count() == 0 && self.mesh_queue.in_flight_count() == 0
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// Number of chunks held.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// A chunk, if it exists.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    /// Every chunk, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    /// Coordinates of the visible chunks, sorted.
    #[must_use]
    pub fn visible_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.visible.iter().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Chunk edge length in streaming units.
    #[must_use]
    pub const fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    /// Visibility horizon in streaming units.
    #[must_use]
    pub fn max_view_distance(&self) -> f32 {
        self.lods.max_view_distance()
    }

    /// Window half-width in chunks.
    #[must_use]
    pub const fn visible_radius(&self) -> i32 {
        self.visible_radius
    }

    /// Viewer in streaming units.
    #[must_use]
    pub const fn viewer_position(&self) -> Vec2 {
        self.viewer
    }

    /// The LOD tiers.
    #[must_use]
    pub const fn lod_spec(&self) -> &LodSpec {
        &self.lods
    }

    /// The shared generator.
    #[must_use]
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// World-space placement of a chunk's mesh: its centre scaled by the
    /// world scale, on the `y = 0` plane. Meshes should be scaled by
    /// `world_scale` as well.
    #[must_use]
    pub fn chunk_world_position(&self, coord: ChunkCoord) -> Vec3 {
        let centre = coord.centre(self.chunk_size) * self.config.world_scale;
        Vec3::new(centre.x, 0.0, centre.y)
    }

    /// Factor from streaming units to world units.
    #[must_use]
    pub const fn world_scale(&self) -> f32 {
        self.config.world_scale
    }

    // =========================================================================
    // WINDOW
    // =========================================================================

    fn recompute_visible(&mut self) {
        self.stats.recomputes += 1;

        let previous = std::mem::take(&mut self.visible);
        for coord in &previous {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.set_visible(false);
            }
        }

        let centre = ChunkCoord::from_position(self.viewer, self.chunk_size);
        let radius = self.visible_radius;
        let mut window = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coord = centre.offset(dx, dy);
                window.push(coord);
                if self.chunks.contains_key(&coord) {
                    self.refresh_chunk(coord, false);
                } else {
                    self.create_chunk(coord);
                }
            }
        }

        let mut hidden: Vec<_> = previous.difference(&self.visible).copied().collect();
        hidden.sort_unstable();
        for coord in hidden {
            self.events.push(ChunkEvent::VisibilityChanged { coord, visible: false });
        }
        for coord in window {
            if self.visible.contains(&coord) && !previous.contains(&coord) {
                self.events.push(ChunkEvent::VisibilityChanged { coord, visible: true });
            }
        }

        tracing::debug!(
            "Recomputed window around ({}, {}): {} visible, {} loaded",
            centre.x,
            centre.y,
            self.visible.len(),
            self.chunks.len()
        );
        self.check_retention();
    }

    fn create_chunk(&mut self, coord: ChunkCoord) {
        let chunk = TerrainChunk::new(coord, self.chunk_size, &self.lods);
        self.chunks.insert(coord, chunk);
        self.stats.chunks_created += 1;
        self.events.push(ChunkEvent::Created { coord });
        tracing::debug!("Created chunk ({}, {})", coord.x, coord.y);

        self.request_terrain(coord);
    }

    /// Re-evaluates distance, visibility and LOD for one chunk.
    ///
    /// With `emit` set, a visibility change is reported as an event; the
    /// window pass reports its changes as one diff instead.
    fn refresh_chunk(&mut self, coord: ChunkCoord, emit: bool) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let Some(terrain) = chunk.terrain().cloned() else {
            // Retry after a failed elevation job
            if !chunk.is_terrain_requested() {
                self.request_terrain(coord);
            }
            return;
        };

        let distance = chunk.bounds().distance_to(self.viewer);
        let visible = distance <= self.lods.max_view_distance();
        let was_visible = chunk.is_visible();

        let mut activated = None;
        let mut mesh_request = None;
        if visible {
            let slot = self.lods.select(distance);
            if chunk.active_slot() != Some(slot) {
                let lod = chunk.slots()[slot].lod();
                if chunk.slots()[slot].is_ready() {
                    chunk.set_active_slot(slot);
                    activated = Some(lod);
                } else if !chunk.slots()[slot].is_requested() {
                    chunk.slot_mut(slot).mark_requested(true);
                    mesh_request = Some(lod);
                }
            }
            self.visible.insert(coord);
        } else {
            self.visible.remove(&coord);
        }
        chunk.set_visible(visible);

        if let Some(lod) = activated {
            self.stats.lod_swaps += 1;
            self.events.push(ChunkEvent::MeshActivated { coord, lod });
            tracing::debug!("Chunk ({}, {}) switched to LOD {}", coord.x, coord.y, lod);
        }
        if emit && visible != was_visible {
            self.events.push(ChunkEvent::VisibilityChanged { coord, visible });
        }
        if let Some(lod) = mesh_request {
            self.request_mesh(coord, lod, terrain);
        }
    }

    fn check_retention(&mut self) {
        if !self.retention_warned && self.chunks.len() > self.config.retention_warning {
            self.retention_warned = true;
            tracing::warn!(
                "{} chunks loaded (warning threshold {}); chunks are never evicted",
                self.chunks.len(),
                self.config.retention_warning
            );
        }
    }

    // =========================================================================
    // JOBS
    // =========================================================================

    fn request_terrain(&mut self, coord: ChunkCoord) {
        let generator = Arc::clone(&self.generator);
        let centre = coord.centre(self.chunk_size);
        let submission = self
            .field_queue
            .submit(TaskKey::elevation(coord), move || Ok(generator.generate_chunk(centre)));

        if submission == Submission::Duplicate {
            tracing::debug!("Elevation for ({}, {}) already in flight", coord.x, coord.y);
        }
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.mark_terrain_requested(true);
        }
    }

    fn request_mesh(&mut self, coord: ChunkCoord, lod: u32, terrain: Arc<ChunkTerrain>) {
        let generator = Arc::clone(&self.generator);
        let submission = self.mesh_queue.submit(TaskKey::mesh(coord, lod), move || {
            Ok(generator.build_mesh(&terrain.elevation, lod))
        });

        if submission == Submission::Duplicate {
            tracing::debug!("Mesh LOD {} for ({}, {}) already in flight", lod, coord.x, coord.y);
        }
    }

    fn apply_field(&mut self, done: Completion<TaskKey, ChunkTerrain>) {
        let coord = done.key.coord;
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };

        match done.result {
            Ok(terrain) => {
                chunk.store_terrain(Arc::new(terrain));
                self.stats.fields_generated += 1;
                self.events.push(ChunkEvent::FieldReady { coord });
                self.refresh_chunk(coord, true);
            }
            Err(error) => {
                chunk.mark_terrain_requested(false);
                self.stats.failed_tasks += 1;
                tracing::warn!("Elevation for ({}, {}) failed: {}", coord.x, coord.y, error);
            }
        }
    }

    fn apply_mesh(&mut self, done: Completion<TaskKey, MeshData>) {
        let coord = done.key.coord;
        let TaskPurpose::Mesh { lod } = done.key.purpose else {
            return;
        };
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let Some(slot) = chunk.slots().iter().position(|slot| slot.lod() == lod) else {
            return;
        };

        match done.result {
            Ok(mesh) => {
                chunk.slot_mut(slot).store(Arc::new(mesh));
                self.stats.meshes_built += 1;
                self.refresh_chunk(coord, true);
            }
            Err(error) => {
                chunk.slot_mut(slot).mark_requested(false);
                self.stats.failed_tasks += 1;
                tracing::warn!("Mesh LOD {} for ({}, {}) failed: {}", lod, coord.x, coord.y, error);
            }
        }
    }
}
