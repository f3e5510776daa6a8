//! # Endless Procedural
//!
//! Endless terrain, streamed in square chunks around a moving viewer.
//!
//! ## Pipeline
//!
//! 1. **Noise field** - fractal gradient noise per chunk, globally normalized
//!    so independently generated neighbours agree at their shared edge
//! 2. **Mesh builder** - LOD height meshes whose border ring keeps seam
//!    normals continuous at full detail without looking at neighbours
//! 3. **Streaming** - the visible window follows the viewer; fields and meshes
//!    are built on the worker pool and applied on the owning thread
//!
//! ## Determinism Guarantee
//!
//! Given the same config and seed, every chunk's field and mesh are
//! bit-identical between runs on the same machine.
//!
//! ## Example
//!
//! ```rust,ignore
//! use endless_core::Vec2;
//! use endless_procedural::{StreamingManager, TerrainConfig};
//!
//! let config = TerrainConfig::load("terrain.toml")?;
//! let mut streaming = StreamingManager::from_config(&config)?;
//!
//! // Every frame
//! streaming.update(Vec2::new(viewer.x, viewer.z));
//! for event in streaming.take_events() {
//!     // show/hide chunk objects, upload new meshes
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod falloff;
pub mod generator;
pub mod height_curve;
pub mod mesh;
pub mod noise;
pub mod noise_field;
pub mod region;
pub mod streaming;

pub use chunk::{ChunkBounds, ChunkCoord, ChunkState, LodLevel, LodSpec, MeshSlot, TerrainChunk};
pub use config::{FalloffConfig, MeshConfig, NoiseConfig, StreamingConfig, TerrainConfig};
pub use error::{TerrainError, TerrainResult};
pub use falloff::{apply_falloff, generate_falloff};
pub use generator::{ChunkTerrain, TerrainGenerator};
pub use height_curve::{CurveKey, HeightCurve};
pub use mesh::{build_terrain_mesh, simplification_step, MeshData, VertexRef};
pub use noise::{GradientNoise, WorldSeed};
pub use noise_field::{generate_noise_map, ElevationField, NoiseSettings, NormalizeMode};
pub use region::{RegionMap, RegionTable, TerrainRegion};
pub use streaming::{ChunkEvent, StreamingManager, StreamingStats, TaskKey, TaskPurpose};
