//! # Terrain Error Types
//!
//! Configuration problems that cannot be clamped into something sensible.
//! Everything else (bad scale, negative octaves, lacunarity below one) is
//! clamped silently, as the terrain should always come up.

use thiserror::Error;

use endless_core::TaskError;

/// Errors that can occur while setting up terrain generation or streaming.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// The LOD table has no entries, so there is no view distance.
    #[error("LOD table is empty: at least one level is required")]
    EmptyLodSpec,

    /// LOD thresholds must strictly increase.
    #[error("LOD thresholds must be ascending: level {index} has {threshold}, previous was {previous}")]
    LodThresholdsNotAscending {
        /// Position of the offending level in the table.
        index: usize,
        /// Threshold of the offending level.
        threshold: f32,
        /// Threshold of the level before it.
        previous: f32,
    },

    /// A configuration value is outside what can be clamped.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The TOML document could not be parsed.
    #[error("failed to parse terrain config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("failed to read terrain config: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool could not be started.
    #[error("worker pool error: {0}")]
    Worker(#[from] TaskError),
}

/// Result type for terrain setup.
pub type TerrainResult<T> = Result<T, TerrainError>;
