//! # Terrain Configuration
//!
//! One TOML document drives generation and streaming:
//!
//! ```toml
//! [noise]
//! seed = 42
//! scale = 50.0
//! octaves = 5
//! persistence = 0.5
//! lacunarity = 2.0
//! offset = [0.0, 0.0]
//! normalize_mode = "global"
//!
//! [mesh]
//! field_size = 241
//! height_multiplier = 30.0
//! height_curve = [{ time = 0.0, value = 0.0 }, { time = 1.0, value = 1.0 }]
//!
//! [streaming]
//! world_scale = 5.0
//! movement_threshold = 25.0
//! worker_threads = 0
//! retention_warning = 4096
//! lods = [
//!     { lod = 0, visible_threshold = 200.0 },
//!     { lod = 1, visible_threshold = 400.0 },
//!     { lod = 2, visible_threshold = 600.0 },
//! ]
//!
//! [[regions]]
//! name = "water"
//! height = 0.0
//! color = [52, 98, 190, 255]
//!
//! [falloff]
//! enabled = false
//! ```
//!
//! Every key is optional. Out-of-range noise values are clamped by
//! `sanitized`; only things that cannot be clamped (no LOD tiers, a field too
//! small to mesh) are errors.

use std::path::Path;

use serde::{Deserialize, Serialize};

use endless_core::Vec2;

use crate::chunk::{LodLevel, LodSpec};
use crate::error::{TerrainError, TerrainResult};
use crate::height_curve::HeightCurve;
use crate::noise::WorldSeed;
use crate::noise_field::{NoiseSettings, NormalizeMode, MIN_SCALE};
use crate::region::{RegionTable, TerrainRegion};

/// Default interior samples per chunk side.
pub const DEFAULT_FIELD_SIZE: usize = 241;

/// Default viewer movement before the visible window is recomputed.
pub const DEFAULT_MOVEMENT_THRESHOLD: f32 = 25.0;

/// `[noise]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// World seed.
    pub seed: u64,
    /// World units per noise period.
    pub scale: f32,
    /// Octave count; negative values clamp to zero.
    pub octaves: i32,
    /// Amplitude multiplier per octave.
    pub persistence: f32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Global sample offset.
    pub offset: [f32; 2],
    /// Normalization mode.
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        let settings = NoiseSettings::default();
        Self {
            seed: settings.seed.value(),
            scale: settings.scale,
            octaves: settings.octaves as i32,
            persistence: settings.persistence,
            lacunarity: settings.lacunarity,
            offset: settings.offset.to_array(),
            normalize_mode: settings.normalize_mode,
        }
    }
}

impl NoiseConfig {
    /// Converts to generator settings.
    #[must_use]
    pub fn to_settings(&self) -> NoiseSettings {
        NoiseSettings {
            seed: WorldSeed::new(self.seed),
            scale: self.scale,
            octaves: u32::try_from(self.octaves).unwrap_or(0),
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            offset: Vec2::new(self.offset[0], self.offset[1]),
            normalize_mode: self.normalize_mode,
        }
    }
}

/// `[mesh]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Interior samples per chunk side. Chunk size is `field_size - 1`.
    pub field_size: usize,
    /// Vertex height scale.
    pub height_multiplier: f32,
    /// Elevation response curve.
    pub height_curve: HeightCurve,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            field_size: DEFAULT_FIELD_SIZE,
            height_multiplier: 30.0,
            height_curve: HeightCurve::linear(),
        }
    }
}

/// `[streaming]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// LOD tiers, ascending by threshold.
    pub lods: Vec<LodLevel>,
    /// Viewer positions are divided by this before any streaming math.
    pub world_scale: f32,
    /// Viewer movement (in streaming units) that triggers a recompute.
    pub movement_threshold: f32,
    /// Worker threads; `0` uses every available core.
    pub worker_threads: usize,
    /// Loaded-chunk count above which a warning is logged once.
    pub retention_warning: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            lods: vec![
                LodLevel::new(0, 200.0),
                LodLevel::new(1, 400.0),
                LodLevel::new(2, 600.0),
            ],
            world_scale: 5.0,
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            worker_threads: 0,
            retention_warning: 4096,
        }
    }
}

impl StreamingConfig {
    /// Validated LOD tiers.
    ///
    /// # Errors
    ///
    /// See `LodSpec::new`.
    pub fn lod_spec(&self) -> TerrainResult<LodSpec> {
        LodSpec::new(self.lods.clone())
    }
}

/// `[falloff]` table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalloffConfig {
    /// Subtract the island mask from every field. Breaks seams between
    /// chunks, so only single-chunk previews should enable it.
    pub enabled: bool,
}

/// The whole terrain document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// `[noise]`
    pub noise: NoiseConfig,
    /// `[mesh]`
    pub mesh: MeshConfig,
    /// `[streaming]`
    pub streaming: StreamingConfig,
    /// `[[regions]]`, ascending by height.
    pub regions: Vec<TerrainRegion>,
    /// `[falloff]`
    pub falloff: FalloffConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            mesh: MeshConfig::default(),
            streaming: StreamingConfig::default(),
            regions: RegionTable::standard().regions().to_vec(),
            falloff: FalloffConfig::default(),
        }
    }
}

impl TerrainConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` if the document is not valid TOML or has
    /// mistyped keys.
    pub fn from_toml_str(source: &str) -> TerrainResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `ConfigParse` if it does not
    /// parse.
    pub fn load(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!("Loaded terrain config from {}", path.display());
        Ok(config)
    }

    /// Returns a copy with out-of-range values clamped:
    ///
    /// - `scale <= 0` becomes `MIN_SCALE`
    /// - `lacunarity < 1` becomes `1`
    /// - `octaves < 0` becomes `0`
    /// - `world_scale <= 0` becomes `1`
    /// - `movement_threshold < 0` becomes `0`
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        let noise = &mut config.noise;
        if noise.scale.is_nan() || noise.scale <= 0.0 {
            noise.scale = MIN_SCALE;
        }
        if noise.lacunarity.is_nan() || noise.lacunarity < 1.0 {
            noise.lacunarity = 1.0;
        }
        noise.octaves = noise.octaves.max(0);

        let streaming = &mut config.streaming;
        if streaming.world_scale.is_nan() || streaming.world_scale <= 0.0 {
            streaming.world_scale = 1.0;
        }
        if streaming.movement_threshold.is_nan() || streaming.movement_threshold < 0.0 {
            streaming.movement_threshold = 0.0;
        }

        config
    }

    /// Checks what `sanitized` cannot fix.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the field is too small to hold a chunk, plus any
    /// `LodSpec` error.
    pub fn validate(&self) -> TerrainResult<()> {
        if self.mesh.field_size < 2 {
            return Err(TerrainError::InvalidConfig(format!(
                "field_size must be at least 2, got {}",
                self.mesh.field_size
            )));
        }
        self.streaming.lod_spec().map(|_| ())
    }

    /// Region table built from `[[regions]]`.
    #[must_use]
    pub fn region_table(&self) -> RegionTable {
        RegionTable::new(self.regions.clone())
    }
}
