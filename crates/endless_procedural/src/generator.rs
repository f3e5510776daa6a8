//! # Terrain Generator
//!
//! Everything a worker needs to turn a chunk centre into terrain and a
//! terrain field into a mesh. The generator is immutable and shared with the
//! worker pool behind an `Arc`.
//!
//! The same two calls back the synchronous single-chunk preview:
//!
//! ```rust,ignore
//! let generator = TerrainGenerator::from_config(&TerrainConfig::default())?;
//! let terrain = generator.generate_chunk(Vec2::ZERO);
//! let mesh = generator.build_mesh(&terrain.elevation, 0);
//! ```

use endless_core::Vec2;

use crate::config::{MeshConfig, TerrainConfig};
use crate::error::TerrainResult;
use crate::falloff::{apply_falloff, generate_falloff};
use crate::height_curve::HeightCurve;
use crate::mesh::{build_terrain_mesh, MeshData};
use crate::noise_field::{generate_noise_map, ElevationField, NoiseSettings};
use crate::region::{RegionMap, RegionTable};

/// A chunk's generated terrain.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkTerrain {
    /// Elevation field, side `field_size + 2`.
    pub elevation: ElevationField,
    /// Region index for each interior cell.
    pub regions: RegionMap,
}

/// Immutable generation parameters shared by every chunk.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    noise: NoiseSettings,
    field_size: usize,
    height_multiplier: f32,
    height_curve: HeightCurve,
    regions: RegionTable,
    falloff: Option<ElevationField>,
}

impl TerrainGenerator {
    /// Creates a generator without regions or falloff.
    ///
    /// `field_size` is the interior side; chunk size is `field_size - 1`.
    #[must_use]
    pub fn new(noise: NoiseSettings, mesh: &MeshConfig) -> Self {
        Self {
            noise: noise.clamped(),
            field_size: mesh.field_size.max(2),
            height_multiplier: mesh.height_multiplier,
            height_curve: mesh.height_curve.clone(),
            regions: RegionTable::default(),
            falloff: None,
        }
    }

    /// Builds a generator from a config document.
    ///
    /// # Errors
    ///
    /// Returns the `TerrainConfig::validate` error, if any.
    pub fn from_config(config: &TerrainConfig) -> TerrainResult<Self> {
        let config = config.sanitized();
        config.validate()?;
        Ok(Self::new(config.noise.to_settings(), &config.mesh)
            .with_regions(config.region_table())
            .with_falloff(config.falloff.enabled))
    }

    /// Sets the region table.
    #[must_use]
    pub fn with_regions(mut self, regions: RegionTable) -> Self {
        self.regions = regions;
        self
    }

    /// Enables or disables the island falloff mask.
    #[must_use]
    pub fn with_falloff(mut self, enabled: bool) -> Self {
        self.falloff = enabled.then(|| generate_falloff(self.field_side()));
        self
    }

    /// Interior samples per side.
    #[inline]
    #[must_use]
    pub const fn field_size(&self) -> usize {
        self.field_size
    }

    /// Field side including the border ring.
    #[inline]
    #[must_use]
    pub const fn field_side(&self) -> usize {
        self.field_size + 2
    }

    /// Chunk edge length in streaming units.
    #[inline]
    #[must_use]
    pub fn chunk_size(&self) -> f32 {
        (self.field_size - 1) as f32
    }

    /// Noise parameters (already clamped).
    #[must_use]
    pub fn noise_settings(&self) -> &NoiseSettings {
        &self.noise
    }

    /// Region table.
    #[must_use]
    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    /// Whether the falloff mask is applied.
    #[must_use]
    pub fn falloff_enabled(&self) -> bool {
        self.falloff.is_some()
    }

    /// Generates the elevation field centred on `centre`.
    #[must_use]
    pub fn generate_elevation(&self, centre: Vec2) -> ElevationField {
        let side = self.field_side();
        let mut field = generate_noise_map(side, side, &self.noise, centre);
        if let Some(mask) = &self.falloff {
            apply_falloff(&mut field, mask);
        }
        field
    }

    /// Generates elevation and regions for the chunk centred on `centre`.
    #[must_use]
    pub fn generate_chunk(&self, centre: Vec2) -> ChunkTerrain {
        let elevation = self.generate_elevation(centre);
        let regions = self.regions.classify_field(&elevation);
        ChunkTerrain { elevation, regions }
    }

    /// Builds the mesh for `field` at `lod`.
    #[must_use]
    pub fn build_mesh(&self, field: &ElevationField, lod: u32) -> MeshData {
        build_terrain_mesh(field, self.height_multiplier, &self.height_curve, lod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::WorldSeed;

    fn generator(field_size: usize) -> TerrainGenerator {
        let mesh = MeshConfig {
            field_size,
            ..MeshConfig::default()
        };
        let noise = NoiseSettings {
            seed: WorldSeed::new(99),
            scale: 20.0,
            ..NoiseSettings::default()
        };
        TerrainGenerator::new(noise, &mesh).with_regions(RegionTable::standard())
    }

    #[test]
    fn test_chunk_dimensions() {
        let generator = generator(17);
        assert_eq!(generator.field_side(), 19);
        assert_eq!(generator.chunk_size(), 16.0);

        let terrain = generator.generate_chunk(Vec2::ZERO);
        assert_eq!(terrain.elevation.width(), 19);
        assert_eq!((terrain.regions.width(), terrain.regions.height()), (17, 17));

        let mesh = generator.build_mesh(&terrain.elevation, 0);
        assert_eq!(mesh.vertices().len(), 17 * 17);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = generator(17);
        let a = generator.generate_chunk(Vec2::new(32.0, -16.0));
        let b = generator.generate_chunk(Vec2::new(32.0, -16.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_falloff_sinks_edges() {
        let plain = generator(33);
        let island = generator(33).with_falloff(true);
        assert!(island.falloff_enabled());

        let field = island.generate_elevation(Vec2::ZERO);
        let plain_field = plain.generate_elevation(Vec2::ZERO);
        let side = island.field_side();

        // The mask is exactly 1 at the corners
        for (x, y) in [(0, 0), (side - 1, side - 1)] {
            let expected = (plain_field.get(x, y) - 1.0).clamp(0.0, 1.0);
            assert!((field.get(x, y) - expected).abs() < 1e-6);
        }
        for (sunk, raw) in field.values().iter().zip(plain_field.values()) {
            assert!(*sunk <= raw.max(0.0) + 1e-6);
            assert!((0.0..=1.0).contains(sunk));
        }
    }

    #[test]
    fn test_from_config() {
        let generator = TerrainGenerator::from_config(&TerrainConfig::default()).unwrap();
        assert_eq!(generator.chunk_size(), 240.0);
        assert!(!generator.falloff_enabled());
        assert_eq!(generator.regions().len(), RegionTable::standard().len());
    }
}
