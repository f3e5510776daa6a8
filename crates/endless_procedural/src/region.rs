//! # Terrain Regions
//!
//! Elevation bands (water, sand, grass, rock, snow...) used to derive a
//! per-cell region index from a chunk's field. The index is what an external
//! renderer turns into a colour texture; `RegionMap::colors` does the lookup
//! for callers that just want RGBA.

use serde::{Deserialize, Serialize};

use crate::noise_field::ElevationField;

/// One elevation band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainRegion {
    /// Display name.
    pub name: String,
    /// Lowest elevation of the band.
    pub height: f32,
    /// RGBA colour.
    pub color: [u8; 4],
}

impl TerrainRegion {
    /// Creates a region.
    #[must_use]
    pub fn new(name: impl Into<String>, height: f32, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            height,
            color,
        }
    }
}

/// Ordered list of regions, ascending by height.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionTable {
    regions: Vec<TerrainRegion>,
}

impl RegionTable {
    /// Wraps a region list. The list is expected in ascending height order;
    /// classification stops at the first band that is too high.
    #[must_use]
    pub fn new(regions: Vec<TerrainRegion>) -> Self {
        Self { regions }
    }

    /// A small water-to-snow palette.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            TerrainRegion::new("deep_water", 0.0, [33, 60, 140, 255]),
            TerrainRegion::new("water", 0.3, [52, 98, 190, 255]),
            TerrainRegion::new("sand", 0.4, [210, 208, 125, 255]),
            TerrainRegion::new("grass", 0.45, [86, 152, 23, 255]),
            TerrainRegion::new("forest", 0.55, [62, 107, 18, 255]),
            TerrainRegion::new("rock", 0.6, [90, 69, 60, 255]),
            TerrainRegion::new("rock_high", 0.7, [75, 60, 53, 255]),
            TerrainRegion::new("snow", 0.9, [255, 255, 255, 255]),
        ])
    }

    /// The regions.
    #[must_use]
    pub fn regions(&self) -> &[TerrainRegion] {
        &self.regions
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True when there are no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Index of the highest band whose `height <= value`, or `None` when the
    /// value is below every band.
    #[must_use]
    pub fn classify(&self, value: f32) -> Option<u8> {
        let mut found = None;
        for (i, region) in self.regions.iter().enumerate().take(usize::from(u8::MAX) + 1) {
            if value >= region.height {
                found = Some(i as u8);
            } else {
                break;
            }
        }
        found
    }

    /// Classifies the interior of `field` (the outer ring is skipped).
    #[must_use]
    pub fn classify_field(&self, field: &ElevationField) -> RegionMap {
        let width = field.width().saturating_sub(2);
        let height = field.height().saturating_sub(2);
        let mut indices = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                indices.push(self.classify(field.get(x + 1, y + 1)));
            }
        }
        RegionMap { width, height, indices }
    }
}

/// Region index per interior cell, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionMap {
    width: usize,
    height: usize,
    indices: Vec<Option<u8>>,
}

impl RegionMap {
    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Region index at `(x, y)`, `None` below every band.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the map.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside region map");
        self.indices[y * self.width + x]
    }

    /// All indices, row-major.
    #[must_use]
    pub fn indices(&self) -> &[Option<u8>] {
        &self.indices
    }

    /// Resolves every index to a colour. Unclassified cells are transparent
    /// black.
    #[must_use]
    pub fn colors(&self, table: &RegionTable) -> Vec<[u8; 4]> {
        self.indices
            .iter()
            .map(|index| {
                index
                    .and_then(|i| table.regions().get(usize::from(i)))
                    .map_or([0, 0, 0, 0], |region| region.color)
            })
            .collect()
    }
}
