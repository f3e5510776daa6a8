//! # Fractal Noise Fields
//!
//! Turns `NoiseSettings` into an `ElevationField`: a rectangular grid of
//! heights built from several octaves of `GradientNoise`.
//!
//! ## Normalization
//!
//! - `Local`: remap by the field's own min/max into `[0, 1]`. Good for a
//!   single preview; adjacent chunks will NOT agree at their shared edge.
//! - `Global`: `(value + 1) / sum(persistence^i)`, clamped below at `0`.
//!   The upper bound is deliberately left open: a cell can exceed `1` when
//!   octaves line up. Every streamed chunk uses this mode so that two
//!   independently generated neighbours produce the same height for the same
//!   world position.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use endless_core::Vec2;

use crate::noise::{GradientNoise, WorldSeed};

/// Smallest usable noise scale; anything at or below zero is clamped to it.
pub const MIN_SCALE: f32 = 0.0001;

/// Range of the random per-octave offsets.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Seed purpose for the gradient lattice, independent of the offset stream.
const LATTICE_PURPOSE: u64 = 0x1A77_1CE;

/// How raw fractal sums are mapped into heights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Remap by the field's own min/max. Not seam-safe.
    Local,
    /// Remap by the theoretical amplitude sum. Seam-safe.
    #[default]
    Global,
}

/// Parameters for a fractal noise field.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseSettings {
    /// Seed for the octave offsets and the gradient lattice.
    pub seed: WorldSeed,
    /// World units per noise period. Clamped to `MIN_SCALE`.
    pub scale: f32,
    /// Number of octaves summed.
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f32,
    /// Frequency multiplier per octave. Clamped to at least `1`.
    pub lacunarity: f32,
    /// Global sample offset added to every chunk centre.
    pub offset: Vec2,
    /// Normalization applied after summing.
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default(),
            scale: 50.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Global,
        }
    }
}

impl NoiseSettings {
    /// Returns a copy with out-of-range values clamped.
    ///
    /// - `scale <= 0` (or NaN) becomes `MIN_SCALE`
    /// - `lacunarity < 1` becomes `1`
    #[must_use]
    pub fn clamped(&self) -> Self {
        let mut settings = self.clone();
        if settings.scale.is_nan() || settings.scale <= 0.0 {
            settings.scale = MIN_SCALE;
        }
        if settings.lacunarity.is_nan() || settings.lacunarity < 1.0 {
            settings.lacunarity = 1.0;
        }
        settings
    }

    /// Sum of all octave amplitudes, `sum(persistence^i)`.
    #[must_use]
    pub fn amplitude_sum(&self) -> f64 {
        let persistence = f64::from(self.persistence);
        let mut amplitude = 1.0;
        let mut total = 0.0;
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= persistence;
        }
        total
    }
}

/// Immutable 2D grid of heights, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationField {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl ElevationField {
    /// Wraps raw row-major values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != width * height`.
    #[must_use]
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), width * height, "Field size mismatch");
        Self { width, height, values }
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Value at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the field.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside field");
        self.values[y * self.width + x]
    }

    /// All values, row-major.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest value, or `None` for an empty field.
    #[must_use]
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let first = *self.values.first()?;
        Some(
            self.values
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Mutable access while the field is still being built.
    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }
}

/// Generates a `width` x `height` fractal noise field.
///
/// `centre` shifts sampling in world space (the chunk centre); it is added to
/// `settings.offset`. The x offset is added and the y offset subtracted, so
/// field rows run towards world -Y, matching the mesh layout.
///
/// Identical arguments always produce a bit-identical field.
#[must_use]
pub fn generate_noise_map(
    width: usize,
    height: usize,
    settings: &NoiseSettings,
    centre: Vec2,
) -> ElevationField {
    let settings = settings.clamped();
    let noise = GradientNoise::new(settings.seed.derive(LATTICE_PURPOSE));

    let offset_x = f64::from(settings.offset.x) + f64::from(centre.x);
    let offset_y = f64::from(settings.offset.y) + f64::from(centre.y);

    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed.value());
    let octave_offsets: Vec<(f64, f64)> = (0..settings.octaves)
        .map(|_| {
            let ox = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            let oy = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            (f64::from(ox) + offset_x, f64::from(oy) - offset_y)
        })
        .collect();

    let scale = f64::from(settings.scale);
    let persistence = f64::from(settings.persistence);
    let lacunarity = f64::from(settings.lacunarity);

    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let mut raw = Vec::with_capacity(width * height);
    let mut min_value = f64::MAX;
    let mut max_value = f64::MIN;

    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut value = 0.0;

            for &(ox, oy) in &octave_offsets {
                let sample_x = (x as f64 - half_width + ox) / scale * frequency;
                let sample_y = (y as f64 - half_height + oy) / scale * frequency;

                value += (noise.sample01(sample_x, sample_y) * 2.0 - 1.0) * amplitude;

                amplitude *= persistence;
                frequency *= lacunarity;
            }

            min_value = min_value.min(value);
            max_value = max_value.max(value);
            raw.push(value);
        }
    }

    let values = match settings.normalize_mode {
        NormalizeMode::Local => {
            let range = max_value - min_value;
            raw.iter()
                .map(|&v| if range > 0.0 { ((v - min_value) / range) as f32 } else { 0.0 })
                .collect()
        }
        NormalizeMode::Global => {
            // Zero octaves sum to zero; avoid dividing by an empty amplitude sum
            let amplitude_sum = settings.amplitude_sum();
            let divisor = if amplitude_sum > 0.0 { amplitude_sum } else { 1.0 };
            raw.iter()
                .map(|&v| ((v + 1.0) / divisor).max(0.0) as f32)
                .collect()
        }
    };

    ElevationField::from_values(width, height, values)
}
