//! # Gradient Noise
//!
//! The base noise every fractal field is built from.
//!
//! `GradientNoise::sample01` returns a smooth value in `[0, 1]` for any
//! real coordinate. Fractal sums, offsets and normalization live in
//! `noise_field`; this module only knows about one octave.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, the permutation lattice and therefore every
//! sample is bit-identical between runs on the same machine.

use serde::{Deserialize, Serialize};

/// Root seed of a world.
///
/// The octave offsets and the gradient lattice are both derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Wraps a raw seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// The raw seed.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Mixes `purpose` into the seed, giving an independent stream per
    /// purpose (the gradient lattice uses one).
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-style multiply/xor mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Doubled 256-entry permutation, shuffled once from the seed.
struct PermutationTable {
    /// 512 entries so `perm[perm[x] + y + 1]` never needs wrapping.
    perm: [u8; 512],
}

impl PermutationTable {
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64; a zero state would never advance
        let mut state = seed.value() | 1;
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        perm.copy_within(0..256, 256);

        Self { perm }
    }

    #[inline]
    fn hash(&self, x: usize, y: usize) -> u8 {
        self.perm[self.perm[x] as usize + y]
    }
}

/// 2D gradient (Perlin) noise on an integer lattice.
///
/// # Example
///
/// ```rust,ignore
/// let noise = GradientNoise::new(WorldSeed::new(42));
/// let v = noise.sample01(12.3, -4.5);
/// assert!((0.0..=1.0).contains(&v));
/// ```
pub struct GradientNoise {
    table: PermutationTable,
}

impl GradientNoise {
    /// Creates a noise lattice from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            table: PermutationTable::new(seed),
        }
    }

    /// Samples signed noise, roughly in `[-1, 1]`.
    ///
    /// Integer lattice points always return exactly `0`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x_floor = x.floor();
        let y_floor = y.floor();

        // Wraps negatives correctly through two's complement
        let xi = (x_floor as i64 & 255) as usize;
        let yi = (y_floor as i64 & 255) as usize;

        let xf = x - x_floor;
        let yf = y - y_floor;

        let u = fade(xf);
        let v = fade(yf);

        let aa = self.table.hash(xi, yi);
        let ab = self.table.hash(xi, yi + 1);
        let ba = self.table.hash(xi + 1, yi);
        let bb = self.table.hash(xi + 1, yi + 1);

        let bottom = lerp(gradient(aa, xf, yf), gradient(ba, xf - 1.0, yf), u);
        let top = lerp(gradient(ab, xf, yf - 1.0), gradient(bb, xf - 1.0, yf - 1.0), u);

        lerp(bottom, top, v)
    }

    /// Samples noise remapped to `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn sample01(&self, x: f64, y: f64) -> f64 {
        ((self.sample(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Quintic smoothstep `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product with one of eight lattice gradients.
#[inline]
fn gradient(hash: u8, x: f64, y: f64) -> f64 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_lattice() {
        let first = GradientNoise::new(WorldSeed::new(12345));
        let second = GradientNoise::new(WorldSeed::new(12345));

        for i in 0..100 {
            let (x, y) = (f64::from(i) * 0.1, f64::from(i) * 0.17);
            assert_eq!(first.sample(x, y).to_bits(), second.sample(x, y).to_bits());
        }
    }

    #[test]
    fn test_seeds_shuffle_differently() {
        let one = GradientNoise::new(WorldSeed::new(1));
        let two = GradientNoise::new(WorldSeed::new(2));

        let differs = (0..64).any(|i| {
            let x = f64::from(i) * 0.37 + 0.5;
            one.sample(x, x * 0.7) != two.sample(x, x * 0.7)
        });
        assert!(differs, "Different seeds should produce different lattices");
    }

    #[test]
    fn test_lattice_points_are_zero() {
        let noise = GradientNoise::new(WorldSeed::new(7));
        for i in -5..5 {
            assert_eq!(noise.sample(f64::from(i), f64::from(i * 3)), 0.0);
        }
    }

    #[test]
    fn test_sample01_range() {
        let noise = GradientNoise::new(WorldSeed::new(42));

        for i in 0..10_000 {
            let x = f64::from(i) * 0.1 - 500.0;
            let y = f64::from(i) * 0.13 - 650.0;
            let value = noise.sample01(x, y);
            assert!((0.0..=1.0).contains(&value), "Value {value} out of range at ({x}, {y})");
        }
    }

    #[test]
    fn test_continuity() {
        let noise = GradientNoise::new(WorldSeed::new(42));

        let (x, y) = (100.3, 100.7);
        let here = noise.sample(x, y);
        assert!((here - noise.sample(x + 0.001, y)).abs() < 0.01);
        assert!((here - noise.sample(x, y + 0.001)).abs() < 0.01);
    }

    #[test]
    fn test_derived_streams_are_independent() {
        let root = WorldSeed::new(42);
        let lattice = root.derive(1);

        assert_eq!(lattice, root.derive(1));
        assert_ne!(lattice, root.derive(2));
        assert_ne!(lattice, root);
    }
}
