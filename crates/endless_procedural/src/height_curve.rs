//! # Height Curve
//!
//! Sampled response curve that reshapes normalized elevation before it is
//! multiplied into vertex height. Keys are `(time, value)` pairs joined by
//! straight segments; the curve does not have to be monotonic (a flat
//! plateau for water is the usual use).

use serde::{Deserialize, Serialize};

/// One key of a `HeightCurve`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Input elevation.
    pub time: f32,
    /// Output multiplier at that elevation.
    pub value: f32,
}

impl CurveKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear curve, clamped outside its key range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct HeightCurve {
    keys: Vec<CurveKey>,
}

impl HeightCurve {
    /// Builds a curve; keys are sorted by time. An empty key list is the
    /// identity curve.
    #[must_use]
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// `f(t) = t`.
    #[must_use]
    pub fn linear() -> Self {
        Self::new(vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)])
    }

    /// The sorted keys.
    #[must_use]
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluates the curve at `t`. NaN maps to the first key's value.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; t is inside the range so it exists and is > 0
        let upper = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.time) / span)
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl From<Vec<CurveKey>> for HeightCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<HeightCurve> for Vec<CurveKey> {
    fn from(curve: HeightCurve) -> Self {
        curve.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity_inside_range() {
        let curve = HeightCurve::linear();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.evaluate(t) - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_clamps_outside_keys() {
        let curve = HeightCurve::new(vec![CurveKey::new(0.2, 0.0), CurveKey::new(0.8, 2.0)]);
        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(1.5), 2.0);
        assert!((curve.evaluate(0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_water_plateau_is_not_monotonic_input() {
        // Keys given out of order still sort
        let curve = HeightCurve::new(vec![
            CurveKey::new(1.0, 1.0),
            CurveKey::new(0.0, 0.0),
            CurveKey::new(0.4, 0.0),
        ]);
        assert_eq!(curve.evaluate(0.1), 0.0);
        assert_eq!(curve.evaluate(0.4), 0.0);
        assert!((curve.evaluate(0.7) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nan_input_takes_first_key() {
        let curve = HeightCurve::new(vec![CurveKey::new(0.2, 0.5), CurveKey::new(0.8, 2.0)]);
        assert_eq!(curve.evaluate(f32::NAN), 0.5);
        assert_eq!(HeightCurve::linear().evaluate(f32::NAN), 0.0);
    }

    #[test]
    fn test_empty_is_identity() {
        let curve = HeightCurve::new(Vec::new());
        assert_eq!(curve.evaluate(3.5), 3.5);
    }

    #[test]
    fn test_deserializes_from_key_list() {
        #[derive(Deserialize)]
        struct Doc {
            curve: HeightCurve,
        }
        let doc: Doc = toml::from_str(
            "curve = [{ time = 0.0, value = 0.0 }, { time = 1.0, value = 3.0 }]",
        )
        .unwrap();
        assert!((doc.curve.evaluate(0.5) - 1.5).abs() < 1e-6);
    }
}
