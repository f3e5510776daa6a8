//! # Falloff Mask
//!
//! Square island mask: `0` in the middle, rising towards `1` at the edges.
//! Subtracting it from a field sinks the borders, which turns a single
//! preview chunk into an island. It breaks seams, so streamed worlds leave it
//! disabled.

use crate::noise_field::ElevationField;

/// Steepness of the falloff curve.
const CURVE_A: f32 = 3.0;
/// Where the falloff curve crosses one half.
const CURVE_B: f32 = 2.2;

/// Generates a `size` x `size` falloff mask.
#[must_use]
pub fn generate_falloff(size: usize) -> ElevationField {
    let mut values = Vec::with_capacity(size * size);
    let span = size.saturating_sub(1).max(1) as f32;

    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / span * 2.0 - 1.0;
            let fy = y as f32 / span * 2.0 - 1.0;
            values.push(evaluate(fx.abs().max(fy.abs())));
        }
    }

    ElevationField::from_values(size, size, values)
}

/// `v^a / (v^a + (b - b*v)^a)`
fn evaluate(value: f32) -> f32 {
    let near = value.powf(CURVE_A);
    let far = (CURVE_B - CURVE_B * value).powf(CURVE_A);
    near / (near + far)
}

/// Subtracts `mask` from `field` cell by cell, clamping into `[0, 1]`.
///
/// # Panics
///
/// Panics if the two grids have different dimensions.
pub fn apply_falloff(field: &mut ElevationField, mask: &ElevationField) {
    assert_eq!(
        (field.width(), field.height()),
        (mask.width(), mask.height()),
        "Falloff mask must match the field"
    );
    for (cell, &fall) in field.values_mut().iter_mut().zip(mask.values()) {
        *cell = (*cell - fall).clamp(0.0, 1.0);
    }
}
