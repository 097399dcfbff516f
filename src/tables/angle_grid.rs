//! Angle grid shared by all lookup tables.
//!
//! Every tabulated optical property is sampled on the same fixed,
//! non-uniform grid of zenith angles. Queries arrive as continuous
//! angles in degrees and are mapped to either the nearest grid entry or
//! the upper bracketing entry of an interpolation pair.

/// Tabulated sample angles in degrees, strictly increasing.
pub const ANGLE_GRID: [f64; 13] = [
    0.0, 5.0, 17.5, 25.0, 32.5, 40.0, 47.5, 55.0, 62.5, 70.0, 75.0, 80.0, 90.0,
];

/// Index of the grid entry closest to `angle`.
///
/// Every real input maps to some index; queries outside the grid range
/// clamp to the nearest endpoint. Ties resolve to the lower index.
pub fn nearest_index(angle: f64) -> usize {
    let mut best = 0;
    let mut best_dist = (ANGLE_GRID[0] - angle).abs();
    for (i, &grid_angle) in ANGLE_GRID.iter().enumerate().skip(1) {
        let dist = (grid_angle - angle).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Smallest index whose grid angle lies strictly above `angle`, clamped
/// to the last index.
///
/// Index 0 is never returned: the Fourier summation interpolates between
/// the returned index and its predecessor, so the lowest usable upper
/// bracket is 1. Queries at or beyond the last grid angle clamp to the
/// last index.
pub fn upper_index(angle: f64) -> usize {
    for (i, &grid_angle) in ANGLE_GRID.iter().enumerate().skip(1) {
        if grid_angle > angle {
            return i;
        }
    }
    ANGLE_GRID.len() - 1
}
