//! Direction discretization.
//!
//! Angles are measured from the negative x-axis and increase through a full
//! turn, so `to_polar(-1.0, 0.0)` has angle `0` and `to_polar(1.0, 0.0)` has
//! angle `π`. A circle split into `n` slices maps every offset to one slice
//! index in `0..n`.

use std::f64::consts::{PI, TAU};

/// Convert a Cartesian offset to `(angle, distance)`.
pub fn to_polar(dx: f64, dy: f64) -> (f64, f64) {
    (PI - dy.atan2(dx), dx.hypot(dy))
}

/// Convert `(angle, distance)` back to a Cartesian offset.
pub fn from_polar(angle: f64, distance: f64) -> (f64, f64) {
    let theta = PI - angle;
    (distance * theta.cos(), distance * theta.sin())
}

/// Return the slice in `0..num_slices` that contains the offset `(dx, dy)`.
///
/// A zero offset has no direction and maps to slice 0. A zero slice count
/// also yields 0.
pub fn to_slice(dx: f64, dy: f64, num_slices: usize) -> usize {
    if num_slices <= 1 || (dx == 0.0 && dy == 0.0) {
        return 0;
    }
    let (angle, _) = to_polar(dx, dy);
    // An angle of exactly 2π (dy == -0.0, dx < 0) is the same direction as 0.
    ((angle / TAU * num_slices as f64).floor() as usize) % num_slices
}

/// The central angle of a slice.
pub fn slice_angle(slice: usize, num_slices: usize) -> f64 {
    (slice as f64 + 0.5) / num_slices.max(1) as f64 * TAU
}

/// Decode a slice into an offset of length `distance` along its central heading.
pub fn from_slice(slice: usize, num_slices: usize, distance: f64) -> (f64, f64) {
    from_polar(slice_angle(slice, num_slices), distance)
}

/// Euclidean distance between two points.
pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (ax - bx).hypot(ay - by)
}
