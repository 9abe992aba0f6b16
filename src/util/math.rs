//! Small numeric helpers for grid quantization.

/// Rounds to the nearest integer, ties to even.
pub(crate) fn round_half_even(value: f32) -> i32 {
    value.round_ties_even() as i32
}

/// Number of pixels removed from each edge for a border clip fraction.
pub(crate) fn clip_margin(len: u32, clip: f32) -> u32 {
    (len as f32 * clip).floor().max(0.0) as u32
}
