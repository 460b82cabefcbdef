//! Drive Stage
//!
//! Gain-compensated tanh saturation in front of the spring tank:
//! `tanh(x * gain) / gain`. At gain 1 it is nearly transparent for small
//! signals; higher gains round off peaks without raising small-signal level.

/// Extra gain added at full drive (gain range is [1, 1 + DRIVE_GAIN_RANGE]).
pub const DRIVE_GAIN_RANGE: f32 = 3.0;

/// Map the normalized drive amount onto the saturation gain.
#[inline]
pub fn drive_gain(amount: f32) -> f32 {
    1.0 + amount.clamp(0.0, 1.0) * DRIVE_GAIN_RANGE
}

#[inline]
pub fn apply_drive(x: f32, gain: f32) -> f32 {
    let gain = gain.max(1.0);
    (x * gain).tanh() / gain
}
