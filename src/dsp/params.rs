//! Block-rate parameter snapshot.
//!
//! Every caller (plugin shell, render tool, tests) hands the engine the same
//! `ReverbParams` struct once per block. Values outside their documented
//! range are clamped, non-finite values fall back to the default.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const MIX_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Seconds (RT60).
pub const DECAY_RANGE: RangeInclusive<f32> = 0.1..=8.0;
pub const TENSION_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Milliseconds.
pub const PRE_DELAY_RANGE: RangeInclusive<f32> = 0.0..=100.0;
pub const DAMPING_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const WOBBLE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const DRIVE_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// The seven spring tank controls.
///
/// Uses `#[serde(default)]` so sparse settings files load correctly:
/// missing keys get their default values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    pub mix: f32,
    pub decay: f32,
    pub tension: f32,
    pub pre_delay: f32,
    pub damping: f32,
    pub wobble: f32,
    pub drive: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            mix: 0.5,
            decay: 2.0,
            tension: 0.5,
            pre_delay: 10.0,
            damping: 0.4,
            wobble: 0.3,
            drive: 0.2,
        }
    }
}

#[inline]
fn clamp_or(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        fallback
    }
}

impl ReverbParams {
    /// Copy with every field forced into its documented range.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            mix: clamp_or(self.mix, &MIX_RANGE, d.mix),
            decay: clamp_or(self.decay, &DECAY_RANGE, d.decay),
            tension: clamp_or(self.tension, &TENSION_RANGE, d.tension),
            pre_delay: clamp_or(self.pre_delay, &PRE_DELAY_RANGE, d.pre_delay),
            damping: clamp_or(self.damping, &DAMPING_RANGE, d.damping),
            wobble: clamp_or(self.wobble, &WOBBLE_RANGE, d.wobble),
            drive: clamp_or(self.drive, &DRIVE_RANGE, d.drive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let p = ReverbParams::default();
        assert_eq!(p, p.sanitized());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let p = ReverbParams {
            mix: 1.5,
            decay: 0.0,
            tension: -2.0,
            pre_delay: 500.0,
            damping: 3.0,
            wobble: -0.1,
            drive: 9.0,
        }
        .sanitized();
        assert_eq!(p.mix, 1.0);
        assert_eq!(p.decay, 0.1);
        assert_eq!(p.tension, 0.0);
        assert_eq!(p.pre_delay, 100.0);
        assert_eq!(p.damping, 1.0);
        assert_eq!(p.wobble, 0.0);
        assert_eq!(p.drive, 1.0);
    }

    #[test]
    fn non_finite_values_fall_back_to_defaults() {
        let p = ReverbParams {
            mix: f32::NAN,
            decay: f32::INFINITY,
            ..ReverbParams::default()
        }
        .sanitized();
        assert_eq!(p.mix, 0.5);
        assert_eq!(p.decay, 2.0);
    }

    #[test]
    fn sparse_json_fills_defaults() {
        let p: ReverbParams = serde_json::from_str(r#"{ "decay": 4.5, "wobble": 0.0 }"#).unwrap();
        assert_eq!(p.decay, 4.5);
        assert_eq!(p.wobble, 0.0);
        assert_eq!(p.mix, 0.5);
        assert_eq!(p.pre_delay, 10.0);
    }
}
