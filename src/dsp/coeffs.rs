//! Parameter → coefficient mapping, evaluated once per block.
//!
//! Only mix and drive are smoothed per sample; everything here moves slowly
//! enough that a per-block update is inaudible.

use super::params::ReverbParams;
use super::utils::ms_to_samples;

pub const AP_COEFF_BASE: f32 = 0.30;
pub const AP_COEFF_SPAN: f32 = 0.45;
pub const AP_COEFF_MIN: f32 = 0.2;
pub const AP_COEFF_MAX: f32 = 0.8;

pub const DAMPING_BRIGHT_HZ: f32 = 16_000.0;
pub const DAMPING_SPAN_HZ: f32 = 14_000.0;

/// Stability ceiling for the loop gain, applied after the RT60 formula.
pub const MAX_FEEDBACK_GAIN: f32 = 0.95;
/// Floor on the decay divisor.
pub const MIN_DECAY_SECONDS: f32 = 0.01;

/// Allpass feedback coefficient from normalized tension.
#[inline]
pub fn allpass_coefficient(tension: f32) -> f32 {
    (AP_COEFF_BASE + tension * AP_COEFF_SPAN).clamp(AP_COEFF_MIN, AP_COEFF_MAX)
}

/// Damping low-pass cutoff: 0 → 16 kHz, 1 → 2 kHz.
#[inline]
pub fn damping_cutoff_hz(damping: f32) -> f32 {
    DAMPING_BRIGHT_HZ - damping * DAMPING_SPAN_HZ
}

/// Per-loop gain giving a 60 dB decay over `decay_seconds` for a loop of
/// `loop_seconds`: `10^(-3 * loop / decay)`, capped at `MAX_FEEDBACK_GAIN`.
#[inline]
pub fn feedback_gain(loop_seconds: f32, decay_seconds: f32) -> f32 {
    let decay = decay_seconds.max(MIN_DECAY_SECONDS);
    10.0f32
        .powf(-3.0 * loop_seconds / decay)
        .clamp(0.0, MAX_FEEDBACK_GAIN)
}

/// Values derived from one parameter snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockCoefficients {
    pub ap_coeff: f32,
    pub lp_cutoff_hz: f32,
    /// One gain per string, indexed like the strings.
    pub feedback_gain: [f32; 2],
    pub wobble_depth: f32,
    pub pre_delay_samples: usize,
}

/// Per-rate constants the block mapping depends on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateConstants {
    pub sample_rate: f64,
    pub loop_seconds: [f32; 2],
    pub max_wobble_samples: f32,
    pub max_pre_delay_samples: usize,
}

impl BlockCoefficients {
    /// `params` must already be sanitized.
    pub fn derive(params: &ReverbParams, rate: &RateConstants) -> Self {
        let pre_delay = ms_to_samples(params.pre_delay as f64, rate.sample_rate).max(0.0) as usize;

        Self {
            ap_coeff: allpass_coefficient(params.tension),
            lp_cutoff_hz: damping_cutoff_hz(params.damping),
            feedback_gain: [
                feedback_gain(rate.loop_seconds[0], params.decay),
                feedback_gain(rate.loop_seconds[1], params.decay),
            ],
            wobble_depth: params.wobble * rate.max_wobble_samples,
            pre_delay_samples: pre_delay.min(rate.max_pre_delay_samples),
        }
    }
}
