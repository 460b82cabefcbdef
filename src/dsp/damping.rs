//! Damping Filter
//!
//! First-order topology-preserving-transform low-pass placed in each
//! string's feedback path. Cutoff changes take effect on the next sample
//! without resetting the integrator, so per-block updates stay click-free.

use super::utils::flush_denormal;
use std::f32::consts::PI;

const MIN_CUTOFF_HZ: f32 = 10.0;
const MAX_CUTOFF_RATIO: f32 = 0.49;

#[derive(Debug, Clone, Copy)]
pub struct DampingFilter {
    /// G = g / (1 + g), g = tan(pi * fc / fs)
    gain: f32,
    state: f32,
}

impl Default for DampingFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DampingFilter {
    pub fn new() -> Self {
        Self {
            gain: 1.0,
            state: 0.0,
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f64) {
        let sr = sample_rate as f32;
        if sr <= 0.0 {
            return;
        }
        // At very low rates the Nyquist bound wins over the 10 Hz floor.
        let max_fc = sr * MAX_CUTOFF_RATIO;
        let fc = cutoff_hz.clamp(MIN_CUTOFF_HZ.min(max_fc), max_fc);
        let g = (PI * fc / sr).tan();
        self.gain = g / (1.0 + g);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v = self.gain * (input - self.state);
        let out = v + self.state;
        self.state = flush_denormal(out + v);
        out
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_state_gain(filter: &mut DampingFilter, freq: f32, sr: f32) -> f32 {
        let mut peak = 0.0f32;
        for n in 0..(sr as usize) {
            let x = (2.0 * PI * freq * n as f32 / sr).sin();
            let y = filter.process(x);
            if n > sr as usize / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn passes_dc() {
        let mut f = DampingFilter::new();
        f.set_cutoff(2_000.0, 44_100.0);
        let mut y = 0.0;
        for _ in 0..2_000 {
            y = f.process(1.0);
        }
        assert!((y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn attenuates_above_cutoff() {
        let sr = 44_100.0;
        let mut f = DampingFilter::new();
        f.set_cutoff(2_000.0, sr as f64);
        let low = steady_state_gain(&mut f, 200.0, sr);
        f.reset();
        let high = steady_state_gain(&mut f, 12_000.0, sr);
        assert!(low > 0.95, "low={low}");
        assert!(high < 0.25, "high={high}");
    }

    #[test]
    fn cutoff_near_nyquist_stays_finite() {
        let mut f = DampingFilter::new();
        f.set_cutoff(16_000.0, 32_000.0);
        for n in 0..10_000 {
            let y = f.process(if n % 2 == 0 { 1.0 } else { -1.0 });
            assert!(y.is_finite());
            assert!(y.abs() <= 1.0 + 1e-3);
        }
    }

    #[test]
    fn very_low_sample_rate_keeps_cutoff_floor() {
        let mut f = DampingFilter::new();
        f.set_cutoff(16_000.0, 16.0);
        assert!(f.gain > 0.0 && f.gain < 1.0, "gain={}", f.gain);
        for n in 0..1_000 {
            let y = f.process(if n % 2 == 0 { 1.0 } else { -1.0 });
            assert!(y.is_finite() && y.abs() <= 1.0 + 1e-3);
        }
    }

    #[test]
    fn non_finite_input_does_not_stick() {
        let mut f = DampingFilter::new();
        f.set_cutoff(5_000.0, 48_000.0);
        f.process(f32::NAN);
        f.process(0.0);
        assert_eq!(f.process(0.0), 0.0);
    }

    #[test]
    fn decays_to_exact_zero() {
        let mut f = DampingFilter::new();
        f.set_cutoff(5_000.0, 48_000.0);
        f.process(1.0);
        let mut y = 1.0;
        for _ in 0..20_000 {
            y = f.process(0.0);
        }
        assert_eq!(y, 0.0);
    }
}
