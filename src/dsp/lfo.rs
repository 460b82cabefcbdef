//! Phase-accumulator LFO driving the modulated allpass stage.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, Default)]
pub struct Lfo {
    phase: f32,
    increment: f32,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rate(&mut self, rate_hz: f32, sample_rate: f64) {
        self.increment = if sample_rate > 0.0 {
            (rate_hz as f64 / sample_rate) as f32
        } else {
            0.0
        };
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// `sin(2π·phase)` at the current phase.
    #[inline]
    pub fn value(&self) -> f32 {
        (TAU * self.phase).sin()
    }

    #[inline]
    pub fn advance(&mut self) {
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_crossing() {
        let lfo = Lfo::new();
        assert_eq!(lfo.phase(), 0.0);
        assert!(lfo.value().abs() < 1e-6);
    }

    #[test]
    fn phase_stays_in_unit_interval() {
        let mut lfo = Lfo::new();
        lfo.set_rate(0.71, 44_100.0);
        for _ in 0..200_000 {
            lfo.advance();
            assert!((0.0..1.0).contains(&lfo.phase()));
        }
    }

    #[test]
    fn completes_one_cycle_per_period() {
        let sr = 48_000.0;
        let rate = 0.5;
        let mut lfo = Lfo::new();
        lfo.set_rate(rate, sr);

        let period = (sr / rate as f64) as usize;
        let mut wraps = 0;
        let mut last = lfo.phase();
        for _ in 0..period * 3 + period / 2 {
            lfo.advance();
            if lfo.phase() < last {
                wraps += 1;
            }
            last = lfo.phase();
        }
        assert_eq!(wraps, 3);
        assert!((lfo.phase() - 0.5).abs() < 0.02);
    }

    #[test]
    fn quarter_period_hits_peak() {
        let sr = 1_000.0;
        let mut lfo = Lfo::new();
        lfo.set_rate(1.0, sr);
        for _ in 0..250 {
            lfo.advance();
        }
        assert!((lfo.value() - 1.0).abs() < 1e-3);
    }
}
