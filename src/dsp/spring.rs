//! Spring Tank String
//!
//! One decorrelated reverberation path:
//!
//! ```text
//! pre-delayed in → drive → (+ feedback) → AP1 → AP2 → AP3[LFO] → wet out
//!                                                        └→ damping LP → × fbGain → feedback
//! ```
//!
//! The two strings share this type and differ only in their `StringTuning`.
//! Different base delays and LFO rates keep left and right from collapsing
//! into the same reflection pattern.

use super::allpass::AllpassSection;
use super::damping::DampingFilter;
use super::drive::apply_drive;
use super::lfo::Lfo;
use super::utils::{flush_denormal, seconds_to_samples};

pub const STAGES: usize = 3;
/// Index of the LFO-modulated stage.
pub const MODULATED_STAGE: usize = STAGES - 1;
/// Store slots reserved on top of each stage's longest delay.
const STAGE_MARGIN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringTuning {
    pub stage_delays_ms: [f32; STAGES],
    pub lfo_rate_hz: f32,
}

/// Left string: 5 / 9 / 14 ms, 0.50 Hz wobble.
pub const STRING_A: StringTuning = StringTuning {
    stage_delays_ms: [5.0, 9.0, 14.0],
    lfo_rate_hz: 0.50,
};

/// Right string: offset by 2 ms per stage, 0.71 Hz wobble.
pub const STRING_B: StringTuning = StringTuning {
    stage_delays_ms: [7.0, 11.0, 16.0],
    lfo_rate_hz: 0.71,
};

/// Per-block inputs to `SpringString::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringBlock {
    pub ap_coeff: f32,
    pub feedback_gain: f32,
    pub wobble_depth: f32,
}

#[derive(Debug, Clone)]
pub struct SpringString {
    tuning: StringTuning,
    stages: [AllpassSection; STAGES],
    base_delays: [usize; STAGES],
    damping: DampingFilter,
    lfo: Lfo,
    feedback: f32,
}

impl SpringString {
    pub fn new(tuning: StringTuning) -> Self {
        Self {
            tuning,
            stages: Default::default(),
            base_delays: [0; STAGES],
            damping: DampingFilter::new(),
            lfo: Lfo::new(),
            feedback: 0.0,
        }
    }

    /// Size every stage for `sample_rate` and clear all state.
    pub fn prepare(&mut self, sample_rate: f64, max_wobble_samples: f32) {
        for (delay, ms) in self.base_delays.iter_mut().zip(self.tuning.stage_delays_ms) {
            *delay = seconds_to_samples(ms as f64 * 0.001, sample_rate).max(1);
        }

        for (i, stage) in self.stages.iter_mut().enumerate() {
            let mut span = self.base_delays[i] + STAGE_MARGIN;
            if i == MODULATED_STAGE {
                span += max_wobble_samples.max(0.0).ceil() as usize;
            }
            stage.prepare(span);
        }

        self.lfo.set_rate(self.tuning.lfo_rate_hz, sample_rate);
        self.reset();
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.damping.reset();
        self.lfo.reset();
        self.feedback = 0.0;
    }

    #[inline]
    pub fn base_delays(&self) -> [usize; STAGES] {
        self.base_delays
    }

    /// Round-trip time of the unmodulated loop in seconds.
    pub fn loop_seconds(&self, sample_rate: f64) -> f32 {
        if sample_rate <= 0.0 {
            return 0.0;
        }
        (self.base_delays.iter().sum::<usize>() as f64 / sample_rate) as f32
    }

    pub fn set_damping_cutoff(&mut self, cutoff_hz: f32, sample_rate: f64) {
        self.damping.set_cutoff(cutoff_hz, sample_rate);
    }

    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    #[inline]
    pub fn lfo_phase(&self) -> f32 {
        self.lfo.phase()
    }

    /// Delay of the modulated stage at the current LFO phase.
    #[inline]
    pub fn modulated_delay(&self, wobble_depth: f32) -> f32 {
        let base = self.base_delays[MODULATED_STAGE] as f32;
        let delay = base + wobble_depth * self.lfo.value();
        delay.clamp(1.0, self.stages[MODULATED_STAGE].max_modulated_delay())
    }

    /// Run one sample through the string and return its wet contribution
    /// (modulated stage output, before damping).
    #[inline]
    pub fn process(&mut self, pre_delayed: f32, drive_gain: f32, block: &StringBlock) -> f32 {
        let g = block.ap_coeff;
        let mut v = apply_drive(pre_delayed, drive_gain) + self.feedback;

        v = self.stages[0].process(v, self.base_delays[0], g);
        v = self.stages[1].process(v, self.base_delays[1], g);

        let delay = self.modulated_delay(block.wobble_depth);
        let wet = self.stages[MODULATED_STAGE].process_modulated(v, delay, g);

        self.feedback = flush_denormal(self.damping.process(wet) * block.feedback_gain);
        self.lfo.advance();

        wet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44_100.0;

    fn block(fb: f32, wobble: f32) -> StringBlock {
        StringBlock {
            ap_coeff: 0.525,
            feedback_gain: fb,
            wobble_depth: wobble,
        }
    }

    fn prepared(tuning: StringTuning) -> SpringString {
        let mut s = SpringString::new(tuning);
        s.prepare(SR, 132.3);
        s.set_damping_cutoff(10_000.0, SR);
        s
    }

    #[test]
    fn base_delays_follow_tuning() {
        let a = prepared(STRING_A);
        let b = prepared(STRING_B);
        assert_eq!(a.base_delays(), [220, 396, 617]);
        assert_eq!(b.base_delays(), [308, 485, 705]);
        assert!(b.loop_seconds(SR) > a.loop_seconds(SR));
    }

    #[test]
    fn silence_in_silence_out() {
        let mut s = prepared(STRING_A);
        for _ in 0..10_000 {
            assert_eq!(s.process(0.0, 1.6, &block(0.9, 40.0)), 0.0);
        }
        assert_eq!(s.feedback(), 0.0);
    }

    #[test]
    fn impulse_tail_decays() {
        let mut s = prepared(STRING_A);
        let b = block(0.9, 40.0);
        s.process(1.0, 1.0, &b);

        let mut early = 0.0f32;
        let mut late = 0.0f32;
        for n in 0..(SR as usize * 4) {
            let y = s.process(0.0, 1.0, &b);
            assert!(y.is_finite());
            if n < 10_000 {
                early = early.max(y.abs());
            } else if n > SR as usize * 3 {
                late = late.max(y.abs());
            }
        }
        assert!(early > 0.0);
        assert!(late < early * 1e-3, "early={early} late={late}");
    }

    #[test]
    fn modulated_delay_oscillates_around_base() {
        let mut s = prepared(STRING_A);
        let depth = 50.0;
        let base = s.base_delays()[MODULATED_STAGE] as f32;
        let period = (SR / STRING_A.lfo_rate_hz as f64) as usize;

        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for _ in 0..period {
            let d = s.modulated_delay(depth);
            lo = lo.min(d);
            hi = hi.max(d);
            s.process(0.0, 1.0, &block(0.5, depth));
        }
        assert!((hi - (base + depth)).abs() < 0.5);
        assert!((lo - (base - depth)).abs() < 0.5);
    }

    #[test]
    fn zero_wobble_keeps_fixed_delay() {
        let mut s = prepared(STRING_B);
        let base = s.base_delays()[MODULATED_STAGE] as f32;
        for _ in 0..5_000 {
            assert_eq!(s.modulated_delay(0.0), base);
            s.process(0.1, 1.0, &block(0.5, 0.0));
        }
    }

    #[test]
    fn nan_input_does_not_poison_the_loop() {
        let mut s = prepared(STRING_A);
        let b = block(0.9, 40.0);
        s.process(f32::NAN, 1.6, &b);
        assert!(s.feedback().is_finite());
        for _ in 0..(SR as usize) {
            assert!(s.process(0.0, 1.6, &b).is_finite());
        }
        assert_eq!(s.feedback(), 0.0);
    }

    #[test]
    fn reset_clears_feedback_and_phase() {
        let mut s = prepared(STRING_A);
        for _ in 0..1_000 {
            s.process(0.5, 2.0, &block(0.9, 60.0));
        }
        assert!(s.feedback() != 0.0);
        assert!(s.lfo_phase() > 0.0);
        s.reset();
        assert_eq!(s.feedback(), 0.0);
        assert_eq!(s.lfo_phase(), 0.0);
    }
}
