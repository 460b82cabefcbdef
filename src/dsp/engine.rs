//! Spring tank engine (block renderer).
//!
//! Owns the pre-delay, both strings and the mix/drive smoothers. Once per
//! block it derives coefficients from a `ReverbParams` snapshot, then runs
//! the per-sample recurrence and blends wet with dry in place.
//!
//! ## Audio Thread Safety
//! - All stores are sized in `prepare()`
//! - `process()` and `reset()` never allocate, lock or panic on bad input
//! - `process()` before `prepare()` leaves the buffer untouched

use super::coeffs::{BlockCoefficients, RateConstants};
use super::drive::drive_gain;
use super::params::{ReverbParams, DECAY_RANGE};
use super::pre_delay::PreDelayLine;
use super::smoother::{LinearSmoother, SMOOTHING_SECONDS};
use super::spring::{SpringString, StringBlock, STRING_A, STRING_B};
use super::utils::{ms_to_samples, seconds_to_samples};

/// Longest pre-delay the stores are sized for.
pub const MAX_PRE_DELAY_MS: f64 = 100.0;
/// Largest modulation excursion of the third allpass stage.
pub const MAX_WOBBLE_MS: f64 = 3.0;

const LEFT: usize = 0;
const RIGHT: usize = 1;

#[derive(Debug, Clone)]
pub struct SpringTankEngine {
    sample_rate: f64,
    max_block_size: usize,
    prepared: bool,

    pre_delay: PreDelayLine,
    strings: [SpringString; 2],

    mix: LinearSmoother,
    drive: LinearSmoother,
    // Snap smoothers to the first block after prepare/reset.
    seed_smoothers: bool,

    rate: RateConstants,
    coeffs: BlockCoefficients,
}

impl Default for SpringTankEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpringTankEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            max_block_size: 0,
            prepared: false,
            pre_delay: PreDelayLine::new(),
            strings: [SpringString::new(STRING_A), SpringString::new(STRING_B)],
            mix: LinearSmoother::default(),
            drive: LinearSmoother::default(),
            seed_smoothers: true,
            rate: RateConstants::default(),
            coeffs: BlockCoefficients::default(),
        }
    }

    /// Size every store for `sample_rate` and clear all recurrent state.
    ///
    /// Allocates; call only while the audio callback is idle.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            log::warn!("spring tank: ignoring prepare with sample rate {sample_rate}");
            self.prepared = false;
            return;
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;

        let max_wobble = ms_to_samples(MAX_WOBBLE_MS, sample_rate) as f32;
        let max_pre_delay = seconds_to_samples(MAX_PRE_DELAY_MS * 0.001, sample_rate) + 1;

        self.pre_delay.prepare(max_pre_delay);
        for string in &mut self.strings {
            string.prepare(sample_rate, max_wobble);
        }

        self.rate = RateConstants {
            sample_rate,
            loop_seconds: [
                self.strings[LEFT].loop_seconds(sample_rate),
                self.strings[RIGHT].loop_seconds(sample_rate),
            ],
            max_wobble_samples: max_wobble,
            max_pre_delay_samples: max_pre_delay,
        };

        self.mix.set_ramp(SMOOTHING_SECONDS, sample_rate);
        self.drive.set_ramp(SMOOTHING_SECONDS, sample_rate);

        self.prepared = true;
        self.reset();

        log::debug!(
            "spring tank prepared: sr={} block={} delays A={:?} B={:?} wobble={:.1} pre-delay max={}",
            sample_rate,
            max_block_size,
            self.strings[LEFT].base_delays(),
            self.strings[RIGHT].base_delays(),
            max_wobble,
            max_pre_delay
        );
    }

    /// Zero all delay contents, feedback values and LFO phases.
    pub fn reset(&mut self) {
        self.pre_delay.reset();
        for string in &mut self.strings {
            string.reset();
        }
        self.seed_smoothers = true;
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Coefficients used by the most recent block.
    #[inline]
    pub fn coefficients(&self) -> &BlockCoefficients {
        &self.coeffs
    }

    #[inline]
    pub fn strings(&self) -> &[SpringString; 2] {
        &self.strings
    }

    /// Samples of output that can follow the last non-silent input.
    pub fn tail_samples(&self) -> u32 {
        if !self.prepared {
            return 0;
        }
        let decay = seconds_to_samples(*DECAY_RANGE.end() as f64, self.sample_rate);
        (decay + self.coeffs.pre_delay_samples).min(u32::MAX as usize) as u32
    }

    fn update_block(&mut self, params: &ReverbParams) {
        let p = params.sanitized();
        self.coeffs = BlockCoefficients::derive(&p, &self.rate);

        for string in &mut self.strings {
            string.set_damping_cutoff(self.coeffs.lp_cutoff_hz, self.sample_rate);
        }

        if self.seed_smoothers {
            self.mix.snap(p.mix);
            self.drive.snap(p.drive);
            self.seed_smoothers = false;
        } else {
            self.mix.set_target(p.mix);
            self.drive.set_target(p.drive);
        }
    }

    /// Render one block in place. `channels` holds one slice per channel;
    /// only the first two carry audio, any further channels are cleared.
    pub fn process(&mut self, channels: &mut [&mut [f32]], params: &ReverbParams) {
        if !self.prepared || channels.is_empty() {
            return;
        }

        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        for extra in channels.iter_mut().skip(2) {
            extra.fill(0.0);
        }
        if frames == 0 {
            return;
        }

        self.update_block(params);

        let pre_delay = self.coeffs.pre_delay_samples;
        let blocks = [
            StringBlock {
                ap_coeff: self.coeffs.ap_coeff,
                feedback_gain: self.coeffs.feedback_gain[LEFT],
                wobble_depth: self.coeffs.wobble_depth,
            },
            StringBlock {
                ap_coeff: self.coeffs.ap_coeff,
                feedback_gain: self.coeffs.feedback_gain[RIGHT],
                wobble_depth: self.coeffs.wobble_depth,
            },
        ];

        let stereo = channels.len() >= 2;

        for n in 0..frames {
            let mix = self.mix.next_value();
            let gain = drive_gain(self.drive.next_value());

            let dry_l = channels[LEFT][n];
            let dry_r = if stereo { channels[RIGHT][n] } else { dry_l };

            self.pre_delay.write(LEFT, dry_l);
            let in_l = self.pre_delay.read(LEFT, pre_delay);
            let wet_l = self.strings[LEFT].process(in_l, gain, &blocks[LEFT]);

            self.pre_delay.write(RIGHT, dry_r);
            let in_r = self.pre_delay.read(RIGHT, pre_delay);
            let wet_r = self.strings[RIGHT].process(in_r, gain, &blocks[RIGHT]);

            let dry = 1.0 - mix;
            channels[LEFT][n] = dry_l * dry + wet_l * mix;
            if stereo {
                channels[RIGHT][n] = dry_r * dry + wet_r * mix;
            }
        }
    }
}
