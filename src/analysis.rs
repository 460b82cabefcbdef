//! Offline impulse-response measurements.
//!
//! Used by the render tool's report and by the integration tests. Allocates
//! freely; never call from the audio thread.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;
use std::fmt;

const DB_FLOOR: f32 = -200.0;
/// T20 window on the energy decay curve.
const EDC_START_DB: f32 = -5.0;
const EDC_END_DB: f32 = -25.0;

pub fn peak_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Schroeder backward-integrated energy in dB, 0 dB at the first sample.
pub fn energy_decay_curve_db(ir: &[f32]) -> Vec<f32> {
    let mut remaining = vec![0.0f64; ir.len()];
    let mut acc = 0.0f64;
    for (i, &s) in ir.iter().enumerate().rev() {
        acc += (s as f64) * (s as f64);
        remaining[i] = acc;
    }

    let total = acc;
    if total <= 0.0 {
        return vec![DB_FLOOR; ir.len()];
    }
    remaining
        .iter()
        .map(|&e| {
            if e > 0.0 {
                ((10.0 * (e / total).log10()) as f32).max(DB_FLOOR)
            } else {
                DB_FLOOR
            }
        })
        .collect()
}

/// RT60 estimate in seconds from the -5 dB → -25 dB slope of the decay
/// curve, extrapolated to 60 dB. `None` if the curve never gets that low.
pub fn estimate_rt60(ir: &[f32], sample_rate: f64) -> Option<f32> {
    if sample_rate <= 0.0 {
        return None;
    }
    let edc = energy_decay_curve_db(ir);
    if edc.first().map_or(true, |&db| db <= DB_FLOOR) {
        return None;
    }
    let start = edc.iter().position(|&db| db <= EDC_START_DB)?;
    let end = edc.iter().position(|&db| db <= EDC_END_DB)?;
    if end <= start {
        return None;
    }
    let seconds = (end - start) as f64 / sample_rate;
    Some((seconds * 60.0 / (EDC_START_DB - EDC_END_DB) as f64) as f32)
}

/// Fraction of spectral energy above `split_hz` (Hann-windowed FFT over the
/// whole slice).
pub fn high_frequency_ratio(samples: &[f32], sample_rate: f64, split_hz: f32) -> f32 {
    let n = samples.len();
    if n < 2 || sample_rate <= 0.0 {
        return 0.0;
    }

    let mut buf: Vec<Complex<f32>> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 - 0.5 * (2.0 * PI * i as f32 / (n - 1) as f32).cos();
            Complex::new(s * w, 0.0)
        })
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buf);

    let bin_hz = sample_rate as f32 / n as f32;
    let mut low = 0.0f64;
    let mut high = 0.0f64;
    for (k, c) in buf.iter().take(n / 2 + 1).enumerate() {
        let e = c.norm_sqr() as f64;
        if k as f32 * bin_hz >= split_hz {
            high += e;
        } else {
            low += e;
        }
    }

    let total = low + high;
    if total <= 0.0 {
        0.0
    } else {
        (high / total) as f32
    }
}

/// Summary of one rendered impulse response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseReport {
    pub sample_rate: f64,
    pub length: usize,
    pub peak: f32,
    pub rt60_seconds: Option<f32>,
    /// Energy share above 4 kHz.
    pub hf_ratio: f32,
}

pub const HF_SPLIT_HZ: f32 = 4_000.0;

impl ImpulseReport {
    pub fn measure(ir: &[f32], sample_rate: f64) -> Self {
        Self {
            sample_rate,
            length: ir.len(),
            peak: peak_abs(ir),
            rt60_seconds: estimate_rt60(ir, sample_rate),
            hf_ratio: high_frequency_ratio(ir, sample_rate, HF_SPLIT_HZ),
        }
    }
}

impl fmt::Display for ImpulseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  sample rate      : {} Hz", self.sample_rate)?;
        writeln!(f, "  length           : {} samples", self.length)?;
        writeln!(f, "  peak             : {:.4}", self.peak)?;
        match self.rt60_seconds {
            Some(rt) => writeln!(f, "  RT60 (T20)       : {:.3} s", rt)?,
            None => writeln!(f, "  RT60 (T20)       : n/a")?,
        }
        write!(f, "  energy > {:.0} Hz : {:.2}%", HF_SPLIT_HZ, self.hf_ratio * 100.0)
    }
}
