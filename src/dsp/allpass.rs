//! Schroeder Allpass Section
//!
//! H(z) = (g + z^-N) / (1 + g z^-N), realised with a single delay store:
//!
//! ```text
//! v[n] = x[n] - g * v[n - N]
//! y[n] = g * v[n] + v[n - N]
//! ```
//!
//! `g` must lie in [0, 1); callers clamp it. The fixed variant reads at an
//! integer lag, the modulated variant at a fractional lag that may change
//! every sample.

use super::delay_store::DelayStore;

#[derive(Debug, Clone, Default)]
pub struct AllpassSection {
    store: DelayStore,
}

impl AllpassSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(&mut self, max_delay_samples: usize) {
        self.store.prepare(max_delay_samples);
    }

    /// Largest fractional delay the modulated variant can honour.
    #[inline]
    pub fn max_modulated_delay(&self) -> f32 {
        self.store.max_interpolated_delay()
    }

    #[inline]
    pub fn process(&mut self, input: f32, delay_samples: usize, g: f32) -> f32 {
        let delayed = self.store.read_integer(delay_samples);
        self.recur(input, delayed, g)
    }

    #[inline]
    pub fn process_modulated(&mut self, input: f32, delay_samples: f32, g: f32) -> f32 {
        let delayed = self.store.read_interpolated(delay_samples);
        self.recur(input, delayed, g)
    }

    #[inline]
    fn recur(&mut self, input: f32, delayed: f32, g: f32) -> f32 {
        let v = input - g * delayed;
        self.store.write(v);
        g * v + delayed
    }

    pub fn reset(&mut self) {
        self.store.reset();
    }
}
