//! Pre-Delay Line
//!
//! One `DelayStore` per channel sized to the longest supported pre-delay.
//! The delay itself is chosen per block; `read()` is always called after the
//! `write()` of the same step, so a delay of zero returns the sample just
//! written.

use super::delay_store::DelayStore;

pub const PRE_DELAY_CHANNELS: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct PreDelayLine {
    stores: [DelayStore; PRE_DELAY_CHANNELS],
    max_delay_samples: usize,
}

impl PreDelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(&mut self, max_delay_samples: usize) {
        self.max_delay_samples = max_delay_samples;
        for store in &mut self.stores {
            // One extra slot because the read happens after the write.
            store.prepare(max_delay_samples + 1);
        }
    }

    #[inline]
    pub fn max_delay_samples(&self) -> usize {
        self.max_delay_samples
    }

    #[inline]
    pub fn write(&mut self, channel: usize, sample: f32) {
        if let Some(store) = self.stores.get_mut(channel) {
            store.write(sample);
        }
    }

    /// Sample written `delay_samples` steps before the latest write.
    #[inline]
    pub fn read(&self, channel: usize, delay_samples: usize) -> f32 {
        match self.stores.get(channel) {
            Some(store) => store.read_integer(delay_samples.min(self.max_delay_samples) + 1),
            None => 0.0,
        }
    }

    pub fn reset(&mut self) {
        for store in &mut self.stores {
            store.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_passes_current_sample() {
        let mut line = PreDelayLine::new();
        line.prepare(16);
        line.write(0, 0.5);
        assert_eq!(line.read(0, 0), 0.5);
    }

    #[test]
    fn delays_by_exact_sample_count() {
        let mut line = PreDelayLine::new();
        line.prepare(64);
        let mut out = Vec::new();
        for n in 0..40 {
            line.write(0, if n == 0 { 1.0 } else { 0.0 });
            out.push(line.read(0, 10));
        }
        assert_eq!(out.iter().position(|&s| s != 0.0), Some(10));
    }

    #[test]
    fn max_delay_is_reachable() {
        let mut line = PreDelayLine::new();
        line.prepare(32);
        line.write(1, 1.0);
        for _ in 0..32 {
            line.write(1, 0.0);
        }
        assert_eq!(line.read(1, 32), 1.0);
        // Requests past the maximum clamp to it.
        assert_eq!(line.read(1, 1_000), 1.0);
    }

    #[test]
    fn channels_are_independent() {
        let mut line = PreDelayLine::new();
        line.prepare(8);
        line.write(0, 1.0);
        line.write(1, -1.0);
        assert_eq!(line.read(0, 0), 1.0);
        assert_eq!(line.read(1, 0), -1.0);
        assert_eq!(line.read(2, 0), 0.0);
    }
}
