//! Circular Delay Store
//!
//! Fixed-capacity ring buffer shared by the pre-delay and the allpass
//! sections. Capacity is decided once in `prepare()`; `write()` and the
//! read methods never allocate and are safe on the audio thread.
//!
//! Lags are measured from the next write position: `read_integer(1)` is the
//! most recently written sample.

use super::utils::flush_denormal;

/// Extra slots kept beyond the largest requested delay so that both the
/// integer and the interpolated reads stay in bounds.
pub const STORE_HEADROOM: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct DelayStore {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)allocate for delays up to `max_delay_samples`, zero-filled.
    pub fn prepare(&mut self, max_delay_samples: usize) {
        self.buffer = vec![0.0; max_delay_samples + STORE_HEADROOM];
        self.write_pos = 0;
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Largest lag accepted by `read_integer()` without clamping.
    #[inline]
    pub fn max_integer_delay(&self) -> usize {
        self.capacity().saturating_sub(2).max(1)
    }

    /// Largest lag accepted by `read_interpolated()` without clamping.
    #[inline]
    pub fn max_interpolated_delay(&self) -> f32 {
        self.capacity().saturating_sub(3).max(1) as f32
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        let cap = self.buffer.len();
        if cap == 0 {
            return;
        }
        self.buffer[self.write_pos] = flush_denormal(sample);
        self.write_pos = (self.write_pos + 1) % cap;
    }

    /// Sample written `delay` writes ago, `delay` clamped to `[1, capacity - 2]`.
    #[inline]
    pub fn read_integer(&self, delay: usize) -> f32 {
        let cap = self.buffer.len();
        if cap == 0 {
            return 0.0;
        }
        let delay = delay.clamp(1, self.max_integer_delay());
        self.buffer[(self.write_pos + cap - delay) % cap]
    }

    /// Linear interpolation between the two integer lags around `delay`,
    /// clamped to `[1, capacity - 3]`.
    #[inline]
    pub fn read_interpolated(&self, delay: f32) -> f32 {
        let cap = self.buffer.len();
        if cap == 0 {
            return 0.0;
        }
        let delay = delay.clamp(1.0, self.max_interpolated_delay());
        let whole = delay as usize;
        let frac = delay - whole as f32;

        let near = self.buffer[(self.write_pos + cap - whole) % cap];
        let far = self.buffer[(self.write_pos + cap - whole - 1) % cap];
        near * (1.0 - frac) + far * frac
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_sizes_with_headroom() {
        let mut store = DelayStore::new();
        store.prepare(100);
        assert_eq!(store.capacity(), 100 + STORE_HEADROOM);
        assert_eq!(store.read_integer(1), 0.0);
    }

    #[test]
    fn integer_read_returns_past_samples() {
        let mut store = DelayStore::new();
        store.prepare(8);
        for i in 1..=5 {
            store.write(i as f32);
        }
        assert_eq!(store.read_integer(1), 5.0);
        assert_eq!(store.read_integer(3), 3.0);
        assert_eq!(store.read_integer(5), 1.0);
    }

    #[test]
    fn wraps_around_capacity() {
        let mut store = DelayStore::new();
        store.prepare(4);
        for i in 0..20 {
            store.write(i as f32);
        }
        assert_eq!(store.read_integer(1), 19.0);
        assert_eq!(store.read_integer(4), 16.0);
    }

    #[test]
    fn integer_delay_is_clamped() {
        let mut store = DelayStore::new();
        store.prepare(4);
        for i in 0..20 {
            store.write(i as f32);
        }
        assert_eq!(store.read_integer(0), store.read_integer(1));
        let max = store.max_integer_delay();
        assert_eq!(store.read_integer(10_000), store.read_integer(max));
    }

    #[test]
    fn interpolated_read_blends_neighbours() {
        let mut store = DelayStore::new();
        store.prepare(8);
        store.write(0.0);
        store.write(1.0);
        store.write(2.0);
        // lag 1 -> 2.0, lag 2 -> 1.0
        assert!((store.read_interpolated(1.0) - 2.0).abs() < 1e-6);
        assert!((store.read_interpolated(1.5) - 1.5).abs() < 1e-6);
        assert!((store.read_interpolated(1.25) - 1.75).abs() < 1e-6);
        assert!((store.read_interpolated(0.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn unprepared_store_is_inert() {
        let mut store = DelayStore::new();
        store.write(1.0);
        assert_eq!(store.read_integer(1), 0.0);
        assert_eq!(store.read_interpolated(2.5), 0.0);
    }

    #[test]
    fn reset_clears_contents() {
        let mut store = DelayStore::new();
        store.prepare(8);
        store.write(0.7);
        store.reset();
        assert_eq!(store.read_integer(1), 0.0);
        assert_eq!(store.capacity(), 8 + STORE_HEADROOM);
    }
}
