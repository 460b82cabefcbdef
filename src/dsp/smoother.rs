//! Linear parameter smoother.
//!
//! Ramps from the current value to a new target over a fixed time so that
//! mix and drive changes do not produce zipper noise. The ramp lands exactly
//! on the target and stays there.

/// Ramp time used for the mix and drive smoothers.
pub const SMOOTHING_SECONDS: f64 = 0.010;

#[derive(Debug, Clone, Copy)]
pub struct LinearSmoother {
    current: f32,
    target: f32,
    step: f32,
    steps_left: u32,
    ramp_len: u32,
}

impl Default for LinearSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl LinearSmoother {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            steps_left: 0,
            ramp_len: 0,
        }
    }

    /// Set the ramp length from a duration. Any ramp in flight is finished.
    pub fn set_ramp(&mut self, seconds: f64, sample_rate: f64) {
        self.ramp_len = (seconds * sample_rate).round().max(0.0) as u32;
        self.snap(self.target);
    }

    /// Jump to `value` with no ramp.
    pub fn snap(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.steps_left = 0;
    }

    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }
        if self.ramp_len == 0 {
            self.snap(value);
            return;
        }
        self.target = value;
        self.steps_left = self.ramp_len;
        self.step = (self.target - self.current) / self.ramp_len as f32;
    }

    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.steps_left == 0 {
            return self.target;
        }
        self.steps_left -= 1;
        if self.steps_left == 0 {
            self.current = self.target;
        } else {
            self.current += self.step;
        }
        self.current
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.steps_left > 0
    }
}
