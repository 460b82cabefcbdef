/// Magnitude below which recurrent state is flushed to exact zero.
pub const DENORMAL_THRESHOLD: f32 = 1e-20;

/// Flush values that would otherwise decay into the subnormal range.
/// NaN and infinities are flushed too, so they cannot enter a feedback path.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.is_finite() && x.abs() >= DENORMAL_THRESHOLD {
        x
    } else {
        0.0
    }
}

/// Convert milliseconds to a (fractional) sample count.
#[inline]
pub fn ms_to_samples(ms: f64, sample_rate: f64) -> f64 {
    ms * sample_rate / 1000.0
}

/// Truncated sample count for a duration in seconds.
#[inline]
pub fn seconds_to_samples(seconds: f64, sample_rate: f64) -> usize {
    (seconds * sample_rate).max(0.0) as usize
}
