//! Frame-rate independent exponential approach.

/// A scalar that lags its target.
///
/// `rate` is the fraction of the remaining distance left open after one
/// second. Each step closes `1 - rate^dt` of the gap, so a channel stepped at
/// 30 Hz and one stepped at 120 Hz agree at equal wall-clock times.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothedChannel {
    current: f32,
    rate: f32,
}

impl SmoothedChannel {
    /// Rates outside (0, 1) are clamped into it.
    pub fn new(initial: f32, rate: f32) -> Self {
        Self {
            current: initial,
            rate: sanitize_rate(rate),
        }
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Move toward `target` by `dt` seconds. Non-positive `dt` is a no-op.
    ///
    /// A non-finite current value snaps to a finite target.
    pub fn advance(&mut self, target: f32, dt: f32) -> f32 {
        if dt.is_nan() || dt <= 0.0 || !target.is_finite() {
            return self.current;
        }
        if !self.current.is_finite() {
            self.current = target;
            return self.current;
        }

        let closed = 1.0 - self.rate.powf(dt);
        let next = self.current + (target - self.current) * closed;

        // Rounding can nudge past the target when `closed` is ~1.
        let (lo, hi) = if self.current <= target {
            (self.current, target)
        } else {
            (target, self.current)
        };
        self.current = next.clamp(lo, hi);
        self.current
    }
}

fn sanitize_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        return 0.5;
    }
    rate.clamp(1e-6, 1.0 - 1e-6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_leaves_rate_fraction() {
        let mut ch = SmoothedChannel::new(0.0, 0.25);
        ch.advance(1.0, 1.0);
        assert!((ch.value() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_non_positive_dt_is_noop() {
        let mut ch = SmoothedChannel::new(0.3, 0.5);
        ch.advance(1.0, 0.0);
        ch.advance(1.0, -0.1);
        ch.advance(1.0, f32::NAN);
        assert_eq!(ch.value(), 0.3);
    }

    #[test]
    fn test_substeps_match_single_step() {
        let mut single = SmoothedChannel::new(0.2, 0.1);
        let mut halves = SmoothedChannel::new(0.2, 0.1);

        single.advance(0.9, 0.05);
        halves.advance(0.9, 0.025);
        halves.advance(0.9, 0.025);

        assert!((single.value() - halves.value()).abs() < 1e-5);
    }

    #[test]
    fn test_converges_from_above() {
        let mut ch = SmoothedChannel::new(1.0, 0.2);
        for _ in 0..600 {
            ch.advance(0.0, 1.0 / 60.0);
            assert!(ch.value() >= 0.0);
        }
        assert!(ch.value() < 1e-3);
    }

    #[test]
    fn test_nan_current_snaps_to_target() {
        let mut ch = SmoothedChannel::new(f32::NAN, 0.2);
        assert_eq!(ch.advance(0.35, 0.016), 0.35);
        let next = ch.advance(0.8, 0.016);
        assert!(next > 0.35 && next < 0.8);
    }

    #[test]
    fn test_infinite_current_snaps_to_target() {
        let mut ch = SmoothedChannel::new(f32::INFINITY, 0.2);
        assert_eq!(ch.advance(0.5, 0.016), 0.5);
    }

    #[test]
    fn test_rate_clamped() {
        assert!(SmoothedChannel::new(0.0, 1.5).rate() < 1.0);
        assert!(SmoothedChannel::new(0.0, 0.0).rate() > 0.0);
    }
}
