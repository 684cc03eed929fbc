//! Current-stage bookkeeping: manual navigation and the auto-advance timer.
//!
//! Manual `Next`/`Previous` clamp at the ends of the sequence. Only the
//! auto-advance timer wraps from the last stage back to the first.
//!
//! The timer is clocked by the elapsed time handed to [`StageController::poll`],
//! which the simulation calls at the start of every tick. Firing therefore
//! never interleaves with the rest of a tick, and disabling the timer takes
//! effect before the next poll can fire.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// Shortest accepted auto-advance period. Shorter requests are raised to this.
pub const MIN_AUTO_ADVANCE_PERIOD: Duration = Duration::from_millis(100);

/// Navigation request from the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRequest {
    Next,
    Previous,
    JumpTo(usize),
    /// Jump to the first stage.
    Reset,
}

#[derive(Clone, Debug)]
struct AutoAdvance {
    enabled: bool,
    period: Duration,
    /// Elapsed time the current period started at. `None` until the next poll.
    anchor: Option<f32>,
}

/// Holds the current stage ordinal.
#[derive(Clone, Debug)]
pub struct StageController {
    current: usize,
    count: usize,
    auto: AutoAdvance,
}

impl StageController {
    /// `start` is clamped into range; `count` must be non-zero.
    pub fn new(count: usize, start: usize) -> Self {
        let count = count.max(1);
        Self {
            current: start.min(count - 1),
            count,
            auto: AutoAdvance {
                enabled: false,
                period: MIN_AUTO_ADVANCE_PERIOD,
                anchor: None,
            },
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn auto_advance_enabled(&self) -> bool {
        self.auto.enabled
    }

    pub fn auto_advance_period(&self) -> Duration {
        self.auto.period
    }

    /// Apply a manual navigation request and return the new ordinal.
    ///
    /// An out-of-range `JumpTo` leaves the ordinal untouched.
    pub fn request(&mut self, request: StageRequest) -> Result<usize, StageError> {
        let target = match request {
            StageRequest::Next => (self.current + 1).min(self.count - 1),
            StageRequest::Previous => self.current.saturating_sub(1),
            StageRequest::Reset => 0,
            StageRequest::JumpTo(index) => {
                if index >= self.count {
                    return Err(StageError::OutOfRange {
                        index,
                        count: self.count,
                    });
                }
                index
            }
        };

        self.current = target;
        // A manually chosen stage gets a full period before auto-advance moves on.
        self.auto.anchor = None;
        Ok(target)
    }

    /// Enable or disable auto-advance. Disabling keeps the current ordinal.
    pub fn set_auto_advance(&mut self, enabled: bool, period: Duration) {
        let period = if period < MIN_AUTO_ADVANCE_PERIOD {
            log::warn!(
                "auto-advance period {:?} below minimum, using {:?}",
                period,
                MIN_AUTO_ADVANCE_PERIOD
            );
            MIN_AUTO_ADVANCE_PERIOD
        } else {
            period
        };

        self.auto.enabled = enabled;
        self.auto.period = period;
        self.auto.anchor = None;
    }

    /// Fire any auto-advance periods that completed by `elapsed`.
    ///
    /// Returns how many advances fired. Each one moves forward by one stage,
    /// wrapping from the last stage to the first.
    pub fn poll(&mut self, elapsed: f32) -> u32 {
        if !self.auto.enabled {
            return 0;
        }

        let anchor = match self.auto.anchor {
            Some(anchor) => anchor,
            None => {
                self.auto.anchor = Some(elapsed);
                return 0;
            }
        };

        // Clock went backwards (session restart); re-anchor instead of firing.
        if elapsed < anchor {
            self.auto.anchor = Some(elapsed);
            return 0;
        }

        let period = self.auto.period.as_secs_f32();
        let fired = ((elapsed - anchor) / period).floor() as u32;
        if fired > 0 {
            self.current = (self.current + fired as usize % self.count) % self.count;
            self.auto.anchor = Some(anchor + fired as f32 * period);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_next_clamps_at_last() {
        let mut ctl = StageController::new(3, 2);
        assert_eq!(ctl.request(StageRequest::Next), Ok(2));
        assert_eq!(ctl.current(), 2);
    }

    #[test]
    fn test_manual_previous_clamps_at_first() {
        let mut ctl = StageController::new(3, 0);
        assert_eq!(ctl.request(StageRequest::Previous), Ok(0));
    }

    #[test]
    fn test_jump_out_of_range_keeps_state() {
        let mut ctl = StageController::new(4, 1);
        let err = ctl.request(StageRequest::JumpTo(4)).unwrap_err();
        assert_eq!(err, StageError::OutOfRange { index: 4, count: 4 });
        assert_eq!(ctl.current(), 1);
    }

    #[test]
    fn test_reset_goes_to_first() {
        let mut ctl = StageController::new(4, 3);
        assert_eq!(ctl.request(StageRequest::Reset), Ok(0));
    }

    #[test]
    fn test_auto_advance_wraps() {
        let mut ctl = StageController::new(3, 2);
        ctl.set_auto_advance(true, Duration::from_millis(1000));

        assert_eq!(ctl.poll(5.0), 0); // anchors
        assert_eq!(ctl.poll(5.5), 0);
        assert_eq!(ctl.poll(6.0), 1);
        assert_eq!(ctl.current(), 0);
    }

    #[test]
    fn test_auto_advance_catches_up_missed_periods() {
        let mut ctl = StageController::new(6, 0);
        ctl.set_auto_advance(true, Duration::from_millis(500));
        ctl.poll(0.0);
        assert_eq!(ctl.poll(1.75), 3);
        assert_eq!(ctl.current(), 3);
        // Remainder carries over: next fire at 2.0.
        assert_eq!(ctl.poll(1.99), 0);
        assert_eq!(ctl.poll(2.0), 1);
    }

    #[test]
    fn test_disable_stops_future_transitions() {
        let mut ctl = StageController::new(6, 1);
        ctl.set_auto_advance(true, Duration::from_millis(1000));
        ctl.poll(0.0);
        ctl.set_auto_advance(false, Duration::from_millis(1000));
        assert_eq!(ctl.poll(10.0), 0);
        assert_eq!(ctl.current(), 1);
    }

    #[test]
    fn test_manual_request_reanchors_timer() {
        let mut ctl = StageController::new(6, 0);
        ctl.set_auto_advance(true, Duration::from_millis(1000));
        ctl.poll(0.0);
        ctl.request(StageRequest::JumpTo(4)).unwrap();
        assert_eq!(ctl.poll(0.9), 0); // re-anchor at 0.9
        assert_eq!(ctl.poll(1.5), 0);
        assert_eq!(ctl.poll(2.0), 1);
        assert_eq!(ctl.current(), 5);
    }

    #[test]
    fn test_tiny_period_is_raised() {
        let mut ctl = StageController::new(2, 0);
        ctl.set_auto_advance(true, Duration::ZERO);
        assert_eq!(ctl.auto_advance_period(), MIN_AUTO_ADVANCE_PERIOD);
    }
}
