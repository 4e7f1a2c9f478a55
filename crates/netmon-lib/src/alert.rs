//! Threshold alerting
//!
//! Maps the latest rates and interface liveness to an [`AlertState`]. The
//! check order is fixed: interface first, then low limit, then high limit.

use crate::models::{AlertState, Thresholds};

/// Classify one cycle's representative rates
pub fn evaluate(
    sent_rate: f64,
    recv_rate: f64,
    thresholds: &Thresholds,
    interface_up: bool,
) -> AlertState {
    if !interface_up {
        AlertState::InterfaceDown
    } else if sent_rate < thresholds.low_limit || recv_rate < thresholds.low_limit {
        AlertState::LowSpeed
    } else if sent_rate > thresholds.high_limit || recv_rate > thresholds.high_limit {
        AlertState::HighSpeed
    } else {
        AlertState::Ok
    }
}

/// Remembers the previous cycle's alert, nothing older
#[derive(Debug, Default)]
pub struct AlertTracker {
    previous: Option<AlertState>,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `state`; returns the prior state if it was different
    pub fn record(&mut self, state: AlertState) -> Option<AlertState> {
        match self.previous.replace(state) {
            Some(prev) if prev != state => Some(prev),
            _ => None,
        }
    }

    pub fn previous(&self) -> Option<AlertState> {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Thresholds {
        Thresholds::new(5.0, 50.0)
    }

    #[test]
    fn test_interface_down_dominates() {
        assert_eq!(evaluate(20.0, 20.0, &limits(), false), AlertState::InterfaceDown);
        assert_eq!(evaluate(0.0, 999.0, &limits(), false), AlertState::InterfaceDown);
        assert_eq!(
            evaluate(1.0, 1.0, &Thresholds::new(50.0, 5.0), false),
            AlertState::InterfaceDown
        );
    }

    #[test]
    fn test_low_wins_over_high() {
        assert_eq!(evaluate(2.0, 60.0, &limits(), true), AlertState::LowSpeed);
        assert_eq!(evaluate(60.0, 2.0, &limits(), true), AlertState::LowSpeed);
    }

    #[test]
    fn test_high_speed() {
        assert_eq!(evaluate(20.0, 60.0, &limits(), true), AlertState::HighSpeed);
        assert_eq!(evaluate(51.0, 20.0, &limits(), true), AlertState::HighSpeed);
    }

    #[test]
    fn test_ok_within_limits() {
        assert_eq!(evaluate(20.0, 20.0, &limits(), true), AlertState::Ok);
        // limits are inclusive
        assert_eq!(evaluate(5.0, 50.0, &limits(), true), AlertState::Ok);
    }

    #[test]
    fn test_ok_iff_both_rates_within_limits() {
        let rates = [0.0, 4.99, 5.0, 5.01, 27.5, 49.99, 50.0, 50.01, 1000.0];
        let t = limits();

        for &r1 in &rates {
            for &r2 in &rates {
                let within = (t.low_limit..=t.high_limit).contains(&r1)
                    && (t.low_limit..=t.high_limit).contains(&r2);
                assert_eq!(evaluate(r1, r2, &t, true) == AlertState::Ok, within);
            }
        }
    }

    #[test]
    fn test_inverted_limits_follow_check_order() {
        // low > high: every rate is below low or above high, so Ok is unreachable
        let inverted = Thresholds::new(50.0, 5.0);
        assert_eq!(evaluate(60.0, 60.0, &inverted, true), AlertState::HighSpeed);
        assert_eq!(evaluate(20.0, 20.0, &inverted, true), AlertState::LowSpeed);
        assert_eq!(evaluate(50.0, 50.0, &inverted, true), AlertState::HighSpeed);
    }

    #[test]
    fn test_tracker_reports_transitions_only() {
        let mut tracker = AlertTracker::new();
        assert_eq!(tracker.record(AlertState::Ok), None);
        assert_eq!(tracker.record(AlertState::Ok), None);
        assert_eq!(tracker.record(AlertState::LowSpeed), Some(AlertState::Ok));
        assert_eq!(tracker.previous(), Some(AlertState::LowSpeed));
    }
}
