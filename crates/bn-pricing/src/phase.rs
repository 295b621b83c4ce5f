use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative burn percentage of the reference token at which the network
/// switches to phase 2 and the burn schedule closes.
pub const BURN_COMPLETE_PERCENT: f64 = 90.0;

/// Network age in years at which the network switches to phase 2 even if
/// the burn target was never reached.
pub const NETWORK_MATURITY_YEARS: f64 = 5.0;

/// A fetched [`PhaseState`] older than this must not be reused; callers
/// re-query the network inputs instead.
pub const PHASE_STALE_AFTER_SECS: i64 = 600;

/// The two mutually-exclusive activation regimes.
///
/// Phase 1 activates nodes by burning the reference token; phase 2 by
/// transferring native tokens into the redistribution pool.  Exactly one of
/// the two is open at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    One,
    Two,
}

impl Phase {
    /// Derive the current phase from the two network inputs.
    ///
    /// Either condition alone is sufficient for phase 2 (OR, not AND).
    pub fn from_inputs(burn_percent: f64, network_age_years: f64) -> Self {
        if burn_percent >= BURN_COMPLETE_PERCENT || network_age_years >= NETWORK_MATURITY_YEARS {
            Phase::Two
        } else {
            Phase::One
        }
    }

    /// The phase as its wire/display number.
    pub fn number(self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Snapshot of the phase inputs together with the phase derived from them.
///
/// Never persisted and never cached past [`PHASE_STALE_AFTER_SECS`]: once
/// the burn percentage or network age has moved, a stale snapshot could
/// unlock the wrong activation path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// Cumulative burn percentage of the reference token, `0.0..=100.0`.
    pub burn_percent: f64,

    /// Age of the network in (fractional) years since genesis.
    pub network_age_years: f64,

    /// Phase derived from the two fields above.
    pub phase: Phase,

    /// When the inputs were fetched from the network.
    pub fetched_at: DateTime<Utc>,
}

impl PhaseState {
    /// Build a snapshot from freshly fetched inputs, stamped with the
    /// current time.
    pub fn new(burn_percent: f64, network_age_years: f64) -> Self {
        Self::at(burn_percent, network_age_years, Utc::now())
    }

    /// Build a snapshot with an explicit fetch time.
    pub fn at(burn_percent: f64, network_age_years: f64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            burn_percent,
            network_age_years,
            phase: Phase::from_inputs(burn_percent, network_age_years),
            fetched_at,
        }
    }

    /// True once this snapshot is too old to base an activation decision on.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        (now - self.fetched_at).num_seconds() > PHASE_STALE_AFTER_SECS
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn burn_target_alone_triggers_phase_two() {
        assert_eq!(Phase::from_inputs(90.0, 0.0), Phase::Two);
    }

    #[test]
    fn network_age_alone_triggers_phase_two() {
        assert_eq!(Phase::from_inputs(0.0, 5.0), Phase::Two);
    }

    #[test]
    fn below_both_thresholds_stays_phase_one() {
        assert_eq!(Phase::from_inputs(89.99, 4.99), Phase::One);
    }

    #[test]
    fn fresh_state_is_not_stale() {
        let state = PhaseState::new(10.0, 1.0);
        assert!(!state.is_stale(Utc::now()));
    }

    #[test]
    fn state_goes_stale_after_the_bound() {
        let fetched = Utc::now() - Duration::seconds(PHASE_STALE_AFTER_SECS + 1);
        let state = PhaseState::at(10.0, 1.0, fetched);
        assert!(state.is_stale(Utc::now()));
    }

    #[test]
    fn phase_numbers_match_wire_values() {
        assert_eq!(Phase::One.number(), 1);
        assert_eq!(Phase::Two.number(), 2);
    }
}
