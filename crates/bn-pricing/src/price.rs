use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::PricingError,
    node_class::NodeClass,
    phase::{Phase, PhaseState},
};

/// Phase-1 base burn price in burn-token units.  Universal: every node
/// class pays from the same schedule.
pub const BURN_BASE_PRICE: u64 = 1_500;

/// Flat reduction applied for every full ten percentage points of
/// cumulative burn.
pub const BURN_REDUCTION_STEP: u64 = 150;

/// Lowest price the burn schedule can reach.
pub const BURN_FLOOR_PRICE: u64 = 150;

/// Network-size multiplier table for phase-2 pricing.
///
/// Each entry is `(lower_bound, multiplier)`; an entry covers sizes from
/// its (inclusive) lower bound up to the next entry's bound.  The first
/// bound is zero, so the lookup is total over all sizes with a single
/// boundary convention and no gaps or overlaps.
const SIZE_MULTIPLIERS: &[(u64, f64)] = &[
    (0, 0.5),
    (100_000, 1.0),
    (1_000_000, 2.0),
    (10_000_000, 3.0),
];

/// The token an activation price is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// SPK, the reference token destroyed by phase-1 activation.
    Burn,

    /// BCN, the network-native token transferred by phase-2 activation.
    Native,
}

impl Currency {
    pub fn ticker(self) -> &'static str {
        match self {
            Currency::Burn => "SPK",
            Currency::Native => "BCN",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

/// A live activation price, computed at call time.
///
/// Quotes are never persisted or locked in: burn percentage and network
/// size move underneath them, so a fresh quote is required per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub node_class: NodeClass,
    pub phase: Phase,
    pub amount: u64,
    pub currency: Currency,
}

/// Price on the phase-1 burn schedule for a given cumulative burn
/// percentage.  Pure schedule; the phase guard lives in [`quote_burn`].
///
/// The tier index is floored on the already-scaled value.  Flooring (or
/// rounding) the percentage itself first is wrong: `15.7` must land in
/// tier 1, price 1350.
pub fn burn_price(burn_percent: f64) -> u64 {
    let tier = (burn_percent / 10.0).floor() as u64;
    BURN_BASE_PRICE
        .saturating_sub(tier.saturating_mul(BURN_REDUCTION_STEP))
        .max(BURN_FLOOR_PRICE)
}

/// Network-size multiplier for phase-2 pricing.  Lower bounds are
/// inclusive, so a network of exactly 100 000 nodes gets the higher tier.
pub fn size_multiplier(network_size: u64) -> f64 {
    // Safety: the first bound is 0, so the search always matches.
    SIZE_MULTIPLIERS
        .iter()
        .rev()
        .find(|(lower, _)| network_size >= *lower)
        .map(|(_, m)| *m)
        .unwrap()
}

/// Quote the phase-1 (burn-based) activation price.
///
/// Fails with [`PricingError::PhaseMismatch`] when the network is already
/// in phase 2 — the burn schedule is no longer queryable there.
pub fn quote_burn(node_class: NodeClass, state: &PhaseState) -> Result<PriceQuote, PricingError> {
    if state.phase != Phase::One {
        return Err(PricingError::PhaseMismatch {
            requested: Phase::One,
            current: state.phase,
        });
    }

    Ok(PriceQuote {
        node_class,
        phase: Phase::One,
        amount: burn_price(state.burn_percent),
        currency: Currency::Burn,
    })
}

/// Quote the phase-2 (stake-based) activation price for the current
/// network size.
///
/// Fails with [`PricingError::PhaseMismatch`] while the network is still
/// in phase 1.
pub fn quote_stake(
    node_class: NodeClass,
    state: &PhaseState,
    network_size: u64,
) -> Result<PriceQuote, PricingError> {
    if state.phase != Phase::Two {
        return Err(PricingError::PhaseMismatch {
            requested: Phase::Two,
            current: state.phase,
        });
    }

    let amount = (node_class.stake_base_cost() as f64 * size_multiplier(network_size)).floor();

    Ok(PriceQuote {
        node_class,
        phase: Phase::Two,
        amount: amount as u64,
        currency: Currency::Native,
    })
}
