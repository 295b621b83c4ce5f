use thiserror::Error;

use crate::phase::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("phase mismatch: phase-{requested} pricing requested while the network is in phase {current}")]
    PhaseMismatch { requested: Phase, current: Phase },
}
