use bn_bridge::BridgeError;
use bn_pricing::{Currency, Phase, PricingError};
use bn_signer::SignerError;
use thiserror::Error;

use crate::gate::ActivationMethod;

#[derive(Debug, Error)]
pub enum NodeError {
    /// The phase inputs could not be fetched.  Both activation paths are
    /// refused rather than guessing a phase.
    #[error("activation phase unknown ({0}); refusing both activation paths")]
    PhaseUnknown(String),

    /// The economically-disallowed path was attempted.  Definitive
    /// rejection, not a transient failure.
    #[error("{method} activation is not available in phase {phase}")]
    WrongPhaseForMethod {
        method: ActivationMethod,
        phase: Phase,
    },

    /// Pre-flight balance check failed before any fees were spent.
    #[error("insufficient {currency} balance: need {needed}, have {available} (short {})", .needed - .available)]
    InsufficientBalance {
        needed: u64,
        available: u64,
        currency: Currency,
    },

    #[error("no node is registered on this device")]
    NotRegistered,

    #[error("a node is already registered on this device")]
    AlreadyRegistered,

    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("signing error: {0}")]
    Signer(#[from] SignerError),
}
