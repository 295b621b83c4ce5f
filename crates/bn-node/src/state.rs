use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::PushChannel;

/// Lifecycle of one light node on this device.
///
/// `Unregistered -> Registering -> Active -> (Degraded) -> Active | Unregistered`
///
/// `Degraded` is entered when the remote reports `needs_reactivation`; a
/// successful signed reactivation returns the node to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// No registration exists on this device.
    Unregistered,

    /// A registration call is in flight.
    Registering,

    /// Registered and answering challenges.
    Active,

    /// Too many proofs were missed; the remote requires reactivation.
    Degraded,
}

/// The device-local record of a successful registration.
///
/// Created once per activation, owned by the liveness service, and
/// destroyed on wallet deletion/logout (which also cancels any pending
/// scheduled wake-up).
#[derive(Debug, Clone)]
pub struct NodeRegistration {
    pub node_id: String,
    pub wallet_address: String,
    pub device_id: String,
    pub channel: PushChannel,
    pub registered_at: DateTime<Utc>,
}

/// A liveness challenge issued by the remote service.
///
/// Ephemeral: consumed exactly once by a signed response, regardless of
/// whether it arrived over a push channel or was discovered by polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingChallenge {
    pub node_id: String,
    pub challenge_nonce: String,
    /// Unix seconds when the challenge was issued/discovered.
    pub issued_at: i64,
}

/// Local mirror of the remote liveness bookkeeping.
///
/// Used purely to decide whether and when to schedule the next wake-up.
/// Never a trust source for reward eligibility; that is decided remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessStatus {
    pub node_id: String,
    pub is_active: bool,
    pub consecutive_failures: u32,
    /// Unix seconds of the next expected challenge.
    pub next_ping_time: i64,
    /// Width of the response window in seconds.
    pub next_ping_window: i64,
    pub needs_reactivation: bool,
}
