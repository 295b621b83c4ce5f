use std::fmt;

use serde::{Deserialize, Serialize};

/// The three classes of network participant a wallet can activate.
///
/// All classes share the universal phase-1 burn schedule; in phase 2 each
/// class carries its own base cost, scaled by the network-size multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeClass {
    /// Intermittently-connected participant that proves liveness via
    /// signed challenge-response pings.
    Light,

    /// Always-on participant with full protocol duties.
    Full,

    /// High-capacity participant serving other nodes.
    Super,
}

impl NodeClass {
    /// Phase-2 base activation cost in native-token units, before the
    /// network-size multiplier is applied.
    pub fn stake_base_cost(self) -> u64 {
        match self {
            NodeClass::Light => 5_000,
            NodeClass::Full => 7_500,
            NodeClass::Super => 10_000,
        }
    }

    /// Wire name used in registration and monitoring calls.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeClass::Light => "light",
            NodeClass::Full => "full",
            NodeClass::Super => "super",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
