use std::time::Duration;

use sha2::{Digest, Sha256};

/// Full configuration for the liveness service.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Network address of the wallet that owns the node.
    pub wallet_address: String,

    /// Stable device label (e.g. hostname) folded into the device
    /// fingerprint so re-registration from the same device is
    /// recognisable server-side.
    pub device_label: String,

    /// Self-hosted push endpoint URL, when the device runs a UnifiedPush
    /// distributor.  Probed first during channel detection.
    pub unified_push_endpoint: Option<String>,

    /// Vendor push delivery token, when vendor services are available.
    /// Probed second.
    pub vendor_push_token: Option<String>,

    /// Period of the forced background check.  Checks that land outside
    /// the ping window perform no remote call.
    pub periodic_check_interval: Duration,
}

impl NodeConfig {
    pub fn new(wallet_address: impl Into<String>, device_label: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            device_label: device_label.into(),
            unified_push_endpoint: None,
            vendor_push_token: None,
            periodic_check_interval: Duration::from_secs(600),
        }
    }

    /// Device fingerprint sent with registration: a SHA-256 digest over
    /// the wallet address and device label.
    pub fn device_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.wallet_address.as_bytes());
        hasher.update(b":");
        hasher.update(self.device_label.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_is_stable_for_the_same_inputs() {
        let a = NodeConfig::new("wallet-1", "laptop");
        let b = NodeConfig::new("wallet-1", "laptop");
        assert_eq!(a.device_id(), b.device_id());
    }

    #[test]
    fn device_id_differs_across_devices() {
        let a = NodeConfig::new("wallet-1", "laptop");
        let b = NodeConfig::new("wallet-1", "phone");
        assert_ne!(a.device_id(), b.device_id());
    }
}
