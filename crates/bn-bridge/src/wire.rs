//! JSON bodies exchanged with the bootstrap service.
//!
//! Field names are the wire contract; `push_type` carries the channel kind
//! as its wire name (`unified_push` / `fcm` / `polling`).

use serde::{Deserialize, Serialize};

/// `POST /light-node/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub node_id: String,
    pub wallet_address: String,
    pub device_id: String,
    pub quantum_pubkey: String,
    pub quantum_signature: String,
    pub push_type: String,

    /// Vendor push delivery token; only present for `push_type = "fcm"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,

    /// Self-hosted push endpoint URL; only present for
    /// `push_type = "unified_push"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unified_push_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub node_id: String,
    pub next_ping_time: i64,
    pub next_ping_window: i64,
}

/// `GET /light-node/pending-challenge?node_id=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChallengeResponse {
    pub success: bool,
    pub has_challenge: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

/// `GET /light-node/ping-response?node_id=&challenge=&signature=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingAckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /light-node/next-ping?node_id=` — also embedded in registration
/// and reactivation responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NextPingResponse {
    pub success: bool,
    pub next_ping_time: i64,
    pub next_ping_window: i64,
}

/// `GET /light-node/status?node_id=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightNodeStatusResponse {
    pub success: bool,
    pub is_active: bool,
    pub consecutive_failures: u32,
    pub last_seen: i64,
    pub push_type: String,
    pub next_ping_time: i64,
    pub next_ping_window: i64,
    pub needs_reactivation: bool,
}

/// `POST /light-node/reactivate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactivateRequest {
    pub node_id: String,
    pub wallet_address: String,
    pub signature: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactivateResponse {
    pub success: bool,
    pub was_reactivated: bool,
    pub next_ping_time: i64,
    pub next_ping_window: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /node/status?activation_code=|node_id=` — read-only monitoring of
/// server-class nodes; carries no liveness obligation for this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerNodeStatusResponse {
    pub success: bool,
    pub is_online: bool,
    pub heartbeat_count: u64,
    pub required_heartbeats: u64,
    pub is_reward_eligible: bool,
    pub pending_rewards: u64,
}

/// `GET /network/phase-inputs` — the data source for phase derivation and
/// pricing: cumulative burn, network age, and current network size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhaseInputsResponse {
    pub success: bool,
    pub burn_percent: f64,
    pub network_age_years: f64,
    pub network_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_omits_absent_channel_handles() {
        let req = RegisterRequest {
            node_id: "n-1".into(),
            wallet_address: "addr".into(),
            device_id: "dev".into(),
            quantum_pubkey: "pk".into(),
            quantum_signature: "sig".into(),
            push_type: "polling".into(),
            device_token: None,
            unified_push_endpoint: None,
        };

        let value = serde_json::to_value(&req).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("device_token"));
        assert!(!obj.contains_key("unified_push_endpoint"));
        assert_eq!(obj["push_type"], "polling");
    }

    #[test]
    fn register_request_carries_the_winning_handle() {
        let req = RegisterRequest {
            node_id: "n-1".into(),
            wallet_address: "addr".into(),
            device_id: "dev".into(),
            quantum_pubkey: "pk".into(),
            quantum_signature: "sig".into(),
            push_type: "unified_push".into(),
            device_token: None,
            unified_push_endpoint: Some("https://push.example/ep".into()),
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["unified_push_endpoint"], "https://push.example/ep");
    }

    #[test]
    fn status_response_round_trips() {
        let json = r#"{
            "success": true,
            "is_active": true,
            "consecutive_failures": 2,
            "last_seen": 1700000000,
            "push_type": "polling",
            "next_ping_time": 1700014400,
            "next_ping_window": 300,
            "needs_reactivation": false
        }"#;

        let status: LightNodeStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.consecutive_failures, 2);
        assert!(!status.needs_reactivation);
    }
}
