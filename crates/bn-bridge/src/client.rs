use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    endpoints::EndpointPool,
    error::BridgeError,
    wire::{
        LightNodeStatusResponse, NextPingResponse, PendingChallengeResponse, PhaseInputsResponse,
        PingAckResponse, ReactivateRequest, ReactivateResponse, RegisterRequest, RegisterResponse,
        ServerNodeStatusResponse,
    },
};

/// Per-request timeout.  Exceeding it counts as a transport failure and is
/// retried against a re-picked endpoint, never as a liveness failure.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Total attempts per operation, each against a freshly picked endpoint.
pub const MAX_ATTEMPTS: u32 = 3;

/// Identifies a server-class node for read-only monitoring.
#[derive(Debug, Clone)]
pub enum ServerNodeQuery {
    ActivationCode(String),
    NodeId(String),
}

impl ServerNodeQuery {
    fn as_query_pair(&self) -> (&'static str, &str) {
        match self {
            ServerNodeQuery::ActivationCode(code) => ("activation_code", code),
            ServerNodeQuery::NodeId(id) => ("node_id", id),
        }
    }
}

/// The typed surface of the bootstrap HTTP API.
///
/// [`HttpBridge`] is the production implementation; tests drive the
/// liveness service against in-memory fakes of this trait.
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Current burn percentage, network age, and network size.
    async fn phase_inputs(&self) -> Result<PhaseInputsResponse, BridgeError>;

    /// Register a light node and receive its first ping window.
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, BridgeError>;

    /// Poll for an outstanding challenge nonce, if any.
    async fn pending_challenge(&self, node_id: &str) -> Result<Option<String>, BridgeError>;

    /// Answer a challenge with the node's signature over its nonce.
    async fn submit_ping_response(
        &self,
        node_id: &str,
        challenge: &str,
        signature: &str,
    ) -> Result<(), BridgeError>;

    /// Authoritative next ping time and window for a node.
    async fn next_ping(&self, node_id: &str) -> Result<NextPingResponse, BridgeError>;

    /// Remote liveness bookkeeping for a light node.
    async fn light_node_status(&self, node_id: &str)
        -> Result<LightNodeStatusResponse, BridgeError>;

    /// Reset a degraded node's failure count with a signed reactivation.
    async fn reactivate(&self, req: &ReactivateRequest) -> Result<ReactivateResponse, BridgeError>;

    /// Read-only monitoring of a server-class node.
    async fn server_node_status(
        &self,
        query: &ServerNodeQuery,
    ) -> Result<ServerNodeStatusResponse, BridgeError>;
}

/// HTTP implementation of [`BridgeApi`] over a bootstrap [`EndpointPool`].
///
/// Every attempt picks a fresh endpoint; transport failures and 5xx
/// answers are retried up to [`MAX_ATTEMPTS`] times, everything else
/// propagates immediately.
pub struct HttpBridge {
    pool: EndpointPool,
    http: reqwest::Client,
    max_attempts: u32,
}

impl HttpBridge {
    pub fn new(pool: EndpointPool) -> Result<Self, BridgeError> {
        Self::with_timeout(pool, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(pool: EndpointPool, timeout: Duration) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        Ok(Self {
            pool,
            http,
            max_attempts: MAX_ATTEMPTS,
        })
    }

    /// Issue one logical request, re-picking the endpoint on each attempt.
    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, BridgeError> {
        let mut last_transport = String::new();

        for attempt in 1..=self.max_attempts {
            let endpoint = self.pool.pick();
            let url = format!("{endpoint}{path}");
            debug!(%url, attempt, "bridge request");

            let request = match body {
                Some(b) => self.http.post(&url).json(b),
                None => self.http.get(&url),
            };
            let request = if query.is_empty() {
                request
            } else {
                request.query(query)
            };

            match request.send().await {
                Err(e) => {
                    warn!(%endpoint, attempt, error = %e, "transport failure, re-picking endpoint");
                    last_transport = e.to_string();
                }
                Ok(resp) if resp.status().is_server_error() => {
                    warn!(%endpoint, attempt, status = %resp.status(), "server error, re-picking endpoint");
                    last_transport = format!("HTTP {}", resp.status());
                }
                Ok(resp) if !resp.status().is_success() => {
                    return Err(BridgeError::RemoteRejected(format!(
                        "HTTP {}",
                        resp.status()
                    )));
                }
                Ok(resp) => {
                    return resp
                        .json::<T>()
                        .await
                        .map_err(|e| BridgeError::InvalidResponse(e.to_string()));
                }
            }
        }

        Err(BridgeError::Transport(last_transport))
    }
}

#[async_trait]
impl BridgeApi for HttpBridge {
    async fn phase_inputs(&self) -> Result<PhaseInputsResponse, BridgeError> {
        let resp: PhaseInputsResponse = self.execute("/network/phase-inputs", &[], None).await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected("phase inputs unavailable".into()));
        }
        Ok(resp)
    }

    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, BridgeError> {
        let body = serde_json::to_value(req)
            .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?;
        let resp: RegisterResponse = self
            .execute("/light-node/register", &[], Some(&body))
            .await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected("registration refused".into()));
        }
        Ok(resp)
    }

    async fn pending_challenge(&self, node_id: &str) -> Result<Option<String>, BridgeError> {
        let resp: PendingChallengeResponse = self
            .execute("/light-node/pending-challenge", &[("node_id", node_id)], None)
            .await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected("challenge query refused".into()));
        }
        Ok(if resp.has_challenge { resp.challenge } else { None })
    }

    async fn submit_ping_response(
        &self,
        node_id: &str,
        challenge: &str,
        signature: &str,
    ) -> Result<(), BridgeError> {
        let resp: PingAckResponse = self
            .execute(
                "/light-node/ping-response",
                &[
                    ("node_id", node_id),
                    ("challenge", challenge),
                    ("signature", signature),
                ],
                None,
            )
            .await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected(
                resp.error.unwrap_or_else(|| "ping response refused".into()),
            ));
        }
        Ok(())
    }

    async fn next_ping(&self, node_id: &str) -> Result<NextPingResponse, BridgeError> {
        let resp: NextPingResponse = self
            .execute("/light-node/next-ping", &[("node_id", node_id)], None)
            .await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected("next-ping query refused".into()));
        }
        Ok(resp)
    }

    async fn light_node_status(
        &self,
        node_id: &str,
    ) -> Result<LightNodeStatusResponse, BridgeError> {
        let resp: LightNodeStatusResponse = self
            .execute("/light-node/status", &[("node_id", node_id)], None)
            .await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected("status query refused".into()));
        }
        Ok(resp)
    }

    async fn reactivate(&self, req: &ReactivateRequest) -> Result<ReactivateResponse, BridgeError> {
        let body = serde_json::to_value(req)
            .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?;
        let resp: ReactivateResponse = self
            .execute("/light-node/reactivate", &[], Some(&body))
            .await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected(
                resp.message.unwrap_or_else(|| "reactivation refused".into()),
            ));
        }
        Ok(resp)
    }

    async fn server_node_status(
        &self,
        query: &ServerNodeQuery,
    ) -> Result<ServerNodeStatusResponse, BridgeError> {
        let pair = query.as_query_pair();
        let resp: ServerNodeStatusResponse =
            self.execute("/node/status", &[pair], None).await?;
        if !resp.success {
            return Err(BridgeError::RemoteRejected("node status query refused".into()));
        }
        Ok(resp)
    }
}
