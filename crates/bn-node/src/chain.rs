use async_trait::async_trait;
use bn_bridge::BridgeError;
use bn_pricing::Currency;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The external chain side of activation: balance lookup plus the
/// burn/transfer execution.  Lives in a separate wallet-bridge service;
/// this client only calls it over HTTP.  Tests use in-memory fakes.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Spendable balance of the activating wallet in `currency`.
    async fn balance_of(&self, currency: Currency) -> Result<u64, BridgeError>;

    /// Irreversibly destroy `amount` burn tokens.  Returns a transaction
    /// reference.
    async fn burn(&self, amount: u64) -> Result<String, BridgeError>;

    /// Transfer `amount` native tokens into the redistribution pool.
    /// Returns a transaction reference.
    async fn transfer(&self, amount: u64) -> Result<String, BridgeError>;
}

#[derive(Debug, Serialize)]
struct SpendRequest {
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct SpendResponse {
    success: bool,
    tx_ref: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    success: bool,
    balance: u64,
}

/// HTTP implementation of [`ChainGateway`] against the device's
/// wallet-bridge service.
pub struct HttpChainGateway {
    base_url: String,
    http: reqwest::Client,
}

impl HttpChainGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(bn_bridge::client::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    async fn spend(&self, path: &str, amount: u64) -> Result<String, BridgeError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, amount, "chain gateway call");

        let resp = self
            .http
            .post(&url)
            .json(&SpendRequest { amount })
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BridgeError::RemoteRejected(format!("HTTP {}", resp.status())));
        }

        let body: SpendResponse = resp
            .json()
            .await
            .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?;
        if !body.success {
            return Err(BridgeError::RemoteRejected("spend refused".into()));
        }
        Ok(body.tx_ref)
    }
}

#[async_trait]
impl ChainGateway for HttpChainGateway {
    async fn balance_of(&self, currency: Currency) -> Result<u64, BridgeError> {
        let url = format!("{}/wallet/balance", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("currency", currency.ticker())])
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BridgeError::RemoteRejected(format!("HTTP {}", resp.status())));
        }

        let body: BalanceResponse = resp
            .json()
            .await
            .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?;
        if !body.success {
            return Err(BridgeError::RemoteRejected("balance query refused".into()));
        }
        Ok(body.balance)
    }

    async fn burn(&self, amount: u64) -> Result<String, BridgeError> {
        self.spend("/wallet/burn", amount).await
    }

    async fn transfer(&self, amount: u64) -> Result<String, BridgeError> {
        self.spend("/wallet/transfer", amount).await
    }
}
