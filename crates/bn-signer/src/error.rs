use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The wallet key is unavailable.  Surfaced to the user (prompt for
    /// unlock); never retried automatically.
    #[error("wallet is locked; unlock it to sign")]
    WalletLocked,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}
