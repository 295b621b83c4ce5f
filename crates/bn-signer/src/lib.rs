pub mod error;
pub mod signer;

pub use error::SignerError;
pub use signer::{ChallengeSigner, LocalSigner};
