use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use tokio::sync::Mutex;

use crate::error::SignerError;

/// Signing capability borrowed from the wallet subsystem.
///
/// The key itself is owned elsewhere; callers borrow it for the duration
/// of one sign operation.  Implementations must allow only one outstanding
/// sign at a time per key and report an unavailable key as
/// [`SignerError::WalletLocked`] so the caller can prompt for unlock
/// instead of retrying.
#[async_trait]
pub trait ChallengeSigner: Send + Sync {
    /// Sign `message`, returning the raw signature bytes.
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;

    /// Hex-encoded public key matching the signing key.
    fn public_key_hex(&self) -> String;
}

/// In-process [`ChallengeSigner`] over an ed25519 key.
///
/// The `Mutex` serialises sign operations; the lock flag models the
/// wallet's locked state, which makes the key unavailable without
/// destroying it.
pub struct LocalSigner {
    verifying_key: VerifyingKey,
    locked: AtomicBool,
    key: Mutex<SigningKey>,
}

impl LocalSigner {
    pub fn new(key: SigningKey) -> Self {
        Self {
            verifying_key: key.verifying_key(),
            locked: AtomicBool::new(false),
            key: Mutex::new(key),
        }
    }

    /// Generate a fresh random key (for tests and first-run setups).
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Load a signer from a hex-encoded 32-byte secret key.
    pub fn from_hex(secret_hex: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(secret_hex).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SignerError::InvalidKey("secret key must be 32 bytes".into()))?;
        Ok(Self::new(SigningKey::from_bytes(&bytes)))
    }

    /// Make the key unavailable until [`LocalSigner::unlock`].
    pub fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.verifying_key
    }
}

#[async_trait]
impl ChallengeSigner for LocalSigner {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        if self.is_locked() {
            return Err(SignerError::WalletLocked);
        }

        let key = self.key.lock().await;
        Ok(key.sign(message).to_bytes().to_vec())
    }

    fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signature, Verifier};

    use super::*;

    #[tokio::test]
    async fn signatures_verify_against_the_public_key() {
        let signer = LocalSigner::generate();
        let sig_bytes = signer.sign(b"challenge-nonce").await.unwrap();

        let sig = Signature::from_slice(&sig_bytes).unwrap();
        assert!(signer
            .verifying_key()
            .verify(b"challenge-nonce", &sig)
            .is_ok());
    }

    #[tokio::test]
    async fn locked_wallet_refuses_to_sign() {
        let signer = LocalSigner::generate();
        signer.lock();
        assert_eq!(
            signer.sign(b"nonce").await.unwrap_err(),
            SignerError::WalletLocked
        );

        signer.unlock();
        assert!(signer.sign(b"nonce").await.is_ok());
    }

    #[tokio::test]
    async fn hex_round_trip_preserves_the_key() {
        let signer = LocalSigner::generate();
        let secret_hex = {
            let key = signer.key.lock().await;
            hex::encode(key.to_bytes())
        };

        let restored = LocalSigner::from_hex(&secret_hex).unwrap();
        assert_eq!(restored.public_key_hex(), signer.public_key_hex());
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(
            LocalSigner::from_hex("not-hex"),
            Err(SignerError::InvalidKey(_))
        ));
        assert!(matches!(
            LocalSigner::from_hex("abcd"),
            Err(SignerError::InvalidKey(_))
        ));
    }
}
