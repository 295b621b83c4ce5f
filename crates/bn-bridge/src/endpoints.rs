use rand::seq::SliceRandom;

use crate::error::BridgeError;

/// Compiled-in bootstrap service addresses.  Interchangeable: any of them
/// can serve any call, so callers spread load by picking at random.
const BOOTSTRAP_ENDPOINTS: &[&str] = &[
    "https://boot1.beaconnet.io",
    "https://boot2.beaconnet.io",
    "https://boot3.beaconnet.io",
    "https://boot4.beaconnet.io",
];

/// A non-empty set of interchangeable bootstrap addresses.
///
/// `pick()` never fails: emptiness is ruled out at construction, so every
/// call site gets an address without an error path.
#[derive(Debug, Clone)]
pub struct EndpointPool {
    endpoints: Vec<String>,
}

impl Default for EndpointPool {
    fn default() -> Self {
        Self::bootstrap()
    }
}

impl EndpointPool {
    /// The compiled-in bootstrap pool.
    pub fn bootstrap() -> Self {
        Self {
            endpoints: BOOTSTRAP_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Build a pool from explicit addresses (e.g. a local test server).
    pub fn from_endpoints(endpoints: Vec<String>) -> Result<Self, BridgeError> {
        if endpoints.is_empty() {
            return Err(BridgeError::NoEndpoints);
        }
        Ok(Self { endpoints })
    }

    /// Choose one address uniformly at random.
    ///
    /// Callers that hit a transport error on the returned address should
    /// re-pick and retry (bounded) rather than fail immediately.
    pub fn pick(&self) -> &str {
        // Safety: the pool is non-empty by construction.
        self.endpoints
            .choose(&mut rand::thread_rng())
            .expect("endpoint pool is never empty")
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// All addresses in the pool, for diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn bootstrap_pool_is_non_empty() {
        assert!(!EndpointPool::bootstrap().is_empty());
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(
            EndpointPool::from_endpoints(vec![]),
            Err(BridgeError::NoEndpoints)
        ));
    }

    #[test]
    fn pick_returns_a_pool_member() {
        let pool = EndpointPool::bootstrap();
        let members: HashSet<&str> = pool.iter().collect();
        for _ in 0..100 {
            assert!(members.contains(pool.pick()));
        }
    }

    #[test]
    fn pick_eventually_covers_the_whole_pool() {
        let pool = EndpointPool::from_endpoints(vec![
            "http://a".into(),
            "http://b".into(),
            "http://c".into(),
        ])
        .unwrap();

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            seen.insert(pool.pick().to_string());
        }
        assert_eq!(seen.len(), pool.len());
    }
}
