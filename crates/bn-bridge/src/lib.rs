pub mod client;
pub mod endpoints;
pub mod error;
pub mod wire;

pub use client::{BridgeApi, HttpBridge, ServerNodeQuery};
pub use endpoints::EndpointPool;
pub use error::BridgeError;
