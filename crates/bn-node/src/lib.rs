pub mod chain;
pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod gate;
pub mod schedule;
pub mod service;
pub mod state;

pub use chain::ChainGateway;
pub use channel::{ChannelProbe, PushChannel, PushChannelKind};
pub use config::NodeConfig;
pub use error::NodeError;
pub use event::LivenessEvent;
pub use gate::{ActivationGate, ActivationMethod, ActivationResult};
pub use service::LivenessService;
pub use state::{LivenessStatus, NodeRegistration, NodeState, PingChallenge};
