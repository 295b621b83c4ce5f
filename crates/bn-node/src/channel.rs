use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::NodeConfig;

/// How liveness challenges reach this device.  On the wire the kind
/// travels as its [`PushChannelKind::wire_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushChannelKind {
    /// Self-hosted UnifiedPush distributor.  Preferred: no vendor
    /// dependency.
    UnifiedPush,

    /// Vendor push service, addressed by a delivery token.
    VendorPush,

    /// No push channel; the node wakes itself shortly before each
    /// expected challenge and polls.
    Polling,
}

impl PushChannelKind {
    /// Name used in the `push_type` wire field.
    pub fn wire_name(self) -> &'static str {
        match self {
            PushChannelKind::UnifiedPush => "unified_push",
            PushChannelKind::VendorPush => "fcm",
            PushChannelKind::Polling => "polling",
        }
    }
}

/// A usable delivery channel: the kind plus its handle (an endpoint URL
/// or a delivery token).  Polling has no handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushChannel {
    pub kind: PushChannelKind,
    pub handle: Option<String>,
}

impl PushChannel {
    pub fn unified_push(endpoint: impl Into<String>) -> Self {
        Self {
            kind: PushChannelKind::UnifiedPush,
            handle: Some(endpoint.into()),
        }
    }

    pub fn vendor(token: impl Into<String>) -> Self {
        Self {
            kind: PushChannelKind::VendorPush,
            handle: Some(token.into()),
        }
    }

    pub fn polling() -> Self {
        Self {
            kind: PushChannelKind::Polling,
            handle: None,
        }
    }

    /// The handle as a vendor delivery token, if that is what it is.
    pub fn device_token(&self) -> Option<&str> {
        match self.kind {
            PushChannelKind::VendorPush => self.handle.as_deref(),
            _ => None,
        }
    }

    /// The handle as a UnifiedPush endpoint, if that is what it is.
    pub fn unified_push_endpoint(&self) -> Option<&str> {
        match self.kind {
            PushChannelKind::UnifiedPush => self.handle.as_deref(),
            _ => None,
        }
    }
}

/// One capability probe in the detection chain.
///
/// Probes are tried in priority order; the first usable handle wins.
/// Declining (returning `None`) is normal, not an error.
#[async_trait]
pub trait ChannelProbe: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &'static str;

    /// Try to obtain a usable delivery handle.
    async fn probe(&self) -> Option<PushChannel>;
}

/// Probe for a locally configured UnifiedPush distributor endpoint.
pub struct UnifiedPushProbe {
    endpoint: Option<String>,
}

impl UnifiedPushProbe {
    pub fn new(endpoint: Option<String>) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ChannelProbe for UnifiedPushProbe {
    fn name(&self) -> &'static str {
        "unified-push"
    }

    async fn probe(&self) -> Option<PushChannel> {
        self.endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .map(PushChannel::unified_push)
    }
}

/// Probe for a vendor push delivery token.
pub struct VendorPushProbe {
    token: Option<String>,
}

impl VendorPushProbe {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl ChannelProbe for VendorPushProbe {
    fn name(&self) -> &'static str {
        "vendor-push"
    }

    async fn probe(&self) -> Option<PushChannel> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(PushChannel::vendor)
    }
}

/// The default probe chain for a config: self-hosted push first, vendor
/// push second.  Polling is the fallback, not a probe.
pub fn default_probes(config: &NodeConfig) -> Vec<Box<dyn ChannelProbe>> {
    vec![
        Box::new(UnifiedPushProbe::new(config.unified_push_endpoint.clone())),
        Box::new(VendorPushProbe::new(config.vendor_push_token.clone())),
    ]
}

/// Run the probes in order and return the first usable channel, falling
/// back to polling when every probe declines.  Detection cannot fail:
/// a node with no push capability still registers, as `polling`.
pub async fn detect_channel(probes: &[Box<dyn ChannelProbe>]) -> PushChannel {
    for probe in probes {
        match probe.probe().await {
            Some(channel) => {
                info!(probe = probe.name(), kind = ?channel.kind, "push channel detected");
                return channel;
            }
            None => debug!(probe = probe.name(), "probe declined"),
        }
    }

    info!("no push channel available, falling back to polling");
    PushChannel::polling()
}
