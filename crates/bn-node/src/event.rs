use crate::channel::PushChannelKind;

/// High-level events emitted by a running [`crate::LivenessService`] that
/// the embedding application can subscribe to via a channel.
#[derive(Debug, Clone)]
pub enum LivenessEvent {
    /// Registration succeeded with the given delivery channel.
    Registered {
        node_id: String,
        channel: PushChannelKind,
    },

    /// A one-shot wake-up has been scheduled (Unix seconds).
    WakeScheduled { wake_at: i64 },

    /// A challenge was signed and answered within its window.
    ChallengeAnswered { node_id: String },

    /// The remote reported `needs_reactivation`; the node is degraded and
    /// the UI should offer a one-tap reactivation.
    Degraded {
        node_id: String,
        consecutive_failures: u32,
    },

    /// A reactivation round-trip completed.  `was_reactivated` is false
    /// when the node was already active (harmless no-op).
    Reactivated {
        node_id: String,
        was_reactivated: bool,
    },

    /// The registration was cleared and pending wake-ups cancelled.
    Deregistered { node_id: String },
}
