use std::sync::Arc;

use bn_bridge::{wire::RegisterRequest, BridgeApi};
use bn_signer::ChallengeSigner;
use chrono::Utc;
use tokio::{sync::mpsc, time};
use tracing::{debug, info, warn};

use crate::{
    channel::{detect_channel, ChannelProbe},
    config::NodeConfig,
    error::NodeError,
    event::LivenessEvent,
    schedule::{in_ping_window, wake_at, WakeScheduler},
    state::{LivenessStatus, NodeRegistration, NodeState, PingChallenge},
};

/// Wire body of a reactivation proof: `reactivate:{node_id}:{timestamp}`.
pub fn reactivation_message(node_id: &str, timestamp: i64) -> String {
    format!("reactivate:{node_id}:{timestamp}")
}

/// Wire body of a registration proof, binding the node to this wallet
/// and device.
pub fn registration_message(node_id: &str, wallet_address: &str, device_id: &str) -> String {
    format!("register:{node_id}:{wallet_address}:{device_id}")
}

/// Keeps one registered light node alive.
///
/// Registers the node with the best available push channel, answers
/// cryptographic challenges regardless of how they arrive, and — for
/// nodes without a push channel — wakes itself precisely before each
/// expected challenge instead of polling on a short interval.
///
/// Emits [`LivenessEvent`]s over a channel for the embedding application
/// to observe.
pub struct LivenessService {
    config: NodeConfig,
    bridge: Arc<dyn BridgeApi>,
    signer: Arc<dyn ChallengeSigner>,
    state: NodeState,
    registration: Option<NodeRegistration>,
    status: Option<LivenessStatus>,
    scheduler: WakeScheduler,
    wake_tx: mpsc::UnboundedSender<()>,
    wake_rx: mpsc::UnboundedReceiver<()>,
    push_tx: mpsc::UnboundedSender<PingChallenge>,
    push_rx: mpsc::UnboundedReceiver<PingChallenge>,
    event_tx: mpsc::UnboundedSender<LivenessEvent>,
}

impl LivenessService {
    /// Create the service together with a receiver for [`LivenessEvent`]s
    /// that the calling application can process independently.
    pub fn new(
        config: NodeConfig,
        bridge: Arc<dyn BridgeApi>,
        signer: Arc<dyn ChallengeSigner>,
    ) -> (Self, mpsc::UnboundedReceiver<LivenessEvent>) {
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let service = Self {
            config,
            bridge,
            signer,
            state: NodeState::Unregistered,
            registration: None,
            status: None,
            scheduler: WakeScheduler::new(),
            wake_tx,
            wake_rx,
            push_tx,
            push_rx,
            event_tx,
        };

        (service, event_rx)
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn registration(&self) -> Option<&NodeRegistration> {
        self.registration.as_ref()
    }

    pub fn status(&self) -> Option<&LivenessStatus> {
        self.status.as_ref()
    }

    /// Sender for challenges delivered by a push channel.  Platform push
    /// glue feeds this; the service answers them on the same code path as
    /// polled challenges.
    pub fn challenge_sender(&self) -> mpsc::UnboundedSender<PingChallenge> {
        self.push_tx.clone()
    }

    /// Register the node minted by a successful activation.
    ///
    /// Detects the best available push channel via `probes` (first usable
    /// handle wins, polling as the fallback), signs the registration, and
    /// stores the authoritative first ping window from the response.
    pub async fn register(
        &mut self,
        node_id: &str,
        probes: &[Box<dyn ChannelProbe>],
    ) -> Result<(), NodeError> {
        if self.registration.is_some() {
            return Err(NodeError::AlreadyRegistered);
        }

        self.state = NodeState::Registering;
        let channel = detect_channel(probes).await;
        let device_id = self.config.device_id();

        let message = registration_message(node_id, &self.config.wallet_address, &device_id);
        let signature = match self.signer.sign(message.as_bytes()).await {
            Ok(sig) => sig,
            Err(e) => {
                self.state = NodeState::Unregistered;
                return Err(e.into());
            }
        };

        let request = RegisterRequest {
            node_id: node_id.to_string(),
            wallet_address: self.config.wallet_address.clone(),
            device_id: device_id.clone(),
            quantum_pubkey: self.signer.public_key_hex(),
            quantum_signature: hex::encode(signature),
            push_type: channel.kind.wire_name().to_string(),
            device_token: channel.device_token().map(str::to_string),
            unified_push_endpoint: channel.unified_push_endpoint().map(str::to_string),
        };

        let response = match self.bridge.register(&request).await {
            Ok(resp) => resp,
            Err(e) => {
                self.state = NodeState::Unregistered;
                return Err(e.into());
            }
        };

        info!(
            node_id = %response.node_id,
            channel = ?channel.kind,
            next_ping_time = response.next_ping_time,
            "light node registered"
        );

        self.registration = Some(NodeRegistration {
            node_id: response.node_id.clone(),
            wallet_address: self.config.wallet_address.clone(),
            device_id,
            channel: channel.clone(),
            registered_at: Utc::now(),
        });
        self.status = Some(LivenessStatus {
            node_id: response.node_id.clone(),
            is_active: true,
            consecutive_failures: 0,
            next_ping_time: response.next_ping_time,
            next_ping_window: response.next_ping_window,
            needs_reactivation: false,
        });
        self.state = NodeState::Active;

        let _ = self.event_tx.send(LivenessEvent::Registered {
            node_id: response.node_id,
            channel: channel.kind,
        });

        self.reschedule_wake();
        Ok(())
    }

    /// Answer one challenge: sign its nonce and return the signature
    /// within the current window.  The single code path for challenges
    /// from every delivery channel.
    pub async fn answer_challenge(&mut self, challenge: &PingChallenge) -> Result<(), NodeError> {
        let node_id = self
            .registration
            .as_ref()
            .ok_or(NodeError::NotRegistered)?
            .node_id
            .clone();

        let signature = self.signer.sign(challenge.challenge_nonce.as_bytes()).await?;
        self.bridge
            .submit_ping_response(&node_id, &challenge.challenge_nonce, &hex::encode(signature))
            .await?;

        debug!(%node_id, "challenge answered");
        let _ = self
            .event_tx
            .send(LivenessEvent::ChallengeAnswered { node_id });

        // A successful response refreshes the next window.
        self.refresh_next_ping().await
    }

    /// One wake-up: poll for a pending challenge and answer it.
    ///
    /// `forced` marks the platform's periodic background check; such
    /// checks perform no remote call outside the ping window.  Returns
    /// whether a challenge was answered.
    pub async fn poll_once(&mut self, forced: bool) -> Result<bool, NodeError> {
        let status = self.status.as_ref().ok_or(NodeError::NotRegistered)?;

        if forced && !in_ping_window(Utc::now().timestamp(), status.next_ping_time) {
            debug!("outside ping window, skipping remote call");
            return Ok(false);
        }

        let node_id = status.node_id.clone();
        match self.bridge.pending_challenge(&node_id).await? {
            Some(nonce) => {
                let challenge = PingChallenge {
                    node_id,
                    challenge_nonce: nonce,
                    issued_at: Utc::now().timestamp(),
                };
                self.answer_challenge(&challenge).await?;
                Ok(true)
            }
            None => {
                debug!(%node_id, "no pending challenge");
                // Still re-derive the next window and reschedule.
                self.refresh_next_ping().await?;
                Ok(false)
            }
        }
    }

    /// Refresh the remote liveness bookkeeping.  Drives the `Degraded`
    /// transition when the remote reports `needs_reactivation`.
    pub async fn refresh_status(&mut self) -> Result<LivenessStatus, NodeError> {
        let node_id = self
            .registration
            .as_ref()
            .ok_or(NodeError::NotRegistered)?
            .node_id
            .clone();

        let wire = self.bridge.light_node_status(&node_id).await?;
        let status = LivenessStatus {
            node_id: node_id.clone(),
            is_active: wire.is_active,
            consecutive_failures: wire.consecutive_failures,
            next_ping_time: wire.next_ping_time,
            next_ping_window: wire.next_ping_window,
            needs_reactivation: wire.needs_reactivation,
        };

        if status.needs_reactivation && self.state == NodeState::Active {
            warn!(%node_id, failures = status.consecutive_failures, "node degraded, reactivation required");
            self.state = NodeState::Degraded;
            let _ = self.event_tx.send(LivenessEvent::Degraded {
                node_id,
                consecutive_failures: status.consecutive_failures,
            });
        }

        self.status = Some(status.clone());
        self.reschedule_wake();
        Ok(status)
    }

    /// Reset the remote failure count with a signed reactivation proof.
    ///
    /// Idempotent: reactivating an already-active node is a harmless
    /// no-op reported as `was_reactivated = false`.  Returns whether the
    /// remote actually flipped the node back to active.
    pub async fn reactivate(&mut self) -> Result<bool, NodeError> {
        let registration = self.registration.as_ref().ok_or(NodeError::NotRegistered)?;
        let node_id = registration.node_id.clone();
        let wallet_address = registration.wallet_address.clone();

        let timestamp = Utc::now().timestamp();
        let message = reactivation_message(&node_id, timestamp);
        let signature = self.signer.sign(message.as_bytes()).await?;

        let response = self
            .bridge
            .reactivate(&bn_bridge::wire::ReactivateRequest {
                node_id: node_id.clone(),
                wallet_address,
                signature: hex::encode(signature),
                timestamp,
            })
            .await?;

        if let Some(status) = &mut self.status {
            status.is_active = true;
            status.consecutive_failures = 0;
            status.needs_reactivation = false;
            status.next_ping_time = response.next_ping_time;
            status.next_ping_window = response.next_ping_window;
        }
        self.state = NodeState::Active;

        info!(%node_id, was_reactivated = response.was_reactivated, "reactivation acknowledged");
        let _ = self.event_tx.send(LivenessEvent::Reactivated {
            node_id,
            was_reactivated: response.was_reactivated,
        });

        self.reschedule_wake();
        Ok(response.was_reactivated)
    }

    /// Logout/delete: cancel any pending wake-up and clear the local
    /// registration.  In-flight requests are left to finish; their
    /// results are discarded with the registration.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();

        if let Some(registration) = self.registration.take() {
            info!(node_id = %registration.node_id, "registration cleared");
            let _ = self.event_tx.send(LivenessEvent::Deregistered {
                node_id: registration.node_id,
            });
        }
        self.status = None;
        self.state = NodeState::Unregistered;
    }

    /// Run the liveness loop: react to inbound push challenges, the
    /// self-scheduled one-shot wake, and the platform's forced periodic
    /// check.  Runs until cancelled.
    pub async fn run(&mut self) {
        let mut ticker = time::interval(self.config.periodic_check_interval);
        // Skip ticks that pile up while a slow remote call is in flight.
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        // Consume the immediate first tick so the next fires after one period.
        ticker.tick().await;

        loop {
            tokio::select! {
                Some(challenge) = self.push_rx.recv() => {
                    if let Err(e) = self.answer_challenge(&challenge).await {
                        warn!(error = %e, "failed to answer pushed challenge");
                    }
                }
                Some(()) = self.wake_rx.recv() => {
                    debug!("scheduled wake fired");
                    if let Err(e) = self.poll_once(false).await {
                        warn!(error = %e, "scheduled poll failed");
                    }
                }
                _ = ticker.tick() => {
                    if self.registration.is_none() {
                        continue;
                    }
                    if let Err(e) = self.poll_once(true).await {
                        warn!(error = %e, "periodic check failed");
                    }
                }
            }
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Fetch the authoritative next window and reschedule the wake-up.
    async fn refresh_next_ping(&mut self) -> Result<(), NodeError> {
        let node_id = self
            .registration
            .as_ref()
            .ok_or(NodeError::NotRegistered)?
            .node_id
            .clone();

        let next = self.bridge.next_ping(&node_id).await?;
        if let Some(status) = &mut self.status {
            status.next_ping_time = next.next_ping_time;
            status.next_ping_window = next.next_ping_window;
        }

        self.reschedule_wake();
        Ok(())
    }

    /// Cancel-if-present, then schedule the one-shot wake `120 s` before
    /// the next expected ping.  Only the polling channel needs this; push
    /// channels are woken by inbound delivery.
    fn reschedule_wake(&mut self) {
        let Some(registration) = &self.registration else {
            return;
        };
        if registration.channel.kind != crate::channel::PushChannelKind::Polling {
            return;
        }
        let Some(status) = &self.status else {
            return;
        };

        let at = wake_at(status.next_ping_time);
        self.scheduler.schedule(at, &self.wake_tx);
        let _ = self.event_tx.send(LivenessEvent::WakeScheduled { wake_at: at });
    }
}
