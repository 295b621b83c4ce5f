use std::fmt;
use std::sync::Arc;

use bn_bridge::BridgeApi;
use bn_pricing::{quote_burn, quote_stake, Currency, NodeClass, Phase, PhaseState, PriceQuote};
use tracing::info;
use uuid::Uuid;

use crate::{chain::ChainGateway, error::NodeError};

/// How an activation is paid for.  Economically tied to a phase: burning
/// is the phase-1 path, transferring the phase-2 path, and only the path
/// matching the current phase may execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMethod {
    Burn,
    Transfer,
}

impl ActivationMethod {
    /// The only phase this method is allowed in.
    pub fn required_phase(self) -> Phase {
        match self {
            ActivationMethod::Burn => Phase::One,
            ActivationMethod::Transfer => Phase::Two,
        }
    }

    pub fn currency(self) -> Currency {
        match self {
            ActivationMethod::Burn => Currency::Burn,
            ActivationMethod::Transfer => Currency::Native,
        }
    }
}

impl fmt::Display for ActivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivationMethod::Burn => "burn",
            ActivationMethod::Transfer => "transfer",
        })
    }
}

/// Everything the liveness service needs to register the node paid for
/// by a successful activation.
#[derive(Debug, Clone)]
pub struct ActivationResult {
    pub node_id: String,
    pub node_class: NodeClass,
    pub phase: Phase,
    pub paid: u64,
    pub currency: Currency,
    pub tx_ref: String,
}

/// Enforces that only the activation path matching the current phase may
/// execute, and orders the steps so that no partial state is left behind:
/// phase check, pre-flight balance check, chain call — registration is
/// only attempted by the caller once all three succeeded.
pub struct ActivationGate {
    bridge: Arc<dyn BridgeApi>,
    chain: Arc<dyn ChainGateway>,
}

impl ActivationGate {
    pub fn new(bridge: Arc<dyn BridgeApi>, chain: Arc<dyn ChainGateway>) -> Self {
        Self { bridge, chain }
    }

    /// Fetch fresh phase inputs and derive the current phase.
    ///
    /// A fetch failure yields [`NodeError::PhaseUnknown`]: with the phase
    /// unknown, both activation paths are refused rather than guessed at.
    pub async fn current_phase_state(&self) -> Result<(PhaseState, u64), NodeError> {
        let inputs = self
            .bridge
            .phase_inputs()
            .await
            .map_err(|e| NodeError::PhaseUnknown(e.to_string()))?;

        Ok((
            PhaseState::new(inputs.burn_percent, inputs.network_age_years),
            inputs.network_size,
        ))
    }

    /// Price `node_class` under the current phase.  Computed live; quotes
    /// are not locked in and must be refreshed before activating.
    pub async fn quote(&self, node_class: NodeClass) -> Result<PriceQuote, NodeError> {
        let (state, network_size) = self.current_phase_state().await?;

        let quote = match state.phase {
            Phase::One => quote_burn(node_class, &state)?,
            Phase::Two => quote_stake(node_class, &state, network_size)?,
        };
        Ok(quote)
    }

    /// Activate a node of `node_class` by paying `amount` via `method`.
    ///
    /// Fails fast with [`NodeError::WrongPhaseForMethod`] when the method
    /// does not match the current phase, and with
    /// [`NodeError::InsufficientBalance`] before any fees are spent.  If
    /// the chain call itself fails, no node identity is minted and no
    /// registration must be attempted.
    pub async fn activate(
        &self,
        node_class: NodeClass,
        method: ActivationMethod,
        amount: u64,
    ) -> Result<ActivationResult, NodeError> {
        let (state, _) = self.current_phase_state().await?;

        if method.required_phase() != state.phase {
            return Err(NodeError::WrongPhaseForMethod {
                method,
                phase: state.phase,
            });
        }

        let currency = method.currency();
        let available = self.chain.balance_of(currency).await?;
        if available < amount {
            return Err(NodeError::InsufficientBalance {
                needed: amount,
                available,
                currency,
            });
        }

        let tx_ref = match method {
            ActivationMethod::Burn => self.chain.burn(amount).await?,
            ActivationMethod::Transfer => self.chain.transfer(amount).await?,
        };

        let node_id = Uuid::new_v4().to_string();
        info!(%node_id, %method, class = %node_class, amount, %currency, "node activated");

        Ok(ActivationResult {
            node_id,
            node_class,
            phase: state.phase,
            paid: amount,
            currency,
            tx_ref,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use bn_bridge::{
        wire::{
            LightNodeStatusResponse, NextPingResponse, PhaseInputsResponse, ReactivateRequest,
            ReactivateResponse, RegisterRequest, RegisterResponse, ServerNodeStatusResponse,
        },
        BridgeError, ServerNodeQuery,
    };

    use super::*;

    /// Bridge fake that only answers phase-input queries.
    struct PhaseBridge {
        burn_percent: f64,
        network_age_years: f64,
        network_size: u64,
        fail: bool,
    }

    #[async_trait]
    impl BridgeApi for PhaseBridge {
        async fn phase_inputs(&self) -> Result<PhaseInputsResponse, BridgeError> {
            if self.fail {
                return Err(BridgeError::Transport("connection refused".into()));
            }
            Ok(PhaseInputsResponse {
                success: true,
                burn_percent: self.burn_percent,
                network_age_years: self.network_age_years,
                network_size: self.network_size,
            })
        }

        async fn register(&self, _: &RegisterRequest) -> Result<RegisterResponse, BridgeError> {
            unimplemented!("not used by gate tests")
        }

        async fn pending_challenge(&self, _: &str) -> Result<Option<String>, BridgeError> {
            unimplemented!("not used by gate tests")
        }

        async fn submit_ping_response(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<(), BridgeError> {
            unimplemented!("not used by gate tests")
        }

        async fn next_ping(&self, _: &str) -> Result<NextPingResponse, BridgeError> {
            unimplemented!("not used by gate tests")
        }

        async fn light_node_status(
            &self,
            _: &str,
        ) -> Result<LightNodeStatusResponse, BridgeError> {
            unimplemented!("not used by gate tests")
        }

        async fn reactivate(&self, _: &ReactivateRequest) -> Result<ReactivateResponse, BridgeError> {
            unimplemented!("not used by gate tests")
        }

        async fn server_node_status(
            &self,
            _: &ServerNodeQuery,
        ) -> Result<ServerNodeStatusResponse, BridgeError> {
            unimplemented!("not used by gate tests")
        }
    }

    /// Chain fake with a fixed balance, counting executed spends.
    struct FakeChain {
        balance: u64,
        spends: AtomicU32,
        fail_spend: bool,
    }

    impl FakeChain {
        fn with_balance(balance: u64) -> Self {
            Self {
                balance,
                spends: AtomicU32::new(0),
                fail_spend: false,
            }
        }
    }

    #[async_trait]
    impl ChainGateway for FakeChain {
        async fn balance_of(&self, _: Currency) -> Result<u64, BridgeError> {
            Ok(self.balance)
        }

        async fn burn(&self, _: u64) -> Result<String, BridgeError> {
            if self.fail_spend {
                return Err(BridgeError::RemoteRejected("burn failed".into()));
            }
            self.spends.fetch_add(1, Ordering::SeqCst);
            Ok("tx-burn".into())
        }

        async fn transfer(&self, _: u64) -> Result<String, BridgeError> {
            if self.fail_spend {
                return Err(BridgeError::RemoteRejected("transfer failed".into()));
            }
            self.spends.fetch_add(1, Ordering::SeqCst);
            Ok("tx-transfer".into())
        }
    }

    fn make_gate(bridge: PhaseBridge, chain: FakeChain) -> (ActivationGate, Arc<FakeChain>) {
        let chain = Arc::new(chain);
        (
            ActivationGate::new(Arc::new(bridge), chain.clone()),
            chain,
        )
    }

    fn phase_one_bridge() -> PhaseBridge {
        PhaseBridge {
            burn_percent: 15.7,
            network_age_years: 1.0,
            network_size: 50_000,
            fail: false,
        }
    }

    fn phase_two_bridge() -> PhaseBridge {
        PhaseBridge {
            burn_percent: 95.0,
            network_age_years: 1.0,
            network_size: 500_000,
            fail: false,
        }
    }

    #[tokio::test]
    async fn burn_is_rejected_in_phase_two() {
        let (gate, chain) = make_gate(phase_two_bridge(), FakeChain::with_balance(1_000_000));

        let err = gate
            .activate(NodeClass::Light, ActivationMethod::Burn, 1_350)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NodeError::WrongPhaseForMethod {
                method: ActivationMethod::Burn,
                phase: Phase::Two,
            }
        ));
        assert_eq!(chain.spends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transfer_is_rejected_in_phase_one() {
        let (gate, chain) = make_gate(phase_one_bridge(), FakeChain::with_balance(1_000_000));

        let err = gate
            .activate(NodeClass::Full, ActivationMethod::Transfer, 7_500)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NodeError::WrongPhaseForMethod {
                method: ActivationMethod::Transfer,
                phase: Phase::One,
            }
        ));
        assert_eq!(chain.spends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_phase_inputs_refuse_both_paths() {
        let bridge = PhaseBridge {
            fail: true,
            ..phase_one_bridge()
        };
        let (gate, chain) = make_gate(bridge, FakeChain::with_balance(1_000_000));

        for method in [ActivationMethod::Burn, ActivationMethod::Transfer] {
            let err = gate.activate(NodeClass::Light, method, 1).await.unwrap_err();
            assert!(matches!(err, NodeError::PhaseUnknown(_)));
        }
        assert_eq!(chain.spends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn insufficient_balance_spends_nothing() {
        let (gate, chain) = make_gate(phase_one_bridge(), FakeChain::with_balance(100));

        let err = gate
            .activate(NodeClass::Light, ActivationMethod::Burn, 1_350)
            .await
            .unwrap_err();

        match err {
            NodeError::InsufficientBalance {
                needed,
                available,
                currency,
            } => {
                assert_eq!(needed, 1_350);
                assert_eq!(available, 100);
                assert_eq!(currency, Currency::Burn);
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
        assert_eq!(chain.spends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_chain_call_mints_no_identity() {
        let chain = FakeChain {
            fail_spend: true,
            ..FakeChain::with_balance(1_000_000)
        };
        let (gate, chain) = make_gate(phase_one_bridge(), chain);

        let err = gate
            .activate(NodeClass::Light, ActivationMethod::Burn, 1_350)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Bridge(BridgeError::RemoteRejected(_))));
        assert_eq!(chain.spends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_burn_returns_everything_registration_needs() {
        let (gate, chain) = make_gate(phase_one_bridge(), FakeChain::with_balance(1_000_000));

        let result = gate
            .activate(NodeClass::Light, ActivationMethod::Burn, 1_350)
            .await
            .unwrap();

        assert_eq!(result.node_class, NodeClass::Light);
        assert_eq!(result.phase, Phase::One);
        assert_eq!(result.paid, 1_350);
        assert_eq!(result.currency, Currency::Burn);
        assert_eq!(result.tx_ref, "tx-burn");
        assert!(!result.node_id.is_empty());
        assert_eq!(chain.spends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quote_follows_the_live_phase() {
        let (gate, _) = make_gate(phase_one_bridge(), FakeChain::with_balance(0));
        let quote = gate.quote(NodeClass::Light).await.unwrap();
        assert_eq!(quote.amount, 1_350);
        assert_eq!(quote.currency, Currency::Burn);

        let (gate, _) = make_gate(phase_two_bridge(), FakeChain::with_balance(0));
        let quote = gate.quote(NodeClass::Light).await.unwrap();
        assert_eq!(quote.amount, 5_000);
        assert_eq!(quote.currency, Currency::Native);
    }
}
