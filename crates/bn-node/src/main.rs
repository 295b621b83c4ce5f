use std::sync::Arc;

use anyhow::{bail, Context};
use bn_bridge::{BridgeApi, EndpointPool, HttpBridge, ServerNodeQuery};
use bn_node::{
    chain::HttpChainGateway,
    channel::default_probes,
    service::reactivation_message,
    ActivationGate, ActivationMethod, LivenessService, NodeConfig,
};
use bn_pricing::NodeClass;
use bn_signer::{ChallengeSigner, LocalSigner};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Beacon network light-node daemon and activation tool.
#[derive(Parser, Debug)]
#[command(
    name = "bn-node",
    version,
    about = "Beacon network node activation and light-node liveness client",
    long_about = "Activates a node under the current economic phase (burn or \
                  transfer) and keeps light nodes alive by answering signed \
                  liveness challenges, using push delivery where available \
                  and precise one-shot wake-ups otherwise."
)]
struct Cli {
    /// Bootstrap endpoint override (repeatable).  Defaults to the
    /// compiled-in pool.
    #[arg(long, env = "BN_ENDPOINT")]
    endpoint: Vec<String>,

    /// Wallet address that owns (and pays for) the node.
    #[arg(short, long, env = "BN_WALLET")]
    wallet: Option<String>,

    /// Stable device label folded into the device fingerprint.
    #[arg(long, default_value = "bn-device", env = "BN_DEVICE_LABEL")]
    device_label: String,

    /// Hex-encoded signing key supplied by the wallet subsystem.
    #[arg(long, env = "BN_SIGNING_KEY", hide_env_values = true)]
    signing_key: Option<String>,

    /// UnifiedPush endpoint served by a local distributor, if any.
    #[arg(long, env = "BN_UNIFIED_PUSH_ENDPOINT")]
    unified_push_endpoint: Option<String>,

    /// Vendor push delivery token, if any.
    #[arg(long, env = "BN_VENDOR_PUSH_TOKEN")]
    vendor_push_token: Option<String>,

    /// Wallet-bridge service that executes burns and transfers.
    #[arg(long, default_value = "http://127.0.0.1:9090", env = "BN_CHAIN_URL")]
    chain_url: String,

    /// Suppress log output to stderr (run silently).
    #[arg(short, long, default_value_t = false, env = "BN_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price an activation under the current phase.
    Quote {
        /// Node class to price.
        #[arg(short, long, default_value = "light")]
        class: CliClass,
    },

    /// Pay for a new node, register it, and run the liveness loop.
    Activate {
        /// Node class to activate.
        #[arg(short, long, default_value = "light")]
        class: CliClass,

        /// Payment method; must match the current phase.
        #[arg(short, long)]
        method: CliMethod,

        /// Exact amount to pay.  Defaults to a fresh quote.
        #[arg(short, long)]
        amount: Option<u64>,
    },

    /// Register an already-activated node and run the liveness loop.
    Run {
        #[arg(long)]
        node_id: String,
    },

    /// Show the remote liveness bookkeeping for a light node.
    Status {
        #[arg(long)]
        node_id: String,
    },

    /// Read-only monitoring of a server-class node.
    ServerStatus {
        #[arg(long, conflicts_with = "activation_code")]
        node_id: Option<String>,

        #[arg(long)]
        activation_code: Option<String>,
    },

    /// Reset the failure count of a degraded node with a signed proof.
    Reactivate {
        #[arg(long)]
        node_id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CliClass {
    Light,
    Full,
    Super,
}

impl From<CliClass> for NodeClass {
    fn from(class: CliClass) -> Self {
        match class {
            CliClass::Light => NodeClass::Light,
            CliClass::Full => NodeClass::Full,
            CliClass::Super => NodeClass::Super,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CliMethod {
    /// Burn the reference token (phase 1).
    Burn,
    /// Transfer native tokens into the pool (phase 2).
    Transfer,
}

impl From<CliMethod> for ActivationMethod {
    fn from(method: CliMethod) -> Self {
        match method {
            CliMethod::Burn => ActivationMethod::Burn,
            CliMethod::Transfer => ActivationMethod::Transfer,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::from_default_env().add_directive("bn_node=info".parse()?)
    };
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let pool = if cli.endpoint.is_empty() {
        EndpointPool::bootstrap()
    } else {
        EndpointPool::from_endpoints(cli.endpoint.clone())?
    };
    let bridge: Arc<dyn BridgeApi> = Arc::new(HttpBridge::new(pool)?);

    match &cli.command {
        Command::Quote { class } => {
            let gate = gate(&cli, bridge.clone())?;
            let quote = gate.quote((*class).into()).await?;
            println!(
                "phase {} activation of a {} node: {} {}",
                quote.phase, quote.node_class, quote.amount, quote.currency
            );
        }

        Command::Activate {
            class,
            method,
            amount,
        } => {
            let wallet = require_wallet(&cli)?;
            let signer = load_signer(&cli)?;
            let gate = gate(&cli, bridge.clone())?;

            let class: NodeClass = (*class).into();
            let method: ActivationMethod = (*method).into();
            let amount = match amount {
                Some(a) => *a,
                None => gate.quote(class).await?.amount,
            };

            let result = gate.activate(class, method, amount).await?;
            println!(
                "activated {} node {} for {} {} (tx {})",
                result.node_class, result.node_id, result.paid, result.currency, result.tx_ref
            );

            run_liveness(&cli, wallet, bridge, signer, &result.node_id).await?;
        }

        Command::Run { node_id } => {
            let wallet = require_wallet(&cli)?;
            let signer = load_signer(&cli)?;
            run_liveness(&cli, wallet, bridge, signer, node_id).await?;
        }

        Command::Status { node_id } => {
            let status = bridge.light_node_status(node_id).await?;
            println!(
                "node {node_id}: active={} failures={} push={} next_ping={} window={}s needs_reactivation={}",
                status.is_active,
                status.consecutive_failures,
                status.push_type,
                status.next_ping_time,
                status.next_ping_window,
                status.needs_reactivation
            );
        }

        Command::ServerStatus {
            node_id,
            activation_code,
        } => {
            let query = match (node_id, activation_code) {
                (Some(id), None) => ServerNodeQuery::NodeId(id.clone()),
                (None, Some(code)) => ServerNodeQuery::ActivationCode(code.clone()),
                _ => bail!("pass exactly one of --node-id or --activation-code"),
            };
            let status = bridge.server_node_status(&query).await?;
            println!(
                "online={} heartbeats={}/{} reward_eligible={} pending_rewards={}",
                status.is_online,
                status.heartbeat_count,
                status.required_heartbeats,
                status.is_reward_eligible,
                status.pending_rewards
            );
        }

        Command::Reactivate { node_id } => {
            let wallet = require_wallet(&cli)?;
            let signer = load_signer(&cli)?;

            let timestamp = Utc::now().timestamp();
            let signature = signer
                .sign(reactivation_message(node_id, timestamp).as_bytes())
                .await?;

            let response = bridge
                .reactivate(&bn_bridge::wire::ReactivateRequest {
                    node_id: node_id.clone(),
                    wallet_address: wallet,
                    signature: hex::encode(signature),
                    timestamp,
                })
                .await?;

            if response.was_reactivated {
                println!("node {node_id} reactivated; next ping at {}", response.next_ping_time);
            } else {
                println!("node {node_id} already active");
            }
        }
    }

    Ok(())
}

fn require_wallet(cli: &Cli) -> anyhow::Result<String> {
    cli.wallet
        .clone()
        .context("wallet address required (--wallet or BN_WALLET)")
}

fn load_signer(cli: &Cli) -> anyhow::Result<Arc<LocalSigner>> {
    let key = cli
        .signing_key
        .as_deref()
        .context("signing key required (--signing-key or BN_SIGNING_KEY)")?;
    Ok(Arc::new(LocalSigner::from_hex(key)?))
}

fn gate(cli: &Cli, bridge: Arc<dyn BridgeApi>) -> anyhow::Result<ActivationGate> {
    let chain = Arc::new(HttpChainGateway::new(&cli.chain_url)?);
    Ok(ActivationGate::new(bridge, chain))
}

/// Register the node and run the liveness loop until interrupted.
async fn run_liveness(
    cli: &Cli,
    wallet: String,
    bridge: Arc<dyn BridgeApi>,
    signer: Arc<LocalSigner>,
    node_id: &str,
) -> anyhow::Result<()> {
    let mut config = NodeConfig::new(wallet, cli.device_label.clone());
    config.unified_push_endpoint = cli.unified_push_endpoint.clone();
    config.vendor_push_token = cli.vendor_push_token.clone();

    let probes = default_probes(&config);
    let (mut service, mut events) = LivenessService::new(config, bridge, signer);

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            info!("LivenessEvent: {event:?}");
        }
    });

    service.register(node_id, &probes).await?;
    info!(node_id, "entering liveness loop");
    service.run().await;

    Ok(())
}
