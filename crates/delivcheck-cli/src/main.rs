use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use delivcheck_core::{Address, AddressId, Order, OrderId, classify};
use delivcheck_engine::{AnalysisError, DeliverabilityAnalysisService, OrderProcessingEngine};
use delivcheck_gateway::HttpGateway;
use delivcheck_store::{DuckStore, ResultStore};
use serde::de::DeserializeOwned;
use tracing::info;

mod actions;
mod display;
mod settings;

use actions::PlannedActions;
use settings::{GatewayOverrides, Settings};

#[derive(Parser)]
#[command(name = "delivcheck", version)]
#[command(about = "Address deliverability checks for shop orders", long_about = None)]
struct Cli {
    /// JSON settings file with optional `engine` and `gateway` sections
    #[arg(long, global = true, env = "DELIVCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// DuckDB file for results and statuses (in-memory when omitted)
    #[arg(long, global = true, env = "DELIVCHECK_DB")]
    db: Option<PathBuf>,

    #[command(flatten)]
    gateway: GatewayArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GatewayArgs {
    /// Verification service base URL
    #[arg(long, global = true, env = "DELIVCHECK_ENDPOINT")]
    endpoint: Option<String>,

    /// Use the sandbox endpoint
    #[arg(long, global = true, env = "DELIVCHECK_SANDBOX")]
    sandbox: bool,

    /// Service-side configuration profile
    #[arg(long, global = true, env = "DELIVCHECK_PROFILE")]
    profile: Option<String>,

    #[arg(long, global = true, env = "DELIVCHECK_USERNAME")]
    username: Option<String>,

    #[arg(long, global = true, env = "DELIVCHECK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Seconds before a verification call is abandoned
    #[arg(long, global = true, env = "DELIVCHECK_TIMEOUT")]
    timeout: Option<u64>,
}

impl From<GatewayArgs> for GatewayOverrides {
    fn from(args: GatewayArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            sandbox: args.sandbox,
            profile: args.profile,
            username: args.username,
            password: args.password,
            timeout_secs: args.timeout,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the verdict for a set of status codes
    Classify {
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Print a label for each status code
    Describe {
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Analyse the addresses in a JSON file
    Analyse {
        /// JSON array of addresses
        #[arg(long)]
        addresses: PathBuf,

        /// Print results as JSON instead of cards
        #[arg(long)]
        json: bool,
    },

    /// Analyse orders and apply the configured actions
    ///
    /// Holds, cancellations and corrections are reported, not sent to a shop.
    /// With a persistent --db they are planned once per order: orders whose
    /// stored status is already concluded only get their status refreshed.
    Process {
        /// JSON array of orders with their shipping addresses
        #[arg(long)]
        orders: PathBuf,

        /// Only process orders whose stored status is pending
        #[arg(long)]
        sweep: bool,

        #[arg(long)]
        json: bool,
    },

    /// Register newly placed orders according to the configured trigger
    Place {
        #[arg(long)]
        orders: PathBuf,
    },

    /// Record a manual shipping address edit
    Edit {
        #[arg(long)]
        order: u64,
    },

    /// Show a stored order status or analysis result; lists pending orders by default
    Status {
        #[arg(long, conflicts_with = "address")]
        order: Option<u64>,

        #[arg(long)]
        address: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Classify { codes } => {
            println!("{}", classify(&codes));
            Ok(())
        }
        Command::Describe { codes } => {
            display::print_codes(&codes);
            Ok(())
        }
        command => {
            let mut settings = Settings::load(cli.config.as_deref())?;
            settings.apply(cli.gateway.into());
            let store = open_store(cli.db.as_deref())?;
            run(command, settings, store).await
        }
    }
}

async fn run(command: Command, settings: Settings, store: Arc<DuckStore>) -> anyhow::Result<()> {
    match command {
        Command::Analyse { addresses, json } => {
            let addresses: Vec<Address> = read_json(&addresses)?;
            let service = analysis_service(&settings, store)?;
            let (results, failure) = match service.analyse(&addresses).await {
                Ok(results) => (results, None),
                Err(AnalysisError::Gateway { source, cached }) => (cached, Some(source)),
                Err(e) => return Err(e).context("analysing addresses"),
            };

            let mut ids: Vec<AddressId> = addresses.iter().map(|a| a.id).collect();
            ids.sort();
            ids.dedup();
            if json {
                let ordered: Vec<_> = ids.iter().filter_map(|id| results.get(id)).collect();
                println!("{}", serde_json::to_string_pretty(&ordered)?);
            } else {
                for id in &ids {
                    match results.get(id) {
                        Some(result) => display::print_result_card(result),
                        None => print!("{}", display::render_missing(*id)),
                    }
                    println!();
                }
            }
            if let Some(source) = failure {
                bail!("verification failed: {source}");
            }
            Ok(())
        }
        Command::Process {
            orders,
            sweep,
            json,
        } => {
            let orders: Vec<Order> = read_json(&orders)?;
            let actions = Arc::new(PlannedActions::new());
            let engine = engine(&settings, store, actions.clone())?;

            let report = if sweep {
                engine.sweep(&orders).await
            } else {
                engine.process_orders(&orders).await
            };

            if json {
                let out = serde_json::json!({
                    "report": report,
                    "corrected_addresses": actions.corrected_addresses(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                display::print_report(&report);
            }
            Ok(())
        }
        Command::Place { orders } => {
            let orders: Vec<Order> = read_json(&orders)?;
            let engine = engine(&settings, store, Arc::new(PlannedActions::new()))?;
            for order in &orders {
                let status = engine
                    .on_order_placed(order)
                    .await
                    .with_context(|| format!("placing order {}", order.id))?;
                println!("{:<12} {}", order.id.to_string(), status);
            }
            Ok(())
        }
        Command::Edit { order } => {
            let engine = engine(&settings, store, Arc::new(PlannedActions::new()))?;
            let status = engine.on_address_edited(OrderId(order)).await?;
            println!("{order:<12} {status}");
            Ok(())
        }
        Command::Status { order, address } => {
            let engine = engine(&settings, store.clone(), Arc::new(PlannedActions::new()))?;
            match (order, address) {
                (Some(order), _) => {
                    println!("{order:<12} {}", engine.status(OrderId(order)).await?);
                }
                (None, Some(address)) => {
                    let id = AddressId(address);
                    match store.load_result(id).await? {
                        Some(result) => display::print_result_card(&result),
                        None => print!("{}", display::render_missing(id)),
                    }
                }
                (None, None) => {
                    let pending = engine.pending_orders().await?;
                    info!(count = pending.len(), "pending orders");
                    for order in pending {
                        println!("{order}");
                    }
                }
            }
            Ok(())
        }
        Command::Classify { .. } | Command::Describe { .. } => Ok(()),
    }
}

fn open_store(path: Option<&Path>) -> anyhow::Result<Arc<DuckStore>> {
    let store = match path {
        Some(path) => DuckStore::open_persistent(path)
            .with_context(|| format!("opening store at {}", path.display()))?,
        None => DuckStore::open().context("opening in-memory store")?,
    };
    Ok(Arc::new(store))
}

fn analysis_service(
    settings: &Settings,
    store: Arc<DuckStore>,
) -> anyhow::Result<DeliverabilityAnalysisService> {
    let gateway = HttpGateway::new(settings.gateway.clone())
        .context("building verification client")?;
    Ok(DeliverabilityAnalysisService::new(store, Arc::new(gateway))
        .with_timeout(settings.gateway.timeout))
}

fn engine(
    settings: &Settings,
    store: Arc<DuckStore>,
    actions: Arc<PlannedActions>,
) -> anyhow::Result<OrderProcessingEngine> {
    let analysis = analysis_service(settings, store.clone())?;
    Ok(OrderProcessingEngine::new(
        analysis,
        store,
        actions,
        settings.engine.clone(),
    ))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}
