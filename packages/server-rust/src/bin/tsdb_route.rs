//! `tsdb-route`: inspect backend routing decisions from the command line.
//!
//! ```text
//! tsdb-route select --method get_range --args '{"model": "project"}'
//! tsdb-route check
//! tsdb-route models
//! ```

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsdb_core::{Backend, CallArgs, Model};
use tsdb_router::routing::{BackendSelector, RouterConfig};

#[derive(Debug, Parser)]
#[command(name = "tsdb-route", version, about = "Time-series backend routing inspector")]
struct Cli {
    /// Backend for methods without a specification.
    #[arg(long, env = "TSDB_DEFAULT_BACKEND", default_value = "counter", global = true)]
    default_backend: Backend,

    /// Model served by the analytical engine (repeatable). Overrides the
    /// built-in column mapping when given.
    #[arg(long = "analytics-model", value_name = "MODEL", global = true)]
    analytics_models: Vec<Model>,

    /// Log output format.
    #[arg(long, value_enum, env = "TSDB_LOG_FORMAT", default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the routing decision for one call.
    Select {
        /// Storage method name, e.g. `get_range`.
        #[arg(long)]
        method: String,
        /// Call arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Verify the method table against the storage surface.
    Check,
    /// List the read/write backend of every model.
    Models,
}

impl Cli {
    fn router_config(&self) -> RouterConfig {
        RouterConfig {
            default_backend: self.default_backend,
            analytics_models: (!self.analytics_models.is_empty())
                .then(|| self.analytics_models.clone()),
            ..RouterConfig::default()
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let selector = BackendSelector::new(&cli.router_config())
        .context("method table does not match the storage surface")?;

    match &cli.command {
        Command::Select { method, args } => {
            let args: CallArgs =
                serde_json::from_str(args).context("--args must be a JSON object")?;
            let decision = selector.select(method, &args)?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Command::Check => {
            info!(
                methods = selector.table().len(),
                models = selector.registry().len(),
                "method table matches storage surface"
            );
            println!("ok: {} methods specified", selector.table().len());
        }
        Command::Models => {
            for (model, pair) in selector.registry().iter() {
                println!("{:<32} read={:<10} write={}", model, pair.read, pair.write);
            }
        }
    }
    Ok(())
}
