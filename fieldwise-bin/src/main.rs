use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use fieldwise::{
    CommandLine, Configurable, Controller, Filesystem, Mutex, Options, Outcome, ProcessEnv, Sources,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

/// Resolve a sample service configuration from arguments, environment
/// variables and `*_FILE` files
#[derive(Parser)]
#[command(name = "fieldwise-demo", version, about, long_about = None)]
struct Cli {
    /// Log level (e.g. debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Resolver verbosity, 0 to 3 (overrides FIELDWISE_DEBUG)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=3))]
    debug: Option<u8>,

    /// Keep running and print every change to file-backed values
    #[arg(short, long)]
    watch: bool,

    /// Configuration arguments, e.g. `-- -port=8080 -log.level debug`
    #[arg(last = true, allow_hyphen_values = true)]
    config_args: Vec<String>,
}

/// Sample record: `-port` / `PORT` / `PORT_FILE` and so on.
#[derive(Debug, Configurable)]
pub struct ServiceConfig {
    pub log_level: String,
    pub port: u16,
    pub verbose: bool,
    pub timeout: Duration,
    pub endpoints: Vec<Url>,
    #[fieldwise(arg = "-")]
    pub api_token: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            port: 8080,
            verbose: false,
            timeout: Duration::from_secs(30),
            endpoints: Vec::new(),
            api_token: String::new(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing(&cli.log_level, cli.json_logs);

    let sources = Sources::new(CommandLine::parse(cli.config_args), ProcessEnv, Filesystem);
    let mut options = Options::from_env(sources.env());
    if let Some(level) = cli.debug {
        options = options.debug(level);
    }
    let mut controller = Controller::new(sources, options);

    if !cli.watch {
        let mut config = ServiceConfig::default();
        let outcome = controller.pick(&mut config).context("resolving configuration")?;
        summarize(&outcome);
        println!("{}", serde_json::to_string_pretty(&snapshot(&config)?)?);
        return Ok(());
    }

    let config = Arc::new(Mutex::new(ServiceConfig::default()));
    let (tx, mut rx) = mpsc::channel(16);
    let handle = controller
        .watch(config.clone(), vec![tx])
        .await
        .context("starting watch session")?;
    info!("watching configuration, press Ctrl-C to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            Some(update) = rx.recv() => println!("{}", serde_json::to_string(&update)?),
            _ = &mut shutdown => break,
        }
    }

    handle.release().await;
    let snapshot = snapshot(&*config.lock())?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn summarize(outcome: &Outcome) {
    info!(
        updated = outcome.updates.len(),
        failed = outcome.errors.len(),
        "configuration resolved"
    );
    for err in &outcome.errors {
        warn!(error = %err, "default kept");
    }
}

fn snapshot<T: Configurable>(config: &T) -> anyhow::Result<serde_json::Value> {
    let mut fields = serde_json::Map::new();
    for spec in T::field_specs() {
        if let Some(value) = config.field_value(spec.name) {
            fields.insert(spec.name.to_string(), serde_json::to_value(&value)?);
        }
    }
    Ok(serde_json::Value::Object(fields))
}
