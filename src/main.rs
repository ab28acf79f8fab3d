//! Chartcast - market data charts and social distribution from the command line.
//!
//! Invokes one capability with JSON arguments and prints its result.

use chartcast::{App, Capability, Config, Error, Result};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "chartcast",
    version,
    about = "Render DeFi market charts and distribute them to social platforms"
)]
struct Cli {
    /// Capability to invoke (e.g. generateTvlChart)
    #[arg(value_parser = parse_capability, required_unless_present = "list")]
    capability: Option<Capability>,

    /// Capability arguments as a JSON object
    #[arg(short, long, conflicts_with = "args_file")]
    args: Option<String>,

    /// Read capability arguments from a JSON file
    #[arg(long, value_name = "FILE")]
    args_file: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "CHARTCAST_CONFIG")]
    config: Option<PathBuf>,

    /// List capabilities and exit
    #[arg(long)]
    list: bool,
}

fn parse_capability(name: &str) -> std::result::Result<Capability, String> {
    name.parse().map_err(|e: Error| e.to_string())
}

/// Stderr plus a daily log file; stdout is reserved for capability output.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "chartcast=info".into());
    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match chartcast::config::log_dir().and_then(|dir| {
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }) {
        Ok(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "chartcast.log"));
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

fn read_args(cli: &Cli) -> Result<Value> {
    let raw = match (&cli.args, &cli.args_file) {
        (Some(args), _) => args.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Ok(Value::Null),
    };
    serde_json::from_str(&raw)
        .map_err(|e| Error::invalid_argument(format!("arguments are not valid JSON: {e}")))
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list {
        for capability in Capability::ALL {
            println!("{:<30} {}", capability.name(), capability.description());
        }
        return Ok(());
    }
    let Some(capability) = cli.capability else {
        return Err(Error::invalid_argument("no capability given"));
    };

    let args = read_args(&cli)?;
    let config = Config::load(cli.config)?;
    let app = App::new(config)?;

    let output = app.invoke(capability, args).await?;
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}
