//! `host-bridge` - issue calls to a running host and watch its events.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use host_bridge::{handler, ApiError, Bridge, BridgeConfig, EventName};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "host-bridge")]
#[command(version = VERSION)]
#[command(about = "Call a native host process over its local WebSocket port")]
struct Cli {
    /// Host port; falls back to the NL_* environment when unset
    #[arg(long, global = true, env = "NL_PORT")]
    port: Option<u16>,

    /// Access token attached to every call
    #[arg(long, global = true, env = "NL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Reject calls that get no response within this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue one call and print its result as JSON
    Call {
        /// Qualified method name, e.g. "os.getEnvar"
        method: String,
        /// Options record as JSON (defaults to null)
        options: Option<String>,
    },
    /// Print native events until the host closes the connection
    Listen {
        /// Event names to subscribe to (defaults to all)
        events: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ApiError> {
    let mut config = match cli.port {
        Some(port) => BridgeConfig::new(port),
        None => BridgeConfig::from_env()?,
    };
    if cli.token.is_some() {
        config.access_token = cli.token;
    }
    if cli.timeout_ms.is_some() {
        config.call_timeout_ms = cli.timeout_ms;
    }

    let mut bridge = Bridge::connect(config).await?;
    let outcome = match cli.command {
        Commands::Call { method, options } => call(&bridge, &method, options.as_deref()).await,
        Commands::Listen { events } => listen(&bridge, &events).await,
    };
    bridge.shutdown().await;
    outcome
}

async fn call(bridge: &Bridge, method: &str, options: Option<&str>) -> Result<(), ApiError> {
    let options = match options {
        Some(raw) => serde_json::from_str(raw).map_err(|e| ApiError::InvalidInput {
            message: format!("Options are not valid JSON: {e}"),
        })?,
        None => serde_json::Value::Null,
    };

    let result = bridge.dispatcher().call(method, options).await?;
    let pretty = serde_json::to_string_pretty(&result).map_err(|e| ApiError::ProtocolError {
        message: format!("Failed to format result: {e}"),
    })?;
    println!("{pretty}");
    Ok(())
}

async fn listen(bridge: &Bridge, events: &[String]) -> Result<(), ApiError> {
    let names = if events.is_empty() {
        EventName::ALL.to_vec()
    } else {
        events
            .iter()
            .map(|raw| {
                EventName::parse(raw).ok_or_else(|| ApiError::InvalidInput {
                    message: format!("Unknown event: {raw}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    for name in names {
        bridge.hub().on(
            name,
            handler(|event| {
                println!("{} {}", event.name(), event.detail());
                Ok(())
            }),
        );
    }

    bridge.dispatcher().closed().await;
    log::info!("Host connection closed");
    Ok(())
}
