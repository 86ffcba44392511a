/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Logged BBO updates for one symbol until stream end or shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ascendex_bbo_adapter::AscendexBboClient;
use ascendex_bbo_stream::config::LoggingConfig;
use ascendex_bbo_stream::{ConsumerExit, StreamerConfig, drain_updates, setup_failure};

#[derive(Parser, Debug)]
#[command(name = "ascendex-bbo-stream", version, about = "AscendEX best bid/offer stream")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Overrides the configured symbol, e.g. BTC/USDT
    #[arg(long)]
    symbol: Option<String>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Stop after this many updates
    #[arg(long = "max-updates", value_name = "N")]
    max_updates: Option<u64>,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = load_config(args.config_path.as_ref())?
        .with_overrides(args.symbol.clone(), args.endpoint.clone());
    let _log_guard = init_tracing(&args.log_level, &config.logging)?;

    info!(
        symbol = %config.symbol,
        endpoint = %config.endpoint,
        dry_run = args.dry_run,
        "starting ascendex-bbo-stream"
    );

    config.validate().context("validate config")?;

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let mut client = AscendexBboClient::new(config.stream_config());
    let mut stream = client
        .stream(&config.symbol)
        .await
        .map_err(setup_failure)?;

    let summary = drain_updates(&mut stream, args.max_updates, &shutdown).await;
    info!(exit = ?summary.exit, updates = summary.updates, "consumer stopped");

    client.disconnect().await;

    if summary.exit == ConsumerExit::StreamEnded {
        bail!("market stream ended after {} updates", summary.updates);
    }
    Ok(())
}

fn init_tracing(log_level: &str, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn load_config(path: Option<&PathBuf>) -> Result<StreamerConfig> {
    let Some(path) = path else {
        return Ok(StreamerConfig::default());
    };
    let path_str = path
        .to_str()
        .context("config path must be valid utf-8")?;
    StreamerConfig::from_file(path_str).context("load config")
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
