// # dyndnsd - Route 53 dynamic DNS updater
//
// One-shot binary: resolves the public IP, compares it with the first A/AAAA
// record set of the configured hosted zone, upserts the record when they
// differ, optionally sends a Pushover message, then exits. Schedule it with
// cron or a systemd timer.
//
// This binary only wires collaborators together; every decision lives in
// dyndns-core.
//
// ## Configuration
//
// All configuration is done via environment variables (a `.env` file in the
// working directory is loaded first, when present):
//
// - `AWS_REGION`: Region for the Route 53 client (required)
// - `HOSTED_ZONE_ID`: Hosted zone identifier (required)
// - `RECORD_NAME`: Record to keep in sync (required)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `PUSHOVER_API_TOKEN` / `PUSHOVER_USER_KEY`: Enable notifications
// - `EXTERNAL_IP_URL`: Echo service (default: http://checkip.amazonaws.com/)
// - `HTTP_TIMEOUT_SECS`, `HTTP_MAX_RETRIES`: Echo service transport
// - `REQUIRE_EXACT_RECORD_NAME`: Fail when Route 53 returns another record first
// - `DRY_RUN`: Read real state, log the upsert instead of sending it
//
// AWS credentials come from the standard AWS provider chain.
//
// ## Example
//
// ```bash
// export AWS_REGION=eu-west-1
// export HOSTED_ZONE_ID=Z0123456789ABC
// export RECORD_NAME=home.example.com
//
// dyndnsd
// ```

use anyhow::{Context, Result};
use dyndns_core::{
    CounterTelemetry, DyndnsConfig, Notifier, Outcome, ReconcileError, Reconciler, RecordStore,
    RecordTarget,
};
use dyndns_ip_http::HttpIpSource;
use dyndns_provider_route53::Route53Provider;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Run completed (updated or unchanged)
/// - 1: Configuration or startup error
/// - 2: Run failed
#[derive(Debug, Clone, Copy)]
enum DyndnsExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Run failed (lookup, update, cancellation)
    RunFailed = 2,
}

impl From<DyndnsExitCode> for ExitCode {
    fn from(code: DyndnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // A missing .env file is not an error
    let dotenv_path = dotenvy::dotenv().ok();

    let config = match DyndnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    match dotenv_path {
        Some(path) => debug!(path = %path.display(), "Loaded environment file"),
        None => debug!("No .env file found, using process environment only"),
    }
    info!(
        record_name = %config.record_name,
        hosted_zone_id = %config.hosted_zone_id,
        notifications = config.pushover.is_some(),
        dry_run = config.dry_run,
        "Starting dyndnsd"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    let telemetry = Arc::new(CounterTelemetry::new());

    let code = rt.block_on(async {
        let reconciler = match build_reconciler(&config, telemetry.clone()).await {
            Ok(reconciler) => reconciler,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DyndnsExitCode::ConfigError;
            }
        };

        match run_once(&reconciler).await {
            Ok(Outcome::Unchanged { ip }) => {
                info!(
                    record_name = %reconciler.target().record_name,
                    ip_address = %ip,
                    "Done, record already up to date"
                );
                DyndnsExitCode::Success
            }
            Ok(Outcome::Updated { previous, current, change_id }) => {
                info!(
                    record_name = %reconciler.target().record_name,
                    previous_ip_address = %previous,
                    ip_address = %current,
                    change_id = %change_id,
                    "Done, record updated"
                );
                DyndnsExitCode::Success
            }
            Err(e) => {
                error!(error = %e, "Run failed");
                DyndnsExitCode::RunFailed
            }
        }
    });

    for (name, value) in telemetry.snapshot() {
        debug!(metric = name, value, "Run counter");
    }

    code.into()
}

/// Wire the production collaborators around the reconciler
async fn build_reconciler(config: &DyndnsConfig, telemetry: Arc<CounterTelemetry>) -> Result<Reconciler> {
    let ip_source = HttpIpSource::new(&config.http).context("failed to create external IP source")?;
    debug!(url = ip_source.url(), "External IP source configured");

    let provider = Route53Provider::from_region(config.aws_region.clone(), config.dry_run).await;
    let records = RecordStore::new(Box::new(provider)).with_name_match(config.name_match());

    let notifier = config
        .pushover
        .as_ref()
        .map(|pushover| {
            dyndns_notify_pushover::PushoverNotifier::new(pushover)
                .map(|n| Box::new(n) as Box<dyn Notifier>)
        })
        .transpose()
        .context("failed to create Pushover notifier")?;

    let reconciler = Reconciler::new(
        Box::new(ip_source),
        records,
        notifier,
        telemetry,
        RecordTarget::new(&config.hosted_zone_id, &config.record_name),
    )?;

    Ok(reconciler)
}

/// Run once, aborting on SIGTERM or SIGINT
#[cfg(unix)]
async fn run_once(reconciler: &Reconciler) -> std::result::Result<Outcome, ReconcileError> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let watcher = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Shutdown handler error: {:#}", e),
        }
    });

    let result = reconciler.run_with_shutdown(Some(shutdown_rx)).await;
    watcher.abort();
    result
}

/// Run once, aborting on Ctrl-C
#[cfg(not(unix))]
async fn run_once(reconciler: &Reconciler) -> std::result::Result<Outcome, ReconcileError> {
    reconciler.run().await
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}
