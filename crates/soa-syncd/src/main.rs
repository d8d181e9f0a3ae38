// # soa-syncd - SOA Slave-Zone Sync Daemon
//
// Thin integration layer around soa-sync-core. No zone logic lives here.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and logging
// 3. Registering providers
// 4. Feeding control-panel SOA events into the reconciler
//
// ## Configuration
//
// - `SOA_SYNC_ENABLED`: `1`/`true`/`yes` to switch the sync on (default off)
// - `SOA_SYNC_PROVIDER`: Provider type (default `linode`)
// - `SOA_SYNC_API_KEY`: Provider API key
// - `SOA_SYNC_API_URL`: Override of the provider API endpoint
// - `SOA_SYNC_MODE`: `live` (default) or `dry-run`
// - `SOA_SYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Event Stream
//
// One JSON message per line on stdin:
//
// ```json
// {"event": "dns_soa_update", "data": {"old": {...}, "new": {...}}}
// ```
//
// Events are handled one at a time, in order. The daemon stops at end of
// input or on SIGINT/SIGTERM, after the event in flight has finished.
//
// ## Example
//
// ```bash
// export SOA_SYNC_ENABLED=1
// export SOA_SYNC_API_KEY=your_key
//
// panel-event-feed | soa-syncd
// ```

use anyhow::Result;
use serde::Deserialize;
use soa_sync_core::{
    ProviderRegistry, SoaReconciler, SyncConfig, SystemResolver, ZoneChangeEvent,
    ZoneEventHandler, ZoneEventKind,
};
use std::env;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::SplitStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    sync: SyncConfig,
    mode: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let enabled = match lookup("SOA_SYNC_ENABLED") {
            Some(value) => parse_flag(&value).ok_or_else(|| {
                anyhow::anyhow!(
                    "SOA_SYNC_ENABLED '{}' is not a boolean. Use 1/0, true/false or yes/no.",
                    value
                )
            })?,
            None => false,
        };

        let mode = lookup("SOA_SYNC_MODE")
            .map(|m| m.trim().to_lowercase())
            .unwrap_or_else(|| "live".to_string());

        let mut sync = SyncConfig::new()
            .with_enabled(enabled)
            .with_dry_run(mode == "dry-run");
        if let Some(provider) = lookup("SOA_SYNC_PROVIDER") {
            sync.provider = provider.trim().to_string();
        }
        sync.api_key = lookup("SOA_SYNC_API_KEY").filter(|k| !k.trim().is_empty());
        sync.api_url = lookup("SOA_SYNC_API_URL").filter(|u| !u.trim().is_empty());

        Ok(Self {
            sync,
            mode,
            log_level: lookup("SOA_SYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// A missing API key is accepted here: the reconciler skips every event
    /// until one is configured, as the control panel does.
    fn validate(&self) -> Result<()> {
        self.sync.validate()?;

        match self.mode.as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "SOA_SYNC_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        if let Some(key) = &self.sync.api_key {
            let key_lower = key.to_lowercase();
            if key_lower.contains("your_key") || key_lower.contains("replace_me") {
                anyhow::bail!(
                    "SOA_SYNC_API_KEY appears to be a placeholder. \
                    Use an actual API key from your DNS provider."
                );
            }
        }

        if let Some(url) = &self.sync.api_url
            && url.starts_with("http://")
        {
            eprintln!(
                "WARNING: SOA_SYNC_API_URL uses HTTP (not HTTPS). \
                The API key will be sent in clear text."
            );
        }

        parse_level(&self.log_level).ok_or_else(|| {
            anyhow::anyhow!(
                "SOA_SYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            )
        })?;

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// One line of the event stream
#[derive(Debug, Deserialize)]
struct EventMessage {
    event: ZoneEventKind,
    #[serde(default)]
    data: ZoneChangeEvent,
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    if !config.sync.enabled {
        info!("SOA slave-zone sync is disabled (SOA_SYNC_ENABLED), exiting");
        return SyncExitCode::CleanShutdown.into();
    }

    info!("Starting soa-syncd daemon");
    info!("Configuration loaded: {:?}", config.sync);

    // Events are handled strictly one after another
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => SyncExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                if e.downcast_ref::<soa_sync_core::Error>()
                    .is_some_and(|e| matches!(e, soa_sync_core::Error::Config(_)))
                {
                    SyncExitCode::ConfigError
                } else {
                    SyncExitCode::RuntimeError
                }
            }
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "linode")]
    {
        info!("Registering Linode provider");
        soa_sync_provider_linode::register(&registry);
    }

    let factory = registry.factory(&config.sync.provider)?;
    info!("Provider type: {}", config.sync.provider);

    if config.sync.api_key.is_none() {
        warn!("SOA_SYNC_API_KEY is not set; events will be skipped until it is configured");
    }

    let reconciler = SoaReconciler::new(config.sync, factory, Box::new(SystemResolver::new()));

    info!("Ready to receive SOA events on stdin");
    let lines = SplitStream::new(BufReader::new(tokio::io::stdin()).split(b'\n'));
    let handled = process_events(&reconciler, lines, wait_for_shutdown()).await?;

    info!("Shutting down daemon after {} event(s)", handled);
    Ok(())
}

/// Feed events from `lines` to `handler` until the stream ends or
/// `shutdown` resolves
///
/// Lines are raw bytes so that a line that is not UTF-8 is skipped like any
/// other malformed line. Only read errors end the loop.
///
/// Returns the number of events dispatched.
async fn process_events<H, S, F>(handler: &H, mut lines: S, shutdown: F) -> Result<u64>
where
    H: ZoneEventHandler,
    S: Stream<Item = std::io::Result<Vec<u8>>> + Unpin,
    F: Future<Output = Result<&'static str>>,
{
    tokio::pin!(shutdown);
    let mut handled = 0;

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                info!("Received shutdown signal: {}", signal?);
                break;
            }
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    if handle_line(handler, &line).await {
                        handled += 1;
                    }
                }
                Some(Err(e)) => anyhow::bail!("Failed to read event stream: {}", e),
                None => {
                    info!("Event stream closed");
                    break;
                }
            }
        }
    }

    Ok(handled)
}

/// Parse and dispatch one line; returns whether an event was dispatched
async fn handle_line<H: ZoneEventHandler>(handler: &H, line: &[u8]) -> bool {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(e) => {
            warn!("Skipping event that is not valid UTF-8: {}", e);
            return false;
        }
    };
    if line.is_empty() {
        return false;
    }

    let message: EventMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            warn!("Skipping malformed event: {}", e);
            return false;
        }
    };

    debug!("Received {} event", message.event);
    handler.dispatch(message.event, &message.data).await;
    true
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
