//! KeyRoute entry point.
//!
//! Redirects keys typed anywhere on the desktop into one or more chosen
//! application windows until the escape key is pressed.
//!
//! # Usage
//!
//! ```text
//! keyroute --target <PID[:KEYS]>... [OPTIONS]
//!
//! Options:
//!   -t, --target <PID[:KEYS]>  Process to receive keys; KEYS is a comma list
//!                              (empty = every key). Repeatable.
//!       --device <DEVICE>      keyboard | mouse
//!       --pass-through         Let hooked input reach the focused app too
//!       --escape-key <KEY>     Key that stops redirection [default: Escape]
//!       --config <PATH>        Config file to use instead of the default
//!       --dry-run              Bind and engage against the in-memory platform
//!       --init-config          Write a default config file and exit
//! ```
//!
//! Command-line flags override the config file; `RUST_LOG` overrides the
//! configured log level.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config, merge flags
//!  └─ RedirectEngine::new(platform)
//!       ├─ configure(device)
//!       ├─ bind_process(pid, filter)  for each --target
//!       └─ engage()                   hook thread starts
//!  └─ wait for escape (engine disengages itself) or Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyroute_core::{key_name, DeviceClass, WindowHandle};
use keyroute_redirector::application::engine::{EngineOptions, RedirectEngine};
use keyroute_redirector::infrastructure::cli::TargetSpec;
use keyroute_redirector::infrastructure::platform::{self, mock::MockPlatform, PlatformServices};
use keyroute_redirector::infrastructure::storage::config::{
    self, AppConfig, EngineConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// KeyRoute: redirect keystrokes into a chosen application window.
///
/// Press the escape key (default: Escape) to stop redirecting.
#[derive(Parser, Debug)]
#[command(name = "keyroute", about, version)]
struct Cli {
    /// Process to receive keys: `PID` or `PID:KEYS` (e.g. `4242:h,l`).
    #[arg(
        short = 't',
        long = "target",
        value_name = "PID[:KEYS]",
        required_unless_present = "init_config"
    )]
    targets: Vec<TargetSpec>,

    /// Input device to hook.
    #[arg(long, env = "KEYROUTE_DEVICE")]
    device: Option<DeviceClass>,

    /// Let hooked input continue to the focused application.
    #[arg(long)]
    pass_through: bool,

    /// Key that stops redirection (name or hex code).
    #[arg(long, env = "KEYROUTE_ESCAPE_KEY")]
    escape_key: Option<String>,

    /// Config file path.
    #[arg(long, env = "KEYROUTE_CONFIG")]
    config: Option<PathBuf>,

    /// Use the in-memory platform instead of real hooks.
    #[arg(long)]
    dry_run: bool,

    /// Write a default config file and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config::config_file_path().context("locating config file"),
        }
    }

    /// Applies command-line overrides on top of the file's engine settings.
    fn merge(&self, file: &EngineConfig) -> EngineConfig {
        let mut merged = file.clone();
        if let Some(device) = self.device {
            merged.device = device.to_string();
        }
        if let Some(key) = &self.escape_key {
            merged.escape_key = key.clone();
        }
        merged.pass_through |= self.pass_through;
        merged
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;

    if cli.init_config {
        config::save_config_to(&config_path, &AppConfig::default())
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("wrote default config to {}", config_path.display());
        return Ok(());
    }

    let app_config = config::load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.logging.log_level)),
        )
        .init();

    let (device, options) = cli
        .merge(&app_config.engine)
        .resolve()
        .context("invalid engine settings")?;

    let services = if cli.dry_run {
        dry_run_platform(&cli.targets)
    } else {
        platform::native().context("no input hook support on this host (try --dry-run)")?
    };

    let engine = build_engine(services, device, options, &cli.targets)?;
    engine.engage().context("engaging input hook")?;

    if cli.dry_run {
        for binding in engine.bindings() {
            info!(pid = %binding.process, window = %binding.window, filter = %binding.filter, "dry run binding");
        }
        engine.disengage().context("disengaging input hook")?;
        info!("dry run complete");
        return Ok(());
    }

    info!(
        escape = %key_name(engine.escape_vk()),
        "redirecting; press the escape key or Ctrl-C to stop"
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // The escape key disengages the engine from the hook thread.
    while running.load(Ordering::Relaxed) && engine.is_engaged() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if let Err(e) = engine.disengage() {
        if e.is_warning() {
            warn!("{e}");
        } else {
            return Err(e).context("disengaging input hook");
        }
    }

    info!("KeyRoute stopped");
    Ok(())
}

fn build_engine(
    services: PlatformServices,
    device: DeviceClass,
    options: EngineOptions,
    targets: &[TargetSpec],
) -> anyhow::Result<Arc<RedirectEngine>> {
    let engine = RedirectEngine::new(
        services.installer,
        services.injector,
        services.windows,
        options,
    );
    engine.configure(device);
    for target in targets {
        engine
            .bind_process(target.process, target.filter.clone())
            .with_context(|| format!("binding target {target}"))?;
    }
    Ok(engine)
}

/// A mock platform where every target process owns a window.
fn dry_run_platform(targets: &[TargetSpec]) -> PlatformServices {
    let platform = MockPlatform::new();
    for target in targets {
        platform
            .windows
            .add(target.process, WindowHandle(target.process.0 as isize));
    }
    platform.into()
}
