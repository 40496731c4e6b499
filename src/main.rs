//! flick-dnd - replay a recorded touch scenario through the home screen engine
//!
//! Prints the resulting event log as JSON on stdout.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flick_dnd::caps::PlatformCaps;
use flick_dnd::config::EngineConfig;
use flick_dnd::runner;
use flick_dnd::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "flick-dnd")]
#[command(about = "Replay touch scenarios through the Flick home screen engine", long_about = None)]
struct Args {
    /// Scenario TOML file
    scenario: PathBuf,

    /// Engine config (default: ~/.config/flick/dnd.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run timers on the wall clock instead of a virtual one
    #[arg(short, long)]
    realtime: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pretty: bool,
}

fn main() -> Result<()> {
    // Set up log directory (~/.local/state/flick or /tmp/flick)
    let log_dir = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("flick");

    std::fs::create_dir_all(&log_dir).ok();

    // Log panics before crashing
    let crash_log = log_dir.join("crash.log");
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(&crash_log) {
            let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
        }
    }));

    let args = Args::parse();

    // File appender, rotates daily
    let file_appender = rolling::daily(&log_dir, "dnd.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Quiet by default, verbose with --debug
    let default_filter = if args.debug {
        "debug,flick_dnd=debug"
    } else {
        "warn,flick_dnd=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!(log_path = %log_dir.display(), "flick-dnd starting");

    let config = EngineConfig::load(args.config.as_deref()).context("Failed to load engine config")?;
    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;
    let caps = PlatformCaps::detect();

    let events = if args.realtime {
        info!("Replaying in real time");
        runner::run_realtime(&scenario, &config, &caps)
    } else {
        runner::run_simulated(&scenario, &config, &caps)
    }
    .context("Scenario replay failed")?;

    runner::write_report(&events, args.pretty, std::io::stdout().lock()).context("Failed to write report")?;
    Ok(())
}
