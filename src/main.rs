//! cStrafe - counter-strafe timing trainer
//!
//! Reads movement keys and fire clicks, grades each shot, and reports it to
//! the console overlay, the sound cue worker and (in server mode) the HUD.

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cstrafe::api::{self, HudSink, HudState};
use cstrafe::config::{AppConfig, ConfigWatcher};
use cstrafe::engine::Engine;
use cstrafe::feedback::sound::LogPlayer;
use cstrafe::feedback::{
    ConsoleOverlay, FeedbackDispatcher, FeedbackSink, OverlayState, SoundCueSink, VolumeMixer,
    DEFAULT_QUEUE_CAPACITY,
};
use cstrafe::input::{replay, Clock, InputListener, KeyBindings};
use cstrafe::paths::AppPaths;

/// cStrafe - grade your counter-strafes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (created with defaults if missing)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Broadcast results to the HUD web server
    #[arg(long)]
    server: bool,

    /// HUD server port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Grade a recorded CSV session instead of reading live input
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Also write logs to a daily file in the logs directory
    #[arg(long)]
    log_file: bool,

    /// Disable sound cues
    #[arg(long)]
    no_sound: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let paths = AppPaths::resolve(args.config.as_deref());

    if args.log_file {
        paths.ensure_directories()?;
    }
    let _log_guard = init_logging(&args.log_level, args.log_file.then_some(paths.logs_dir.as_path()));

    info!("Starting cStrafe v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", paths.config.display());
    if paths.is_portable {
        info!("Portable mode: data kept next to the executable");
    }

    let server_mode = args.server || exe_name_requests_server();

    let config_path = paths.config.to_string_lossy().to_string();
    let (config_watcher, initial_config) = ConfigWatcher::new(config_path).await?;
    let config = (*initial_config).clone();
    info!("Configuration loaded with hot-reload enabled");

    run_app(args, paths, config, config_watcher, server_mode).await?;

    info!("cStrafe shutdown complete");
    Ok(())
}

async fn run_app(
    args: Args,
    paths: AppPaths,
    mut config: AppConfig,
    mut config_watcher: ConfigWatcher,
    server_mode: bool,
) -> Result<()> {
    let bindings = KeyBindings::from_config(&config).context("Invalid key bindings")?;
    let engine = Arc::new(Engine::new(config.engine.reversal_window()));
    let mixer = Arc::new(Mutex::new(VolumeMixer::from_config(&config.volume)));
    let overlay = Arc::new(OverlayState::from_config(&config.overlay));

    let mut sinks: Vec<Arc<dyn FeedbackSink>> = vec![Arc::new(ConsoleOverlay::new(overlay.clone()))];

    let mut cue_worker = None;
    if !args.no_sound {
        let sounds = config.sounds.resolve(&paths.base_dir());
        let (sink, worker) = SoundCueSink::spawn(mixer.clone(), sounds, LogPlayer)?;
        sinks.push(Arc::new(sink));
        cue_worker = Some(worker);
    }

    let mut hud_server = None;
    if server_mode {
        let state = HudState::new(config.server.broadcast_capacity);
        let port = args.port.unwrap_or(config.server.port);
        let listener = api::bind(&config.server.host, port).await?;
        sinks.push(Arc::new(HudSink::new(state.clone())));
        hud_server = Some(tokio::spawn(async move {
            if let Err(e) = api::serve(listener, state).await {
                warn!("HUD server stopped: {:#}", e);
            }
        }));
        info!("Server mode: HUD broadcasting on port {}", port);
    }

    let (dispatcher, dispatch_task) = FeedbackDispatcher::spawn(DEFAULT_QUEUE_CAPACITY, sinks);
    let shutdown = Arc::new(Notify::new());
    let listener = InputListener::new(
        engine,
        bindings,
        mixer.clone(),
        overlay,
        dispatcher.clone(),
        shutdown.clone(),
    );

    if let Some(replay_path) = &args.replay {
        let events = replay::read_file(replay_path)
            .with_context(|| format!("Failed to read replay file: {}", replay_path.display()))?;
        info!("Replaying {} events from {}", events.len(), replay_path.display());

        let shots = tokio::task::spawn_blocking(move || replay::run(&listener, &events)).await?;
        info!("Replay graded {} shots", shots.len());
    } else {
        let capture_listener = listener.clone();
        let capture_shutdown = shutdown.clone();
        std::thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                if let Err(e) = cstrafe::cli::run_repl(capture_listener, Clock::new()) {
                    warn!("Input console failed: {:#}", e);
                }
                capture_shutdown.notify_one();
            })
            .context("Failed to start capture thread")?;

        info!("Ready - move, stop, and fire!");

        let ctrl_c = shutdown_signal();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                Some(new_config) = config_watcher.next_config() => {
                    apply_reload(&listener, &mixer, &config, &new_config);
                    config = new_config;
                }
                _ = shutdown.notified() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = &mut ctrl_c => {
                    break;
                }
            }
        }
        drop(listener);
    }

    info!("Shutting down...");
    if dispatcher.dropped() > 0 {
        warn!("{} shot reports were dropped", dispatcher.dropped());
    }
    drop(dispatcher);

    // The REPL thread may still hold a listener clone while blocked on
    // input, so the dispatch task is only drained in replay mode.
    if args.replay.is_some() {
        dispatch_task.await?;
        if let Some(worker) = cue_worker {
            // Worker exits once the sound sink (owned by the task) is dropped
            let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        }
    }
    if let Some(server) = hud_server {
        server.abort();
    }

    Ok(())
}

fn apply_reload(
    listener: &InputListener,
    mixer: &Mutex<VolumeMixer>,
    current: &AppConfig,
    new_config: &AppConfig,
) {
    info!("📝 Configuration file changed, reloading...");

    match KeyBindings::from_config(new_config) {
        Ok(bindings) => listener.set_bindings(bindings),
        Err(e) => warn!("⚠️  Keeping old key bindings: {}", e),
    }

    if new_config.volume != current.volume {
        mixer.lock().apply_config(&new_config.volume);
        info!("Volume settings reloaded");
    }

    if new_config.engine != current.engine {
        warn!("Reversal window changes take effect after a restart");
    }
    if new_config.server != current.server || new_config.sounds != current.sounds {
        warn!("Server and sound file changes take effect after a restart");
    }
}

/// Server mode is also selected by an executable named like `cstrafe-server`
fn exe_name_requests_server() -> bool {
    std::env::args()
        .next()
        .map(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase().contains("server"))
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Console logging, plus a daily rolling file when `logs_dir` is given
///
/// The returned guard must be held until exit to flush the file writer.
fn init_logging(
    level: &str,
    logs_dir: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let Some(dir) = logs_dir else {
        tracing_subscriber::registry().with(filter).with(console).init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(dir, "cstrafe.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();

    Some(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
