mod config;
mod session;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kinloop_assets::{AssetManifest, Preloader};
use kinloop_driver::ManualClock;
use kinloop_tools::SessionInspector;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::GameConfig;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "kinloop-cli", about = "Headless runner for the kinloop game loop")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the default configuration
    Info,
    /// Wire a session and drive it with a fixed frame time
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Wall-clock milliseconds per frame
        #[arg(long, default_value = "16")]
        frame_ms: f64,
        /// JSON game config; missing fields use defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON asset manifest to preload before the first frame
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Override the world seed
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("kinloop-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", kinloop_common::crate_info());
            println!("events: {}", kinloop_events::crate_info());
            println!("services: {}", kinloop_services::crate_info());
            println!("kernel: {}", kinloop_kernel::crate_info());
            println!("render: {}", kinloop_render::crate_info());
            println!("view: {}", kinloop_view::crate_info());
            println!("input: {}", kinloop_input::crate_info());
            println!("agent: {}", kinloop_agent::crate_info());
            println!("assets: {}", kinloop_assets::crate_info());
            println!("driver: {}", kinloop_driver::crate_info());
            println!("tools: {}", kinloop_tools::crate_info());
            println!(
                "default config: {}",
                serde_json::to_string_pretty(&GameConfig::default())?
            );
        }
        Commands::Run {
            frames,
            frame_ms,
            config,
            manifest,
            seed,
        } => {
            let mut game = match config {
                Some(path) => GameConfig::load(&path)?,
                None => GameConfig::default(),
            };
            if let Some(seed) = seed {
                game.world.seed = seed;
            }

            let session = Session::wire(&game)?;

            let mut preloader = Preloader::new();
            if let Some(path) = manifest {
                let manifest = AssetManifest::load(&path)
                    .with_context(|| format!("loading manifest {}", path.display()))?;
                preloader.enqueue(manifest);
            }
            let driver = session.driver.clone();
            preloader.subscribe_on_loaded(move |assets| {
                info!(assets = assets.len(), "assets ready, starting driver");
                driver.borrow_mut().start();
            });
            preloader.start().context("preloading assets")?;

            let mut clock = ManualClock::from_millis(frame_ms);
            let summary = session.driver.borrow_mut().run_for(&mut clock, frames)?;

            println!("{}", session.driver.borrow().renderer().last_frame());
            println!(
                "Ran {} frames, {} fixed steps, {:.2}s simulated",
                summary.frames, summary.fixed_steps, summary.simulated
            );
            println!("{}", SessionInspector::session(&session.ctx));
            println!(
                "Agent reward: {:.0}",
                session.agent.borrow().cumulative_reward()
            );

            session.teardown()?;
        }
    }

    Ok(())
}
