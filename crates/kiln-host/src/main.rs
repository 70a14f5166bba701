//! # Kiln Host
//!
//! Host runtime for the kiln controller. It wires the control core — sensor
//! sampler, safety supervisor, and firing engine — into periodic tasks,
//! persists profiles and history to a data directory, and exposes a local
//! Unix-socket control interface.
//!
//! The host build drives a simulated kiln through the production sensor and
//! actuator paths, which makes it a complete development and profile
//! validation rig; the embedded target reuses the same core against real
//! peripherals.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod batch;
mod config;
mod control;
mod tasks;

use config::KilnConfig;
use kiln_store::DirStore;

/// Electric kiln controller host process.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the controller with its control socket.
    Run(RunArgs),
    /// Fire one profile against the simulated kiln at full speed.
    Fire(batch::FireArgs),
    /// Manage stored firing profiles.
    Profiles(ProfilesArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the kiln configuration file.
    #[arg(short, long, default_value = "kiln.cfg")]
    config_path: PathBuf,

    /// Directory for persisted profiles, history, and settings.
    #[arg(short, long, default_value = "kiln-data")]
    data_dir: PathBuf,

    /// Path of the control socket.
    #[arg(long, default_value = "/tmp/kiln")]
    socket_path: String,
}

#[derive(Parser, Debug)]
struct ProfilesArgs {
    /// Directory for persisted profiles.
    #[arg(short, long, default_value = "kiln-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    action: ProfilesAction,
}

#[derive(Subcommand, Debug)]
enum ProfilesAction {
    /// List stored profile ids.
    List,
    /// Install the built-in default profiles into an empty store.
    Seed,
    /// Print one stored profile as JSON.
    Show { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logging subscriber.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Fire(args) => batch::run_batch_firing(args),
        Commands::Profiles(args) => run_profiles(args),
    }
}

/// Initializes and runs all the controller components as concurrent tasks.
async fn run_server(args: RunArgs) -> Result<()> {
    info!("starting kiln controller");

    // 1. Load configuration and open the store.
    info!(path = ?args.config_path, "loading configuration");
    let kiln_config = KilnConfig::load(&args.config_path)?;
    let mut store = DirStore::open(&args.data_dir)?;
    let seeded = store.seed_default_profiles()?;
    if seeded > 0 {
        info!(seeded, "installed default profiles");
    }

    // 2. Stored settings, with config-file overrides applied on top.
    let mut settings = store.load_settings()?;
    if let Some(value) = kiln_config.kiln.max_safe_temp_c {
        settings.set_max_safe_temp_c(value);
    }
    if let Some(value) = kiln_config.kiln.tc_offset_c {
        settings.tc_offset_c = value;
    }
    if let Some(value) = kiln_config.kiln.element_watts {
        settings.element_watts = value;
    }
    info!(
        max_safe_temp_c = settings.max_safe_temp_c(),
        ssr_gpio = kiln_config.pins.ssr_gpio,
        "configuration loaded"
    );
    let settings = kiln_core::settings::shared(settings);

    // 3. Spawn the control tasks.
    let controller = tasks::spawn_controller(settings, store.clone(), &kiln_config.sim);

    // 4. Control socket, then wait for shutdown.
    let socket_path = args.socket_path.clone();
    let socket_store = store.clone();
    let socket_controller = controller.clone();
    let socket = tokio::spawn(async move {
        if let Err(err) = control::start_control_socket(&socket_path, socket_controller, socket_store).await
        {
            tracing::error!(%err, "control socket failed");
        }
    });

    tokio::select! {
        _ = socket => {
            info!("control socket shut down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, exiting");
        }
    }

    let _ = std::fs::remove_file(&args.socket_path);
    Ok(())
}

fn run_profiles(args: ProfilesArgs) -> Result<()> {
    let mut store = DirStore::open(&args.data_dir)?;
    match args.action {
        ProfilesAction::List => {
            for id in store.list_profiles()? {
                let profile = store.load_profile(&id)?;
                println!(
                    "{id:<20} {:<28} max {:7.1} °C  ~{} min",
                    profile.name, profile.max_temp_c, profile.estimated_duration_minutes
                );
            }
        }
        ProfilesAction::Seed => {
            let seeded = store.seed_default_profiles()?;
            println!("seeded {seeded} profiles");
        }
        ProfilesAction::Show { id } => {
            let profile = store.load_profile(&id)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
