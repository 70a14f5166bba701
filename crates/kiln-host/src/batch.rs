//! Batch firing: run one profile against the simulated kiln at full speed
//! and print the outcome. Useful for validating a profile before committing
//! a day of real firing to it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use kiln_core::command::Command;
use kiln_core::cone::{self, ConeSpeed};
use kiln_core::profile::FiringProfile;
use kiln_core::progress::FiringStatus;
use kiln_core::settings::KilnSettings;
use kiln_sim::KilnHarness;
use kiln_store::DirStore;
use tracing::info;

/// Arguments for the `fire` command.
#[derive(Parser, Debug)]
pub struct FireArgs {
    /// Stored profile id to fire (see `profiles list`).
    #[arg(short, long, conflicts_with = "cone")]
    profile: Option<String>,

    /// Generate and fire a cone profile instead (e.g. "06", "6", "5.5").
    #[arg(long)]
    cone: Option<String>,

    /// Cone firing speed: slow, medium, or fast.
    #[arg(long, default_value = "medium")]
    speed: String,

    /// Add a preheat segment to the generated cone profile.
    #[arg(long)]
    preheat: bool,

    /// Add a controlled cool-down to the generated cone profile.
    #[arg(long)]
    slow_cool: bool,

    /// Data directory holding stored profiles.
    #[arg(short, long, default_value = "kiln-data")]
    data_dir: PathBuf,

    /// Give up after this much simulated time.
    #[arg(long, default_value_t = 48)]
    max_sim_hours: u64,
}

fn resolve_profile(args: &FireArgs) -> Result<FiringProfile> {
    if let Some(number) = &args.cone {
        let speed = match args.speed.as_str() {
            "slow" => ConeSpeed::Slow,
            "medium" => ConeSpeed::Medium,
            "fast" => ConeSpeed::Fast,
            other => bail!("unknown speed {other:?} (expected slow, medium, or fast)"),
        };
        return cone::generate(number, speed, args.preheat, args.slow_cool)
            .context("cone profile generation failed");
    }
    if let Some(id) = &args.profile {
        let store = DirStore::open(&args.data_dir)?;
        return store
            .load_profile(id)
            .with_context(|| format!("profile {id:?} not found; try `profiles seed` first"));
    }
    bail!("pass either --profile <id> or --cone <number>");
}

/// Runs the batch firing to completion and prints a summary.
pub fn run_batch_firing(args: FireArgs) -> Result<()> {
    let profile = resolve_profile(&args)?;
    info!(
        profile = %profile.id,
        segments = profile.segments.len(),
        estimated_minutes = profile.estimated_duration_minutes,
        "batch firing"
    );

    let mut settings = KilnSettings::default();
    settings.set_max_safe_temp_c(1400.0);
    let mut harness = KilnHarness::with_settings(settings);

    harness
        .send(Command::Start {
            profile: profile.clone(),
            delay_minutes: 0,
        })
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    let mut next_report_s = 0u64;
    let mut sim_seconds = 0u64;
    let max_sim_seconds = args.max_sim_hours * 3600;

    loop {
        harness.run_ms(1000);
        sim_seconds += 1;

        if sim_seconds >= next_report_s {
            let progress = harness.progress();
            println!(
                "t+{:>6} s  segment {}/{}  {:7.1} °C -> {:7.1} °C  {:?}",
                sim_seconds,
                progress.current_segment + 1,
                progress.total_segments.max(1),
                progress.current_temp_c,
                progress.target_temp_c,
                progress.status,
            );
            next_report_s = sim_seconds + 1800;
        }

        let status = harness.progress().status;
        if status == FiringStatus::Complete || status == FiringStatus::Error {
            break;
        }
        if sim_seconds >= max_sim_seconds {
            bail!("firing did not finish within {} simulated hours", args.max_sim_hours);
        }
    }

    let records = harness
        .store
        .history()
        .map_err(|err| anyhow::anyhow!("{err}"))?;
    let record = records.first().context("no history record written")?;

    let watts = harness.settings.lock().element_watts;
    // watt-seconds to kWh
    let kwh = f64::from(record.element_on_seconds) * f64::from(watts) / 3.6e6;

    println!();
    println!("outcome:          {:?}", record.outcome);
    println!("error code:       {:?}", record.error_code);
    println!("peak:             {:.1} °C", record.peak_temp_c);
    println!(
        "duration:         {:.1} h (estimated {:.1} h)",
        f64::from(record.total_seconds) / 3600.0,
        f64::from(profile.estimated_duration_minutes) / 60.0
    );
    println!(
        "element on:       {:.1} h (~{kwh:.1} kWh at {watts} W)",
        f64::from(record.element_on_seconds) / 3600.0
    );

    Ok(())
}
