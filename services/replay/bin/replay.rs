//! Main Entrypoint for the Level Replay Tool
//!
//! Loads configuration and a solution script, replays the script against its
//! level and reports whether the level was solved. Exits with an error when it
//! was not, so recorded solutions can be checked in CI.

use anyhow::{Context, bail};
use clap::Parser;
use gitlevel_replay::{
    config::Config,
    replay::{ReplayOptions, run_replay},
    script::ReplayScript,
};
use std::{path::PathBuf, time::Duration};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Parser, Debug)]
#[command(version, about = "Replay a recorded solution against a git level")]
struct Args {
    /// Path to the replay script (JSON).
    #[arg(long)]
    script: PathBuf,
    /// Length of the simulated solved animation, overriding ANIMATION_MS.
    #[arg(long)]
    animation_ms: Option<u64>,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    // The configured level is the default directive for the env filter.
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let script = ReplayScript::load(&args.script)?;
    let options = ReplayOptions {
        animation: args
            .animation_ms
            .map(Duration::from_millis)
            .unwrap_or(config.animation),
        animation_timeout: config.animation_timeout,
    };
    info!(script = %args.script.display(), ?options, "Starting replay");

    let report = run_replay(script, &options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("level:           {}", report.level);
        println!("steps:           {}", report.steps);
        println!("commands issued: {}", report.commands_issued);
        if let Some(par) = report.par {
            println!("par:             {par}");
        }
        if !report.rejected.is_empty() {
            println!("rejected:        {}", report.rejected.join(", "));
        }
        match report.solved_at_step {
            Some(step) => println!("solved:          yes (step {step})"),
            None => println!("solved:          no"),
        }
    }

    if !report.solved {
        bail!("Level '{}' was not solved", report.level);
    }
    Ok(())
}
