//! talon - CLI-first plan runner with skills, policy, telemetry, and replay.

mod config;
mod loaders;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use config::Config;
use talon_executor::{replay, run_plan};
use talon_skills::SkillRegistry;
use talon_types::{Mode, Policy};

#[derive(Parser)]
#[command(
    name = "talon",
    version,
    about = "Run declarative skill plans under an explicit safety policy"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a plan under a policy.
    Run {
        /// Path to a JSON plan file.
        #[arg(long, short = 'p')]
        plan: PathBuf,
        /// Policy document (YAML, or JSON by extension). Config default when omitted.
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Execution mode: live | dry-run | shadow.
        #[arg(long, default_value = "shadow")]
        mode: Mode,
        /// Output directory for run artifacts. Config default when omitted.
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Re-execute a previous run directory, optionally under another mode.
    Replay {
        /// A previous run directory containing summary.json.
        run_dir: PathBuf,
        /// Override mode for the replay.
        #[arg(long)]
        mode: Option<Mode>,
    },
    /// List registered skills.
    Skills,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    talon_logging::init_logging(&config.logging.level)?;

    match cli.command {
        Command::Run {
            plan,
            policy,
            mode,
            out,
        } => cmd_run(&config, plan, policy, mode, out),
        Command::Replay { run_dir, mode } => cmd_replay(run_dir, mode),
        Command::Skills => cmd_skills(),
    }
}

fn cmd_run(
    config: &Config,
    plan_path: PathBuf,
    policy_path: Option<PathBuf>,
    mode: Mode,
    out: Option<PathBuf>,
) -> Result<()> {
    let plan = loaders::load_plan(&plan_path)?;

    let policy_path = policy_path.unwrap_or_else(|| PathBuf::from(&config.defaults.policy));
    let policy = if policy_path.exists() {
        loaders::load_policy(&policy_path)?
    } else {
        warn!(
            path = %policy_path.display(),
            "policy document not found, using built-in defaults"
        );
        Policy::default()
    };

    let out = out.unwrap_or_else(|| PathBuf::from(&config.defaults.out));
    let summary = run_plan(&plan, &policy, mode, &out)?;

    println!("Done: {}", summary.out_dir.display());
    println!("Telemetry: {} events", summary.telemetry_count);
    println!("Tip: use 'talon replay <run_dir>' to replay with a different mode.");
    Ok(())
}

fn cmd_replay(run_dir: PathBuf, mode: Option<Mode>) -> Result<()> {
    let summary = replay(&run_dir, mode)?;
    println!("Replayed to: {}", summary.out_dir.display());
    println!("Telemetry: {} events", summary.telemetry_count);
    Ok(())
}

fn cmd_skills() -> Result<()> {
    let registry = SkillRegistry::builtin()?;
    for spec in registry.specs() {
        println!(
            "{:<18}  risk={:<6}  {}",
            spec.name,
            spec.risk.to_string(),
            spec.description
        );
    }
    Ok(())
}
