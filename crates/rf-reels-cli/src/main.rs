//! reelspin: headless slot machine host
//!
//! Drives the machine frame by frame and prints the settled window, the win
//! banner and a session summary.
//!
//! Usage:
//!   reelspin --spins 10 --seed 7
//!   reelspin --force-win --profile studio
//!   reelspin --config machine.json --json

mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rf_reels::{SlotConfig, SlotMachine, TimingConfig, TimingProfile};

use render::Presenter;

#[derive(Parser)]
#[command(name = "reelspin")]
#[command(about = "Spin a frame-driven slot machine in the terminal")]
struct Cli {
    /// Number of spin cycles to run
    #[arg(short = 'n', long, default_value_t = 1)]
    spins: u32,

    /// Seed the RNG for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Arm a forced win for the first spin only
    #[arg(long)]
    force_win: bool,

    /// Timing profile (overrides the profile in --config)
    #[arg(long, value_enum)]
    profile: Option<Profile>,

    /// Load machine configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit stage events as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Print every stage event as it happens
    #[arg(short, long)]
    verbose: bool,

    /// Tick size in frames
    #[arg(long, default_value_t = 1.0)]
    dt: f64,

    /// Give up on a cycle after this many ticks
    #[arg(long, default_value_t = 100_000)]
    max_ticks: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Normal,
    Turbo,
    Studio,
}

impl From<Profile> for TimingProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Normal => TimingProfile::Normal,
            Profile::Turbo => TimingProfile::Turbo,
            Profile::Studio => TimingProfile::Studio,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !(cli.dt.is_finite() && cli.dt > 0.0) {
        bail!("--dt must be a positive number, got {}", cli.dt);
    }

    let mut machine = build_machine(&cli)?;
    run_session(&cli, &mut machine)?;

    let stats = machine.stats();
    if cli.json {
        println!("{}", serde_json::to_string(stats)?);
    } else {
        println!(
            "{} spins, {} wins, {} losses, hit rate {:.1}%",
            stats.total_spins,
            stats.wins,
            stats.losses,
            stats.hit_rate()
        );
        for (symbol, count) in &stats.wins_by_symbol {
            println!("  {:<10} {}", symbol, count);
        }
    }

    Ok(())
}

fn build_machine(cli: &Cli) -> Result<SlotMachine> {
    let config = load_config(cli)?;
    log::info!(
        "Machine: {}x{} grid, {} symbols, wild {}",
        config.grid.reels,
        config.grid.rows,
        config.alphabet.len(),
        config.wild
    );

    match cli.seed {
        Some(seed) => SlotMachine::with_seed(config, seed),
        None => SlotMachine::new(config),
    }
    .context("Invalid machine configuration")
}

/// Run `--spins` cycles back to back, rendering each settled window
fn run_session(cli: &Cli, machine: &mut SlotMachine) -> Result<()> {
    let mut presenter = Presenter::new();

    // The machine clears the flag once the first outcome is generated
    if cli.force_win {
        machine.set_force_win(true);
    }

    for _ in 0..cli.spins {
        if !machine.handle_spin() {
            bail!("Spin trigger rejected while a cycle is active");
        }

        let mut ticks = 0;
        while machine.is_cycle_active() {
            if ticks >= cli.max_ticks {
                bail!(
                    "Spin {} did not settle within {} ticks",
                    machine.spin_count(),
                    cli.max_ticks
                );
            }
            machine.tick(cli.dt);
            ticks += 1;
            emit_events(cli, machine, &mut presenter)?;
        }

        if !cli.json {
            println!("Spin {}", machine.spin_count());
            println!("{}", render::render_window(machine));
            match &presenter.banner {
                Some(banner) => println!("{}", banner),
                None => println!("no win"),
            }
            println!("{}", presenter.status_line());
            println!();
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SlotConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            SlotConfig::from_json(&json)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => SlotConfig::classic(),
    };

    if let Some(profile) = cli.profile {
        let frame_ms = config.timing.frame_ms;
        config.timing = TimingConfig {
            frame_ms,
            ..TimingConfig::from_profile(profile.into())
        };
    }

    Ok(config)
}

fn emit_events(cli: &Cli, machine: &mut SlotMachine, presenter: &mut Presenter) -> Result<()> {
    for event in machine.drain_events() {
        presenter.apply(&event);
        if cli.json {
            println!("{}", serde_json::to_string(&event)?);
        } else if cli.verbose {
            println!("{}", render::describe(&event));
        }
    }
    Ok(())
}
