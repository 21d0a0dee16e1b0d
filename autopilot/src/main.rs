use anyhow::{anyhow, Result};
use circus_autopilot::benchmark::{resolve_drivers, run_benchmark, BenchmarkConfig, Objective};
use circus_autopilot::config::load_setup;
use circus_autopilot::drivers::{create_driver, describe_drivers, driver_ids, driver_manifest_entries};
use circus_autopilot::runner::{
    capture_frame, read_artifact, run_driver, verify_artifact, write_artifact,
};
use circus_autopilot::util::{parse_seed, resolve_seeds, seed_to_hex, write_json};
use circus_core::constants::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
use circus_core::Viewport;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "circus-autopilot")]
#[command(about = "Headless chariot-race harness: scripted drivers, replays and benchmarks")]
struct Cli {
    /// RaceConfig JSON; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Track blueprint JSON (array of {run_length, curvature})
    #[arg(long, global = true)]
    track: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available drivers
    ListDrivers,
    /// Export the driver manifest (including profile fingerprints)
    DriverManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Race one driver on one seed and save the verified run
    Race {
        #[arg(long)]
        driver: String,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 36_000)]
        max_ticks: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a saved run and check it reproduces its metrics
    VerifyRun {
        #[arg(long)]
        input: PathBuf,
    },
    /// Race every driver on every seed and rank them
    Benchmark {
        #[arg(long)]
        drivers: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, default_value_t = 36_000)]
        max_ticks: u32,
        #[arg(long, value_enum, default_value_t = CliObjective::Wins)]
        objective: CliObjective,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        save_top: usize,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Dump one frame's draw commands as JSON
    Frame {
        #[arg(long, default_value = "line-keeper")]
        driver: String,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        #[arg(long, default_value_t = DEFAULT_VIEWPORT_WIDTH)]
        width: f64,
        #[arg(long, default_value_t = DEFAULT_VIEWPORT_HEIGHT)]
        height: f64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Wins,
    Pace,
    Hybrid,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Wins => Objective::Wins,
            CliObjective::Pace => Objective::Pace,
            CliObjective::Hybrid => Objective::Hybrid,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let Cli {
        config,
        track,
        command,
    } = Cli::parse();

    match command {
        Commands::ListDrivers => {
            for (id, description) in describe_drivers() {
                println!("{id:14} {description}");
            }
        }
        Commands::DriverManifest { output } => {
            let manifest = driver_manifest_entries();
            if let Some(path) = output {
                write_json(&path, &manifest)?;
                println!("wrote={}", path.display());
                println!("drivers={}", manifest.len());
            } else {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Commands::Race {
            driver,
            seed,
            max_ticks,
            output,
        } => {
            ensure_driver(&driver)?;
            let setup = load_setup(config.as_deref(), track.as_deref())?;
            let seed = parse_seed(&seed)?;
            let artifact = run_driver(&driver, seed, &setup, max_ticks)?;
            let metrics = &artifact.metrics;
            let output_path = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "runs/{}-{}-ticks{}.json",
                    driver,
                    seed_to_hex(seed).replace("0x", "seed"),
                    metrics.ticks
                ))
            });
            write_artifact(&output_path, &artifact)?;

            println!("driver={}", metrics.driver_id);
            println!("driver_fingerprint={}", metrics.driver_fingerprint);
            println!("seed={}", seed_to_hex(seed));
            println!("ticks={}", metrics.ticks);
            println!("finished={}", metrics.finished);
            println!("winner={}", display_or_dash(&metrics.winner));
            println!("laps={}", metrics.completed_laps);
            println!(
                "best_lap={}",
                circus_core::format_time(metrics.best_lap.unwrap_or(f64::NAN))
            );
            println!("rank={}", metrics.final_rank);
            println!("output={}", output_path.display());
        }
        Commands::VerifyRun { input } => {
            let setup = load_setup(config.as_deref(), track.as_deref())?;
            let artifact = read_artifact(&input)?;
            verify_artifact(&artifact, &setup)?;
            println!("input={}", input.display());
            println!("driver={}", artifact.metrics.driver_id);
            println!("seed={}", seed_to_hex(artifact.metrics.seed));
            println!("ticks={}", artifact.metrics.ticks);
            println!("winner={}", display_or_dash(&artifact.metrics.winner));
            println!("verified=true");
        }
        Commands::Benchmark {
            drivers,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            max_ticks,
            objective,
            out_dir,
            save_top,
            jobs,
        } => {
            let setup = load_setup(config.as_deref(), track.as_deref())?;
            let drivers = resolve_drivers(drivers.as_deref())?;
            for driver in &drivers {
                ensure_driver(driver)?;
            }
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let objective: Objective = objective.into();
            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-{}",
                    objective.as_str(),
                    timestamp_suffix()
                ))
            });

            let report = run_benchmark(BenchmarkConfig {
                drivers,
                seeds,
                max_ticks,
                objective,
                out_dir: out_dir.clone(),
                save_top,
                jobs,
                setup,
            })?;

            println!("objective={}", objective.as_str());
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, driver) in report.driver_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  objective={:.2} wins={:.0}% finish={:.0}% avg_rank={:.2} best_lap={}",
                    idx + 1,
                    driver.driver_id,
                    driver.objective_value,
                    driver.win_rate * 100.0,
                    driver.finish_rate * 100.0,
                    driver.avg_rank,
                    circus_core::format_time(driver.best_lap.unwrap_or(f64::NAN)),
                );
            }
            for saved in &report.saved_runs {
                println!("  saved #{:02} {} {} {}", saved.rank, saved.driver_id, saved.seed_hex, saved.path);
            }
        }
        Commands::Frame {
            driver,
            seed,
            ticks,
            width,
            height,
            output,
        } => {
            ensure_driver(&driver)?;
            if !(width > 0.0 && height > 0.0) {
                return Err(anyhow!("viewport must be positive, got {width}x{height}"));
            }
            let setup = load_setup(config.as_deref(), track.as_deref())?;
            let seed = parse_seed(&seed)?;
            let dump = capture_frame(&driver, seed, &setup, ticks, Viewport::new(width, height))?;
            match output {
                Some(path) => {
                    write_json(&path, &dump)?;
                    println!("tick={}", dump.tick);
                    println!("commands={}", dump.commands.len());
                    println!("hud={}", dump.hud);
                    println!("output={}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&dump)?),
            }
        }
    }

    Ok(())
}

fn ensure_driver(driver: &str) -> Result<()> {
    if create_driver(driver).is_none() {
        let available = driver_ids().join(", ");
        return Err(anyhow!("unknown driver '{driver}'. available: {available}"));
    }
    Ok(())
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn timestamp_suffix() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
