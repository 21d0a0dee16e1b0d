use crate::drivers::driver_ids;
use crate::runner::{run_driver, write_artifact, RunMetrics};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use circus_core::RaceSetup;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Wins,
    Pace,
    Hybrid,
}

impl Objective {
    /// Higher is better for every objective.
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        let win = if metrics.victory { 1.0 } else { 0.0 };
        let laps = f64::from(metrics.completed_laps);
        let rank_bonus = 1.0 / metrics.final_rank.max(1) as f64;
        let pace = match metrics.best_lap {
            Some(lap) if lap > 0.0 => 1_000.0 / lap,
            _ => 0.0,
        };
        match self {
            Self::Wins => win * 1_000.0 + rank_bonus * 200.0 + laps * 25.0,
            Self::Pace => pace + laps * 40.0 - f64::from(metrics.off_road_ticks) * 0.05,
            Self::Hybrid => {
                win * 600.0 + rank_bonus * 150.0 + pace * 0.6 + laps * 30.0
                    - f64::from(metrics.off_road_ticks) * 0.02
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wins => "wins",
            Self::Pace => "pace",
            Self::Hybrid => "hybrid",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub drivers: Vec<String>,
    pub seeds: Vec<u32>,
    pub max_ticks: u32,
    pub objective: Objective,
    pub out_dir: PathBuf,
    pub save_top: usize,
    pub jobs: Option<usize>,
    pub setup: RaceSetup,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub driver_id: String,
    pub driver_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub ticks: u32,
    pub finished: bool,
    pub victory: bool,
    pub winner: String,
    pub completed_laps: u32,
    pub best_lap: Option<f64>,
    pub final_rank: usize,
    pub race_seconds: f64,
    pub objective_value: f64,
    pub throttle_ticks: u32,
    pub brake_ticks: u32,
    pub steer_ticks: u32,
    pub off_road_ticks: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverAggregate {
    pub driver_id: String,
    pub driver_fingerprint: String,
    pub runs: usize,
    pub win_rate: f64,
    pub finish_rate: f64,
    /// Mean ticks over finished races only.
    pub avg_finish_ticks: Option<f64>,
    pub best_lap: Option<f64>,
    pub avg_rank: f64,
    pub avg_laps: f64,
    pub objective_value: f64,
    pub avg_off_road_ticks: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedRunRecord {
    pub rank: usize,
    pub driver_id: String,
    pub seed: u32,
    pub seed_hex: String,
    pub objective_value: f64,
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub objective: Objective,
    pub max_ticks: u32,
    pub jobs: Option<usize>,
    pub drivers: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub driver_rankings: Vec<DriverAggregate>,
    pub runs: Vec<RunRecord>,
    pub saved_runs: Vec<SavedRunRecord>,
}

#[derive(Clone, Debug)]
struct InternalRun {
    artifact: crate::runner::RunArtifact,
    objective_value: f64,
}

pub fn resolve_drivers(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(driver_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let drivers: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            if drivers.is_empty() {
                return Err(anyhow!("--drivers resolved to empty list"));
            }
            Ok(drivers)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.drivers.is_empty() {
        return Err(anyhow!("benchmark requires at least one driver"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, u32)> = config
        .drivers
        .iter()
        .flat_map(|driver| config.seeds.iter().map(move |seed| (driver.clone(), *seed)))
        .collect();
    info!(
        runs = run_jobs.len(),
        objective = config.objective.as_str(),
        "benchmark started"
    );

    let run_one = |(driver_id, seed): &(String, u32)| -> Result<InternalRun> {
        let artifact = run_driver(driver_id, *seed, &config.setup, config.max_ticks)
            .with_context(|| format!("benchmark run failed for driver={driver_id} seed={seed:#x}"))?;
        let objective_value = config.objective.run_value(&artifact.metrics);
        Ok(InternalRun {
            artifact,
            objective_value,
        })
    };

    let run_results: Vec<Result<InternalRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };
    let runs = run_results.into_iter().collect::<Result<Vec<_>>>()?;

    let mut rankings = aggregate(&runs);
    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.win_rate.total_cmp(&a.win_rate))
            .then_with(|| a.avg_rank.total_cmp(&b.avg_rank))
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    let mut run_records: Vec<RunRecord> = runs.iter().map(run_record).collect();
    run_records.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| a.ticks.cmp(&b.ticks))
            .then_with(|| a.driver_id.cmp(&b.driver_id))
            .then_with(|| a.seed.cmp(&b.seed))
    });

    let saved_runs = save_top_runs(&config.out_dir, &runs, config.save_top)?;

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        objective: config.objective,
        max_ticks: config.max_ticks,
        jobs: config.jobs,
        drivers: config.drivers,
        seeds: config.seeds,
        run_count: run_records.len(),
        driver_rankings: rankings,
        runs: run_records,
        saved_runs,
    };

    crate::util::write_json(&config.out_dir.join("summary.json"), &report)?;
    Ok(report)
}

fn aggregate(runs: &[InternalRun]) -> Vec<DriverAggregate> {
    let mut grouped: HashMap<&str, Vec<&InternalRun>> = HashMap::new();
    for run in runs {
        grouped
            .entry(run.artifact.metrics.driver_id.as_str())
            .or_default()
            .push(run);
    }

    grouped
        .into_iter()
        .map(|(driver_id, driver_runs)| {
            let count = driver_runs.len() as f64;
            let metrics = || driver_runs.iter().map(|run| &run.artifact.metrics);

            let wins = metrics().filter(|m| m.victory).count() as f64;
            let finish_ticks: Vec<f64> = metrics()
                .filter(|m| m.finished)
                .map(|m| f64::from(m.ticks))
                .collect();
            let avg_finish_ticks = (!finish_ticks.is_empty())
                .then(|| finish_ticks.iter().sum::<f64>() / finish_ticks.len() as f64);
            let best_lap = metrics()
                .filter_map(|m| m.best_lap)
                .min_by(|a, b| a.total_cmp(b));

            DriverAggregate {
                driver_id: driver_id.to_string(),
                driver_fingerprint: metrics()
                    .next()
                    .map(|m| m.driver_fingerprint.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                runs: driver_runs.len(),
                win_rate: wins / count,
                finish_rate: finish_ticks.len() as f64 / count,
                avg_finish_ticks,
                best_lap,
                avg_rank: metrics().map(|m| m.final_rank as f64).sum::<f64>() / count,
                avg_laps: metrics().map(|m| f64::from(m.completed_laps)).sum::<f64>() / count,
                objective_value: driver_runs.iter().map(|r| r.objective_value).sum::<f64>()
                    / count,
                avg_off_road_ticks: metrics().map(|m| f64::from(m.off_road_ticks)).sum::<f64>()
                    / count,
            }
        })
        .collect()
}

fn run_record(run: &InternalRun) -> RunRecord {
    let m = &run.artifact.metrics;
    RunRecord {
        driver_id: m.driver_id.clone(),
        driver_fingerprint: m.driver_fingerprint.clone(),
        seed: m.seed,
        seed_hex: seed_to_hex(m.seed),
        ticks: m.ticks,
        finished: m.finished,
        victory: m.victory,
        winner: m.winner.clone(),
        completed_laps: m.completed_laps,
        best_lap: m.best_lap,
        final_rank: m.final_rank,
        race_seconds: m.race_seconds,
        objective_value: run.objective_value,
        throttle_ticks: m.throttle_ticks,
        brake_ticks: m.brake_ticks,
        steer_ticks: m.steer_ticks,
        off_road_ticks: m.off_road_ticks,
    }
}

fn save_top_runs(out_dir: &Path, runs: &[InternalRun], count: usize) -> Result<Vec<SavedRunRecord>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut order: Vec<&InternalRun> = runs.iter().collect();
    order.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| a.artifact.metrics.ticks.cmp(&b.artifact.metrics.ticks))
    });

    let save_dir = out_dir.join("top-runs");
    let mut saved = Vec::new();
    for (idx, run) in order.into_iter().take(count).enumerate() {
        let rank = idx + 1;
        let m = &run.artifact.metrics;
        let path = save_dir.join(format!(
            "rank{rank:02}-{}-seed{:08x}-ticks{}.json",
            m.driver_id, m.seed, m.ticks
        ));
        write_artifact(&path, &run.artifact)?;
        saved.push(SavedRunRecord {
            rank,
            driver_id: m.driver_id.clone(),
            seed: m.seed,
            seed_hex: seed_to_hex(m.seed),
            objective_value: run.objective_value,
            path: path.to_string_lossy().into_owned(),
        });
    }
    Ok(saved)
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.3}")).unwrap_or_default()
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "driver_id,driver_fingerprint,seed_hex,seed,ticks,finished,victory,winner,completed_laps,best_lap,final_rank,race_seconds,objective_value,throttle_ticks,brake_ticks,steer_ticks,off_road_ticks\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{:.3},{:.4},{},{},{},{}\n",
            row.driver_id,
            row.driver_fingerprint,
            row.seed_hex,
            row.seed,
            row.ticks,
            row.finished,
            row.victory,
            row.winner,
            row.completed_laps,
            optional(row.best_lap),
            row.final_rank,
            row.race_seconds,
            row.objective_value,
            row.throttle_ticks,
            row.brake_ticks,
            row.steer_ticks,
            row.off_road_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[DriverAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,driver_id,driver_fingerprint,runs,win_rate,finish_rate,avg_finish_ticks,best_lap,avg_rank,avg_laps,objective_value,avg_off_road_ticks\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.4},{:.4},{},{},{:.3},{:.3},{:.4},{:.2}\n",
            idx + 1,
            row.driver_id,
            row.driver_fingerprint,
            row.runs,
            row.win_rate,
            row.finish_rate,
            optional(row.avg_finish_ticks),
            optional(row.best_lap),
            row.avg_rank,
            row.avg_laps,
            row.objective_value,
            row.avg_off_road_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
