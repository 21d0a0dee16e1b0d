use crate::drivers::{create_driver, driver_fingerprint, Driver};
use anyhow::{anyhow, Context, Result};
use circus_core::constants::TRACK_HALF_WIDTH;
use circus_core::{
    encode_control_byte, render_frame, replay_strict, CommandRecorder, DrawCommand, HudSnapshot,
    RaceEnd, RaceSession, RaceSetup, Viewport,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Simulation step used for every harness race.
pub const FIXED_DT: f64 = 1.0 / 60.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub driver_id: String,
    pub driver_fingerprint: String,
    pub seed: u32,
    pub max_ticks: u32,
    pub ticks: u32,
    pub finished: bool,
    pub victory: bool,
    /// "You" on victory, the winning opponent on defeat, empty if unfinished.
    pub winner: String,
    pub completed_laps: u32,
    pub best_lap: Option<f64>,
    pub final_rank: usize,
    pub race_seconds: f64,
    pub throttle_ticks: u32,
    pub brake_ticks: u32,
    pub steer_ticks: u32,
    pub off_road_ticks: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub inputs: Vec<u8>,
}

pub fn run_driver(
    driver_id: &str,
    seed: u32,
    setup: &RaceSetup,
    max_ticks: u32,
) -> Result<RunArtifact> {
    if max_ticks == 0 {
        return Err(anyhow!("max_ticks must be > 0"));
    }

    let mut driver =
        create_driver(driver_id).ok_or_else(|| anyhow!("unknown driver '{driver_id}'"))?;
    run_driver_instance(driver.as_mut(), seed, setup, max_ticks)
}

/// Races `driver` until the finish or `max_ticks`, then re-runs the recorded
/// inputs through a strict replay and rejects the run if the two disagree.
pub fn run_driver_instance(
    driver: &mut dyn Driver,
    seed: u32,
    setup: &RaceSetup,
    max_ticks: u32,
) -> Result<RunArtifact> {
    if max_ticks == 0 {
        return Err(anyhow!("max_ticks must be > 0"));
    }

    driver.reset(seed);

    let mut session = RaceSession::new(setup.clone(), seed);
    session.begin();
    session
        .validate_invariants()
        .map_err(|rule| anyhow!("initial invariant failure: {rule}"))?;

    let mut inputs = Vec::with_capacity(max_ticks as usize);
    let mut throttle_ticks = 0u32;
    let mut brake_ticks = 0u32;
    let mut steer_ticks = 0u32;
    let mut off_road_ticks = 0u32;

    while session.is_running() && session.ticks() < max_ticks {
        let controls = driver.controls(&session.snapshot());
        inputs.push(encode_control_byte(controls));
        throttle_ticks += u32::from(controls.accelerate);
        brake_ticks += u32::from(controls.brake);
        steer_ticks += u32::from(controls.left != controls.right);

        session.step(FIXED_DT, controls);
        if session.player().offset.abs() > TRACK_HALF_WIDTH {
            off_road_ticks += 1;
        }
    }

    let replayed = replay_strict(setup, seed, FIXED_DT, &inputs)
        .map_err(|violation| anyhow!("recorded inputs failed strict replay: {violation}"))?;
    if replayed.ticks != session.ticks()
        || replayed.final_player != *session.player()
        || replayed.outcome.as_ref() != session.outcome()
    {
        return Err(anyhow!(
            "replay diverged from live race for driver={} seed={seed:#x}",
            driver.id()
        ));
    }

    let metrics = RunMetrics {
        driver_id: driver.id().to_string(),
        driver_fingerprint: driver_fingerprint(driver.id())
            .unwrap_or_else(|| "unknown".to_string()),
        seed,
        max_ticks,
        ticks: session.ticks(),
        finished: session.is_finished(),
        victory: session.outcome().is_some_and(|end| end.victory),
        winner: winner_name(session.outcome()),
        completed_laps: session.player().completed_laps,
        best_lap: session.state().best_lap,
        final_rank: session.rank(),
        race_seconds: session.state().race_clock,
        throttle_ticks,
        brake_ticks,
        steer_ticks,
        off_road_ticks,
    };
    debug!(
        driver = %metrics.driver_id,
        seed = metrics.seed,
        ticks = metrics.ticks,
        winner = %metrics.winner,
        "run complete"
    );

    Ok(RunArtifact {
        metrics,
        inputs,
    })
}

/// Replays a saved artifact against `setup` and checks it reproduces the
/// recorded metrics.
pub fn verify_artifact(artifact: &RunArtifact, setup: &RaceSetup) -> Result<()> {
    let metrics = &artifact.metrics;
    let replayed = replay_strict(setup, metrics.seed, FIXED_DT, &artifact.inputs)
        .map_err(|violation| anyhow!("artifact failed strict replay: {violation}"))?;

    let checks = [
        ("ticks", replayed.ticks == metrics.ticks),
        ("finished", replayed.finished == metrics.finished),
        ("completed_laps", replayed.completed_laps == metrics.completed_laps),
        ("final_rank", replayed.final_rank == metrics.final_rank),
        ("winner", winner_name(replayed.outcome.as_ref()) == metrics.winner),
        ("best_lap", same_lap(replayed.best_lap, metrics.best_lap)),
    ];
    if let Some((field, _)) = checks.iter().find(|(_, ok)| !ok) {
        return Err(anyhow!(
            "artifact {field} does not match replay (driver={} seed={:#x})",
            metrics.driver_id,
            metrics.seed
        ));
    }

    info!(
        driver = %metrics.driver_id,
        seed = metrics.seed,
        ticks = replayed.ticks,
        "artifact verified"
    );
    Ok(())
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameDump {
    pub driver_id: String,
    pub seed: u32,
    pub tick: u32,
    pub viewport: Viewport,
    pub hud: HudSnapshot,
    pub commands: Vec<DrawCommand>,
}

/// Lets `driver` race for up to `ticks` ticks, then records the draw
/// commands of the frame it ends on.
pub fn capture_frame(
    driver_id: &str,
    seed: u32,
    setup: &RaceSetup,
    ticks: u32,
    viewport: Viewport,
) -> Result<FrameDump> {
    let mut driver =
        create_driver(driver_id).ok_or_else(|| anyhow!("unknown driver '{driver_id}'"))?;
    driver.reset(seed);

    let mut session = RaceSession::new(setup.clone(), seed);
    session.begin();
    while session.is_running() && session.ticks() < ticks {
        let controls = driver.controls(&session.snapshot());
        session.step(FIXED_DT, controls);
    }

    let mut recorder = CommandRecorder::new(viewport);
    render_frame(&session, &mut recorder);
    Ok(FrameDump {
        driver_id: driver_id.to_string(),
        seed,
        tick: session.ticks(),
        viewport,
        hud: session.hud(),
        commands: recorder.take(),
    })
}

pub fn write_artifact(path: &Path, artifact: &RunArtifact) -> Result<()> {
    crate::util::write_json(path, artifact)
}

pub fn read_artifact(path: &Path) -> Result<RunArtifact> {
    let data =
        fs::read(path).with_context(|| format!("failed reading artifact {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("failed parsing artifact {}", path.display()))
}

/// JSON float parsing may be off by an ulp, so recorded laps compare loosely.
fn same_lap(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() < 1e-9,
        (None, None) => true,
        _ => false,
    }
}

fn winner_name(outcome: Option<&RaceEnd>) -> String {
    match outcome {
        Some(end) if end.victory => circus_core::progression::PLAYER_NAME.to_string(),
        Some(end) => end.opponent_name.clone(),
        None => String::new(),
    }
}
