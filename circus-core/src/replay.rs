//! Deterministic re-runs of a race from its seed and recorded control bytes.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::control::decode_control_byte;
use crate::error::RuleCode;
use crate::progression::RaceEnd;
use crate::session::{RaceSession, RaceSetup};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub seed: u32,
    pub ticks: u32,
    pub finished: bool,
    pub outcome: Option<RaceEnd>,
    pub completed_laps: u32,
    pub best_lap: Option<f64>,
    pub race_clock: f64,
    pub final_rank: usize,
    pub final_player: Actor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceCheckpoint {
    pub tick: u32,
    pub player: Actor,
    pub opponent_laps: Vec<u32>,
    pub rank: usize,
    pub lap_timer: f64,
    pub race_clock: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayViolation {
    pub tick: u32,
    pub rule: RuleCode,
}

impl fmt::Display for ReplayViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} violated at tick {}", self.rule, self.tick)
    }
}

impl std::error::Error for ReplayViolation {}

fn started(setup: &RaceSetup, seed: u32) -> RaceSession {
    let mut session = RaceSession::new(setup.clone(), seed);
    session.begin();
    session
}

fn result_of(session: &RaceSession) -> ReplayResult {
    ReplayResult {
        seed: session.seed(),
        ticks: session.ticks(),
        finished: session.is_finished(),
        outcome: session.outcome().cloned(),
        completed_laps: session.player().completed_laps,
        best_lap: session.state().best_lap,
        race_clock: session.state().race_clock,
        final_rank: session.rank(),
        final_player: *session.player(),
    }
}

fn checkpoint_of(session: &RaceSession) -> RaceCheckpoint {
    RaceCheckpoint {
        tick: session.ticks(),
        player: *session.player(),
        opponent_laps: session
            .opponents()
            .iter()
            .map(|opponent| opponent.actor.completed_laps)
            .collect(),
        rank: session.rank(),
        lap_timer: session.state().lap_timer,
        race_clock: session.state().race_clock,
    }
}

/// Steps one input byte per tick at a fixed `dt`. Inputs left over after the
/// finish are ignored.
pub fn replay(setup: &RaceSetup, seed: u32, dt: f64, inputs: &[u8]) -> ReplayResult {
    let mut session = started(setup, seed);
    for input in inputs {
        if !session.is_running() {
            break;
        }
        session.step(dt, decode_control_byte(*input));
    }
    result_of(&session)
}

/// Like `replay`, but checks every invariant before the first tick and after
/// each one.
pub fn replay_strict(
    setup: &RaceSetup,
    seed: u32,
    dt: f64,
    inputs: &[u8],
) -> Result<ReplayResult, ReplayViolation> {
    let mut session = started(setup, seed);
    session.validate_invariants().map_err(|rule| ReplayViolation {
        tick: session.ticks(),
        rule,
    })?;

    for input in inputs {
        if !session.is_running() {
            break;
        }
        session.step(dt, decode_control_byte(*input));
        session.validate_invariants().map_err(|rule| ReplayViolation {
            tick: session.ticks(),
            rule,
        })?;
    }

    Ok(result_of(&session))
}

/// Samples a checkpoint at tick 0, every `sample_every` ticks, and on the
/// last tick played.
pub fn replay_with_checkpoints(
    setup: &RaceSetup,
    seed: u32,
    dt: f64,
    inputs: &[u8],
    sample_every: u32,
) -> Vec<RaceCheckpoint> {
    let mut session = started(setup, seed);
    let stride = sample_every.max(1);
    let mut checkpoints = vec![checkpoint_of(&session)];

    for input in inputs {
        if !session.is_running() {
            break;
        }
        session.step(dt, decode_control_byte(*input));
        if session.ticks() % stride == 0 {
            checkpoints.push(checkpoint_of(&session));
        }
    }

    let last_tick = session.ticks();
    if checkpoints.last().map(|checkpoint| checkpoint.tick) != Some(last_tick) {
        checkpoints.push(checkpoint_of(&session));
    }
    checkpoints
}
