//! The race aggregate: track, actors and race state owned in one place and
//! advanced by a single step function.

use serde::Serialize;
use tracing::{debug, info};

use crate::actor::{
    spawn_opponents, starting_player, Actor, Opponent, OpponentTemplate, DEFAULT_ROSTER,
};
use crate::agents::step_opponents;
use crate::config::RaceConfig;
use crate::control::ControlState;
use crate::dynamics::{coast, step_player};
use crate::error::{ConfigError, RuleCode};
use crate::hud::HudSnapshot;
use crate::progression::{check_finish, player_rank, standings, RaceEnd, RaceState, Standing};
use crate::projection::{project_frame, FrameGeometry, Viewport};
use crate::rng::SeededRng;
use crate::track::Track;

/// Segments of curvature a snapshot carries ahead of the player.
pub const LOOKAHEAD_SEGMENTS: usize = 24;

/// Immutable inputs of a race: tunables, circuit and starting field.
#[derive(Clone, Debug, PartialEq)]
pub struct RaceSetup {
    config: RaceConfig,
    track: Track,
    roster: Vec<OpponentTemplate>,
}

impl Default for RaceSetup {
    fn default() -> Self {
        let config = RaceConfig::default();
        let track = Track::default_circuit(config.segment_length);
        Self {
            config,
            track,
            roster: DEFAULT_ROSTER.to_vec(),
        }
    }
}

impl RaceSetup {
    pub fn new(config: RaceConfig, track: Track) -> Result<Self, ConfigError> {
        config.validate()?;
        if track.segment_length() != config.segment_length {
            return Err(ConfigError::SegmentLengthMismatch);
        }
        Ok(Self {
            config,
            track,
            roster: DEFAULT_ROSTER.to_vec(),
        })
    }

    pub fn with_roster(mut self, roster: Vec<OpponentTemplate>) -> Self {
        self.roster = roster;
        self
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn roster(&self) -> &[OpponentTemplate] {
        &self.roster
    }
}

/// Everything a driver gets to look at before choosing its controls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RaceSnapshot {
    pub tick: u32,
    pub player: Actor,
    pub opponents: Vec<Opponent>,
    pub total_length: f64,
    pub segment_length: f64,
    pub max_speed: f64,
    /// Lateral push per unit curvature at full speed.
    pub centrifugal: f64,
    pub total_laps: u32,
    /// Curvature of the player's segment followed by the next
    /// `LOOKAHEAD_SEGMENTS - 1`.
    pub upcoming_curvature: Vec<f64>,
    pub hud: HudSnapshot,
    pub running: bool,
    pub finished: bool,
}

#[derive(Clone, Debug)]
pub struct RaceSession {
    setup: RaceSetup,
    seed: u32,
    rng: SeededRng,
    player: Actor,
    opponents: Vec<Opponent>,
    state: RaceState,
    ticks: u32,
}

impl RaceSession {
    pub fn new(setup: RaceSetup, seed: u32) -> Self {
        let rng = SeededRng::new(seed);
        let player = starting_player(&setup.config);
        let mut session = Self {
            setup,
            seed,
            rng,
            player,
            opponents: Vec::new(),
            state: RaceState::default(),
            ticks: 0,
        };
        session.reset();
        session
    }

    pub fn with_seed(seed: u32) -> Self {
        Self::new(RaceSetup::default(), seed)
    }

    /// Puts the track, actors and race state back to their initial values.
    /// The field is drawn from the session seed, so repeated resets match.
    pub fn reset(&mut self) {
        self.rng = SeededRng::new(self.seed);
        self.player = starting_player(&self.setup.config);
        self.opponents = spawn_opponents(
            &self.setup.roster,
            self.setup.track.total_length(),
            &self.setup.config,
            &mut self.rng,
        );
        self.state = RaceState::default();
        self.ticks = 0;

        info!(
            seed = format_args!("0x{:08x}", self.seed),
            segments = self.setup.track.segment_count(),
            opponents = self.opponents.len(),
            "race reset"
        );
    }

    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
        self.reset();
    }

    /// Resets and starts the race clock.
    pub fn begin(&mut self) {
        self.reset();
        self.state.running = true;
        info!(total_laps = self.setup.config.total_laps, "race started");
    }

    /// Advances one tick. Returns the race-end event on the tick the race
    /// finishes. Before `begin` this is a no-op; after the finish the player
    /// only coasts.
    pub fn step(&mut self, dt: f64, controls: ControlState) -> Option<RaceEnd> {
        let config = &self.setup.config;
        let track = &self.setup.track;

        if self.state.finished {
            coast(&mut self.player, config, dt);
            return None;
        }
        if !self.state.running {
            return None;
        }

        self.ticks += 1;
        self.state.advance_clock(dt);

        let wraps = step_player(&mut self.player, controls, track, config, dt);
        for _ in 0..wraps {
            let lap_time = self.state.complete_lap();
            debug!(
                tick = self.ticks,
                completed_laps = self.player.completed_laps,
                lap_time = ?lap_time,
                best_lap = ?self.state.best_lap,
                "lap completed"
            );
        }

        step_opponents(
            &mut self.opponents,
            &mut self.player,
            track,
            config,
            self.state.lap_timer,
            dt,
        );

        let outcome = check_finish(&self.player, &self.opponents, config.total_laps)?;
        let winner = if outcome.victory {
            "player"
        } else {
            outcome.opponent_name.as_str()
        };
        info!(
            tick = self.ticks,
            victory = outcome.victory,
            winner,
            best_lap = ?self.state.best_lap,
            "race finished"
        );
        self.state.finish(outcome.clone());
        Some(outcome)
    }

    pub fn validate_invariants(&self) -> Result<(), RuleCode> {
        let config = &self.setup.config;
        let total_length = self.setup.track.total_length();

        if !within(self.player.offset, config.player_offset_limit) {
            return Err(RuleCode::PlayerOffsetBounds);
        }
        if self
            .opponents
            .iter()
            .any(|opponent| !within(opponent.actor.offset, config.opponent_offset_limit))
        {
            return Err(RuleCode::OpponentOffsetBounds);
        }

        let actors = core::iter::once(&self.player).chain(self.opponents.iter().map(|o| &o.actor));
        for actor in actors {
            if !(0.0..total_length).contains(&actor.position) {
                return Err(RuleCode::PositionRange);
            }
            if !(0.0..=config.max_speed).contains(&actor.speed) {
                return Err(RuleCode::SpeedRange);
            }
        }

        if self.state.lap_timer.is_nan() || self.state.lap_timer < 0.0 {
            return Err(RuleCode::LapTimerNegative);
        }
        if self.state.finished && self.state.running {
            return Err(RuleCode::FinishedWhileRunning);
        }

        Ok(())
    }

    pub fn rank(&self) -> usize {
        player_rank(&self.player, &self.opponents, self.setup.track.total_length())
    }

    pub fn standings(&self) -> Vec<Standing> {
        standings(&self.player, &self.opponents, self.setup.track.total_length())
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::new(
            self.player.completed_laps,
            self.setup.config.total_laps,
            self.state.lap_timer,
            self.state.best_lap,
            self.rank(),
            1 + self.opponents.len(),
        )
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        let track = &self.setup.track;
        let base = track.segment_index(self.player.position);
        let upcoming_curvature = (0..LOOKAHEAD_SEGMENTS)
            .map(|n| track.segment(base + n).curvature)
            .collect();

        RaceSnapshot {
            tick: self.ticks,
            player: self.player,
            opponents: self.opponents.clone(),
            total_length: track.total_length(),
            segment_length: track.segment_length(),
            max_speed: self.setup.config.max_speed,
            centrifugal: self.setup.config.centrifugal,
            total_laps: self.setup.config.total_laps,
            upcoming_curvature,
            hud: self.hud(),
            running: self.state.running,
            finished: self.state.finished,
        }
    }

    pub fn geometry(&self, viewport: Viewport) -> FrameGeometry {
        project_frame(
            &self.setup.track,
            &self.player,
            &self.opponents,
            &self.setup.config,
            viewport,
        )
    }

    pub fn setup(&self) -> &RaceSetup {
        &self.setup
    }

    pub fn config(&self) -> &RaceConfig {
        &self.setup.config
    }

    pub fn track(&self) -> &Track {
        &self.setup.track
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn player(&self) -> &Actor {
        &self.player
    }

    pub fn opponents(&self) -> &[Opponent] {
        &self.opponents
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    pub fn outcome(&self) -> Option<&RaceEnd> {
        self.state.outcome.as_ref()
    }
}

#[inline]
fn within(offset: f64, limit: f64) -> bool {
    offset.is_finite() && offset.abs() <= limit
}

#[cfg(test)]
mod tests;
