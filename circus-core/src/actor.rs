use serde::{Deserialize, Serialize};

use crate::config::RaceConfig;
use crate::constants::{
    OPPONENT_GRID_SPREAD, OPPONENT_START_SPEED_RATIO, OSCILLATION_RATE_MIN,
    OSCILLATION_RATE_SPREAD, PLAYER_START_SEGMENTS,
};
use crate::render::Color;
use crate::rng::SeededRng;

/// Longitudinal/lateral state shared by the player and every opponent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub position: f64,
    pub offset: f64,
    pub speed: f64,
    pub completed_laps: u32,
}

impl Actor {
    pub fn at(position: f64, offset: f64, speed: f64) -> Self {
        Self {
            position,
            offset,
            speed,
            completed_laps: 0,
        }
    }

    /// Moves forward by `distance` and returns how many times the start line
    /// was crossed. Every crossing is counted, however large the step.
    pub fn advance(&mut self, distance: f64, total_length: f64) -> u32 {
        self.position += distance;
        let mut wraps = 0;
        while self.position >= total_length {
            self.position -= total_length;
            wraps += 1;
        }
        self.completed_laps += wraps;
        wraps
    }

    /// Race distance covered, used for standings.
    #[inline]
    pub fn progress(&self, total_length: f64) -> f64 {
        f64::from(self.completed_laps) * total_length + self.position
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub actor: Actor,
    pub max_speed: f64,
    pub base_lane: f64,
    pub color: Color,
    pub name: String,
    pub oscillation_phase: f64,
    pub oscillation_rate: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpponentTemplate {
    pub name: &'static str,
    pub lane: f64,
    pub speed_ratio: f64,
    pub color: Color,
}

pub const DEFAULT_ROSTER: [OpponentTemplate; 3] = [
    OpponentTemplate {
        name: "Aurelius",
        lane: -0.45,
        speed_ratio: 0.9,
        color: Color::hex(0xd4553d),
    },
    OpponentTemplate {
        name: "Cassia",
        lane: 0.2,
        speed_ratio: 0.92,
        color: Color::hex(0x4a8cc5),
    },
    OpponentTemplate {
        name: "Decimus",
        lane: 0.55,
        speed_ratio: 0.95,
        color: Color::hex(0xc4b05a),
    },
];

pub fn starting_player(config: &RaceConfig) -> Actor {
    Actor::at(config.segment_length * PLAYER_START_SEGMENTS, 0.0, 0.0)
}

/// Lays the roster out on the grid ahead of the player. Weave phase and rate
/// come from `rng`, so a fixed seed yields an identical field.
pub fn spawn_opponents(
    roster: &[OpponentTemplate],
    total_length: f64,
    config: &RaceConfig,
    rng: &mut SeededRng,
) -> Vec<Opponent> {
    if roster.is_empty() {
        return Vec::new();
    }

    let spacing = total_length / roster.len() as f64;
    roster
        .iter()
        .enumerate()
        .map(|(index, template)| {
            let oscillation_phase = rng.next_unit() * core::f64::consts::TAU;
            let oscillation_rate = OSCILLATION_RATE_MIN + rng.next_unit() * OSCILLATION_RATE_SPREAD;
            Opponent {
                actor: Actor::at(
                    (index + 1) as f64 * spacing * OPPONENT_GRID_SPREAD,
                    template.lane,
                    config.max_speed * OPPONENT_START_SPEED_RATIO,
                ),
                max_speed: config.max_speed * template.speed_ratio,
                base_lane: template.lane,
                color: template.color,
                name: template.name.to_string(),
                oscillation_phase,
                oscillation_rate,
            }
        })
        .collect()
}
