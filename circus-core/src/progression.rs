use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Opponent};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RaceState {
    pub lap_timer: f64,
    pub best_lap: Option<f64>,
    /// Seconds since the start signal.
    pub race_clock: f64,
    pub running: bool,
    pub finished: bool,
    pub outcome: Option<RaceEnd>,
}

/// Emitted once when the race ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceEnd {
    pub victory: bool,
    /// Winning opponent on defeat, empty on victory.
    pub opponent_name: String,
}

impl RaceEnd {
    pub fn victory() -> Self {
        Self {
            victory: true,
            opponent_name: String::new(),
        }
    }

    pub fn defeat(opponent_name: &str) -> Self {
        Self {
            victory: false,
            opponent_name: opponent_name.to_string(),
        }
    }

    pub fn message(&self) -> &'static str {
        if self.victory {
            "You won the laurels!"
        } else {
            "Defeat!"
        }
    }

    pub fn heading(&self) -> &'static str {
        if self.victory {
            "Victory in the Circus!"
        } else {
            "Another Faction Prevails"
        }
    }

    pub fn summary(&self) -> String {
        if self.victory {
            "The crowd roars as your horses thunder past the marble podium.".to_string()
        } else {
            format!(
                "{} seized the laurel wreath this time. Adjust your lines and challenge the arena once more.",
                self.opponent_name
            )
        }
    }
}

impl RaceState {
    pub fn advance_clock(&mut self, dt: f64) {
        self.lap_timer += dt;
        self.race_clock += dt;
    }

    /// Closes the current lap and returns its time when one was recorded.
    pub fn complete_lap(&mut self) -> Option<f64> {
        let recorded = if self.lap_timer > 0.0 {
            let lap_time = self.lap_timer;
            if self.best_lap.map_or(true, |best| lap_time < best) {
                self.best_lap = Some(lap_time);
            }
            Some(lap_time)
        } else {
            None
        };
        self.lap_timer = 0.0;
        recorded
    }

    pub fn finish(&mut self, outcome: RaceEnd) {
        self.finished = true;
        self.running = false;
        self.outcome = Some(outcome);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Standing {
    pub name: String,
    pub is_player: bool,
    pub completed_laps: u32,
    pub progress: f64,
}

pub const PLAYER_NAME: &str = "You";

/// Player first, then opponents, ordered by race distance. Ties keep entry
/// order, so the player holds a dead heat.
pub fn standings(player: &Actor, opponents: &[Opponent], total_length: f64) -> Vec<Standing> {
    let mut table = Vec::with_capacity(opponents.len() + 1);
    table.push(Standing {
        name: PLAYER_NAME.to_string(),
        is_player: true,
        completed_laps: player.completed_laps,
        progress: player.progress(total_length),
    });
    table.extend(opponents.iter().map(|opponent| Standing {
        name: opponent.name.clone(),
        is_player: false,
        completed_laps: opponent.actor.completed_laps,
        progress: opponent.actor.progress(total_length),
    }));
    table.sort_by(|a, b| b.progress.total_cmp(&a.progress));
    table
}

/// 1-based rank among `1 + opponents.len()` entrants.
pub fn player_rank(player: &Actor, opponents: &[Opponent], total_length: f64) -> usize {
    let progress = player.progress(total_length);
    1 + opponents
        .iter()
        .filter(|opponent| opponent.actor.progress(total_length) > progress)
        .count()
}

/// Defeat is checked first and only when the player is still short of the
/// distance, so a shared finish goes to the player.
pub fn check_finish(player: &Actor, opponents: &[Opponent], total_laps: u32) -> Option<RaceEnd> {
    if player.completed_laps < total_laps {
        if let Some(winner) = opponents
            .iter()
            .find(|opponent| opponent.actor.completed_laps >= total_laps)
        {
            return Some(RaceEnd::defeat(&winner.name));
        }
        return None;
    }

    Some(RaceEnd::victory())
}
