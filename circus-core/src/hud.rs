use core::fmt;

use serde::Serialize;

/// Race readout refreshed once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HudSnapshot {
    /// Lap currently being driven, never past `total_laps`.
    pub lap: u32,
    pub total_laps: u32,
    pub lap_time: f64,
    pub best_lap: Option<f64>,
    pub position: usize,
    pub entrants: usize,
}

impl HudSnapshot {
    pub fn new(
        completed_laps: u32,
        total_laps: u32,
        lap_time: f64,
        best_lap: Option<f64>,
        position: usize,
        entrants: usize,
    ) -> Self {
        Self {
            lap: (completed_laps + 1).min(total_laps),
            total_laps,
            lap_time,
            best_lap,
            position,
            entrants,
        }
    }

    pub fn lap_label(&self) -> String {
        format!("{} / {}", self.lap, self.total_laps)
    }

    pub fn lap_time_label(&self) -> String {
        format_time(self.lap_time)
    }

    pub fn best_lap_label(&self) -> String {
        self.best_lap.map_or_else(|| "--".to_string(), format_time)
    }

    pub fn position_label(&self) -> String {
        format!("{} / {}", self.position, self.entrants)
    }
}

impl fmt::Display for HudSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lap {} | time {} | best {} | pos {}",
            self.lap_label(),
            self.lap_time_label(),
            self.best_lap_label(),
            self.position_label()
        )
    }
}

/// `m:ss.ss` once a minute has passed, seconds with an `s` suffix before that.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "--".to_string();
    }

    let minutes = (seconds / 60.0).floor();
    let remainder = seconds % 60.0;
    if minutes > 0.0 {
        format!("{}:{:05.2}", minutes as u64, remainder)
    } else {
        format!("{remainder:.2}s")
    }
}
