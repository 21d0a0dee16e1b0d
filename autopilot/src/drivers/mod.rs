use circus_core::rng::SeededRng;
use circus_core::{ControlState, RaceSnapshot};
use serde::Serialize;

use crate::util::fnv1a_hex;

mod roster;

pub trait Driver {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn reset(&mut self, seed: u32);
    fn controls(&mut self, snapshot: &RaceSnapshot) -> ControlState;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Idle,
    FlatOut,
    LineKeeper,
    LateBraker,
    Weaver,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct DriverProfile {
    pub id: &'static str,
    pub description: &'static str,
    pub style: Style,
    /// Preferred lateral offset on straights.
    pub lane: f64,
    /// Segments of curvature averaged when predicting drift.
    pub lookahead_segments: usize,
    /// Seconds of centrifugal drift anticipated by the steering.
    pub drift_horizon: f64,
    /// Offset error tolerated before steering.
    pub deadband: f64,
    /// Speed ratio above which a sharp bend ahead triggers braking.
    pub brake_speed_ratio: f64,
    /// Absolute curvature counted as a sharp bend.
    pub brake_curvature: f64,
    /// Move aside when an opponent is blocking just ahead.
    pub dodge: bool,
    pub weave_hold_ticks: u32,
    pub weave_span: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct DriverManifestEntry {
    pub id: String,
    pub style: Style,
    pub description: String,
    pub profile_hash: String,
    pub profile: serde_json::Value,
}

const DODGE_WINDOW_SEGMENTS: f64 = 5.0;
const DODGE_OFFSET_GAP: f64 = 0.18;
const DODGE_SHIFT: f64 = 0.35;
const LANE_LIMIT: f64 = 0.8;

pub struct ProfileDriver {
    profile: DriverProfile,
    rng: SeededRng,
    weave_lane: f64,
    weave_ticks_left: u32,
}

impl ProfileDriver {
    pub fn new(profile: DriverProfile) -> Self {
        Self {
            profile,
            rng: SeededRng::new(1),
            weave_lane: profile.lane,
            weave_ticks_left: 0,
        }
    }

    pub fn profile(&self) -> &DriverProfile {
        &self.profile
    }

    fn target_lane(&mut self, snapshot: &RaceSnapshot) -> f64 {
        let mut lane = match self.profile.style {
            Style::Weaver => {
                if self.weave_ticks_left == 0 {
                    self.weave_lane = self
                        .rng
                        .next_range(-self.profile.weave_span, self.profile.weave_span);
                    self.weave_ticks_left = self.profile.weave_hold_ticks.max(1);
                }
                self.weave_ticks_left -= 1;
                self.weave_lane
            }
            _ => self.profile.lane,
        };

        if self.profile.dodge {
            if let Some(blocker) = blocking_offset(snapshot, lane) {
                lane += if blocker > lane { -DODGE_SHIFT } else { DODGE_SHIFT };
            }
        }

        lane.clamp(-LANE_LIMIT, LANE_LIMIT)
    }

    fn steer_toward(&self, snapshot: &RaceSnapshot, lane: f64) -> (bool, bool) {
        let speed_ratio = snapshot.player.speed / snapshot.max_speed;
        let bend = mean_curvature(&snapshot.upcoming_curvature, self.profile.lookahead_segments);
        let drift = -bend * snapshot.centrifugal * speed_ratio * self.profile.drift_horizon;
        let error = snapshot.player.offset + drift - lane;

        (error > self.profile.deadband, error < -self.profile.deadband)
    }

    fn bend_ahead_too_sharp(&self, snapshot: &RaceSnapshot) -> bool {
        let speed_ratio = snapshot.player.speed / snapshot.max_speed;
        speed_ratio > self.profile.brake_speed_ratio
            && snapshot
                .upcoming_curvature
                .iter()
                .take(self.profile.lookahead_segments.max(1))
                .any(|curvature| curvature.abs() >= self.profile.brake_curvature)
    }
}

impl Driver for ProfileDriver {
    fn id(&self) -> &'static str {
        self.profile.id
    }

    fn description(&self) -> &'static str {
        self.profile.description
    }

    fn reset(&mut self, seed: u32) {
        self.rng = SeededRng::new(seed ^ 0x57EE_D0A7);
        self.weave_lane = self.profile.lane;
        self.weave_ticks_left = 0;
    }

    fn controls(&mut self, snapshot: &RaceSnapshot) -> ControlState {
        match self.profile.style {
            Style::Idle => ControlState::IDLE,
            Style::FlatOut => ControlState {
                accelerate: true,
                ..ControlState::IDLE
            },
            Style::LineKeeper | Style::LateBraker | Style::Weaver => {
                let lane = self.target_lane(snapshot);
                let (left, right) = self.steer_toward(snapshot, lane);
                let brake =
                    self.profile.style == Style::LateBraker && self.bend_ahead_too_sharp(snapshot);
                ControlState {
                    accelerate: !brake,
                    brake,
                    left,
                    right,
                }
            }
        }
    }
}

fn mean_curvature(upcoming: &[f64], lookahead: usize) -> f64 {
    let window = &upcoming[..lookahead.max(1).min(upcoming.len())];
    if window.is_empty() {
        return 0.0;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// Offset of the nearest opponent just ahead in our intended lane.
fn blocking_offset(snapshot: &RaceSnapshot, lane: f64) -> Option<f64> {
    let window = snapshot.segment_length * DODGE_WINDOW_SEGMENTS;
    snapshot
        .opponents
        .iter()
        .filter_map(|opponent| {
            let gap = (opponent.actor.position - snapshot.player.position)
                .rem_euclid(snapshot.total_length);
            let blocking = gap > 0.0
                && gap < window
                && (opponent.actor.offset - lane).abs() < DODGE_OFFSET_GAP;
            blocking.then_some((gap, opponent.actor.offset))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, offset)| offset)
}

pub fn driver_ids() -> Vec<&'static str> {
    roster::driver_profiles()
        .iter()
        .map(|profile| profile.id)
        .collect()
}

pub fn describe_drivers() -> Vec<(&'static str, &'static str)> {
    roster::driver_profiles()
        .iter()
        .map(|profile| (profile.id, profile.description))
        .collect()
}

pub fn create_driver(id: &str) -> Option<Box<dyn Driver + Send>> {
    roster::find_profile(id)
        .map(|profile| -> Box<dyn Driver + Send> { Box::new(ProfileDriver::new(profile)) })
}

pub fn driver_fingerprint(id: &str) -> Option<String> {
    let profile = roster::find_profile(id)?;
    let encoded = serde_json::to_vec(&profile).ok()?;
    Some(fnv1a_hex(&encoded))
}

pub fn driver_manifest_entries() -> Vec<DriverManifestEntry> {
    roster::driver_profiles()
        .iter()
        .map(|profile| {
            let value = serde_json::to_value(profile).unwrap_or(serde_json::Value::Null);
            DriverManifestEntry {
                id: profile.id.to_string(),
                style: profile.style,
                description: profile.description.to_string(),
                profile_hash: driver_fingerprint(profile.id).unwrap_or_default(),
                profile: value,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use circus_core::RaceSession;

    fn snapshot_with(offset: f64, speed_ratio: f64, curvature: f64) -> RaceSnapshot {
        let session = RaceSession::with_seed(3);
        let mut snapshot = session.snapshot();
        snapshot.player.offset = offset;
        snapshot.player.speed = snapshot.max_speed * speed_ratio;
        snapshot.opponents.clear();
        for value in snapshot.upcoming_curvature.iter_mut() {
            *value = curvature;
        }
        snapshot
    }

    fn driver(id: &str) -> ProfileDriver {
        let profile = roster::find_profile(id).expect("profile exists");
        let mut driver = ProfileDriver::new(profile);
        driver.reset(11);
        driver
    }

    #[test]
    fn registry_ids_are_unique_and_resolvable() {
        let ids = driver_ids();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
        for id in ids {
            assert_eq!(create_driver(id).map(|d| d.id()), Some(id));
            assert!(driver_fingerprint(id).is_some());
        }
        assert!(create_driver("nobody").is_none());
    }

    #[test]
    fn line_keeper_steers_back_to_center() {
        let mut keeper = driver("line-keeper");
        let wide_right = keeper.controls(&snapshot_with(0.5, 0.5, 0.0));
        assert!(wide_right.left && !wide_right.right && wide_right.accelerate);
        let wide_left = keeper.controls(&snapshot_with(-0.5, 0.5, 0.0));
        assert!(wide_left.right && !wide_left.left);
    }

    #[test]
    fn line_keeper_counter_steers_in_bends() {
        let mut keeper = driver("line-keeper");
        let controls = keeper.controls(&snapshot_with(0.0, 1.0, 1.0));
        assert!(controls.right);
    }

    #[test]
    fn counter_steer_scales_with_configured_centrifugal() {
        let mut keeper = driver("line-keeper");
        let mut snapshot = snapshot_with(0.0, 1.0, 0.05);
        let gentle = keeper.controls(&snapshot);
        assert!(!gentle.left && !gentle.right);

        snapshot.centrifugal *= 4.0;
        let strong = keeper.controls(&snapshot);
        assert!(strong.right && !strong.left);

        let mut sharp = snapshot_with(0.0, 1.0, 1.0);
        sharp.centrifugal = 0.0;
        let none = keeper.controls(&sharp);
        assert!(!none.left && !none.right);
    }

    #[test]
    fn late_braker_brakes_for_sharp_bends_at_speed() {
        let mut braker = driver("late-braker");
        let fast = braker.controls(&snapshot_with(0.0, 0.95, 1.1));
        assert!(fast.brake && !fast.accelerate);
        let slow = braker.controls(&snapshot_with(0.0, 0.3, 1.1));
        assert!(!slow.brake && slow.accelerate);
    }

    #[test]
    fn weaver_is_reproducible_per_seed() {
        let snapshot = snapshot_with(0.0, 0.5, 0.0);
        let mut first = driver("weaver");
        let mut second = driver("weaver");
        for _ in 0..500 {
            assert_eq!(first.controls(&snapshot), second.controls(&snapshot));
        }
    }

    #[test]
    fn dodge_moves_away_from_blocker() {
        let mut braker = driver("late-braker");
        let mut snapshot = snapshot_with(0.0, 0.5, 0.0);
        let session = RaceSession::with_seed(3);
        let mut blocker = session.opponents()[0].clone();
        blocker.actor.position = snapshot.player.position + snapshot.segment_length * 2.0;
        blocker.actor.offset = 0.05;
        snapshot.opponents = vec![blocker];

        let lane = braker.target_lane(&snapshot);
        assert!(lane < 0.0);
    }
}
