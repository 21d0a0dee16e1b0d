use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;

/// Every tunable the simulation and projection read.
///
/// `RaceConfig::default()` reproduces the authored constants; harnesses may
/// load a partial JSON document and rely on `#[serde(default)]` for the rest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub segment_length: f64,
    pub draw_distance: usize,
    pub rumble_length: usize,
    pub road_width: f64,
    pub curve_scale: f64,
    pub field_of_view: f64,
    pub camera_height: f64,

    pub max_speed: f64,
    pub acceleration: f64,
    pub brake_decel: f64,
    pub drag: f64,
    pub off_road_decel: f64,
    pub off_road_limit: f64,
    pub off_road_excess_factor: f64,
    pub centrifugal: f64,
    pub steer_gain: f64,
    pub base_turn_factor: f64,
    pub player_offset_limit: f64,

    pub opponent_offset_limit: f64,
    pub opponent_accel_share: f64,
    pub opponent_drag_share: f64,
    pub opponent_cruise_floor: f64,
    pub opponent_centrifugal_share: f64,
    pub lane_drift_amplitude: f64,
    pub lane_ease_rate: f64,

    pub player_shove_window_segments: f64,
    pub player_shove_threshold: f64,
    pub player_shove_strength: f64,
    pub player_shove_opponent_share: f64,
    pub pair_shove_window_segments: f64,
    pub pair_shove_threshold: f64,
    pub pair_shove_strength: f64,

    pub total_laps: u32,
    pub frame_cap_seconds: f64,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            segment_length: SEGMENT_LENGTH,
            draw_distance: DRAW_DISTANCE,
            rumble_length: RUMBLE_LENGTH,
            road_width: ROAD_WIDTH,
            curve_scale: CURVE_SCALE,
            field_of_view: FIELD_OF_VIEW,
            camera_height: CAMERA_HEIGHT,

            max_speed: MAX_SPEED,
            acceleration: ACCELERATION,
            brake_decel: BRAKE_DECEL,
            drag: DRAG,
            off_road_decel: OFF_ROAD_DECEL,
            off_road_limit: OFF_ROAD_LIMIT,
            off_road_excess_factor: OFF_ROAD_EXCESS_FACTOR,
            centrifugal: CENTRIFUGAL,
            steer_gain: STEER_GAIN,
            base_turn_factor: BASE_TURN_FACTOR,
            player_offset_limit: PLAYER_OFFSET_LIMIT,

            opponent_offset_limit: OPPONENT_OFFSET_LIMIT,
            opponent_accel_share: OPPONENT_ACCEL_SHARE,
            opponent_drag_share: OPPONENT_DRAG_SHARE,
            opponent_cruise_floor: OPPONENT_CRUISE_FLOOR,
            opponent_centrifugal_share: OPPONENT_CENTRIFUGAL_SHARE,
            lane_drift_amplitude: LANE_DRIFT_AMPLITUDE,
            lane_ease_rate: LANE_EASE_RATE,

            player_shove_window_segments: PLAYER_SHOVE_WINDOW_SEGMENTS,
            player_shove_threshold: PLAYER_SHOVE_THRESHOLD,
            player_shove_strength: PLAYER_SHOVE_STRENGTH,
            player_shove_opponent_share: PLAYER_SHOVE_OPPONENT_SHARE,
            pair_shove_window_segments: PAIR_SHOVE_WINDOW_SEGMENTS,
            pair_shove_threshold: PAIR_SHOVE_THRESHOLD,
            pair_shove_strength: PAIR_SHOVE_STRENGTH,

            total_laps: TOTAL_LAPS,
            frame_cap_seconds: FRAME_CAP_SECONDS,
        }
    }
}

impl RaceConfig {
    /// `1 / tan(fov / 2)`, the projection plane distance.
    #[inline]
    pub fn camera_depth(&self) -> f64 {
        1.0 / (self.field_of_view / 2.0).tan()
    }

    /// How far behind the player the camera sits.
    #[inline]
    pub fn player_z(&self) -> f64 {
        self.camera_depth() * self.camera_height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("segment_length", self.segment_length),
            ("road_width", self.road_width),
            ("camera_height", self.camera_height),
            ("max_speed", self.max_speed),
            ("frame_cap_seconds", self.frame_cap_seconds),
            ("player_offset_limit", self.player_offset_limit),
            ("opponent_offset_limit", self.opponent_offset_limit),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field });
            }
        }

        if !(self.field_of_view > 0.0 && self.field_of_view < core::f64::consts::PI) {
            return Err(ConfigError::FieldOfViewRange);
        }
        if self.draw_distance == 0 {
            return Err(ConfigError::NonPositive {
                field: "draw_distance",
            });
        }
        if self.rumble_length == 0 {
            return Err(ConfigError::NonPositive {
                field: "rumble_length",
            });
        }
        if self.total_laps == 0 {
            return Err(ConfigError::ZeroLaps);
        }

        Ok(())
    }
}
