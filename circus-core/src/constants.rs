use core::f64::consts::PI;

// Track geometry
pub const SEGMENT_LENGTH: f64 = 90.0;
pub const DRAW_DISTANCE: usize = 160;
pub const RUMBLE_LENGTH: usize = 3;
pub const ROAD_WIDTH: f64 = 1_000.0;
pub const CURVE_SCALE: f64 = 0.0011;

// Camera
pub const FIELD_OF_VIEW: f64 = PI / 3.0;
pub const CAMERA_HEIGHT: f64 = 1_400.0;
/// Anything at or closer than this depth is treated as behind the camera.
pub const NEAR_PLANE: f64 = 0.1;

// Player vehicle
pub const MAX_SPEED: f64 = SEGMENT_LENGTH * 55.0;
pub const ACCELERATION: f64 = MAX_SPEED / 2.2;
pub const BRAKE_DECEL: f64 = MAX_SPEED;
pub const DRAG: f64 = MAX_SPEED / 6.5;
pub const OFF_ROAD_DECEL: f64 = MAX_SPEED * 1.3;
pub const OFF_ROAD_LIMIT: f64 = MAX_SPEED * 0.6;
pub const OFF_ROAD_EXCESS_FACTOR: f64 = 0.02;
pub const CENTRIFUGAL: f64 = 1.25;
pub const STEER_GAIN: f64 = 1.4;
pub const BASE_TURN_FACTOR: f64 = 0.2;
pub const PLAYER_OFFSET_LIMIT: f64 = 1.35;
pub const TRACK_HALF_WIDTH: f64 = 1.0;
pub const PLAYER_START_SEGMENTS: f64 = 2.0;

// Opponents
pub const OPPONENT_OFFSET_LIMIT: f64 = 0.95;
pub const OPPONENT_ACCEL_SHARE: f64 = 0.6;
pub const OPPONENT_DRAG_SHARE: f64 = 0.5;
pub const OPPONENT_CRUISE_FLOOR: f64 = 0.92;
pub const OPPONENT_CENTRIFUGAL_SHARE: f64 = 0.6;
pub const OPPONENT_START_SPEED_RATIO: f64 = 0.5;
pub const OPPONENT_GRID_SPREAD: f64 = 0.6;
pub const LANE_DRIFT_AMPLITUDE: f64 = 0.05;
pub const LANE_EASE_RATE: f64 = 1.5;
pub const OSCILLATION_RATE_MIN: f64 = 0.8;
pub const OSCILLATION_RATE_SPREAD: f64 = 0.4;

// Shoves
pub const PLAYER_SHOVE_WINDOW_SEGMENTS: f64 = 4.0;
pub const PLAYER_SHOVE_THRESHOLD: f64 = 0.12;
pub const PLAYER_SHOVE_STRENGTH: f64 = 0.6;
pub const PLAYER_SHOVE_OPPONENT_SHARE: f64 = 0.6;
pub const PAIR_SHOVE_WINDOW_SEGMENTS: f64 = 2.0;
pub const PAIR_SHOVE_THRESHOLD: f64 = 0.1;
pub const PAIR_SHOVE_STRENGTH: f64 = 0.5;

// Race
pub const TOTAL_LAPS: u32 = 3;
pub const FRAME_CAP_SECONDS: f64 = 0.1;

// Viewport used when the harness has no real surface.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 960.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 540.0;
