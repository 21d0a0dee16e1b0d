pub mod actor;
pub mod agents;
pub mod config;
pub mod constants;
pub mod control;
pub mod dynamics;
pub mod error;
pub mod frame;
pub mod hud;
pub mod progression;
pub mod projection;
pub mod render;
pub mod replay;
pub mod rng;
pub mod session;
pub mod track;

pub use actor::{Actor, Opponent, OpponentTemplate, DEFAULT_ROSTER};
pub use config::RaceConfig;
pub use control::{decode_control_byte, encode_control_byte, ControlState};
pub use error::{ConfigError, RuleCode, TrackError};
pub use frame::{ControlSource, FixedClock, FrameLoop, InputTape, TickOutcome, TimingSource};
pub use hud::{format_time, HudSnapshot};
pub use progression::{RaceEnd, RaceState, Standing};
pub use projection::{FrameGeometry, Viewport};
pub use render::{render_frame, CommandRecorder, DrawCommand, RenderSurface};
pub use replay::{replay, replay_strict, replay_with_checkpoints, RaceCheckpoint, ReplayResult};
pub use session::{RaceSession, RaceSetup, RaceSnapshot};
pub use track::{Run, Track, DEFAULT_BLUEPRINT};
