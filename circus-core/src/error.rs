use core::fmt;

/// Invariant checked by `RaceSession::validate_invariants` after every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    PlayerOffsetBounds,
    OpponentOffsetBounds,
    PositionRange,
    SpeedRange,
    LapTimerNegative,
    FinishedWhileRunning,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerOffsetBounds => write!(f, "PLAYER_OFFSET_BOUNDS"),
            Self::OpponentOffsetBounds => write!(f, "OPPONENT_OFFSET_BOUNDS"),
            Self::PositionRange => write!(f, "POSITION_RANGE"),
            Self::SpeedRange => write!(f, "SPEED_RANGE"),
            Self::LapTimerNegative => write!(f, "LAP_TIMER_NEGATIVE"),
            Self::FinishedWhileRunning => write!(f, "FINISHED_WHILE_RUNNING"),
        }
    }
}

impl std::error::Error for RuleCode {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackError {
    EmptyBlueprint,
    ZeroLengthRun { run: usize },
    NonFiniteCurvature { run: usize },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBlueprint => write!(f, "track blueprint has no runs"),
            Self::ZeroLengthRun { run } => write!(f, "blueprint run {run} has zero length"),
            Self::NonFiniteCurvature { run } => {
                write!(f, "blueprint run {run} has a non-finite curvature")
            }
        }
    }
}

impl std::error::Error for TrackError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    NonPositive { field: &'static str },
    FieldOfViewRange,
    ZeroLaps,
    /// The track was built at a different segment length than the config.
    SegmentLengthMismatch,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { field } => write!(f, "config field {field} must be positive"),
            Self::FieldOfViewRange => write!(f, "field_of_view must be in (0, pi)"),
            Self::ZeroLaps => write!(f, "total_laps must be at least 1"),
            Self::SegmentLengthMismatch => {
                write!(f, "track segment length does not match config segment_length")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
