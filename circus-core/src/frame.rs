//! Frame orchestration: one step and one render per timing callback.

use serde::Serialize;
use tracing::trace;

use crate::control::{decode_control_byte, ControlState};
use crate::render::{render_frame, RenderSurface};
use crate::session::RaceSession;

/// Delivers monotonically increasing timestamps in milliseconds. `None`
/// means the source has shut down.
pub trait TimingSource {
    fn next_timestamp(&mut self) -> Option<f64>;
}

/// Current state of the player's controls, sampled once per tick.
pub trait ControlSource {
    fn sample(&mut self) -> ControlState;
}

impl ControlSource for ControlState {
    fn sample(&mut self) -> ControlState {
        *self
    }
}

/// Timing source ticking at a fixed interval, optionally for a bounded
/// number of frames.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    now_ms: f64,
    interval_ms: f64,
    remaining: Option<u32>,
}

impl FixedClock {
    pub fn new(start_ms: f64, interval_ms: f64) -> Self {
        Self {
            now_ms: start_ms,
            interval_ms,
            remaining: None,
        }
    }

    pub fn limited(start_ms: f64, interval_ms: f64, frames: u32) -> Self {
        Self {
            remaining: Some(frames),
            ..Self::new(start_ms, interval_ms)
        }
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }
}

impl TimingSource for FixedClock {
    fn next_timestamp(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        self.now_ms += self.interval_ms;
        Some(self.now_ms)
    }
}

/// Plays back recorded control bytes, then holds idle.
#[derive(Clone, Debug)]
pub struct InputTape<'a> {
    inputs: &'a [u8],
    cursor: usize,
}

impl<'a> InputTape<'a> {
    pub fn new(inputs: &'a [u8]) -> Self {
        Self { inputs, cursor: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl ControlSource for InputTape<'_> {
    fn sample(&mut self) -> ControlState {
        match self.inputs.get(self.cursor) {
            Some(byte) => {
                self.cursor += 1;
                decode_control_byte(*byte)
            }
            None => ControlState::IDLE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TickOutcome {
    Continue,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LoopSummary {
    pub frames: u32,
    pub simulated_seconds: f64,
    pub finished: bool,
}

/// Owns the session and the last timestamp seen. Stopping is cooperative:
/// once the session is no longer running `tick` declines to continue.
#[derive(Clone, Debug)]
pub struct FrameLoop {
    session: RaceSession,
    last_timestamp: Option<f64>,
    frames: u32,
    simulated_seconds: f64,
}

impl FrameLoop {
    pub fn new(session: RaceSession) -> Self {
        Self {
            session,
            last_timestamp: None,
            frames: 0,
            simulated_seconds: 0.0,
        }
    }

    /// Resets the race and paints a single paused frame.
    pub fn reset(&mut self, surface: &mut dyn RenderSurface) {
        self.session.reset();
        self.last_timestamp = None;
        self.frames = 0;
        self.simulated_seconds = 0.0;
        render_frame(&self.session, surface);
    }

    /// Starts the race with `now_ms` as the reference for the first delta.
    pub fn begin(&mut self, now_ms: f64) {
        self.session.begin();
        self.last_timestamp = Some(now_ms);
        self.frames = 0;
        self.simulated_seconds = 0.0;
    }

    pub fn tick(
        &mut self,
        timestamp_ms: f64,
        controls: ControlState,
        surface: &mut dyn RenderSurface,
    ) -> TickOutcome {
        if !self.session.is_running() {
            return TickOutcome::Stopped;
        }

        let dt = self.frame_delta(timestamp_ms);
        self.session.step(dt, controls);
        render_frame(&self.session, surface);
        self.frames += 1;
        self.simulated_seconds += dt;

        if self.session.is_running() {
            TickOutcome::Continue
        } else {
            TickOutcome::Stopped
        }
    }

    /// Drives ticks until the race stops or the timing source runs dry.
    pub fn run(
        &mut self,
        timing: &mut dyn TimingSource,
        controls: &mut dyn ControlSource,
        surface: &mut dyn RenderSurface,
    ) -> LoopSummary {
        while self.session.is_running() {
            let Some(timestamp) = timing.next_timestamp() else {
                break;
            };
            if self.tick(timestamp, controls.sample(), surface) == TickOutcome::Stopped {
                break;
            }
        }

        LoopSummary {
            frames: self.frames,
            simulated_seconds: self.simulated_seconds,
            finished: self.session.is_finished(),
        }
    }

    fn frame_delta(&mut self, timestamp_ms: f64) -> f64 {
        let last = self.last_timestamp.replace(timestamp_ms).unwrap_or(timestamp_ms);
        let raw = ((timestamp_ms - last) / 1000.0).max(0.0);
        let cap = self.session.config().frame_cap_seconds;
        if raw > cap {
            trace!(raw, cap, "frame delta clamped");
            cap
        } else {
            raw
        }
    }

    pub fn session(&self) -> &RaceSession {
        &self.session
    }

    pub fn into_session(self) -> RaceSession {
        self.session
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Viewport;
    use crate::render::CommandRecorder;

    fn recorder() -> CommandRecorder {
        CommandRecorder::new(Viewport::new(320.0, 180.0))
    }

    #[test]
    fn stall_is_capped_at_frame_cap() {
        let mut frame_loop = FrameLoop::new(RaceSession::with_seed(5));
        let mut surface = recorder();
        frame_loop.begin(1_000.0);
        frame_loop.tick(
            6_000.0,
            ControlState {
                accelerate: true,
                ..ControlState::IDLE
            },
            &mut surface,
        );

        let state = frame_loop.session().state();
        assert!((state.lap_timer - 0.1).abs() < 1e-12);
    }

    #[test]
    fn backwards_timestamp_is_a_zero_step() {
        let mut frame_loop = FrameLoop::new(RaceSession::with_seed(5));
        let mut surface = recorder();
        frame_loop.begin(1_000.0);
        frame_loop.tick(990.0, ControlState::IDLE, &mut surface);
        assert_eq!(frame_loop.session().state().lap_timer, 0.0);
    }

    #[test]
    fn tick_without_begin_is_stopped() {
        let mut frame_loop = FrameLoop::new(RaceSession::with_seed(5));
        let mut surface = recorder();
        assert_eq!(
            frame_loop.tick(16.0, ControlState::IDLE, &mut surface),
            TickOutcome::Stopped
        );
        assert!(surface.commands.is_empty());
    }

    #[test]
    fn reset_paints_one_paused_frame() {
        let mut frame_loop = FrameLoop::new(RaceSession::with_seed(5));
        let mut surface = recorder();
        frame_loop.reset(&mut surface);
        assert!(!surface.commands.is_empty());
        assert!(!frame_loop.session().is_running());
    }

    #[test]
    fn input_tape_holds_idle_when_exhausted() {
        let mut tape = InputTape::new(&[0x01, 0x09]);
        assert!(tape.sample().accelerate);
        assert!(tape.sample().right);
        assert_eq!(tape.sample(), ControlState::IDLE);
        assert_eq!(tape.consumed(), 2);
    }

    #[test]
    fn limited_clock_runs_dry() {
        let mut clock = FixedClock::limited(0.0, 16.0, 2);
        assert_eq!(clock.next_timestamp(), Some(16.0));
        assert_eq!(clock.next_timestamp(), Some(32.0));
        assert_eq!(clock.next_timestamp(), None);
    }
}
