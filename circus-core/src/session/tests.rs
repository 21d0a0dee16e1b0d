use super::*;
use crate::control::decode_control_byte;

const DT: f64 = 1.0 / 60.0;
const SEED: u32 = 0xC1C0_5EED;

fn started() -> RaceSession {
    let mut session = RaceSession::with_seed(SEED);
    session.begin();
    session
}

fn flat_out() -> ControlState {
    ControlState {
        accelerate: true,
        ..ControlState::IDLE
    }
}

fn assert_invariant_violation(mutator: impl FnOnce(&mut RaceSession), expected: RuleCode) {
    let mut session = started();
    mutator(&mut session);
    assert_eq!(session.validate_invariants(), Err(expected));
}

#[test]
fn invariants_hold_through_a_long_mixed_input_race() {
    let mut session = started();
    session
        .validate_invariants()
        .expect("initial state must be valid");

    let mut rng = SeededRng::new(0xABCD_0123);
    for tick in 0..20_000u32 {
        let byte = if tick % 240 < 200 {
            0x01 | ((rng.next() as u8) & 0x0C)
        } else {
            (rng.next() as u8) & 0x0F
        };
        session.step(DT, decode_control_byte(byte));
        session
            .validate_invariants()
            .unwrap_or_else(|rule| panic!("tick {tick}: {rule}"));
        if session.is_finished() {
            break;
        }
    }
}

#[test]
fn oversized_steps_keep_positions_in_range() {
    let mut session = started();
    for _ in 0..50 {
        session.step(2.5, flat_out());
        session
            .validate_invariants()
            .expect("post-step state must satisfy invariants");
        if session.is_finished() {
            break;
        }
    }
    assert!(session.is_finished());
}

#[test]
fn reset_twice_is_identical() {
    let mut session = RaceSession::with_seed(SEED);
    session.reset();
    let first = serde_json::to_string(&session.snapshot()).expect("serialize snapshot");
    let first_rng = session.rng_state();

    session.reset();
    let second = serde_json::to_string(&session.snapshot()).expect("serialize snapshot");
    assert_eq!(first, second);
    assert_eq!(first_rng, session.rng_state());
}

#[test]
fn reset_after_racing_restores_the_grid() {
    let fresh = RaceSession::with_seed(SEED);
    let mut session = started();
    for _ in 0..600 {
        session.step(DT, flat_out());
    }
    session.reset();

    assert_eq!(session.player(), fresh.player());
    assert_eq!(session.opponents(), fresh.opponents());
    assert_eq!(session.state(), fresh.state());
    assert_eq!(session.ticks(), 0);
}

#[test]
fn different_seeds_change_the_weave_only() {
    let a = RaceSession::with_seed(1);
    let b = RaceSession::with_seed(2);
    for (left, right) in a.opponents().iter().zip(b.opponents()) {
        assert_eq!(left.actor, right.actor);
        assert_ne!(left.oscillation_phase, right.oscillation_phase);
    }
}

#[test]
fn step_before_begin_does_nothing() {
    let mut session = RaceSession::with_seed(SEED);
    let before = session.snapshot();
    assert_eq!(session.step(DT, flat_out()), None);
    assert_eq!(session.snapshot(), before);
}

#[test]
fn opponent_reaching_total_laps_first_is_defeat() {
    let mut session = started();
    let total_laps = session.config().total_laps;
    session.opponents[1].actor.completed_laps = total_laps;
    session.player.completed_laps = total_laps - 1;

    let outcome = session.step(DT, ControlState::IDLE);
    assert_eq!(outcome, Some(RaceEnd::defeat("Cassia")));
    assert!(session.is_finished());
    assert!(!session.is_running());
    assert_eq!(session.outcome(), Some(&RaceEnd::defeat("Cassia")));

    assert_eq!(session.step(DT, flat_out()), None);
    assert_eq!(session.outcome(), Some(&RaceEnd::defeat("Cassia")));
}

#[test]
fn crossing_the_line_on_the_final_lap_wins() {
    let mut session = started();
    let total = session.track().total_length();
    let total_laps = session.config().total_laps;
    session.player.completed_laps = total_laps - 1;
    session.player.position = total - 10.0;
    session.player.speed = session.config().max_speed;

    let outcome = session.step(DT, flat_out());
    assert_eq!(outcome, Some(RaceEnd::victory()));
    assert_eq!(session.player().completed_laps, total_laps);
    assert_eq!(session.hud().lap, total_laps);
}

#[test]
fn finished_race_only_coasts() {
    let mut session = started();
    session.opponents[0].actor.completed_laps = session.config().total_laps;
    session.player.speed = 2_000.0;
    session.step(DT, ControlState::IDLE);
    assert!(session.is_finished());

    let before = *session.player();
    let timer = session.state().lap_timer;
    let opponents = session.opponents().to_vec();
    session.step(
        0.5,
        ControlState {
            accelerate: true,
            right: true,
            ..ControlState::IDLE
        },
    );

    let after = session.player();
    assert!(after.speed < before.speed);
    assert_eq!(after.position, before.position);
    assert_eq!(after.offset, before.offset);
    assert_eq!(session.state().lap_timer, timer);
    assert_eq!(session.opponents(), opponents.as_slice());
}

#[test]
fn lap_completion_records_best_and_resets_timer() {
    let mut session = started();
    let total = session.track().total_length();
    session.step(DT, flat_out());
    session.step(DT, flat_out());

    session.player.position = total - 1.0;
    session.player.speed = session.config().max_speed;
    session.step(DT, flat_out());

    assert_eq!(session.player().completed_laps, 1);
    assert_eq!(session.state().lap_timer, 0.0);
    let best = session.state().best_lap.expect("best lap recorded");
    assert!((best - 3.0 * DT).abs() < 1e-12);
    assert!((session.state().race_clock - 3.0 * DT).abs() < 1e-12);
}

#[test]
fn opponent_weave_restarts_with_the_player_lap() {
    let setup = RaceSetup::default().with_roster(vec![DEFAULT_ROSTER[0]]);
    let mut session = RaceSession::new(setup, SEED);
    session.begin();
    for _ in 0..300 {
        session.step(DT, ControlState::IDLE);
    }
    assert!(session.state().lap_timer > 4.0);

    let total = session.track().total_length();
    session.player.position = total - 1.0;
    session.player.speed = session.config().max_speed;
    session.player.offset = session.config().player_offset_limit;
    let before = session.opponents()[0].clone();
    session.step(DT, ControlState::IDLE);

    assert_eq!(session.player().completed_laps, 1);
    assert_eq!(session.state().lap_timer, 0.0);
    assert!(session.state().race_clock > 5.0);

    let config = session.config();
    let after = &session.opponents()[0];
    let weave = (session.state().lap_timer * before.oscillation_rate + before.oscillation_phase).sin();
    let desired = before.base_lane + weave * config.lane_drift_amplitude;
    let curvature = session.track().segment_at(after.actor.position).curvature;
    let expected = (before.actor.offset + (desired - before.actor.offset) * DT * config.lane_ease_rate
        - curvature
            * config.centrifugal
            * config.opponent_centrifugal_share
            * (after.actor.speed / config.max_speed)
            * DT)
        .clamp(-config.opponent_offset_limit, config.opponent_offset_limit);
    assert!(
        (after.actor.offset - expected).abs() < 1e-12,
        "offset {} expected {expected}",
        after.actor.offset
    );
}

#[test]
fn hud_reflects_grid_order() {
    let session = started();
    let hud = session.hud();
    assert_eq!(hud.lap_label(), "1 / 3");
    assert_eq!(hud.best_lap_label(), "--");
    assert_eq!(hud.position_label(), "4 / 4");
    assert_eq!(session.standings().last().map(|row| row.is_player), Some(true));
}

#[test]
fn snapshot_looks_ahead_from_player_segment() {
    let session = started();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.upcoming_curvature.len(), LOOKAHEAD_SEGMENTS);
    let base = session.track().segment_index(session.player().position);
    assert_eq!(
        snapshot.upcoming_curvature[0],
        session.track().segment(base).curvature
    );
}

#[test]
fn geometry_follows_the_player() {
    let session = started();
    let geometry = session.geometry(Viewport::new(640.0, 360.0));
    assert_eq!(geometry.spans.len(), session.config().draw_distance);
    assert_eq!(
        geometry.spans[0].segment_index,
        session.track().segment_index(session.player().position)
    );
}

#[test]
fn rejects_player_offset_out_of_bounds() {
    assert_invariant_violation(
        |session| session.player.offset = 1.5,
        RuleCode::PlayerOffsetBounds,
    );
}

#[test]
fn rejects_opponent_offset_out_of_bounds() {
    assert_invariant_violation(
        |session| session.opponents[2].actor.offset = -0.96,
        RuleCode::OpponentOffsetBounds,
    );
}

#[test]
fn rejects_unwrapped_position() {
    assert_invariant_violation(
        |session| session.player.position = session.track().total_length(),
        RuleCode::PositionRange,
    );
}

#[test]
fn rejects_negative_speed() {
    assert_invariant_violation(
        |session| session.opponents[0].actor.speed = -1.0,
        RuleCode::SpeedRange,
    );
}

#[test]
fn rejects_negative_lap_timer() {
    assert_invariant_violation(
        |session| session.state.lap_timer = -0.01,
        RuleCode::LapTimerNegative,
    );
}

#[test]
fn rejects_finished_race_still_running() {
    assert_invariant_violation(
        |session| session.state.finished = true,
        RuleCode::FinishedWhileRunning,
    );
}

#[test]
fn setup_rejects_invalid_config() {
    let config = RaceConfig {
        total_laps: 0,
        ..RaceConfig::default()
    };
    let track = Track::default_circuit(config.segment_length);
    assert_eq!(
        RaceSetup::new(config, track).map(|_| ()),
        Err(ConfigError::ZeroLaps)
    );
}

#[test]
fn setup_rejects_track_built_at_another_segment_length() {
    let config = RaceConfig::default();
    let track = Track::default_circuit(config.segment_length / 2.0);
    assert_eq!(
        RaceSetup::new(config.clone(), track).map(|_| ()),
        Err(ConfigError::SegmentLengthMismatch)
    );
    let track = Track::default_circuit(config.segment_length);
    assert!(RaceSetup::new(config, track).is_ok());
}
