use crate::actor::{Actor, Opponent};
use crate::config::RaceConfig;
use crate::dynamics::clamp;
use crate::track::Track;

/// Moves every opponent, then settles lane contact between opponent pairs.
///
/// Each unordered pair is considered exactly once per tick (`j > i`).
/// `lap_timer` is the player's current lap time; the weave phase follows it
/// and so restarts whenever the player crosses the line.
pub fn step_opponents(
    opponents: &mut [Opponent],
    player: &mut Actor,
    track: &Track,
    config: &RaceConfig,
    lap_timer: f64,
    dt: f64,
) {
    for opponent in opponents.iter_mut() {
        drive(opponent, track, config, lap_timer, dt);
        shove_player(opponent, player, track, config, dt);
    }

    for i in 0..opponents.len() {
        for j in (i + 1)..opponents.len() {
            let (head, tail) = opponents.split_at_mut(j);
            shove_pair(&mut head[i].actor, &mut tail[0].actor, track, config, dt);
        }
    }
}

fn drive(opponent: &mut Opponent, track: &Track, config: &RaceConfig, lap_timer: f64, dt: f64) {
    let target = opponent.max_speed;
    let actor = &mut opponent.actor;
    if actor.speed < target {
        actor.speed =
            (actor.speed + config.acceleration * config.opponent_accel_share * dt).min(target);
    } else {
        actor.speed = (actor.speed - config.drag * config.opponent_drag_share * dt)
            .max(target * config.opponent_cruise_floor);
    }

    actor.advance(actor.speed * dt, track.total_length());

    let segment = track.segment_at(actor.position);
    let weave = (lap_timer * opponent.oscillation_rate + opponent.oscillation_phase).sin();
    let desired = opponent.base_lane + weave * config.lane_drift_amplitude;
    actor.offset += (desired - actor.offset) * dt * config.lane_ease_rate;
    actor.offset -= segment.curvature
        * (config.centrifugal * config.opponent_centrifugal_share)
        * (actor.speed / config.max_speed)
        * dt;
    actor.offset = clamp(
        actor.offset,
        -config.opponent_offset_limit,
        config.opponent_offset_limit,
    );
}

/// Opponent just ahead of the player and in its lane: both are pushed apart,
/// the opponent taking the smaller share.
fn shove_player(
    opponent: &mut Opponent,
    player: &mut Actor,
    track: &Track,
    config: &RaceConfig,
    dt: f64,
) {
    let relative = track.forward_gap(player.position, opponent.actor.position);
    let window = track.segment_length() * config.player_shove_window_segments;
    if relative >= window || (opponent.actor.offset - player.offset).abs() >= config.player_shove_threshold
    {
        return;
    }

    let direction = if player.offset > opponent.actor.offset {
        1.0
    } else {
        -1.0
    };
    let push = direction * dt * config.player_shove_strength;
    opponent.actor.offset -= push * config.player_shove_opponent_share;
    player.offset += push;

    opponent.actor.offset = clamp(
        opponent.actor.offset,
        -config.opponent_offset_limit,
        config.opponent_offset_limit,
    );
    player.offset = clamp(
        player.offset,
        -config.player_offset_limit,
        config.player_offset_limit,
    );
}

fn shove_pair(first: &mut Actor, second: &mut Actor, track: &Track, config: &RaceConfig, dt: f64) {
    let gap = track.forward_gap(first.position, second.position);
    let window = track.segment_length() * config.pair_shove_window_segments;
    if gap >= window || (second.offset - first.offset).abs() >= config.pair_shove_threshold {
        return;
    }

    let direction = if first.offset > second.offset { 1.0 } else { -1.0 };
    let adjust = direction * dt * config.pair_shove_strength;
    first.offset = clamp(
        first.offset + adjust,
        -config.opponent_offset_limit,
        config.opponent_offset_limit,
    );
    second.offset = clamp(
        second.offset - adjust,
        -config.opponent_offset_limit,
        config.opponent_offset_limit,
    );
}
