use crate::actor::Actor;
use crate::config::RaceConfig;
use crate::constants::TRACK_HALF_WIDTH;
use crate::control::ControlState;
use crate::track::Track;

#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Advances the player one tick and returns the number of start-line crossings.
///
/// Off-road slowdown is applied before position integration, so a car that
/// strays wide loses distance in the same tick.
pub fn step_player(
    player: &mut Actor,
    controls: ControlState,
    track: &Track,
    config: &RaceConfig,
    dt: f64,
) -> u32 {
    if controls.accelerate {
        player.speed = (player.speed + config.acceleration * dt).min(config.max_speed);
    } else {
        player.speed = (player.speed - config.drag * dt).max(0.0);
    }

    if controls.brake {
        player.speed = (player.speed - config.brake_decel * dt).max(0.0);
    }

    let speed_ratio = player.speed / config.max_speed;
    player.offset +=
        controls.steer_input() * dt * config.steer_gain * (config.base_turn_factor + speed_ratio);

    let segment = track.segment_at(player.position);
    player.offset -= segment.curvature * config.centrifugal * speed_ratio * dt;

    if player.offset.abs() > TRACK_HALF_WIDTH {
        apply_off_road_penalty(player, config, dt);
    }

    player.offset = clamp(
        player.offset,
        -config.player_offset_limit,
        config.player_offset_limit,
    );

    player.advance(player.speed * dt, track.total_length())
}

fn apply_off_road_penalty(player: &mut Actor, config: &RaceConfig, dt: f64) {
    let excess = player.speed - config.off_road_limit;
    player.speed = (player.speed
        - config.off_road_decel * dt
        - excess * config.off_road_excess_factor)
        .max(0.0);
    player.speed = player.speed.min(config.off_road_limit);
}

/// After the flag: drag only, no input and no movement.
pub fn coast(player: &mut Actor, config: &RaceConfig, dt: f64) {
    player.speed = (player.speed - config.drag * dt).max(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Run;

    const DT: f64 = 1.0 / 60.0;

    fn straight() -> Track {
        Track::build(&[Run::new(100, 0.0)], 90.0)
    }

    fn accelerate() -> ControlState {
        ControlState {
            accelerate: true,
            ..ControlState::IDLE
        }
    }

    #[test]
    fn one_second_of_throttle_adds_acceleration() {
        let config = RaceConfig {
            acceleration: 100.0,
            ..RaceConfig::default()
        };
        let mut player = Actor::at(180.0, 0.0, 0.0);
        step_player(&mut player, accelerate(), &straight(), &config, 1.0);
        assert_eq!(player.speed, 100.0);
    }

    #[test]
    fn throttle_is_capped_at_max_speed() {
        let config = RaceConfig {
            acceleration: 100.0,
            max_speed: 60.0,
            ..RaceConfig::default()
        };
        let mut player = Actor::at(180.0, 0.0, 0.0);
        step_player(&mut player, accelerate(), &straight(), &config, 1.0);
        assert_eq!(player.speed, 60.0);
    }

    #[test]
    fn off_track_loses_more_speed_than_on_track() {
        let config = RaceConfig::default();
        let track = straight();
        let start_speed = config.off_road_limit * 0.9;

        let mut on_track = Actor::at(180.0, 0.0, start_speed);
        let mut off_track = Actor::at(180.0, 1.2, start_speed);
        step_player(&mut on_track, ControlState::IDLE, &track, &config, DT);
        step_player(&mut off_track, ControlState::IDLE, &track, &config, DT);

        assert!(off_track.speed < on_track.speed);
        assert!(off_track.position - 180.0 < on_track.position - 180.0);
    }

    #[test]
    fn off_track_speed_never_exceeds_limit() {
        let config = RaceConfig::default();
        let mut player = Actor::at(180.0, 1.3, config.max_speed);
        step_player(&mut player, accelerate(), &straight(), &config, DT);
        assert!(player.speed <= config.off_road_limit);
    }

    #[test]
    fn brake_and_drag_compose() {
        let config = RaceConfig::default();
        let mut player = Actor::at(180.0, 0.0, 3_000.0);
        let brake = ControlState {
            brake: true,
            ..ControlState::IDLE
        };
        step_player(&mut player, brake, &straight(), &config, DT);
        let expected = 3_000.0 - config.drag * DT - config.brake_decel * DT;
        assert!((player.speed - expected).abs() < 1e-9);
    }

    #[test]
    fn steering_is_sharper_at_speed() {
        let config = RaceConfig::default();
        let track = straight();
        let right = ControlState {
            right: true,
            ..ControlState::IDLE
        };

        let mut slow = Actor::at(180.0, 0.0, 0.0);
        let mut fast = Actor::at(180.0, 0.0, config.max_speed);
        step_player(&mut slow, right, &track, &config, DT);
        step_player(&mut fast, right, &track, &config, DT);

        assert!(slow.offset > 0.0);
        assert!(fast.offset > slow.offset);
    }

    #[test]
    fn bends_drift_the_car_against_the_curve() {
        let config = RaceConfig::default();
        let track = Track::build(&[Run::new(100, 1.0)], 90.0);
        let mut player = Actor::at(180.0, 0.0, config.max_speed * 0.8);
        step_player(&mut player, ControlState::IDLE, &track, &config, DT);
        assert!(player.offset < 0.0);
    }

    #[test]
    fn offset_is_hard_clamped() {
        let config = RaceConfig::default();
        let track = straight();
        let left = ControlState {
            left: true,
            ..ControlState::IDLE
        };
        let mut player = Actor::at(180.0, -1.34, config.max_speed);
        for _ in 0..120 {
            step_player(&mut player, left, &track, &config, 0.1);
            assert!(player.offset >= -config.player_offset_limit);
        }
        assert_eq!(player.offset, -config.player_offset_limit);
    }

    #[test]
    fn huge_step_counts_every_lap() {
        let config = RaceConfig::default();
        let track = straight();
        let mut player = Actor::at(0.0, 0.0, config.max_speed);
        let dt = (track.total_length() * 3.5) / config.max_speed;
        let wraps = step_player(&mut player, accelerate(), &track, &config, dt);
        assert_eq!(wraps, 3);
        assert_eq!(player.completed_laps, 3);
        assert!(player.position >= 0.0 && player.position < track.total_length());
    }

    #[test]
    fn coasting_only_sheds_speed() {
        let config = RaceConfig::default();
        let mut player = Actor::at(500.0, 0.4, 1_000.0);
        coast(&mut player, &config, 1.0);
        assert!((player.speed - (1_000.0 - config.drag)).abs() < 1e-9);
        assert_eq!(player.position, 500.0);
        assert_eq!(player.offset, 0.4);
    }
}
