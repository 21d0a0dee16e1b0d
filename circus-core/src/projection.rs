//! Pseudo-3D projection of the segment array.
//!
//! Geometry only: nothing in here draws. Spans come out near-to-far and the
//! render phase walks them in reverse so nearer road covers farther road.

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Opponent};
use crate::config::RaceConfig;
use crate::constants::NEAR_PLANE;
use crate::track::Track;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    #[inline]
    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }
}

/// Lateral offset, height and longitudinal coordinate of the camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CameraPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CameraPose {
    /// Camera trailing the player by `player_z` at `camera_height`.
    pub fn chasing(player: &Actor, config: &RaceConfig) -> Self {
        Self {
            x: player.offset * config.road_width,
            y: config.camera_height,
            z: player.position - config.player_z(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    camera_depth: f64,
    viewport: Viewport,
}

impl Projector {
    pub fn new(config: &RaceConfig, viewport: Viewport) -> Self {
        Self {
            camera_depth: config.camera_depth(),
            viewport,
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// `None` when the point sits at or behind the near plane; callers skip it.
    pub fn project(&self, point: WorldPoint, camera: CameraPose) -> Option<ScreenPoint> {
        let rel_x = point.x - camera.x;
        let rel_y = point.y - camera.y;
        let rel_z = point.z - camera.z;

        if rel_z <= NEAR_PLANE {
            return None;
        }

        let scale = self.camera_depth / rel_z;
        Some(ScreenPoint {
            x: self.viewport.half_width() + scale * rel_x * self.viewport.half_width(),
            y: self.viewport.half_height() - scale * rel_y * self.viewport.half_height(),
            scale,
        })
    }
}

/// An opponent bucketed into a span for this frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpriteSlot {
    /// Index into the session's opponent list.
    pub opponent: usize,
    /// How far into the span the opponent sits, `[0, 1)`.
    pub progress: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectedSpan {
    pub segment_index: usize,
    pub near: Option<ScreenPoint>,
    pub far: Option<ScreenPoint>,
    pub road_half_width_near: f64,
    pub road_half_width_far: f64,
    pub valid: bool,
    pub wrapped: bool,
    pub sprites: Vec<SpriteSlot>,
}

impl ProjectedSpan {
    /// Both edge projections, present only for valid spans.
    #[inline]
    pub fn edges(&self) -> Option<(ScreenPoint, ScreenPoint)> {
        match (self.near, self.far) {
            (Some(near), Some(far)) if self.valid => Some((near, far)),
            _ => None,
        }
    }
}

/// Projects `draw_distance` segments starting at `base_index`, bending the
/// centerline by the running sum of curvature.
pub fn build_visible_spans(
    track: &Track,
    camera: CameraPose,
    base_index: usize,
    projector: &Projector,
    config: &RaceConfig,
) -> Vec<ProjectedSpan> {
    let count = track.segment_count();
    let segment_length = track.segment_length();
    let total_length = track.total_length();
    let half_width = projector.viewport().half_width();

    let mut spans = Vec::with_capacity(config.draw_distance);
    let mut x = 0.0;
    let mut dx = 0.0;

    for n in 0..config.draw_distance {
        let absolute = base_index + n;
        let segment = track.segment(absolute);
        let laps_ahead = absolute / count;
        let wrapped = laps_ahead > 0;

        let z_near = segment.index as f64 * segment_length + laps_ahead as f64 * total_length;
        let z_far = z_near + segment_length;

        let near = projector.project(WorldPoint { x, y: 0.0, z: z_near }, camera);
        dx += segment.curvature * config.curve_scale;
        let next_x = x + dx;
        let far = projector.project(
            WorldPoint {
                x: next_x,
                y: 0.0,
                z: z_far,
            },
            camera,
        );

        let valid = near.is_some() && far.is_some();
        let (road_half_width_near, road_half_width_far) = match (near, far) {
            (Some(near), Some(far)) => (
                near.scale * config.road_width * half_width,
                far.scale * config.road_width * half_width,
            ),
            _ => (0.0, 0.0),
        };

        spans.push(ProjectedSpan {
            segment_index: segment.index,
            near,
            far,
            road_half_width_near,
            road_half_width_far,
            valid,
            wrapped,
            sprites: Vec::new(),
        });

        x = next_x;
    }

    spans
}

/// Buckets opponents ahead of the player into spans. Anything behind the
/// player, level with it, or beyond the draw distance is culled.
pub fn place_sprites(
    spans: &mut [ProjectedSpan],
    opponents: &[Opponent],
    player: &Actor,
    track: &Track,
    config: &RaceConfig,
) {
    let segment_length = track.segment_length();
    let total_length = track.total_length();
    let max_visible = config.draw_distance as f64 * segment_length;

    for span in spans.iter_mut() {
        span.sprites.clear();
    }

    for (index, opponent) in opponents.iter().enumerate() {
        let mut relative = opponent.actor.position - player.position;
        if relative < 0.0 {
            relative += total_length;
        }
        if relative <= 0.0 || relative >= max_visible {
            continue;
        }

        let slot = (relative / segment_length).floor() as usize;
        let Some(span) = spans.get_mut(slot) else {
            continue;
        };
        if !span.valid {
            continue;
        }

        span.sprites.push(SpriteSlot {
            opponent: index,
            progress: (opponent.actor.position % segment_length) / segment_length,
        });
    }

    for span in spans.iter_mut() {
        span.sprites
            .sort_by(|a, b| a.progress.total_cmp(&b.progress));
    }
}

/// Everything the render phase needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameGeometry {
    pub camera: CameraPose,
    pub viewport: Viewport,
    pub spans: Vec<ProjectedSpan>,
}

pub fn project_frame(
    track: &Track,
    player: &Actor,
    opponents: &[Opponent],
    config: &RaceConfig,
    viewport: Viewport,
) -> FrameGeometry {
    let projector = Projector::new(config, viewport);
    let camera = CameraPose::chasing(player, config);
    let base_index = track.segment_index(player.position);

    let mut spans = build_visible_spans(track, camera, base_index, &projector, config);
    place_sprites(&mut spans, opponents, player, track, config);

    FrameGeometry {
        camera,
        viewport,
        spans,
    }
}
