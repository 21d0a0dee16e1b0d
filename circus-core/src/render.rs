//! Draw phase: turns `FrameGeometry` into drawing commands for a surface.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Opponent};
use crate::projection::{FrameGeometry, ProjectedSpan, Viewport};
use crate::session::RaceSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a: 0xff,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xff {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "rgba({}, {}, {}, {:.2})",
                self.r,
                self.g,
                self.b,
                f64::from(self.a) / 255.0
            )
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Quad {
        corners: [Point; 4],
        color: Color,
    },
    LinePair {
        first: [Point; 2],
        second: [Point; 2],
        color: Color,
        width: f64,
    },
    RoundedRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        color: Color,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        color: Color,
    },
}

/// The drawing collaborator. Implementations own the pixels.
pub trait RenderSurface {
    fn viewport(&self) -> Viewport;
    fn draw(&mut self, command: &DrawCommand);
}

/// Surface that keeps every command, for tests and frame dumps.
#[derive(Clone, Debug, Default)]
pub struct CommandRecorder {
    viewport: Option<Viewport>,
    pub commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Some(viewport),
            commands: Vec::new(),
        }
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        core::mem::take(&mut self.commands)
    }
}

impl RenderSurface for CommandRecorder {
    fn viewport(&self) -> Viewport {
        self.viewport.unwrap_or(Viewport::new(
            crate::constants::DEFAULT_VIEWPORT_WIDTH,
            crate::constants::DEFAULT_VIEWPORT_HEIGHT,
        ))
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}

const SKY_TOP: Color = Color::hex(0x2a2755);
const SKY_HORIZON: Color = Color::hex(0xf2d6a0);
const HILLS: Color = Color::hex(0xb58b52);
const STANDS: Color = Color::hex(0x3a271b);
const PILLAR: Color = Color::hex(0xd6c6aa);
const GROUND: Color = Color::hex(0x62442d);

const ROAD_LIGHT: Color = Color::hex(0xb67c3a);
const ROAD_DARK: Color = Color::hex(0x8f5a2a);
const RUMBLE_LIGHT: Color = Color::hex(0xf7ecd3);
const RUMBLE_DARK: Color = Color::hex(0x5b3620);
const LANE_MARKER: Color = Color::rgba(255, 244, 200, 217);
const WHEEL: Color = Color::hex(0x2c1a12);

const CHARIOT_BODY: Color = Color::hex(0xf0c96d);
const CHARIOT_TRIM: Color = Color::hex(0x784421);
const CHARIOT_CANOPY: Color = Color::hex(0xc4432a);
const CHARIOT_WHEEL: Color = Color::hex(0x2b1a10);
const REINS: Color = Color::hex(0xfdf2c3);

const PILLAR_COUNT: usize = 11;
const HORIZON_RATIO: f64 = 0.45;
const CHARIOT_BOTTOM_MARGIN: f64 = 40.0;

fn rect(x: f64, y: f64, width: f64, height: f64, color: Color) -> DrawCommand {
    DrawCommand::RoundedRect {
        x,
        y,
        width,
        height,
        radius: 0.0,
        color,
    }
}

fn backdrop(viewport: Viewport, out: &mut Vec<DrawCommand>) {
    let width = viewport.width;
    let horizon = viewport.height * HORIZON_RATIO;

    out.push(rect(0.0, 0.0, width, horizon / 2.0, SKY_TOP));
    out.push(rect(0.0, horizon / 2.0, width, horizon / 2.0, SKY_HORIZON));

    let crest = Point::new(width / 2.0, horizon - 30.0);
    out.push(DrawCommand::Quad {
        corners: [
            Point::new(0.0, horizon),
            crest,
            Point::new(width / 2.0, horizon + 90.0),
            Point::new(0.0, horizon + 90.0),
        ],
        color: HILLS,
    });
    out.push(DrawCommand::Quad {
        corners: [
            crest,
            Point::new(width, horizon),
            Point::new(width, horizon + 90.0),
            Point::new(width / 2.0, horizon + 90.0),
        ],
        color: HILLS,
    });

    out.push(rect(0.0, horizon + 40.0, width, 90.0, STANDS));

    let pillar_width = 18.0;
    for i in 0..PILLAR_COUNT {
        let x = (width / (PILLAR_COUNT - 1) as f64) * i as f64;
        out.push(rect(
            x - pillar_width / 2.0,
            horizon + 20.0,
            pillar_width,
            80.0,
            PILLAR,
        ));
    }

    out.push(rect(
        0.0,
        horizon + 110.0,
        width,
        viewport.height - (horizon + 110.0),
        GROUND,
    ));
}

fn trapezoid(near: Point, near_half: f64, far: Point, far_half: f64, color: Color) -> DrawCommand {
    DrawCommand::Quad {
        corners: [
            Point::new(near.x - near_half, near.y),
            Point::new(near.x + near_half, near.y),
            Point::new(far.x + far_half, far.y),
            Point::new(far.x - far_half, far.y),
        ],
        color,
    }
}

fn road_span(span: &ProjectedSpan, rumble_length: usize, out: &mut Vec<DrawCommand>) {
    let Some((near, far)) = span.edges() else {
        return;
    };
    let near_point = Point::new(near.x, near.y);
    let far_point = Point::new(far.x, far.y);
    let road_near = span.road_half_width_near;
    let road_far = span.road_half_width_far;

    let light = (span.segment_index / rumble_length) % 2 == 0;
    let (road_color, rumble_color) = if light {
        (ROAD_LIGHT, RUMBLE_LIGHT)
    } else {
        (ROAD_DARK, RUMBLE_DARK)
    };

    out.push(trapezoid(
        near_point,
        road_near * 1.2,
        far_point,
        road_far * 1.2,
        rumble_color,
    ));
    out.push(trapezoid(
        near_point, road_near, far_point, road_far, road_color,
    ));

    let marker_near = road_near * 0.1;
    let marker_far = road_far * 0.1;
    out.push(DrawCommand::LinePair {
        first: [
            Point::new(near.x - marker_near, near.y),
            Point::new(far.x - marker_far, far.y),
        ],
        second: [
            Point::new(near.x + marker_near, near.y),
            Point::new(far.x + marker_far, far.y),
        ],
        color: LANE_MARKER,
        width: 2.0,
    });
}

fn opponent_sprites(span: &ProjectedSpan, opponents: &[Opponent], out: &mut Vec<DrawCommand>) {
    let Some((near, far)) = span.edges() else {
        return;
    };

    for slot in &span.sprites {
        let Some(opponent) = opponents.get(slot.opponent) else {
            continue;
        };
        let t = slot.progress;
        let center_x = near.x + (far.x - near.x) * t;
        let base_y = near.y + (far.y - near.y) * t;
        let road_half =
            span.road_half_width_near + (span.road_half_width_far - span.road_half_width_near) * t;

        let sprite_x = center_x + road_half * opponent.actor.offset;
        let width = road_half * 0.7;
        let height = width * 0.6;

        out.push(DrawCommand::RoundedRect {
            x: sprite_x - width / 2.0,
            y: base_y - height,
            width,
            height,
            radius: width * 0.1,
            color: opponent.color,
        });

        let wheel = width * 0.18;
        for side in [-0.28, 0.28] {
            out.push(DrawCommand::Ellipse {
                cx: sprite_x + width * side,
                cy: base_y,
                rx: wheel,
                ry: wheel * 0.75,
                color: WHEEL,
            });
        }
    }
}

fn player_chariot(
    nearest: Option<&ProjectedSpan>,
    player: &Actor,
    viewport: Viewport,
    out: &mut Vec<DrawCommand>,
) {
    let (base_x, road_half) = match nearest.and_then(|span| span.edges().map(|e| (span, e))) {
        Some((span, (near, _))) => (near.x, span.road_half_width_near),
        None => (viewport.half_width(), viewport.width * 0.25),
    };

    let x = base_x + road_half * player.offset;
    let width = road_half * 0.8;
    let height = width * 0.62;
    let bottom = viewport.height - CHARIOT_BOTTOM_MARGIN;

    out.push(DrawCommand::RoundedRect {
        x: x - width / 2.0,
        y: bottom - height,
        width,
        height,
        radius: 18.0,
        color: CHARIOT_BODY,
    });
    out.push(rect(
        x - width * 0.45,
        bottom - height * 0.2,
        width * 0.9,
        height * 0.2,
        CHARIOT_TRIM,
    ));
    out.push(DrawCommand::Quad {
        corners: [
            Point::new(x - width * 0.35, bottom - height * 0.4),
            Point::new(x + width * 0.35, bottom - height * 0.4),
            Point::new(x + width * 0.2, bottom - height * 0.85),
            Point::new(x - width * 0.2, bottom - height * 0.85),
        ],
        color: CHARIOT_CANOPY,
    });

    let wheel = width * 0.16;
    for side in [-0.4, 0.4] {
        out.push(DrawCommand::Ellipse {
            cx: x + width * side,
            cy: bottom,
            rx: wheel,
            ry: wheel * 0.8,
            color: CHARIOT_WHEEL,
        });
    }

    out.push(DrawCommand::LinePair {
        first: [
            Point::new(x - width * 0.18, bottom - height * 0.8),
            Point::new(x - width * 0.5, bottom - height * 1.2),
        ],
        second: [
            Point::new(x + width * 0.18, bottom - height * 0.8),
            Point::new(x + width * 0.5, bottom - height * 1.2),
        ],
        color: REINS,
        width: 3.0,
    });
}

/// Backdrop, then spans far-to-near each followed by its sprites, then the
/// player's chariot on top.
pub fn compose_frame(
    geometry: &FrameGeometry,
    player: &Actor,
    opponents: &[Opponent],
    rumble_length: usize,
) -> Vec<DrawCommand> {
    let mut out = Vec::with_capacity(geometry.spans.len() * 3 + 32);
    backdrop(geometry.viewport, &mut out);

    for span in geometry.spans.iter().rev() {
        if !span.valid {
            continue;
        }
        road_span(span, rumble_length.max(1), &mut out);
        opponent_sprites(span, opponents, &mut out);
    }

    player_chariot(geometry.spans.first(), player, geometry.viewport, &mut out);
    out
}

/// Projects the session for the surface's viewport and draws one frame.
/// Returns the number of commands issued.
pub fn render_frame(session: &RaceSession, surface: &mut dyn RenderSurface) -> usize {
    let geometry = session.geometry(surface.viewport());
    let commands = compose_frame(
        &geometry,
        session.player(),
        session.opponents(),
        session.config().rumble_length,
    );
    for command in &commands {
        surface.draw(command);
    }
    commands.len()
}
