use serde::{Deserialize, Serialize};

/// Normalized control state sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub accelerate: bool,
    pub brake: bool,
    pub left: bool,
    pub right: bool,
}

impl ControlState {
    pub const IDLE: Self = Self {
        accelerate: false,
        brake: false,
        left: false,
        right: false,
    };

    /// `+1` steering right, `-1` left, `0` for none or both.
    #[inline]
    pub fn steer_input(&self) -> f64 {
        (if self.right { 1.0 } else { 0.0 }) - (if self.left { 1.0 } else { 0.0 })
    }
}

#[inline]
pub fn encode_control_byte(controls: ControlState) -> u8 {
    (if controls.accelerate { 0x01 } else { 0 })
        | (if controls.brake { 0x02 } else { 0 })
        | (if controls.left { 0x04 } else { 0 })
        | (if controls.right { 0x08 } else { 0 })
}

#[inline]
pub fn decode_control_byte(byte: u8) -> ControlState {
    ControlState {
        accelerate: (byte & 0x01) != 0,
        brake: (byte & 0x02) != 0,
        left: (byte & 0x04) != 0,
        right: (byte & 0x08) != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_directions_cancel() {
        let controls = ControlState {
            left: true,
            right: true,
            ..ControlState::IDLE
        };
        assert_eq!(controls.steer_input(), 0.0);
    }

    #[test]
    fn upper_bits_are_ignored() {
        let controls = decode_control_byte(0xF5);
        assert!(controls.accelerate);
        assert!(!controls.brake);
        assert!(controls.left);
        assert!(!controls.right);
        assert_eq!(encode_control_byte(controls), 0x05);
    }
}
