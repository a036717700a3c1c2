//! Player input: key state, mouse look and view-relative directions

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

/// Radians of rotation per pixel of mouse movement
pub const MOUSE_SENSITIVITY: f32 = 0.002;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Grapple,
}

/// Discrete events coming from the input collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Relative pointer motion in pixels
    MouseDelta { dx: f32, dy: f32 },
}

/// Something that produces input events (window, script, replay)
pub trait InputSource {
    /// Move every event that arrived since the last call into `out`
    fn drain_events(&mut self, out: &mut Vec<InputEvent>);
}

/// Currently held keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub grapple: bool,
}

impl InputState {
    pub fn set(&mut self, key: Key, down: bool) {
        match key {
            Key::Forward => self.forward = down,
            Key::Back => self.back = down,
            Key::Left => self.left = down,
            Key::Right => self.right = down,
            Key::Grapple => self.grapple = down,
        }
    }

    /// Normalized movement axes: `x` strafes left, `y` moves forward
    pub fn move_axes(&self) -> Vec2 {
        let x = axis(self.left, self.right);
        let y = axis(self.forward, self.back);
        Vec2::new(x, y).normalize_or_zero()
    }

    pub fn has_movement(&self) -> bool {
        self.move_axes() != Vec2::ZERO
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// First-person view orientation (yaw about +Y, then pitch)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewAngles {
    /// Radians, 0 looks down -Z, positive turns left
    pub yaw: f32,
    /// Radians, positive looks up, clamped to ±π/2
    pub pitch: f32,
}

impl ViewAngles {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(-FRAC_PI_2, FRAC_PI_2),
        }
    }

    /// Apply a mouse delta in pixels
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - dy * MOUSE_SENSITIVITY).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Unit view direction
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// View direction flattened onto the ground plane
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Ground-plane direction to the left of the view
    pub fn flat_left(&self) -> Vec3 {
        Vec3::new(-self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// Rotate movement axes into a horizontal world direction (unit or zero)
    pub fn wish_direction(&self, axes: Vec2) -> Vec3 {
        (self.flat_forward() * axes.y + self.flat_left() * axes.x).normalize_or_zero()
    }
}
