//! Collision response of the point-like player against inflated world boxes
//!
//! Every volume is grown by a clearance radius. When the proposed position
//! lands inside one, the player is pushed onto the nearest face of the
//! grown box and the velocity on that axis is zeroed. The other two axes keep
//! their proposed values, which gives wall sliding for free.

use glam::Vec3;

use crate::world::WorldGeometry;

/// Which face of a volume the player was pushed onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFace {
    /// Landed on the roof
    Top,
    /// Hit the underside while moving up
    Bottom,
    /// Side face perpendicular to X
    WallX,
    /// Side face perpendicular to Z
    WallZ,
}

/// Corrected state after a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub position: Vec3,
    pub velocity: Vec3,
    pub face: ContactFace,
    /// Index of the volume that was hit
    pub volume: usize,
    /// Proposed position minus the corrected position
    pub penetration: Vec3,
}

impl Resolution {
    pub fn is_landing(&self) -> bool {
        self.face == ContactFace::Top
    }
}

/// Nearest face of a box along one axis
#[derive(Debug, Clone, Copy)]
struct AxisContact {
    /// Coordinate of the nearest face
    face: f32,
    /// Distance from the point to that face
    depth: f32,
    /// True when the nearest face is the max side
    at_max: bool,
}

impl AxisContact {
    fn new(value: f32, min: f32, max: f32) -> Self {
        let to_min = value - min;
        let to_max = max - value;
        if to_max <= to_min {
            Self { face: max, depth: to_max, at_max: true }
        } else {
            Self { face: min, depth: to_min, at_max: false }
        }
    }
}

/// Resolve a proposed position against the world.
///
/// Only the first volume whose grown box contains `proposed` is considered.
/// Returns `None` when nothing was hit, in which case the caller commits the
/// proposed position itself.
pub fn resolve(
    proposed: Vec3,
    velocity: Vec3,
    world: &WorldGeometry,
    radius: f32,
    epsilon: f32,
) -> Option<Resolution> {
    world
        .volumes()
        .iter()
        .enumerate()
        .find_map(|(index, volume)| {
            let grown = volume.expanded(radius);
            grown
                .contains(proposed)
                .then(|| push_out(proposed, velocity, grown.min, grown.max, index, epsilon))
        })
}

fn push_out(proposed: Vec3, velocity: Vec3, min: Vec3, max: Vec3, volume: usize, epsilon: f32) -> Resolution {
    let x = AxisContact::new(proposed.x, min.x, max.x);
    let y = AxisContact::new(proposed.y, min.y, max.y);
    let z = AxisContact::new(proposed.z, min.z, max.z);

    let mut position = proposed;
    let mut velocity = velocity;

    // Vertical contacts must be clearly shallower than either side contact,
    // otherwise clipping a roof edge would count as a landing.
    let face = if y.depth + epsilon < x.depth.min(z.depth) {
        velocity.y = 0.0;
        position.y = y.face;
        if y.at_max {
            ContactFace::Top
        } else {
            ContactFace::Bottom
        }
    } else if x.depth < z.depth {
        velocity.x = 0.0;
        position.x = x.face;
        ContactFace::WallX
    } else {
        velocity.z = 0.0;
        position.z = z.face;
        ContactFace::WallZ
    };

    Resolution {
        position,
        velocity,
        face,
        volume,
        penetration: proposed - position,
    }
}
