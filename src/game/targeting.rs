//! Grapple target acquisition: ray cast from the view against the world

use glam::Vec3;

use crate::world::{Aabb, WorldGeometry};

/// Where the view ray hits the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetHit {
    pub point: Vec3,
    /// Index of the hit volume in the world registry
    pub volume: usize,
    pub distance: f32,
}

/// Cast a ray and return the nearest hit within `max_distance`.
///
/// A ray starting inside a volume reports where it exits. Pure query: the
/// caller decides what to do with the indicator.
pub fn acquire_target(
    origin: Vec3,
    direction: Vec3,
    world: &WorldGeometry,
    max_distance: f32,
) -> Option<TargetHit> {
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO {
        return None;
    }

    world
        .volumes()
        .iter()
        .enumerate()
        .filter_map(|(volume, aabb)| {
            ray_aabb(origin, dir, aabb)
                .filter(|t| *t <= max_distance)
                .map(|distance| TargetHit {
                    point: origin + dir * distance,
                    volume,
                    distance,
                })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Slab test. Returns the entry distance, or the exit distance when the
/// origin is inside the box.
fn ray_aabb(origin: Vec3, dir: Vec3, aabb: &Aabb) -> Option<f32> {
    let inv = Vec3::new(safe_recip(dir.x), safe_recip(dir.y), safe_recip(dir.z));

    let t1 = (aabb.min - origin) * inv;
    let t2 = (aabb.max - origin) * inv;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin >= 0.0 { tmin } else { tmax })
}

fn safe_recip(v: f32) -> f32 {
    if v.abs() > 1e-6 {
        1.0 / v
    } else {
        f32::MAX
    }
}
