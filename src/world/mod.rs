//! Static world geometry: the collidable volumes the player swings between

pub mod city;

use std::sync::Arc;

use glam::Vec3;

pub use city::{CityConfig, CityGenerator};

/// Axis-aligned bounding box of a static mesh in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Box of the given size centred on `center` (a mesh's world transform)
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Grow the box by `radius` on every side
    pub fn expanded(&self, radius: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(radius),
            max: self.max + Vec3::splat(radius),
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Read-only registry of every collidable volume in the level.
///
/// Built once at startup and shared between target acquisition and the
/// collision resolver; cloning is a reference-count bump.
#[derive(Debug, Clone, Default)]
pub struct WorldGeometry {
    volumes: Arc<[Aabb]>,
}

impl WorldGeometry {
    pub fn new(volumes: Vec<Aabb>) -> Self {
        Self {
            volumes: volumes.into(),
        }
    }

    pub fn volumes(&self) -> &[Aabb] {
        &self.volumes
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

impl FromIterator<Aabb> for WorldGeometry {
    fn from_iter<I: IntoIterator<Item = Aabb>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
