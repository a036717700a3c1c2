//! Procedural city generation
//!
//! Lays out a grid of box buildings with a few decorative blocks stuck to
//! each one. The centre cell is left empty so the player spawns in a plaza.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::{Aabb, WorldGeometry};

/// Layout parameters for the generated city
#[derive(Debug, Clone)]
pub struct CityConfig {
    /// Cells per side
    pub grid_size: u32,
    /// Distance between cell centres
    pub spacing: f32,
    /// Random offset applied to each building, as a fraction of `spacing`
    pub jitter: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub min_footprint: f32,
    pub max_footprint: f32,
    pub min_decorations: u32,
    pub max_decorations: u32,
    pub min_decoration_height: f32,
    pub max_decoration_height: f32,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            grid_size: 7,
            spacing: 25.0,
            jitter: 0.3,
            min_height: 20.0,
            max_height: 80.0,
            min_footprint: 6.0,
            max_footprint: 18.0,
            min_decorations: 2,
            max_decorations: 5,
            min_decoration_height: 8.0,
            max_decoration_height: 23.0,
        }
    }
}

/// Seeded generator; the same seed always yields the same city
pub struct CityGenerator {
    config: CityConfig,
    rng: ChaCha8Rng,
}

impl CityGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, CityConfig::default())
    }

    pub fn with_config(seed: u64, config: CityConfig) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate every collidable volume of the city
    pub fn generate(mut self) -> WorldGeometry {
        let grid = self.config.grid_size;
        let plaza = grid / 2;

        let mut volumes = Vec::new();
        for i in 0..grid {
            for j in 0..grid {
                if i == plaza && j == plaza {
                    continue;
                }
                // Grid is centred on the plaza, which sits at the origin
                let x = (i as f32 - plaza as f32) * self.config.spacing;
                let z = (j as f32 - plaza as f32) * self.config.spacing;
                self.building(x, z, &mut volumes);
            }
        }

        debug!(volumes = volumes.len(), "Generated city");
        WorldGeometry::new(volumes)
    }

    fn building(&mut self, x: f32, z: f32, out: &mut Vec<Aabb>) {
        let c = &self.config;
        let height = lerp(c.min_height, c.max_height, self.rng.gen());
        let width = lerp(c.min_footprint, c.max_footprint, self.rng.gen());
        let depth = lerp(c.min_footprint, c.max_footprint, self.rng.gen());

        let max_offset = c.spacing * c.jitter;
        let bx = x + (self.rng.gen::<f32>() - 0.5) * max_offset;
        let bz = z + (self.rng.gen::<f32>() - 0.5) * max_offset;

        out.push(Aabb::from_center_size(
            Vec3::new(bx, height / 2.0, bz),
            Vec3::new(width, height, depth),
        ));

        let count = self
            .rng
            .gen_range(self.config.min_decorations..=self.config.max_decorations);
        for _ in 0..count {
            let c = &self.config;
            let decor_height = lerp(c.min_decoration_height, c.max_decoration_height, self.rng.gen());
            let decor_width = width * lerp(0.2, 0.6, self.rng.gen());
            let decor_depth = depth * lerp(0.2, 0.6, self.rng.gen());

            // Decorations may poke out of the roof and the walls
            let base = self.rng.gen::<f32>() * (height - decor_height * 0.5).max(0.0);
            let dx = (self.rng.gen::<f32>() - 0.5) * (width - decor_width * 0.5);
            let dz = (self.rng.gen::<f32>() - 0.5) * (depth - decor_depth * 0.5);

            out.push(Aabb::from_center_size(
                Vec3::new(bx + dx, base + decor_height / 2.0, bz + dz),
                Vec3::new(decor_width, decor_height, decor_depth),
            ));
        }
    }
}

fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}
