//! Movement tuning constants and the force rules of the swing integrator
//!
//! Velocities are in world units per tick; the integrator runs on a fixed
//! timestep so none of these values are scaled by a delta time.

use std::time::Duration;

use glam::{Vec2, Vec3};

/// Game-feel tuning for player movement
#[derive(Debug, Clone, Copy)]
pub struct MovementTuning {
    /// Ground walk speed
    pub move_speed: f32,
    /// Horizontal velocity kept per tick when grounded with no input
    pub ground_friction: f32,
    /// Share of `move_speed` added per tick when airborne outside a swing
    pub airborne_move_scale: f32,
    /// Base air-control acceleration
    pub air_control_strength: f32,
    /// Air-control scale while attached to a grapple
    pub grapple_air_control_scale: f32,
    /// Horizontal speed cap in free flight, total speed cap while swinging
    pub max_air_speed: f32,
    /// Strength of the soft speed limit applied while swinging
    pub speed_limit_softness: f32,
    pub gravity: f32,
    /// Gravity scale while attached
    pub grapple_gravity_scale: f32,
    /// Velocity kept per tick in every state
    pub air_resistance: f32,
    /// Upper bound on the reel-in pull per tick
    pub grapple_reel_speed: f32,
    /// Reel pull per unit of distance past the dead zone
    pub reel_gain: f32,
    /// Distance to the anchor inside which reeling stops pulling
    pub reel_dead_zone: f32,
    /// Rope tension gain and cap while reeling
    pub reel_tension_gain: f32,
    pub reel_tension_cap: f32,
    /// Rope tension gain and cap before reeling starts
    pub slack_tension_gain: f32,
    pub slack_tension_cap: f32,
    /// Farthest point the grapple can latch onto
    pub max_grapple_distance: f32,
    /// Minimum height of the player's centre
    pub ground_level: f32,
    /// Flat part of the attach boost
    pub tap_boost_force: f32,
    /// Upward bias added to the attach boost direction
    pub tap_upward_boost: f32,
    /// Horizontal scale of the attach boost direction
    pub tap_horizontal_scale: f32,
    /// Share of the pre-attach speed added to the boost
    pub tap_speed_share: f32,
    /// Velocity kept when attaching
    pub attach_momentum_retention: f32,
    /// Velocity multiplier on release
    pub release_boost: f32,
    /// How long the grapple input must be held before reeling engages
    pub reel_start_delay: Duration,
    /// Clearance added around every collidable volume
    pub collision_radius: f32,
    /// Margin by which a vertical contact must beat the horizontal ones
    pub contact_epsilon: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: 0.1,
            ground_friction: 0.8,
            airborne_move_scale: 0.1,
            air_control_strength: 0.06,
            grapple_air_control_scale: 0.7,
            max_air_speed: 1.2,
            speed_limit_softness: 0.1,
            gravity: 0.025,
            grapple_gravity_scale: 0.85,
            air_resistance: 0.992,
            grapple_reel_speed: 0.15,
            reel_gain: 0.01,
            reel_dead_zone: 5.0,
            reel_tension_gain: 0.03,
            reel_tension_cap: 0.1,
            slack_tension_gain: 0.015,
            slack_tension_cap: 0.06,
            max_grapple_distance: 50.0,
            ground_level: 2.0,
            tap_boost_force: 0.3,
            tap_upward_boost: 0.25,
            tap_horizontal_scale: 0.8,
            tap_speed_share: 0.2,
            attach_momentum_retention: 0.5,
            release_boost: 1.05,
            reel_start_delay: Duration::from_millis(150),
            collision_radius: 1.0,
            contact_epsilon: 0.1,
        }
    }
}

/// Force rules shared by the motion states
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Free-flight air control.
    ///
    /// Authority shrinks as horizontal speed approaches the cap, then the
    /// horizontal speed is clamped to the cap. Vertical velocity is untouched.
    pub fn air_control(velocity: Vec3, wish_dir: Vec3, tuning: &MovementTuning) -> Vec3 {
        let horizontal = Vec2::new(velocity.x, velocity.z);
        let speed = horizontal.length();
        let force =
            tuning.air_control_strength * (1.0 + (tuning.max_air_speed - speed) * 0.5);

        let steered = (horizontal + Vec2::new(wish_dir.x, wish_dir.z) * force)
            .clamp_length_max(tuning.max_air_speed);

        Vec3::new(steered.x, velocity.y, steered.y)
    }

    /// Reduced-strength steering while swinging; no horizontal clamp
    pub fn swing_control(velocity: Vec3, wish_dir: Vec3, tuning: &MovementTuning) -> Vec3 {
        let strength = tuning.air_control_strength * tuning.grapple_air_control_scale;
        velocity + Vec3::new(wish_dir.x, 0.0, wish_dir.z) * strength
    }

    /// Active reel-in pull along the rope
    pub fn reel_pull(distance: f32, tuning: &MovementTuning) -> f32 {
        ((distance - tuning.reel_dead_zone) * tuning.reel_gain)
            .clamp(0.0, tuning.grapple_reel_speed)
    }

    /// Corrective pull once the player is farther than the recorded slack
    pub fn rope_tension(distance: f32, rope_length: f32, gain: f32, cap: f32) -> f32 {
        if distance > rope_length {
            ((distance - rope_length) * gain).min(cap)
        } else {
            0.0
        }
    }

    /// Scale velocity back towards the cap instead of clamping it hard
    pub fn soft_speed_limit(velocity: Vec3, tuning: &MovementTuning) -> Vec3 {
        let speed = velocity.length();
        if speed > tuning.max_air_speed {
            let scale = (1.0 - (speed - tuning.max_air_speed) * tuning.speed_limit_softness).max(0.0);
            velocity * scale
        } else {
            velocity
        }
    }

    /// Velocity right after latching onto `anchor` from `position`.
    ///
    /// Half the existing momentum is kept, then a boost towards the anchor
    /// (flattened horizontally, biased upward) is added whose magnitude grows
    /// with the pre-attach speed.
    pub fn attach_boost(position: Vec3, velocity: Vec3, anchor: Vec3, tuning: &MovementTuning) -> Vec3 {
        let dir = (anchor - position).normalize_or_zero();
        let boost_dir = Vec3::new(
            dir.x * tuning.tap_horizontal_scale,
            dir.y + tuning.tap_upward_boost,
            dir.z * tuning.tap_horizontal_scale,
        )
        .normalize_or_zero();

        let speed = velocity.length();
        velocity * tuning.attach_momentum_retention
            + boost_dir * (tuning.tap_boost_force + speed * tuning.tap_speed_share)
    }
}
