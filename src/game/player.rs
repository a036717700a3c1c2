//! Local player motion state machine
//!
//! The player is either grounded, airborne or swinging from a grapple.
//! `Player::step` advances one fixed tick in this order: ground movement,
//! grapple attach/release, state forces, air resistance, collision, ground
//! clamp.

use std::time::Duration;

use glam::Vec3;

use super::collision::{self, ContactFace};
use super::physics::{MovementTuning, PhysicsSystem};
use super::targeting::TargetHit;
use crate::world::WorldGeometry;

/// An active grapple attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grapple {
    pub anchor: Vec3,
    rope_length: f32,
    pub attached_at: Duration,
    pub reeling: bool,
}

impl Grapple {
    /// Slack recorded when the grapple latched; never changes afterwards
    pub fn rope_length(&self) -> f32 {
        self.rope_length
    }
}

/// Coarse movement state, derived from the player's fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionState {
    Grounded,
    Airborne,
    Grappling(Grapple),
}

/// Per-tick input to the state machine
#[derive(Debug, Clone, Copy, Default)]
pub struct StepInput<'a> {
    /// Horizontal, view-relative movement direction (unit or zero)
    pub wish_dir: Vec3,
    /// Grapple key currently held
    pub grapple_held: bool,
    /// Grapple target visible this tick
    pub target: Option<&'a TargetHit>,
    /// Simulation time at the start of the tick
    pub now: Duration,
}

/// What happened during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepEvents {
    pub attached: bool,
    pub released: bool,
    pub reel_started: bool,
    pub contact: Option<ContactFace>,
    pub landed: bool,
}

/// The locally simulated player
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec3,
    /// World units per tick
    pub velocity: Vec3,
    pub grounded: bool,
    grapple: Option<Grapple>,
}

impl Player {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            grounded: false,
            grapple: None,
        }
    }

    /// Standing at ground level at the origin
    pub fn spawn(tuning: &MovementTuning) -> Self {
        Self {
            grounded: true,
            ..Self::new(Vec3::new(0.0, tuning.ground_level, 0.0))
        }
    }

    pub fn grapple(&self) -> Option<&Grapple> {
        self.grapple.as_ref()
    }

    pub fn is_grappling(&self) -> bool {
        self.grapple.is_some()
    }

    pub fn state(&self) -> MotionState {
        match (self.grapple, self.grounded) {
            (Some(grapple), _) => MotionState::Grappling(grapple),
            (None, true) => MotionState::Grounded,
            (None, false) => MotionState::Airborne,
        }
    }

    /// Advance one tick
    pub fn step(
        &mut self,
        input: &StepInput<'_>,
        world: &WorldGeometry,
        tuning: &MovementTuning,
    ) -> StepEvents {
        let mut events = StepEvents::default();
        let was_grounded = self.grounded;

        if self.grapple.is_none() {
            self.ground_movement(input.wish_dir, tuning);
        }

        if input.grapple_held {
            if self.grapple.is_none() {
                if let Some(target) = input.target {
                    self.attach(target.point, input.now, tuning);
                    events.attached = true;
                }
            }
        } else if self.grapple.is_some() {
            self.release(tuning);
            events.released = true;
        }

        events.reel_started = self.apply_forces(input, tuning);
        self.velocity *= tuning.air_resistance;

        let proposed = self.position + self.velocity;
        match collision::resolve(
            proposed,
            self.velocity,
            world,
            tuning.collision_radius,
            tuning.contact_epsilon,
        ) {
            Some(hit) => {
                self.position = hit.position;
                self.velocity = hit.velocity;
                if hit.is_landing() {
                    self.grounded = true;
                }
                events.contact = Some(hit.face);
            }
            None => {
                self.position = proposed;
                if self.position.y <= tuning.ground_level {
                    self.position.y = tuning.ground_level;
                    self.velocity.y = 0.0;
                    self.grounded = true;
                } else {
                    self.grounded = false;
                }
            }
        }

        events.landed = self.grounded && !was_grounded;
        events
    }

    /// Walk on the ground, nudge in the air, or brake when idle on the ground
    fn ground_movement(&mut self, wish_dir: Vec3, tuning: &MovementTuning) {
        if wish_dir != Vec3::ZERO {
            if self.grounded {
                self.velocity.x = wish_dir.x * tuning.move_speed;
                self.velocity.z = wish_dir.z * tuning.move_speed;
            } else {
                let nudge = tuning.move_speed * tuning.airborne_move_scale;
                self.velocity.x += wish_dir.x * nudge;
                self.velocity.z += wish_dir.z * nudge;
            }
        } else if self.grounded {
            self.velocity.x *= tuning.ground_friction;
            self.velocity.z *= tuning.ground_friction;
        }
    }

    fn attach(&mut self, anchor: Vec3, now: Duration, tuning: &MovementTuning) {
        let rope_length = self.position.distance(anchor);
        self.velocity = PhysicsSystem::attach_boost(self.position, self.velocity, anchor, tuning);
        self.grapple = Some(Grapple {
            anchor,
            rope_length,
            attached_at: now,
            reeling: false,
        });
    }

    fn release(&mut self, tuning: &MovementTuning) {
        self.grapple = None;
        self.velocity *= tuning.release_boost;
    }

    /// Gravity, steering and rope forces. Returns true when reeling engaged
    /// this tick.
    fn apply_forces(&mut self, input: &StepInput<'_>, tuning: &MovementTuning) -> bool {
        let Some(grapple) = self.grapple.as_mut() else {
            if !self.grounded {
                self.velocity.y -= tuning.gravity;
                if input.wish_dir != Vec3::ZERO {
                    self.velocity = PhysicsSystem::air_control(self.velocity, input.wish_dir, tuning);
                }
            }
            return false;
        };

        self.velocity.y -= tuning.gravity * tuning.grapple_gravity_scale;

        let to_anchor = grapple.anchor - self.position;
        let distance = to_anchor.length();
        let dir = to_anchor.normalize_or_zero();

        let held_for = input.now.saturating_sub(grapple.attached_at);
        let mut reel_started = false;
        if input.grapple_held && held_for > tuning.reel_start_delay {
            reel_started = !grapple.reeling;
            grapple.reeling = true;

            self.velocity += dir * PhysicsSystem::reel_pull(distance, tuning);
            self.velocity += dir
                * PhysicsSystem::rope_tension(
                    distance,
                    grapple.rope_length,
                    tuning.reel_tension_gain,
                    tuning.reel_tension_cap,
                );
        } else if !grapple.reeling {
            self.velocity += dir
                * PhysicsSystem::rope_tension(
                    distance,
                    grapple.rope_length,
                    tuning.slack_tension_gain,
                    tuning.slack_tension_cap,
                );
        }

        if input.wish_dir != Vec3::ZERO {
            self.velocity = PhysicsSystem::swing_control(self.velocity, input.wish_dir, tuning);
        }

        self.velocity = PhysicsSystem::soft_speed_limit(self.velocity, tuning);
        reel_started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Aabb;

    fn tuning() -> MovementTuning {
        MovementTuning::default()
    }

    fn tick(n: u64) -> Duration {
        Duration::from_millis(16) * n as u32
    }

    fn target(point: Vec3) -> TargetHit {
        TargetHit {
            point,
            volume: 0,
            distance: 0.0,
        }
    }

    #[test]
    fn test_rest_on_ground_is_stable() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let start = player.position;

        for n in 0..10 {
            let events = player.step(&StepInput { now: tick(n), ..Default::default() }, &world, &tuning);
            assert!(events.contact.is_none());
            assert_eq!(player.position, start);
            assert!(player.grounded);
            assert_eq!(player.state(), MotionState::Grounded);
        }
        assert_eq!(player.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_ground_friction_decays_velocity() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        player.velocity = Vec3::new(0.1, 0.0, -0.1);

        let mut expected = 0.1_f32;
        for _ in 0..10 {
            let before = player.velocity.x;
            player.step(&StepInput::default(), &world, &tuning);
            expected *= tuning.ground_friction * tuning.air_resistance;
            assert!(player.velocity.x < before);
            assert!((player.velocity.x - expected).abs() < 1e-6);
            assert!(player.grounded);
            assert_eq!(player.position.y, tuning.ground_level);
        }
    }

    #[test]
    fn test_free_fall_decays_geometrically() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::new(Vec3::new(0.0, 50.0, 0.0));

        let mut expected_vy = 0.0_f32;
        for _ in 0..20 {
            player.step(&StepInput::default(), &world, &tuning);
            expected_vy = (expected_vy - tuning.gravity) * tuning.air_resistance;
            assert!((player.velocity.y - expected_vy).abs() < 1e-5);
            assert!(!player.grounded);
            assert_eq!(player.velocity.x, 0.0);
        }

        // Keeps falling until the ground clamp kicks in
        let mut ticks = 0;
        while !player.grounded && ticks < 1000 {
            player.step(&StepInput::default(), &world, &tuning);
            ticks += 1;
        }
        assert!(player.grounded);
        assert_eq!(player.position.y, tuning.ground_level);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn test_walk_sets_velocity_directly() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let input = StepInput {
            wish_dir: Vec3::NEG_Z,
            ..Default::default()
        };
        player.step(&input, &world, &tuning);
        let expected = -tuning.move_speed * tuning.air_resistance;
        assert!((player.velocity.z - expected).abs() < 1e-6);
        assert!(player.grounded);
    }

    #[test]
    fn test_attach_requires_target() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let events = player.step(
            &StepInput { grapple_held: true, ..Default::default() },
            &world,
            &tuning,
        );
        assert!(!events.attached);
        assert!(!player.is_grappling());
    }

    #[test]
    fn test_attach_records_rope_and_boosts() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let anchor = Vec3::new(0.0, 22.0, -20.0);
        let hit = target(anchor);

        let start = player.position;
        let events = player.step(
            &StepInput { grapple_held: true, target: Some(&hit), now: tick(3), ..Default::default() },
            &world,
            &tuning,
        );
        assert!(events.attached);
        let grapple = *player.grapple().expect("attached");
        assert_eq!(grapple.anchor, anchor);
        assert_eq!(grapple.attached_at, tick(3));
        assert!(!grapple.reeling);
        assert!((grapple.rope_length() - start.distance(anchor)).abs() < 1e-5);
        assert!(player.velocity.y > 0.0 && player.velocity.z < 0.0);
        assert!(matches!(player.state(), MotionState::Grappling(_)));
    }

    #[test]
    fn test_immediate_release_never_reels() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let hit = target(Vec3::new(0.0, 30.0, -10.0));

        let attach = player.step(
            &StepInput { grapple_held: true, target: Some(&hit), now: tick(0), ..Default::default() },
            &world,
            &tuning,
        );
        assert!(attach.attached && !attach.reel_started);
        assert!(!player.grapple().expect("attached").reeling);

        let before = player.velocity;
        let release = player.step(&StepInput { now: tick(0), ..Default::default() }, &world, &tuning);
        assert!(release.released);
        assert!(!release.reel_started);
        assert!(!player.is_grappling());
        // Release boost applied before gravity and drag
        let expected_y = (before.y * tuning.release_boost - tuning.gravity) * tuning.air_resistance;
        assert!((player.velocity.y - expected_y).abs() < 1e-5);
    }

    #[test]
    fn test_reel_starts_only_after_delay() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let hit = target(Vec3::new(0.0, 40.0, -30.0));
        let attached_at = Duration::from_millis(1000);

        player.step(
            &StepInput { grapple_held: true, target: Some(&hit), now: attached_at, ..Default::default() },
            &world,
            &tuning,
        );

        let at_delay = attached_at + tuning.reel_start_delay;
        let events = player.step(
            &StepInput { grapple_held: true, target: Some(&hit), now: at_delay, ..Default::default() },
            &world,
            &tuning,
        );
        assert!(!events.reel_started);
        assert!(!player.grapple().expect("attached").reeling);

        let past_delay = at_delay + Duration::from_millis(1);
        let events = player.step(
            &StepInput { grapple_held: true, target: Some(&hit), now: past_delay, ..Default::default() },
            &world,
            &tuning,
        );
        assert!(events.reel_started);
        assert!(player.grapple().expect("attached").reeling);
    }

    #[test]
    fn test_rope_length_constant_through_episode() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let hit = target(Vec3::new(10.0, 45.0, -25.0));

        player.step(
            &StepInput { grapple_held: true, target: Some(&hit), now: tick(0), ..Default::default() },
            &world,
            &tuning,
        );
        let rope = player.grapple().expect("attached").rope_length();
        let start = player.position;

        for n in 1..120 {
            player.step(
                &StepInput {
                    grapple_held: true,
                    target: None,
                    wish_dir: Vec3::X,
                    now: tick(n),
                },
                &world,
                &tuning,
            );
            let grapple = player.grapple().expect("still attached");
            assert_eq!(grapple.rope_length(), rope);
        }
        assert!(player.position.distance(start) > 1.0);
        assert!(player.grapple().expect("attached").reeling);
    }

    #[test]
    fn test_reeling_pulls_towards_anchor() {
        let tuning = tuning();
        let world = WorldGeometry::default();
        let mut player = Player::spawn(&tuning);
        let anchor = Vec3::new(0.0, 40.0, -30.0);
        let hit = target(anchor);

        player.step(
            &StepInput { grapple_held: true, target: Some(&hit), now: tick(0), ..Default::default() },
            &world,
            &tuning,
        );
        let start_distance = player.position.distance(anchor);
        for n in 1..20 {
            player.step(
                &StepInput { grapple_held: true, now: tick(n), ..Default::default() },
                &world,
                &tuning,
            );
        }
        assert!(player.grapple().expect("attached").reeling);
        assert!(player.position.distance(anchor) < start_distance);
        assert!(player.velocity.dot(anchor - player.position) > 0.0);
    }

    #[test]
    fn test_landing_on_roof_same_tick() {
        let tuning = tuning();
        let world = WorldGeometry::new(vec![Aabb::new(
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(5.0, 20.0, 5.0),
        )]);
        let mut player = Player::new(Vec3::new(0.0, 21.3, 0.0));
        player.velocity = Vec3::new(0.0, -0.6, 0.0);

        let events = player.step(&StepInput::default(), &world, &tuning);
        assert_eq!(events.contact, Some(ContactFace::Top));
        assert!(events.landed);
        assert!(player.grounded);
        assert_eq!(player.velocity.y, 0.0);
        assert_eq!(player.position.y, 21.0);

        // Stays on the roof while idle
        for _ in 0..5 {
            player.step(&StepInput::default(), &world, &tuning);
            assert!(player.grounded);
            assert_eq!(player.position.y, 21.0);
        }
    }

    #[test]
    fn test_walking_off_roof_becomes_airborne() {
        let tuning = tuning();
        let world = WorldGeometry::new(vec![Aabb::new(
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(5.0, 20.0, 5.0),
        )]);
        let mut player = Player::new(Vec3::new(5.95, 21.0, 0.0));
        player.grounded = true;
        player.velocity = Vec3::new(0.1, 0.0, 0.0);

        let input = StepInput { wish_dir: Vec3::X, ..Default::default() };
        player.step(&input, &world, &tuning);
        assert!(!player.grounded);
        assert_eq!(player.state(), MotionState::Airborne);
    }
}
