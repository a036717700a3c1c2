//! Simulation context and fixed-tick scheduler
//!
//! `Simulation` owns everything one local tick reads or writes: the world,
//! the player, the view, held keys, the grapple indicator and the simulated
//! clock. The host loop feeds it input events and real frame times; the
//! `FixedTimestep` turns those into a whole number of physics ticks.

use std::time::Duration;

use glam::Vec3;
use tracing::{debug, trace};

use super::input::{InputEvent, InputState, ViewAngles};
use super::physics::MovementTuning;
use super::player::{Player, StepEvents, StepInput};
use super::targeting::{acquire_target, TargetHit};
use crate::util::time::tick_duration;
use crate::world::WorldGeometry;

/// Accumulates real frame time and releases fixed ticks
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    accumulator: Duration,
    /// Upper bound on ticks released per frame, so a long stall does not
    /// turn into a burst of catch-up ticks
    max_ticks_per_frame: u32,
}

impl FixedTimestep {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_ticks_per_frame: 5,
        }
    }

    pub fn with_max_ticks(mut self, max: u32) -> Self {
        self.max_ticks_per_frame = max.max(1);
        self
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Add a frame's worth of time and return how many ticks to run
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        self.accumulator += frame_time;

        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.step;
            ticks += 1;
        }

        if ticks == self.max_ticks_per_frame && self.accumulator >= self.step {
            // Drop the backlog instead of spiralling
            self.accumulator = Duration::ZERO;
        }
        ticks
    }

    /// Fraction of a tick left in the accumulator, for render blending
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.step.as_secs_f32()
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(tick_duration())
    }
}

/// Everything the local physics tick needs, in one place
pub struct Simulation {
    world: WorldGeometry,
    tuning: MovementTuning,
    player: Player,
    view: ViewAngles,
    input: InputState,
    target: Option<TargetHit>,
    tick: u64,
    step: Duration,
}

impl Simulation {
    pub fn new(world: WorldGeometry, tuning: MovementTuning) -> Self {
        let player = Player::spawn(&tuning);
        Self {
            world,
            tuning,
            player,
            view: ViewAngles::default(),
            input: InputState::default(),
            target: None,
            tick: 0,
            step: tick_duration(),
        }
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.input.set(key, true),
            InputEvent::KeyUp(key) => self.input.set(key, false),
            InputEvent::MouseDelta { dx, dy } => self.view.look(dx, dy),
        }
    }

    /// Run one fixed tick: move the player, then re-aim the grapple indicator
    pub fn tick(&mut self) -> StepEvents {
        let now = self.elapsed();
        let wish_dir = self.view.wish_direction(self.input.move_axes());

        let input = StepInput {
            wish_dir,
            grapple_held: self.input.grapple,
            target: self.target.as_ref(),
            now,
        };
        let events = self.player.step(&input, &self.world, &self.tuning);

        if events.attached {
            if let Some(grapple) = self.player.grapple() {
                debug!(
                    tick = self.tick,
                    anchor = ?grapple.anchor,
                    rope_length = grapple.rope_length(),
                    "Grapple attached"
                );
            }
        }
        if events.reel_started {
            debug!(tick = self.tick, "Reeling in");
        }
        if events.released {
            debug!(tick = self.tick, speed = self.player.velocity.length(), "Grapple released");
        }
        if let Some(face) = events.contact {
            trace!(tick = self.tick, ?face, "Collision");
        }

        self.target = acquire_target(
            self.eye(),
            self.view.forward(),
            &self.world,
            self.tuning.max_grapple_distance,
        );

        self.tick += 1;
        events
    }

    /// Simulated time since the first tick
    pub fn elapsed(&self) -> Duration {
        self.step * u32::try_from(self.tick).unwrap_or(u32::MAX)
    }

    /// Camera position; the camera rides at the player's centre
    pub fn eye(&self) -> Vec3 {
        self.player.position
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn set_view(&mut self, view: ViewAngles) {
        self.view = view;
    }

    /// Current grapple indicator; `None` means hidden
    pub fn target(&self) -> Option<&TargetHit> {
        self.target.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}
