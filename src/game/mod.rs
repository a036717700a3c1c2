//! Client-side movement simulation

pub mod collision;
pub mod input;
pub mod physics;
pub mod player;
pub mod sim;
pub mod targeting;

pub use collision::{ContactFace, Resolution};
pub use input::{InputEvent, InputSource, InputState, Key, ViewAngles};
pub use physics::{MovementTuning, PhysicsSystem};
pub use player::{Grapple, MotionState, Player, StepEvents, StepInput};
pub use sim::{FixedTimestep, Simulation};
pub use targeting::{acquire_target, TargetHit};
