//! Playback and transition engine.
//!
//! Pure state machines (`PlaybackController`, `Transition`) own the playback
//! index and cross-fade progress; the async `Player` drives them from two
//! timer domains (the cadence clock and the transition ramp) and publishes
//! render snapshots over a watch channel. A monotonic epoch guards every
//! timer callback so a superseded clock or ramp can never write into state
//! that belongs to a fresher load.

pub mod controller;
pub mod epoch;
pub mod player;
pub mod transition;

pub use controller::{PlaybackController, PlaybackStatus};
pub use epoch::{Epoch, EpochGuard};
pub use player::{Player, PlayerConfig, RenderFrame};
pub use transition::{Blend, StepOutcome, Transition, TransitionConfig};
