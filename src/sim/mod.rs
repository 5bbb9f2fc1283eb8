//! Deterministic scroll core
//!
//! All feed motion lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only (passed in by the caller)
//! - Stable iteration order (by strip position)
//! - No rendering or platform dependencies

pub mod engine;
pub mod focus;
pub mod kinematics;
pub mod window;

pub use engine::{DragInput, FeedEngine, FeedEvent, StepInput};
pub use focus::{VisualTransform, centre_offset, centredness, evaluate_slot, fade, focus_index};
pub use kinematics::{Boundary, BoundaryContact, DragCapture, Kinematics, ScrollState, elastic_retention};
pub use window::{PoolStats, SlotPool, StripLayout, VisualSlot};
