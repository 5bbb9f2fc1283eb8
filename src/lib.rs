//! Doomscroll - an endless feed as a game mechanic
//!
//! Core modules:
//! - `sim`: Deterministic scroll core (kinematics, virtualization window, focus)
//! - `curve`: Designer-tunable response curves
//! - `settings`: Data-driven feed tuning
//! - `post`: Default feed content
//! - `gestures`: Tap / hold / like handlers that steer the feed through its velocity
//! - `stats`: Session counters fed from engine events

pub mod curve;
pub mod error;
pub mod gestures;
pub mod post;
pub mod settings;
pub mod sim;
pub mod stats;

pub use curve::{Keyframe, KeyframeCurve, ResponseCurve};
pub use error::{FeedError, FeedResult};
pub use post::{Post, PostKind, PostSpecial};
pub use settings::{BoundaryMode, FeedConfig};
pub use sim::{FeedEngine, FeedEvent, StepInput, VisualTransform};

/// Feed tuning defaults
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one step per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Distance between consecutive item centres
    pub const ITEM_SPACING: f32 = 100.0;
    /// Half the viewport height
    pub const VIEWPORT_HALF: f32 = 300.0;

    /// Fraction of velocity removed per second of free travel
    pub const DAMPING_RATE: f32 = 4.0;
    /// Below this speed the feed snaps onto the focused item (units/s)
    pub const MIN_VELOCITY: f32 = 0.5;
    /// Snap interpolation rate
    pub const SNAP_SPEED: f32 = 5.0;
    /// Snap is finished once this close to the target
    pub const SNAP_EPSILON: f32 = 0.01;
    /// Overscroll distance that absorbs all velocity
    pub const ELASTIC_RANGE: f32 = 50.0;

    /// Response curve output scale at dead centre
    pub const MAX_SCALE: f32 = 1.0;
    pub const SHIFT_UP: f32 = 32.0;
    pub const SHIFT_DOWN: f32 = 32.0;
    /// Ratio below which items are fully transparent
    pub const COLOR_PAD: f32 = 0.115;

    /// Smallest spacing / viewport / range the engine will divide by
    pub const MIN_EXTENT: f32 = 1e-3;
    /// Most items a viewport may span; bounds the slot pool
    pub const MAX_WINDOW: usize = 256;
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Interpolate `current` toward `target`, landing exactly once within `epsilon`
#[inline]
pub fn approach(current: f32, target: f32, t: f32, epsilon: f32) -> f32 {
    let next = lerp(current, target, t);
    if (target - next).abs() <= epsilon {
        target
    } else {
        next
    }
}
