//! Scroll kinematics
//!
//! One scalar velocity (the feed's "inertia") and one offset. Each step is
//! exactly one of three regimes:
//! - captured by a drag: offset follows the pointer, velocity is the
//!   instantaneous pointer speed
//! - captured by a wheel nudge: offset jumps, velocity gains the same speed
//! - free: offset integrates velocity, velocity decays or is absorbed by an
//!   elastic boundary
//!
//! After that, a slow free feed snaps onto the nearest item centre.

use serde::{Deserialize, Serialize};

use crate::settings::{BoundaryMode, FeedConfig};
use crate::{approach, lerp};

/// Offset / velocity pair exposed to collaborators (read-only snapshot)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollState {
    /// Signed scroll position; `p * item_spacing` centres strip position `p`
    pub offset: f32,
    /// Signed rate of change of `offset`, units per second
    pub velocity: f32,
    /// True while a drag (or this step's wheel nudge) owns the offset
    pub captured: bool,
}

/// Legal travel range of a non-wrapping feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub min_offset: f32,
    pub max_offset: f32,
}

impl Boundary {
    pub fn new(min_offset: f32, max_offset: f32) -> Self {
        Self {
            min_offset: min_offset.min(max_offset),
            max_offset: max_offset.max(min_offset),
        }
    }

    /// Distance outside the range (0 when inside)
    pub fn penetration(&self, offset: f32) -> f32 {
        if offset < self.min_offset {
            self.min_offset - offset
        } else if offset > self.max_offset {
            offset - self.max_offset
        } else {
            0.0
        }
    }

    #[inline]
    pub fn clamp(&self, offset: f32) -> f32 {
        offset.clamp(self.min_offset, self.max_offset)
    }

    /// Range widened by `margin` on both sides
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(self.min_offset - margin, self.max_offset + margin)
    }
}

/// Fraction of velocity kept after penetrating `depth` into an elastic range
pub fn elastic_retention(depth: f32, elastic_range: f32) -> f32 {
    if elastic_range <= 0.0 {
        return 0.0;
    }
    (1.0 - depth / elastic_range).clamp(0.0, 1.0)
}

/// Pointer anchor recorded when a drag begins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCapture {
    anchor_offset: f32,
    anchor_pointer: f32,
    pointer: f32,
}

impl DragCapture {
    pub fn new(offset: f32, pointer: f32) -> Self {
        Self {
            anchor_offset: offset,
            anchor_pointer: pointer,
            pointer,
        }
    }

    pub fn move_to(&mut self, pointer: f32) {
        self.pointer = pointer;
    }

    /// Offset that keeps the grabbed point under the pointer
    pub fn target(&self) -> f32 {
        self.anchor_offset + (self.pointer - self.anchor_pointer)
    }

    /// Follow a wrap rebase so the drag continues seamlessly
    pub fn rebase(&mut self, delta: f32) {
        self.anchor_offset += delta;
    }
}

/// What happened at the boundary during one integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryContact {
    None,
    /// Overscrolled; velocity scaled by the retained fraction
    Absorbed { depth: f32, retained: f32 },
    /// Hard stop; velocity zeroed
    Clamped,
}

/// Kinematic state of the feed
#[derive(Debug, Clone, Default)]
pub struct Kinematics {
    state: ScrollState,
    drag: Option<DragCapture>,
    pending_wheel: f32,
}

impl Kinematics {
    pub fn at(offset: f32) -> Self {
        Self {
            state: ScrollState {
                offset,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.state.offset
    }

    #[inline]
    pub fn velocity(&self) -> f32 {
        self.state.velocity
    }

    /// Non-finite input is ignored (velocity zeroed)
    pub fn set_velocity(&mut self, velocity: f32) {
        self.state.velocity = if velocity.is_finite() { velocity } else { 0.0 };
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn begin_drag(&mut self, pointer: f32) {
        if !pointer.is_finite() {
            return;
        }
        self.drag = Some(DragCapture::new(self.state.offset, pointer));
        self.state.captured = true;
    }

    pub fn drag_to(&mut self, pointer: f32) {
        if let Some(drag) = self.drag.as_mut() {
            if pointer.is_finite() {
                drag.move_to(pointer);
            }
        }
    }

    /// Release the drag; the last pointer speed carries on as inertia
    pub fn end_drag(&mut self) {
        self.drag = None;
        self.state.captured = false;
    }

    /// Queue a wheel displacement for the next step
    pub fn nudge(&mut self, displacement: f32) {
        if displacement.is_finite() {
            self.pending_wheel += displacement;
        }
    }

    /// Shift offset and drag anchor together (wrap rebase)
    pub fn rebase(&mut self, delta: f32) {
        self.state.offset += delta;
        if let Some(drag) = self.drag.as_mut() {
            drag.rebase(delta);
        }
    }

    /// Stages 1-2: move the offset and correct at the boundary.
    ///
    /// `bounds` is `None` for a wrapping feed.
    pub fn integrate(&mut self, cfg: &FeedConfig, bounds: Option<Boundary>, dt: f32) -> BoundaryContact {
        let offset = self.state.offset;

        if let Some(drag) = self.drag {
            let (target, contact) = self.limit_captured(cfg, bounds, drag.target());
            self.state.velocity = if contact == BoundaryContact::Clamped {
                0.0
            } else {
                (target - offset) / dt
            };
            self.state.offset = target;
            self.state.captured = true;
            self.pending_wheel = 0.0;
            return contact;
        }

        if self.pending_wheel != 0.0 {
            let displacement = std::mem::take(&mut self.pending_wheel);
            let (target, contact) = self.limit_captured(cfg, bounds, offset + displacement);
            self.state.velocity = if contact == BoundaryContact::Clamped {
                0.0
            } else {
                self.state.velocity + displacement / dt
            };
            self.state.offset = target;
            self.state.captured = true;
            return contact;
        }

        self.state.captured = false;
        let next = offset + self.state.velocity * dt;

        let depth = bounds.map(|b| b.penetration(next)).unwrap_or(0.0);
        match bounds {
            Some(b) if depth > 0.0 => match cfg.boundary_mode {
                BoundaryMode::Elastic => {
                    // Velocity absorbed from the already-moved offset each step.
                    // Not a spring; tuned for feel.
                    let retained = elastic_retention(depth, cfg.elastic_range);
                    self.state.offset = next;
                    self.state.velocity *= retained;
                    BoundaryContact::Absorbed { depth, retained }
                }
                BoundaryMode::Clamped => {
                    self.state.offset = b.clamp(next);
                    self.state.velocity = 0.0;
                    BoundaryContact::Clamped
                }
            },
            _ => {
                self.state.offset = next;
                self.state.velocity = lerp(self.state.velocity, 0.0, cfg.damping_rate * dt);
                BoundaryContact::None
            }
        }
    }

    /// Captured motion: hard stop in clamped mode, at most one elastic range
    /// of overscroll in elastic mode
    fn limit_captured(
        &self,
        cfg: &FeedConfig,
        bounds: Option<Boundary>,
        target: f32,
    ) -> (f32, BoundaryContact) {
        let Some(b) = bounds else {
            return (target, BoundaryContact::None);
        };
        let depth = b.penetration(target);
        if depth == 0.0 {
            return (target, BoundaryContact::None);
        }
        match cfg.boundary_mode {
            BoundaryMode::Clamped => (b.clamp(target), BoundaryContact::Clamped),
            BoundaryMode::Elastic => {
                let limited = b.expanded(cfg.elastic_range).clamp(target);
                let depth = b.penetration(limited);
                let retained = elastic_retention(depth, cfg.elastic_range);
                (limited, BoundaryContact::Absorbed { depth, retained })
            }
        }
    }

    /// Stage 3: once slow and free, drop velocity and ease onto `target`.
    ///
    /// Returns true while snapping.
    pub fn settle(&mut self, cfg: &FeedConfig, target: f32, dt: f32) -> bool {
        if self.drag.is_some() || self.state.captured {
            return false;
        }
        if self.state.velocity.abs() >= cfg.min_velocity {
            return false;
        }
        self.state.velocity = 0.0;
        self.state.offset = approach(self.state.offset, target, cfg.snap_speed * dt, cfg.snap_epsilon);
        true
    }

    /// Reset to rest at `offset`, cancelling any capture
    pub fn reset(&mut self, offset: f32) {
        *self = Self::at(offset);
    }
}
