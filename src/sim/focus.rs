//! Focus and response curves
//!
//! The focused position is whichever strip position is nearest the viewport
//! centre. Every materialised slot gets a transform from its distance to the
//! centre: size from `size_curve`, a pull toward the centre from
//! `shift_curve`, and a fade near the edges.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::curve::ResponseCurve;
use crate::settings::FeedConfig;

/// Per-slot presentation values (y-up, relative to the viewport centre)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualTransform {
    /// Layout position plus shift
    pub translation: Vec2,
    pub scale: f32,
    /// Perpendicular pull toward the centre (already included in `translation`)
    pub shift: f32,
    pub alpha: f32,
    /// 1 at dead centre, 0 at the viewport edge
    pub ratio: f32,
}

impl VisualTransform {
    pub const HIDDEN: Self = Self {
        translation: Vec2::ZERO,
        scale: 0.0,
        shift: 0.0,
        alpha: 0.0,
        ratio: 0.0,
    };
}

/// Strip position nearest the viewport centre
pub fn focus_index(offset: f32, spacing: f32, strip_len: usize) -> usize {
    if strip_len == 0 || !offset.is_finite() {
        return 0;
    }
    let raw = (offset / spacing).round();
    raw.clamp(0.0, (strip_len - 1) as f32) as usize
}

/// Offset that centres a strip position
#[inline]
pub fn centre_offset(position: usize, spacing: f32) -> f32 {
    position as f32 * spacing
}

/// 1 at the centre, falling linearly to 0 at `viewport_half - padding`
pub fn centredness(distance: f32, cfg: &FeedConfig) -> f32 {
    (1.0 - distance.abs() / cfg.ratio_extent()).clamp(0.0, 1.0)
}

/// Fade: transparent below `color_pad`, opaque at the centre
pub fn fade(ratio: f32, color_pad: f32) -> f32 {
    let span = (1.0 - color_pad).max(f32::EPSILON);
    ((ratio - color_pad) / span).clamp(0.0, 1.0)
}

/// Transform for the slot serving `position`
pub fn evaluate_slot(
    position: usize,
    offset: f32,
    cfg: &FeedConfig,
    size_curve: &dyn ResponseCurve,
    shift_curve: &dyn ResponseCurve,
) -> VisualTransform {
    // Positive when the item has scrolled above the centre
    let distance = offset - centre_offset(position, cfg.item_spacing);
    let ratio = centredness(distance, cfg);

    let pull = shift_curve.evaluate(1.0 - ratio);
    let shift = if distance > 0.0 {
        -pull * cfg.shift_up
    } else {
        pull * cfg.shift_down
    };

    VisualTransform {
        translation: Vec2::new(0.0, distance + shift),
        scale: cfg.max_scale * size_curve.evaluate(ratio),
        shift,
        alpha: fade(ratio, cfg.color_pad),
        ratio,
    }
}
