//! Feed tuning
//!
//! Everything a designer might retune lives here as plain data. The engine
//! only ever runs on a `sanitized()` copy, so degenerate values (zero
//! spacing, negative ranges, NaN) are clamped instead of dividing by zero
//! mid-frame.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::curve::KeyframeCurve;
use crate::error::{FeedError, FeedResult};

/// How a non-wrapping feed behaves at its ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoundaryMode {
    /// Overscroll allowed; velocity absorbed in proportion to penetration
    #[default]
    Elastic,
    /// Hard stop at the ends
    Clamped,
}

impl BoundaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryMode::Elastic => "Elastic",
            BoundaryMode::Clamped => "Clamped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "elastic" => Some(BoundaryMode::Elastic),
            "clamped" | "clamp" => Some(BoundaryMode::Clamped),
            _ => None,
        }
    }
}

/// Feed tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    // === Layout ===
    /// Distance between consecutive item centres
    pub item_spacing: f32,
    /// Half the viewport height
    pub viewport_half: f32,
    /// Inset from the viewport edge where the response ratio reaches 0
    pub padding: f32,

    // === Response ===
    /// Ratio below which items are fully transparent (0..1)
    pub color_pad: f32,
    /// Scale at dead centre, multiplied by `size_curve`
    pub max_scale: f32,
    /// Shift applied to items above centre, multiplied by `shift_curve`
    pub shift_up: f32,
    /// Shift applied to items below centre, multiplied by `shift_curve`
    pub shift_down: f32,
    pub size_curve: KeyframeCurve,
    pub shift_curve: KeyframeCurve,

    // === Kinematics ===
    /// Per-second interpolation fraction pulling velocity toward zero
    pub damping_rate: f32,
    /// Speed under which the feed snaps onto the focused item
    pub min_velocity: f32,
    /// Snap interpolation rate
    pub snap_speed: f32,
    /// Distance at which a snap lands exactly on its target
    pub snap_epsilon: f32,
    /// Overscroll depth that absorbs all velocity (elastic mode)
    pub elastic_range: f32,
    pub boundary_mode: BoundaryMode,

    // === Wheel / touchpad ===
    pub wheel_sensitivity: f32,
    pub invert_wheel: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            item_spacing: ITEM_SPACING,
            viewport_half: VIEWPORT_HALF,
            padding: 0.0,

            color_pad: COLOR_PAD,
            max_scale: MAX_SCALE,
            shift_up: SHIFT_UP,
            shift_down: SHIFT_DOWN,
            size_curve: KeyframeCurve::ease_in_out(0.25, 1.0),
            shift_curve: KeyframeCurve::linear(&[(0.0, 0.0), (1.0, 1.0)]),

            damping_rate: DAMPING_RATE,
            min_velocity: MIN_VELOCITY,
            snap_speed: SNAP_SPEED,
            snap_epsilon: SNAP_EPSILON,
            elastic_range: ELASTIC_RANGE,
            boundary_mode: BoundaryMode::Elastic,

            wheel_sensitivity: 0.5,
            invert_wheel: false,
        }
    }
}

impl FeedConfig {
    /// Copy with every degenerate value clamped to something the engine can divide by
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut cfg = self.clone();

        cfg.item_spacing = at_least("item_spacing", cfg.item_spacing, MIN_EXTENT);
        cfg.viewport_half = at_least("viewport_half", cfg.viewport_half, MIN_EXTENT);
        let max_half = cfg.item_spacing * MAX_WINDOW as f32 / 2.0;
        if cfg.viewport_half > max_half {
            log::warn!(
                "viewport_half {} spans more than {MAX_WINDOW} items, clamped to {max_half}",
                cfg.viewport_half
            );
            cfg.viewport_half = max_half;
        }
        cfg.padding = finite_or("padding", cfg.padding, 0.0);
        cfg.color_pad = finite_or("color_pad", cfg.color_pad, defaults.color_pad);
        if !(0.0..1.0).contains(&cfg.color_pad) {
            log::warn!("color_pad {} outside [0, 1), clamped", cfg.color_pad);
            cfg.color_pad = cfg.color_pad.clamp(0.0, 0.999);
        }
        cfg.max_scale = finite_or("max_scale", cfg.max_scale, defaults.max_scale);
        cfg.shift_up = finite_or("shift_up", cfg.shift_up, defaults.shift_up);
        cfg.shift_down = finite_or("shift_down", cfg.shift_down, defaults.shift_down);

        cfg.damping_rate = at_least("damping_rate", cfg.damping_rate, 0.0);
        cfg.min_velocity = at_least("min_velocity", cfg.min_velocity, 0.0);
        cfg.snap_speed = at_least("snap_speed", cfg.snap_speed, 0.0);
        cfg.snap_epsilon = at_least("snap_epsilon", cfg.snap_epsilon, f32::EPSILON);
        // Zero range is legal: it means "absorb everything at once"
        cfg.elastic_range = at_least("elastic_range", cfg.elastic_range, 0.0);
        cfg.wheel_sensitivity =
            finite_or("wheel_sensitivity", cfg.wheel_sensitivity, defaults.wheel_sensitivity);

        if cfg.size_curve.is_empty() {
            log::warn!("size_curve has no keys, using default");
            cfg.size_curve = defaults.size_curve;
        }
        if cfg.shift_curve.is_empty() {
            log::warn!("shift_curve has no keys, using default");
            cfg.shift_curve = defaults.shift_curve;
        }
        cfg
    }

    /// Number of item slots that fit in the viewport (1..=MAX_WINDOW)
    pub fn window_count(&self) -> usize {
        let spacing = self.item_spacing.max(MIN_EXTENT);
        let count = (self.viewport_half.max(0.0) * 2.0 / spacing).ceil();
        (count.min(MAX_WINDOW as f32) as usize).clamp(1, MAX_WINDOW)
    }

    /// Denominator of the centredness ratio
    pub fn ratio_extent(&self) -> f32 {
        (self.viewport_half - self.padding).max(MIN_EXTENT)
    }

    /// Load from JSON string
    pub fn from_json(json: &str) -> FeedResult<Self> {
        serde_json::from_str(json).map_err(|e| FeedError::Config(format!("JSON parse error: {e}")))
    }

    pub fn to_json(&self) -> FeedResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FeedError::Config(format!("JSON encode error: {e}")))
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> FeedResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FeedError::Config(format!("reading {}: {e}", path.display())))?;
        let cfg = Self::from_json(&json)?;
        log::info!("Loaded feed config from {}", path.display());
        Ok(cfg)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> FeedResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .map_err(|e| FeedError::Config(format!("writing {}: {e}", path.display())))
    }
}

fn at_least(name: &str, value: f32, min: f32) -> f32 {
    if value.is_finite() && value >= min {
        value
    } else {
        log::warn!("{name} {value} is degenerate, clamped to {min}");
        min
    }
}

fn finite_or(name: &str, value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        log::warn!("{name} is not finite, using {fallback}");
        fallback
    }
}
