//! Gesture handlers
//!
//! Each handler steers the feed only through its velocity and reads only the
//! focused content. None of them own any scroll state.

use serde::{Deserialize, Serialize};

use crate::lerp;
use crate::post::{Post, PostKind};
use crate::sim::FeedEngine;

// === Tap ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapTuning {
    /// Below this speed a tap accelerates, above it a tap brakes
    pub speed_threshold: f32,
    /// Speed added by an accelerating tap
    pub speed_up: f32,
    /// Speed multiplier of a braking tap
    pub slow_multiplier: f32,
}

impl Default for TapTuning {
    fn default() -> Self {
        Self {
            speed_threshold: 300.0,
            speed_up: 24.0,
            slow_multiplier: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    SpeedUp,
    SlowDown,
}

/// Single tap: nudge a slow feed, brake a fast one. Direction is kept; a
/// resting feed counts as moving forward.
pub fn tap<T: Clone>(engine: &mut FeedEngine<T>, tuning: &TapTuning) -> TapOutcome {
    let velocity = engine.velocity();
    let direction = if velocity < 0.0 { -1.0 } else { 1.0 };
    let speed = velocity.abs();

    let (speed, outcome) = if speed < tuning.speed_threshold {
        (speed + tuning.speed_up, TapOutcome::SpeedUp)
    } else {
        (speed * tuning.slow_multiplier, TapOutcome::SlowDown)
    };

    log::debug!("Tap {outcome:?}: speed {speed}");
    engine.set_velocity(speed * direction);
    outcome
}

// === Hold charge ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldTuning {
    /// Hold time for a full charge (seconds)
    pub max_hold: f32,
    /// Launch speed at the minimum useful charge
    pub min_power: f32,
    /// Launch speed at full charge
    pub max_power: f32,
    /// Delay between release and launch (seconds)
    pub pre_launch_pause: f32,
    /// Charge ratio below which a release is cancelled
    pub min_charge: f32,
    /// Existing momentum above this speed is halved when charging starts
    pub damp_above: f32,
}

impl Default for HoldTuning {
    fn default() -> Self {
        Self {
            max_hold: 2.0,
            min_power: 600.0,
            max_power: 4800.0,
            pre_launch_pause: 0.35,
            min_charge: 0.1,
            damp_above: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldPhase {
    Idle,
    Charging { held: f32 },
    /// Released with enough charge; launches once `remaining` runs out
    PreLaunch { ratio: f32, remaining: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldEvent {
    /// Charge reached 100% (reported once per hold)
    FullyCharged,
    /// Released too early; nothing happens
    Cancelled,
    Launched { velocity: f32 },
}

/// Timed hold-to-launch state machine
#[derive(Debug, Clone)]
pub struct HoldCharge {
    pub tuning: HoldTuning,
    phase: HoldPhase,
    full_reported: bool,
}

impl HoldCharge {
    pub fn new(tuning: HoldTuning) -> Self {
        Self {
            tuning,
            phase: HoldPhase::Idle,
            full_reported: false,
        }
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    /// Charge ratio in [0, 1]
    pub fn charge(&self) -> f32 {
        match self.phase {
            HoldPhase::Idle => 0.0,
            HoldPhase::Charging { held } => self.ratio(held),
            HoldPhase::PreLaunch { ratio, .. } => ratio,
        }
    }

    fn ratio(&self, held: f32) -> f32 {
        if self.tuning.max_hold <= 0.0 {
            return 1.0;
        }
        (held / self.tuning.max_hold).clamp(0.0, 1.0)
    }

    /// Pointer held down long enough to count as a hold. Restarts a pending
    /// launch.
    pub fn begin<T: Clone>(&mut self, engine: &mut FeedEngine<T>) {
        let velocity = engine.velocity();
        if velocity.abs() > self.tuning.damp_above {
            engine.set_velocity(velocity * 0.5);
        }
        self.phase = HoldPhase::Charging { held: 0.0 };
        self.full_reported = false;
        log::debug!("Hold charge started");
    }

    /// Pointer released
    pub fn release(&mut self) -> Option<HoldEvent> {
        let HoldPhase::Charging { held } = self.phase else {
            return None;
        };
        let ratio = self.ratio(held);
        if ratio < self.tuning.min_charge {
            self.phase = HoldPhase::Idle;
            log::debug!("Hold released at {ratio:.2}, cancelled");
            return Some(HoldEvent::Cancelled);
        }
        self.phase = HoldPhase::PreLaunch {
            ratio,
            remaining: self.tuning.pre_launch_pause,
        };
        None
    }

    /// Advance timers; launches through `set_velocity` when the pause ends
    pub fn update<T: Clone>(&mut self, engine: &mut FeedEngine<T>, dt: f32) -> Option<HoldEvent> {
        match self.phase {
            HoldPhase::Idle => None,
            HoldPhase::Charging { held } => {
                let held = held + dt;
                self.phase = HoldPhase::Charging { held };
                if self.ratio(held) >= 1.0 && !self.full_reported {
                    self.full_reported = true;
                    return Some(HoldEvent::FullyCharged);
                }
                None
            }
            HoldPhase::PreLaunch { ratio, remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = HoldPhase::PreLaunch { ratio, remaining };
                    return None;
                }
                let velocity = lerp(self.tuning.min_power, self.tuning.max_power, ratio);
                engine.set_velocity(velocity);
                self.phase = HoldPhase::Idle;
                log::info!("Hold launch at {:.0}% charge: {velocity}", ratio * 100.0);
                Some(HoldEvent::Launched { velocity })
            }
        }
    }
}

impl Default for HoldCharge {
    fn default() -> Self {
        Self::new(HoldTuning::default())
    }
}

// === Like ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LikeTuning {
    /// Velocity multiplier per like
    pub slow_down: f32,
    /// How long a Gold post stays likeable after leaving the centre (seconds)
    pub gold_grace: f32,
}

impl Default for LikeTuning {
    fn default() -> Self {
        Self {
            slow_down: 0.95,
            gold_grace: 0.5,
        }
    }
}

/// Multi-tap like, with a grace window for Gold posts that just scrolled by
#[derive(Debug, Clone, Default)]
pub struct LikeHandler {
    pub tuning: LikeTuning,
    current: Option<Post>,
    previous: Option<Post>,
    since_change: f32,
}

impl LikeHandler {
    pub fn new(tuning: LikeTuning) -> Self {
        Self {
            tuning,
            ..Default::default()
        }
    }

    /// Track the centred post; call once per frame
    pub fn observe(&mut self, focus: Option<&Post>, dt: f32) {
        let changed = match (self.current.as_ref(), focus) {
            (Some(a), Some(b)) => a.index != b.index,
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.previous = self.current.take();
            self.current = focus.copied();
            self.since_change = 0.0;
        } else {
            self.since_change += dt;
        }
    }

    /// Post a like would land on right now
    pub fn target(&self, focus: Option<&Post>) -> Option<Post> {
        if let Some(previous) = self.previous {
            let left_recently = self.since_change < self.tuning.gold_grace;
            let moved_on = focus.is_none_or(|f| f.index != previous.index);
            if previous.kind == PostKind::Gold && left_recently && moved_on {
                return Some(previous);
            }
        }
        focus.copied()
    }

    /// Like the target post and brake the feed
    pub fn like(&mut self, engine: &mut FeedEngine<Post>) -> Option<Post> {
        let target = self.target(engine.focus_content())?;
        if target.kind == PostKind::Gold && engine.focus_content().is_some_and(|f| f.index != target.index) {
            log::info!("Gold grace: liking {target}");
        }
        engine.set_velocity(engine.velocity() * self.tuning.slow_down);
        log::debug!("Liked {target}");
        Some(target)
    }
}
