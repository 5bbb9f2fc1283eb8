//! Feed engine
//!
//! Owns the scroll state and the slot window. Collaborators steer it only
//! through `set_velocity` (plus pointer / wheel events) and read it through
//! the focus queries and the slot transforms.
//!
//! One `step` runs the stages in a fixed order:
//! 1. input and integration
//! 2. boundary correction
//! 3. snap onto the focused item when slow
//! 4. wrap rebase
//! 5. focus
//! 6. slot rebinding and response curves

use rand::Rng;

use super::focus::{centre_offset, evaluate_slot, focus_index};
use super::kinematics::{BoundaryContact, Kinematics, ScrollState};
use super::window::{PoolStats, SlotPool, StripLayout, VisualSlot};
use crate::curve::ResponseCurve;
use crate::error::{FeedError, FeedResult};
use crate::settings::FeedConfig;

/// Pointer edge events for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragInput {
    /// Pointer pressed at this projected offset
    Begin(f32),
    /// Pointer moved to this projected offset
    Move(f32),
    /// Pointer released
    End,
}

/// Input gathered for one step
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    /// Pointer drag events, applied in order before integration
    pub drag: Vec<DragInput>,
    /// Raw wheel / touchpad delta
    pub wheel: f32,
}

/// Notifications emitted by `step`
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent<T> {
    /// The centred item changed
    FocusChanged {
        from: Option<T>,
        to: T,
        /// Logical index of `from`
        from_item: Option<usize>,
        /// Logical index of `to`
        to_item: usize,
    },
    /// A wrapping feed jumped by whole cycles; nothing visible moved
    Rebased { delta: f32 },
    /// A clamped feed hit an end and stopped
    BoundaryHit { offset: f32 },
}

/// Everything that exists only while initialized
#[derive(Debug, Clone)]
struct Feed<T> {
    items: Vec<T>,
    layout: StripLayout,
    pool: SlotPool<T>,
    /// Strip position of the focus after the last step
    focus: usize,
}

/// Virtualized infinite-scroll engine
pub struct FeedEngine<T> {
    config: FeedConfig,
    size_curve: Box<dyn ResponseCurve>,
    shift_curve: Box<dyn ResponseCurve>,
    kinematics: Kinematics,
    feed: Option<Feed<T>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for FeedEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedEngine")
            .field("config", &self.config)
            .field("kinematics", &self.kinematics)
            .field("feed", &self.feed)
            .finish_non_exhaustive()
    }
}

impl<T: Clone> FeedEngine<T> {
    /// Create an engine that is not ready until `reinitialize`
    pub fn new(config: FeedConfig) -> Self {
        let config = config.sanitized();
        Self {
            size_curve: Box::new(config.size_curve.clone()),
            shift_curve: Box::new(config.shift_curve.clone()),
            config,
            kinematics: Kinematics::default(),
            feed: None,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Replace the size response curve
    pub fn set_size_curve(&mut self, curve: impl ResponseCurve + 'static) {
        self.size_curve = Box::new(curve);
    }

    /// Replace the shift response curve
    pub fn set_shift_curve(&mut self, curve: impl ResponseCurve + 'static) {
        self.shift_curve = Box::new(curve);
    }

    /// Tear down and rebuild the window around `items`.
    ///
    /// Cancels any drag and zeroes velocity. An empty sequence leaves the
    /// engine not ready.
    pub fn reinitialize(&mut self, items: Vec<T>, wrap: bool, start_index: usize) -> FeedResult<()> {
        self.feed = None;
        self.kinematics.reset(0.0);

        if items.is_empty() {
            log::warn!("Refusing to initialize feed from an empty sequence");
            return Err(FeedError::EmptySequence);
        }

        let window_count = self.config.window_count();
        let layout = StripLayout::new(items.len(), window_count, wrap);
        let start = layout.position_of(start_index);
        if start_index >= items.len() {
            log::warn!("Start index {start_index} clamped to {}", items.len() - 1);
        }

        self.kinematics.reset(centre_offset(start, self.config.item_spacing));
        self.feed = Some(Feed {
            items,
            layout,
            pool: SlotPool::new(window_count.saturating_add(2)),
            focus: start,
        });
        self.refresh();

        log::info!(
            "Feed initialized: {} items, wrap={}, strip={}, slots={}",
            layout.item_count(),
            wrap,
            layout.len(),
            window_count.saturating_add(2)
        );
        Ok(())
    }

    /// True after a successful `reinitialize`
    pub fn is_ready(&self) -> bool {
        self.feed.is_some()
    }

    #[inline]
    pub fn velocity(&self) -> f32 {
        self.kinematics.velocity()
    }

    /// The single write channel for gesture handlers and gameplay systems
    pub fn set_velocity(&mut self, velocity: f32) {
        self.kinematics.set_velocity(velocity);
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.kinematics.offset()
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.kinematics.state()
    }

    pub fn is_captured(&self) -> bool {
        self.kinematics.is_dragging() || self.kinematics.state().captured
    }

    pub fn begin_drag(&mut self, pointer: f32) {
        if self.is_ready() {
            self.kinematics.begin_drag(pointer);
        }
    }

    pub fn drag_to(&mut self, pointer: f32) {
        self.kinematics.drag_to(pointer);
    }

    pub fn end_drag(&mut self) {
        self.kinematics.end_drag();
    }

    /// Queue a wheel / touchpad delta for the next step
    pub fn scroll_wheel(&mut self, delta: f32) {
        if !self.is_ready() || delta == 0.0 {
            return;
        }
        let sign = if self.config.invert_wheel { -1.0 } else { 1.0 };
        self.kinematics.nudge(sign * delta * self.config.wheel_sensitivity);
    }

    /// Strip position currently centred
    pub fn focus_index(&self) -> Option<usize> {
        self.feed.as_ref().map(|f| f.focus)
    }

    /// Logical index of the centred item
    pub fn focus_item(&self) -> Option<usize> {
        let feed = self.feed.as_ref()?;
        feed.layout.item_at(feed.focus)
    }

    /// Content bound to the focus, `None` when not ready
    pub fn focus_content(&self) -> Option<&T> {
        let feed = self.feed.as_ref()?;
        Self::content_at(feed, feed.focus)
    }

    pub fn try_focus_content(&self) -> FeedResult<&T> {
        self.focus_content().ok_or(FeedError::NotInitialized)
    }

    /// Slot content if materialised, else the sequence item
    fn content_at(feed: &Feed<T>, position: usize) -> Option<&T> {
        match feed.pool.get(position) {
            Some(slot) => slot.content.as_ref(),
            None => feed.layout.item_at(position).and_then(|i| feed.items.get(i)),
        }
    }

    /// All slots, bound or blank, in pool order
    pub fn slots(&self) -> &[VisualSlot<T>] {
        self.feed.as_ref().map(|f| f.pool.slots()).unwrap_or(&[])
    }

    /// Bound slots ordered top to bottom
    pub fn visible_slots(&self) -> Vec<&VisualSlot<T>> {
        let mut slots: Vec<_> = self.slots().iter().filter(|s| s.is_bound()).collect();
        slots.sort_by_key(|s| s.position);
        slots
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.feed.as_ref().map(|f| f.pool.stats()).unwrap_or_default()
    }

    pub fn layout(&self) -> Option<StripLayout> {
        self.feed.as_ref().map(|f| f.layout)
    }

    /// Convert a random `fraction` of the currently bound slots whose content
    /// matches.
    ///
    /// Already-converted content is only skipped if `matches` rejects it, so
    /// callers that must not convert twice exclude it in the predicate.
    /// Only the stamped slot copies change; a slot re-bound later shows the
    /// original sequence item again. Returns how many were converted.
    pub fn convert_at_random<R, P, C>(
        &mut self,
        rng: &mut R,
        matches: P,
        mut convert: C,
        fraction: f32,
    ) -> FeedResult<usize>
    where
        R: Rng,
        P: Fn(&T) -> bool,
        C: FnMut(&mut T),
    {
        let feed = self.feed.as_mut().ok_or(FeedError::NotInitialized)?;
        if fraction.is_nan() || fraction <= 0.0 {
            return Ok(0);
        }

        let slots = feed.pool.slots_mut();
        let mut candidates: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.content.as_ref().is_some_and(&matches))
            .map(|(i, _)| i)
            .collect();

        let count = ((candidates.len() as f32 * fraction.min(1.0)).floor() as usize).min(candidates.len());
        if count == 0 {
            return Ok(0);
        }

        // Partial Fisher-Yates: only the first `count` picks matter
        for i in 0..count {
            let j = rng.random_range(i..candidates.len());
            candidates.swap(i, j);
        }
        for &index in &candidates[..count] {
            if let Some(content) = slots[index].content.as_mut() {
                convert(content);
            }
        }
        feed.pool.record_relabels(count);

        log::debug!("Converted {count} of {} matching slots", candidates.len());
        Ok(count)
    }

    /// Convenience wrapper: apply one frame of `input`, then step
    pub fn step_with(&mut self, input: &StepInput, dt: f32) -> Vec<FeedEvent<T>> {
        for event in &input.drag {
            match *event {
                DragInput::Begin(p) => self.begin_drag(p),
                DragInput::Move(p) => self.drag_to(p),
                DragInput::End => self.end_drag(),
            }
        }
        self.scroll_wheel(input.wheel);
        self.step(dt)
    }

    /// Advance one frame. No-op while not ready or for a non-positive `dt`.
    pub fn step(&mut self, dt: f32) -> Vec<FeedEvent<T>> {
        let mut events = Vec::new();
        if !(dt.is_finite() && dt > 0.0) {
            return events;
        }
        let Some(feed) = self.feed.as_ref() else {
            return events;
        };
        let layout = feed.layout;
        let spacing = self.config.item_spacing;

        // 1-2. integration and boundary
        let contact = self.kinematics.integrate(&self.config, layout.boundary(spacing), dt);
        if contact == BoundaryContact::Clamped {
            events.push(FeedEvent::BoundaryHit {
                offset: self.kinematics.offset(),
            });
        }

        // 3. snap
        let target = focus_index(self.kinematics.offset(), spacing, layout.len());
        self.kinematics.settle(&self.config, centre_offset(target, spacing), dt);

        // 4. rebase
        let delta = layout.rebase_delta(self.kinematics.offset(), spacing, self.config.viewport_half);
        let mut previous_focus = feed.focus as i64;
        if delta != 0.0 {
            self.kinematics.rebase(delta);
            // Same item, new strip position: not a focus change
            previous_focus += (delta / spacing).round() as i64;
            log::debug!("Rebased feed by {delta}");
            events.push(FeedEvent::Rebased { delta });
        }

        // 5-6. focus, window, curves
        let before = Self::content_at(feed, feed.focus).cloned();
        let before_item = layout.item_at(feed.focus);

        let focus = self.refresh();
        if focus as i64 != previous_focus {
            if let Some(feed) = self.feed.as_ref() {
                if let (Some(to), Some(to_item)) =
                    (Self::content_at(feed, focus).cloned(), layout.item_at(focus))
                {
                    log::debug!("Focus {:?} -> {}", before_item, to_item);
                    events.push(FeedEvent::FocusChanged {
                        from: before,
                        to,
                        from_item: before_item,
                        to_item,
                    });
                }
            }
        }
        events
    }

    /// Recompute focus, rebind the window and evaluate every bound slot.
    ///
    /// Returns the new focus position.
    fn refresh(&mut self) -> usize {
        let offset = self.kinematics.offset();
        let cfg = &self.config;
        let Some(feed) = self.feed.as_mut() else {
            return 0;
        };

        feed.focus = focus_index(offset, cfg.item_spacing, feed.layout.len());

        let range = feed.layout.visible_range(
            offset,
            cfg.item_spacing,
            cfg.viewport_half,
            cfg.window_count(),
        );
        feed.pool.bind(range, &feed.layout, &feed.items);

        for slot in feed.pool.slots_mut() {
            if let Some(position) = slot.position {
                slot.transform = evaluate_slot(
                    position,
                    offset,
                    cfg,
                    &*self.size_curve,
                    &*self.shift_curve,
                );
            }
        }
        feed.focus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::BoundaryMode;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn letters() -> Vec<&'static str> {
        vec!["A", "B", "C", "D", "E"]
    }

    fn engine_with(cfg: FeedConfig) -> FeedEngine<&'static str> {
        FeedEngine::new(cfg)
    }

    fn focus_changes<T>(events: &[FeedEvent<T>]) -> Vec<(Option<usize>, usize)> {
        events
            .iter()
            .filter_map(|e| match e {
                FeedEvent::FocusChanged {
                    from_item, to_item, ..
                } => Some((*from_item, *to_item)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_not_ready_until_initialized() {
        let mut engine = engine_with(FeedConfig::default());
        assert!(!engine.is_ready());
        assert_eq!(engine.focus_content(), None);
        assert_eq!(engine.try_focus_content(), Err(FeedError::NotInitialized));
        assert!(engine.step(SIM_DT).is_empty());
        assert!(engine.slots().is_empty());

        let mut rng = Pcg32::seed_from_u64(1);
        let err = engine.convert_at_random(&mut rng, |_| true, |_| {}, 1.0);
        assert_eq!(err, Err(FeedError::NotInitialized));
    }

    #[test]
    fn test_empty_sequence_is_reported() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(letters(), true, 0).unwrap();
        assert!(engine.is_ready());

        assert_eq!(engine.reinitialize(Vec::new(), true, 0), Err(FeedError::EmptySequence));
        assert!(!engine.is_ready());
        assert_eq!(engine.focus_content(), None);
    }

    #[test]
    fn test_initial_focus_is_start_index() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(letters(), true, 2).unwrap();
        assert_eq!(engine.focus_content(), Some(&"C"));
        assert_eq!(engine.focus_item(), Some(2));
        assert_eq!(engine.velocity(), 0.0);
    }

    #[test]
    fn test_start_index_is_clamped() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(letters(), false, 99).unwrap();
        assert_eq!(engine.focus_content(), Some(&"E"));
    }

    #[test]
    fn test_velocity_decays_while_offset_climbs() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(letters(), true, 2).unwrap();
        assert_eq!(engine.focus_content(), Some(&"C"));
        engine.set_velocity(50.0);

        let mut last_offset = engine.offset();
        let mut last_velocity = engine.velocity();
        for _ in 0..60 {
            engine.step(SIM_DT);
            assert!(engine.offset() > last_offset);
            assert!(engine.velocity() < last_velocity);
            assert!(engine.velocity() > 0.0);
            last_offset = engine.offset();
            last_velocity = engine.velocity();
        }
    }

    #[test]
    fn test_focus_advances_one_item_at_a_time() {
        let cfg = FeedConfig {
            item_spacing: 5.0,
            viewport_half: 15.0,
            ..Default::default()
        };
        let mut engine = engine_with(cfg);
        engine.reinitialize(letters(), true, 2).unwrap();
        engine.set_velocity(50.0);

        let mut seen = vec![engine.focus_item().unwrap()];
        for _ in 0..60 {
            let events = engine.step(SIM_DT);
            for (from, to) in focus_changes(&events) {
                assert_eq!(from, seen.last().copied());
                assert_eq!(to, (seen.last().unwrap() + 1) % 5);
                seen.push(to);
            }
        }
        assert_eq!(seen, vec![2, 3, 4]);
    }

    #[test]
    fn test_wrap_seam_is_invisible() {
        let cfg = FeedConfig {
            damping_rate: 0.0,
            ..Default::default()
        };
        let mut engine = engine_with(cfg);
        let items = letters();
        engine.reinitialize(items.clone(), true, 0).unwrap();

        let mut rebases = 0;
        let mut focus_trail = vec![engine.focus_item().unwrap()];
        // 40 units per step, three full cycles
        for _ in 0..(3 * 5 * 100 / 40) {
            engine.set_velocity(40.0 / SIM_DT);
            let events = engine.step(SIM_DT);
            rebases += events
                .iter()
                .filter(|e| matches!(e, FeedEvent::Rebased { .. }))
                .count();
            for (_, to) in focus_changes(&events) {
                focus_trail.push(to);
            }

            let item = engine.focus_item().unwrap();
            assert_eq!(engine.focus_content(), Some(&items[item]));
            for slot in engine.visible_slots() {
                let item = slot.item.unwrap();
                assert_eq!(slot.content, Some(items[item]), "blank or stale slot at seam");
            }
        }

        assert!(rebases >= 2);
        for pair in focus_trail.windows(2) {
            assert_eq!(pair[1], (pair[0] + 1) % 5);
        }
        assert!(focus_trail.len() >= 15);
    }

    #[test]
    fn test_rebase_is_not_a_focus_change() {
        let cfg = FeedConfig {
            damping_rate: 0.0,
            ..Default::default()
        };
        let mut engine = engine_with(cfg);
        engine.reinitialize(letters(), true, 0).unwrap();
        assert_eq!(engine.offset(), 400.0);

        // 400 -> 310: no rebase yet
        engine.set_velocity(-90.0 / SIM_DT);
        let first = engine.step(SIM_DT);
        assert!(!first.iter().any(|e| matches!(e, FeedEvent::Rebased { .. })));
        assert_eq!(focus_changes(&first), vec![(Some(0), 4)]);

        // 310 -> 220, rebased to 720
        engine.set_velocity(-90.0 / SIM_DT);
        let second = engine.step(SIM_DT);
        assert!(second.contains(&FeedEvent::Rebased { delta: 500.0 }));
        assert_eq!(focus_changes(&second), vec![(Some(4), 3)]);
        assert_eq!(engine.focus_content(), Some(&"D"));
    }

    #[test]
    fn test_drag_through_items_fires_once_per_item() {
        let mut engine = engine_with(FeedConfig::default());
        let items: Vec<&'static str> = vec!["a"; 10];
        engine.reinitialize(items, false, 0).unwrap();

        engine.begin_drag(0.0);
        let mut changes = Vec::new();
        for k in 1..=60 {
            engine.drag_to(k as f32 * 7.0);
            changes.extend(focus_changes(&engine.step(SIM_DT)));
        }
        engine.end_drag();

        assert_eq!(changes, vec![(Some(0), 1), (Some(1), 2), (Some(2), 3), (Some(3), 4)]);
    }

    #[test]
    fn test_elastic_overscroll_returns() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(letters(), false, 4).unwrap();
        let max = 400.0;

        // Pull half an elastic range past the end and let go with no speed
        engine.begin_drag(0.0);
        engine.drag_to(25.0);
        engine.step(SIM_DT);
        engine.step(SIM_DT);
        engine.end_drag();
        assert!((engine.offset() - (max + 25.0)).abs() < 1e-3);
        assert_eq!(engine.velocity(), 0.0);

        let mut steps = 0;
        while engine.offset() > max {
            engine.step(SIM_DT);
            steps += 1;
            assert!(steps < 300, "did not return, offset {}", engine.offset());
        }
        assert_eq!(engine.offset(), max);
    }

    #[test]
    fn test_slow_feed_snaps_exactly_onto_an_item() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(vec!["a"; 20], false, 1).unwrap();
        engine.set_velocity(600.0);

        for _ in 0..600 {
            engine.step(SIM_DT);
        }
        let focus = engine.focus_index().unwrap();
        assert_eq!(engine.offset(), focus as f32 * 100.0);
        assert_eq!(engine.velocity(), 0.0);

        for _ in 0..60 {
            engine.step(SIM_DT);
        }
        assert_eq!(engine.offset(), focus as f32 * 100.0);
    }

    #[test]
    fn test_clamped_feed_reports_hits() {
        let cfg = FeedConfig {
            boundary_mode: BoundaryMode::Clamped,
            ..Default::default()
        };
        let mut engine = engine_with(cfg);
        engine.reinitialize(letters(), false, 3).unwrap();
        engine.set_velocity(10_000.0);

        let mut hit = false;
        for _ in 0..10 {
            let events = engine.step(SIM_DT);
            if events.iter().any(|e| matches!(e, FeedEvent::BoundaryHit { .. })) {
                hit = true;
                assert_eq!(engine.velocity(), 0.0);
                assert_eq!(engine.offset(), 400.0);
            }
        }
        assert!(hit);
    }

    #[test]
    fn test_reinitialize_cancels_drag() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(letters(), true, 0).unwrap();
        engine.begin_drag(0.0);
        engine.drag_to(60.0);
        engine.step(SIM_DT);
        assert!(engine.is_captured());

        engine.reinitialize(letters(), true, 1).unwrap();
        assert!(!engine.is_captured());
        assert_eq!(engine.velocity(), 0.0);
        assert_eq!(engine.focus_content(), Some(&"B"));
    }

    #[test]
    fn test_wheel_moves_feed() {
        let cfg = FeedConfig {
            wheel_sensitivity: 2.0,
            invert_wheel: true,
            ..Default::default()
        };
        let mut engine = engine_with(cfg);
        engine.reinitialize(vec!["a"; 10], false, 5).unwrap();
        let input = StepInput {
            wheel: 10.0,
            ..Default::default()
        };
        engine.step_with(&input, SIM_DT);
        assert!((engine.offset() - 480.0).abs() < 1e-3);
        assert!(engine.velocity() < 0.0);
    }

    #[test]
    fn test_step_with_drag_events() {
        let mut engine = engine_with(FeedConfig::default());
        engine.reinitialize(vec!["a"; 10], false, 2).unwrap();
        let input = StepInput {
            drag: vec![DragInput::Begin(0.0), DragInput::Move(30.0)],
            ..Default::default()
        };
        engine.step_with(&input, SIM_DT);
        assert!((engine.offset() - 230.0).abs() < 1e-3);
        assert!(engine.is_captured());

        let release = StepInput {
            drag: vec![DragInput::End],
            ..Default::default()
        };
        engine.step_with(&release, SIM_DT);
        assert!(!engine.scroll_state().captured);
    }

    #[test]
    fn test_custom_size_curve() {
        let mut engine = engine_with(FeedConfig::default());
        engine.set_size_curve(|ratio: f32| ratio * 2.0);
        engine.reinitialize(letters(), true, 0).unwrap();
        let focus = engine.focus_index().unwrap();
        let centre = engine
            .visible_slots()
            .into_iter()
            .find(|s| s.position == Some(focus))
            .map(|s| s.transform)
            .unwrap();
        assert!((centre.scale - 2.0).abs() < 1e-6);
        assert_eq!(centre.alpha, 1.0);
    }

    #[test]
    fn test_zero_spacing_does_not_crash() {
        let cfg = FeedConfig {
            item_spacing: 0.0,
            viewport_half: 0.01,
            elastic_range: 0.0,
            ..Default::default()
        };
        let mut engine = engine_with(cfg);
        engine.reinitialize(letters(), false, 0).unwrap();
        engine.set_velocity(1e6);
        for _ in 0..30 {
            engine.step(SIM_DT);
        }
        assert!(engine.offset().is_finite());
        assert!(engine.focus_content().is_some());
        assert!(engine.pool_stats().slots <= engine.config().window_count() + 2);
    }

    #[test]
    fn test_oversized_viewport_is_bounded() {
        let cfg = FeedConfig {
            viewport_half: f32::MAX,
            ..Default::default()
        };
        let mut engine: FeedEngine<u32> = FeedEngine::new(cfg);
        engine.reinitialize(vec![1, 2, 3], false, 0).unwrap();
        assert!(engine.pool_stats().slots <= crate::consts::MAX_WINDOW + 2);

        engine.set_velocity(500.0);
        for _ in 0..10 {
            engine.step(SIM_DT);
        }
        assert!(engine.offset().is_finite());
        assert!(engine.focus_content().is_some());
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Card {
        negative: bool,
        special: bool,
    }

    #[test]
    fn test_convert_touches_only_bound_copies() {
        let mut engine: FeedEngine<Card> = FeedEngine::new(FeedConfig::default());
        let items: Vec<Card> = (0..40)
            .map(|i| Card {
                negative: i % 2 == 0,
                special: false,
            })
            .collect();
        engine.reinitialize(items.clone(), false, 20).unwrap();

        let candidates = engine
            .visible_slots()
            .iter()
            .filter(|s| s.content.as_ref().is_some_and(|c| c.negative))
            .count();
        let before = engine.pool_stats().relabels;
        let mut rng = Pcg32::seed_from_u64(7);
        let converted = engine
            .convert_at_random(&mut rng, |c| c.negative && !c.special, |c| c.special = true, 0.5)
            .unwrap();
        assert_eq!(converted, candidates / 2);

        let specials = engine
            .visible_slots()
            .iter()
            .filter(|s| s.content.as_ref().is_some_and(|c| c.special))
            .count();
        assert_eq!(specials, converted);
        assert_eq!(engine.feed.as_ref().unwrap().items, items);
        assert_eq!(engine.pool_stats().relabels, before + converted as u64);

        assert_eq!(engine.convert_at_random(&mut rng, |_| true, |_| {}, 0.0), Ok(0));
        assert_eq!(engine.convert_at_random(&mut rng, |_| true, |_| {}, f32::NAN), Ok(0));
    }

    #[test]
    fn test_predicate_skips_already_converted() {
        let mut engine: FeedEngine<Card> = FeedEngine::new(FeedConfig::default());
        let items = vec![
            Card {
                negative: true,
                special: false,
            };
            40
        ];
        engine.reinitialize(items, false, 20).unwrap();
        let bound = engine.pool_stats().bound;
        let mut rng = Pcg32::seed_from_u64(11);
        let fresh = |c: &Card| c.negative && !c.special;

        let first = engine
            .convert_at_random(&mut rng, fresh, |c| c.special = true, 0.5)
            .unwrap();
        assert_eq!(first, bound / 2);
        let second = engine
            .convert_at_random(&mut rng, fresh, |c| c.special = true, 1.0)
            .unwrap();
        assert_eq!(second, bound - first);
        let third = engine
            .convert_at_random(&mut rng, fresh, |c| c.special = true, 1.0)
            .unwrap();
        assert_eq!(third, 0);
    }

    #[test]
    fn test_converted_copy_reverts_when_rebound() {
        let mut engine: FeedEngine<Card> = FeedEngine::new(FeedConfig::default());
        let items = vec![
            Card {
                negative: true,
                special: false,
            };
            40
        ];
        engine.reinitialize(items, false, 5).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        engine
            .convert_at_random(&mut rng, |_| true, |c| c.special = true, 1.0)
            .unwrap();
        assert!(engine.focus_content().unwrap().special);

        // Drag far away and back: every slot is re-stamped from the sequence
        engine.begin_drag(0.0);
        engine.drag_to(2000.0);
        engine.step(SIM_DT);
        engine.drag_to(0.0);
        engine.step(SIM_DT);
        engine.end_drag();
        assert!(!engine.focus_content().unwrap().special);
    }

    proptest! {
        #[test]
        fn prop_window_stays_bounded(
            len in 1usize..120,
            wrap in any::<bool>(),
            kicks in proptest::collection::vec(-20_000.0f32..20_000.0, 1..40),
        ) {
            let mut engine: FeedEngine<usize> = FeedEngine::new(FeedConfig::default());
            engine.reinitialize((0..len).collect(), wrap, len / 2).unwrap();
            let cfg = engine.config().clone();
            let pool = cfg.window_count() + 2;

            for kick in kicks {
                engine.set_velocity(kick);
                for _ in 0..5 {
                    engine.step(SIM_DT);
                    let stats = engine.pool_stats();
                    prop_assert_eq!(stats.slots, pool);
                    prop_assert!(stats.bound < pool);

                    let offset = engine.offset();
                    let strip = engine.layout().unwrap().len();
                    let bound: Vec<usize> =
                        engine.visible_slots().iter().filter_map(|s| s.position).collect();
                    for p in 0..strip {
                        let distance = (offset - p as f32 * cfg.item_spacing).abs();
                        if distance < cfg.viewport_half {
                            prop_assert!(bound.contains(&p), "position {} unbound at {}", p, offset);
                        }
                    }
                    for slot in engine.visible_slots() {
                        prop_assert_eq!(slot.content, slot.item);
                    }
                }
            }
        }

        #[test]
        fn prop_wrap_content_repeats_every_cycle(
            len in 1usize..12,
            step_fraction in 0.05f32..0.95,
            forward in any::<bool>(),
            cycles in 1usize..4,
            start in 0usize..12,
        ) {
            let cfg = FeedConfig {
                damping_rate: 0.0,
                min_velocity: 0.0,
                ..Default::default()
            };
            let spacing = cfg.item_spacing;
            let mut engine: FeedEngine<usize> = FeedEngine::new(cfg);
            engine.reinitialize((0..len).collect(), true, start % len).unwrap();
            let pad = engine.layout().unwrap().pad() as i64;
            let n = len as i64;

            let sign = if forward { 1.0 } else { -1.0 };
            let per_step = step_fraction * spacing;
            engine.set_velocity(sign * per_step / SIM_DT);

            // Strip positions shifted away by rebasing, so positions can be
            // compared on one unwrapped axis
            let mut rebased: i64 = 0;
            let first_focus = engine.focus_index().unwrap() as i64;
            let mut last_focus = first_focus;
            let steps = (cycles as f32 * len as f32 / step_fraction).ceil() as usize + 1;

            for _ in 0..steps {
                for event in engine.step(SIM_DT) {
                    if let FeedEvent::Rebased { delta } = event {
                        rebased += (delta / spacing).round() as i64;
                    }
                }

                for slot in engine.visible_slots() {
                    let unwrapped = slot.position.unwrap() as i64 - rebased;
                    let expected = (unwrapped - pad).rem_euclid(n) as usize;
                    prop_assert_eq!(slot.content, Some(expected));
                }

                let focus = engine.focus_index().unwrap() as i64 - rebased;
                prop_assert!((focus - last_focus).abs() <= 1, "focus skipped {} -> {}", last_focus, focus);
                prop_assert!((focus - last_focus) * sign as i64 >= 0, "focus moved backwards");
                last_focus = focus;
            }

            prop_assert!((last_focus - first_focus).abs() >= (cycles as i64) * n - 1);
        }

        #[test]
        fn prop_clamped_feed_never_leaves_range(
            len in 1usize..30,
            kicks in proptest::collection::vec(-50_000.0f32..50_000.0, 1..30),
            drags in proptest::collection::vec(-3_000.0f32..3_000.0, 0..10),
        ) {
            let cfg = FeedConfig { boundary_mode: BoundaryMode::Clamped, ..Default::default() };
            let mut engine: FeedEngine<usize> = FeedEngine::new(cfg);
            engine.reinitialize((0..len).collect(), false, 0).unwrap();
            let max = (len - 1) as f32 * 100.0;

            for kick in kicks {
                engine.set_velocity(kick);
                for _ in 0..4 {
                    let events = engine.step(SIM_DT);
                    prop_assert!(engine.offset() >= 0.0 && engine.offset() <= max);
                    if events.iter().any(|e| matches!(e, FeedEvent::BoundaryHit { .. })) {
                        prop_assert_eq!(engine.velocity(), 0.0);
                    }
                }
            }

            engine.begin_drag(0.0);
            for pointer in drags {
                engine.drag_to(pointer);
                engine.step(SIM_DT);
                prop_assert!(engine.offset() >= 0.0 && engine.offset() <= max);
            }
            engine.end_drag();
        }
    }
}
