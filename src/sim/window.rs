//! Virtualization window
//!
//! The feed is laid out on a *strip* of positions. Position `p` sits at
//! offset `p * item_spacing`. In wrap mode the strip is the sequence with a
//! duplicated pad at both ends, so the viewport never sees a seam, and the
//! offset is rebased by one cycle whenever it drifts into a pad.
//!
//! Only a small ring of `VisualSlot`s exists. Strip position `p` is always
//! served by slot `p % pool_len`; when a slot's position changes its content
//! is re-stamped instead of the slot being rebuilt.

use std::ops::Range;

use super::focus::VisualTransform;
use super::kinematics::Boundary;

/// Mapping from strip positions to logical item indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    item_count: usize,
    pad: usize,
    wrap: bool,
}

impl StripLayout {
    /// `item_count` must be non-zero (the engine refuses empty sequences)
    pub fn new(item_count: usize, window_count: usize, wrap: bool) -> Self {
        let item_count = item_count.max(1);
        let pad = if wrap {
            let half = window_count.div_ceil(2) + 1;
            if item_count > half {
                half
            } else {
                // Short sequences are tiled whole until the pad is covered
                half.div_ceil(item_count) * item_count
            }
        } else {
            0
        };
        Self {
            item_count,
            pad,
            wrap,
        }
    }

    /// Number of laid-out positions
    #[inline]
    pub fn len(&self) -> usize {
        self.pad * 2 + self.item_count
    }

    #[inline]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Duplicated positions before (and after) the real sequence
    #[inline]
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Logical item shown at a strip position
    pub fn item_at(&self, position: usize) -> Option<usize> {
        if position >= self.len() {
            return None;
        }
        let shifted = position as i64 - self.pad as i64;
        Some(shifted.rem_euclid(self.item_count as i64) as usize)
    }

    /// Strip position of a logical item inside the un-padded run
    pub fn position_of(&self, item: usize) -> usize {
        self.pad + item.min(self.item_count - 1)
    }

    /// Offset distance of one full cycle through the sequence
    pub fn cycle_length(&self, spacing: f32) -> f32 {
        self.item_count as f32 * spacing
    }

    /// Legal travel range; wrapping strips have none
    pub fn boundary(&self, spacing: f32) -> Option<Boundary> {
        if self.wrap {
            None
        } else {
            Some(Boundary::new(0.0, (self.len() - 1) as f32 * spacing))
        }
    }

    /// Offset correction that brings a wrapping feed back out of its pads.
    ///
    /// Always a whole number of cycles, so the content under the viewport is
    /// unchanged.
    pub fn rebase_delta(&self, offset: f32, spacing: f32, viewport_half: f32) -> f32 {
        if !self.wrap || !offset.is_finite() {
            return 0.0;
        }
        let cycle = self.cycle_length(spacing);
        let low = viewport_half;
        let high = (self.len() - 1) as f32 * spacing - viewport_half;

        if offset < low {
            ((low - offset) / cycle).ceil().max(1.0) * cycle
        } else if offset > high {
            -((offset - high) / cycle).ceil().max(1.0) * cycle
        } else {
            0.0
        }
    }

    /// Strip positions that must be materialised at `offset`
    pub fn visible_range(
        &self,
        offset: f32,
        spacing: f32,
        viewport_half: f32,
        window_count: usize,
    ) -> Range<usize> {
        if !offset.is_finite() {
            return 0..0;
        }
        let start = ((offset - (viewport_half + spacing / 2.0)) / spacing).ceil() as i64;
        let end = start + window_count as i64 + 1;
        let len = self.len() as i64;
        let lo = start.clamp(0, len) as usize;
        let hi = end.clamp(0, len) as usize;
        lo..hi.max(lo)
    }
}

/// A recycled rendering instance
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSlot<T> {
    /// Strip position currently served, `None` when blank
    pub position: Option<usize>,
    /// Logical item behind `position`
    pub item: Option<usize>,
    /// Stamped copy of the item's content; mutated in place by conversions
    pub content: Option<T>,
    pub transform: VisualTransform,
}

impl<T> VisualSlot<T> {
    fn blank() -> Self {
        Self {
            position: None,
            item: None,
            content: None,
            transform: VisualTransform::HIDDEN,
        }
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.position.is_some()
    }

    fn clear(&mut self) {
        self.position = None;
        self.item = None;
        self.content = None;
        self.transform = VisualTransform::HIDDEN;
    }
}

/// Slot bookkeeping counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Slots allocated (constant between re-initializations)
    pub slots: usize,
    /// Slots currently serving a position
    pub bound: usize,
    /// Times any slot was re-stamped with new content
    pub relabels: u64,
}

/// Fixed ring of visual slots
#[derive(Debug, Clone)]
pub struct SlotPool<T> {
    slots: Vec<VisualSlot<T>>,
    relabels: u64,
}

impl<T: Clone> SlotPool<T> {
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size.max(1)).map(|_| VisualSlot::blank()).collect(),
            relabels: 0,
        }
    }

    #[inline]
    fn slot_index(&self, position: usize) -> usize {
        position % self.slots.len()
    }

    /// Bind exactly the positions in `range`, re-stamping moved slots and
    /// blanking the rest
    pub fn bind(&mut self, range: Range<usize>, layout: &StripLayout, items: &[T]) {
        debug_assert!(range.len() <= self.slots.len(), "window larger than pool");

        let n = self.slots.len();
        for slot in &mut self.slots {
            if let Some(p) = slot.position {
                if !range.contains(&p) {
                    slot.clear();
                }
            }
        }

        for position in range {
            let index = position % n;
            let slot = &mut self.slots[index];
            if slot.position == Some(position) {
                continue;
            }
            let item = layout.item_at(position);
            slot.position = Some(position);
            slot.item = item;
            slot.content = item.and_then(|i| items.get(i)).cloned();
            slot.transform = VisualTransform::HIDDEN;
            self.relabels += 1;
        }
    }

    /// Slot serving `position`, if materialised
    pub fn get(&self, position: usize) -> Option<&VisualSlot<T>> {
        let slot = self.slots.get(self.slot_index(position))?;
        (slot.position == Some(position)).then_some(slot)
    }

    pub fn slots(&self) -> &[VisualSlot<T>] {
        &self.slots
    }

    /// Count slots whose content was changed in place
    pub fn record_relabels(&mut self, count: usize) {
        self.relabels += count as u64;
    }

    pub fn slots_mut(&mut self) -> &mut [VisualSlot<T>] {
        &mut self.slots
    }

    pub fn bound(&self) -> impl Iterator<Item = &VisualSlot<T>> {
        self.slots.iter().filter(|s| s.is_bound())
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            slots: self.slots.len(),
            bound: self.bound().count(),
            relabels: self.relabels,
        }
    }
}
