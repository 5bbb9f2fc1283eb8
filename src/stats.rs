//! Session counters
//!
//! Fed from engine events and like gestures; serializable so a driver can
//! dump them at the end of a session.

use serde::{Deserialize, Serialize};

use crate::post::PostKind;
use crate::sim::FeedEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollStats {
    /// One per focus change
    pub posts_scrolled: u64,
    pub total_likes: u64,
    pub liked_neutral: u64,
    pub liked_positive: u64,
    pub liked_negative: u64,
    pub liked_gold: u64,
    /// Wrap rebases (diagnostic)
    pub rebases: u64,
    /// Hard stops at a clamped end
    pub boundary_hits: u64,
}

impl ScrollStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe<T>(&mut self, event: &FeedEvent<T>) {
        match event {
            FeedEvent::FocusChanged { .. } => self.posts_scrolled += 1,
            FeedEvent::Rebased { .. } => self.rebases += 1,
            FeedEvent::BoundaryHit { .. } => self.boundary_hits += 1,
        }
    }

    pub fn observe_all<T>(&mut self, events: &[FeedEvent<T>]) {
        for event in events {
            self.observe(event);
        }
    }

    pub fn track_like(&mut self, kind: PostKind) {
        self.total_likes += 1;
        match kind {
            PostKind::Neutral => self.liked_neutral += 1,
            PostKind::Positive => self.liked_positive += 1,
            PostKind::Negative => self.liked_negative += 1,
            PostKind::Gold => self.liked_gold += 1,
        }
        log::debug!("Like tracked: {} (total {})", kind.as_str(), self.total_likes);
    }

    pub fn likes_of(&self, kind: PostKind) -> u64 {
        match kind {
            PostKind::Neutral => self.liked_neutral,
            PostKind::Positive => self.liked_positive,
            PostKind::Negative => self.liked_negative,
            PostKind::Gold => self.liked_gold,
        }
    }

    /// One-line breakdown, e.g. for a results screen
    pub fn summary(&self) -> String {
        format!(
            "scrolled {} | likes {} (gold {}, pos {}, neg {}, neu {})",
            self.posts_scrolled,
            self.total_likes,
            self.liked_gold,
            self.liked_positive,
            self.liked_negative,
            self.liked_neutral
        )
    }
}
