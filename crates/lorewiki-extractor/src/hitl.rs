//! Human-in-the-loop review of extraction candidates
//!
//! Holds the candidates surfaced by the most recent extraction pass until
//! the author accepts, rejects or dismisses them. Each new pass replaces
//! the surfaced set.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::EntityCandidate;

// ============================================================================
// Review Queue
// ============================================================================

/// Surfaced candidates awaiting a decision
#[derive(Debug, Default)]
pub struct ReviewQueue {
    pending: Vec<EntityCandidate>,
    auto_accepted: Vec<EntityCandidate>,
    auto_accept_threshold: Option<f32>,
    stats: ReviewStats,
}

impl ReviewQueue {
    /// Create a queue without auto-acceptance
    pub fn new() -> Self {
        Self::default()
    }

    /// Auto-accept candidates whose confidence reaches `threshold`
    pub fn with_auto_accept(mut self, threshold: f32) -> Self {
        self.auto_accept_threshold = Some(threshold.clamp(0.0, 1.0));
        self
    }

    /// Replace the surfaced set with the result of a new pass
    ///
    /// Candidates at or above the auto-accept threshold skip review and
    /// wait in [`take_auto_accepted`](Self::take_auto_accepted).
    pub fn replace(&mut self, candidates: Vec<EntityCandidate>) {
        self.pending.clear();
        for candidate in candidates {
            match self.auto_accept_threshold {
                Some(threshold) if candidate.confidence >= threshold => {
                    self.stats.auto_accepted += 1;
                    self.auto_accepted.push(candidate);
                }
                _ => self.pending.push(candidate),
            }
        }
        debug!(
            pending = self.pending.len(),
            auto_accepted = self.auto_accepted.len(),
            "review queue refreshed"
        );
    }

    /// Candidates awaiting a decision, in surfaced order
    pub fn pending(&self) -> &[EntityCandidate] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the candidate with `text` for conversion
    pub fn accept(&mut self, text: &str) -> Option<EntityCandidate> {
        let candidate = self.remove(text)?;
        self.stats.accepted += 1;
        Some(candidate)
    }

    /// Remove the candidate with `text` without converting it
    pub fn reject(&mut self, text: &str) -> bool {
        if self.remove(text).is_some() {
            self.stats.rejected += 1;
            true
        } else {
            false
        }
    }

    /// Clear every pending candidate without recording a decision
    pub fn dismiss_all(&mut self) {
        self.stats.dismissed += self.pending.len();
        self.pending.clear();
    }

    /// Drain the candidates accepted by threshold
    pub fn take_auto_accepted(&mut self) -> Vec<EntityCandidate> {
        std::mem::take(&mut self.auto_accepted)
    }

    /// Decision counts since the queue was created
    pub fn stats(&self) -> ReviewStats {
        ReviewStats {
            pending: self.pending.len(),
            ..self.stats.clone()
        }
    }

    fn remove(&mut self, text: &str) -> Option<EntityCandidate> {
        let index = self.pending.iter().position(|c| c.text == text)?;
        Some(self.pending.remove(index))
    }
}

/// Review statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub pending: usize,
    pub accepted: usize,
    pub auto_accepted: usize,
    pub rejected: usize,
    pub dismissed: usize,
}

impl ReviewStats {
    /// Candidates that received a decision
    pub fn total_reviewed(&self) -> usize {
        self.accepted + self.auto_accepted + self.rejected
    }

    /// Share of reviewed candidates that were accepted
    pub fn acceptance_rate(&self) -> f32 {
        let total = self.total_reviewed();
        if total == 0 {
            0.0
        } else {
            (self.accepted + self.auto_accepted) as f32 / total as f32
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lorewiki_core::EntryCategory;

    fn candidate(text: &str, confidence: f32) -> EntityCandidate {
        EntityCandidate {
            text: text.to_string(),
            category: EntryCategory::Location,
            confidence,
            context: format!("{text}へ向かった"),
            suggested_tags: vec!["location".to_string(), "place".to_string()],
        }
    }

    #[test]
    fn test_replace_surfaces_new_pass() {
        let mut queue = ReviewQueue::new();
        queue.replace(vec![candidate("白銀城", 0.9), candidate("黒鉄城", 0.8)]);
        assert_eq!(queue.pending().len(), 2);

        queue.replace(vec![candidate("紅蓮城", 0.8)]);
        assert_eq!(queue.pending().len(), 1);
        assert_eq!(queue.pending()[0].text, "紅蓮城");
    }

    #[test]
    fn test_accept_removes_and_returns() {
        let mut queue = ReviewQueue::new();
        queue.replace(vec![candidate("白銀城", 0.9), candidate("黒鉄城", 0.8)]);

        let accepted = queue.accept("白銀城").unwrap();
        assert_eq!(accepted.text, "白銀城");
        assert_eq!(queue.pending().len(), 1);
        assert!(queue.accept("白銀城").is_none());
    }

    #[test]
    fn test_reject_and_dismiss() {
        let mut queue = ReviewQueue::new();
        queue.replace(vec![
            candidate("白銀城", 0.9),
            candidate("黒鉄城", 0.8),
            candidate("紅蓮城", 0.7),
        ]);

        assert!(queue.reject("黒鉄城"));
        assert!(!queue.reject("黒鉄城"));

        queue.dismiss_all();
        assert!(queue.is_empty());

        let stats = queue.stats();
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.dismissed, 2);
        assert_eq!(stats.accepted, 0);
    }

    #[test]
    fn test_auto_accept_threshold() {
        let mut queue = ReviewQueue::new().with_auto_accept(0.85);
        queue.replace(vec![candidate("白銀城", 0.9), candidate("黒鉄城", 0.8)]);

        assert_eq!(queue.pending().len(), 1);
        let auto = queue.take_auto_accepted();
        assert_eq!(auto.len(), 1);
        assert_eq!(auto[0].text, "白銀城");
        assert!(queue.take_auto_accepted().is_empty());
    }

    #[test]
    fn test_stats() {
        let mut queue = ReviewQueue::new().with_auto_accept(0.85);
        queue.replace(vec![
            candidate("白銀城", 0.9),
            candidate("黒鉄城", 0.8),
            candidate("紅蓮城", 0.7),
        ]);
        queue.accept("黒鉄城");
        queue.reject("紅蓮城");

        let stats = queue.stats();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.auto_accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.total_reviewed(), 3);
        assert!((stats.acceptance_rate() - 2.0 / 3.0).abs() < 1e-6);
    }
}
