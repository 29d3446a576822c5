//! Lorewiki Extractor - Heuristic knowledge extraction
//!
//! Proposes wiki entries from authored prose (rule-based entity
//! extraction with confidence scoring) and proposes typed relations
//! between existing entries.

use lorewiki_core::{EntryCategory, RelationType, WikiEntry};
use serde::{Deserialize, Serialize};

/// Proposed wiki entry, not yet committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCandidate {
    /// Matched surface text, used as the entry title
    pub text: String,
    /// Always one of Character, Location, Item, Organization
    pub category: EntryCategory,
    /// Heuristic score in `[0, ceiling]` for the category
    pub confidence: f32,
    /// Source text around the match
    pub context: String,
    /// Tags derived from lexical cues, base tags first
    pub suggested_tags: Vec<String>,
}

/// Proposed relation from a target entry to `entry`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSuggestion {
    /// The other endpoint
    pub entry: WikiEntry,
    pub relation_type: RelationType,
    /// Within 1..=5
    pub strength: u8,
    /// Within `[0, 1]`, accumulated in double precision
    pub confidence: f64,
    /// Triggered heuristics, in evaluation order
    pub reason: String,
}

/// Trait for entity extractors
///
/// Extraction is total: short or empty text yields an empty result.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str, existing_titles: &[String]) -> Vec<EntityCandidate>;
}

pub mod debounce;
pub mod hitl;
pub mod live;
pub mod loader;
pub mod ner;
pub mod patterns;
pub mod relation;
pub mod scoring;
pub mod span;

pub use debounce::Debouncer;
pub use hitl::{ReviewQueue, ReviewStats};
pub use live::LiveExtractor;
pub use loader::{accept_all, accept_candidate, candidate_to_entry, LoadResult};
pub use ner::RuleBasedExtractor;
pub use relation::RelationAnalyzer;
