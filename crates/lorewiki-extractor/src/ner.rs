//! Candidate extraction
//!
//! Runs the pattern library over prose, scores every match, drops
//! candidates that fail the validity filters or already exist in the
//! knowledge base, collapses repeated texts (first match wins) and returns
//! the highest-confidence candidates.

use std::collections::HashSet;

use lorewiki_core::{EntryCategory, ExtractionConfig};
use tracing::{debug, trace};

use crate::patterns::{
    has_organization_suffix, rules_for, EntityPattern, PatternLibrary, CATEGORY_ORDER,
    NAME_SEPARATORS, PATTERNS,
};
use crate::scoring::{self, MatchSpan};
use crate::span;
use crate::{EntityCandidate, EntityExtractor};

/// Rule-based extractor over the built-in pattern library
pub struct RuleBasedExtractor {
    library: &'static PatternLibrary,
    config: ExtractionConfig,
}

impl RuleBasedExtractor {
    /// Create an extractor with default limits
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    /// Create with custom limits
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self {
            library: &PATTERNS,
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Every valid match of every pattern, in production order
    ///
    /// Categories run in [`CATEGORY_ORDER`], patterns in library order,
    /// matches left to right.
    fn extract_by_patterns(&self, text: &str) -> Vec<EntityCandidate> {
        let mut candidates = Vec::new();

        for category in CATEGORY_ORDER {
            for pattern in self.library.patterns_for(category) {
                self.extract_pattern(pattern, text, &mut candidates);
            }
        }

        candidates
    }

    fn extract_pattern(
        &self,
        pattern: &EntityPattern,
        text: &str,
        candidates: &mut Vec<EntityCandidate>,
    ) {
        for caps in pattern.regex.captures_iter(text) {
            let (Some(whole), Some(group)) = (caps.get(0), caps.get(pattern.group)) else {
                continue;
            };

            let surface = if pattern.strip_separators {
                group
                    .as_str()
                    .chars()
                    .filter(|c| !NAME_SEPARATORS.contains(c))
                    .collect()
            } else {
                group.as_str().to_string()
            };

            if !is_valid(pattern, &surface) {
                trace!(text = %surface, category = %pattern.category, "candidate rejected");
                continue;
            }

            let found_at = MatchSpan::new(group.start(), group.end());
            candidates.push(EntityCandidate {
                confidence: scoring::confidence(pattern.category, &surface, text, found_at),
                suggested_tags: scoring::suggested_tags(pattern.category, &surface, text, found_at),
                context: span::context_window(
                    text,
                    whole.start(),
                    whole.end(),
                    self.config.context_radius,
                )
                .to_string(),
                category: pattern.category,
                text: surface,
            });
        }
    }

    /// Drop candidates whose text matches an existing title, ignoring case
    fn filter_existing(
        candidates: Vec<EntityCandidate>,
        existing_titles: &[String],
    ) -> Vec<EntityCandidate> {
        let existing: HashSet<String> = existing_titles.iter().map(|t| t.to_lowercase()).collect();
        candidates
            .into_iter()
            .filter(|c| !existing.contains(&c.text.to_lowercase()))
            .collect()
    }

    /// Keep the first candidate for each distinct text
    fn deduplicate(candidates: Vec<EntityCandidate>) -> Vec<EntityCandidate> {
        let mut seen: HashSet<String> = HashSet::new();
        candidates
            .into_iter()
            .filter(|c| seen.insert(c.text.clone()))
            .collect()
    }

    /// Sort by descending confidence (stable) and cap the result
    fn rank(&self, mut candidates: Vec<EntityCandidate>) -> Vec<EntityCandidate> {
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        candidates.truncate(self.config.max_candidates);
        candidates
    }
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for RuleBasedExtractor {
    fn extract(&self, text: &str, existing_titles: &[String]) -> Vec<EntityCandidate> {
        if text.chars().count() < self.config.min_text_len {
            return Vec::new();
        }

        let raw = self.extract_by_patterns(text);
        let produced = raw.len();
        let fresh = Self::filter_existing(raw, existing_titles);
        let unique = Self::deduplicate(fresh);
        let ranked = self.rank(unique);

        debug!(produced, returned = ranked.len(), "extraction pass finished");
        ranked
    }
}

/// Length bounds, stop words, and cross-category suffix checks
fn is_valid(pattern: &EntityPattern, surface: &str) -> bool {
    let rules = rules_for(pattern.category);
    let len = surface.chars().count();

    if len < rules.min_chars || len > rules.max_chars {
        return false;
    }
    if rules.stop_words.contains(&surface) {
        return false;
    }

    // Names ending in an organization suffix belong to the organization group
    match pattern.category {
        EntryCategory::Organization => true,
        _ => !has_organization_suffix(surface),
    }
}
