//! Relation suggestion
//!
//! Scores every other entry against a target entry using tag overlap,
//! category pairs, cross mentions, shared first-mention scene and
//! importance, and proposes typed relations. Applying suggestions writes
//! the forward relation and its mirror in one knowledge-base commit.

use std::collections::HashSet;

use lorewiki_core::{
    EntryCategory, KnowledgeBase, Relation, RelationConfig, RelationType, Result, WikiEntry,
    WikiError,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::RelationSuggestion;

/// Confidence added per shared tag
pub const TAG_OVERLAP_WEIGHT: f64 = 0.2;
/// Confidence added when both entries share a category
pub const SAME_CATEGORY_BONUS: f64 = 0.15;
/// Confidence added per direction of cross mention
pub const MENTION_BONUS: f64 = 0.3;
/// Confidence added when both entries were first mentioned in one scene
pub const SAME_SCENE_BONUS: f64 = 0.25;
/// Multiplier on the smaller importance (0-100 scale)
pub const IMPORTANCE_WEIGHT: f64 = 0.05;

/// Heuristic attached to an unordered category pair
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub categories: (EntryCategory, EntryCategory),
    pub relation_type: RelationType,
    pub confidence: f64,
    pub strength: u8,
    pub reason: &'static str,
}

/// Fixed category-pair table
pub static CATEGORY_RULES: [CategoryRule; 6] = [
    CategoryRule {
        categories: (EntryCategory::Character, EntryCategory::Location),
        relation_type: RelationType::LocatedIn,
        confidence: 0.2,
        strength: 2,
        reason: "character and location",
    },
    CategoryRule {
        categories: (EntryCategory::Character, EntryCategory::Organization),
        relation_type: RelationType::BelongsTo,
        confidence: 0.25,
        strength: 3,
        reason: "character and organization",
    },
    CategoryRule {
        categories: (EntryCategory::Character, EntryCategory::Item),
        relation_type: RelationType::RelatedTo,
        confidence: 0.15,
        strength: 2,
        reason: "character and item",
    },
    CategoryRule {
        categories: (EntryCategory::Item, EntryCategory::Location),
        relation_type: RelationType::LocatedIn,
        confidence: 0.2,
        strength: 2,
        reason: "item and location",
    },
    CategoryRule {
        categories: (EntryCategory::Event, EntryCategory::Character),
        relation_type: RelationType::AppearsWith,
        confidence: 0.3,
        strength: 3,
        reason: "event and character",
    },
    CategoryRule {
        categories: (EntryCategory::Event, EntryCategory::Location),
        relation_type: RelationType::LocatedIn,
        confidence: 0.25,
        strength: 3,
        reason: "event and location",
    },
];

/// Look up the rule for a category pair in either order
pub fn category_rule(a: EntryCategory, b: EntryCategory) -> Option<&'static CategoryRule> {
    CATEGORY_RULES
        .iter()
        .find(|r| r.categories == (a, b))
        .or_else(|| CATEGORY_RULES.iter().find(|r| r.categories == (b, a)))
}

/// Relation analyzer
pub struct RelationAnalyzer {
    config: RelationConfig,
}

impl RelationAnalyzer {
    /// Create an analyzer with default limits
    pub fn new() -> Self {
        Self::with_config(RelationConfig::default())
    }

    /// Create with custom limits
    pub fn with_config(config: RelationConfig) -> Self {
        Self { config }
    }

    /// Suggestions for `target` among `all_entries`
    ///
    /// Skips the target itself and entries it already relates to. Results
    /// score strictly above the configured minimum, sorted by descending
    /// confidence and capped.
    pub fn generate_suggestions(
        &self,
        target: &WikiEntry,
        all_entries: &[WikiEntry],
    ) -> Vec<RelationSuggestion> {
        let existing: HashSet<Uuid> = target.relations.iter().map(|r| r.target_id).collect();

        let mut suggestions: Vec<RelationSuggestion> = all_entries
            .iter()
            .filter(|e| e.id != target.id && !existing.contains(&e.id))
            .filter_map(|e| self.analyze_pair(target, e))
            .collect();

        suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        suggestions.truncate(self.config.max_suggestions);

        debug!(
            target = %target.title,
            candidates = all_entries.len(),
            suggestions = suggestions.len(),
            "relation analysis finished"
        );
        suggestions
    }

    /// Score a single pair; `None` when the score does not clear the minimum
    pub fn analyze_pair(&self, a: &WikiEntry, b: &WikiEntry) -> Option<RelationSuggestion> {
        let mut confidence = 0.0_f64;
        let mut relation_type = RelationType::RelatedTo;
        let mut strength: u8 = 1;
        let mut reasons: Vec<String> = Vec::new();

        let common_tags: Vec<&str> = a
            .tags
            .iter()
            .filter(|t| b.has_tag(t))
            .map(String::as_str)
            .collect();
        if !common_tags.is_empty() {
            confidence += common_tags.len() as f64 * TAG_OVERLAP_WEIGHT;
            reasons.push(format!("Shared tags: {}.", common_tags.join(", ")));
        }

        if a.category == b.category {
            confidence += SAME_CATEGORY_BONUS;
            reasons.push(format!("Same category ({}).", a.category));
        }

        if let Some(rule) = category_rule(a.category, b.category) {
            confidence += rule.confidence;
            relation_type = rule.relation_type;
            strength = rule.strength;
            reasons.push(format!("Pairing of {}.", rule.reason));
        }

        let (mention_score, mention_reasons) = cross_mentions(a, b);
        if mention_score > 0.0 {
            confidence += mention_score;
            reasons.extend(mention_reasons);
        }

        if let (Some(scene_a), Some(scene_b)) = (
            &a.metadata.first_mention_scene,
            &b.metadata.first_mention_scene,
        ) {
            if scene_a == scene_b {
                confidence += SAME_SCENE_BONUS;
                reasons.push("First mentioned in the same scene.".to_string());
            }
        }

        // Importance is on a 0-100 scale and usually saturates the score
        let importance = a.metadata.importance.min(b.metadata.importance);
        confidence += f64::from(importance) * IMPORTANCE_WEIGHT;

        let confidence = confidence.clamp(0.0, 1.0);
        if confidence <= self.config.min_confidence {
            return None;
        }

        Some(RelationSuggestion {
            entry: b.clone(),
            relation_type,
            strength: strength.clamp(Relation::MIN_STRENGTH, Relation::MAX_STRENGTH),
            confidence,
            reason: reasons.join(" "),
        })
    }

    /// Commit the selected suggestions for `target_id`
    ///
    /// Each selection adds a bidirectional relation on the target and a
    /// mirror relation on the other endpoint. Every touched entry is written
    /// once in a single [`KnowledgeBase::commit`], so either all relations
    /// land or none do. Selections pointing at the target itself or at an
    /// entry that no longer exists are skipped. Returns the number of
    /// relations applied.
    pub fn apply_suggestions<K>(
        &self,
        kb: &mut K,
        target_id: Uuid,
        suggestions: &[RelationSuggestion],
        selected: &HashSet<Uuid>,
    ) -> Result<usize>
    where
        K: KnowledgeBase + ?Sized,
    {
        let mut target = kb
            .get(target_id)
            .cloned()
            .ok_or_else(|| WikiError::NotFound(target_id.to_string()))?;

        // One entry per endpoint so repeated selections accumulate
        let mut batch: Vec<WikiEntry> = Vec::new();
        let mut applied = 0;

        for suggestion in suggestions
            .iter()
            .filter(|s| selected.contains(&s.entry.id))
        {
            let other_id = suggestion.entry.id;
            if other_id == target_id {
                warn!(entry = %other_id, "suggestion points at its own target, skipping");
                continue;
            }

            let index = match batch.iter().position(|e| e.id == other_id) {
                Some(index) => index,
                None => {
                    let Some(other) = kb.get(other_id) else {
                        warn!(entry = %other_id, "suggested entry no longer exists, skipping");
                        continue;
                    };
                    batch.push(other.clone());
                    batch.len() - 1
                }
            };

            let forward = Relation::new(other_id, suggestion.relation_type, suggestion.strength)
                .with_description(suggestion.reason.clone())
                .bidirectional();

            let mirror = Relation::new(target.id, forward.relation_type, forward.strength)
                .with_description(format!("Related to {}", target.title))
                .bidirectional();

            batch[index].relations.push(mirror);
            target.relations.push(forward);
            applied += 1;
        }

        if applied == 0 {
            return Ok(0);
        }

        info!(target = %target.title, applied, "applying relation suggestions");
        batch.insert(0, target);
        kb.commit(batch)?;
        Ok(applied)
    }
}

impl Default for RelationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Score for each direction in which one entry's text names the other
fn cross_mentions(a: &WikiEntry, b: &WikiEntry) -> (f64, Vec<String>) {
    let text_a = a.searchable_text().to_lowercase();
    let text_b = b.searchable_text().to_lowercase();
    let title_a = a.title.to_lowercase();
    let title_b = b.title.to_lowercase();

    let mut score = 0.0;
    let mut reasons = Vec::new();

    if !title_b.is_empty() && text_a.contains(&title_b) {
        score += MENTION_BONUS;
        reasons.push(format!("\"{}\" mentions \"{}\".", a.title, b.title));
    }
    if !title_a.is_empty() && text_b.contains(&title_a) {
        score += MENTION_BONUS;
        reasons.push(format!("\"{}\" mentions \"{}\".", b.title, a.title));
    }

    (score, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorewiki_core::{InMemoryWiki, NewWikiEntry};

    fn entry(title: &str, category: EntryCategory, tags: &[&str]) -> WikiEntry {
        NewWikiEntry::new(title, category)
            .with_tags(tags.iter().copied())
            .into_entry()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_category_rule_either_order() {
        let rule = category_rule(EntryCategory::Location, EntryCategory::Character).unwrap();
        assert_eq!(rule.relation_type, RelationType::LocatedIn);
        assert_eq!(rule.strength, 2);

        let rule = category_rule(EntryCategory::Character, EntryCategory::Event).unwrap();
        assert_eq!(rule.relation_type, RelationType::AppearsWith);

        assert!(category_rule(EntryCategory::Concept, EntryCategory::Item).is_none());
        assert!(category_rule(EntryCategory::Character, EntryCategory::Character).is_none());
    }

    #[test]
    fn test_tag_overlap_and_same_category() {
        let analyzer = RelationAnalyzer::new();
        let a = entry("Alice", EntryCategory::Character, &["character", "knight"]);
        let b = entry("Bob", EntryCategory::Character, &["character", "knight", "royalty"]);

        let suggestion = analyzer.analyze_pair(&a, &b).unwrap();
        // 2 * 0.2 + 0.15
        assert!(approx(suggestion.confidence, 0.55));
        assert_eq!(suggestion.relation_type, RelationType::RelatedTo);
        assert_eq!(suggestion.strength, 1);
        assert!(suggestion.reason.contains("character, knight"));
    }

    #[test]
    fn test_category_pair_overrides_type_and_strength() {
        let analyzer = RelationAnalyzer::new();
        let a = entry("Alice", EntryCategory::Character, &["hero"]);
        let b = entry("Royal Academy", EntryCategory::Organization, &["hero"]);

        let suggestion = analyzer.analyze_pair(&a, &b).unwrap();
        // 0.2 + 0.25
        assert!(approx(suggestion.confidence, 0.45));
        assert_eq!(suggestion.relation_type, RelationType::BelongsTo);
        assert_eq!(suggestion.strength, 3);
    }

    #[test]
    fn test_cross_mentions_stack() {
        let analyzer = RelationAnalyzer::new();
        let mut a = entry("Alice", EntryCategory::Concept, &[]);
        a.content.markdown = "Alice studies at the ACADEMY.".to_string();
        let mut b = entry("Academy", EntryCategory::Event, &[]);
        b.content.summary = "Where alice studies".to_string();

        let suggestion = analyzer.analyze_pair(&a, &b).unwrap();
        assert!(approx(suggestion.confidence, 0.6));
        assert!(suggestion.reason.contains("\"Alice\" mentions \"Academy\""));
        assert!(suggestion.reason.contains("\"Academy\" mentions \"Alice\""));
    }

    #[test]
    fn test_same_scene_bonus_requires_both_scenes() {
        let analyzer = RelationAnalyzer::new();
        let mut a = entry("Storm", EntryCategory::Concept, &["weather"]);
        let mut b = entry("Calm", EntryCategory::Item, &["weather"]);

        // 0.2 alone does not clear the threshold
        assert!(analyzer.analyze_pair(&a, &b).is_none());

        a.metadata.first_mention_scene = Some("scene-1".to_string());
        assert!(analyzer.analyze_pair(&a, &b).is_none());

        b.metadata.first_mention_scene = Some("scene-1".to_string());
        let suggestion = analyzer.analyze_pair(&a, &b).unwrap();
        assert!(approx(suggestion.confidence, 0.45));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let analyzer = RelationAnalyzer::new();
        let a = entry("Prophecy", EntryCategory::Event, &[]);
        let b = entry("Hero", EntryCategory::Character, &[]);

        // Event-character pairing contributes exactly 0.3
        assert!(analyzer.analyze_pair(&a, &b).is_none());
    }

    #[test]
    fn test_threshold_compares_accumulated_sum() {
        let analyzer = RelationAnalyzer::new();
        let mut a = entry("Storm", EntryCategory::Concept, &["x"]);
        let mut b = entry("Relic", EntryCategory::Item, &["x"]);
        a.metadata.importance = 2;
        b.metadata.importance = 2;

        // 0.2 + 2 * 0.05 lands just above 0.3 in double precision
        let suggestion = analyzer.analyze_pair(&a, &b).unwrap();
        assert_eq!(suggestion.confidence, 0.2 + 0.1);
        assert!(suggestion.confidence > 0.3);
    }

    #[test]
    fn test_confidence_clamped_to_one() {
        let analyzer = RelationAnalyzer::new();
        let tags = ["a", "b", "c", "d", "e"];
        let a = entry("Prophecy", EntryCategory::Event, &tags);
        let b = entry("Hero", EntryCategory::Character, &tags);

        // 5 * 0.2 + 0.3 = 1.3
        let suggestion = analyzer.analyze_pair(&a, &b).unwrap();
        assert_eq!(suggestion.confidence, 1.0);
    }

    #[test]
    fn test_importance_saturates_confidence() {
        let analyzer = RelationAnalyzer::new();
        let mut a = entry("Alice", EntryCategory::Concept, &[]);
        let mut b = entry("Relic", EntryCategory::Item, &[]);
        a.metadata.importance = 90;
        b.metadata.importance = 95;

        // 0.05 * 90 = 4.5 before clamping
        let suggestion = analyzer.analyze_pair(&a, &b).unwrap();
        assert_eq!(suggestion.confidence, 1.0);
        assert!(suggestion.reason.is_empty());
    }

    #[test]
    fn test_generate_excludes_self_and_existing() {
        let analyzer = RelationAnalyzer::new();
        let shared = ["hero", "knight"];
        let mut target = entry("Alice", EntryCategory::Character, &shared);
        let related = entry("Bob", EntryCategory::Character, &shared);
        let fresh = entry("Carol", EntryCategory::Character, &shared);
        target
            .relations
            .push(Relation::new(related.id, RelationType::AppearsWith, 2));

        let all = vec![target.clone(), related.clone(), fresh.clone()];
        let suggestions = analyzer.generate_suggestions(&target, &all);

        let ids: Vec<Uuid> = suggestions.iter().map(|s| s.entry.id).collect();
        assert_eq!(ids, vec![fresh.id]);
    }

    #[test]
    fn test_generate_sorted_and_capped() {
        let analyzer = RelationAnalyzer::with_config(RelationConfig {
            max_suggestions: 3,
            ..RelationConfig::default()
        });
        let target = entry("Alice", EntryCategory::Character, &["a", "b", "c"]);
        let mut all = vec![target.clone()];
        for (i, tags) in [
            vec!["a"],
            vec!["a", "b"],
            vec!["a", "b", "c"],
            vec!["b"],
            vec!["c", "a"],
        ]
        .into_iter()
        .enumerate()
        {
            all.push(entry(&format!("Other {i}"), EntryCategory::Character, &tags));
        }

        let suggestions = analyzer.generate_suggestions(&target, &all);
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        assert_eq!(suggestions[0].entry.title, "Other 2");
    }

    #[test]
    fn test_apply_writes_forward_and_mirror() {
        let analyzer = RelationAnalyzer::new();
        let mut wiki = InMemoryWiki::new();
        let alice_id = wiki
            .add_entry(
                NewWikiEntry::new("Alice", EntryCategory::Character).with_tags(["knight"]),
            )
            .unwrap();
        let academy_id = wiki
            .add_entry(
                NewWikiEntry::new("Royal Academy", EntryCategory::Organization)
                    .with_tags(["knight"]),
            )
            .unwrap();

        let alice = wiki.get(alice_id).unwrap().clone();
        let suggestions = analyzer.generate_suggestions(&alice, wiki.entries());
        assert_eq!(suggestions.len(), 1);

        let selected: HashSet<Uuid> = [academy_id].into_iter().collect();
        let applied = analyzer
            .apply_suggestions(&mut wiki, alice_id, &suggestions, &selected)
            .unwrap();
        assert_eq!(applied, 1);

        let alice = wiki.get(alice_id).unwrap();
        assert_eq!(alice.relations.len(), 1);
        let forward = &alice.relations[0];
        assert_eq!(forward.target_id, academy_id);
        assert_eq!(forward.relation_type, RelationType::BelongsTo);
        assert_eq!(forward.strength, 3);
        assert!(forward.bidirectional);
        assert_eq!(forward.description, suggestions[0].reason);

        let academy = wiki.get(academy_id).unwrap();
        assert_eq!(academy.relations.len(), 1);
        let mirror = &academy.relations[0];
        assert_eq!(mirror.target_id, alice_id);
        assert_eq!(mirror.relation_type, forward.relation_type);
        assert_eq!(mirror.strength, forward.strength);
        assert_eq!(mirror.description, "Related to Alice");

        // Applied relations are not suggested again
        let alice = wiki.get(alice_id).unwrap().clone();
        assert!(analyzer
            .generate_suggestions(&alice, wiki.entries())
            .is_empty());
    }

    #[test]
    fn test_apply_skips_unselected_and_missing() {
        let analyzer = RelationAnalyzer::new();
        let mut wiki = InMemoryWiki::new();
        let alice_id = wiki
            .add_entry(NewWikiEntry::new("Alice", EntryCategory::Character).with_tags(["x"]))
            .unwrap();
        let alice = wiki.get(alice_id).unwrap().clone();

        let ghost = entry("Ghost", EntryCategory::Character, &["x"]);
        let suggestions = vec![analyzer.analyze_pair(&alice, &ghost).unwrap()];

        let none: HashSet<Uuid> = HashSet::new();
        assert_eq!(
            analyzer
                .apply_suggestions(&mut wiki, alice_id, &suggestions, &none)
                .unwrap(),
            0
        );

        let selected: HashSet<Uuid> = [ghost.id].into_iter().collect();
        assert_eq!(
            analyzer
                .apply_suggestions(&mut wiki, alice_id, &suggestions, &selected)
                .unwrap(),
            0
        );
        assert!(wiki.get(alice_id).unwrap().relations.is_empty());
    }

    #[test]
    fn test_apply_merges_repeated_endpoint() {
        let analyzer = RelationAnalyzer::new();
        let mut wiki = InMemoryWiki::new();
        let alice_id = wiki
            .add_entry(NewWikiEntry::new("Alice", EntryCategory::Character).with_tags(["x"]))
            .unwrap();
        let academy_id = wiki
            .add_entry(
                NewWikiEntry::new("Royal Academy", EntryCategory::Organization).with_tags(["x"]),
            )
            .unwrap();

        let alice = wiki.get(alice_id).unwrap().clone();
        let academy = wiki.get(academy_id).unwrap().clone();
        let first = analyzer.analyze_pair(&alice, &academy).unwrap();
        let second = RelationSuggestion {
            relation_type: RelationType::RelatedTo,
            strength: 1,
            ..first.clone()
        };

        let selected: HashSet<Uuid> = [academy_id].into_iter().collect();
        let applied = analyzer
            .apply_suggestions(&mut wiki, alice_id, &[first, second], &selected)
            .unwrap();
        assert_eq!(applied, 2);

        let alice = wiki.get(alice_id).unwrap();
        assert_eq!(alice.relations.len(), 2);

        let academy = wiki.get(academy_id).unwrap();
        let mirrors: Vec<RelationType> =
            academy.relations.iter().map(|r| r.relation_type).collect();
        assert_eq!(mirrors, vec![RelationType::BelongsTo, RelationType::RelatedTo]);
        assert!(academy.relations.iter().all(|r| r.target_id == alice_id));
    }

    #[test]
    fn test_apply_skips_suggestion_for_target_itself() {
        let analyzer = RelationAnalyzer::new();
        let mut wiki = InMemoryWiki::new();
        let alice_id = wiki
            .add_entry(NewWikiEntry::new("Alice", EntryCategory::Character).with_tags(["x"]))
            .unwrap();
        let bob_id = wiki
            .add_entry(NewWikiEntry::new("Bob", EntryCategory::Character).with_tags(["x"]))
            .unwrap();

        let alice = wiki.get(alice_id).unwrap().clone();
        let bob = wiki.get(bob_id).unwrap().clone();
        let to_bob = analyzer.analyze_pair(&alice, &bob).unwrap();
        let to_self = RelationSuggestion {
            entry: alice.clone(),
            ..to_bob.clone()
        };

        let selected: HashSet<Uuid> = [alice_id, bob_id].into_iter().collect();
        let applied = analyzer
            .apply_suggestions(&mut wiki, alice_id, &[to_bob, to_self], &selected)
            .unwrap();
        assert_eq!(applied, 1);

        let alice = wiki.get(alice_id).unwrap();
        assert_eq!(alice.relations.len(), 1);
        assert_eq!(alice.relations[0].target_id, bob_id);
        assert!(!alice.relates_to(alice_id));
        assert!(wiki.get(bob_id).unwrap().relates_to(alice_id));
    }

    #[test]
    fn test_apply_unknown_target() {
        let analyzer = RelationAnalyzer::new();
        let mut wiki = InMemoryWiki::new();
        let err = analyzer
            .apply_suggestions(&mut wiki, Uuid::new_v4(), &[], &HashSet::new())
            .unwrap_err();
        assert!(matches!(err, WikiError::NotFound(_)));
    }
}
