//! Knowledge-base loader
//!
//! Converts accepted candidates into wiki entries and writes them through
//! the knowledge-base collaborator.

use std::collections::HashMap;

use lorewiki_core::{KnowledgeBase, NewWikiEntry, Result, Scene, SceneProvider, WikiContent};
use tracing::{info, warn};
use uuid::Uuid;

use crate::EntityCandidate;

// ============================================================================
// Conversion
// ============================================================================

/// Build the entry for an accepted candidate
///
/// The markdown body embeds the extraction context verbatim and the
/// importance is `floor(confidence * 100)`.
pub fn candidate_to_entry(candidate: &EntityCandidate, scene: Option<&Scene>) -> NewWikiEntry {
    let mut entry = NewWikiEntry::new(&candidate.text, candidate.category)
        .with_tags(candidate.suggested_tags.iter().cloned())
        .with_importance(importance_of(candidate.confidence));

    entry.content = WikiContent {
        markdown: format!(
            "## 概要\n{text}について。\n\n*この項目は自動生成されました。詳細を追加してください。*\n\n### 初出\n{context}",
            text = candidate.text,
            context = candidate.context,
        ),
        summary: format!("{}に関する項目（自動生成）", candidate.text),
    };
    entry.metadata.first_mention_scene = scene.map(|s| s.id.clone());
    entry.metadata.last_update_scene = scene.map(|s| s.id.clone());
    entry.metadata.extraction_source = vec![candidate.context.clone()];
    entry.auto_generated = true;

    entry
}

fn importance_of(confidence: f32) -> u8 {
    (confidence * 100.0).floor().clamp(0.0, 100.0) as u8
}

// ============================================================================
// Loading
// ============================================================================

/// Write one accepted candidate
///
/// Acceptance does not re-check for an existing title; a duplicate can be
/// added when suggestions are stale.
pub fn accept_candidate<K, S>(kb: &mut K, scenes: &S, candidate: &EntityCandidate) -> Result<Uuid>
where
    K: KnowledgeBase + ?Sized,
    S: SceneProvider + ?Sized,
{
    let scene = scenes.current_scene();
    let id = kb.add_entry(candidate_to_entry(candidate, scene.as_ref()))?;
    info!(
        title = %candidate.text,
        category = %candidate.category,
        confidence = candidate.confidence,
        "accepted candidate"
    );
    Ok(id)
}

/// Result of accepting a batch of candidates
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    /// Number of entries added
    pub entries_added: usize,
    /// Mapping from candidate text to the new entry id
    pub entry_map: HashMap<String, Uuid>,
    /// Candidates skipped because their title already exists
    pub skipped: Vec<String>,
    /// Errors encountered during loading
    pub errors: Vec<String>,
}

impl LoadResult {
    /// Check if any entries were added
    pub fn is_empty(&self) -> bool {
        self.entries_added == 0
    }
}

/// Accept every candidate, skipping titles that already exist
///
/// Write errors are collected per candidate; loading continues with the
/// next one.
pub fn accept_all<K, S>(kb: &mut K, scenes: &S, candidates: &[EntityCandidate]) -> LoadResult
where
    K: KnowledgeBase + ?Sized,
    S: SceneProvider + ?Sized,
{
    let mut result = LoadResult::default();

    for candidate in candidates {
        if kb.find_by_title(&candidate.text).is_some() {
            result.skipped.push(candidate.text.clone());
            continue;
        }

        match accept_candidate(kb, scenes, candidate) {
            Ok(id) => {
                result.entries_added += 1;
                result.entry_map.insert(candidate.text.clone(), id);
            }
            Err(e) => {
                warn!(title = %candidate.text, error = %e, "failed to accept candidate");
                result.errors.push(format!("{}: {}", candidate.text, e));
            }
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
