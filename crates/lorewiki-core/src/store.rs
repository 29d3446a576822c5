//! In-memory knowledge base
//!
//! Keeps entries in insertion order and implements the wiki panel's
//! search, filter and "related" lookups on top of them.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{EntryCategory, KnowledgeBase, NewWikiEntry, Result, WikiEntry, WikiError};

/// Maximum entries returned by [`InMemoryWiki::mentioned_in`]
pub const MAX_MENTIONED_ENTRIES: usize = 5;

/// Search filter over wiki entries
#[derive(Debug, Clone, Default)]
pub struct WikiQuery {
    /// Case-insensitive text over title, summary, markdown and tags
    pub text: Option<String>,

    /// Restrict to a single category
    pub category: Option<EntryCategory>,

    /// Every listed tag must be present
    pub tags: Vec<String>,
}

impl WikiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_category(mut self, category: EntryCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check a single entry against the filter
    pub fn matches(&self, entry: &WikiEntry) -> bool {
        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }

        if !self.tags.iter().all(|tag| entry.has_tag(tag)) {
            return false;
        }

        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let query = text.to_lowercase();
                entry.title.to_lowercase().contains(&query)
                    || entry.content.summary.to_lowercase().contains(&query)
                    || entry.content.markdown.to_lowercase().contains(&query)
                    || entry.tags.iter().any(|t| t.to_lowercase().contains(&query))
            }
            _ => true,
        }
    }
}

/// Knowledge base held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryWiki {
    entries: Vec<WikiEntry>,
}

impl InMemoryWiki {
    /// Create an empty wiki
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from existing entries
    pub fn from_entries(entries: Vec<WikiEntry>) -> Self {
        Self { entries }
    }

    /// Take ownership of the entries
    pub fn into_entries(self) -> Vec<WikiEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a wiki from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the wiki to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a wiki file; a missing file yields an empty wiki
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "wiki file not found, starting empty");
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| WikiError::Other(anyhow::anyhow!("read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Write the wiki to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .map_err(|e| WikiError::Other(anyhow::anyhow!("write {}: {e}", path.display())))
    }

    /// Entries matching a query, in insertion order
    pub fn search(&self, query: &WikiQuery) -> Vec<&WikiEntry> {
        self.entries.iter().filter(|e| query.matches(e)).collect()
    }

    /// Entries related to a selected passage of prose
    ///
    /// An entry matches when its title or markdown contains the selection
    /// or one of its tags occurs inside the selection. Selections shorter
    /// than two characters match nothing.
    pub fn mentioned_in(&self, selected_text: &str) -> Vec<&WikiEntry> {
        if selected_text.chars().count() < 2 {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|e| {
                e.title.contains(selected_text)
                    || e.content.markdown.contains(selected_text)
                    || e.tags.iter().any(|t| selected_text.contains(t.as_str()))
            })
            .take(MAX_MENTIONED_ENTRIES)
            .collect()
    }

    /// Most recently updated entries first
    pub fn recent(&self, limit: usize) -> Vec<&WikiEntry> {
        let mut entries: Vec<&WikiEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries.truncate(limit);
        entries
    }

    /// Entries sharing at least one tag with `id`, or targeted by its relations
    pub fn related_by_tags(&self, id: Uuid, limit: usize) -> Vec<&WikiEntry> {
        let Some(entry) = self.get(id) else {
            return Vec::new();
        };

        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut related = Vec::new();

        for relation in &entry.relations {
            if let Some(target) = self.get(relation.target_id) {
                if seen.insert(target.id) {
                    related.push(target);
                }
            }
        }

        for tag in &entry.tags {
            for other in &self.entries {
                if other.id != id && other.has_tag(tag) && seen.insert(other.id) {
                    related.push(other);
                }
            }
        }

        related.truncate(limit);
        related
    }
}

impl KnowledgeBase for InMemoryWiki {
    fn entries(&self) -> &[WikiEntry] {
        &self.entries
    }

    fn add_entry(&mut self, entry: NewWikiEntry) -> Result<Uuid> {
        if entry.title.trim().is_empty() {
            return Err(WikiError::ValidationError(
                "entry title must not be empty".to_string(),
            ));
        }

        let entry = entry.into_entry();
        let id = entry.id;
        info!(%id, title = %entry.title, category = %entry.category, "entry added");
        self.entries.push(entry);
        Ok(id)
    }

    fn update_entry(&mut self, mut entry: WikiEntry) -> Result<()> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| WikiError::NotFound(entry.id.to_string()))?;

        entry.touch();
        *slot = entry;
        Ok(())
    }

    fn commit(&mut self, entries: Vec<WikiEntry>) -> Result<()> {
        // Validate the whole batch before touching anything
        let positions = entries
            .iter()
            .map(|entry| {
                self.entries
                    .iter()
                    .position(|e| e.id == entry.id)
                    .ok_or_else(|| WikiError::NotFound(entry.id.to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;

        let count = entries.len();
        for (position, mut entry) in positions.into_iter().zip(entries) {
            entry.touch();
            self.entries[position] = entry;
        }

        debug!(count, "batch committed");
        Ok(())
    }
}
