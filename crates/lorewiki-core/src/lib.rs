//! Lorewiki Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the wiki:
//! - Knowledge-base models (entries, categories, relations)
//! - Scene references used as metadata signals
//! - Common error types
//! - Collaborator traits for the knowledge base and scene source
//! - Configuration management
//! - An in-memory knowledge base

pub mod config;
pub mod store;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, LoggingConfig, RelationConfig, WikiConfig,
};
pub use store::{InMemoryWiki, WikiQuery};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for wiki operations
#[derive(Error, Debug)]
pub enum WikiError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for WikiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WikiError>;

// ============================================================================
// Categories and Relation Types
// ============================================================================

/// Category of a knowledge-base entry
///
/// The extractor only ever proposes `Character`, `Location`, `Item` and
/// `Organization`; `Event` and `Concept` entries are authored by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryCategory {
    Character,
    Location,
    Item,
    Organization,
    Event,
    Concept,
}

impl EntryCategory {
    /// All categories, in display order
    pub const ALL: [EntryCategory; 6] = [
        Self::Character,
        Self::Location,
        Self::Item,
        Self::Organization,
        Self::Event,
        Self::Concept,
    ];

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "CHARACTER",
            Self::Location => "LOCATION",
            Self::Item => "ITEM",
            Self::Organization => "ORGANIZATION",
            Self::Event => "EVENT",
            Self::Concept => "CONCEPT",
        }
    }
}

impl std::fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryCategory {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "character" => Ok(Self::Character),
            "location" => Ok(Self::Location),
            "item" => Ok(Self::Item),
            "organization" => Ok(Self::Organization),
            "event" => Ok(Self::Event),
            "concept" => Ok(Self::Concept),
            _ => Err(WikiError::ValidationError(format!(
                "unknown entry category: {s}"
            ))),
        }
    }
}

/// Type of a relation between two entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    AppearsWith,
    LocatedIn,
    BelongsTo,
    RelatedTo,
    CausedBy,
    PartOf,
    SimilarTo,
    OppositeTo,
}

impl RelationType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppearsWith => "APPEARS_WITH",
            Self::LocatedIn => "LOCATED_IN",
            Self::BelongsTo => "BELONGS_TO",
            Self::RelatedTo => "RELATED_TO",
            Self::CausedBy => "CAUSED_BY",
            Self::PartOf => "PART_OF",
            Self::SimilarTo => "SIMILAR_TO",
            Self::OppositeTo => "OPPOSITE_TO",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::AppearsWith => "appears with",
            Self::LocatedIn => "located in",
            Self::BelongsTo => "belongs to",
            Self::RelatedTo => "related to",
            Self::CausedBy => "caused by",
            Self::PartOf => "part of",
            Self::SimilarTo => "similar to",
            Self::OppositeTo => "opposed to",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Knowledge-Base Models
// ============================================================================

/// A typed edge from one entry to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Entry on the other end of the edge
    pub target_id: Uuid,

    /// Relation type
    pub relation_type: RelationType,

    /// Strength, always within 1..=5
    pub strength: u8,

    /// Free-text description
    pub description: String,

    /// Whether a mirror relation exists on the target
    pub bidirectional: bool,
}

impl Relation {
    /// Smallest allowed strength
    pub const MIN_STRENGTH: u8 = 1;
    /// Largest allowed strength
    pub const MAX_STRENGTH: u8 = 5;

    /// Create a new one-way relation; strength is clamped to 1..=5
    pub fn new(target_id: Uuid, relation_type: RelationType, strength: u8) -> Self {
        Self {
            target_id,
            relation_type,
            strength: strength.clamp(Self::MIN_STRENGTH, Self::MAX_STRENGTH),
            description: String::new(),
            bidirectional: false,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark as bidirectional
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }
}

/// Body text of an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WikiContent {
    /// Markdown body
    pub markdown: String,

    /// One-line summary
    pub summary: String,
}

/// Bookkeeping attached to every entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// How often the entry was opened
    pub read_count: u32,

    /// Importance score, 0-100
    pub importance: u8,

    /// Spoiler level (0 = safe)
    pub spoiler_level: u8,

    /// Scene in which the entry was first mentioned
    pub first_mention_scene: Option<String>,

    /// Scene in which the entry was last updated
    pub last_update_scene: Option<String>,

    /// Source snippets the entry was extracted from
    pub extraction_source: Vec<String>,
}

/// A confirmed entry in the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiEntry {
    /// Unique identifier
    pub id: Uuid,

    /// Display title, unique case-insensitively
    pub title: String,

    /// URL-friendly title
    pub slug: String,

    /// Entry category
    pub category: EntryCategory,

    /// Tags, in insertion order without duplicates
    pub tags: Vec<String>,

    /// Body text
    pub content: WikiContent,

    /// Metadata block
    pub metadata: EntryMetadata,

    /// Outgoing relations
    pub relations: Vec<Relation>,

    /// Whether the entry was created from an extraction candidate
    pub auto_generated: bool,

    /// When this entry was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl WikiEntry {
    /// Check for a tag (exact match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether a relation to `id` already exists
    pub fn relates_to(&self, id: Uuid) -> bool {
        self.relations.iter().any(|r| r.target_id == id)
    }

    /// Title, markdown and summary joined for mention lookups
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title, self.content.markdown, self.content.summary
        )
    }

    /// Bump the update timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An entry that has not been assigned an identity yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWikiEntry {
    pub title: String,
    pub slug: String,
    pub category: EntryCategory,
    pub tags: Vec<String>,
    pub content: WikiContent,
    pub metadata: EntryMetadata,
    pub relations: Vec<Relation>,
    pub auto_generated: bool,
}

impl NewWikiEntry {
    /// Create a new entry draft with a derived slug
    pub fn new(title: impl Into<String>, category: EntryCategory) -> Self {
        let title = title.into();
        Self {
            slug: slugify(&title),
            title,
            category,
            tags: Vec::new(),
            content: WikiContent::default(),
            metadata: EntryMetadata::default(),
            relations: Vec::new(),
            auto_generated: false,
        }
    }

    /// Add tags, skipping duplicates
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    /// Set content
    pub fn with_content(mut self, markdown: impl Into<String>, summary: impl Into<String>) -> Self {
        self.content = WikiContent {
            markdown: markdown.into(),
            summary: summary.into(),
        };
        self
    }

    /// Set importance (clamped to 100)
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.metadata.importance = importance.min(100);
        self
    }

    /// Set first-mention scene
    pub fn with_first_mention(mut self, scene_id: impl Into<String>) -> Self {
        self.metadata.first_mention_scene = Some(scene_id.into());
        self
    }

    /// Assign an identity and timestamps
    pub fn into_entry(self) -> WikiEntry {
        let now = Utc::now();
        WikiEntry {
            id: Uuid::new_v4(),
            title: self.title,
            slug: self.slug,
            category: self.category,
            tags: self.tags,
            content: self.content,
            metadata: self.metadata,
            relations: self.relations,
            auto_generated: self.auto_generated,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lowercase the title and replace whitespace runs with `-`
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// Scenes
// ============================================================================

/// Reference to an authored scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub title: String,
}

impl Scene {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Knowledge-base collaborator
///
/// Reads always reflect the current state; the engine never caches them
/// across calls.
pub trait KnowledgeBase {
    /// All entries, in insertion order
    fn entries(&self) -> &[WikiEntry];

    /// Look up an entry by id
    fn get(&self, id: Uuid) -> Option<&WikiEntry> {
        self.entries().iter().find(|e| e.id == id)
    }

    /// Look up an entry by title, ignoring case
    fn find_by_title(&self, title: &str) -> Option<&WikiEntry> {
        let needle = title.to_lowercase();
        self.entries()
            .iter()
            .find(|e| e.title.to_lowercase() == needle)
    }

    /// Titles of every entry
    fn titles(&self) -> Vec<String> {
        self.entries().iter().map(|e| e.title.clone()).collect()
    }

    /// Insert a new entry, assigning its identity and timestamps
    fn add_entry(&mut self, entry: NewWikiEntry) -> Result<Uuid>;

    /// Replace an existing entry
    fn update_entry(&mut self, entry: WikiEntry) -> Result<()>;

    /// Replace several entries at once
    ///
    /// Either every entry is written or none is.
    fn commit(&mut self, entries: Vec<WikiEntry>) -> Result<()>;
}

/// Scene collaborator
pub trait SceneProvider {
    /// The scene currently being edited, if any
    fn current_scene(&self) -> Option<Scene>;
}

/// Scene provider that always reports the same scene
#[derive(Debug, Clone, Default)]
pub struct FixedScene(pub Option<Scene>);

impl FixedScene {
    pub fn new(scene: Scene) -> Self {
        Self(Some(scene))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl SceneProvider for FixedScene {
    fn current_scene(&self) -> Option<Scene> {
        self.0.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
