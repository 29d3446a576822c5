//! Lorewiki CLI - Command-line interface
//!
//! Usage:
//!   lorewiki extract <file> [--wiki <json>]
//!   lorewiki accept <file> --wiki <json> [--scene <id>] [--threshold <f>]
//!   lorewiki relate <title> --wiki <json> [--apply]
//!   lorewiki search --wiki <json> [--query <q>] [--category <c>] [--tag <t>]...
//!   lorewiki mentions <text> --wiki <json>
//!   lorewiki watch <file> [--wiki <json>]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use lorewiki_core::{
    AppConfig, EntryCategory, FixedScene, InMemoryWiki, KnowledgeBase, LoggingConfig, Scene,
    WikiEntry, WikiQuery,
};
use lorewiki_extractor::live::SuggestionsReady;
use lorewiki_extractor::{
    accept_all, EntityCandidate, EntityExtractor, LiveExtractor, RelationAnalyzer,
    RelationSuggestion, ReviewQueue, RuleBasedExtractor,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lorewiki")]
#[command(about = "Narrative wiki extraction and relation suggestion")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print entry candidates found in a text file
    Extract {
        /// Text file to scan
        file: PathBuf,
        /// Wiki file whose titles are skipped
        #[arg(short, long)]
        wiki: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Extract and commit candidates at or above a confidence threshold
    Accept {
        file: PathBuf,
        #[arg(short, long)]
        wiki: PathBuf,
        /// Scene recorded as first mention
        #[arg(long)]
        scene: Option<String>,
        /// Defaults to the configured extraction threshold
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Suggest relations for an entry
    Relate {
        /// Entry title (case-insensitive)
        title: String,
        #[arg(short, long)]
        wiki: PathBuf,
        /// Commit every suggestion bidirectionally
        #[arg(long)]
        apply: bool,
    },
    /// Search wiki entries
    Search {
        #[arg(short, long)]
        wiki: PathBuf,
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        category: Option<EntryCategory>,
        /// Required tag, repeatable
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Show at most this many entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// List entries mentioned in a passage
    Mentions {
        text: String,
        #[arg(short, long)]
        wiki: PathBuf,
    },
    /// Re-extract whenever a text file changes
    Watch {
        file: PathBuf,
        #[arg(short, long)]
        wiki: Option<PathBuf>,
        /// File poll interval
        #[arg(long, default_value = "250")]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract { file, wiki, json } => {
            let text = read_text(&file)?;
            let titles = match wiki {
                Some(path) => load_wiki(&path)?.titles(),
                None => Vec::new(),
            };
            let extractor = RuleBasedExtractor::with_config(config.extraction.clone());
            let candidates = extractor.extract(&text, &titles);
            if json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                print_candidates(&candidates);
            }
        }
        Commands::Accept {
            file,
            wiki,
            scene,
            threshold,
        } => {
            let threshold = threshold.unwrap_or(config.wiki.extraction_threshold);
            if !(0.0..=1.0).contains(&threshold) {
                bail!("threshold must be within 0..=1, got {threshold}");
            }

            let text = read_text(&file)?;
            let mut kb = load_wiki(&wiki)?;
            let extractor = RuleBasedExtractor::with_config(config.extraction.clone());
            let candidates = extractor.extract(&text, &kb.titles());

            let mut queue = ReviewQueue::new().with_auto_accept(threshold);
            queue.replace(candidates);
            let accepted = queue.take_auto_accepted();

            let scenes = FixedScene(scene.map(|id| Scene::new(id.clone(), id)));
            let result = accept_all(&mut kb, &scenes, &accepted);
            kb.save(&wiki)
                .with_context(|| format!("failed to save {}", wiki.display()))?;

            for (title, id) in &result.entry_map {
                println!("added  {id}  {title}");
            }
            for title in &result.skipped {
                println!("exists {title}");
            }
            for error in &result.errors {
                eprintln!("error  {error}");
            }
            let stats = queue.stats();
            println!(
                "{} added, {} below threshold {threshold:.2}",
                result.entries_added, stats.pending
            );
        }
        Commands::Relate { title, wiki, apply } => {
            let mut kb = load_wiki(&wiki)?;
            let target = kb
                .find_by_title(&title)
                .cloned()
                .with_context(|| format!("no entry titled {title:?}"))?;

            let analyzer = RelationAnalyzer::with_config(config.relations.clone());
            let suggestions = analyzer.generate_suggestions(&target, kb.entries());
            print_suggestions(&suggestions);

            if config.wiki.show_related_entries {
                let related = kb.related_by_tags(target.id, config.wiki.max_related_entries);
                if !related.is_empty() {
                    println!();
                    println!("Related entries:");
                    print_entries(&related);
                }
            }

            if apply && !suggestions.is_empty() {
                let selected: HashSet<Uuid> = suggestions.iter().map(|s| s.entry.id).collect();
                let applied =
                    analyzer.apply_suggestions(&mut kb, target.id, &suggestions, &selected)?;
                kb.save(&wiki)
                    .with_context(|| format!("failed to save {}", wiki.display()))?;
                println!("{applied} relations applied");
            }
        }
        Commands::Search {
            wiki,
            query,
            category,
            tags,
            limit,
        } => {
            let kb = load_wiki(&wiki)?;
            let mut filter = WikiQuery::new();
            if let Some(query) = query {
                filter = filter.with_text(query);
            }
            if let Some(category) = category {
                filter = filter.with_category(category);
            }
            for tag in tags {
                filter = filter.with_tag(tag);
            }

            let mut found = kb.search(&filter);
            found.truncate(limit);
            print_entries(&found);
        }
        Commands::Mentions { text, wiki } => {
            let kb = load_wiki(&wiki)?;
            print_entries(&kb.mentioned_in(&text));
        }
        Commands::Watch {
            file,
            wiki,
            interval_ms,
        } => {
            let titles = match wiki {
                Some(path) => load_wiki(&path)?.titles(),
                None => Vec::new(),
            };
            watch(&file, titles, &config, Duration::from_millis(interval_ms)).await?;
        }
    }

    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_wiki(path: &Path) -> anyhow::Result<InMemoryWiki> {
    InMemoryWiki::load(path).with_context(|| format!("failed to load wiki {}", path.display()))
}

/// Poll `path` and feed every change through a live extraction session
async fn watch(
    path: &Path,
    titles: Vec<String>,
    config: &AppConfig,
    interval: Duration,
) -> anyhow::Result<()> {
    if !config.wiki.auto_extraction {
        bail!("automatic extraction is disabled in the configuration");
    }

    let on_ready: SuggestionsReady = Arc::new(|candidates: Vec<EntityCandidate>| {
        if !candidates.is_empty() {
            print_candidates(&candidates);
            println!();
        }
    });
    let mut live = LiveExtractor::new(config, on_ready);

    let mut last = String::new();
    let mut ticker = tokio::time::interval(interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(path = %path.display(), "watching for changes");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let text = match tokio::fs::read_to_string(path).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to read watched file");
                        continue;
                    }
                };
                if text != last {
                    live.on_text_changed(&text, titles.clone());
                    last = text;
                }
            }
            _ = &mut shutdown => {
                live.cancel();
                break;
            }
        }
    }

    Ok(())
}

fn print_candidates(candidates: &[EntityCandidate]) {
    if candidates.is_empty() {
        println!("No candidates found.");
        return;
    }
    println!("{:<6} {:<14} {:<20} TAGS", "CONF", "CATEGORY", "TEXT");
    for c in candidates {
        println!(
            "{:<6.2} {:<14} {:<20} {}",
            c.confidence,
            c.category.as_str(),
            c.text,
            c.suggested_tags.join(",")
        );
        println!("       {}", c.context.replace('\n', " "));
    }
}

fn print_suggestions(suggestions: &[RelationSuggestion]) {
    if suggestions.is_empty() {
        println!("No relation suggestions.");
        return;
    }
    println!("{:<6} {:<14} {:<3} {:<20} REASON", "CONF", "RELATION", "STR", "ENTRY");
    for s in suggestions {
        println!(
            "{:<6.2} {:<14} {:<3} {:<20} {}",
            s.confidence,
            s.relation_type.label(),
            s.strength,
            s.entry.title,
            s.reason
        );
    }
}

fn print_entries(entries: &[&WikiEntry]) {
    if entries.is_empty() {
        println!("No entries found.");
        return;
    }
    for entry in entries {
        println!(
            "{}  {:<14} {:<20} {}",
            entry.id,
            entry.category.as_str(),
            entry.title,
            entry.tags.join(",")
        );
    }
}
