//! Live extraction session
//!
//! Feeds edits of the authored text through a debouncer and delivers each
//! completed extraction pass to a callback. Only the last edit of a burst
//! produces a pass.

use std::sync::Arc;

use lorewiki_core::{AppConfig, ExtractionConfig};
use tracing::debug;

use crate::debounce::Debouncer;
use crate::ner::RuleBasedExtractor;
use crate::{EntityCandidate, EntityExtractor};

/// Receives the candidates of a finished pass
pub type SuggestionsReady = Arc<dyn Fn(Vec<EntityCandidate>) + Send + Sync>;

pub struct LiveExtractor {
    extractor: Arc<dyn EntityExtractor>,
    debouncer: Debouncer,
    on_ready: SuggestionsReady,
    min_text_len: usize,
    enabled: bool,
}

impl LiveExtractor {
    /// Session over the rule-based extractor
    pub fn new(config: &AppConfig, on_ready: SuggestionsReady) -> Self {
        let extractor = Arc::new(RuleBasedExtractor::with_config(config.extraction.clone()));
        Self::with_extractor(extractor, &config.extraction, on_ready)
            .enabled(config.wiki.auto_extraction)
    }

    /// Session over any extractor
    pub fn with_extractor(
        extractor: Arc<dyn EntityExtractor>,
        config: &ExtractionConfig,
        on_ready: SuggestionsReady,
    ) -> Self {
        Self {
            extractor,
            debouncer: Debouncer::from_millis(config.debounce_ms),
            on_ready,
            min_text_len: config.min_text_len,
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an edit of the authored text
    ///
    /// Text below the minimum length cancels any pending pass and delivers
    /// nothing. Must be called from within a tokio runtime.
    pub fn on_text_changed(&mut self, text: &str, existing_titles: Vec<String>) {
        if !self.enabled {
            return;
        }
        if text.chars().count() < self.min_text_len {
            self.debouncer.cancel();
            return;
        }

        let extractor = Arc::clone(&self.extractor);
        let on_ready = Arc::clone(&self.on_ready);
        let text = text.to_string();
        self.debouncer.schedule(move || {
            let candidates = extractor.extract(&text, &existing_titles);
            debug!(count = candidates.len(), "live extraction pass delivered");
            on_ready(candidates);
        });
    }

    /// Drop the pending pass, if any
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn recorder() -> (Arc<Mutex<Vec<Vec<EntityCandidate>>>>, SuggestionsReady) {
        let passes: Arc<Mutex<Vec<Vec<EntityCandidate>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = passes.clone();
        let on_ready: SuggestionsReady = Arc::new(move |candidates: Vec<EntityCandidate>| {
            sink.lock().unwrap().push(candidates);
        });
        (passes, on_ready)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_delivers_last_pass_only() {
        let (passes, on_ready) = recorder();
        let mut live = LiveExtractor::new(&AppConfig::default(), on_ready);

        live.on_text_changed("長い旅の末、一行は白銀城へ", Vec::new());
        tokio::time::sleep(Duration::from_millis(300)).await;
        live.on_text_changed("長い旅の末、一行は白銀城へ向かった。", Vec::new());
        assert!(live.is_pending());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let passes = passes.lock().unwrap();
        assert_eq!(passes.len(), 1);
        assert!(passes[0].iter().any(|c| c.text == "白銀城"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_text_cancels_pending_pass() {
        let (passes, on_ready) = recorder();
        let mut live = LiveExtractor::new(&AppConfig::default(), on_ready);

        live.on_text_changed("長い旅の末、一行は白銀城へ向かった。", Vec::new());
        live.on_text_changed("短い", Vec::new());
        assert!(!live.is_pending());

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(passes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_session_ignores_edits() {
        let (passes, on_ready) = recorder();
        let mut config = AppConfig::default();
        config.wiki.auto_extraction = false;
        let mut live = LiveExtractor::new(&config, on_ready);
        assert!(!live.is_enabled());

        live.on_text_changed("長い旅の末、一行は白銀城へ向かった。", Vec::new());
        assert!(!live.is_pending());

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(passes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_titles_are_filtered() {
        let (passes, on_ready) = recorder();
        let mut live = LiveExtractor::new(&AppConfig::default(), on_ready);

        live.on_text_changed(
            "長い旅の末、一行は白銀城へ向かった。",
            vec!["白銀城".to_string()],
        );
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let passes = passes.lock().unwrap();
        assert_eq!(passes.len(), 1);
        assert!(!passes[0].iter().any(|c| c.text == "白銀城"));
    }
}
