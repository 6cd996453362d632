//! Generation entry points.
//!
//! Both entry points degrade instead of failing: configuration, network and
//! provider errors are logged and produce an empty result, media problems
//! drop the offending attachment, and unparseable choices are left out.

use super::prompt::{build_file_prompt, build_note_prompt};
use super::reconcile::reconcile_choices;
use crate::ai::{CompletionService, Dispatcher};
use crate::media::{self, ContentStore};
use crate::models::{ChoiceResult, GenerationOptions, MediaSettings, ProviderConfig};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Generates flashcards from notes or files in a content store.
pub struct FlashcardGenerator {
    store: Box<dyn ContentStore>,
    http: reqwest::Client,
    completion: Option<Arc<dyn CompletionService>>,
}

impl FlashcardGenerator {
    pub fn new(store: Box<dyn ContentStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self::new_with_client(store, http))
    }

    pub fn new_with_client(store: Box<dyn ContentStore>, http: reqwest::Client) -> Self {
        Self {
            store,
            http,
            completion: None,
        }
    }

    /// Uses `completion` instead of building a provider HTTP client.
    ///
    /// Primarily useful for tests and harnesses that need to inject mocks.
    pub fn with_services(
        store: Box<dyn ContentStore>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
            completion: Some(completion),
        }
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    fn dispatcher<'a>(&self, provider: &'a ProviderConfig) -> Result<Dispatcher<'a>> {
        provider.validate()?;
        match &self.completion {
            Some(service) => Ok(Dispatcher::with_service(provider, Arc::clone(service))),
            None => Dispatcher::new(provider, self.http.clone()),
        }
    }

    fn check_counts(question_count: usize, samples: usize) -> bool {
        if question_count == 0 || samples == 0 {
            error!(
                "Question count ({}) and sample count ({}) must both be at least 1",
                question_count, samples
            );
            return false;
        }
        true
    }

    /// Generates `samples` alternative card sets of `question_count` cards
    /// from note text, attaching embedded media when `media` allows it.
    pub async fn generate(
        &self,
        provider: &ProviderConfig,
        text: &str,
        question_count: usize,
        samples: usize,
        options: &GenerationOptions,
        media: Option<&MediaSettings>,
    ) -> Vec<ChoiceResult> {
        if !Self::check_counts(question_count, samples) {
            return Vec::new();
        }

        let dispatcher = match self.dispatcher(provider) {
            Ok(d) => d,
            Err(e) => {
                error!("Cannot generate flashcards: {}", e);
                return Vec::new();
            }
        };

        let (items, notes) = match media.filter(|m| m.enabled) {
            Some(settings) => (
                media::resolve_media(self.store.as_ref(), text, settings).await,
                media::strip_media_embeds(text, settings),
            ),
            None => (Vec::new(), text.to_string()),
        };

        if notes.trim().is_empty() && items.is_empty() {
            warn!("Note text is empty and has no usable media; nothing to send");
            return Vec::new();
        }

        let messages = build_note_prompt(
            &notes,
            question_count,
            &items,
            options.additional_prompt.as_deref(),
        );

        let contents = dispatcher
            .dispatch(&messages, !items.is_empty(), question_count, samples, options)
            .await;
        let results = reconcile_choices(&contents);

        info!(
            "Generated {} of {} requested alternative(s)",
            results.len(),
            samples
        );
        results
    }

    /// Generates cards from one standalone media file (image or PDF).
    pub async fn generate_from_file(
        &self,
        provider: &ProviderConfig,
        file_path: &str,
        question_count: usize,
        samples: usize,
        options: &GenerationOptions,
        media: &MediaSettings,
    ) -> Vec<ChoiceResult> {
        if !Self::check_counts(question_count, samples) {
            return Vec::new();
        }

        let dispatcher = match self.dispatcher(provider) {
            Ok(d) => d,
            Err(e) => {
                error!("Cannot generate flashcards: {}", e);
                return Vec::new();
            }
        };

        let Some(item) = media::resolve_file(self.store.as_ref(), file_path, media).await else {
            warn!("Cannot generate flashcards: {} could not be attached", file_path);
            return Vec::new();
        };

        let messages = build_file_prompt(
            &item,
            question_count,
            options.additional_prompt.as_deref(),
        );

        let contents = dispatcher
            .dispatch(&messages, true, question_count, samples, options)
            .await;
        let results = reconcile_choices(&contents);

        info!(
            "Generated {} of {} requested alternative(s) from {}",
            results.len(),
            samples,
            item.source_path
        );
        results
    }
}
