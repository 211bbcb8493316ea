//! Response composer — runs one conversation turn end to end.
//!
//! A turn moves through these states, each logged at `debug`:
//!
//! ```text
//! start → classified → lookup_attempted → backend_invoked → composed → context_updated → done
//! ```
//!
//! Lookup only runs for domain-related text. A backend failure never fails
//! the turn: it is replaced by a fixed fallback line and the context is still
//! updated with what the user actually received.

use std::sync::Arc;
use std::time::Duration;

use raven_config::AppConfig;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::backend::{BackendError, BackendErrorKind, GenerationBackend};
use crate::classifier::{ClassificationResult, IntentClassifier};
use crate::context::ContextStore;
use crate::lookup::LookupEngine;
use crate::persona::{
    GENERIC_FALLBACK, PERSONA_PROMPT, RATE_LIMIT_FALLBACK, TURN_FAILURE_REPLY,
    build_context_prompt,
};

/// Parameters for each backend call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.backend_timeout_secs),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.8,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub classification: ClassificationResult,
    /// The backend failed and a fixed fallback line was used instead.
    pub used_fallback: bool,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("message has no sender id")]
    MissingUser,
}

fn fallback_for(err: &BackendError) -> &'static str {
    match err.kind {
        BackendErrorKind::RateLimited => RATE_LIMIT_FALLBACK,
        BackendErrorKind::Other => GENERIC_FALLBACK,
    }
}

pub struct ResponseComposer {
    classifier: IntentClassifier,
    lookup: Arc<LookupEngine>,
    backend: Arc<dyn GenerationBackend>,
    context: ContextStore,
    settings: GenerationSettings,
}

impl ResponseComposer {
    /// The classifier shares the lookup engine's knowledge base.
    pub fn new(
        lookup: Arc<LookupEngine>,
        backend: Arc<dyn GenerationBackend>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(lookup.knowledge().clone()),
            lookup,
            backend,
            context: ContextStore::new(),
            settings,
        }
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn lookup(&self) -> &Arc<LookupEngine> {
        &self.lookup
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Run one turn and report what happened.
    pub async fn run_turn(
        &self,
        user_id: &str,
        username: &str,
        text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        if user_id.trim().is_empty() {
            return Err(TurnError::MissingUser);
        }
        debug!(user_id, state = "start", "Turn started");

        let classification = self.classifier.classify(text);
        debug!(
            user_id,
            state = "classified",
            domain = classification.is_domain_related,
            intent = classification.intent.label(),
            "Message classified"
        );

        let lookup = if classification.is_domain_related {
            self.lookup.respond(&classification, text)
        } else {
            None
        };
        debug!(user_id, state = "lookup_attempted", found = lookup.is_some(), "Lookup attempted");

        let record = self.context.get(user_id).await;
        let prompt = build_context_prompt(text, username, &record);
        let generated = match tokio::time::timeout(
            self.settings.timeout,
            self.backend.generate(
                PERSONA_PROMPT,
                &prompt,
                self.settings.max_tokens,
                self.settings.temperature,
            ),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::other(format!(
                "no reply within {}s",
                self.settings.timeout.as_secs()
            ))),
        };

        let (mut reply, used_fallback) = match generated {
            Ok(text) => (text, false),
            Err(e) => {
                warn!(user_id, kind = ?e.kind, error = %e.message, "Backend failed, using fallback");
                (fallback_for(&e).to_string(), true)
            }
        };
        debug!(user_id, state = "backend_invoked", used_fallback, "Backend returned");

        if let Some(extra) = lookup {
            reply.push_str("\n\n");
            reply.push_str(&extra);
        }
        debug!(user_id, state = "composed", reply_len = reply.len(), "Reply composed");

        self.context.update(user_id, text, &reply).await;
        debug!(user_id, state = "context_updated", "Context updated");

        debug!(user_id, state = "done", "Turn finished");
        Ok(TurnOutcome {
            reply,
            classification,
            used_fallback,
        })
    }

    /// Reply text for one turn. Never fails: any turn error becomes the
    /// fixed failure line.
    pub async fn respond(&self, user_id: &str, username: &str, text: &str) -> String {
        match self.run_turn(user_id, username, text).await {
            Ok(outcome) => outcome.reply,
            Err(e) => {
                error!(user_id, error = %e, "Turn failed");
                TURN_FAILURE_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Intent;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Pops scripted results in order and records every user prompt.
    struct ScriptedBackend {
        results: Mutex<VecDeque<Result<String, BackendError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(results: Vec<Result<String, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn generate(
            &self,
            system_prompt: &str,
            user_prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, BackendError> {
            assert_eq!(system_prompt, PERSONA_PROMPT);
            self.prompts.lock().unwrap().push(user_prompt.to_string());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedBackend: no more results")
        }
    }

    struct StalledBackend;

    #[async_trait]
    impl GenerationBackend for StalledBackend {
        async fn generate(&self, _: &str, _: &str, _: u32, _: f32) -> Result<String, BackendError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    fn composer(backend: Arc<dyn GenerationBackend>) -> ResponseComposer {
        ResponseComposer::new(
            Arc::new(LookupEngine::seeded(1)),
            backend,
            GenerationSettings::default(),
        )
    }

    #[tokio::test]
    async fn plain_chat_is_backend_text_only() {
        let backend = ScriptedBackend::new(vec![Ok("hey you 🖤".into())]);
        let c = composer(backend.clone());

        let outcome = c.run_turn("u1", "Ash", "good morning").await.unwrap();
        assert_eq!(outcome.reply, "hey you 🖤");
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.classification.intent, Intent::None);
        assert!(backend.prompts.lock().unwrap()[0].contains("new conversation"));
    }

    #[tokio::test]
    async fn domain_turn_appends_lookup() {
        let backend = ScriptedBackend::new(vec![Ok("obsessed".into())]);
        let c = composer(backend);

        let outcome = c.run_turn("u1", "Ash", "do you like metal?").await.unwrap();
        let blurb = &c
            .lookup()
            .knowledge()
            .lookup_category("metal")
            .unwrap()
            .blurb;
        assert_eq!(outcome.reply, format!("obsessed\n\n{blurb}"));
    }

    #[tokio::test]
    async fn entity_without_domain_keyword_skips_lookup() {
        let backend = ScriptedBackend::new(vec![Ok("cute".into())]);
        let c = composer(backend);

        let outcome = c.run_turn("u1", "Ash", "Paramore tonight?").await.unwrap();
        assert!(matches!(outcome.classification.intent, Intent::EntityMention(_)));
        assert_eq!(outcome.reply, "cute");
    }

    #[tokio::test]
    async fn second_turn_sees_history() {
        let backend = ScriptedBackend::new(vec![Ok("one".into()), Ok("two".into())]);
        let c = composer(backend.clone());

        c.respond("u1", "Ash", "first message").await;
        c.respond("u1", "Ash", "second message").await;

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[1].contains("has messaged 1 times before"));
        assert!(prompts[1].contains("Their last message was: 'first message'"));

        let record = c.context().get("u1").await;
        assert_eq!(record.message_count, 2);
        assert_eq!(record.last_response, "two");
    }

    #[tokio::test]
    async fn rate_limit_uses_fallback_and_still_updates_context() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::rate_limited("429"))]);
        let c = composer(backend);

        let outcome = c.run_turn("u1", "Ash", "hi there").await.unwrap();
        assert_eq!(outcome.reply, RATE_LIMIT_FALLBACK);
        assert!(outcome.used_fallback);
        assert_eq!(c.context().get("u1").await.last_response, RATE_LIMIT_FALLBACK);
    }

    #[tokio::test]
    async fn other_failure_uses_generic_fallback_plus_lookup() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::other("boom"))]);
        let c = composer(backend);

        let outcome = c.run_turn("u1", "Ash", "do you like emo?").await.unwrap();
        assert!(outcome.reply.starts_with(&format!("{GENERIC_FALLBACK}\n\n")));
        assert!(outcome.reply.contains("Emo is emotional honesty"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_to_generic_fallback() {
        let c = composer(Arc::new(StalledBackend));
        let outcome = c.run_turn("u1", "Ash", "hello?").await.unwrap();
        assert_eq!(outcome.reply, GENERIC_FALLBACK);
        assert!(outcome.used_fallback);
    }

    #[tokio::test]
    async fn missing_user_becomes_failure_reply_without_touching_context() {
        let backend = ScriptedBackend::new(vec![]);
        let c = composer(backend);

        assert!(matches!(
            c.run_turn("  ", "Ash", "hello").await,
            Err(TurnError::MissingUser)
        ));
        assert_eq!(c.respond("", "Ash", "hello").await, TURN_FAILURE_REPLY);
        assert!(c.context().is_empty().await);
    }

    #[test]
    fn settings_from_config() {
        let config = AppConfig {
            max_tokens: 120,
            temperature: 0.3,
            backend_timeout_secs: 5,
            ..AppConfig::default()
        };
        let s = GenerationSettings::from_config(&config);
        assert_eq!(s.max_tokens, 120);
        assert_eq!(s.timeout, Duration::from_secs(5));
        assert_eq!(GenerationSettings::default().max_tokens, 300);
    }
}
