//! Keyword intent classifier.
//!
//! Matching is plain substring search on lowercased text, not tokenized:
//! "musically" counts as "music" and "memories" as "emo". Callers rely on
//! this exact behaviour, so it must not be swapped for fuzzy matching.

use std::sync::Arc;

use crate::knowledge::{EntityRef, KnowledgeBase};

/// Words that mark a message as being about music.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "music", "band", "song", "album", "concert", "guitar", "drums", "punk", "metal", "emo",
    "rock", "lyrics", "recommend", "listen", "favorite", "genre", "artist", "playlist", "chord",
    "riff",
];

/// Phrases that turn a message into a recommendation request.
pub const RECOMMEND_TRIGGERS: &[&str] = &["recommend", "suggestion", "what should i listen"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Recommendation,
    EntityMention(EntityRef),
    CategoryDiscussion(String),
    None,
}

impl Intent {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Recommendation => "recommendation",
            Intent::EntityMention(_) => "entity_mention",
            Intent::CategoryDiscussion(_) => "category_discussion",
            Intent::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub is_domain_related: bool,
    pub intent: Intent,
}

/// True iff the text contains any domain keyword.
pub fn is_domain_related(text: &str) -> bool {
    let text = text.to_lowercase();
    DOMAIN_KEYWORDS.iter().any(|k| text.contains(k))
}

pub struct IntentClassifier {
    knowledge: Arc<KnowledgeBase>,
}

impl IntentClassifier {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// Classify free text. Total: every input yields a result.
    ///
    /// Precedence: recommendation trigger, then entity name, then category
    /// key, then nothing.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let lower = text.to_lowercase();
        ClassificationResult {
            is_domain_related: is_domain_related(&lower),
            intent: self.intent_of(&lower),
        }
    }

    fn intent_of(&self, lower: &str) -> Intent {
        if RECOMMEND_TRIGGERS.iter().any(|t| lower.contains(t)) {
            return Intent::Recommendation;
        }

        if let Some(entity) = self.knowledge.find_entity_ref(lower) {
            return Intent::EntityMention(entity);
        }

        let spaced = lower.replace('_', " ");
        self.knowledge
            .all_categories()
            .iter()
            .find(|c| spaced.contains(&c.display_name()))
            .map(|c| Intent::CategoryDiscussion(c.key.clone()))
            .unwrap_or(Intent::None)
    }
}
