//! Lookup engine — turns a classification into a knowledge-backed answer.
//!
//! All randomness (genre choice, band sampling, template choice) goes through
//! one injected `StdRng`, so a fixed seed gives reproducible output.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::classifier::{ClassificationResult, Intent};
use crate::knowledge::{Category, Entity, KnowledgeBase};

/// Bands per recommendation.
pub const RECOMMENDATION_SIZE: usize = 3;

/// Genre rules, most specific first. All words of a rule must appear.
const GENRE_RULES: &[(&[&str], &str)] = &[
    (&["punk", "pop"], "pop_punk"),
    (&["metal"], "metal"),
    (&["emo"], "emo"),
    (&["punk"], "punk"),
    (&["alternative"], "alternative"),
];

/// Genre key named by lowercased text, if any rule matches.
pub fn resolve_genre(lower: &str) -> Option<&'static str> {
    GENRE_RULES
        .iter()
        .find(|(words, _)| words.iter().all(|w| lower.contains(w)))
        .map(|(_, key)| *key)
}

pub struct LookupEngine {
    knowledge: Arc<KnowledgeBase>,
    rng: Mutex<StdRng>,
}

impl LookupEngine {
    pub fn new(knowledge: Arc<KnowledgeBase>, rng: StdRng) -> Self {
        Self {
            knowledge,
            rng: Mutex::new(rng),
        }
    }

    /// Deterministic engine over the built-in knowledge base.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Arc::new(KnowledgeBase::new()), StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(knowledge: Arc<KnowledgeBase>) -> Self {
        Self::new(knowledge, StdRng::from_os_rng())
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        // The generator has no invariant a panicking holder could break.
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer for a classified message, or `None` when nothing applies.
    pub fn respond(&self, classification: &ClassificationResult, text: &str) -> Option<String> {
        match &classification.intent {
            Intent::Recommendation => {
                let lower = text.to_lowercase();
                let category = match resolve_genre(&lower) {
                    Some(key) => self.knowledge.lookup_category(key)?,
                    None => self.random_category()?,
                };
                Some(self.render_recommendation(category))
            }
            Intent::EntityMention(entity_ref) => {
                let (_, entity) = self.knowledge.entity(entity_ref)?;
                Some(self.render_mention(entity))
            }
            Intent::CategoryDiscussion(key) => self
                .knowledge
                .lookup_category(key)
                .map(|c| c.blurb.clone()),
            Intent::None => None,
        }
    }

    /// Recommendation for an explicitly named genre (the `recommend` command).
    ///
    /// `None` picks a random genre; an unknown genre yields `None`.
    pub fn recommend_for_genre(&self, genre: Option<&str>) -> Option<String> {
        let category = match genre.map(normalize_genre) {
            Some(key) => self.knowledge.lookup_category(&key)?,
            None => self.random_category()?,
        };
        Some(self.render_recommendation(category))
    }

    fn random_category(&self) -> Option<&Category> {
        self.knowledge.all_categories().choose(&mut *self.rng())
    }

    /// Up to [`RECOMMENDATION_SIZE`] distinct bands, sampled without replacement.
    pub fn sample_entities<'a>(&self, category: &'a Category) -> Vec<&'a Entity> {
        category
            .entities
            .choose_multiple(&mut *self.rng(), RECOMMENDATION_SIZE)
            .collect()
    }

    fn render_recommendation(&self, category: &Category) -> String {
        let mut out = format!(
            "🎵 *whispers darkly* Here's some {} that'll feed your soul:\n\n",
            category.display_name()
        );
        for entity in self.sample_entities(category) {
            out.push_str(&format!(
                "**{}** ({}) - {}\n",
                entity.name, entity.active_period, entity.descriptor
            ));
        }
        out.push_str("\n*adjusts black nail polish* Trust me, these will hit different 🖤");
        out
    }

    fn render_mention(&self, entity: &Entity) -> String {
        let (name, vibe) = (&entity.name, &entity.descriptor);
        match self.rng().random_range(0..4) {
            0 => format!(
                "Oh damn, {name}? 🖤 {vibe} They're absolutely perfect for late night feelings."
            ),
            1 => format!("*eyes light up* {name} is pure magic! {vibe} They get it, you know?"),
            2 => format!("Fuck yes, {name}! {vibe} That's the kind of energy I live for ⚡"),
            _ => format!("Mmm, {name}... {vibe} *chef's kiss* Immaculate taste, gorgeous 🥀"),
        }
    }
}

/// `Pop-Punk`, `pop punk` and `poppunk` all become `pop_punk`.
fn normalize_genre(genre: &str) -> String {
    let key = genre.trim().to_lowercase().replace(['-', ' '], "_");
    if key == "poppunk" { "pop_punk".into() } else { key }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::IntentClassifier;
    use crate::knowledge::EntityRef;
    use std::collections::HashSet;

    fn recommendation() -> ClassificationResult {
        ClassificationResult {
            is_domain_related: true,
            intent: Intent::Recommendation,
        }
    }

    fn band_lines(reply: &str) -> Vec<&str> {
        reply.lines().filter(|l| l.starts_with("**")).collect()
    }

    #[test]
    fn genre_rules_most_specific_first() {
        assert_eq!(resolve_genre("recommend pop punk"), Some("pop_punk"));
        assert_eq!(resolve_genre("punk but make it pop"), Some("pop_punk"));
        assert_eq!(resolve_genre("recommend punk"), Some("punk"));
        assert_eq!(resolve_genre("metal or emo?"), Some("metal"));
        assert_eq!(resolve_genre("some alternative stuff"), Some("alternative"));
        assert_eq!(resolve_genre("recommend anything"), None);
    }

    #[test]
    fn recommendation_returns_three_distinct_bands_from_category() {
        let engine = LookupEngine::seeded(7);
        let reply = engine.respond(&recommendation(), "recommend metal").unwrap();

        let metal = engine.knowledge().lookup_category("metal").unwrap();
        let allowed: HashSet<String> = metal
            .entities
            .iter()
            .map(|e| format!("**{}** ({}) - {}", e.name, e.active_period, e.descriptor))
            .collect();

        let lines = band_lines(&reply);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().collect::<HashSet<_>>().len(), 3);
        assert!(lines.iter().all(|l| allowed.contains(*l)));
        assert!(reply.contains("Here's some metal"));
    }

    #[test]
    fn small_category_returns_all_bands() {
        let kb = KnowledgeBase::from_categories(vec![Category {
            key: "metal".into(),
            entities: vec![
                Entity {
                    name: "Tool".into(),
                    active_period: "1990-present".into(),
                    descriptor: "Progressive".into(),
                },
                Entity {
                    name: "Slipknot".into(),
                    active_period: "1995-present".into(),
                    descriptor: "Masked".into(),
                },
            ],
            sample_items: vec![],
            blurb: "Metal.".into(),
        }])
        .unwrap();
        let engine = LookupEngine::new(Arc::new(kb), StdRng::seed_from_u64(1));
        let reply = engine.respond(&recommendation(), "recommend metal").unwrap();
        assert_eq!(band_lines(&reply).len(), 2);
    }

    #[test]
    fn same_seed_same_output() {
        let a = LookupEngine::seeded(42).respond(&recommendation(), "recommend something");
        let b = LookupEngine::seeded(42).respond(&recommendation(), "recommend something");
        assert_eq!(a, b);
    }

    #[test]
    fn random_genre_when_none_named() {
        let engine = LookupEngine::seeded(3);
        let reply = engine.respond(&recommendation(), "recommend anything").unwrap();
        assert_eq!(band_lines(&reply).len(), 3);
    }

    #[test]
    fn named_genre_missing_from_knowledge_yields_none() {
        let kb = KnowledgeBase::from_categories(vec![Category {
            key: "punk".into(),
            entities: vec![],
            sample_items: vec![],
            blurb: "Punk.".into(),
        }])
        .unwrap();
        let engine = LookupEngine::new(Arc::new(kb), StdRng::seed_from_u64(1));
        assert!(engine.respond(&recommendation(), "recommend metal").is_none());
    }

    #[test]
    fn mention_contains_name_and_descriptor() {
        let engine = LookupEngine::seeded(11);
        let classification = IntentClassifier::new(engine.knowledge().clone())
            .classify("saw Iron Maiden last night");
        for _ in 0..8 {
            let reply = engine.respond(&classification, "").unwrap();
            assert!(reply.contains("Iron Maiden"));
            assert!(reply.contains("Epic storytelling with Bruce Dickinson's soaring vocals"));
        }
    }

    #[test]
    fn dangling_entity_ref_yields_none() {
        let engine = LookupEngine::seeded(1);
        let classification = ClassificationResult {
            is_domain_related: true,
            intent: Intent::EntityMention(EntityRef {
                category: "jazz".into(),
                index: 0,
            }),
        };
        assert!(engine.respond(&classification, "").is_none());
    }

    #[test]
    fn category_discussion_returns_blurb() {
        let engine = LookupEngine::seeded(1);
        let classification = ClassificationResult {
            is_domain_related: true,
            intent: Intent::CategoryDiscussion("emo".into()),
        };
        let reply = engine.respond(&classification, "emo forever").unwrap();
        assert!(reply.starts_with("Emo is emotional honesty set to music"));
    }

    #[test]
    fn none_intent_yields_none() {
        let engine = LookupEngine::seeded(1);
        let classification = ClassificationResult {
            is_domain_related: true,
            intent: Intent::None,
        };
        assert!(engine.respond(&classification, "music").is_none());
    }

    #[test]
    fn command_genre_normalization() {
        assert_eq!(normalize_genre("Pop-Punk"), "pop_punk");
        assert_eq!(normalize_genre("pop punk"), "pop_punk");
        assert_eq!(normalize_genre("poppunk"), "pop_punk");
        assert_eq!(normalize_genre(" Metal "), "metal");
    }

    #[test]
    fn recommend_for_genre_variants() {
        let engine = LookupEngine::seeded(5);
        let reply = engine.recommend_for_genre(Some("pop-punk")).unwrap();
        assert!(reply.contains("Here's some pop punk"));
        assert!(engine.recommend_for_genre(Some("jazz")).is_none());
        assert!(engine.recommend_for_genre(None).is_some());
    }
}
