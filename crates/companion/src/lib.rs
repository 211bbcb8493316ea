//! Raven's conversational core.
//!
//! A message flows `classifier → lookup → backend → composer`, with the
//! per-user [`ContextStore`] updated once per turn. Prefix commands go through
//! [`CommandSet`] and never touch the context themselves. The [`Dispatcher`]
//! ties both to a chat channel.

pub mod backend;
pub mod classifier;
pub mod commands;
pub mod composer;
pub mod context;
pub mod dispatch;
pub mod knowledge;
pub mod lookup;
pub mod persona;

pub use backend::{BackendError, BackendErrorKind, GenerationBackend, ProviderBackend};
pub use classifier::{ClassificationResult, Intent, IntentClassifier, is_domain_related};
pub use commands::{CommandSet, Reply};
pub use composer::{GenerationSettings, ResponseComposer, TurnError, TurnOutcome};
pub use context::{ContextStore, InteractionRecord};
pub use dispatch::{DispatchSettings, Dispatcher, Handled};
pub use knowledge::{Category, Entity, EntityRef, KnowledgeBase, KnowledgeError};
pub use lookup::LookupEngine;
