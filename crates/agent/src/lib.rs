//! Conversation engine - intent classification and CRUD dialogue orchestration
//!
//! This crate runs the per-turn pipeline of the registration assistant:
//! - Classifies each message into one of six intents (keyword pass first,
//!   LLM fallback second)
//! - Walks the user through field collection one validated value at a time
//! - Executes the completed operation against the registration store
//! - Formats every outcome as an assistant message
//!
//! # Architecture
//!
//! One turn runs classify → route → handle → (collect) → (execute)
//! synchronously:
//! 1. **Classification** (`classifier`) - keyword groups in fixed priority
//!    order, then the pluggable `FallbackClassifier`
//! 2. **Routing** - in-progress field collection always wins over
//!    re-classification
//! 3. **Collection** (`engine`) - validators from `registrar-core` gate every
//!    stored value; invalid input re-prompts without advancing
//! 4. **Execution** - dispatch to the `RegistrationStore`, exactly one result
//!    message per completed operation
//!
//! # Safety principle
//!
//! The LLM is strictly a labeler. It only ever maps free text onto the closed
//! intent set; it never sees or produces record data, and an unusable answer
//! degrades to the help intent.

pub mod classifier;
pub mod engine;
pub mod llm;
pub mod messages;
pub mod session;

pub use classifier::{FallbackClassifier, LlmIntentClassifier, StaticClassifier};
pub use engine::ConversationEngine;
pub use llm::{client_from_config, LlmClient, OllamaClient, OpenAiClient};
pub use session::{InMemorySessionStore, SessionStore};
