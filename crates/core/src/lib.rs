pub mod audit;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod store;
pub mod validate;

pub use audit::{AuditEvent, AuditOperation, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use dialogue::state::{
    ChatMessage, CollectedFields, ConversationState, FieldTag, Intent, Role,
};
pub use domain::registration::{NewRegistration, Registration, RegistrationId, RegistrationPatch};
pub use store::{RegistrationStore, StoreError};
pub use validate::{FieldError, FieldValue};
