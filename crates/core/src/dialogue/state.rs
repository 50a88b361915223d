use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::registration::{NewRegistration, RegistrationPatch};
use crate::validate::{self, FieldError, FieldValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Top-level operation a user message is classified into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Create,
    Read,
    Update,
    Delete,
    Help,
    Exit,
}

/// Closed set of collectable fields. `UpdateFieldSelection` is the transient
/// "which field do you want to change" question in the update flow; the five
/// data fields double as the updateable-field list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTag {
    FullName,
    Email,
    PhoneNumber,
    DateOfBirth,
    Address,
    UpdateFieldSelection,
}

impl FieldTag {
    /// Fixed collection order for the create flow.
    pub const CREATE_ORDER: [FieldTag; 5] = [
        FieldTag::FullName,
        FieldTag::Email,
        FieldTag::PhoneNumber,
        FieldTag::DateOfBirth,
        FieldTag::Address,
    ];

    /// Fields offered in the update flow, in listing order.
    pub const UPDATEABLE: [FieldTag; 5] = FieldTag::CREATE_ORDER;

    /// Display label, as used in the update-field listing and confirmations.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullName => "Full Name",
            Self::Email => "Email Address",
            Self::PhoneNumber => "Phone Number",
            Self::DateOfBirth => "Date of Birth",
            Self::Address => "Address",
            Self::UpdateFieldSelection => "field to update",
        }
    }

    /// Label used when asking for the value, with format hints where needed.
    pub fn ask_label(&self) -> &'static str {
        match self {
            Self::FullName => "Full Name",
            Self::Email => "Email Address",
            Self::PhoneNumber => "Phone Number",
            Self::DateOfBirth => "Date of Birth (YYYY-MM-DD)",
            Self::Address => "Full Address",
            Self::UpdateFieldSelection => "field to update",
        }
    }

    /// Lowercase spoken-form name, matched against free-form selection text.
    pub fn spoken_name(&self) -> &'static str {
        match self {
            Self::FullName => "full name",
            Self::Email => "email",
            Self::PhoneNumber => "phone number",
            Self::DateOfBirth => "date of birth",
            Self::Address => "address",
            Self::UpdateFieldSelection => "update field selection",
        }
    }

    /// Validates raw user input for this field, producing the normalized
    /// value. Selector fields are passthrough: any trimmed text is accepted.
    pub fn validate(&self, raw: &str, today: NaiveDate) -> Result<FieldValue, FieldError> {
        match self {
            Self::FullName => validate::full_name(raw).map(FieldValue::Text),
            Self::Email => validate::email(raw).map(FieldValue::Text),
            Self::PhoneNumber => validate::phone_number(raw).map(FieldValue::Text),
            Self::DateOfBirth => validate::date_of_birth(raw, today).map(FieldValue::Date),
            Self::Address => validate::address(raw).map(FieldValue::Text),
            Self::UpdateFieldSelection => Ok(FieldValue::Text(raw.trim().to_string())),
        }
    }
}

/// Typed storage for validated field values collected during a conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedFields {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

impl CollectedFields {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.date_of_birth.is_none()
            && self.address.is_none()
    }

    pub fn is_set(&self, tag: FieldTag) -> bool {
        match tag {
            FieldTag::FullName => self.full_name.is_some(),
            FieldTag::Email => self.email.is_some(),
            FieldTag::PhoneNumber => self.phone_number.is_some(),
            FieldTag::DateOfBirth => self.date_of_birth.is_some(),
            FieldTag::Address => self.address.is_some(),
            FieldTag::UpdateFieldSelection => false,
        }
    }

    pub fn set(&mut self, tag: FieldTag, value: FieldValue) {
        match (tag, value) {
            (FieldTag::FullName, FieldValue::Text(v)) => self.full_name = Some(v),
            (FieldTag::Email, FieldValue::Text(v)) => self.email = Some(v),
            (FieldTag::PhoneNumber, FieldValue::Text(v)) => self.phone_number = Some(v),
            (FieldTag::DateOfBirth, FieldValue::Date(v)) => self.date_of_birth = Some(v),
            (FieldTag::Address, FieldValue::Text(v)) => self.address = Some(v),
            // Selection text is resolved immediately, never stored; a value
            // of the wrong shape for its tag is likewise dropped.
            _ => {}
        }
    }

    /// All five create fields present, in which case the record input can be
    /// assembled.
    pub fn as_new_registration(&self) -> Option<NewRegistration> {
        Some(NewRegistration {
            full_name: self.full_name.clone()?,
            email: self.email.clone()?,
            phone_number: self.phone_number.clone()?,
            date_of_birth: self.date_of_birth?,
            address: self.address.clone()?,
        })
    }

    /// A partial update carrying only the value collected for `tag`.
    pub fn patch_for(&self, tag: FieldTag) -> RegistrationPatch {
        match tag {
            FieldTag::FullName => {
                RegistrationPatch { full_name: self.full_name.clone(), ..Default::default() }
            }
            FieldTag::Email => {
                RegistrationPatch { email: self.email.clone(), ..Default::default() }
            }
            FieldTag::PhoneNumber => {
                RegistrationPatch { phone_number: self.phone_number.clone(), ..Default::default() }
            }
            FieldTag::DateOfBirth => {
                RegistrationPatch { date_of_birth: self.date_of_birth, ..Default::default() }
            }
            FieldTag::Address => {
                RegistrationPatch { address: self.address.clone(), ..Default::default() }
            }
            FieldTag::UpdateFieldSelection => RegistrationPatch::default(),
        }
    }
}

/// Per-session conversation state. Owned by the caller's session store and
/// mutated in place across turns; the engine itself keeps nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub current_intent: Option<Intent>,
    pub user_email: Option<String>,
    pub collecting_field: Option<FieldTag>,
    pub collected: CollectedFields,
    pub update_target: Option<FieldTag>,
    pub operation_complete: bool,
    pub error_message: Option<String>,
}

impl ConversationState {
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// The latest message, only if the assistant spoke last.
    pub fn latest_assistant_reply(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ChatMessage, CollectedFields, ConversationState, FieldTag};
    use crate::validate::FieldValue;

    #[test]
    fn create_order_starts_with_full_name_and_ends_with_address() {
        assert_eq!(FieldTag::CREATE_ORDER.first(), Some(&FieldTag::FullName));
        assert_eq!(FieldTag::CREATE_ORDER.last(), Some(&FieldTag::Address));
    }

    #[test]
    fn collected_fields_assemble_a_record_only_when_complete() {
        let mut collected = CollectedFields::default();
        assert!(collected.as_new_registration().is_none());

        collected.set(FieldTag::FullName, FieldValue::Text("Alice Johnson".to_string()));
        collected.set(FieldTag::Email, FieldValue::Text("alice@example.com".to_string()));
        collected.set(FieldTag::PhoneNumber, FieldValue::Text("+14155551234".to_string()));
        collected.set(
            FieldTag::DateOfBirth,
            FieldValue::Date(NaiveDate::from_ymd_opt(1995, 3, 20).expect("valid date")),
        );
        assert!(collected.as_new_registration().is_none());

        collected.set(FieldTag::Address, FieldValue::Text("456 Oak Ave".to_string()));
        let record = collected.as_new_registration().expect("all five fields set");
        assert_eq!(record.email, "alice@example.com");
    }

    #[test]
    fn patch_for_carries_exactly_one_field() {
        let collected = CollectedFields {
            phone_number: Some("+14155559999".to_string()),
            full_name: Some("Alice Johnson".to_string()),
            ..Default::default()
        };

        let patch = collected.patch_for(FieldTag::PhoneNumber);
        assert_eq!(patch.phone_number.as_deref(), Some("+14155559999"));
        assert!(patch.full_name.is_none());
        assert!(patch.email.is_none());
    }

    #[test]
    fn latest_assistant_reply_requires_assistant_to_speak_last() {
        let mut state = ConversationState::default();
        assert!(state.latest_assistant_reply().is_none());

        state.messages.push(ChatMessage::assistant("hello"));
        state.messages.push(ChatMessage::user("hi"));
        assert!(state.latest_assistant_reply().is_none());

        state.messages.push(ChatMessage::assistant("what next?"));
        assert_eq!(state.latest_assistant_reply(), Some("what next?"));
    }
}
