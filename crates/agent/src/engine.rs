use chrono::Utc;

use registrar_core::dialogue::intent::classify_keywords;
use registrar_core::dialogue::state::{ConversationState, FieldTag, Intent, Role};
use registrar_core::dialogue::transitions::{
    clear_after_execution, next_create_field, resolve_update_field, route, Route,
};
use registrar_core::store::RegistrationStore;
use registrar_core::validate::FieldValue;

use crate::classifier::FallbackClassifier;
use crate::messages;

/// Per-turn orchestrator for the registration dialogue.
///
/// The engine holds no conversation state of its own: each call receives the
/// session's `ConversationState` and returns the mutated copy together with
/// the reply text. Callers are responsible for serializing access to a given
/// session. All collaborator failures (store, fallback classifier) are
/// converted into assistant messages inside the turn; a turn never fails.
pub struct ConversationEngine<S, C> {
    store: S,
    classifier: C,
}

impl<S, C> ConversationEngine<S, C>
where
    S: RegistrationStore,
    C: FallbackClassifier,
{
    pub fn new(store: S, classifier: C) -> Self {
        Self { store, classifier }
    }

    /// Runs one conversation turn: append the user message, route it, and
    /// produce exactly one reply.
    pub async fn process_turn(
        &self,
        message: &str,
        state: Option<ConversationState>,
    ) -> (String, ConversationState) {
        let mut state = state.unwrap_or_default();
        state.push_user(message);

        match route(&state) {
            // Mid-collection input is a raw field value, never a new intent.
            Route::Collect(field) => self.collect(field, &mut state).await,
            Route::Handle(_) => {
                let intent = self.classify(message).await;
                state.current_intent = Some(intent);
                tracing::info!(
                    event_name = "engine.intent_classified",
                    intent = ?intent,
                    "classified intent"
                );
                self.handle_intent(intent, &mut state).await;
            }
        }

        if state.operation_complete {
            self.execute(&mut state).await;
            clear_after_execution(&mut state);
        }

        let response = state
            .latest_assistant_reply()
            .map(str::to_string)
            .unwrap_or_else(|| messages::fallback().to_string());
        (response, state)
    }

    async fn classify(&self, text: &str) -> Intent {
        if let Some(intent) = classify_keywords(text) {
            return intent;
        }

        match self.classifier.classify(text).await {
            Ok(intent) => intent,
            Err(error) => {
                tracing::warn!(
                    event_name = "engine.fallback_classifier_failed",
                    error = %error,
                    "fallback classifier failed; defaulting to help"
                );
                Intent::Help
            }
        }
    }

    /// First entry into an intent. Handlers only ask the next question (or
    /// mark the operation ready when identity is already known); they are
    /// idempotent with respect to data collected earlier in the session.
    async fn handle_intent(&self, intent: Intent, state: &mut ConversationState) {
        match intent {
            Intent::Create => {
                if state.collected.is_empty() {
                    state.collecting_field = Some(FieldTag::FullName);
                    state.push_assistant(messages::create_intro());
                }
            }
            Intent::Read => {
                if state.user_email.is_none() {
                    state.collecting_field = Some(FieldTag::Email);
                    state.push_assistant(messages::read_intro());
                } else {
                    state.operation_complete = true;
                }
            }
            Intent::Update => {
                if state.user_email.is_none() {
                    state.collecting_field = Some(FieldTag::Email);
                    state.push_assistant(messages::update_intro());
                } else if state.update_target.is_none() {
                    state.collecting_field = Some(FieldTag::UpdateFieldSelection);
                    state.push_assistant(messages::update_field_list());
                } else {
                    state.operation_complete = true;
                }
            }
            Intent::Delete => {
                if state.user_email.is_none() {
                    state.collecting_field = Some(FieldTag::Email);
                    state.push_assistant(messages::delete_intro());
                } else {
                    state.operation_complete = true;
                }
            }
            Intent::Help => state.push_assistant(messages::help_text()),
            Intent::Exit => state.push_assistant(messages::goodbye()),
        }
    }

    /// Interprets the latest user message as the value for `field`. Invalid
    /// input re-prompts and leaves the state untouched, so the same field
    /// stays awaited.
    async fn collect(&self, field: FieldTag, state: &mut ConversationState) {
        let Some(raw) = state
            .messages
            .last()
            .filter(|message| message.role == Role::User)
            .map(|message| message.content.clone())
        else {
            return;
        };

        let today = Utc::now().date_naive();
        let value = match field.validate(&raw, today) {
            Ok(value) => value,
            Err(error) => {
                state.push_assistant(messages::validation_reprompt(field, &error));
                return;
            }
        };

        // Advisory duplicate check while creating. The store's unique
        // constraint remains the authority; this only catches the common
        // case early enough to re-prompt.
        if field == FieldTag::Email && state.current_intent == Some(Intent::Create) {
            if let FieldValue::Text(email) = &value {
                match self.store.find_by_email(email).await {
                    Ok(Some(_)) => {
                        state.error_message = Some(format!("Email {email} is already registered."));
                        state.push_assistant(messages::email_taken(email));
                        return;
                    }
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(
                            event_name = "engine.duplicate_check_failed",
                            error = %error,
                            "duplicate-email check failed"
                        );
                        state.push_assistant(messages::operation_error(&error.to_string()));
                        return;
                    }
                }
            }
        }

        if field == FieldTag::UpdateFieldSelection {
            let FieldValue::Text(selection) = &value else {
                return;
            };
            match resolve_update_field(selection) {
                Some(target) => {
                    state.update_target = Some(target);
                    state.collecting_field = Some(target);
                    state.push_assistant(messages::new_value_prompt(target));
                }
                None => state.push_assistant(messages::unresolved_selection()),
            }
            return;
        }

        if field == FieldTag::Email {
            if let FieldValue::Text(email) = &value {
                state.user_email = Some(email.clone());
            }
        }
        state.collected.set(field, value);

        match state.current_intent {
            Some(Intent::Create) => match next_create_field(field) {
                Some(next) => {
                    state.collecting_field = Some(next);
                    state.push_assistant(messages::next_field_prompt(next));
                }
                None => {
                    state.operation_complete = true;
                    state.collecting_field = None;
                }
            },
            Some(Intent::Read) | Some(Intent::Delete) => {
                state.operation_complete = true;
                state.collecting_field = None;
            }
            Some(Intent::Update) => {
                if field == FieldTag::Email {
                    state.collecting_field = Some(FieldTag::UpdateFieldSelection);
                    state.push_assistant(messages::update_field_list());
                } else {
                    // The new value for the chosen field was just stored.
                    state.operation_complete = true;
                    state.collecting_field = None;
                }
            }
            _ => state.collecting_field = None,
        }
    }

    /// Runs the completed operation against the store and appends exactly
    /// one result message.
    async fn execute(&self, state: &mut ConversationState) {
        let Some(intent) = state.current_intent else {
            state.push_assistant(messages::unknown_operation());
            return;
        };

        let reply = match intent {
            Intent::Create => self.execute_create(state).await,
            Intent::Read => self.execute_read(state).await,
            Intent::Update => self.execute_update(state).await,
            Intent::Delete => self.execute_delete(state).await,
            Intent::Help | Intent::Exit => messages::unknown_operation().to_string(),
        };

        tracing::info!(
            event_name = "engine.operation_executed",
            intent = ?intent,
            "operation executed"
        );
        state.push_assistant(reply);
    }

    async fn execute_create(&self, state: &ConversationState) -> String {
        let Some(new_registration) = state.collected.as_new_registration() else {
            return messages::operation_error("registration data is incomplete");
        };

        match self.store.create(new_registration).await {
            Ok(record) => messages::create_success(&record),
            Err(error) => messages::operation_error(&error.to_string()),
        }
    }

    async fn execute_read(&self, state: &ConversationState) -> String {
        let Some(email) = state.user_email.as_deref() else {
            return messages::operation_error("no email on file");
        };

        match self.store.find_by_email(email).await {
            Ok(Some(record)) => messages::read_success(&record),
            Ok(None) => messages::not_found(email),
            Err(error) => messages::operation_error(&error.to_string()),
        }
    }

    async fn execute_update(&self, state: &ConversationState) -> String {
        let Some(email) = state.user_email.as_deref() else {
            return messages::operation_error("no email on file");
        };
        let Some(target) = state.update_target else {
            return messages::update_incomplete().to_string();
        };

        let patch = state.collected.patch_for(target);
        if patch.is_empty() {
            return messages::update_incomplete().to_string();
        }

        match self.store.update(email, patch).await {
            Ok(Some(record)) => messages::update_success(target, &record),
            Ok(None) => messages::not_found(email),
            Err(error) => messages::operation_error(&error.to_string()),
        }
    }

    async fn execute_delete(&self, state: &ConversationState) -> String {
        let Some(email) = state.user_email.as_deref() else {
            return messages::operation_error("no email on file");
        };

        match self.store.delete(email).await {
            Ok(true) => messages::delete_success(email),
            Ok(false) => messages::not_found(email),
            Err(error) => messages::operation_error(&error.to_string()),
        }
    }
}
