//! Pure routing and transition helpers for the conversation state machine.
//!
//! The engine in `registrar-agent` owns the per-turn orchestration; the
//! decisions themselves (where a message routes, which field comes next, how
//! selection text resolves) live here as plain functions over the state so
//! they can be tested without any collaborators.

use super::state::{ConversationState, FieldTag, Intent};

/// Coarse phase of a conversation, derived from the state fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No collection in progress and nothing pending execution.
    Idle,
    /// A specific field value is awaited from the user.
    AwaitingField(FieldTag),
    /// Everything needed to execute the current intent is present.
    Ready,
}

pub fn phase(state: &ConversationState) -> Phase {
    if let Some(field) = state.collecting_field {
        Phase::AwaitingField(field)
    } else if state.operation_complete {
        Phase::Ready
    } else {
        Phase::Idle
    }
}

/// Where an inbound message is routed. Data collection in progress always
/// wins over re-classification: mid-collection input is a raw field value
/// even when it happens to contain intent keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Collect(FieldTag),
    Handle(Intent),
}

pub fn route(state: &ConversationState) -> Route {
    match state.collecting_field {
        Some(field) => Route::Collect(field),
        None => Route::Handle(state.current_intent.unwrap_or(Intent::Help)),
    }
}

/// The field after `current` in the fixed create order, if any remains.
pub fn next_create_field(current: FieldTag) -> Option<FieldTag> {
    FieldTag::CREATE_ORDER
        .iter()
        .position(|tag| *tag == current)
        .and_then(|index| FieldTag::CREATE_ORDER.get(index + 1))
        .copied()
}

/// Resolves free-form update-selection text to a field: a 1-based list index
/// is honored first, then the first field whose spoken name or display label
/// is contained in the text. First match wins even when the text is
/// ambiguous between two labels.
pub fn resolve_update_field(selection: &str) -> Option<FieldTag> {
    let lowered = selection.trim().to_lowercase();

    if let Ok(index) = lowered.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| FieldTag::UPDATEABLE.get(i)).copied();
    }

    FieldTag::UPDATEABLE.iter().copied().find(|tag| {
        lowered.contains(tag.spoken_name()) || lowered.contains(&tag.label().to_lowercase())
    })
}

/// Returns the state to the idle phase once an operation has executed.
/// Collected values and the known email are retained so a follow-up
/// operation can reuse the established identity.
pub fn clear_after_execution(state: &mut ConversationState) {
    state.operation_complete = false;
    state.collecting_field = None;
    state.update_target = None;
}

#[cfg(test)]
mod tests {
    use super::{
        clear_after_execution, next_create_field, phase, resolve_update_field, route, Phase, Route,
    };
    use crate::dialogue::state::{ConversationState, FieldTag, Intent};

    #[test]
    fn collection_in_progress_always_routes_to_collect() {
        let state = ConversationState {
            current_intent: Some(Intent::Create),
            collecting_field: Some(FieldTag::Email),
            ..Default::default()
        };
        assert_eq!(route(&state), Route::Collect(FieldTag::Email));
        assert_eq!(phase(&state), Phase::AwaitingField(FieldTag::Email));
    }

    #[test]
    fn without_intent_routing_defaults_to_help() {
        assert_eq!(route(&ConversationState::default()), Route::Handle(Intent::Help));
    }

    #[test]
    fn ready_phase_requires_no_pending_collection() {
        let state = ConversationState { operation_complete: true, ..Default::default() };
        assert_eq!(phase(&state), Phase::Ready);
    }

    #[test]
    fn create_order_walk_visits_all_five_fields_in_sequence() {
        assert_eq!(next_create_field(FieldTag::FullName), Some(FieldTag::Email));
        assert_eq!(next_create_field(FieldTag::Email), Some(FieldTag::PhoneNumber));
        assert_eq!(next_create_field(FieldTag::PhoneNumber), Some(FieldTag::DateOfBirth));
        assert_eq!(next_create_field(FieldTag::DateOfBirth), Some(FieldTag::Address));
        assert_eq!(next_create_field(FieldTag::Address), None);
    }

    #[test]
    fn selection_resolves_by_one_based_index() {
        assert_eq!(resolve_update_field("1"), Some(FieldTag::FullName));
        assert_eq!(resolve_update_field(" 3 "), Some(FieldTag::PhoneNumber));
        assert_eq!(resolve_update_field("5"), Some(FieldTag::Address));
        assert_eq!(resolve_update_field("0"), None);
        assert_eq!(resolve_update_field("6"), None);
    }

    #[test]
    fn selection_resolves_by_name_or_label_containment() {
        assert_eq!(resolve_update_field("phone number"), Some(FieldTag::PhoneNumber));
        assert_eq!(resolve_update_field("change my Date of Birth"), Some(FieldTag::DateOfBirth));
        assert_eq!(resolve_update_field("the address one"), Some(FieldTag::Address));
        assert_eq!(resolve_update_field("Email Address"), Some(FieldTag::Email));
    }

    #[test]
    fn ambiguous_selection_keeps_first_match_order() {
        // Known limitation: "email address" names two fields ("email" and
        // "address"); the earlier-listed field wins.
        assert_eq!(resolve_update_field("my email address please"), Some(FieldTag::Email));
        // "name" alone only appears in "full name", so nothing matches.
        assert_eq!(resolve_update_field("name"), None);
    }

    #[test]
    fn unresolvable_selection_yields_none() {
        assert_eq!(resolve_update_field("the thing from before"), None);
    }

    #[test]
    fn clearing_after_execution_retains_identity() {
        let mut state = ConversationState {
            operation_complete: true,
            collecting_field: Some(FieldTag::PhoneNumber),
            update_target: Some(FieldTag::PhoneNumber),
            user_email: Some("alice@example.com".to_string()),
            ..Default::default()
        };

        clear_after_execution(&mut state);

        assert!(!state.operation_complete);
        assert!(state.collecting_field.is_none());
        assert!(state.update_target.is_none());
        assert_eq!(state.user_email.as_deref(), Some("alice@example.com"));
    }
}
