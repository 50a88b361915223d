use super::state::Intent;

const CREATE_KEYWORDS: &[&str] = &["create", "register", "sign up", "new account", "new registration"];
const READ_KEYWORDS: &[&str] = &["read", "show", "view", "get", "retrieve", "my data", "my info"];
const UPDATE_KEYWORDS: &[&str] = &["update", "change", "modify", "edit"];
const DELETE_KEYWORDS: &[&str] = &["delete", "remove", "deregister"];
const HELP_KEYWORDS: &[&str] = &["help", "what can you do", "commands"];
const EXIT_KEYWORDS: &[&str] = &["exit", "quit", "bye", "goodbye"];

/// Keyword pass of the intent classifier: case-insensitive substring
/// matching, first group wins. The group order is part of the contract —
/// a message matching both "create" and "update" classifies as create.
pub fn classify_keywords(text: &str) -> Option<Intent> {
    let lowered = text.to_lowercase();
    let groups: [(&[&str], Intent); 6] = [
        (CREATE_KEYWORDS, Intent::Create),
        (READ_KEYWORDS, Intent::Read),
        (UPDATE_KEYWORDS, Intent::Update),
        (DELETE_KEYWORDS, Intent::Delete),
        (HELP_KEYWORDS, Intent::Help),
        (EXIT_KEYWORDS, Intent::Exit),
    ];

    groups
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, intent)| *intent)
}

/// Parses the label returned by the fallback classifier. Anything outside
/// the six known intents is rejected so the caller can fail closed to help.
pub fn parse_intent_label(label: &str) -> Option<Intent> {
    match label.trim().to_lowercase().as_str() {
        "create" => Some(Intent::Create),
        "read" => Some(Intent::Read),
        "update" => Some(Intent::Update),
        "delete" => Some(Intent::Delete),
        "help" => Some(Intent::Help),
        "exit" => Some(Intent::Exit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_keywords, parse_intent_label};
    use crate::dialogue::state::Intent;

    #[test]
    fn each_group_classifies_on_its_own_keywords() {
        let cases = [
            ("I want to register please", Intent::Create),
            ("sign up for an account", Intent::Create),
            ("show me my data", Intent::Read),
            ("retrieve my details", Intent::Read),
            ("I need to modify my address", Intent::Update),
            ("remove me from the system", Intent::Delete),
            ("what can you do", Intent::Help),
            ("goodbye", Intent::Exit),
        ];
        for (text, expected) in cases {
            assert_eq!(classify_keywords(text), Some(expected), "text: {text}");
        }
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(classify_keywords("CREATE my account"), Some(Intent::Create));
        // Substring, not word, matching: "update" inside "updated" counts.
        assert_eq!(classify_keywords("I upDATEd my address"), Some(Intent::Update));
    }

    #[test]
    fn earlier_group_wins_when_several_match() {
        // "update" and "create" both appear; create is the earlier group.
        assert_eq!(classify_keywords("I updated my create account"), Some(Intent::Create));
        // "show" (read) beats "change" (update).
        assert_eq!(classify_keywords("show me what I can change"), Some(Intent::Read));
        // "remove" (delete) beats "bye" (exit).
        assert_eq!(classify_keywords("remove me, bye"), Some(Intent::Delete));
        // "deregister" and "registration" both contain "register", so the
        // create group always claims them before delete/read can.
        assert_eq!(classify_keywords("deregister me"), Some(Intent::Create));
        assert_eq!(classify_keywords("show my registration"), Some(Intent::Create));
    }

    #[test]
    fn unmatched_text_yields_none_for_fallback_delegation() {
        assert_eq!(classify_keywords("the weather is nice today"), None);
    }

    #[test]
    fn fallback_labels_parse_only_known_intents() {
        assert_eq!(parse_intent_label(" Delete \n"), Some(Intent::Delete));
        assert_eq!(parse_intent_label("CREATE"), Some(Intent::Create));
        assert_eq!(parse_intent_label("unsure"), None);
        assert_eq!(parse_intent_label(""), None);
    }
}
