use anyhow::Result;
use async_trait::async_trait;

use registrar_core::dialogue::intent::parse_intent_label;
use registrar_core::dialogue::state::Intent;

use crate::llm::LlmClient;

/// Second stage of intent classification, consulted only when no keyword
/// group matched. Implementations fail closed: an answer outside the six
/// known intents must come back as `Intent::Help`, and transport errors are
/// surfaced so the engine can apply the same default.
#[async_trait]
pub trait FallbackClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Intent>;
}

/// Always answers with a fixed intent. Used by the demo path and tests,
/// where keyword matching is expected to carry the conversation.
#[derive(Clone, Copy, Debug)]
pub struct StaticClassifier(pub Intent);

impl Default for StaticClassifier {
    fn default() -> Self {
        Self(Intent::Help)
    }
}

#[async_trait]
impl FallbackClassifier for StaticClassifier {
    async fn classify(&self, _text: &str) -> Result<Intent> {
        Ok(self.0)
    }
}

/// LLM-backed fallback: asks the model to label the message and parses the
/// answer against the closed intent set.
pub struct LlmIntentClassifier {
    llm: Box<dyn LlmClient>,
}

impl LlmIntentClassifier {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FallbackClassifier for LlmIntentClassifier {
    async fn classify(&self, text: &str) -> Result<Intent> {
        let reply = self.llm.complete(&classification_prompt(text)).await?;
        Ok(parse_intent_label(&reply).unwrap_or(Intent::Help))
    }
}

fn classification_prompt(message: &str) -> String {
    format!(
        r#"Classify the following user message into one of these intents:
- create: User wants to create a new registration
- read: User wants to view their registration data
- update: User wants to update their registration
- delete: User wants to delete their registration
- help: User needs help or asks what you can do
- exit: User wants to end the conversation

User message: "{message}"

Respond with ONLY the intent name (create/read/update/delete/help/exit)."#
    )
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use registrar_core::dialogue::state::Intent;

    use super::{classification_prompt, FallbackClassifier, LlmIntentClassifier};
    use crate::llm::LlmClient;

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenLlm;

    #[async_trait]
    impl LlmClient for BrokenLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("connection refused"))
        }
    }

    #[test]
    fn prompt_names_all_six_intents_and_the_message() {
        let prompt = classification_prompt("where is my stuff");
        for label in ["create", "read", "update", "delete", "help", "exit"] {
            assert!(prompt.contains(label), "prompt should mention {label}");
        }
        assert!(prompt.contains("\"where is my stuff\""));
    }

    #[tokio::test]
    async fn well_formed_label_is_parsed_case_insensitively() {
        let classifier = LlmIntentClassifier::new(Box::new(CannedLlm(" Delete \n")));
        let intent = classifier.classify("please make it go away").await.expect("classify");
        assert_eq!(intent, Intent::Delete);
    }

    #[tokio::test]
    async fn out_of_vocabulary_answer_fails_closed_to_help() {
        let classifier = LlmIntentClassifier::new(Box::new(CannedLlm("uncertain, maybe delete?")));
        let intent = classifier.classify("hmm").await.expect("classify");
        assert_eq!(intent, Intent::Help);
    }

    #[tokio::test]
    async fn transport_errors_propagate_to_the_caller() {
        let classifier = LlmIntentClassifier::new(Box::new(BrokenLlm));
        assert!(classifier.classify("hello there").await.is_err());
    }
}
