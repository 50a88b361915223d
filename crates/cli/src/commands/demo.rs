use std::sync::Arc;

use registrar_agent::classifier::StaticClassifier;
use registrar_agent::engine::ConversationEngine;
use registrar_core::dialogue::state::ConversationState;
use registrar_db::InMemoryRegistrationStore;

use crate::commands::CommandResult;

// One scripted conversation covering all four CRUD flows. The store is
// in-memory, so the demo is self-contained and repeatable.
const SCRIPT: &[(&str, &str)] = &[
    ("help", "Getting available commands"),
    ("I want to create a new registration", "Starting registration"),
    ("Alice Johnson", "Providing name"),
    ("alice.johnson@example.com", "Providing email"),
    ("+14155551234", "Providing phone"),
    ("1995-03-20", "Providing date of birth"),
    ("456 Oak Avenue, San Francisco, CA 94102, USA", "Providing address"),
    // "registration" contains the create keyword "register", so the later
    // steps phrase their requests without it.
    ("show my data", "Reading registration"),
    ("I need to update my details", "Starting update"),
    ("phone number", "Selecting field to update"),
    ("+14155559999", "Providing new phone"),
    ("show my data", "Verifying update"),
    ("delete my account", "Deleting registration"),
    ("show my data", "Confirming deletion"),
];

pub fn run() -> CommandResult {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "demo",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let steps = runtime.block_on(async {
        let store = Arc::new(InMemoryRegistrationStore::new());
        let engine = ConversationEngine::new(store, StaticClassifier::default());

        let mut state: Option<ConversationState> = None;
        for (step, (message, description)) in SCRIPT.iter().enumerate() {
            println!("\n{}\n", "=".repeat(70));
            println!("Step {}: {description}", step + 1);
            println!("\n💬 User: {message}");

            let (response, next_state) = engine.process_turn(message, state).await;
            state = Some(next_state);

            println!("\n🤖 Assistant:\n{response}");
        }
        println!("\n{}\n", "=".repeat(70));
        SCRIPT.len()
    });

    CommandResult::success("demo", format!("completed {steps} scripted steps"))
}
