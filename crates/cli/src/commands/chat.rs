use std::io::{self, BufRead, Write};

use registrar_agent::classifier::LlmIntentClassifier;
use registrar_agent::engine::ConversationEngine;
use registrar_agent::llm::client_from_config;
use registrar_core::config::{AppConfig, LoadOptions};
use registrar_core::dialogue::state::ConversationState;
use registrar_db::{connect_with_settings, migrations, SqlRegistrationStore};

use crate::commands::CommandResult;

/// Interactive chat REPL against the configured database.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let llm = client_from_config(&config.llm)
            .map_err(|error| ("llm_client", error.to_string(), 6u8))?;
        let engine = ConversationEngine::new(
            SqlRegistrationStore::new(pool.clone()),
            LlmIntentClassifier::new(llm),
        );

        let turns = repl(&engine).await.map_err(|error| ("io", error.to_string(), 7u8))?;
        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(turns)
    });

    match result {
        Ok(turns) => CommandResult::success("chat", format!("session ended after {turns} turns")),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

fn print_welcome() {
    println!("\n{}", "=".repeat(70));
    println!("{:^70}", "🤖  REGISTRATION ASSISTANT");
    println!("{}", "=".repeat(70));
    println!("\nWelcome! I can help you manage your registration data.");
    println!("\nType 'help' to see what I can do, or 'exit' to quit.\n");
}

async fn repl<S, C>(engine: &ConversationEngine<S, C>) -> io::Result<usize>
where
    S: registrar_core::store::RegistrationStore,
    C: registrar_agent::classifier::FallbackClassifier,
{
    print_welcome();

    let stdin = io::stdin();
    let mut state: Option<ConversationState> = None;
    let mut turns = 0usize;

    loop {
        print!("\n💬 You: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Local exit check, mirroring the turn-level exit intent.
        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            println!("\n👋 Thank you for using the registration assistant. Goodbye!\n");
            break;
        }

        let (response, next_state) = engine.process_turn(input, state).await;
        state = Some(next_state);
        turns += 1;

        println!("\n🤖 Assistant: {response}");
    }

    Ok(turns)
}
