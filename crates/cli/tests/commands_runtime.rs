use std::env;
use std::sync::{Mutex, OnceLock};

use registrar_cli::commands::{config, demo, doctor, migrate};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("REGISTRAR_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_fails_fast_on_invalid_database_url() {
    with_env(&[("REGISTRAR_DATABASE_URL", "postgres://elsewhere/db")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn demo_runs_the_full_scripted_conversation() {
    with_env(&[], || {
        let result = demo::run();
        assert_eq!(result.exit_code, 0, "expected demo success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "demo");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("completed 14 scripted steps"), "got: {message}");
    });
}

#[test]
fn doctor_passes_with_in_memory_database() {
    with_env(&[("REGISTRAR_DATABASE_URL", "sqlite::memory:")], || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor --json output should be valid JSON");

        assert_eq!(payload["overall_status"], "pass", "got: {output}");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
    });
}

#[test]
fn config_output_redacts_the_api_key() {
    with_env(
        &[
            ("REGISTRAR_LLM_PROVIDER", "openai"),
            ("REGISTRAR_LLM_API_KEY", "sk-super-secret"),
        ],
        || {
            let output = config::run();
            assert!(!output.contains("sk-super-secret"), "api key leaked: {output}");
            assert!(output.contains("<redacted>"), "got: {output}");
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "REGISTRAR_DATABASE_URL",
        "REGISTRAR_DATABASE_MAX_CONNECTIONS",
        "REGISTRAR_DATABASE_TIMEOUT_SECS",
        "REGISTRAR_LLM_PROVIDER",
        "REGISTRAR_LLM_API_KEY",
        "REGISTRAR_LLM_BASE_URL",
        "REGISTRAR_LLM_MODEL",
        "REGISTRAR_LLM_TEMPERATURE",
        "REGISTRAR_LLM_TIMEOUT_SECS",
        "REGISTRAR_LLM_MAX_RETRIES",
        "REGISTRAR_SERVER_BIND_ADDRESS",
        "REGISTRAR_SERVER_PORT",
        "REGISTRAR_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "REGISTRAR_LOGGING_LEVEL",
        "REGISTRAR_LOGGING_FORMAT",
        "REGISTRAR_LOG_LEVEL",
        "REGISTRAR_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
