use registrar_core::config::{AppConfig, LlmProvider, LoadOptions, LogFormat};
use serde_json::json;

/// Prints the effective configuration with secrets redacted.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return json!({
                "command": "config",
                "status": "error",
                "message": error.to_string(),
            })
            .to_string();
        }
    };

    let provider = match config.llm.provider {
        LlmProvider::OpenAi => "openai",
        LlmProvider::Ollama => "ollama",
    };
    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };

    let payload = json!({
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "llm": {
            "provider": provider,
            "api_key": config.llm.api_key.as_ref().map(|_| "<redacted>"),
            "base_url": config.llm.base_url,
            "model": config.llm.model,
            "temperature": config.llm.temperature,
            "timeout_secs": config.llm.timeout_secs,
            "max_retries": config.llm.max_retries,
        },
        "server": {
            "bind_address": config.server.bind_address,
            "port": config.server.port,
            "graceful_shutdown_secs": config.server.graceful_shutdown_secs,
        },
        "logging": {
            "level": config.logging.level,
            "format": format,
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
        json!({ "command": "config", "status": "error", "message": error.to_string() }).to_string()
    })
}
