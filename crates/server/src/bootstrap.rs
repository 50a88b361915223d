use std::sync::Arc;

use registrar_agent::classifier::LlmIntentClassifier;
use registrar_agent::engine::ConversationEngine;
use registrar_agent::llm::client_from_config;
use registrar_agent::session::{InMemorySessionStore, SessionStore};
use registrar_core::config::{AppConfig, ConfigError, LoadOptions};
use registrar_db::{connect_with_settings, migrations, DbPool, SqlRegistrationStore};
use thiserror::Error;
use tracing::info;

pub type AppEngine = ConversationEngine<SqlRegistrationStore, LlmIntentClassifier>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<AppEngine>,
    pub sessions: Arc<dyn SessionStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client construction failed: {0}")]
    LlmClient(anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let llm = client_from_config(&config.llm).map_err(BootstrapError::LlmClient)?;
    let engine = Arc::new(ConversationEngine::new(
        SqlRegistrationStore::new(db_pool.clone()),
        LlmIntentClassifier::new(llm),
    ));

    Ok(Application {
        config,
        db_pool,
        engine,
        sessions: Arc::new(InMemorySessionStore::new()),
    })
}

/// Test configuration: single-connection in-memory database so the migrated
/// schema stays on the one live connection.
#[cfg(test)]
pub fn in_memory_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config
}
