//! Application state wiring the service to its store.
//!
//! `ChatService` is generic over the `ChatStore` trait; AppState pins it to
//! the SQLite implementation. Used by both CLI commands and HTTP handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parley_core::chat::service::ChatService;
use parley_infra::sqlite::chat::SqliteChatStore;
use parley_infra::sqlite::pool::{DatabasePool, database_url_for};
use parley_types::config::AppConfig;

/// Concrete type alias for the service generic pinned to the infra store.
pub type ConcreteChatService = ChatService<SqliteChatStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub db_pool: DatabasePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Initialize the application state: connect to DB, run migrations,
    /// wire the service.
    ///
    /// Without an explicit `database.url` the database lives at
    /// `{data_dir}/parley.db`, creating the directory if needed.
    pub async fn init(config: AppConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let db_url = match &config.database.url {
            Some(url) => url.clone(),
            None => {
                tokio::fs::create_dir_all(data_dir)
                    .await
                    .with_context(|| format!("failed to create {}", data_dir.display()))?;
                database_url_for(data_dir)
            }
        };

        let db_pool = DatabasePool::new(&db_url, &config.database)
            .await
            .with_context(|| format!("failed to open database {db_url}"))?;
        tracing::debug!(url = %db_url, "Database ready");

        let chat_service = ChatService::new(SqliteChatStore::new(db_pool.clone()), config.paging);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            db_pool,
            config: Arc::new(config),
        })
    }
}
