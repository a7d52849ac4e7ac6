use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::Config;
use crate::db::Store;

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        // Best-effort: the server must come up even when the bootstrap
        // write fails; login surfaces any real storage problem.
        if let Err(e) = store.ensure_admin_bootstrap(&config.security).await {
            warn!("Admin bootstrap failed: {e}");
        }

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
