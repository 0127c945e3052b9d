use std::sync::Arc;
use crate::config::Config;
use crate::db::{DbPool, create_pool};

#[derive(Clone)]
pub struct FreightContext {
    pub config: Arc<Config>,
    pub db_pool: Arc<DbPool>,
}

impl FreightContext {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = create_pool(&config.database).await?;

        Ok(FreightContext {
            config: Arc::new(config),
            db_pool,
        })
    }
}
