use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::rate_limit::RateLimiters;
use crate::uploads::{DiskUploadStore, UploadStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub uploads: Arc<dyn UploadStore>,
    pub limiters: RateLimiters,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let uploads =
            Arc::new(DiskUploadStore::new(&config.upload_dir)) as Arc<dyn UploadStore>;

        Ok(Self {
            db,
            config,
            uploads,
            limiters: RateLimiters::default(),
        })
    }
}
