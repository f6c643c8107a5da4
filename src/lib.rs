pub mod api;
pub mod db;
pub mod error;
pub mod snowflake;

use std::sync::Arc;

pub type SharedDB = Arc<db::CatalogDB>;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDB,
    pub api_key: Option<String>,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(db: db::CatalogDB, api_key: Option<String>) -> Self {
        Self {
            db: Arc::new(db),
            api_key,
            started_at: std::time::Instant::now(),
        }
    }
}
