//! Shared application state

use std::sync::Arc;

use crate::auth::JwtService;
use crate::config::Config;
use crate::db::DbService;
use crate::error::ServiceError;
use crate::services::blob::{BlobStore, LocalBlobStore};
use crate::services::moderation::{ModerationDomain, ModerationService};
use crate::services::notify::{DbNotificationSink, NotificationSink};
use crate::services::order_flow::OrderService;

/// Everything a request handler needs, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub db: DbService,
    pub sink: Arc<dyn NotificationSink>,
    pub blobs: Arc<dyn BlobStore>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub async fn initialize(config: &Config) -> Result<Self, ServiceError> {
        let db = DbService::new(&config.database_path).await?;
        let sink: Arc<dyn NotificationSink> = Arc::new(DbNotificationSink::new(db.pool.clone()));
        let blobs: Arc<dyn BlobStore> =
            Arc::new(LocalBlobStore::new(format!("{}/blobs", config.work_dir)));
        let jwt = Arc::new(JwtService::new(&config.jwt_secret));

        Ok(Self {
            db,
            sink,
            blobs,
            jwt,
        })
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.pool.clone(), Arc::clone(&self.sink))
    }

    /// Moderation workflow for one domain; all three share the same wiring
    pub fn moderation<D: ModerationDomain>(&self) -> ModerationService<D> {
        ModerationService::new(
            self.db.pool.clone(),
            Arc::clone(&self.sink),
            Arc::clone(&self.blobs),
        )
    }
}
