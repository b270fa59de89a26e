pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    application_service::ApplicationService,
    audit_service::AuditService,
    feed_service::ApplicationFeed,
    job_service::JobService,
    report_service::ReportService,
    upload_service::{BlobStore, LocalBlobStore, UploadService},
    user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub feed: ApplicationFeed,
    pub user_service: UserService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub report_service: ReportService,
    pub upload_service: UploadService,
    pub audit_service: AuditService,
}

impl AppState {
    /// State backed by the on-disk blob store configured in `UPLOADS_DIR`.
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        let store = LocalBlobStore::new(&config.uploads_dir, config.public_base_url.clone());
        Self::with_blob_store(pool, config, Arc::new(store))
    }

    pub fn with_blob_store(pool: PgPool, config: Arc<Config>, store: Arc<dyn BlobStore>) -> Self {
        let feed = ApplicationFeed::new();

        Self {
            user_service: UserService::new(pool.clone()),
            job_service: JobService::new(pool.clone()),
            application_service: ApplicationService::new(pool.clone(), feed.clone()),
            report_service: ReportService::new(pool.clone()),
            upload_service: UploadService::new(store),
            audit_service: AuditService::new(pool.clone()),
            feed,
            config,
            pool,
        }
    }
}
