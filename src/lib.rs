pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use sqlx::PgPool;

use crate::services::lifecycle_service::LifecycleService;
use crate::services::notification_service::EmailNotificationService;
use crate::services::reminder_service::ReminderService;
use crate::store::postgres::{PgApplicationStore, PgDirectoryStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub lifecycle_service: LifecycleService,
    pub reminder_service: ReminderService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let store = Arc::new(PgApplicationStore::new(pool.clone()));
        let directory = Arc::new(PgDirectoryStore::new(pool.clone()));
        let notifier = Arc::new(
            EmailNotificationService::new(
                config.mailer_webhook_url.clone(),
                config.mailer_secret.clone(),
                StdDuration::from_secs(config.mailer_timeout_secs),
            )
            .expect("Failed to build mailer client"),
        );

        let lifecycle_service = LifecycleService::new(
            store.clone(),
            directory.clone(),
            notifier.clone(),
            config.webapp_url.clone(),
            Duration::hours(config.confirmation_token_ttl_hours),
        );
        let reminder_service = ReminderService::new(
            store,
            directory,
            notifier,
            Duration::hours(config.reminder_lookahead_hours),
            config.webapp_url.clone(),
        );

        Self {
            pool,
            lifecycle_service,
            reminder_service,
        }
    }
}
