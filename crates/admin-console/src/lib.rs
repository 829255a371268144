//! Backoffice admin console: organization and user management and the
//! provider dashboard, composed over pluggable record storage.
//!
//! # Modules
//!
//! - [`store`]: Repository traits and the in-memory store
//! - [`file_store`]: JSON-file overlay persistence
//! - [`organization_ops`]: Organization lifecycle (create, rename, reprice, filters)
//! - [`user_ops`]: User management (create, edit, lookups, filters)
//! - [`provider_dashboard`]: Period-scoped dashboard and organization detail
//! - [`sample_data`]: Demo organizations, users and activity

pub mod file_store;
pub mod organization_ops;
pub mod provider_dashboard;
pub mod sample_data;
pub mod store;
pub mod user_ops;

use std::sync::Arc;

use tracing::info;

use backoffice_core::config::AppConfig;
use backoffice_core::error::BackofficeResult;
use backoffice_reporting::dashboard::StatsAggregator;
use backoffice_reporting::period::{Clock, PeriodClassifier, SystemClock};

pub use file_store::FileStore;
pub use organization_ops::OrganizationOps;
pub use provider_dashboard::{DashboardQuery, DashboardService, DashboardSnapshot};
pub use store::{ActivityRepository, MemoryStore, OrganizationRepository, UserRepository};
pub use user_ops::UserOps;

/// The console's services wired to one shared store and clock.
pub struct AdminConsole {
    pub organizations: OrganizationOps,
    pub users: UserOps,
    pub dashboard: DashboardService,
}

impl AdminConsole {
    pub fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>, classifier: PeriodClassifier) -> Self
    where
        S: OrganizationRepository + UserRepository + ActivityRepository + 'static,
    {
        Self {
            organizations: OrganizationOps::new(store.clone(), store.clone(), clock.clone()),
            users: UserOps::new(store.clone(), store.clone(), clock.clone()),
            dashboard: DashboardService::new(
                store.clone(),
                store.clone(),
                store,
                StatsAggregator::new(classifier),
                clock,
            ),
        }
    }

    /// Build from configuration: file-backed when `storage.data_file` is set,
    /// in memory otherwise, on the system clock.
    pub fn from_config(config: &AppConfig) -> BackofficeResult<Self> {
        let classifier = PeriodClassifier::new(config.reporting.utc_offset()?);
        let base = if config.storage.seed_sample_data {
            MemoryStore::with_sample_data()
        } else {
            MemoryStore::new()
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let console = match &config.storage.data_file {
            Some(path) => {
                info!(path = %path, "Using file-backed storage");
                Self::new(Arc::new(FileStore::new(path, base)), clock, classifier)
            }
            None => {
                info!("Using in-memory storage");
                Self::new(Arc::new(base), clock, classifier)
            }
        };
        Ok(console)
    }
}
