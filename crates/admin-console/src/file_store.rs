//! JSON-file persistence for records created or edited through the console.
//!
//! The file holds an overlay on top of a base [`MemoryStore`]. Reads merge
//! both, overlay records shadowing base records with the same id. Writes
//! only ever touch the overlay, so base records are edited by storing an
//! overriding copy.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use backoffice_billing::reprice;
use backoffice_core::error::{BackofficeError, BackofficeResult};
use backoffice_core::types::{EngagementStats, LoginLog, Organization, User, UserActivity};

use crate::store::{
    sort_organizations, sort_users, ActivityRepository, MemoryStore, OrganizationRepository,
    UserRepository,
};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Overlay {
    #[serde(default)]
    organizations: Vec<Organization>,
    #[serde(default)]
    users: Vec<User>,
}

trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Organization {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for User {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Base records with every overlay record applied on top, last write wins.
fn merge<T: Keyed>(base: Vec<T>, overlay: Vec<T>) -> Vec<T> {
    let mut merged = base;
    for record in overlay {
        match merged.iter_mut().find(|r| r.key() == record.key()) {
            Some(slot) => *slot = record,
            None => merged.push(record),
        }
    }
    merged
}

fn upsert<T: Keyed>(records: &mut Vec<T>, record: T) {
    match records.iter_mut().find(|r| r.key() == record.key()) {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
}

fn remove<T: Keyed>(records: &mut Vec<T>, id: Uuid) -> bool {
    let before = records.len();
    records.retain(|r| r.key() != id);
    records.len() != before
}

pub struct FileStore {
    path: PathBuf,
    base: MemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, base: MemoryStore) -> Self {
        Self {
            path: path.into(),
            base,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or empty file is an empty overlay. Unparsable content is an
    /// error rather than silently discarded edits. MRR stored in the file is
    /// never trusted.
    async fn read_overlay(&self) -> BackofficeResult<Overlay> {
        let mut overlay: Overlay = match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Overlay::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Overlay::default(),
            Err(e) => return Err(e.into()),
        };
        overlay.organizations.iter_mut().for_each(reprice);
        Ok(overlay)
    }

    /// Replace the file atomically through a temporary sibling.
    async fn write_overlay(&self, overlay: &Overlay) -> BackofficeResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let body = serde_json::to_vec_pretty(overlay)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(
            path = %self.path.display(),
            organizations = overlay.organizations.len(),
            users = overlay.users.len(),
            "Overlay written"
        );
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for FileStore {
    async fn list_organizations(&self) -> BackofficeResult<Vec<Organization>> {
        let overlay = self.read_overlay().await?;
        let mut orgs = merge(self.base.organizations_snapshot(), overlay.organizations);
        sort_organizations(&mut orgs);
        Ok(orgs)
    }

    async fn insert_organization(&self, mut organization: Organization) -> BackofficeResult<()> {
        reprice(&mut organization);
        let _guard = self.write_lock.lock().await;
        let mut overlay = self.read_overlay().await?;
        if self.base.has_organization(organization.id)
            || overlay.organizations.iter().any(|o| o.id == organization.id)
        {
            return Err(BackofficeError::Duplicate(format!(
                "organization id {}",
                organization.id
            )));
        }
        info!(org_id = %organization.id, path = %self.path.display(), "Organization persisted");
        overlay.organizations.push(organization);
        self.write_overlay(&overlay).await
    }

    async fn update_organization(&self, mut organization: Organization) -> BackofficeResult<()> {
        reprice(&mut organization);
        let _guard = self.write_lock.lock().await;
        let mut overlay = self.read_overlay().await?;
        let known = self.base.has_organization(organization.id)
            || overlay.organizations.iter().any(|o| o.id == organization.id);
        if !known {
            return Err(BackofficeError::not_found("Organization", organization.id));
        }
        upsert(&mut overlay.organizations, organization);
        self.write_overlay(&overlay).await
    }

    /// Only overlay records can be deleted.
    async fn delete_organization(&self, id: Uuid) -> BackofficeResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut overlay = self.read_overlay().await?;
        if !remove(&mut overlay.organizations, id) {
            return Err(BackofficeError::not_found("Organization", id));
        }
        self.write_overlay(&overlay).await
    }
}

#[async_trait]
impl UserRepository for FileStore {
    async fn list_users(&self) -> BackofficeResult<Vec<User>> {
        let overlay = self.read_overlay().await?;
        let mut users = merge(self.base.users_snapshot(), overlay.users);
        sort_users(&mut users);
        Ok(users)
    }

    async fn insert_user(&self, user: User) -> BackofficeResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut overlay = self.read_overlay().await?;
        if self.base.has_user(user.id) || overlay.users.iter().any(|u| u.id == user.id) {
            return Err(BackofficeError::Duplicate(format!("user id {}", user.id)));
        }
        info!(user_id = %user.id, path = %self.path.display(), "User persisted");
        overlay.users.push(user);
        self.write_overlay(&overlay).await
    }

    async fn update_user(&self, user: User) -> BackofficeResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut overlay = self.read_overlay().await?;
        if !self.base.has_user(user.id) && !overlay.users.iter().any(|u| u.id == user.id) {
            return Err(BackofficeError::not_found("User", user.id));
        }
        upsert(&mut overlay.users, user);
        self.write_overlay(&overlay).await
    }

    async fn delete_user(&self, id: Uuid) -> BackofficeResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut overlay = self.read_overlay().await?;
        if !remove(&mut overlay.users, id) {
            return Err(BackofficeError::not_found("User", id));
        }
        self.write_overlay(&overlay).await
    }
}

#[async_trait]
impl ActivityRepository for FileStore {
    async fn login_logs(&self, organization_id: Uuid) -> BackofficeResult<Vec<LoginLog>> {
        self.base.login_logs(organization_id).await
    }

    async fn user_activities(&self, organization_id: Uuid) -> BackofficeResult<Vec<UserActivity>> {
        self.base.user_activities(organization_id).await
    }

    async fn engagement_stats(&self, organization_id: Uuid) -> BackofficeResult<EngagementStats> {
        self.base.engagement_stats(organization_id).await
    }
}
