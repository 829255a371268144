//! Record storage behind the console. Repositories are async traits so the
//! ops layer works the same against the in-memory store and the file store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use backoffice_billing::reprice;
use backoffice_core::error::{BackofficeError, BackofficeResult};
use backoffice_core::types::{EngagementStats, LoginLog, Organization, User, UserActivity};

use crate::sample_data;

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Every organization, oldest first.
    async fn list_organizations(&self) -> BackofficeResult<Vec<Organization>>;

    async fn get_organization(&self, id: Uuid) -> BackofficeResult<Option<Organization>> {
        Ok(self
            .list_organizations()
            .await?
            .into_iter()
            .find(|o| o.id == id))
    }

    /// Fails with `Duplicate` when the id is already taken. The stored MRR is
    /// always re-derived from plan, seats and subscription type.
    async fn insert_organization(&self, organization: Organization) -> BackofficeResult<()>;

    /// Fails with `NotFound` when no record has this id.
    async fn update_organization(&self, organization: Organization) -> BackofficeResult<()>;

    async fn delete_organization(&self, id: Uuid) -> BackofficeResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user, oldest first.
    async fn list_users(&self) -> BackofficeResult<Vec<User>>;

    async fn get_user(&self, id: Uuid) -> BackofficeResult<Option<User>> {
        Ok(self.list_users().await?.into_iter().find(|u| u.id == id))
    }

    async fn insert_user(&self, user: User) -> BackofficeResult<()>;

    async fn update_user(&self, user: User) -> BackofficeResult<()>;

    async fn delete_user(&self, id: Uuid) -> BackofficeResult<()>;
}

/// Read-only activity data for the organization detail view.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Most recent login first.
    async fn login_logs(&self, organization_id: Uuid) -> BackofficeResult<Vec<LoginLog>>;

    async fn user_activities(&self, organization_id: Uuid) -> BackofficeResult<Vec<UserActivity>>;

    /// All-zero stats for organizations without recorded activity.
    async fn engagement_stats(&self, organization_id: Uuid) -> BackofficeResult<EngagementStats>;
}

pub(crate) fn sort_organizations(orgs: &mut [Organization]) {
    orgs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
}

pub(crate) fn sort_users(users: &mut [User]) {
    users.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.last_name.cmp(&b.last_name))
            .then_with(|| a.first_name.cmp(&b.first_name))
    });
}

// ─── In-memory store ────────────────────────────────────────────────────

/// Concurrent in-memory store. Lives for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    organizations: DashMap<Uuid, Organization>,
    users: DashMap<Uuid, User>,
    login_logs: DashMap<Uuid, Vec<LoginLog>>,
    activities: DashMap<Uuid, Vec<UserActivity>>,
    engagement: DashMap<Uuid, EngagementStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo organizations, users and activity.
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        for org in sample_data::organizations() {
            store.organizations.insert(org.id, org);
        }
        for user in sample_data::users() {
            store.users.insert(user.id, user);
        }
        for (org_id, log) in sample_data::login_logs() {
            store.record_login(org_id, log);
        }
        for (org_id, activity) in sample_data::user_activities() {
            store.activities.entry(org_id).or_default().push(activity);
        }
        for (org_id, stats) in sample_data::engagement_stats() {
            store.engagement.insert(org_id, stats);
        }
        debug!(
            organizations = store.organizations.len(),
            users = store.users.len(),
            "Sample data loaded"
        );
        store
    }

    pub fn record_login(&self, organization_id: Uuid, log: LoginLog) {
        self.login_logs.entry(organization_id).or_default().push(log);
    }

    pub(crate) fn organizations_snapshot(&self) -> Vec<Organization> {
        let mut orgs: Vec<_> = self.organizations.iter().map(|e| e.value().clone()).collect();
        sort_organizations(&mut orgs);
        orgs
    }

    pub(crate) fn users_snapshot(&self) -> Vec<User> {
        let mut users: Vec<_> = self.users.iter().map(|e| e.value().clone()).collect();
        sort_users(&mut users);
        users
    }

    pub(crate) fn has_organization(&self, id: Uuid) -> bool {
        self.organizations.contains_key(&id)
    }

    pub(crate) fn has_user(&self, id: Uuid) -> bool {
        self.users.contains_key(&id)
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn list_organizations(&self) -> BackofficeResult<Vec<Organization>> {
        Ok(self.organizations_snapshot())
    }

    async fn get_organization(&self, id: Uuid) -> BackofficeResult<Option<Organization>> {
        Ok(self.organizations.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_organization(&self, mut organization: Organization) -> BackofficeResult<()> {
        reprice(&mut organization);
        match self.organizations.entry(organization.id) {
            Entry::Occupied(_) => Err(BackofficeError::Duplicate(
                format!("organization id {}", organization.id),
            )),
            Entry::Vacant(slot) => {
                debug!(org_id = %organization.id, "Organization stored");
                slot.insert(organization);
                Ok(())
            }
        }
    }

    async fn update_organization(&self, mut organization: Organization) -> BackofficeResult<()> {
        reprice(&mut organization);
        let mut entry = self
            .organizations
            .get_mut(&organization.id)
            .ok_or_else(|| BackofficeError::not_found("Organization", organization.id))?;
        *entry = organization;
        Ok(())
    }

    async fn delete_organization(&self, id: Uuid) -> BackofficeResult<()> {
        self.organizations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BackofficeError::not_found("Organization", id))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> BackofficeResult<Vec<User>> {
        Ok(self.users_snapshot())
    }

    async fn get_user(&self, id: Uuid) -> BackofficeResult<Option<User>> {
        Ok(self.users.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_user(&self, user: User) -> BackofficeResult<()> {
        match self.users.entry(user.id) {
            Entry::Occupied(_) => {
                Err(BackofficeError::Duplicate(format!("user id {}", user.id)))
            }
            Entry::Vacant(slot) => {
                debug!(user_id = %user.id, "User stored");
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn update_user(&self, user: User) -> BackofficeResult<()> {
        let mut entry = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| BackofficeError::not_found("User", user.id))?;
        *entry = user;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> BackofficeResult<()> {
        self.users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BackofficeError::not_found("User", id))
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn login_logs(&self, organization_id: Uuid) -> BackofficeResult<Vec<LoginLog>> {
        let mut logs = self
            .login_logs
            .get(&organization_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        logs.sort_by(|a, b| b.login_at.cmp(&a.login_at));
        Ok(logs)
    }

    async fn user_activities(&self, organization_id: Uuid) -> BackofficeResult<Vec<UserActivity>> {
        Ok(self
            .activities
            .get(&organization_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn engagement_stats(&self, organization_id: Uuid) -> BackofficeResult<EngagementStats> {
        Ok(self
            .engagement
            .get(&organization_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::types::{OrganizationStatus, Plan, SubscriptionType};
    use chrono::Weekday;

    fn org(name: &str, created_at: &str) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: name.into(),
            seat_count: 1,
            status: OrganizationStatus::Active,
            created_at: created_at.parse().unwrap(),
            plan: Plan::Free,
            subscription_type: None,
            mrr: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let record = org("TechCorp", "2024-01-15T00:00:00Z");
        store.insert_organization(record.clone()).await.unwrap();

        let err = store.insert_organization(record).await.unwrap_err();
        assert!(matches!(err, BackofficeError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let store = MemoryStore::new();
        let record = org("TechCorp", "2024-01-15T00:00:00Z");

        let err = store.update_organization(record.clone()).await.unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound { .. }));
        let err = store.delete_organization(record.id).await.unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let store = MemoryStore::new();
        store.insert_organization(org("NewCo", "2024-05-16T09:00:00Z")).await.unwrap();
        store.insert_organization(org("TechCorp", "2024-01-15T00:00:00Z")).await.unwrap();
        store.insert_organization(org("BusinessCo", "2024-03-10T00:00:00Z")).await.unwrap();

        let names: Vec<_> = store
            .list_organizations()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["TechCorp", "BusinessCo", "NewCo"]);
    }

    #[tokio::test]
    async fn test_forged_mrr_is_repriced() {
        let store = MemoryStore::new();
        let mut record = org("TechCorp", "2024-01-15T00:00:00Z");
        record.plan = Plan::Pro;
        record.seat_count = 10;
        record.subscription_type = Some(SubscriptionType::Yearly);
        record.mrr = 9_999;
        store.insert_organization(record.clone()).await.unwrap();
        assert_eq!(store.get_organization(record.id).await.unwrap().unwrap().mrr, 230);

        record.seat_count = 2;
        record.mrr = 1;
        store.update_organization(record.clone()).await.unwrap();
        assert_eq!(store.get_organization(record.id).await.unwrap().unwrap().mrr, 46);
    }

    #[tokio::test]
    async fn test_sample_activity() {
        let store = MemoryStore::with_sample_data();
        let logs = store.login_logs(sample_data::TECHCORP_ID).await.unwrap();
        assert_eq!(logs.len(), 8);
        assert!(logs.windows(2).all(|w| w[0].login_at >= w[1].login_at));

        let stats = store.engagement_stats(sample_data::BUSINESSCO_ID).await.unwrap();
        assert_eq!(stats.most_active_day, Weekday::Wed);

        let unknown = store.engagement_stats(Uuid::new_v4()).await.unwrap();
        assert_eq!(unknown, EngagementStats::default());
        assert!(store.user_activities(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
