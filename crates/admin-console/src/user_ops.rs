//! User management: creation, edits, lookups and list filters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use backoffice_core::error::{BackofficeError, BackofficeResult};
use backoffice_core::types::{Organization, Plan, User, UserStatus};
use backoffice_reporting::period::Clock;

use crate::store::{OrganizationRepository, UserRepository};

/// Input for a new user. `organization` is the name of an existing
/// organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub status: UserStatus,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
    pub status: Option<UserStatus>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive match on full name, email or organization name.
    pub search: Option<String>,
    pub plan: Option<Plan>,
    pub status: Option<UserStatus>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                user.full_name().to_lowercase().contains(&term)
                    || user.email.to_lowercase().contains(&term)
                    || user.company.to_lowercase().contains(&term)
            }
        };
        search_ok
            && self.plan.map_or(true, |p| user.plan == p)
            && self.status.map_or(true, |s| user.status == s)
    }
}

/// Trimmed value of a required text field.
pub(crate) fn required(field: &str, value: &str) -> BackofficeResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BackofficeError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub(crate) async fn find_organization(
    organizations: &dyn OrganizationRepository,
    name: &str,
) -> BackofficeResult<Organization> {
    organizations
        .list_organizations()
        .await?
        .into_iter()
        .find(|o| same_name(&o.name, name))
        .ok_or_else(|| BackofficeError::not_found("Organization", name.trim()))
}

/// Validated user record belonging to `organization`, whose plan it mirrors.
pub(crate) fn build_user(
    first_name: &str,
    last_name: &str,
    email: &str,
    status: UserStatus,
    organization: &Organization,
    clock: &dyn Clock,
) -> BackofficeResult<User> {
    Ok(User {
        id: Uuid::new_v4(),
        first_name: required("First name", first_name)?,
        last_name: required("Last name", last_name)?,
        email: required("Email", email)?,
        company: organization.name.clone(),
        plan: organization.plan,
        status,
        created_at: clock.now(),
        phone: None,
        address: None,
        last_login: None,
    })
}

/// User management operations.
pub struct UserOps {
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    clock: Arc<dyn Clock>,
}

impl UserOps {
    pub fn new(
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            organizations,
            clock,
        }
    }

    /// Create a user in an existing organization.
    pub async fn create(&self, input: NewUser) -> BackofficeResult<User> {
        let organization = find_organization(self.organizations.as_ref(), &input.organization).await?;
        let mut user = build_user(
            &input.first_name,
            &input.last_name,
            &input.email,
            input.status,
            &organization,
            self.clock.as_ref(),
        )?;
        user.phone = input.phone.filter(|p| !p.trim().is_empty());
        user.address = input.address.filter(|a| !a.trim().is_empty());

        self.users.insert_user(user.clone()).await?;
        info!(user_id = %user.id, org = %organization.name, "User created");
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> BackofficeResult<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| BackofficeError::not_found("User", id))
    }

    pub async fn list(&self, filter: &UserFilter) -> BackofficeResult<Vec<User>> {
        Ok(self
            .users
            .list_users()
            .await?
            .into_iter()
            .filter(|u| filter.matches(u))
            .collect())
    }

    /// Users whose organization name matches, case-insensitively.
    pub async fn by_organization(&self, organization: &str) -> BackofficeResult<Vec<User>> {
        Ok(self
            .users
            .list_users()
            .await?
            .into_iter()
            .filter(|u| same_name(&u.company, organization))
            .collect())
    }

    /// Apply a patch. The id and creation time never change, and the plan is
    /// re-read from the (possibly new) organization.
    pub async fn update(&self, id: Uuid, patch: UserPatch) -> BackofficeResult<User> {
        let mut user = self.get(id).await?;

        if let Some(first_name) = patch.first_name {
            user.first_name = required("First name", &first_name)?;
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = required("Last name", &last_name)?;
        }
        if let Some(email) = patch.email {
            user.email = required("Email", &email)?;
        }
        if let Some(status) = patch.status {
            user.status = status;
        }
        if let Some(phone) = patch.phone {
            user.phone = Some(phone).filter(|p| !p.trim().is_empty());
        }
        if let Some(address) = patch.address {
            user.address = Some(address).filter(|a| !a.trim().is_empty());
        }

        match patch.organization {
            Some(name) => {
                let organization = find_organization(self.organizations.as_ref(), &name).await?;
                user.company = organization.name;
                user.plan = organization.plan;
            }
            None => match find_organization(self.organizations.as_ref(), &user.company).await {
                Ok(organization) => user.plan = organization.plan,
                Err(BackofficeError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            },
        }

        self.users.update_user(user.clone()).await?;
        info!(user_id = %id, "User updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_data::user_id;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use backoffice_reporting::period::FixedClock;

    struct UnreadableOrganizations;

    #[async_trait]
    impl OrganizationRepository for UnreadableOrganizations {
        async fn list_organizations(&self) -> BackofficeResult<Vec<Organization>> {
            Err(BackofficeError::Storage("data file unreadable".into()))
        }

        async fn insert_organization(&self, _: Organization) -> BackofficeResult<()> {
            Err(BackofficeError::Storage("data file unreadable".into()))
        }

        async fn update_organization(&self, _: Organization) -> BackofficeResult<()> {
            Err(BackofficeError::Storage("data file unreadable".into()))
        }

        async fn delete_organization(&self, _: Uuid) -> BackofficeResult<()> {
            Err(BackofficeError::Storage("data file unreadable".into()))
        }
    }

    fn ops() -> UserOps {
        let store = Arc::new(MemoryStore::with_sample_data());
        let clock = Arc::new(FixedClock("2024-05-17T10:30:00Z".parse().unwrap()));
        UserOps::new(store.clone(), store, clock)
    }

    fn new_user(organization: &str) -> NewUser {
        NewUser {
            first_name: " Nina ".into(),
            last_name: "Roux".into(),
            email: "nina.roux@businessco.com".into(),
            organization: organization.into(),
            status: UserStatus::Pending,
            phone: Some("".into()),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_create_mirrors_org_plan() {
        let ops = ops();
        let user = ops.create(new_user("businessco")).await.unwrap();

        assert_eq!(user.first_name, "Nina");
        assert_eq!(user.company, "BusinessCo");
        assert_eq!(user.plan, Plan::Free);
        assert_eq!(user.phone, None);
        assert_eq!(user.created_at, "2024-05-17T10:30:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap());
        assert_eq!(ops.by_organization("BusinessCo").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_requires_fields_and_org() {
        let ops = ops();

        let mut blank = new_user("TechCorp");
        blank.email = "  ".into();
        let err = ops.create(blank).await.unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(_)));

        let err = ops.create(new_user("Nowhere Inc")).await.unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound { entity: "Organization", .. }));
    }

    #[tokio::test]
    async fn test_update_moves_user_between_orgs() {
        let ops = ops();
        let id = user_id(3);
        let before = ops.get(id).await.unwrap();

        let patch = UserPatch {
            organization: Some("TechCorp".into()),
            status: Some(UserStatus::Inactive),
            ..Default::default()
        };
        let moved = ops.update(id, patch).await.unwrap();

        assert_eq!(moved.company, "TechCorp");
        assert_eq!(moved.plan, Plan::Pro);
        assert_eq!(moved.status, UserStatus::Inactive);
        assert_eq!(moved.id, before.id);
        assert_eq!(moved.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_update_of_orphaned_user_keeps_plan() {
        let store = Arc::new(MemoryStore::new());
        let mut orphan = crate::sample_data::users().remove(0);
        orphan.company = "Gone Ltd".into();
        store.insert_user(orphan.clone()).await.unwrap();
        let clock = Arc::new(FixedClock("2024-05-17T10:30:00Z".parse().unwrap()));
        let ops = UserOps::new(store.clone(), store, clock);

        let patch = UserPatch {
            status: Some(UserStatus::Inactive),
            ..Default::default()
        };
        let updated = ops.update(orphan.id, patch).await.unwrap();
        assert_eq!(updated.plan, orphan.plan);
        assert_eq!(updated.status, UserStatus::Inactive);
    }

    #[tokio::test]
    async fn test_update_surfaces_organization_storage_errors() {
        let store = Arc::new(MemoryStore::with_sample_data());
        let clock = Arc::new(FixedClock("2024-05-17T10:30:00Z".parse().unwrap()));
        let ops = UserOps::new(store, Arc::new(UnreadableOrganizations), clock);

        let patch = UserPatch {
            status: Some(UserStatus::Inactive),
            ..Default::default()
        };
        let err = ops.update(user_id(1), patch).await.unwrap_err();
        assert!(matches!(err, BackofficeError::Storage(_)));
        assert_eq!(ops.get(user_id(1)).await.unwrap().status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let ops = ops();

        let martins = UserFilter {
            search: Some("martin".into()),
            ..Default::default()
        };
        // Sophie Martin, Antoine Martin.
        assert_eq!(ops.list(&martins).await.unwrap().len(), 2);

        let by_company = UserFilter {
            search: Some("BUSINESS".into()),
            ..Default::default()
        };
        assert_eq!(ops.list(&by_company).await.unwrap().len(), 3);

        let pro = UserFilter {
            plan: Some(Plan::Pro),
            status: Some(UserStatus::Active),
            ..Default::default()
        };
        assert_eq!(ops.list(&pro).await.unwrap().len(), 10);

        let err = ops.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound { entity: "User", .. }));
    }
}
