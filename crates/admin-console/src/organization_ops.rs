//! Organization lifecycle: creation (optionally with a first user), edits,
//! lookups and list filters. Every write goes through the MRR calculator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use backoffice_billing::mrr::reprice;
use backoffice_core::error::{BackofficeError, BackofficeResult};
use backoffice_core::types::{Organization, OrganizationStatus, Plan, SubscriptionType, User, UserStatus};
use backoffice_reporting::period::Clock;

use crate::store::{OrganizationRepository, UserRepository};
use crate::user_ops::{build_user, required, same_name};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub name: String,
    pub seat_count: u32,
    pub status: OrganizationStatus,
    pub plan: Plan,
    #[serde(default)]
    pub subscription_type: Option<SubscriptionType>,
}

/// First user created together with an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: UserStatus,
}

/// Partial update. MRR is not patchable; it is always derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub seat_count: Option<u32>,
    pub status: Option<OrganizationStatus>,
    pub plan: Option<Plan>,
    pub subscription_type: Option<SubscriptionType>,
}

#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub status: Option<OrganizationStatus>,
    pub plan: Option<Plan>,
}

impl OrganizationFilter {
    pub fn matches(&self, org: &Organization) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => org.name.to_lowercase().contains(&term.to_lowercase()),
        };
        search_ok
            && self.status.map_or(true, |s| org.status == s)
            && self.plan.map_or(true, |p| org.plan == p)
    }
}

/// Organization management operations.
pub struct OrganizationOps {
    organizations: Arc<dyn OrganizationRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl OrganizationOps {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            organizations,
            users,
            clock,
        }
    }

    async fn ensure_unique_name(&self, name: &str, except: Option<Uuid>) -> BackofficeResult<()> {
        let taken = self
            .organizations
            .list_organizations()
            .await?
            .iter()
            .any(|o| Some(o.id) != except && same_name(&o.name, name));
        if taken {
            return Err(BackofficeError::Duplicate(format!(
                "an organization named '{name}' already exists"
            )));
        }
        Ok(())
    }

    fn build(&self, input: NewOrganization) -> BackofficeResult<Organization> {
        let mut org = Organization {
            id: Uuid::new_v4(),
            name: required("Organization name", &input.name)?,
            seat_count: input.seat_count,
            status: input.status,
            created_at: self.clock.now(),
            plan: input.plan,
            subscription_type: input.subscription_type,
            mrr: 0,
        };
        reprice(&mut org);
        Ok(org)
    }

    /// Create an organization with a fresh id, creation time and MRR.
    pub async fn create(&self, input: NewOrganization) -> BackofficeResult<Organization> {
        let org = self.build(input)?;
        self.ensure_unique_name(&org.name, None).await?;
        self.organizations.insert_organization(org.clone()).await?;

        info!(org_id = %org.id, name = %org.name, plan = %org.plan, mrr = org.mrr, "Organization created");
        Ok(org)
    }

    /// Create an organization and its first user. The user takes one extra
    /// seat. Nothing is kept if the user cannot be stored.
    pub async fn create_with_member(
        &self,
        mut input: NewOrganization,
        member: NewMember,
    ) -> BackofficeResult<(Organization, User)> {
        input.seat_count = input.seat_count.saturating_add(1);
        let org = self.build(input)?;
        let user = build_user(
            &member.first_name,
            &member.last_name,
            &member.email,
            member.status,
            &org,
            self.clock.as_ref(),
        )?;
        self.ensure_unique_name(&org.name, None).await?;

        self.organizations.insert_organization(org.clone()).await?;
        if let Err(e) = self.users.insert_user(user.clone()).await {
            warn!(org_id = %org.id, error = %e, "First user rejected, rolling back organization");
            self.organizations.delete_organization(org.id).await?;
            return Err(e);
        }

        info!(
            org_id = %org.id,
            name = %org.name,
            user_id = %user.id,
            seats = org.seat_count,
            "Organization created with first user"
        );
        Ok((org, user))
    }

    pub async fn get(&self, id: Uuid) -> BackofficeResult<Organization> {
        self.organizations
            .get_organization(id)
            .await?
            .ok_or_else(|| BackofficeError::not_found("Organization", id))
    }

    pub async fn list(&self, filter: &OrganizationFilter) -> BackofficeResult<Vec<Organization>> {
        Ok(self
            .organizations
            .list_organizations()
            .await?
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect())
    }

    /// Apply a patch and re-derive MRR. Users of the organization follow a
    /// rename or plan change.
    pub async fn update(&self, id: Uuid, patch: OrganizationPatch) -> BackofficeResult<Organization> {
        let previous = self.get(id).await?;
        let mut org = previous.clone();

        if let Some(name) = patch.name {
            org.name = required("Organization name", &name)?;
            if !same_name(&org.name, &previous.name) {
                self.ensure_unique_name(&org.name, Some(id)).await?;
            }
        }
        if let Some(seat_count) = patch.seat_count {
            org.seat_count = seat_count;
        }
        if let Some(status) = patch.status {
            org.status = status;
        }
        if let Some(plan) = patch.plan {
            org.plan = plan;
        }
        if patch.subscription_type.is_some() {
            org.subscription_type = patch.subscription_type;
        }
        reprice(&mut org);

        self.organizations.update_organization(org.clone()).await?;
        info!(org_id = %id, seats = org.seat_count, plan = %org.plan, mrr = org.mrr, "Organization updated");

        if org.name != previous.name || org.plan != previous.plan {
            if let Err(e) = self.sync_members(&previous.name, &org).await {
                warn!(org_id = %id, error = %e, "Member sync failed, restoring organization");
                self.organizations.update_organization(previous).await?;
                return Err(e);
            }
        }
        Ok(org)
    }

    /// Move every member onto the organization's current name and plan. On
    /// failure the members already moved are put back before returning.
    async fn sync_members(&self, previous_name: &str, org: &Organization) -> BackofficeResult<()> {
        let members: Vec<User> = self
            .users
            .list_users()
            .await?
            .into_iter()
            .filter(|u| same_name(&u.company, previous_name))
            .collect();
        let count = members.len();
        let mut moved: Vec<User> = Vec::with_capacity(count);
        for original in members {
            let mut user = original.clone();
            user.company = org.name.clone();
            user.plan = org.plan;
            if let Err(e) = self.users.update_user(user).await {
                for original in moved {
                    let user_id = original.id;
                    if let Err(restore) = self.users.update_user(original).await {
                        warn!(%user_id, error = %restore, "Could not restore member");
                    }
                }
                return Err(e);
            }
            moved.push(original);
        }
        if count > 0 {
            info!(org_id = %org.id, users = count, "Organization members synced");
        }
        Ok(())
    }
}
