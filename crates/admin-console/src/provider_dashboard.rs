//! Provider dashboard: the period-scoped overview of every organization and
//! user, plus the per-organization detail view.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use backoffice_core::error::{BackofficeError, BackofficeResult};
use backoffice_core::types::{
    CustomDateRange, DashboardStats, DateFilter, EngagementStats, LoginLog, LoginStatus,
    Organization, RevenueStats, User, UserActivity,
};
use backoffice_reporting::activity::filter_login_logs;
use backoffice_reporting::dashboard::StatsAggregator;
use backoffice_reporting::period::Clock;

use crate::store::{ActivityRepository, OrganizationRepository, UserRepository};
use crate::user_ops::same_name;

/// Period selection for one dashboard query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub period: DateFilter,
    #[serde(default)]
    pub custom_range: Option<CustomDateRange>,
}

/// Dashboard figures for one query, tagged with the instant they were
/// computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub period: DateFilter,
    pub period_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_range: Option<CustomDateRange>,
    pub stats: DashboardStats,
    pub revenue: RevenueStats,
    pub generated_at: DateTime<Utc>,
}

/// Everything shown on an organization's detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetail {
    pub organization: Organization,
    pub arr: u64,
    pub users: Vec<User>,
    pub login_logs: Vec<LoginLog>,
    pub activities: Vec<UserActivity>,
    pub engagement: EngagementStats,
}

pub struct DashboardService {
    organizations: Arc<dyn OrganizationRepository>,
    users: Arc<dyn UserRepository>,
    activity: Arc<dyn ActivityRepository>,
    aggregator: StatsAggregator,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        users: Arc<dyn UserRepository>,
        activity: Arc<dyn ActivityRepository>,
        aggregator: StatsAggregator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            organizations,
            users,
            activity,
            aggregator,
            clock,
        }
    }

    /// Compute the dashboard. The clock is read once so every figure shares
    /// the same reference time. A custom period without a range covers the
    /// month to date.
    pub async fn snapshot(&self, query: DashboardQuery) -> BackofficeResult<DashboardSnapshot> {
        let now = self.clock.now();
        let offset = self.aggregator.classifier().offset();

        let custom_range = match (query.period, query.custom_range) {
            (DateFilter::Custom, None) => Some(CustomDateRange::month_to_date(now, offset)?),
            (DateFilter::Custom, range) => range,
            _ => None,
        };

        let (organizations, users) = tokio::try_join!(
            self.organizations.list_organizations(),
            self.users.list_users()
        )?;

        let stats = self.aggregator.dashboard_stats(
            &organizations,
            &users,
            query.period,
            custom_range.as_ref(),
            now,
        );
        let revenue = self.aggregator.revenue_stats(&organizations);

        let period_label = match &custom_range {
            Some(range) => range.label(offset),
            None => query.period.label().to_string(),
        };

        info!(
            period = %query.period,
            organizations = stats.total_organizations,
            users = stats.total_users,
            mrr = revenue.mrr,
            "Dashboard snapshot generated"
        );

        Ok(DashboardSnapshot {
            period: query.period,
            period_label,
            custom_range,
            stats,
            revenue,
            generated_at: now,
        })
    }

    /// Detail view of one organization. `log_status` narrows the login log.
    pub async fn organization_detail(
        &self,
        id: Uuid,
        log_status: Option<LoginStatus>,
    ) -> BackofficeResult<OrganizationDetail> {
        let organization = self
            .organizations
            .get_organization(id)
            .await?
            .ok_or_else(|| BackofficeError::not_found("Organization", id))?;

        let (users, logs, activities, engagement) = tokio::try_join!(
            self.users.list_users(),
            self.activity.login_logs(id),
            self.activity.user_activities(id),
            self.activity.engagement_stats(id)
        )?;

        let users = users
            .into_iter()
            .filter(|u| same_name(&u.company, &organization.name))
            .collect();
        let login_logs = filter_login_logs(&logs, log_status)
            .into_iter()
            .cloned()
            .collect();

        Ok(OrganizationDetail {
            arr: organization.mrr * 12,
            organization,
            users,
            login_logs,
            activities,
            engagement,
        })
    }
}
