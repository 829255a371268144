//! Dashboard statistics: headline organization/user counts, period growth,
//! and recurring revenue totals.

use chrono::{DateTime, Months, Utc};
use tracing::debug;

use backoffice_core::types::{
    CustomDateRange, DashboardStats, DateFilter, Organization, RevenueStats, User,
};

use crate::period::PeriodClassifier;

/// Aggregates organization and user lists into dashboard statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAggregator {
    classifier: PeriodClassifier,
}

impl StatsAggregator {
    pub fn new(classifier: PeriodClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &PeriodClassifier {
        &self.classifier
    }

    /// Headline counts for the dashboard.
    ///
    /// `total_organizations` always counts every active organization; the
    /// period only narrows `new_organizations_in_period`, which drives the
    /// growth rate. User counts ignore the period.
    pub fn dashboard_stats(
        &self,
        organizations: &[Organization],
        users: &[User],
        period: DateFilter,
        custom_range: Option<&CustomDateRange>,
        now: DateTime<Utc>,
    ) -> DashboardStats {
        let active_orgs: Vec<&Organization> =
            organizations.iter().filter(|o| o.is_active()).collect();
        let total_organizations = active_orgs.len() as u64;

        let new_organizations_in_period = if period == DateFilter::All {
            total_organizations
        } else {
            active_orgs
                .iter()
                .filter(|o| {
                    self.classifier
                        .is_in_period(o.created_at, period, custom_range, now)
                })
                .count() as u64
        };

        // Active organizations that existed before one calendar month ago.
        let month_ago = now
            .with_timezone(&self.classifier.offset())
            .checked_sub_months(Months::new(1))
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(now);
        let orgs_last_month = active_orgs
            .iter()
            .filter(|o| o.created_at < month_ago)
            .count() as u64;

        let growth_rate = growth_rate(new_organizations_in_period, orgs_last_month);

        let total_users = users.len() as u64;
        let active_users = users.iter().filter(|u| u.is_active()).count() as u64;

        debug!(
            period = %period,
            total_organizations,
            new_organizations_in_period,
            orgs_last_month,
            growth_rate,
            "Dashboard stats computed"
        );

        DashboardStats {
            total_organizations,
            new_organizations_in_period,
            total_users,
            active_users,
            growth_rate,
        }
    }

    /// MRR summed over active organizations; ARR is twelve times MRR.
    pub fn revenue_stats(&self, organizations: &[Organization]) -> RevenueStats {
        let mrr: u64 = organizations
            .iter()
            .filter(|o| o.is_active())
            .map(|o| o.mrr)
            .sum();
        RevenueStats { mrr, arr: mrr * 12 }
    }
}

/// Ratio of new organizations to last month's base, as a percentage rounded
/// to one decimal. A rough trend indicator rather than a cohort growth rate.
fn growth_rate(new_in_period: u64, base: u64) -> f64 {
    if base > 0 {
        let pct = new_in_period as f64 / base as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    } else if new_in_period > 0 {
        100.0
    } else {
        0.0
    }
}

/// [`StatsAggregator::dashboard_stats`] with a UTC classifier.
pub fn compute_dashboard_stats(
    organizations: &[Organization],
    users: &[User],
    period: DateFilter,
    custom_range: Option<&CustomDateRange>,
    now: DateTime<Utc>,
) -> DashboardStats {
    StatsAggregator::default().dashboard_stats(organizations, users, period, custom_range, now)
}

pub fn compute_revenue_stats(organizations: &[Organization]) -> RevenueStats {
    StatsAggregator::default().revenue_stats(organizations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::types::{OrganizationStatus, Plan, SubscriptionType, UserStatus};
    use chrono::FixedOffset;
    use uuid::Uuid;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn org(name: &str, created_at: &str, status: OrganizationStatus, mrr: u64) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: name.into(),
            seat_count: 1,
            status,
            created_at: utc(created_at),
            plan: Plan::Pro,
            subscription_type: Some(SubscriptionType::Monthly),
            mrr,
        }
    }

    fn user(status: UserStatus) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Sophie".into(),
            last_name: "Martin".into(),
            email: "sophie.martin@techcorp.com".into(),
            company: "TechCorp".into(),
            plan: Plan::Pro,
            status,
            created_at: utc("2024-01-15T00:00:00Z"),
            phone: None,
            address: None,
            last_login: None,
        }
    }

    fn fixture() -> (Vec<Organization>, Vec<User>, DateTime<Utc>) {
        let orgs = vec![
            org("TechCorp", "2024-01-15T00:00:00Z", OrganizationStatus::Active, 230),
            org("BusinessCo", "2024-03-10T00:00:00Z", OrganizationStatus::Active, 0),
            org("NewCo", "2024-05-16T09:00:00Z", OrganizationStatus::Active, 58),
            org("GoneCo", "2024-05-17T08:00:00Z", OrganizationStatus::Inactive, 500),
        ];
        let users = vec![
            user(UserStatus::Active),
            user(UserStatus::Active),
            user(UserStatus::Pending),
            user(UserStatus::Inactive),
        ];
        (orgs, users, utc("2024-05-17T10:30:00Z"))
    }

    #[test]
    fn test_all_period_counts_every_active_org() {
        let (orgs, users, now) = fixture();
        let stats = compute_dashboard_stats(&orgs, &users, DateFilter::All, None, now);

        assert_eq!(stats.total_organizations, 3);
        assert_eq!(stats.new_organizations_in_period, stats.total_organizations);
        // TechCorp and BusinessCo predate 2024-04-17: 3 / 2 = 150%.
        assert_eq!(stats.growth_rate, 150.0);
    }

    #[test]
    fn test_period_narrows_new_orgs_only() {
        let (orgs, users, now) = fixture();

        let month = compute_dashboard_stats(&orgs, &users, DateFilter::Month, None, now);
        assert_eq!(month.total_organizations, 3);
        assert_eq!(month.new_organizations_in_period, 1);
        assert_eq!(month.growth_rate, 50.0);

        let today = compute_dashboard_stats(&orgs, &users, DateFilter::Today, None, now);
        assert_eq!(today.new_organizations_in_period, 0);
        assert_eq!(today.growth_rate, 0.0);

        let week = compute_dashboard_stats(&orgs, &users, DateFilter::Week, None, now);
        assert_eq!(week.new_organizations_in_period, 1);

        let quarter = compute_dashboard_stats(&orgs, &users, DateFilter::Quarter, None, now);
        assert_eq!(quarter.new_organizations_in_period, 1);

        let year = compute_dashboard_stats(&orgs, &users, DateFilter::Year, None, now);
        assert_eq!(year.new_organizations_in_period, 3);
    }

    #[test]
    fn test_custom_period() {
        let (orgs, users, now) = fixture();
        let march = CustomDateRange::new(utc("2024-03-01T00:00:00Z"), utc("2024-03-10T00:00:00Z")).unwrap();

        let stats = compute_dashboard_stats(&orgs, &users, DateFilter::Custom, Some(&march), now);
        assert_eq!(stats.new_organizations_in_period, 1);

        let missing = compute_dashboard_stats(&orgs, &users, DateFilter::Custom, None, now);
        assert_eq!(missing.new_organizations_in_period, 0);
        assert_eq!(missing.total_organizations, 3);
    }

    #[test]
    fn test_user_counts_ignore_period() {
        let (orgs, users, now) = fixture();
        for period in [DateFilter::Today, DateFilter::All] {
            let stats = compute_dashboard_stats(&orgs, &users, period, None, now);
            assert_eq!(stats.total_users, 4);
            assert_eq!(stats.active_users, 2);
        }
    }

    #[test]
    fn test_growth_rate_rules() {
        assert_eq!(growth_rate(1, 3), 33.3);
        assert_eq!(growth_rate(2, 3), 66.7);
        assert_eq!(growth_rate(5, 0), 100.0);
        assert_eq!(growth_rate(0, 0), 0.0);
        assert_eq!(growth_rate(0, 4), 0.0);
    }

    #[test]
    fn test_no_history_means_full_growth() {
        let now = utc("2024-05-17T10:30:00Z");
        let orgs = vec![org("NewCo", "2024-05-16T09:00:00Z", OrganizationStatus::Active, 0)];
        let stats = compute_dashboard_stats(&orgs, &[], DateFilter::Month, None, now);
        assert_eq!(stats.growth_rate, 100.0);

        let empty = compute_dashboard_stats(&[], &[], DateFilter::Month, None, now);
        assert_eq!(empty.total_organizations, 0);
        assert_eq!(empty.growth_rate, 0.0);
    }

    #[test]
    fn test_month_cutoff_respects_timezone() {
        // At UTC+1 `now` is March 31st, so the cutoff is Feb 29th 00:30 local
        // (Feb 28th 23:30Z). In UTC it is March 30th, clamped to Feb 29th 23:30Z.
        let now = utc("2024-03-30T23:30:00Z");
        let orgs = vec![
            org("EdgeCo", "2024-02-29T00:00:00Z", OrganizationStatus::Active, 0),
            org("NewCo", "2024-03-30T12:00:00Z", OrganizationStatus::Active, 0),
        ];

        let utc_stats = compute_dashboard_stats(&orgs, &[], DateFilter::All, None, now);
        assert_eq!(utc_stats.growth_rate, 200.0);

        let paris = StatsAggregator::new(PeriodClassifier::new(FixedOffset::east_opt(3600).unwrap()));
        let stats = paris.dashboard_stats(&orgs, &[], DateFilter::All, None, now);
        assert_eq!(stats.growth_rate, 100.0);
    }

    #[test]
    fn test_revenue_counts_active_orgs_only() {
        let orgs = vec![
            org("TechCorp", "2024-01-15T00:00:00Z", OrganizationStatus::Active, 230),
            org("GoneCo", "2024-02-01T00:00:00Z", OrganizationStatus::Inactive, 500),
        ];
        assert_eq!(compute_revenue_stats(&orgs), RevenueStats { mrr: 230, arr: 2760 });
        assert_eq!(compute_revenue_stats(&[]), RevenueStats { mrr: 0, arr: 0 });
    }
}
