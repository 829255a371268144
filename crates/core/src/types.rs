use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BackofficeError, BackofficeResult};

// ─── Plans ──────────────────────────────────────────────────────────────

/// Commercial plan of an organization. Only `Pro` is billed per seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plan {
    Free,
    Pro,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "Free"),
            Self::Pro => write!(f, "Pro"),
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            _ => Err(format!("Unknown plan: {s}")),
        }
    }
}

/// Billing cadence of a Pro subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Monthly,
    Yearly,
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for SubscriptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(format!("Unknown subscription type: {s}")),
        }
    }
}

// ─── Organizations ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationStatus {
    Active,
    Inactive,
}

impl FromStr for OrganizationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Unknown organization status: {s}")),
        }
    }
}

/// A customer organization. `mrr` is derived from plan, subscription type
/// and seat count and is only ever written by the billing calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    #[serde(alias = "usersCount")]
    pub seat_count: u32,
    pub status: OrganizationStatus,
    pub created_at: DateTime<Utc>,
    pub plan: Plan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<SubscriptionType>,
    pub mrr: u64,
}

impl Organization {
    pub fn is_active(&self) -> bool {
        self.status == OrganizationStatus::Active
    }
}

// ─── Users ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Pending,
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Unknown user status: {s}")),
        }
    }
}

/// A console user. `company` is the name of the owning organization and
/// `plan` mirrors that organization's plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub plan: Plan,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Revenue is attributed at the organization level, never per user.
    pub fn mrr(&self) -> u64 {
        0
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Split a full name into first name and the remaining last name.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

// ─── Reporting periods ──────────────────────────────────────────────────

/// Named reporting period selected on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    Today,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
    Custom,
}

impl DateFilter {
    pub const ALL: [DateFilter; 7] = [
        Self::Today,
        Self::Week,
        Self::Month,
        Self::Quarter,
        Self::Year,
        Self::All,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::All => "all",
            Self::Custom => "custom",
        }
    }

    /// Human-readable label shown next to the period selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Week => "Last 7 days",
            Self::Month => "This month",
            Self::Quarter => "This quarter",
            Self::Year => "This year",
            Self::All => "All time",
            Self::Custom => "Custom range",
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == lowered)
            .ok_or_else(|| format!("Unknown period: {s}"))
    }
}

/// Explicit date range for the `custom` period, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDateRange {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl CustomDateRange {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> BackofficeResult<Self> {
        if start_date > end_date {
            return Err(BackofficeError::InvalidDateRange(format!(
                "start {start_date} is after end {end_date}"
            )));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Range covering whole calendar days in the given timezone: from the
    /// first instant of `start` to the last millisecond of `end`.
    pub fn from_dates(
        start: NaiveDate,
        end: NaiveDate,
        offset: FixedOffset,
    ) -> BackofficeResult<Self> {
        let start_of_day = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| BackofficeError::InvalidDateRange(start.to_string()))?;
        let end_of_day = end
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| BackofficeError::InvalidDateRange(end.to_string()))?;
        Self::new(to_utc(start_of_day, offset)?, to_utc(end_of_day, offset)?)
    }

    /// First day of the current month (in the given timezone) up to `now`.
    pub fn month_to_date(now: DateTime<Utc>, offset: FixedOffset) -> BackofficeResult<Self> {
        let first_day = now
            .with_timezone(&offset)
            .date_naive()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| BackofficeError::InvalidDateRange(now.to_string()))?;
        Self::new(to_utc(first_day, offset)?, now)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start_date && timestamp <= self.end_date
    }

    /// `dd/mm/yyyy - dd/mm/yyyy` in the given timezone.
    pub fn label(&self, offset: FixedOffset) -> String {
        format!(
            "{} - {}",
            self.start_date.with_timezone(&offset).format("%d/%m/%Y"),
            self.end_date.with_timezone(&offset).format("%d/%m/%Y")
        )
    }
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> BackofficeResult<DateTime<Utc>> {
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| BackofficeError::InvalidDateRange(local.to_string()))
}

// ─── Derived statistics ─────────────────────────────────────────────────

/// Dashboard headline counts. Computed on every query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_organizations: u64,
    pub new_organizations_in_period: u64,
    pub total_users: u64,
    pub active_users: u64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueStats {
    pub mrr: u64,
    pub arr: u64,
}

// ─── Activity records ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginStatus {
    Success,
    Failed,
}

/// One login attempt of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_email: String,
    pub login_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: LoginStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_at: Option<DateTime<Utc>>,
    /// Session length in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<u32>,
}

/// Usage metrics of one user over the reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: Uuid,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_email: String,
    pub last_login: DateTime<Utc>,
    pub login_count: u32,
    /// Minutes.
    pub total_session_time: u32,
    /// Minutes.
    pub average_session_time: u32,
    pub features_used: Vec<String>,
    pub actions_count: u32,
    pub projects_created: u32,
    pub expenses_added: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUsage {
    pub feature: String,
    pub usage_count: u32,
}

/// Engagement summary of one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    pub daily_active_users: u32,
    pub weekly_active_users: u32,
    pub monthly_active_users: u32,
    pub average_sessions_per_user: f64,
    /// Minutes.
    pub average_session_duration: u32,
    /// Hour of day, 0-23.
    pub most_active_hour: u8,
    pub most_active_day: Weekday,
    pub top_features: Vec<FeatureUsage>,
}

impl Default for EngagementStats {
    fn default() -> Self {
        Self {
            daily_active_users: 0,
            weekly_active_users: 0,
            monthly_active_users: 0,
            average_sessions_per_user: 0.0,
            average_session_duration: 0,
            most_active_hour: 0,
            most_active_day: Weekday::Mon,
            top_features: Vec::new(),
        }
    }
}
