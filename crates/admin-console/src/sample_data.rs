//! Demo dataset: two organizations with their users, login history and
//! engagement figures. Loaded when `storage.seed_sample_data` is enabled.

use chrono::{DateTime, Utc, Weekday};
use uuid::Uuid;

use backoffice_billing::mrr::reprice;
use backoffice_core::types::{
    EngagementStats, FeatureUsage, LoginLog, LoginStatus, Organization, OrganizationStatus, Plan,
    SubscriptionType, User, UserActivity, UserStatus,
};

pub const TECHCORP_ID: Uuid = Uuid::from_u128(1);
pub const BUSINESSCO_ID: Uuid = Uuid::from_u128(2);

const WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";
const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0)";

pub fn user_id(n: u128) -> Uuid {
    Uuid::from_u128(0x1000 + n)
}

fn log_id(n: u128) -> Uuid {
    Uuid::from_u128(0x2000 + n)
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap_or_default()
}

// (n, org, first name, last name, email, created, last login)
type UserRow = (u128, Uuid, &'static str, &'static str, &'static str, &'static str, &'static str);

static USERS: [UserRow; 13] = [
    (1, TECHCORP_ID, "Sophie", "Martin", "sophie.martin@techcorp.com", "2024-01-15T00:00:00Z", "2024-02-07T14:32:00Z"),
    (2, TECHCORP_ID, "Jean", "Dupont", "jean.dupont@techcorp.com", "2024-01-16T00:00:00Z", "2024-02-07T09:15:00Z"),
    (4, TECHCORP_ID, "Pierre", "Lefebvre", "pierre.lefebvre@techcorp.com", "2024-01-17T00:00:00Z", "2024-02-07T11:20:00Z"),
    (5, TECHCORP_ID, "Claire", "Rousseau", "claire.rousseau@techcorp.com", "2024-01-18T00:00:00Z", "2024-02-06T15:45:00Z"),
    (6, TECHCORP_ID, "Thomas", "Bernard", "thomas.bernard@techcorp.com", "2024-01-19T00:00:00Z", "2024-02-07T08:30:00Z"),
    (7, TECHCORP_ID, "Emma", "Dubois", "emma.dubois@techcorp.com", "2024-01-20T00:00:00Z", "2024-02-07T13:10:00Z"),
    (8, TECHCORP_ID, "Lucas", "Moreau", "lucas.moreau@techcorp.com", "2024-01-21T00:00:00Z", "2024-02-06T16:00:00Z"),
    (9, TECHCORP_ID, "Léa", "Petit", "lea.petit@techcorp.com", "2024-01-22T00:00:00Z", "2024-02-07T10:15:00Z"),
    (10, TECHCORP_ID, "Hugo", "Laurent", "hugo.laurent@techcorp.com", "2024-01-23T00:00:00Z", "2024-02-05T17:30:00Z"),
    (11, TECHCORP_ID, "Camille", "Girard", "camille.girard@techcorp.com", "2024-01-24T00:00:00Z", "2024-02-07T12:00:00Z"),
    (3, BUSINESSCO_ID, "Marie", "Durand", "marie.durand@businessco.com", "2024-03-10T00:00:00Z", "2024-02-06T16:20:00Z"),
    (12, BUSINESSCO_ID, "Antoine", "Martin", "antoine.martin@businessco.com", "2024-03-11T00:00:00Z", "2024-02-07T09:00:00Z"),
    (13, BUSINESSCO_ID, "Julie", "Blanc", "julie.blanc@businessco.com", "2024-03-12T00:00:00Z", "2024-02-05T14:30:00Z"),
];

// (n, user, login, ip, agent, location, status, logout, minutes)
type LogRow = (
    u128,
    u128,
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    LoginStatus,
    Option<&'static str>,
    Option<u32>,
);

static LOGIN_LOGS: [LogRow; 12] = [
    (1, 1, "2024-02-07T14:32:00Z", "192.168.1.100", WINDOWS, Some("Paris, France"), LoginStatus::Success, Some("2024-02-07T17:45:00Z"), Some(193)),
    (2, 2, "2024-02-07T09:15:00Z", "192.168.1.101", MAC, Some("Lyon, France"), LoginStatus::Success, Some("2024-02-07T12:30:00Z"), Some(195)),
    (3, 1, "2024-02-06T08:20:00Z", "192.168.1.100", WINDOWS, Some("Paris, France"), LoginStatus::Success, Some("2024-02-06T18:00:00Z"), Some(580)),
    (4, 4, "2024-02-07T11:20:00Z", "192.168.1.102", WINDOWS, Some("Paris, France"), LoginStatus::Success, Some("2024-02-07T15:30:00Z"), Some(250)),
    (5, 5, "2024-02-06T15:45:00Z", "192.168.1.103", MAC, Some("Lyon, France"), LoginStatus::Success, Some("2024-02-06T18:20:00Z"), Some(155)),
    (6, 6, "2024-02-07T08:30:00Z", "192.168.1.104", WINDOWS, Some("Paris, France"), LoginStatus::Success, Some("2024-02-07T12:00:00Z"), Some(210)),
    (7, 7, "2024-02-07T13:10:00Z", "192.168.1.105", IPHONE, Some("Paris, France"), LoginStatus::Success, Some("2024-02-07T16:45:00Z"), Some(215)),
    (8, 8, "2024-02-06T15:58:00Z", "203.0.113.24", WINDOWS, None, LoginStatus::Failed, None, None),
    (9, 3, "2024-02-06T16:20:00Z", "10.0.0.50", IPHONE, Some("Marseille, France"), LoginStatus::Success, Some("2024-02-06T17:45:00Z"), Some(85)),
    (10, 12, "2024-02-07T09:00:00Z", "10.0.0.51", WINDOWS, Some("Marseille, France"), LoginStatus::Success, Some("2024-02-07T11:30:00Z"), Some(150)),
    (11, 13, "2024-02-05T14:30:00Z", "10.0.0.52", MAC, Some("Marseille, France"), LoginStatus::Success, Some("2024-02-05T16:15:00Z"), Some(105)),
    (12, 13, "2024-02-05T14:27:00Z", "10.0.0.52", MAC, Some("Marseille, France"), LoginStatus::Failed, None, None),
];

// (user, logins, total minutes, average minutes, features, actions, projects, expenses)
type ActivityRow = (u128, u32, u32, u32, &'static [&'static str], u32, u32, u32);

static ACTIVITIES: [ActivityRow; 13] = [
    (1, 45, 1250, 28, &["Dashboard", "Expenses", "Reports", "Settings"], 342, 8, 156),
    (2, 38, 980, 26, &["Dashboard", "Expenses"], 198, 3, 89),
    (4, 32, 850, 27, &["Dashboard", "Expenses", "Reports"], 156, 5, 78),
    (5, 28, 720, 26, &["Dashboard", "Expenses"], 134, 2, 67),
    (6, 35, 920, 26, &["Dashboard", "Expenses", "Settings"], 178, 4, 92),
    (7, 29, 680, 23, &["Dashboard", "Expenses"], 112, 2, 54),
    (8, 26, 650, 25, &["Dashboard", "Expenses"], 98, 1, 45),
    (9, 31, 780, 25, &["Dashboard", "Expenses", "Reports"], 145, 3, 71),
    (10, 22, 560, 25, &["Dashboard", "Expenses"], 87, 1, 38),
    (11, 27, 690, 26, &["Dashboard", "Expenses"], 123, 2, 61),
    (3, 12, 320, 27, &["Dashboard", "Expenses"], 45, 1, 23),
    (12, 8, 180, 23, &["Dashboard", "Expenses"], 28, 0, 15),
    (13, 6, 145, 24, &["Dashboard", "Expenses"], 19, 0, 12),
];

fn user_row(n: u128) -> Option<&'static UserRow> {
    USERS.iter().find(|row| row.0 == n)
}

pub fn organizations() -> Vec<Organization> {
    let mut orgs = vec![
        Organization {
            id: TECHCORP_ID,
            name: "TechCorp".into(),
            seat_count: 10,
            status: OrganizationStatus::Active,
            created_at: at("2024-01-15T00:00:00Z"),
            plan: Plan::Pro,
            subscription_type: Some(SubscriptionType::Yearly),
            mrr: 0,
        },
        Organization {
            id: BUSINESSCO_ID,
            name: "BusinessCo".into(),
            seat_count: 3,
            status: OrganizationStatus::Active,
            created_at: at("2024-03-10T00:00:00Z"),
            plan: Plan::Free,
            subscription_type: None,
            mrr: 0,
        },
    ];
    orgs.iter_mut().for_each(reprice);
    orgs
}

pub fn users() -> Vec<User> {
    let orgs = organizations();
    USERS
        .iter()
        .filter_map(|&(n, org_id, first, last, email, created, last_login)| {
            let org = orgs.iter().find(|o| o.id == org_id)?;
            Some(User {
                id: user_id(n),
                first_name: first.into(),
                last_name: last.into(),
                email: email.into(),
                company: org.name.clone(),
                plan: org.plan,
                status: UserStatus::Active,
                created_at: at(created),
                phone: None,
                address: None,
                last_login: Some(at(last_login)),
            })
        })
        .collect()
}

/// Login history keyed by organization id.
pub fn login_logs() -> Vec<(Uuid, LoginLog)> {
    LOGIN_LOGS
        .iter()
        .filter_map(|&(n, user, login_at, ip, agent, location, status, logout_at, minutes)| {
            let &(_, org_id, first, last, email, _, _) = user_row(user)?;
            Some((
                org_id,
                LoginLog {
                    id: log_id(n),
                    user_id: user_id(user),
                    user_first_name: first.into(),
                    user_last_name: last.into(),
                    user_email: email.into(),
                    login_at: at(login_at),
                    ip_address: ip.into(),
                    user_agent: agent.into(),
                    location: location.map(Into::into),
                    status,
                    logout_at: logout_at.map(at),
                    session_duration: minutes,
                },
            ))
        })
        .collect()
}

/// Per-user activity keyed by organization id.
pub fn user_activities() -> Vec<(Uuid, UserActivity)> {
    ACTIVITIES
        .iter()
        .filter_map(|&(user, logins, total, average, features, actions, projects, expenses)| {
            let &(_, org_id, first, last, email, _, last_login) = user_row(user)?;
            Some((
                org_id,
                UserActivity {
                    user_id: user_id(user),
                    user_first_name: first.into(),
                    user_last_name: last.into(),
                    user_email: email.into(),
                    last_login: at(last_login),
                    login_count: logins,
                    total_session_time: total,
                    average_session_time: average,
                    features_used: features.iter().map(|f| f.to_string()).collect(),
                    actions_count: actions,
                    projects_created: projects,
                    expenses_added: expenses,
                },
            ))
        })
        .collect()
}

fn features(rows: &[(&str, u32)]) -> Vec<FeatureUsage> {
    rows.iter()
        .map(|&(feature, usage_count)| FeatureUsage {
            feature: feature.into(),
            usage_count,
        })
        .collect()
}

pub fn engagement_stats() -> Vec<(Uuid, EngagementStats)> {
    vec![
        (
            TECHCORP_ID,
            EngagementStats {
                daily_active_users: 8,
                weekly_active_users: 10,
                monthly_active_users: 10,
                average_sessions_per_user: 4.2,
                average_session_duration: 27,
                most_active_hour: 14,
                most_active_day: Weekday::Mon,
                top_features: features(&[("Dashboard", 245), ("Expenses", 189), ("Reports", 67)]),
            },
        ),
        (
            BUSINESSCO_ID,
            EngagementStats {
                daily_active_users: 2,
                weekly_active_users: 3,
                monthly_active_users: 3,
                average_sessions_per_user: 2.2,
                average_session_duration: 25,
                most_active_hour: 16,
                most_active_day: Weekday::Wed,
                top_features: features(&[("Dashboard", 48), ("Expenses", 38)]),
            },
        ),
    ]
}
