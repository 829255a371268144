//! Login log and session helpers for the organization detail view.

use backoffice_core::types::{LoginLog, LoginStatus};

/// Logs with the given status, or every log when `status` is `None`.
pub fn filter_login_logs(logs: &[LoginLog], status: Option<LoginStatus>) -> Vec<&LoginLog> {
    logs.iter()
        .filter(|log| status.map_or(true, |s| log.status == s))
        .collect()
}

/// `45 min` below one hour, `3h 13min` above.
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes} min");
    }
    format!("{}h {}min", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn log(status: LoginStatus) -> LoginLog {
        LoginLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_first_name: "Sophie".into(),
            user_last_name: "Martin".into(),
            user_email: "sophie.martin@techcorp.com".into(),
            login_at: Utc::now(),
            ip_address: "192.168.1.100".into(),
            user_agent: "Mozilla/5.0".into(),
            location: Some("Paris, France".into()),
            status,
            logout_at: None,
            session_duration: None,
        }
    }

    #[test]
    fn test_filter_login_logs() {
        let logs = vec![
            log(LoginStatus::Success),
            log(LoginStatus::Failed),
            log(LoginStatus::Success),
        ];
        assert_eq!(filter_login_logs(&logs, None).len(), 3);
        assert_eq!(filter_login_logs(&logs, Some(LoginStatus::Success)).len(), 2);

        let failed = filter_login_logs(&logs, Some(LoginStatus::Failed));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, logs[1].id);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0 min");
        assert_eq!(format_duration(45), "45 min");
        assert_eq!(format_duration(60), "1h 0min");
        assert_eq!(format_duration(193), "3h 13min");
    }
}
