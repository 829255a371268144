use chrono::FixedOffset;
use serde::Deserialize;

use crate::error::{BackofficeError, BackofficeResult};
use crate::types::DateFilter;

/// Root application configuration. Loaded from an optional `backoffice.toml`
/// file and environment variables with the prefix `BACKOFFICE__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// ─── Reporting Config ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    /// Offset from UTC of the reporting timezone, in minutes. Calendar-day,
    /// month, quarter and year comparisons are made in this timezone.
    ///
    /// The offset is fixed: it does not follow daylight-saving changes, so a
    /// zone such as Europe/Paris needs 60 in winter and 120 in summer.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_period")]
    pub default_period: DateFilter,
}

fn default_utc_offset_minutes() -> i32 {
    0
}
fn default_period() -> DateFilter {
    DateFilter::Month
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            default_period: default_period(),
        }
    }
}

impl ReportingConfig {
    /// The reporting timezone as a fixed offset.
    pub fn utc_offset(&self) -> BackofficeResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            BackofficeError::Config(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

// ─── Storage Config ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding records created through the console. When unset,
    /// everything lives in memory for the lifetime of the process.
    #[serde(default)]
    pub data_file: Option<String>,
    #[serde(default = "default_seed_sample_data")]
    pub seed_sample_data: bool,
}

fn default_seed_sample_data() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            seed_sample_data: default_seed_sample_data(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("backoffice").required(false))
            .add_source(
                config::Environment::with_prefix("BACKOFFICE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.reporting.utc_offset_minutes, 0);
        assert_eq!(config.reporting.default_period, DateFilter::Month);
        assert!(config.storage.data_file.is_none());
        assert!(config.storage.seed_sample_data);
    }

    #[test]
    fn test_utc_offset() {
        let reporting = ReportingConfig {
            utc_offset_minutes: 60,
            ..Default::default()
        };
        assert_eq!(reporting.utc_offset().unwrap().local_minus_utc(), 3600);

        let broken = ReportingConfig {
            utc_offset_minutes: 24 * 60,
            ..Default::default()
        };
        assert!(matches!(broken.utc_offset(), Err(BackofficeError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = serde_json::from_str(
            r#"{"reporting": {"default_period": "quarter"}, "storage": {"data_file": "data.json"}}"#,
        )
        .unwrap();
        assert_eq!(config.reporting.default_period, DateFilter::Quarter);
        assert_eq!(config.reporting.utc_offset_minutes, 0);
        assert_eq!(config.storage.data_file.as_deref(), Some("data.json"));
        assert!(config.storage.seed_sample_data);
    }
}
