pub mod analysis;
pub mod domain;
pub mod ingest;
pub mod report;
pub mod time;

pub mod config {
    use crate::analysis::{AnalysisConfig, MissingKeyPolicy, DEFAULT_THRESHOLD};
    use anyhow::Context;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub usage_file: Option<String>,
        pub usage_source_url: Option<String>,
        pub usage_source_api_key: Option<String>,
        pub usage_source_path: Option<String>,
        pub usage_source_timeout_secs: Option<u64>,
        pub usage_window_days: Option<i64>,
        pub utilization_threshold: Option<String>,
        pub missing_key_policy: Option<String>,
        pub benefit_recommendations_url: Option<String>,
        pub benefit_recommendations_token: Option<String>,
        pub benefit_recommendations_api_version: Option<String>,
        pub report_dir: Option<String>,
        pub sentry_dsn: Option<String>,
        pub sentry_environment: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                usage_file: std::env::var("USAGE_FILE").ok(),
                usage_source_url: std::env::var("USAGE_SOURCE_URL").ok(),
                usage_source_api_key: std::env::var("USAGE_SOURCE_API_KEY").ok(),
                usage_source_path: std::env::var("USAGE_SOURCE_PATH").ok(),
                usage_source_timeout_secs: parse_var(
                    "USAGE_SOURCE_TIMEOUT_SECS",
                    std::env::var("USAGE_SOURCE_TIMEOUT_SECS").ok(),
                )?,
                usage_window_days: parse_var(
                    "USAGE_WINDOW_DAYS",
                    std::env::var("USAGE_WINDOW_DAYS").ok(),
                )?,
                utilization_threshold: std::env::var("UTILIZATION_THRESHOLD").ok(),
                missing_key_policy: std::env::var("MISSING_KEY_POLICY").ok(),
                benefit_recommendations_url: std::env::var("BENEFIT_RECOMMENDATIONS_URL").ok(),
                benefit_recommendations_token: std::env::var("BENEFIT_RECOMMENDATIONS_TOKEN").ok(),
                benefit_recommendations_api_version: std::env::var(
                    "BENEFIT_RECOMMENDATIONS_API_VERSION",
                )
                .ok(),
                report_dir: std::env::var("REPORT_DIR").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                sentry_environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
            })
        }

        pub fn require_usage_source_url(&self) -> anyhow::Result<&str> {
            self.usage_source_url
                .as_deref()
                .context("USAGE_SOURCE_URL is required")
        }

        pub fn require_benefit_recommendations_url(&self) -> anyhow::Result<&str> {
            self.benefit_recommendations_url
                .as_deref()
                .context("BENEFIT_RECOMMENDATIONS_URL is required")
        }

        /// Build and validate the analysis config. CLI values take precedence over the
        /// environment.
        pub fn analysis_config(
            &self,
            threshold_override: Option<&str>,
            skip_missing_keys: bool,
        ) -> anyhow::Result<AnalysisConfig> {
            let threshold = match threshold_override.or(self.utilization_threshold.as_deref()) {
                Some(s) => Decimal::from_str(s.trim())
                    .with_context(|| format!("invalid utilization threshold {s:?}"))?,
                None => DEFAULT_THRESHOLD,
            };

            let missing_key_policy = if skip_missing_keys {
                MissingKeyPolicy::Skip
            } else {
                match self.missing_key_policy.as_deref() {
                    Some(s) => s.parse()?,
                    None => MissingKeyPolicy::default(),
                }
            };

            let config = AnalysisConfig {
                threshold,
                missing_key_policy,
            };
            config.validate()?;
            Ok(config)
        }
    }

    /// An unset or blank variable is `None`; anything else must parse.
    fn parse_var<T>(name: &str, raw: Option<String>) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        raw.filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<T>()
                    .with_context(|| format!("invalid {name} {s:?}"))
            })
            .transpose()
    }

}
