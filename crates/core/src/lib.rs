pub mod domain;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod preprocess;
pub mod stage;
pub mod storage;

pub mod config {
    use crate::llm::Provider;
    use anyhow::Context;
    use std::path::PathBuf;

    pub const DEFAULT_DATA_DIR: &str = "data";

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub data_dir: Option<String>,
        pub llm_provider: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                data_dir: std::env::var("DAYBRIEF_DATA_DIR").ok(),
                llm_provider: std::env::var("DAYBRIEF_LLM_PROVIDER").ok(),
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn data_dir(&self) -> PathBuf {
            PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        /// `anthropic` when an API key is configured, `canned` otherwise.
        pub fn llm_provider(&self) -> anyhow::Result<Provider> {
            let Some(raw) = self.llm_provider.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
                return Ok(if self.anthropic_api_key.is_some() {
                    Provider::Anthropic
                } else {
                    Provider::Canned
                });
            };

            match raw.to_ascii_lowercase().as_str() {
                "anthropic" => Ok(Provider::Anthropic),
                "canned" => Ok(Provider::Canned),
                other => anyhow::bail!(
                    "DAYBRIEF_LLM_PROVIDER must be `anthropic` or `canned`, got `{other}`"
                ),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn provider_defaults_follow_api_key() {
            let mut settings = Settings::default();
            assert_eq!(settings.llm_provider().unwrap(), Provider::Canned);

            settings.anthropic_api_key = Some("sk-test".to_string());
            assert_eq!(settings.llm_provider().unwrap(), Provider::Anthropic);

            settings.llm_provider = Some(" Canned ".to_string());
            assert_eq!(settings.llm_provider().unwrap(), Provider::Canned);
        }

        #[test]
        fn unknown_provider_is_rejected() {
            let settings = Settings {
                llm_provider: Some("scripted".to_string()),
                ..Settings::default()
            };
            assert!(settings.llm_provider().is_err());
        }

        #[test]
        fn data_dir_falls_back_to_default() {
            assert_eq!(Settings::default().data_dir(), PathBuf::from(DEFAULT_DATA_DIR));
            let settings = Settings {
                data_dir: Some("/srv/daybrief".to_string()),
                ..Settings::default()
            };
            assert_eq!(settings.data_dir(), PathBuf::from("/srv/daybrief"));
        }
    }
}
