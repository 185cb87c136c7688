pub mod api;
pub mod domain;
pub mod session;
pub mod suggest;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base_url: Option<String>,
        pub api_timeout_secs: Option<u64>,
        pub api_retries: Option<u32>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                api_base_url: std::env::var("QUIZ_API_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                api_timeout_secs: parse_env("QUIZ_API_TIMEOUT_SECS")?,
                api_retries: parse_env("QUIZ_API_RETRIES")?,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_api_base_url(&self) -> anyhow::Result<&str> {
            self.api_base_url
                .as_deref()
                .context("QUIZ_API_BASE_URL is required")
        }
    }

    fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("{key} is not a valid number: {s}")),
            _ => Ok(None),
        }
    }
}
