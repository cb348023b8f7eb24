use std::{env, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CITY: &str = "Abilene-Sweetwater";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base: String,
    pub chat_url: Option<String>,
    pub default_city: String,
    pub assistant_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_base: DEFAULT_API_BASE.to_string(),
            chat_url: None,
            default_city: DEFAULT_CITY.to_string(),
            assistant_delay: Duration::ZERO,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            port: non_empty("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            api_base: non_empty("DASHBOARD_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            chat_url: non_empty("DASHBOARD_CHAT_URL"),
            default_city: non_empty("DASHBOARD_DEFAULT_CITY").unwrap_or(defaults.default_city),
            assistant_delay: non_empty("DASHBOARD_ASSISTANT_DELAY_MS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.assistant_delay),
        }
    }
}
