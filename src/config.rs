use crate::provider::gmail::GMAIL_API_BASE;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gmail_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            gmail_api_base: GMAIL_API_BASE.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: set("MAIL_RELAY_HOST").unwrap_or(defaults.host),
            port: set("MAIL_RELAY_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            gmail_api_base: set("MAIL_RELAY_GMAIL_API_BASE").unwrap_or(defaults.gmail_api_base),
        }
    }
}
