use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_RATE_LIMIT_MAX: usize = 10;
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Server configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub port: u16,
    pub rate_limit_max: usize,
    pub rate_limit_window: Duration,
    /// Key rate limiting on the first `x-forwarded-for` hop instead of the
    /// peer address. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
    pub log_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            port: DEFAULT_PORT,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window: DEFAULT_RATE_LIMIT_WINDOW,
            trust_forwarded_for: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            port: parsed("PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(defaults.port),
            rate_limit_max: parsed("RATE_LIMIT_MAX")
                .map(|n| n as usize)
                .unwrap_or(defaults.rate_limit_max),
            rate_limit_window: parsed("RATE_LIMIT_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            trust_forwarded_for: lookup("TRUST_PROXY")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.trust_forwarded_for),
            log_dir: lookup("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
        }
    }
}
