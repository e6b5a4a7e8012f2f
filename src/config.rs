// Client configuration: credentials, channel selection and route families

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.tourcms.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Marketplace ID must be an integer, got {0:?}")]
    InvalidMarketplaceId(String),

    #[error("Channel ID must be an integer, got {0:?}")]
    InvalidChannelId(String),

    #[error("TOURCMS_PRIVATE_KEY environment variable is required")]
    MissingPrivateKey,

    #[error("Invalid URL for {0}: {1}")]
    InvalidUrl(String, String),

    #[error("Unknown result type {0:?}, expected \"raw\" or \"native\"")]
    InvalidResultType(String),
}

// Account credentials. Immutable once built.
// A `channel_id` of 0 means marketplace (agent) scope.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    marketplace_id: u64,
    private_key: String,
    channel_id: u64,
}

// Keep the private key out of log output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("marketplace_id", &self.marketplace_id)
            .field("private_key", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

impl Credentials {
    pub fn new(marketplace_id: u64, private_key: impl Into<String>, channel_id: u64) -> Self {
        Self {
            marketplace_id,
            private_key: private_key.into(),
            channel_id,
        }
    }

    // A missing or empty channel id means channel 0.
    pub fn parse(
        marketplace_id: &str,
        private_key: impl Into<String>,
        channel_id: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let marketplace = marketplace_id
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidMarketplaceId(marketplace_id.to_string()))?;

        let channel = match channel_id.map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidChannelId(raw.to_string()))?,
            None => 0,
        };

        Ok(Self::new(marketplace, private_key, channel))
    }

    pub fn marketplace_id(&self) -> u64 {
        self.marketplace_id
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn channel_selector(&self) -> ChannelSelector {
        ChannelSelector::new(self.channel_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSelector {
    default_channel: u64,
}

impl ChannelSelector {
    pub fn new(default_channel: u64) -> Self {
        Self { default_channel }
    }

    pub fn resolve(&self, channel: Option<u64>) -> u64 {
        channel.unwrap_or(self.default_channel)
    }

    // Non-numeric overrides fall back to the default channel.
    pub fn resolve_str(&self, channel: Option<&str>) -> u64 {
        self.resolve(channel.and_then(|c| c.trim().parse().ok()))
    }
}

// URL route family: `/p/...` for marketplace scope, `/c/...` for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Marketplace,
    Channel,
}

impl Route {
    pub const PLACEHOLDER: &'static str = "{route}";

    pub fn for_channel(channel: u64) -> Self {
        if channel == 0 {
            Route::Marketplace
        } else {
            Route::Channel
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Marketplace => "p",
            Route::Channel => "c",
        }
    }

    pub fn expand(&self, template: &str) -> String {
        template.replace(Self::PLACEHOLDER, self.as_str())
    }
}

// What the client hands back on a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultType {
    #[default]
    Raw,
    Native,
}

impl FromStr for ResultType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ResultType::Raw),
            "native" => Ok(ResultType::Native),
            other => Err(ConfigError::InvalidResultType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub base_url: Url,
    pub result_type: ResultType,
    // Applied by the HTTP transport, not by the client.
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: default_base_url(),
            result_type: ResultType::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_url("base_url", base_url)?;
        Ok(self)
    }

    // Loads configuration from environment variables.
    // Variables:
    // - `TOURCMS_MARKETPLACE_ID` (default: `0`)
    // - `TOURCMS_PRIVATE_KEY` (required)
    // - `TOURCMS_CHANNEL_ID` (default: `0`)
    // - `TOURCMS_BASE_URL` (default: `https://api.tourcms.com`)
    // - `TOURCMS_RESULT_TYPE` (`raw` or `native`, default: `raw`)
    // - `TOURCMS_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let private_key =
            std::env::var("TOURCMS_PRIVATE_KEY").map_err(|_| ConfigError::MissingPrivateKey)?;
        let marketplace_id =
            std::env::var("TOURCMS_MARKETPLACE_ID").unwrap_or_else(|_| "0".to_string());
        let channel_id = std::env::var("TOURCMS_CHANNEL_ID").ok();

        let credentials = Credentials::parse(&marketplace_id, private_key, channel_id.as_deref())?;

        let base_url = std::env::var("TOURCMS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let result_type = match std::env::var("TOURCMS_RESULT_TYPE") {
            Ok(raw) => raw.parse()?,
            Err(_) => ResultType::default(),
        };

        Ok(Self {
            credentials,
            base_url: parse_url("TOURCMS_BASE_URL", &base_url)?,
            result_type,
            timeout_secs: std::env::var("TOURCMS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_numeric_ids() {
        let credentials = Credentials::parse("100", "secret", Some("3930")).unwrap();
        assert_eq!(credentials.marketplace_id(), 100);
        assert_eq!(credentials.channel_id(), 3930);
    }

    #[test_case(None; "absent")]
    #[test_case(Some(""); "empty")]
    fn test_parse_defaults_channel_to_zero(channel: Option<&str>) {
        let credentials = Credentials::parse("100", "secret", channel).unwrap();
        assert_eq!(credentials.channel_id(), 0);
    }

    #[test]
    fn test_parse_rejects_non_numeric_marketplace() {
        let result = Credentials::parse("abc", "secret", None);
        assert!(matches!(result, Err(ConfigError::InvalidMarketplaceId(ref id)) if id == "abc"));
    }

    #[test]
    fn test_parse_rejects_non_numeric_channel() {
        let result = Credentials::parse("100", "secret", Some("chan"));
        assert!(matches!(result, Err(ConfigError::InvalidChannelId(ref id)) if id == "chan"));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let credentials = Credentials::new(100, "super-secret", 0);
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_default_channel_without_override() {
        let selector = ChannelSelector::new(0);
        let channel = selector.resolve(None);
        assert_eq!(channel, 0);
        assert_eq!(Route::for_channel(channel), Route::Marketplace);
        assert_eq!(Route::for_channel(channel).as_str(), "p");
    }

    #[test]
    fn test_numeric_override() {
        let selector = ChannelSelector::new(0);
        let channel = selector.resolve_str(Some("7"));
        assert_eq!(channel, 7);
        assert_eq!(Route::for_channel(channel).as_str(), "c");
    }

    #[test]
    fn test_zero_override_wins_over_default() {
        let selector = ChannelSelector::new(3930);
        assert_eq!(selector.resolve(Some(0)), 0);
    }

    #[test]
    fn test_non_numeric_override_falls_back() {
        let selector = ChannelSelector::new(3930);
        assert_eq!(selector.resolve_str(Some("seven")), 3930);
        assert_eq!(selector.resolve_str(None), 3930);
    }

    #[test_case(Route::Marketplace, "/{route}/tours/list.xml", "/p/tours/list.xml")]
    #[test_case(Route::Channel, "/{route}/tours/list.xml", "/c/tours/list.xml")]
    #[test_case(Route::Channel, "/p/tours/locations.xml", "/p/tours/locations.xml"; "fixed path")]
    fn test_route_expand(route: Route, template: &str, expected: &str) {
        assert_eq!(route.expand(template), expected);
    }

    #[test]
    fn test_result_type_from_str() {
        assert_eq!("raw".parse::<ResultType>().unwrap(), ResultType::Raw);
        assert_eq!("Native".parse::<ResultType>().unwrap(), ResultType::Native);
        assert!("json".parse::<ResultType>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new(Credentials::new(100, "secret", 0));
        assert_eq!(config.base_url.as_str(), "https://api.tourcms.com/");
        assert_eq!(config.result_type, ResultType::Raw);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_with_base_url_rejects_invalid_url() {
        let config = ClientConfig::new(Credentials::new(100, "secret", 0));
        assert!(config.with_base_url("not a url").is_err());
    }

    // One test owns every TOURCMS_* variable so the cases run in sequence
    #[test]
    fn test_from_env() {
        const VARS: [&str; 6] = [
            "TOURCMS_MARKETPLACE_ID",
            "TOURCMS_PRIVATE_KEY",
            "TOURCMS_CHANNEL_ID",
            "TOURCMS_BASE_URL",
            "TOURCMS_RESULT_TYPE",
            "TOURCMS_TIMEOUT_SECS",
        ];
        for var in VARS {
            std::env::remove_var(var);
        }

        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::MissingPrivateKey)
        ));

        std::env::set_var("TOURCMS_PRIVATE_KEY", "env-secret");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.credentials.marketplace_id(), 0);
        assert_eq!(config.credentials.channel_id(), 0);
        assert_eq!(config.credentials.private_key(), "env-secret");
        assert_eq!(config.base_url.as_str(), "https://api.tourcms.com/");
        assert_eq!(config.result_type, ResultType::Raw);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        std::env::set_var("TOURCMS_MARKETPLACE_ID", "100");
        std::env::set_var("TOURCMS_CHANNEL_ID", "3930");
        std::env::set_var("TOURCMS_RESULT_TYPE", "native");
        std::env::set_var("TOURCMS_TIMEOUT_SECS", "5");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.credentials.marketplace_id(), 100);
        assert_eq!(config.credentials.channel_id(), 3930);
        assert_eq!(config.result_type, ResultType::Native);
        assert_eq!(config.timeout_secs, 5);

        std::env::set_var("TOURCMS_TIMEOUT_SECS", "soon");
        assert_eq!(
            ClientConfig::from_env().unwrap().timeout_secs,
            DEFAULT_TIMEOUT_SECS
        );

        std::env::set_var("TOURCMS_RESULT_TYPE", "json");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidResultType(ref t)) if t == "json"
        ));
        std::env::remove_var("TOURCMS_RESULT_TYPE");

        std::env::set_var("TOURCMS_BASE_URL", "not a url");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidUrl(ref name, _)) if name == "TOURCMS_BASE_URL"
        ));

        std::env::set_var("TOURCMS_MARKETPLACE_ID", "abc");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidMarketplaceId(_))
        ));

        for var in VARS {
            std::env::remove_var(var);
        }
    }
}
