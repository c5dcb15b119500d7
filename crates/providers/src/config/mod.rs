//! Per-provider connection configuration.
//!
//! A [`ProviderConfig`] is built once, either directly or from the host's
//! [`SettingsStore`], and handed to a client at construction. Clients never
//! reach back into the settings store for credentials.

mod secret;
mod settings;

pub use secret::Secret;
pub use settings::{MemorySettings, SettingsStore};

use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::client::ProviderDescriptor;
use crate::endpoint::AuthPlacement;
use crate::models::Params;

/// Global switch that forces every client onto its demo fixtures.
pub const DEMO_MODE_KEY: &str = "tradepress_demo_mode";

/// Default HTTP request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credential shape. Which one a provider expects is fixed by its
/// [`AuthPlacement`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    None,
    /// Single key sent as a query parameter.
    ApiKey(Secret),
    /// Token sent as `Authorization: Bearer`.
    BearerToken(Secret),
    /// Key plus secret, sent as a header pair.
    KeyPair { key: Secret, secret: Secret },
}

impl Credential {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The primary value: the key, the token, or the first half of a pair.
    pub fn primary(&self) -> Option<&Secret> {
        match self {
            Self::None => None,
            Self::ApiKey(key) | Self::BearerToken(key) => Some(key),
            Self::KeyPair { key, .. } => Some(key),
        }
    }

    /// The second half of a key pair.
    pub fn secondary(&self) -> Option<&Secret> {
        match self {
            Self::KeyPair { secret, .. } => Some(secret),
            _ => None,
        }
    }
}

/// Connection data for one provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Base URL endpoint paths are appended to.
    pub base_url: String,
    pub credential: Credential,
    /// When false an `https://` base URL is downgraded to `http://`.
    pub use_encrypted_transport: bool,
    /// Serve demo fixtures even when a credential is configured.
    pub demo_mode: bool,
    pub timeout: Duration,
    /// Provider-level parameters merged under every call (account id, paging).
    pub defaults: Params,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: Credential::None,
            use_encrypted_transport: true,
            demo_mode: false,
            timeout: DEFAULT_TIMEOUT,
            defaults: Params::new(),
        }
    }

    /// Configuration pointing at the provider's default base URL.
    pub fn for_provider(descriptor: &ProviderDescriptor) -> Self {
        Self::new(descriptor.default_base_url)
            .with_encrypted_transport(descriptor.encrypted_by_default)
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_demo_mode(mut self, demo_mode: bool) -> Self {
        self.demo_mode = demo_mode;
        self
    }

    pub fn with_encrypted_transport(mut self, enabled: bool) -> Self {
        self.use_encrypted_transport = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.to_string(), value.into());
        self
    }

    /// Base URL with the transport preference applied and no trailing slash.
    pub fn effective_base_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match base.strip_prefix("https://") {
            Some(rest) if !self.use_encrypted_transport => format!("http://{}", rest),
            _ => base.to_string(),
        }
    }

    /// Read a provider's configuration from the host settings store.
    ///
    /// Keys consulted (with `{id}` the provider id):
    /// `{id}_api_key`, `{id}_api_secret`, `{id}_access_token`,
    /// `{id}_account_id`, `{id}_base_url`, `{id}_use_https`,
    /// `{id}_sandbox`, `{id}_timeout`, and the global [`DEMO_MODE_KEY`].
    pub fn from_settings(descriptor: &ProviderDescriptor, store: &dyn SettingsStore) -> Self {
        let id = descriptor.id;
        let read = |suffix: &str| non_empty(store.get_setting(&format!("{}_{}", id, suffix)));

        let sandbox = read("sandbox").map(|v| is_truthy(&v)).unwrap_or(false);
        let base_url = read("base_url").unwrap_or_else(|| {
            match (sandbox, descriptor.sandbox_base_url) {
                (true, Some(url)) => url.to_string(),
                _ => descriptor.default_base_url.to_string(),
            }
        });

        let credential = match descriptor.registry.auth {
            AuthPlacement::None => Credential::None,
            AuthPlacement::QueryParam(_) => read("api_key")
                .map(|k| Credential::ApiKey(Secret::new(k)))
                .unwrap_or_default(),
            AuthPlacement::Bearer => read("access_token")
                .or_else(|| read("api_key"))
                .map(|t| Credential::BearerToken(Secret::new(t)))
                .unwrap_or_default(),
            AuthPlacement::Headers { .. } => match (read("api_key"), read("api_secret")) {
                (Some(key), Some(secret)) => Credential::KeyPair {
                    key: Secret::new(key),
                    secret: Secret::new(secret),
                },
                _ => Credential::None,
            },
        };

        let use_encrypted_transport = read("use_https")
            .map(|v| is_truthy(&v))
            .unwrap_or(descriptor.encrypted_by_default);

        let demo_mode = non_empty(store.get_setting(DEMO_MODE_KEY))
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let timeout = read("timeout")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let mut config = Self::new(base_url)
            .with_credential(credential)
            .with_encrypted_transport(use_encrypted_transport)
            .with_demo_mode(demo_mode)
            .with_timeout(timeout);

        if let (Some(param), Some(account_id)) = (descriptor.account_param, read("account_id")) {
            config.defaults.insert(param.to_string(), Value::String(account_id));
        }

        debug!(
            "Loaded {} config: base_url={}, credential={}, demo_mode={}",
            id,
            config.effective_base_url(),
            if config.credential.is_none() { "absent" } else { "present" },
            config.demo_mode
        );

        config
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{etoro, github, ibkr, iex, marketstack};

    #[test]
    fn test_effective_base_url_downgrades_when_unencrypted() {
        let config = ProviderConfig::new("https://api.marketstack.com/v1/")
            .with_encrypted_transport(false);
        assert_eq!(config.effective_base_url(), "http://api.marketstack.com/v1");

        let config = ProviderConfig::new("https://api.marketstack.com/v1");
        assert_eq!(config.effective_base_url(), "https://api.marketstack.com/v1");
    }

    #[test]
    fn test_effective_base_url_leaves_plain_http_alone() {
        let config = ProviderConfig::new("http://localhost:5000");
        assert_eq!(config.effective_base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_from_settings_reads_query_key() {
        let store = MemorySettings::with_values([
            ("marketstack_api_key", " ms-key "),
            ("marketstack_use_https", "0"),
        ]);
        let config = ProviderConfig::from_settings(&marketstack::DESCRIPTOR, &store);

        assert_eq!(
            config.credential.primary().map(|s| s.expose()),
            Some("ms-key")
        );
        assert!(!config.use_encrypted_transport);
        assert!(config.effective_base_url().starts_with("http://"));
        assert!(!config.demo_mode);
    }

    #[test]
    fn test_from_settings_key_pair_requires_both_halves() {
        let store = MemorySettings::with_values([("etoro_api_key", "k")]);
        let config = ProviderConfig::from_settings(&etoro::DESCRIPTOR, &store);
        assert!(config.credential.is_none());

        store.set_setting("etoro_api_secret", "s");
        let config = ProviderConfig::from_settings(&etoro::DESCRIPTOR, &store);
        assert_eq!(config.credential.secondary().map(|s| s.expose()), Some("s"));
    }

    #[test]
    fn test_from_settings_bearer_token_and_demo_flag() {
        let store = MemorySettings::with_values([
            ("github_access_token", "ghp_x"),
            (DEMO_MODE_KEY, "yes"),
        ]);
        let config = ProviderConfig::from_settings(&github::DESCRIPTOR, &store);
        assert!(matches!(config.credential, Credential::BearerToken(_)));
        assert!(config.demo_mode);
    }

    #[test]
    fn test_from_settings_account_id_becomes_default() {
        let store = MemorySettings::with_values([("ibkr_account_id", "U1234567")]);
        let config = ProviderConfig::from_settings(&ibkr::DESCRIPTOR, &store);
        assert_eq!(config.defaults["accountId"], "U1234567");
        assert_eq!(config.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_from_settings_sandbox_and_overrides() {
        let store = MemorySettings::with_values([("iex_sandbox", "true"), ("iex_timeout", "5")]);
        let config = ProviderConfig::from_settings(&iex::DESCRIPTOR, &store);
        assert_eq!(config.base_url, "https://sandbox.iexapis.com/stable");
        assert_eq!(config.timeout, Duration::from_secs(5));

        store.set_setting("iex_base_url", "https://iex.example.test");
        let config = ProviderConfig::from_settings(&iex::DESCRIPTOR, &store);
        assert_eq!(config.base_url, "https://iex.example.test");
    }
}
