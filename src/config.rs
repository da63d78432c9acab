use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use url::Url;

use crate::catalog::CredentialSlot;

/// Search-slot key (`search`, `channel-search`).
pub const SEARCH_KEY_VAR: &str = "YOUTUBE_DE_VIEW";
/// Lookup-slot key (`channel`, `video`).
pub const LOOKUP_KEY_VAR: &str = "YOUTUBE_DE_CHANNEL";
/// Single shared key; fills whichever slot is left unset.
pub const SHARED_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const BASE_URL_VAR: &str = "YOUTUBE_API_BASE_URL";
pub const ALLOWED_METHODS_VAR: &str = "PROXY_ALLOWED_METHODS";

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cors: CorsConfig,
    /// Only ever read from the file or the environment, never written back out.
    #[serde(skip_serializing)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub default_service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Methods served besides OPTIONS. Also echoed in `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub search: Option<Secret>,
    #[serde(default)]
    pub lookup: Option<Secret>,
}

/// An API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Empty strings count as unconfigured.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl Credentials {
    pub fn get(&self, slot: CredentialSlot) -> Option<&Secret> {
        match slot {
            CredentialSlot::Search => self.search.as_ref(),
            CredentialSlot::Lookup => self.lookup.as_ref(),
        }
    }

    pub fn has(&self, slot: CredentialSlot) -> bool {
        self.get(slot).is_some()
    }

    /// "Set"/"Not set", for logs.
    pub fn presence(&self, slot: CredentialSlot) -> &'static str {
        if self.has(slot) {
            "Set"
        } else {
            "Not set"
        }
    }

    fn fill_from_shared(&mut self, shared: Option<Secret>) {
        if let Some(shared) = shared {
            if self.search.is_none() {
                self.search = Some(shared.clone());
            }
            if self.lookup.is_none() {
                self.lookup = Some(shared);
            }
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::ProxyError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| crate::ProxyError::Config(format!("Failed to parse config file: {}", e)))?;
        config.credentials.search = config.credentials.search.and_then(|s| Secret::new(s.0));
        config.credentials.lookup = config.credentials.lookup.and_then(|s| Secret::new(s.0));
        for method in config.cors.allowed_methods.iter_mut() {
            *method = method.trim().to_ascii_uppercase();
        }
        config.cors.allowed_methods.retain(|m| m != "OPTIONS");
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment. This is what the
    /// serverless functions run with.
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlays environment values onto the loaded config. `lookup` is
    /// injectable so tests never touch the real process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).and_then(Secret::new);

        if let Some(key) = read(SEARCH_KEY_VAR) {
            self.credentials.search = Some(key);
        }
        if let Some(key) = read(LOOKUP_KEY_VAR) {
            self.credentials.lookup = Some(key);
        }
        self.credentials.fill_from_shared(read(SHARED_KEY_VAR));

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|v| !v.is_empty()) {
            self.upstream.base_url = base_url;
        }
        if let Some(methods) = lookup(ALLOWED_METHODS_VAR).filter(|v| !v.trim().is_empty()) {
            self.cors.allowed_methods = methods
                .split(',')
                .map(|m| m.trim().to_ascii_uppercase())
                .filter(|m| !m.is_empty() && m != "OPTIONS")
                .collect();
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        Url::parse(&self.upstream.base_url).map_err(|e| {
            crate::ProxyError::Config(format!(
                "Invalid upstream base_url {}: {}",
                self.upstream.base_url, e
            ))
        })?;

        if crate::catalog::find_service(&self.upstream.default_service).is_none() {
            return Err(crate::ProxyError::Config(format!(
                "Unsupported default_service: {}",
                self.upstream.default_service
            )));
        }

        for method in &self.cors.allowed_methods {
            if method != "GET" && method != "POST" {
                return Err(crate::ProxyError::Config(format!(
                    "Unsupported method in allowed_methods: {}",
                    method
                )));
            }
        }

        Ok(())
    }

    pub fn allows_method(&self, method: &str) -> bool {
        self.cors
            .allowed_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }

    /// Value for `Access-Control-Allow-Methods`, e.g. `GET, POST, OPTIONS`.
    pub fn allow_methods_header(&self) -> String {
        let mut methods = self.cors.allowed_methods.clone();
        methods.push("OPTIONS".to_string());
        methods.join(", ")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_service: "youtube".to_string(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
        }
    }
}
