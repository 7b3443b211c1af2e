use crate::error::Error;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.baserow.io/api/database/rows/table/";
pub const DEFAULT_SECRETS_PATH: &str = ".secrets.toml";
pub const SECRETS_PATH_VAR: &str = "ANONVOTE_SECRETS";

/// Configuration values from the environment, falling back to the secrets file.
///
/// A secrets key `foo_bar` is overridden by the environment variable `FOO_BAR`.
#[derive(Debug, Default)]
pub struct Source {
    env: HashMap<String, String>,
    secrets: toml::Table,
}

impl Source {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let secrets = if path.exists() {
            log::debug!("reading secrets from {}", path.display());
            std::fs::read_to_string(path)?.parse::<toml::Table>()?
        } else {
            toml::Table::new()
        };
        Ok(Self::new(std::env::vars().collect(), secrets))
    }

    pub fn new(env: HashMap<String, String>, secrets: toml::Table) -> Self {
        Self { env, secrets }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(v) = self.env.get(&key.to_uppercase()).filter(|v| !v.trim().is_empty()) {
            return Some(v.trim().to_owned());
        }
        match self.secrets.get(key)? {
            toml::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            toml::Value::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    fn require(&self, key: &str) -> Result<String, Error> {
        self.get(key)
            .ok_or_else(|| Error::Config(format!("{} is not set (environment variable {} or secrets key {})", key, key.to_uppercase(), key)))
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_url: String,
    pub token: String,
    pub votes_table: String,
    pub options_table: String,
    pub responses_table: String,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn from_source(source: &Source) -> Result<Self, Error> {
        let timeout = match source.get("http_timeout_secs") {
            Some(v) => v.parse::<u64>().map_err(|_| Error::Config(format!("invalid HTTP_TIMEOUT_SECS: {}", v)))?,
            None => 30,
        };
        let mut api_url = source.get("baserow_api_url").unwrap_or_else(|| DEFAULT_API_URL.into());
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        Ok(Self {
            api_url,
            token: source.require("baserow_api_token")?,
            votes_table: source.require("votes_table_id")?,
            options_table: source.require("options_table_id")?,
            responses_table: source.require("responses_table_id")?,
            timeout: Duration::from_secs(timeout),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub public_url: String,
}

impl ServerConfig {
    pub fn from_source(source: &Source) -> Self {
        let bind_address = source.get("bind_address").unwrap_or_else(|| "0.0.0.0:8000".into());
        let public_url = source.get("public_url").unwrap_or_else(|| "http://localhost:8000".into());
        Self {
            bind_address,
            public_url: public_url.trim_end_matches('/').to_owned(),
        }
    }
}
