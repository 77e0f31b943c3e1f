//! Configuration management

use std::{collections::HashMap, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::policy::ZoneConfig;
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// CA backend configuration
    pub backend: CaBackendConfig,
    /// Zone policy configuration
    pub policy: PolicyConfig,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (CERTGATE_ prefix)
        figment = figment.merge(Env::prefixed("CERTGATE_").split("__"));

        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8441,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// CA backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaBackendConfig {
    /// Backend endpoint URL
    pub url: String,
    /// Header carrying the operation identifier on forwarded requests
    pub target_header: String,
    /// Static headers added to every backend request (e.g. credentials)
    pub headers: HashMap<String, String>,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for CaBackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8400/".to_string(),
            target_header: "x-certgate-target".to_string(),
            headers: HashMap::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Zone policy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Named zones and their rules
    pub zones: HashMap<String, ZoneConfig>,
}
