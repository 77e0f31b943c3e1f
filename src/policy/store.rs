//! Config-backed policy store.
//!
//! Zones are declared in the configuration file and compiled into [`Policy`]
//! values once at startup; resolution afterwards is a read-only map lookup,
//! safe for unsynchronized concurrent use.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Policy, PolicyStore, ZoneConfig};
use crate::config::PolicyConfig;
use crate::request::DEFAULT_ZONE;
use crate::{Error, Result};

/// Policy store holding zones compiled from configuration.
pub struct ConfigPolicyStore {
    zones: HashMap<String, Policy>,
}

impl ConfigPolicyStore {
    /// Compile every configured zone.
    ///
    /// A permissive `Default` zone is added when the configuration does not
    /// declare one, so requests that name no zone always resolve.
    #[must_use]
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut zones: HashMap<String, Policy> = config
            .zones
            .iter()
            .map(|(name, zone_config)| (name.clone(), Policy::from_config(name, zone_config)))
            .collect();

        zones
            .entry(DEFAULT_ZONE.to_owned())
            .or_insert_with(|| Policy::permissive(DEFAULT_ZONE));

        info!(zones = zones.len(), "Compiled zone policies");
        Self { zones }
    }

    /// Build a store from explicit zone configs (used by the offline checker).
    #[must_use]
    pub fn from_zones(zones: HashMap<String, ZoneConfig>) -> Self {
        Self::from_config(&PolicyConfig { zones })
    }
}

#[async_trait]
impl PolicyStore for ConfigPolicyStore {
    async fn resolve(&self, zone: &str) -> Result<Policy> {
        debug!(zone = %zone, "Resolving zone policy");
        self.zones.get(zone).cloned().ok_or_else(|| {
            Error::DependencyUnavailable(format!("zone '{zone}' not found in policy store"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CertRequest;

    fn store_with(zones: &[(&str, &[&str])]) -> ConfigPolicyStore {
        let zones = zones
            .iter()
            .map(|(name, domains)| {
                (
                    (*name).to_owned(),
                    ZoneConfig {
                        allowed_domains: domains.iter().map(|d| (*d).to_owned()).collect(),
                        allowed_key_algorithms: Vec::new(),
                    },
                )
            })
            .collect();
        ConfigPolicyStore::from_zones(zones)
    }

    #[tokio::test]
    async fn resolves_configured_zone() {
        let store = store_with(&[("DevOps", &["*.example.com"])]);
        let policy = store.resolve("DevOps").await.unwrap();
        assert_eq!(policy.zone(), "DevOps");
    }

    #[tokio::test]
    async fn unknown_zone_is_dependency_failure() {
        let store = store_with(&[]);
        let err = store.resolve("Ghost").await.unwrap_err();
        assert!(matches!(err, Error::DependencyUnavailable(_)));
        assert!(err.to_string().contains("Ghost"));
    }

    #[tokio::test]
    async fn default_zone_exists_and_is_permissive() {
        let store = store_with(&[]);
        let policy = store.resolve(DEFAULT_ZONE).await.unwrap();
        let req = CertRequest::service_generated(
            DEFAULT_ZONE.to_owned(),
            "anything.example".to_owned(),
            Vec::new(),
        );
        assert!(policy.validate(&req).is_ok());
    }

    #[tokio::test]
    async fn configured_default_zone_is_not_overridden() {
        let store = store_with(&[(DEFAULT_ZONE, &["*.corp.internal"])]);
        let policy = store.resolve(DEFAULT_ZONE).await.unwrap();
        let req = CertRequest::service_generated(
            DEFAULT_ZONE.to_owned(),
            "outside.example.com".to_owned(),
            Vec::new(),
        );
        assert!(policy.validate(&req).is_err());
    }
}
