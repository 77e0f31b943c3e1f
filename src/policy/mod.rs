//! Zone policies for gated certificate operations.
//!
//! A zone is a named policy scope governing what certificate attributes are
//! permitted for requests tagged with it. Zone rules are declared in
//! configuration and compiled once at startup into [`Policy`] values; the
//! dispatcher resolves a policy by zone name through the [`PolicyStore`]
//! seam and evaluates it against the canonical request. Validation is a
//! pure function of (compiled rules, request): the same inputs always give
//! the same verdict.

mod store;

pub use store::ConfigPolicyStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::request::{CertRequest, KeyAlgorithm};
use crate::{Error, Result};

/// Resolves the policy bound to a zone name.
///
/// Any resolution failure — unknown zone, unreachable store — is a
/// dependency failure, distinct from a validation rejection.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Look up the policy for `zone`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DependencyUnavailable` when the zone is unknown or
    /// the store cannot be reached.
    async fn resolve(&self, zone: &str) -> Result<Policy>;
}

/// Zone policy configuration as declared in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Domain patterns permitted for the CN and every DNS SAN.
    /// Exact names (`www.example.com`), subdomain wildcards
    /// (`*.example.com`), or `*` for any. Empty list permits any name.
    pub allowed_domains: Vec<String>,

    /// Key algorithms permitted for caller-supplied signing requests.
    /// Empty list permits any. Not evaluated for service-generated
    /// requests, where no key exists yet.
    pub allowed_key_algorithms: Vec<KeyAlgorithm>,
}

/// A compiled domain pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DomainRule {
    /// `*` — any name.
    Any,
    /// Exact, case-insensitive name match.
    Exact(String),
    /// `*.example.com` — any name under the suffix (stored with leading dot).
    Suffix(String),
}

impl DomainRule {
    fn compile(pattern: &str) -> Self {
        if pattern == "*" {
            Self::Any
        } else if let Some(rest) = pattern.strip_prefix("*.") {
            Self::Suffix(format!(".{}", rest.to_ascii_lowercase()))
        } else {
            Self::Exact(pattern.to_ascii_lowercase())
        }
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        match self {
            Self::Any => true,
            Self::Exact(exact) => name == *exact,
            Self::Suffix(suffix) => name.ends_with(suffix.as_str()),
        }
    }
}

/// Compiled policy for a single zone.
///
/// Opaque to the dispatcher: the only exposed operation is
/// [`Policy::validate`].
#[derive(Debug, Clone)]
pub struct Policy {
    /// Zone this policy was compiled for (used in rejection reasons).
    zone: String,
    /// Compiled domain rules; empty means any name is permitted.
    domain_rules: Vec<DomainRule>,
    /// Permitted key algorithms; empty means any.
    allowed_key_algorithms: Vec<KeyAlgorithm>,
}

impl Policy {
    /// Compile a policy from zone configuration.
    #[must_use]
    pub fn from_config(zone: &str, config: &ZoneConfig) -> Self {
        Self {
            zone: zone.to_owned(),
            domain_rules: config
                .allowed_domains
                .iter()
                .map(|p| DomainRule::compile(p))
                .collect(),
            allowed_key_algorithms: config.allowed_key_algorithms.clone(),
        }
    }

    /// A policy that permits any request. Backs the built-in `Default` zone
    /// when the configuration does not define one.
    #[must_use]
    pub fn permissive(zone: &str) -> Self {
        Self::from_config(zone, &ZoneConfig::default())
    }

    /// Zone name this policy governs.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Validate a canonical request against this policy.
    ///
    /// The CN (when present) and every DNS SAN must match at least one
    /// allowed-domain rule; the key algorithm of a caller-supplied signing
    /// request must be in the allowed set.
    ///
    /// # Errors
    ///
    /// Returns `Error::PolicyViolation` with a human-readable reason on
    /// the first rule the request breaks.
    pub fn validate(&self, request: &CertRequest) -> Result<()> {
        let cn = &request.subject().common_name;
        let sans = request.san_dns_names();

        let mut names: Vec<&str> = Vec::with_capacity(1 + sans.len());
        if !cn.is_empty() {
            names.push(cn.as_str());
        }
        names.extend(sans.iter().map(String::as_str));

        if names.is_empty() {
            return Err(Error::PolicyViolation(format!(
                "request carries no subject names to evaluate against zone '{}'",
                self.zone
            )));
        }

        if !self.domain_rules.is_empty() {
            for name in &names {
                if !self.domain_rules.iter().any(|rule| rule.matches(name)) {
                    return Err(Error::PolicyViolation(format!(
                        "name '{name}' is not allowed by zone '{}'",
                        self.zone
                    )));
                }
            }
        }

        if !self.allowed_key_algorithms.is_empty() {
            if let Some(algorithm) = request.key_algorithm() {
                if !self.allowed_key_algorithms.contains(&algorithm) {
                    return Err(Error::PolicyViolation(format!(
                        "key algorithm '{algorithm}' is not allowed by zone '{}'",
                        self.zone
                    )));
                }
            }
        }

        Ok(())
    }
}
