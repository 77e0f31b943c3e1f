//! Canonical certificate request model.
//!
//! The gateway's internal, operation-agnostic representation of "what
//! certificate is being asked for". Codecs construct one per inbound gated
//! request; the policy validator is the only consumer. The model is
//! immutable after construction and is dropped after validation — it is
//! never persisted and never forwarded to the backend, which executes the
//! caller's original native payload.

use serde::{Deserialize, Serialize};
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;

use crate::{Error, Result};

/// Zone evaluated when the inbound payload names none.
pub const DEFAULT_ZONE: &str = "Default";

/// Resolve the effective zone for a payload-supplied value.
///
/// Absent and empty are treated the same, uniformly across all gated
/// operations.
#[must_use]
pub fn effective_zone(zone: Option<&str>) -> String {
    match zone {
        Some(z) if !z.is_empty() => z.to_owned(),
        _ => DEFAULT_ZONE.to_owned(),
    }
}

/// Structured subject name. CN is the only attribute policy rules consult;
/// it may be empty for SAN-only signing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Subject Common Name (CN), empty when the signing request carries none.
    pub common_name: String,
}

/// Public key algorithm carried by a caller-supplied signing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    /// RSA keys
    Rsa,
    /// ECDSA keys
    Ecdsa,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa => write!(f, "rsa"),
            Self::Ecdsa => write!(f, "ecdsa"),
        }
    }
}

/// A caller-supplied signing request, decoded and parsed exactly once.
///
/// `der` holds the authoritative bytes; `subject` and `san_dns_names` are
/// the fields extracted from them for policy evaluation.
#[derive(Debug, Clone)]
pub struct ParsedCsr {
    /// Decoded DER bytes of the signing request.
    pub der: Vec<u8>,
    /// Subject extracted from the signing request.
    pub subject: Subject,
    /// DNS SAN entries extracted from the requested extensions.
    pub san_dns_names: Vec<String>,
    /// Public key algorithm, when recognized.
    pub key_algorithm: Option<KeyAlgorithm>,
}

impl ParsedCsr {
    /// Parse signing-request bytes (raw DER, or a PEM block wrapping DER).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSigningRequest` if the bytes do not parse as
    /// a well-formed certification request.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let der = if bytes.starts_with(b"-----BEGIN") {
            let (_, pem) = parse_x509_pem(bytes).map_err(|e| {
                Error::InvalidSigningRequest(format!("invalid PEM block: {e}"))
            })?;
            pem.contents
        } else {
            bytes.to_vec()
        };

        let (common_name, san_dns_names, key_algorithm) = {
            let (_, csr) = X509CertificationRequest::from_der(&der).map_err(|e| {
                Error::InvalidSigningRequest(format!("not a certification request: {e}"))
            })?;
            let info = &csr.certification_request_info;

            let common_name = info
                .subject
                .iter_common_name()
                .next()
                .and_then(|attr| attr.as_str().ok())
                .unwrap_or_default()
                .to_owned();

            let mut san_dns_names = Vec::new();
            if let Some(extensions) = csr.requested_extensions() {
                for ext in extensions {
                    if let ParsedExtension::SubjectAlternativeName(san) = ext {
                        for name in &san.general_names {
                            if let GeneralName::DNSName(dns) = name {
                                san_dns_names.push((*dns).to_owned());
                            }
                        }
                    }
                }
            }

            let key_algorithm = match info.subject_pki.parsed() {
                Ok(PublicKey::RSA(_)) => Some(KeyAlgorithm::Rsa),
                Ok(PublicKey::EC(_)) => Some(KeyAlgorithm::Ecdsa),
                _ => None,
            };

            (common_name, san_dns_names, key_algorithm)
        };

        Ok(Self {
            der,
            subject: Subject { common_name },
            san_dns_names,
            key_algorithm,
        })
    }
}

/// Where the signing request comes from.
///
/// The variant shape enforces the model invariant: raw bytes exist only for
/// caller-supplied requests, standalone subject/SAN fields only for
/// service-generated ones.
#[derive(Debug, Clone)]
pub enum CsrSource {
    /// Caller supplied the signing request bytes.
    Provided(ParsedCsr),
    /// The backend synthesizes key and signing request from explicit fields.
    ServiceGenerated {
        /// Requested subject.
        subject: Subject,
        /// Requested DNS SAN entries.
        san_dns_names: Vec<String>,
    },
}

/// Canonical certificate request evaluated against a zone policy.
#[derive(Debug, Clone)]
pub struct CertRequest {
    /// Policy zone the request is evaluated against.
    pub zone: String,
    /// Signing request origin and extracted name fields.
    pub source: CsrSource,
}

impl CertRequest {
    /// Build a request around caller-supplied signing-request bytes.
    #[must_use]
    pub fn provided(zone: String, csr: ParsedCsr) -> Self {
        Self {
            zone,
            source: CsrSource::Provided(csr),
        }
    }

    /// Build a request for a backend-synthesized signing request.
    #[must_use]
    pub fn service_generated(
        zone: String,
        common_name: String,
        san_dns_names: Vec<String>,
    ) -> Self {
        Self {
            zone,
            source: CsrSource::ServiceGenerated {
                subject: Subject { common_name },
                san_dns_names,
            },
        }
    }

    /// Subject of the request, wherever it came from.
    #[must_use]
    pub fn subject(&self) -> &Subject {
        match &self.source {
            CsrSource::Provided(csr) => &csr.subject,
            CsrSource::ServiceGenerated { subject, .. } => subject,
        }
    }

    /// DNS SAN entries of the request.
    #[must_use]
    pub fn san_dns_names(&self) -> &[String] {
        match &self.source {
            CsrSource::Provided(csr) => &csr.san_dns_names,
            CsrSource::ServiceGenerated { san_dns_names, .. } => san_dns_names,
        }
    }

    /// Public key algorithm. `None` for service-generated requests, where
    /// no key exists yet.
    #[must_use]
    pub fn key_algorithm(&self) -> Option<KeyAlgorithm> {
        match &self.source {
            CsrSource::Provided(csr) => csr.key_algorithm,
            CsrSource::ServiceGenerated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::string::Ia5String;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};

    /// Generate a DER signing request with the given CN and DNS SANs.
    fn make_csr_der(cn: &str, sans: &[&str]) -> Vec<u8> {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        params.subject_alt_names = sans
            .iter()
            .map(|s| SanType::DnsName(Ia5String::try_from(*s).unwrap()))
            .collect();

        let key = KeyPair::generate().expect("key generation failed");
        let csr = params
            .serialize_request(&key)
            .expect("csr generation failed");
        csr.der().to_vec()
    }

    fn make_csr_pem(cn: &str, sans: &[&str]) -> String {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        params.subject_alt_names = sans
            .iter()
            .map(|s| SanType::DnsName(Ia5String::try_from(*s).unwrap()))
            .collect();

        let key = KeyPair::generate().expect("key generation failed");
        let csr = params
            .serialize_request(&key)
            .expect("csr generation failed");
        csr.pem().expect("pem encoding failed")
    }

    #[test]
    fn parse_extracts_common_name() {
        let der = make_csr_der("test.example.com", &[]);
        let csr = ParsedCsr::parse(&der).unwrap();
        assert_eq!(csr.subject.common_name, "test.example.com");
    }

    #[test]
    fn parse_extracts_dns_sans() {
        let der = make_csr_der("test.example.com", &["a.example.com", "b.example.com"]);
        let csr = ParsedCsr::parse(&der).unwrap();
        assert_eq!(csr.san_dns_names, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn parse_accepts_pem_wrapped_csr() {
        let pem = make_csr_pem("pem.example.com", &[]);
        let csr = ParsedCsr::parse(pem.as_bytes()).unwrap();
        assert_eq!(csr.subject.common_name, "pem.example.com");
    }

    #[test]
    fn parse_detects_ecdsa_key() {
        // rcgen's default keypair is ECDSA P-256
        let der = make_csr_der("ec.example.com", &[]);
        let csr = ParsedCsr::parse(&der).unwrap();
        assert_eq!(csr.key_algorithm, Some(KeyAlgorithm::Ecdsa));
    }

    #[test]
    fn parse_rejects_garbage_bytes() {
        let err = ParsedCsr::parse(b"definitely not a csr").unwrap_err();
        assert!(matches!(err, Error::InvalidSigningRequest(_)));
    }

    #[test]
    fn parse_rejects_truncated_pem() {
        let err = ParsedCsr::parse(b"-----BEGIN CERTIFICATE REQUEST-----\ngarbage").unwrap_err();
        assert!(matches!(err, Error::InvalidSigningRequest(_)));
    }

    #[test]
    fn effective_zone_defaults_when_absent() {
        assert_eq!(effective_zone(None), DEFAULT_ZONE);
    }

    #[test]
    fn effective_zone_defaults_when_empty() {
        assert_eq!(effective_zone(Some("")), DEFAULT_ZONE);
    }

    #[test]
    fn effective_zone_keeps_named_zone() {
        assert_eq!(effective_zone(Some("DevOps")), "DevOps");
    }

    #[test]
    fn provided_request_exposes_csr_fields() {
        let der = make_csr_der("test.example.com", &["alt.example.com"]);
        let csr = ParsedCsr::parse(&der).unwrap();
        let request = CertRequest::provided(DEFAULT_ZONE.to_owned(), csr);
        assert_eq!(request.subject().common_name, "test.example.com");
        assert_eq!(request.san_dns_names(), ["alt.example.com"]);
        assert!(request.key_algorithm().is_some());
    }

    #[test]
    fn service_generated_request_has_no_key_algorithm() {
        let request = CertRequest::service_generated(
            DEFAULT_ZONE.to_owned(),
            "www.example.com".to_owned(),
            vec!["example.com".to_owned()],
        );
        assert_eq!(request.subject().common_name, "www.example.com");
        assert_eq!(request.san_dns_names(), ["example.com"]);
        assert!(request.key_algorithm().is_none());
    }
}
