//! Codec for the managed-certificate issuance operation.
//!
//! No signing request travels with the payload: the caller names the
//! subject and SANs directly and the backend synthesizes key and signing
//! request on its side. The canonical model is built straight from the
//! explicit fields.

use serde::Deserialize;

use super::GatedCodec;
use crate::request::{CertRequest, effective_zone};
use crate::{Error, Result};

/// Fields the gateway reads from the managed-certificate payload.
#[derive(Debug, Deserialize)]
struct RequestCertificatePayload {
    #[serde(rename = "DomainName")]
    domain_name: Option<String>,
    #[serde(rename = "SubjectAlternativeNames", default)]
    subject_alternative_names: Vec<String>,
    #[serde(rename = "VenafiZone")]
    venafi_zone: Option<String>,
}

/// Decodes issuance requests whose signing request is service-generated.
#[derive(Debug, Default)]
pub struct ManagedCertificateCodec;

impl GatedCodec for ManagedCertificateCodec {
    fn decode(&self, payload: &[u8]) -> Result<CertRequest> {
        let payload: RequestCertificatePayload = serde_json::from_slice(payload)
            .map_err(|e| Error::MalformedPayload(format!("invalid certificate request: {e}")))?;

        let domain_name = payload
            .domain_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::MalformedPayload("DomainName is required".to_owned()))?;

        let zone = effective_zone(payload.venafi_zone.as_deref());

        Ok(CertRequest::service_generated(
            zone,
            domain_name,
            payload.subject_alternative_names,
        ))
    }
}
