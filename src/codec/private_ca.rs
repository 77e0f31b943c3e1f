//! Codec for the private-CA issuance operation.
//!
//! The native payload embeds a base64-encoded signing request (PEM or DER
//! after decoding). Subject and SAN fields are extracted from the parsed
//! signing request itself.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use super::GatedCodec;
use crate::request::{CertRequest, ParsedCsr, effective_zone};
use crate::{Error, Result};

/// Fields the gateway reads from the issuance payload. Everything else in
/// the native payload belongs to the backend and is forwarded untouched.
#[derive(Debug, Deserialize)]
struct IssueCertificatePayload {
    #[serde(rename = "Csr")]
    csr: Option<String>,
    #[serde(rename = "VenafiZone")]
    venafi_zone: Option<String>,
}

/// Decodes issuance requests that carry a caller-supplied signing request.
#[derive(Debug, Default)]
pub struct PrivateCaCodec;

impl GatedCodec for PrivateCaCodec {
    fn decode(&self, payload: &[u8]) -> Result<CertRequest> {
        let payload: IssueCertificatePayload = serde_json::from_slice(payload)
            .map_err(|e| Error::MalformedPayload(format!("invalid issuance payload: {e}")))?;

        let encoded = payload
            .csr
            .filter(|csr| !csr.is_empty())
            .ok_or_else(|| Error::InvalidEncoding("payload carries no Csr field".to_owned()))?;

        let decoded = BASE64
            .decode(encoded.as_bytes())
            .map_err(|_| Error::InvalidEncoding("Csr is not valid base64".to_owned()))?;

        let csr = ParsedCsr::parse(&decoded)?;
        let zone = effective_zone(payload.venafi_zone.as_deref());

        Ok(CertRequest::provided(zone, csr))
    }
}
