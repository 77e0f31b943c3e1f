//! Per-operation payload codecs.
//!
//! Each gated operation has a codec translating its backend-native JSON
//! payload into the canonical [`CertRequest`] the policy validator
//! consumes. Decoding is pure: no backend or policy-store contact, no side
//! effects. Codecs read only the fields they need and ignore the rest of
//! the native payload, which is forwarded to the backend untouched.
//!
//! Encoding the success path is the identity on the backend's JSON —
//! [`encode_response`] serializes the backend result without semantic
//! transformation. Error envelopes are produced by the response formatter
//! in the router.

mod managed;
mod private_ca;

pub use managed::ManagedCertificateCodec;
pub use private_ca::PrivateCaCodec;

use serde_json::Value;

use crate::request::CertRequest;
use crate::{Error, Result};

/// Decoder for a gated operation's native payload.
pub trait GatedCodec: Send + Sync {
    /// Decode a native payload into the canonical request model.
    ///
    /// # Errors
    ///
    /// `Error::MalformedPayload` when the body is not valid structured data
    /// for the operation, `Error::InvalidEncoding` when an embedded signing
    /// request fails base64 decoding, `Error::InvalidSigningRequest` when
    /// decoded bytes are not a well-formed signing request.
    fn decode(&self, payload: &[u8]) -> Result<CertRequest>;
}

/// Serialize a backend result for the caller, one-to-one.
pub fn encode_response(result: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec(result).map_err(|e| Error::ResponseEncoding(e.to_string()))
}
