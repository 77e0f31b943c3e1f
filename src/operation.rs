//! Operation registry.
//!
//! Static mapping from inbound operation identifiers to their dispatch
//! behavior: gated operations carry a codec and require policy validation
//! before the backend sees them; pass-through operations are forwarded
//! untouched. Built once at startup and read-only afterwards, so adding an
//! operation is a table edit rather than new conditional logic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{GatedCodec, ManagedCertificateCodec, PrivateCaCodec};

/// Issue a certificate from the private CA with a caller-supplied CSR.
pub const ISSUE_PRIVATE_CA_CERTIFICATE: &str = "issue-private-ca-certificate";
/// Request a managed certificate; the backend synthesizes key and CSR.
pub const ISSUE_MANAGED_CERTIFICATE: &str = "issue-managed-certificate";
/// List the backend's certificate authorities.
pub const LIST_CERTIFICATE_AUTHORITIES: &str = "list-certificate-authorities";
/// Retrieve an issued certificate.
pub const GET_CERTIFICATE: &str = "get-certificate";

/// How an operation is dispatched.
pub enum OperationKind {
    /// Decode into the canonical model and validate against the zone policy
    /// before invoking the backend.
    Gated(Arc<dyn GatedCodec>),
    /// Forward to the backend unmodified; no policy involvement.
    PassThrough,
}

impl OperationKind {
    /// Whether this operation requires policy validation.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        matches!(self, Self::Gated(_))
    }
}

/// A registered operation.
pub struct OperationDescriptor {
    /// Operation identifier matched against the dispatch header.
    pub id: &'static str,
    /// Dispatch behavior.
    pub kind: OperationKind,
}

/// Fixed registry of known operations.
pub struct OperationRegistry {
    operations: HashMap<&'static str, OperationDescriptor>,
}

impl OperationRegistry {
    /// Build the registry with the full operation set.
    #[must_use]
    pub fn new() -> Self {
        let mut operations = HashMap::new();
        let mut register = |id: &'static str, kind: OperationKind| {
            operations.insert(id, OperationDescriptor { id, kind });
        };

        register(
            ISSUE_PRIVATE_CA_CERTIFICATE,
            OperationKind::Gated(Arc::new(PrivateCaCodec)),
        );
        register(
            ISSUE_MANAGED_CERTIFICATE,
            OperationKind::Gated(Arc::new(ManagedCertificateCodec)),
        );
        register(LIST_CERTIFICATE_AUTHORITIES, OperationKind::PassThrough);
        register(GET_CERTIFICATE, OperationKind::PassThrough);

        Self { operations }
    }

    /// Look up an operation by identifier.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<&OperationDescriptor> {
        self.operations.get(id)
    }

    /// Registered operation identifiers, for startup logging.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
