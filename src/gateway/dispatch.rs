//! Request dispatch and policy enforcement.
//!
//! The dispatcher is the gateway's trust boundary: for gated operations the
//! inbound payload is decoded into the canonical model, the zone policy is
//! resolved and evaluated, and only an approved request reaches the
//! backend — carrying the caller's *original* payload, never a re-encoding
//! of the canonical form. Pass-through operations skip the policy path
//! entirely. The dispatcher holds no per-request state and is safe to share
//! behind an `Arc`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::CaBackend;
use crate::operation::{OperationKind, OperationRegistry};
use crate::policy::PolicyStore;
use crate::{Error, Result};

/// Orchestrates codec → policy → backend for each inbound request.
pub struct Dispatcher {
    registry: OperationRegistry,
    policies: Arc<dyn PolicyStore>,
    backend: Arc<dyn CaBackend>,
}

impl Dispatcher {
    /// Wire the dispatcher to its collaborators.
    #[must_use]
    pub fn new(policies: Arc<dyn PolicyStore>, backend: Arc<dyn CaBackend>) -> Self {
        Self {
            registry: OperationRegistry::new(),
            policies,
            backend,
        }
    }

    /// The operation registry, for startup logging.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Dispatch one inbound request.
    ///
    /// # Errors
    ///
    /// Any pipeline failure per the error taxonomy; every error is terminal
    /// and no failure is retried. Policy violations and malformed input
    /// never reach the backend.
    pub async fn dispatch(&self, operation: &str, payload: &[u8]) -> Result<Value> {
        let Some(descriptor) = self.registry.resolve(operation) else {
            warn!(operation = %operation, "Rejected unknown operation");
            return Err(Error::UnsupportedOperation(operation.to_owned()));
        };

        match &descriptor.kind {
            OperationKind::Gated(codec) => {
                let request = codec.decode(payload)?;
                debug!(
                    operation = descriptor.id,
                    zone = %request.zone,
                    common_name = %request.subject().common_name,
                    sans = request.san_dns_names().len(),
                    "Decoded gated request"
                );

                let policy = self.policies.resolve(&request.zone).await?;
                if let Err(verdict) = policy.validate(&request) {
                    warn!(
                        operation = descriptor.id,
                        zone = %request.zone,
                        reason = %verdict,
                        "Request rejected by zone policy"
                    );
                    return Err(verdict);
                }

                info!(
                    operation = descriptor.id,
                    zone = %request.zone,
                    "Request approved by zone policy"
                );
                self.backend.invoke(descriptor.id, payload).await
            }
            OperationKind::PassThrough => {
                debug!(operation = descriptor.id, "Forwarding pass-through operation");
                self.backend.invoke(descriptor.id, payload).await
            }
        }
    }
}
