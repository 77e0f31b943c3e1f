//! Certgate Library
//!
//! Policy-gated certificate issuance gateway: an authorization checkpoint
//! between internal callers and a certificate-authority backend.
//!
//! # Pipeline
//!
//! - **Dispatch**: inbound requests are classified by a target header
//!   against a fixed operation registry
//! - **Decode**: gated operations are normalized into a canonical
//!   certificate-request model
//! - **Validate**: the request's zone policy is resolved and enforced,
//!   failing closed on violation
//! - **Forward**: approved requests reach the CA backend with their
//!   original payload; responses are relayed unmodified
//!
//! Pass-through operations skip the policy path; everything else fails
//! before the backend is contacted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod gateway;
pub mod operation;
pub mod policy;
pub mod request;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
