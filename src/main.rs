//! Certgate - policy-gated certificate issuance gateway
//!
//! Validates CA requests against named zone policies before forwarding.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use certgate::{
    cli::{Cli, Command},
    config::Config,
    gateway::Gateway,
    policy::{ConfigPolicyStore, PolicyStore},
    request::{CertRequest, ParsedCsr},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Handle subcommands
    match cli.command {
        Some(Command::Check { ref zone, ref csr }) => {
            run_check(cli.config.as_deref(), zone, csr).await
        }
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

/// Run the gateway server
async fn run_server(cli: Cli) -> ExitCode {
    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            // Apply CLI overrides
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        zones = config.policy.zones.len(),
        backend = %config.backend.url,
        "Starting certgate"
    );

    // Create and run gateway
    let gateway = match Gateway::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Run with graceful shutdown
    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}

/// Validate a signing request file against a zone policy without touching
/// any backend
async fn run_check(config_path: Option<&Path>, zone: &str, csr_path: &Path) -> ExitCode {
    let config = match Config::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let bytes = match std::fs::read(csr_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {e}", csr_path.display());
            return ExitCode::FAILURE;
        }
    };

    let parsed = match ParsedCsr::parse(&bytes) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("❌ Failed to parse signing request: {e}");
            return ExitCode::FAILURE;
        }
    };

    let common_name = parsed.subject.common_name.clone();
    let sans = parsed.san_dns_names.clone();
    let request = CertRequest::provided(zone.to_owned(), parsed);

    let store = ConfigPolicyStore::from_config(&config.policy);
    let policy = match store.resolve(zone).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    match policy.validate(&request) {
        Ok(()) => {
            println!("✅ CN={common_name} - permitted by zone {zone}");
            if !sans.is_empty() {
                println!("   SANs: {}", sans.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Rejected: {e}");
            ExitCode::FAILURE
        }
    }
}
