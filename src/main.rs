// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use fep_server::{
    api::router,
    config::{log_format_from_env, FepConfig},
    logging::init_tracing,
    registry::publish_api_spec,
    server::{serve, shutdown_on_signal},
    state::AppState,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(log_format_from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "FEP service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FepConfig::from_env()?;
    let state = AppState::from_config(&config)?;

    if config.seed_demo_users {
        state.seed_demo_users().await?;
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        issuer = %config.issuer_did,
        "Starting FEP service (docs at /docs)"
    );

    let registry_config = config.clone();
    tokio::spawn(async move { publish_api_spec(&registry_config).await });

    serve(config.bind_addr, router(state), shutdown_on_signal()).await?;
    Ok(())
}
