// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use fep_server::{
    config::{log_format_from_env, FormsConfig},
    forms::{router, FormsState},
    logging::init_tracing,
    server::{serve, shutdown_on_signal},
};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(log_format_from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Form relay failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FormsConfig::from_env()?;
    let state = FormsState::from_config(&config)?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        public_base_url = %config.public_base_url,
        "Starting form relay"
    );

    serve(config.bind_addr, router(state), shutdown_on_signal()).await?;
    Ok(())
}
