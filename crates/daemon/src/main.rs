// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! freightd: the freight file-transfer daemon.

use freight_core::Settings;
use freight_daemon::{lifecycle, logging};

#[tokio::main]
async fn main() {
    let config_path = freight_daemon::env::config_path();
    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("freightd: cannot load {}: {error}", config_path.display());
            std::process::exit(2);
        }
    };

    let _log_guard = logging::init(&settings);

    let code = match lifecycle::startup(config_path, settings).await {
        Ok(daemon) => lifecycle::run(daemon).await,
        Err(error) => {
            tracing::error!(%error, "startup failed");
            1
        }
    };
    std::process::exit(code);
}
