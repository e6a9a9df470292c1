// This file is part of Edgehog.
//
// Copyright 2024 SECO Mind Srl
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use boot_control_service::service::{self, INTERFACE_NAME};
use clap::Parser;
use stable_eyre::eyre::WrapErr;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use self::cli::Cli;
use self::config::read_options;

mod cli;
mod config;

#[tokio::main]
async fn main() -> stable_eyre::Result<()> {
    stable_eyre::install()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()?;

    let cli = Cli::parse();

    let options = read_options(cli).await?;

    // The backend is initialized before registering, a failure terminates the process.
    let _conn = match service::serve(&options).await {
        Ok(conn) => conn,
        Err(err) => {
            #[cfg(feature = "systemd")]
            boot_control_service::systemd_wrapper::notify_failure(&err.to_string());

            return Err(err).wrap_err("couldn't start the boot control service");
        }
    };

    info!("{INTERFACE_NAME} service running...");

    #[cfg(feature = "systemd")]
    boot_control_service::systemd_wrapper::notify_ready("Boot control service running");

    tokio::signal::ctrl_c().await?;

    info!("{} stopped", options.service_name);

    Ok(())
}
