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

use std::path::Path;

use boot_control_service::backend::BackendKind;
use boot_control_service::service::SERVICE_NAME;
use boot_control_service::{BootControlOptions, Bus};
use serde::Deserialize;
use stable_eyre::eyre::{ensure, WrapErr};
use tracing::info;

use crate::cli::{Cli, OverrideOption, SimulatedArgs};

/// Configuration file
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub backend: Option<BackendKind>,
    pub bus: Option<Bus>,
    pub service_name: Option<String>,
    pub simulated: Option<SimulatedArgs>,
}

impl From<Config> for BootControlOptions {
    fn from(value: Config) -> Self {
        Self {
            backend: value.backend.unwrap_or_default(),
            simulated: value.simulated.unwrap_or_default().into(),
            bus: value.bus.unwrap_or_default(),
            service_name: value
                .service_name
                .unwrap_or_else(|| SERVICE_NAME.to_string()),
        }
    }
}

impl Config {
    fn merge(&mut self, cli: Cli) {
        self.backend.merge(cli.backend);
        self.bus.merge(cli.bus);
        self.service_name.merge(cli.service_name);

        if let Some(simulated) = &mut self.simulated {
            simulated.merge(cli.simulated);
        } else {
            self.simulated = Some(cli.simulated);
        }
    }
}

pub async fn read_options(cli: Cli) -> stable_eyre::Result<BootControlOptions> {
    let paths = [
        Path::new("boot-control-config.toml"),
        Path::new("/etc/edgehog/boot-control.toml"),
    ];

    if let Some(path) = &cli.config {
        ensure!(
            path.is_file(),
            "configuration file {} doesn't exists or is not a file",
            path.display()
        );
    }

    let path = cli
        .config
        .as_deref()
        .into_iter()
        .chain(paths)
        .find(|f| f.is_file())
        .map(Path::to_path_buf);

    let mut config = if let Some(path) = path {
        info!(config = %path.display(), "reading config file");

        let config = tokio::fs::read_to_string(&path).await?;

        toml::from_str(&config)
            .wrap_err_with(|| format!("invalid configuration file {}", path.display()))?
    } else {
        Config::default()
    };

    config.merge(cli);

    Ok(config.into())
}
