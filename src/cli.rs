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

//! Command Line options

use std::path::PathBuf;

use boot_control_service::backend::{BackendKind, SimulatedOptions};
use boot_control_service::Bus;
use clap::{Args, Parser};
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    display_name = "Boot Control Service",
    long_about = env!("CARGO_PKG_DESCRIPTION"),
    version
)]
pub struct Cli {
    /// Override configuration file path
    #[arg(short, long, env = "BOOT_CONTROL_CONFIG")]
    pub config: Option<PathBuf>,
    /// Boot control library the calls are forwarded to.
    #[arg(short, long, env = "BOOT_CONTROL_BACKEND")]
    pub backend: Option<BackendKind>,
    /// Message bus the service is registered on.
    #[arg(long, env = "BOOT_CONTROL_BUS")]
    pub bus: Option<Bus>,
    /// Well-known name requested on the bus.
    #[arg(short = 'n', long, env = "BOOT_CONTROL_SERVICE_NAME")]
    pub service_name: Option<String>,

    #[command(flatten)]
    pub simulated: SimulatedArgs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Deserialize)]
#[command(next_help_heading = "Simulated Backend Options")]
pub struct SimulatedArgs {
    /// Number of boot slots.
    #[arg(long, env = "BOOT_CONTROL_SLOTS")]
    pub slots: Option<u32>,
    /// Slot the system is running from.
    #[arg(long, env = "BOOT_CONTROL_CURRENT_SLOT")]
    pub current_slot: Option<u32>,
    /// JSON file the slot metadata is persisted to.
    #[arg(long, env = "BOOT_CONTROL_STATE_FILE")]
    pub state_file: Option<PathBuf>,
}

impl SimulatedArgs {
    pub fn merge(&mut self, other: Self) {
        self.slots.merge(other.slots);
        self.current_slot.merge(other.current_slot);
        self.state_file.merge(other.state_file);
    }
}

impl From<SimulatedArgs> for SimulatedOptions {
    fn from(value: SimulatedArgs) -> Self {
        let default = SimulatedOptions::default();

        Self {
            slots: value.slots.unwrap_or(default.slots),
            current_slot: value.current_slot.unwrap_or(default.current_slot),
            state_file: value.state_file,
        }
    }
}

pub trait OverrideOption {
    fn merge(&mut self, value: Self);
}

impl<T> OverrideOption for Option<T> {
    fn merge(&mut self, value: Self) {
        if value.is_some() {
            *self = value;
        }
    }
}
