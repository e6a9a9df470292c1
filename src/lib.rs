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

//! Boot control service.
//!
//! Exposes the A/B slot selection and the snapshot merge status of a boot control library on
//! D-Bus. The service holds no boot control logic, every call is forwarded to the configured
//! [`backend`].

use std::fmt::Display;

use serde::Deserialize;

pub mod backend;
pub mod boot_control;
pub mod error;
pub mod merge_status;
pub mod proxy;
pub mod service;
#[cfg(feature = "systemd")]
pub mod systemd_wrapper;

/// Message bus the service is registered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Bus {
    #[default]
    System,
    Session,
}

impl Display for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bus::System => write!(f, "system"),
            Bus::Session => write!(f, "session"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootControlOptions {
    pub backend: backend::BackendKind,
    pub simulated: backend::SimulatedOptions,
    pub bus: Bus,
    pub service_name: String,
}

impl Default for BootControlOptions {
    fn default() -> Self {
        Self {
            backend: backend::BackendKind::default(),
            simulated: backend::SimulatedOptions::default(),
            bus: Bus::default(),
            service_name: service::SERVICE_NAME.to_string(),
        }
    }
}
