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

//! Boot control libraries the service forwards to.

use std::path::PathBuf;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

use crate::merge_status::LegacyMergeStatus;

#[cfg(feature = "qti")]
pub mod qti;
pub mod simulated;
#[cfg(any(feature = "qti", test))]
mod slot;

/// Primitive operations of a boot control library.
///
/// The return values keep the library conventions, the translation into the interface semantics
/// is done by [`BootControl`](crate::boot_control::BootControl):
///
/// - `is_*` queries return a negative value for an invalid slot, zero for false and a positive
///   value for true;
/// - mutators return zero on success;
/// - [`get_active_boot_slot`](BootControlBackend::get_active_boot_slot) is negative on error.
///
/// Implementations are shared between the IPC worker threads and must synchronize internally.
#[cfg_attr(test, automock)]
pub trait BootControlBackend: Send + Sync {
    fn get_active_boot_slot(&self) -> i32;
    fn get_current_slot(&self) -> i32;
    fn get_number_slots(&self) -> i32;
    fn get_snapshot_merge_status(&self) -> LegacyMergeStatus;
    fn get_suffix(&self, slot: i32) -> Option<String>;
    fn is_slot_bootable(&self, slot: i32) -> i32;
    fn is_slot_marked_successful(&self, slot: i32) -> i32;
    fn mark_boot_successful(&self) -> i32;
    fn set_active_boot_slot(&self, slot: i32) -> i32;
    fn set_slot_as_unbootable(&self, slot: i32) -> i32;
    fn set_snapshot_merge_status(&self, status: LegacyMergeStatus) -> bool;
}

/// Error returned while initializing a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("boot control library initialization failed")]
    Init,
    #[error("the {0} backend is not available in this build")]
    Unsupported(&'static str),
    #[error("invalid simulated backend configuration: {0}")]
    Config(String),
    #[error("couldn't access the state file {}", path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("couldn't decode the state file {}", path.display())]
    StateFormat {
        path: PathBuf,
        #[source]
        err: serde_json::Error,
    },
}

/// Library the service forwards the calls to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// In process slot metadata, optionally persisted to a state file.
    #[default]
    Simulated,
    /// Vendor `libboot_control_qti` library, requires the `qti` feature.
    Qti,
}

/// Options for the [`simulated`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulatedOptions {
    pub slots: u32,
    pub current_slot: u32,
    pub state_file: Option<PathBuf>,
}

impl Default for SimulatedOptions {
    fn default() -> Self {
        Self {
            slots: 2,
            current_slot: 0,
            state_file: None,
        }
    }
}

/// Initializes the configured backend.
///
/// This is the only place a backend is created, it must happen once before the service is
/// registered.
pub fn open(
    kind: BackendKind,
    simulated: &SimulatedOptions,
) -> Result<Arc<dyn BootControlBackend>, BackendError> {
    let backend: Arc<dyn BootControlBackend> = match kind {
        BackendKind::Simulated => Arc::new(simulated::SimulatedBackend::open(simulated)?),
        #[cfg(feature = "qti")]
        BackendKind::Qti => Arc::new(qti::QtiBackend::init()?),
        #[cfg(not(feature = "qti"))]
        BackendKind::Qti => return Err(BackendError::Unsupported("qti")),
    };

    Ok(backend)
}
