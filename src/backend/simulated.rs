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

//! Boot control backend keeping the slot metadata in process.
//!
//! Used on hosts without a vendor boot control library. The metadata can be persisted to a JSON
//! file so the active slot and the successful flags survive a restart of the service.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::merge_status::LegacyMergeStatus;

use super::{BackendError, BootControlBackend, SimulatedOptions};

/// Return value of the library for an invalid slot or a failed operation.
const FAILURE: i32 = -1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SlotMetadata {
    bootable: bool,
    successful: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SlotState {
    active_slot: Option<u32>,
    slots: Vec<SlotMetadata>,
    merge_status: LegacyMergeStatus,
}

impl SlotState {
    fn new(slots: u32, active_slot: u32) -> Self {
        let slots = (0..slots)
            .map(|_| SlotMetadata {
                bootable: true,
                successful: false,
            })
            .collect();

        Self {
            active_slot: Some(active_slot),
            slots,
            merge_status: LegacyMergeStatus::None,
        }
    }

    fn slot(&self, slot: i32) -> Option<&SlotMetadata> {
        usize::try_from(slot).ok().and_then(|idx| self.slots.get(idx))
    }

    fn slot_mut(&mut self, slot: i32) -> Option<&mut SlotMetadata> {
        usize::try_from(slot)
            .ok()
            .and_then(|idx| self.slots.get_mut(idx))
    }
}

pub struct SimulatedBackend {
    current_slot: u32,
    state: Mutex<SlotState>,
    state_file: Option<PathBuf>,
}

impl SimulatedBackend {
    pub fn open(options: &SimulatedOptions) -> Result<Self, BackendError> {
        if options.slots == 0 {
            return Err(BackendError::Config(
                "the number of slots must be greater than zero".to_string(),
            ));
        }

        if options.slots > 26 {
            return Err(BackendError::Config(format!(
                "at most 26 slots are supported, got {}",
                options.slots
            )));
        }

        if options.current_slot >= options.slots {
            return Err(BackendError::Config(format!(
                "current slot {} is out of range for {} slots",
                options.current_slot, options.slots
            )));
        }

        let state = match &options.state_file {
            Some(path) => Self::load_or_create(path, options)?,
            None => SlotState::new(options.slots, options.current_slot),
        };

        info!(
            slots = options.slots,
            current_slot = options.current_slot,
            "simulated boot control initialized"
        );

        Ok(Self {
            current_slot: options.current_slot,
            state: Mutex::new(state),
            state_file: options.state_file.clone(),
        })
    }

    fn load_or_create(path: &Path, options: &SimulatedOptions) -> Result<SlotState, BackendError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("state file {} doesn't exist, creating it", path.display());

                let state = SlotState::new(options.slots, options.current_slot);

                write_state(path, &state).map_err(|err| BackendError::StateIo {
                    path: path.to_path_buf(),
                    err,
                })?;

                return Ok(state);
            }
            Err(err) => {
                return Err(BackendError::StateIo {
                    path: path.to_path_buf(),
                    err,
                })
            }
        };

        let state: SlotState =
            serde_json::from_str(&content).map_err(|err| BackendError::StateFormat {
                path: path.to_path_buf(),
                err,
            })?;

        if state.slots.len() != options.slots as usize {
            return Err(BackendError::Config(format!(
                "state file {} has {} slots, expected {}",
                path.display(),
                state.slots.len(),
                options.slots
            )));
        }

        if let Some(active) = state.active_slot.filter(|active| *active >= options.slots) {
            return Err(BackendError::Config(format!(
                "state file {} has active slot {active}, out of range for {} slots",
                path.display(),
                options.slots
            )));
        }

        Ok(state)
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // The state is only replaced as a whole, a poisoned lock still holds a consistent value.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies the change to a copy of the state and commits it only once persisted.
    fn update<F>(&self, f: F) -> i32
    where
        F: FnOnce(&mut SlotState) -> bool,
    {
        let mut guard = self.lock();
        let mut state = guard.clone();

        if !f(&mut state) {
            return FAILURE;
        }

        if let Some(path) = &self.state_file {
            if let Err(err) = write_state(path, &state) {
                error!("couldn't write state file {}: {err}", path.display());

                return FAILURE;
            }
        }

        *guard = state;

        0
    }

    fn query<F>(&self, slot: i32, f: F) -> i32
    where
        F: FnOnce(&SlotMetadata) -> bool,
    {
        self.lock()
            .slot(slot)
            .map_or(FAILURE, |metadata| i32::from(f(metadata)))
    }
}

fn write_state(path: &Path, state: &SlotState) -> io::Result<()> {
    let data = serde_json::to_string(state)?;

    std::fs::write(path, data)
}

impl BootControlBackend for SimulatedBackend {
    fn get_active_boot_slot(&self) -> i32 {
        self.lock()
            .active_slot
            .and_then(|slot| i32::try_from(slot).ok())
            .unwrap_or(FAILURE)
    }

    fn get_current_slot(&self) -> i32 {
        self.current_slot as i32
    }

    fn get_number_slots(&self) -> i32 {
        self.lock().slots.len() as i32
    }

    fn get_snapshot_merge_status(&self) -> LegacyMergeStatus {
        self.lock().merge_status
    }

    fn get_suffix(&self, slot: i32) -> Option<String> {
        let state = self.lock();

        state.slot(slot)?;

        let idx = u8::try_from(slot).ok()?;

        Some(format!("_{}", char::from(b'a' + idx)))
    }

    fn is_slot_bootable(&self, slot: i32) -> i32 {
        self.query(slot, |metadata| metadata.bootable)
    }

    fn is_slot_marked_successful(&self, slot: i32) -> i32 {
        self.query(slot, |metadata| metadata.successful)
    }

    fn mark_boot_successful(&self) -> i32 {
        let current = self.current_slot as i32;

        self.update(|state| {
            let Some(metadata) = state.slot_mut(current) else {
                return false;
            };

            metadata.successful = true;

            true
        })
    }

    fn set_active_boot_slot(&self, slot: i32) -> i32 {
        self.update(|state| {
            let Some(metadata) = state.slot_mut(slot) else {
                return false;
            };

            metadata.bootable = true;
            metadata.successful = false;

            state.active_slot = u32::try_from(slot).ok();

            true
        })
    }

    fn set_slot_as_unbootable(&self, slot: i32) -> i32 {
        self.update(|state| {
            let Some(metadata) = state.slot_mut(slot) else {
                return false;
            };

            metadata.bootable = false;
            metadata.successful = false;

            true
        })
    }

    fn set_snapshot_merge_status(&self, status: LegacyMergeStatus) -> bool {
        self.update(|state| {
            state.merge_status = status;

            true
        }) == 0
    }
}
