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

//! Binding to the vendor `libboot_control_qti` library.

use std::ffi::{c_char, c_int, c_uint, CStr};

use tracing::info;

use crate::merge_status::LegacyMergeStatus;

use super::slot::to_slot;
use super::{BackendError, BootControlBackend};

/// Value the library returns for an invalid slot or a failed operation.
const FAILURE: i32 = -1;

#[link(name = "boot_control_qti")]
extern "C" {
    fn bootcontrol_init() -> bool;
    fn get_number_slots() -> c_uint;
    fn get_current_slot() -> c_uint;
    fn get_active_boot_slot() -> c_int;
    fn mark_boot_successful() -> c_int;
    fn set_active_boot_slot(slot: c_uint) -> c_int;
    fn set_slot_as_unbootable(slot: c_uint) -> c_int;
    fn is_slot_bootable(slot: c_uint) -> c_int;
    fn is_slot_marked_successful(slot: c_uint) -> c_int;
    fn get_suffix(slot: c_uint) -> *const c_char;
    fn set_snapshot_merge_status(status: c_int) -> bool;
    fn get_snapshot_merge_status() -> c_int;
}

/// Handle to the process global library state.
///
/// Can only be obtained through [`QtiBackend::init`], so every call is made on an initialized
/// library.
pub struct QtiBackend {
    _initialized: (),
}

impl QtiBackend {
    pub fn init() -> Result<Self, BackendError> {
        // SAFETY: takes no arguments, the library initializes its own global state.
        let ok = unsafe { bootcontrol_init() };

        if !ok {
            return Err(BackendError::Init);
        }

        info!("boot control library initialized");

        Ok(Self { _initialized: () })
    }
}

impl BootControlBackend for QtiBackend {
    fn get_active_boot_slot(&self) -> i32 {
        // SAFETY: the library was initialized in `init`.
        unsafe { get_active_boot_slot() }
    }

    fn get_current_slot(&self) -> i32 {
        // SAFETY: the library was initialized in `init`.
        let slot = unsafe { get_current_slot() };

        i32::try_from(slot).unwrap_or(FAILURE)
    }

    fn get_number_slots(&self) -> i32 {
        // SAFETY: the library was initialized in `init`.
        let slots = unsafe { get_number_slots() };

        i32::try_from(slots).unwrap_or(FAILURE)
    }

    fn get_snapshot_merge_status(&self) -> LegacyMergeStatus {
        // SAFETY: the library was initialized in `init`.
        let raw = unsafe { get_snapshot_merge_status() };

        LegacyMergeStatus::from_raw(raw)
    }

    fn get_suffix(&self, slot: i32) -> Option<String> {
        let slot = to_slot(slot)?;

        // SAFETY: the library was initialized in `init`.
        let suffix = unsafe { get_suffix(slot) };

        if suffix.is_null() {
            return None;
        }

        // SAFETY: a non null suffix points to a static nul terminated string owned by the library.
        let suffix = unsafe { CStr::from_ptr(suffix) };

        Some(suffix.to_string_lossy().into_owned())
    }

    fn is_slot_bootable(&self, slot: i32) -> i32 {
        let Some(slot) = to_slot(slot) else {
            return FAILURE;
        };

        // SAFETY: the library was initialized in `init`.
        unsafe { is_slot_bootable(slot) }
    }

    fn is_slot_marked_successful(&self, slot: i32) -> i32 {
        let Some(slot) = to_slot(slot) else {
            return FAILURE;
        };

        // SAFETY: the library was initialized in `init`.
        unsafe { is_slot_marked_successful(slot) }
    }

    fn mark_boot_successful(&self) -> i32 {
        // SAFETY: the library was initialized in `init`.
        unsafe { mark_boot_successful() }
    }

    fn set_active_boot_slot(&self, slot: i32) -> i32 {
        let Some(slot) = to_slot(slot) else {
            return FAILURE;
        };

        // SAFETY: the library was initialized in `init`.
        unsafe { set_active_boot_slot(slot) }
    }

    fn set_slot_as_unbootable(&self, slot: i32) -> i32 {
        let Some(slot) = to_slot(slot) else {
            return FAILURE;
        };

        // SAFETY: the library was initialized in `init`.
        unsafe { set_slot_as_unbootable(slot) }
    }

    fn set_snapshot_merge_status(&self, status: LegacyMergeStatus) -> bool {
        // SAFETY: the library was initialized in `init`.
        unsafe { set_snapshot_merge_status(status.as_raw()) }
    }
}
