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

//! Translation between the boot control interface and the backend library.

use std::sync::Arc;

use crate::backend::BootControlBackend;
use crate::merge_status::{LegacyMergeStatus, MergeStatus};

/// Errors returned by the boot control interface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootControlError {
    #[error("Invalid slot {slot}")]
    InvalidSlot { slot: i32 },
    #[error("Operation failed")]
    CommandFailed,
}

impl BootControlError {
    pub const COMMAND_FAILED: i32 = -1;
    pub const INVALID_SLOT: i32 = -2;

    /// Service specific error code of the interface.
    pub fn code(&self) -> i32 {
        match self {
            BootControlError::InvalidSlot { .. } => Self::INVALID_SLOT,
            BootControlError::CommandFailed => Self::COMMAND_FAILED,
        }
    }
}

/// Boot control interface implemented on a [`BootControlBackend`].
///
/// Holds no state, every call is forwarded to the backend.
#[derive(Clone)]
pub struct BootControl {
    backend: Arc<dyn BootControlBackend>,
}

impl BootControl {
    pub fn new(backend: Arc<dyn BootControlBackend>) -> Self {
        Self { backend }
    }

    /// Returns slot 0 if the library reports an error.
    pub fn get_active_boot_slot(&self) -> i32 {
        let slot = self.backend.get_active_boot_slot();

        if slot < 0 {
            0
        } else {
            slot
        }
    }

    pub fn get_current_slot(&self) -> i32 {
        self.backend.get_current_slot()
    }

    pub fn get_number_slots(&self) -> i32 {
        self.backend.get_number_slots()
    }

    pub fn get_snapshot_merge_status(&self) -> MergeStatus {
        self.backend.get_snapshot_merge_status().into()
    }

    /// Returns an empty string for a slot without suffix, invalid slots included.
    pub fn get_suffix(&self, slot: i32) -> String {
        self.backend.get_suffix(slot).unwrap_or_default()
    }

    pub fn is_slot_bootable(&self, slot: i32) -> Result<bool, BootControlError> {
        tri_state(slot, self.backend.is_slot_bootable(slot))
    }

    pub fn is_slot_marked_successful(&self, slot: i32) -> Result<bool, BootControlError> {
        tri_state(slot, self.backend.is_slot_marked_successful(slot))
    }

    pub fn mark_boot_successful(&self) -> Result<(), BootControlError> {
        command(self.backend.mark_boot_successful())
    }

    pub fn set_active_boot_slot(&self, slot: i32) -> Result<(), BootControlError> {
        command(self.backend.set_active_boot_slot(slot))
    }

    pub fn set_slot_as_unbootable(&self, slot: i32) -> Result<(), BootControlError> {
        command(self.backend.set_slot_as_unbootable(slot))
    }

    pub fn set_snapshot_merge_status(&self, status: MergeStatus) -> Result<(), BootControlError> {
        if self
            .backend
            .set_snapshot_merge_status(LegacyMergeStatus::from(status))
        {
            Ok(())
        } else {
            Err(BootControlError::CommandFailed)
        }
    }
}

fn tri_state(slot: i32, ret: i32) -> Result<bool, BootControlError> {
    if ret < 0 {
        return Err(BootControlError::InvalidSlot { slot });
    }

    Ok(ret > 0)
}

fn command(ret: i32) -> Result<(), BootControlError> {
    if ret == 0 {
        Ok(())
    } else {
        Err(BootControlError::CommandFailed)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate;

    use super::*;
    use crate::backend::MockBootControlBackend;

    fn boot_control(mock: MockBootControlBackend) -> BootControl {
        BootControl::new(Arc::new(mock))
    }

    #[test]
    fn active_boot_slot_falls_back_to_zero() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_get_active_boot_slot().once().return_const(-1);

        assert_eq!(boot_control(mock).get_active_boot_slot(), 0);

        let mut mock = MockBootControlBackend::new();
        mock.expect_get_active_boot_slot().once().return_const(3);

        assert_eq!(boot_control(mock).get_active_boot_slot(), 3);
    }

    #[test]
    fn slot_counters_are_forwarded() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_get_current_slot().once().return_const(1);
        mock.expect_get_number_slots().once().return_const(2);

        let hal = boot_control(mock);

        assert_eq!(hal.get_current_slot(), 1);
        assert_eq!(hal.get_number_slots(), 2);
    }

    #[test]
    fn suffix_empty_when_missing() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_get_suffix()
            .with(predicate::eq(5))
            .once()
            .returning(|_| None);
        mock.expect_get_suffix()
            .with(predicate::eq(1))
            .once()
            .returning(|_| Some("_b".to_string()));

        let hal = boot_control(mock);

        assert_eq!(hal.get_suffix(5), "");
        assert_eq!(hal.get_suffix(1), "_b");
    }

    #[test]
    fn suffix_empty_string_is_forwarded() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_get_suffix()
            .once()
            .returning(|_| Some(String::new()));

        assert_eq!(boot_control(mock).get_suffix(5), "");
    }

    #[test]
    fn slot_bootable_tri_state() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_is_slot_bootable()
            .with(predicate::eq(2))
            .once()
            .return_const(-1);

        let err = boot_control(mock).is_slot_bootable(2).unwrap_err();

        assert_eq!(err, BootControlError::InvalidSlot { slot: 2 });
        assert_eq!(err.to_string(), "Invalid slot 2");
        assert_eq!(err.code(), BootControlError::INVALID_SLOT);

        for (ret, expected) in [(0, false), (1, true), (7, true)] {
            let mut mock = MockBootControlBackend::new();
            mock.expect_is_slot_bootable().once().return_const(ret);

            assert_eq!(boot_control(mock).is_slot_bootable(0), Ok(expected));
        }
    }

    #[test]
    fn slot_marked_successful_tri_state() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_is_slot_marked_successful()
            .with(predicate::eq(4))
            .once()
            .return_const(-22);

        let err = boot_control(mock).is_slot_marked_successful(4).unwrap_err();

        assert_eq!(err.to_string(), "Invalid slot 4");

        for (ret, expected) in [(0, false), (1, true)] {
            let mut mock = MockBootControlBackend::new();
            mock.expect_is_slot_marked_successful()
                .once()
                .return_const(ret);

            assert_eq!(boot_control(mock).is_slot_marked_successful(1), Ok(expected));
        }
    }

    #[test]
    fn mark_boot_successful_result() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_mark_boot_successful().once().return_const(0);

        assert_eq!(boot_control(mock).mark_boot_successful(), Ok(()));

        let mut mock = MockBootControlBackend::new();
        mock.expect_mark_boot_successful().once().return_const(1);

        let err = boot_control(mock).mark_boot_successful().unwrap_err();

        assert_eq!(err, BootControlError::CommandFailed);
        assert_eq!(err.to_string(), "Operation failed");
        assert_eq!(err.code(), BootControlError::COMMAND_FAILED);
    }

    #[test]
    fn slot_mutators_result() {
        let mut mock = MockBootControlBackend::new();
        mock.expect_set_active_boot_slot()
            .with(predicate::eq(1))
            .once()
            .return_const(0);
        mock.expect_set_slot_as_unbootable()
            .with(predicate::eq(0))
            .once()
            .return_const(0);

        let hal = boot_control(mock);

        assert_eq!(hal.set_active_boot_slot(1), Ok(()));
        assert_eq!(hal.set_slot_as_unbootable(0), Ok(()));

        let mut mock = MockBootControlBackend::new();
        mock.expect_set_active_boot_slot().once().return_const(-1);
        mock.expect_set_slot_as_unbootable().once().return_const(-22);

        let hal = boot_control(mock);

        // invalid slots are reported as a failed command by the mutators
        assert_eq!(
            hal.set_active_boot_slot(9),
            Err(BootControlError::CommandFailed)
        );
        assert_eq!(
            hal.set_slot_as_unbootable(9),
            Err(BootControlError::CommandFailed)
        );
    }

    #[test]
    fn merge_status_is_translated() {
        for status in MergeStatus::ALL {
            let mut mock = MockBootControlBackend::new();
            mock.expect_get_snapshot_merge_status()
                .once()
                .return_const(LegacyMergeStatus::from(status));

            assert_eq!(boot_control(mock).get_snapshot_merge_status(), status);
        }
    }

    #[test]
    fn set_merge_status_passes_the_legacy_value() {
        for status in MergeStatus::ALL {
            let mut mock = MockBootControlBackend::new();
            mock.expect_set_snapshot_merge_status()
                .with(predicate::eq(LegacyMergeStatus::from(status)))
                .once()
                .return_const(true);

            assert_eq!(boot_control(mock).set_snapshot_merge_status(status), Ok(()));
        }
    }

    #[test]
    fn set_merge_status_failure() {
        for status in MergeStatus::ALL {
            let mut mock = MockBootControlBackend::new();
            mock.expect_set_snapshot_merge_status()
                .once()
                .return_const(false);

            assert_eq!(
                boot_control(mock).set_snapshot_merge_status(status),
                Err(BootControlError::CommandFailed)
            );
        }
    }
}
