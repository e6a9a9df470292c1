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

//! Client side of the boot control interface.

use zbus::dbus_proxy;

#[dbus_proxy(
    interface = "io.edgehog.BootControl1",
    default_service = "io.edgehog.BootControl",
    default_path = "/io/edgehog/BootControl"
)]
trait BootControl {
    /// Slot that will be booted next, 0 if the library reports an error.
    fn get_active_boot_slot(&self) -> zbus::Result<i32>;

    /// Slot the system is running from.
    fn get_current_slot(&self) -> zbus::Result<i32>;

    fn get_number_slots(&self) -> zbus::Result<i32>;

    /// Ordinal of the [`MergeStatus`](crate::merge_status::MergeStatus).
    fn get_snapshot_merge_status(&self) -> zbus::Result<i32>;

    /// Suffix of the slot partitions, empty for an invalid slot.
    fn get_suffix(&self, slot: i32) -> zbus::Result<String>;

    fn is_slot_bootable(&self, slot: i32) -> zbus::Result<bool>;

    fn is_slot_marked_successful(&self, slot: i32) -> zbus::Result<bool>;

    fn mark_boot_successful(&self) -> zbus::Result<()>;

    fn set_active_boot_slot(&self, slot: i32) -> zbus::Result<()>;

    fn set_slot_as_unbootable(&self, slot: i32) -> zbus::Result<()>;

    fn set_snapshot_merge_status(&self, status: i32) -> zbus::Result<()>;
}
