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

//! D-Bus object exposing the boot control interface.

use tracing::{debug, info};
use zbus::{dbus_interface, Connection, ConnectionBuilder, DBusError};

use crate::backend;
use crate::boot_control::{BootControl, BootControlError};
use crate::error::BootControlServiceError;
use crate::merge_status::MergeStatus;
use crate::{BootControlOptions, Bus};

pub const SERVICE_NAME: &str = "io.edgehog.BootControl";
pub const OBJECT_PATH: &str = "/io/edgehog/BootControl";
pub const INTERFACE_NAME: &str = "io.edgehog.BootControl1";

/// Errors returned to the D-Bus clients.
#[derive(Debug, DBusError)]
#[dbus_error(prefix = "io.edgehog.BootControl1.Error")]
pub enum ServiceError {
    #[dbus_error(zbus_error)]
    ZBus(zbus::Error),
    /// The slot is out of the range supported by the library.
    InvalidSlot(String),
    /// The library failed to apply the change.
    CommandFailed(String),
}

impl From<BootControlError> for ServiceError {
    fn from(value: BootControlError) -> Self {
        let message = value.to_string();

        match value {
            BootControlError::InvalidSlot { .. } => ServiceError::InvalidSlot(message),
            BootControlError::CommandFailed => ServiceError::CommandFailed(message),
        }
    }
}

pub struct BootControlInterface {
    hal: BootControl,
}

impl BootControlInterface {
    pub fn new(hal: BootControl) -> Self {
        Self { hal }
    }
}

#[dbus_interface(name = "io.edgehog.BootControl1")]
impl BootControlInterface {
    fn get_active_boot_slot(&self) -> i32 {
        self.hal.get_active_boot_slot()
    }

    fn get_current_slot(&self) -> i32 {
        self.hal.get_current_slot()
    }

    fn get_number_slots(&self) -> i32 {
        self.hal.get_number_slots()
    }

    fn get_snapshot_merge_status(&self) -> i32 {
        self.hal.get_snapshot_merge_status().as_raw()
    }

    fn get_suffix(&self, slot: i32) -> String {
        self.hal.get_suffix(slot)
    }

    fn is_slot_bootable(&self, slot: i32) -> Result<bool, ServiceError> {
        self.hal.is_slot_bootable(slot).map_err(ServiceError::from)
    }

    fn is_slot_marked_successful(&self, slot: i32) -> Result<bool, ServiceError> {
        self.hal
            .is_slot_marked_successful(slot)
            .map_err(ServiceError::from)
    }

    fn mark_boot_successful(&self) -> Result<(), ServiceError> {
        debug!("marking boot successful");

        self.hal.mark_boot_successful().map_err(ServiceError::from)
    }

    fn set_active_boot_slot(&self, slot: i32) -> Result<(), ServiceError> {
        debug!("setting active boot slot {slot}");

        self.hal
            .set_active_boot_slot(slot)
            .map_err(ServiceError::from)
    }

    fn set_slot_as_unbootable(&self, slot: i32) -> Result<(), ServiceError> {
        debug!("setting slot {slot} as unbootable");

        self.hal
            .set_slot_as_unbootable(slot)
            .map_err(ServiceError::from)
    }

    fn set_snapshot_merge_status(&self, status: i32) -> Result<(), ServiceError> {
        let status = MergeStatus::from_raw(status);

        debug!("setting snapshot merge status {status}");

        self.hal
            .set_snapshot_merge_status(status)
            .map_err(ServiceError::from)
    }
}

/// Initializes the backend and registers the interface on the bus.
///
/// The backend is opened before connecting, if it fails nothing is registered.
pub async fn serve(options: &BootControlOptions) -> Result<Connection, BootControlServiceError> {
    let backend = backend::open(options.backend, &options.simulated)?;

    let interface = BootControlInterface::new(BootControl::new(backend));

    let register = |err| BootControlServiceError::Register {
        name: options.service_name.clone(),
        err,
    };

    let builder = match options.bus {
        Bus::System => ConnectionBuilder::system(),
        Bus::Session => ConnectionBuilder::session(),
    }
    .map_err(register)?;

    let connection = builder
        .name(options.service_name.as_str())
        .map_err(register)?
        .serve_at(OBJECT_PATH, interface)
        .map_err(register)?
        .build()
        .await
        .map_err(register)?;

    info!(
        "{INTERFACE_NAME} registered as {} on the {} bus",
        options.service_name, options.bus
    );

    Ok(connection)
}

#[cfg(test)]
mod tests {
    use crate::backend::{BackendError, BackendKind, SimulatedOptions};

    use super::*;

    #[test]
    fn convert_errors() {
        let err = ServiceError::from(BootControlError::InvalidSlot { slot: 3 });

        assert!(matches!(&err, ServiceError::InvalidSlot(msg) if msg == "Invalid slot 3"));
        assert_eq!(err.name().as_str(), "io.edgehog.BootControl1.Error.InvalidSlot");
        assert_eq!(err.description(), Some("Invalid slot 3"));

        let err = ServiceError::from(BootControlError::CommandFailed);

        assert!(matches!(&err, ServiceError::CommandFailed(msg) if msg == "Operation failed"));
        assert_eq!(
            err.name().as_str(),
            "io.edgehog.BootControl1.Error.CommandFailed"
        );
    }

    #[tokio::test]
    async fn backend_failure_prevents_registration() {
        let options = BootControlOptions {
            backend: BackendKind::Simulated,
            simulated: SimulatedOptions {
                slots: 2,
                current_slot: 7,
                state_file: None,
            },
            bus: Bus::Session,
            service_name: SERVICE_NAME.to_string(),
        };

        let Err(err) = serve(&options).await else {
            panic!("the service shouldn't be registered");
        };

        assert!(matches!(
            err,
            BootControlServiceError::Backend(BackendError::Config(_))
        ));
    }
}
