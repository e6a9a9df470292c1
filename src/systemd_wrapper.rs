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

//! Service status notifications to systemd

use std::io;

use systemd::daemon;
use systemd::daemon::{STATE_READY, STATE_STATUS};
use tracing::{debug, error};

/// `sd_notify` returns zero when systemd couldn't be contacted and a negative errno on failure.
fn check_notify_result(notify: Result<bool, io::Error>) {
    match notify {
        Ok(true) => {}
        Ok(false) => {
            debug!("systemd not notified, the service is not supervised");
        }
        Err(err) => {
            error!("couldn't notify status to systemd: {err}");
        }
    }
}

/// Notify that the interface is registered and serving calls.
pub fn notify_ready(status: &str) {
    let pairs = [(STATE_READY, "1"), (STATE_STATUS, status)];

    check_notify_result(daemon::notify(false, pairs.iter()));
}

/// Notify the reason the service couldn't start, before exiting.
pub fn notify_failure(status: &str) {
    let pairs = [(STATE_STATUS, status)];

    check_notify_result(daemon::notify(false, pairs.iter()));
}
