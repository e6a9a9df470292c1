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

//! Calls the boot control interface through the client proxy over a peer to peer connection.

use std::sync::Arc;

use boot_control_service::backend::simulated::SimulatedBackend;
use boot_control_service::backend::SimulatedOptions;
use boot_control_service::boot_control::BootControl;
use boot_control_service::merge_status::MergeStatus;
use boot_control_service::proxy::BootControlProxy;
use boot_control_service::service::{BootControlInterface, OBJECT_PATH};
use tokio::net::UnixStream;
use zbus::{CacheProperties, Connection, ConnectionBuilder, Guid};

struct TestConnections {
    _server: Connection,
    client: Connection,
}

impl TestConnections {
    async fn init(slots: u32, current_slot: u32) -> Self {
        let backend = SimulatedBackend::open(&SimulatedOptions {
            slots,
            current_slot,
            state_file: None,
        })
        .expect("failed to open the simulated backend");

        let interface = BootControlInterface::new(BootControl::new(Arc::new(backend)));

        let guid = Guid::generate();
        let (server_stream, client_stream) = UnixStream::pair().expect("failed to create socket");

        let server = ConnectionBuilder::unix_stream(server_stream)
            .server(&guid)
            .p2p()
            .serve_at(OBJECT_PATH, interface)
            .expect("failed to serve the interface")
            .build();

        let client = ConnectionBuilder::unix_stream(client_stream).p2p().build();

        let (server, client) =
            tokio::try_join!(server, client).expect("failed to establish the connection");

        Self {
            _server: server,
            client,
        }
    }

    async fn proxy(&self) -> BootControlProxy<'static> {
        BootControlProxy::builder(&self.client)
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .expect("failed to create proxy")
    }
}

fn assert_method_error(err: zbus::Error, name: &str, description: &str) {
    match err {
        zbus::Error::MethodError(err_name, desc, _) => {
            assert_eq!(err_name.as_str(), name);
            assert_eq!(desc.as_deref(), Some(description));
        }
        err => panic!("expected a method error, got {err:?}"),
    }
}

#[tokio::test]
async fn query_slots() {
    let connections = TestConnections::init(2, 1).await;
    let proxy = connections.proxy().await;

    assert_eq!(proxy.get_number_slots().await.unwrap(), 2);
    assert_eq!(proxy.get_current_slot().await.unwrap(), 1);
    assert_eq!(proxy.get_active_boot_slot().await.unwrap(), 1);
    assert_eq!(proxy.get_suffix(0).await.unwrap(), "_a");
    assert_eq!(proxy.get_suffix(1).await.unwrap(), "_b");
    assert_eq!(proxy.get_suffix(5).await.unwrap(), "");
    assert!(proxy.is_slot_bootable(0).await.unwrap());
    assert!(!proxy.is_slot_marked_successful(1).await.unwrap());
}

#[tokio::test]
async fn invalid_slot_errors() {
    let connections = TestConnections::init(2, 0).await;
    let proxy = connections.proxy().await;

    let err = proxy.is_slot_bootable(2).await.unwrap_err();
    assert_method_error(
        err,
        "io.edgehog.BootControl1.Error.InvalidSlot",
        "Invalid slot 2",
    );

    let err = proxy.is_slot_marked_successful(-1).await.unwrap_err();
    assert_method_error(
        err,
        "io.edgehog.BootControl1.Error.InvalidSlot",
        "Invalid slot -1",
    );

    let err = proxy.set_active_boot_slot(7).await.unwrap_err();
    assert_method_error(
        err,
        "io.edgehog.BootControl1.Error.CommandFailed",
        "Operation failed",
    );

    let err = proxy.set_slot_as_unbootable(7).await.unwrap_err();
    assert_method_error(
        err,
        "io.edgehog.BootControl1.Error.CommandFailed",
        "Operation failed",
    );
}

#[tokio::test]
async fn switch_slot_and_mark_successful() {
    let connections = TestConnections::init(2, 0).await;
    let proxy = connections.proxy().await;

    proxy.mark_boot_successful().await.unwrap();
    assert!(proxy.is_slot_marked_successful(0).await.unwrap());

    proxy.set_slot_as_unbootable(1).await.unwrap();
    assert!(!proxy.is_slot_bootable(1).await.unwrap());

    proxy.set_active_boot_slot(1).await.unwrap();
    assert_eq!(proxy.get_active_boot_slot().await.unwrap(), 1);
    assert!(proxy.is_slot_bootable(1).await.unwrap());
}

#[tokio::test]
async fn snapshot_merge_status() {
    let connections = TestConnections::init(2, 0).await;
    let proxy = connections.proxy().await;

    assert_eq!(
        proxy.get_snapshot_merge_status().await.unwrap(),
        MergeStatus::None.as_raw()
    );

    for status in MergeStatus::ALL {
        proxy
            .set_snapshot_merge_status(status.as_raw())
            .await
            .unwrap();

        assert_eq!(
            MergeStatus::from_raw(proxy.get_snapshot_merge_status().await.unwrap()),
            status
        );
    }

    // unrecognized ordinals are stored as none
    proxy
        .set_snapshot_merge_status(MergeStatus::Merging.as_raw())
        .await
        .unwrap();
    proxy.set_snapshot_merge_status(42).await.unwrap();

    assert_eq!(
        proxy.get_snapshot_merge_status().await.unwrap(),
        MergeStatus::None.as_raw()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls() {
    let connections = TestConnections::init(4, 0).await;
    let proxy = connections.proxy().await;

    let mut tasks = tokio::task::JoinSet::new();

    for slot in 0..4 {
        let proxy = proxy.clone();

        tasks.spawn(async move { (slot, proxy.get_suffix(slot).await) });
    }

    let mut suffixes = Vec::new();
    while let Some(res) = tasks.join_next().await {
        let (slot, suffix) = res.expect("task panicked");

        suffixes.push((slot, suffix.expect("call failed")));
    }

    suffixes.sort();

    assert_eq!(
        suffixes,
        [
            (0, "_a".to_string()),
            (1, "_b".to_string()),
            (2, "_c".to_string()),
            (3, "_d".to_string()),
        ]
    );
}
