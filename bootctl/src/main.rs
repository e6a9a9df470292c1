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

//! Command line client of the boot control service.

use std::process::ExitCode;

use boot_control_service::merge_status::MergeStatus;
use boot_control_service::proxy::BootControlProxy;
use boot_control_service::service::SERVICE_NAME;
use clap::{Parser, Subcommand};
use stable_eyre::eyre::WrapErr;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zbus::{CacheProperties, Connection};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Connect to the session bus instead of the system bus.
    #[arg(long)]
    session: bool,
    /// Well-known name of the boot control service.
    #[arg(short = 'n', long, env = "BOOT_CONTROL_SERVICE_NAME", default_value = SERVICE_NAME)]
    service_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints the slot that will be booted next.
    GetActiveBootSlot,
    /// Prints the slot the system is running from.
    GetCurrentSlot,
    /// Prints the number of slots.
    GetNumberSlots,
    /// Prints the snapshot merge status.
    GetSnapshotMergeStatus,
    /// Prints the suffix of a slot, empty for an invalid slot.
    GetSuffix { slot: i32 },
    /// Exits with 0 if the slot is bootable, 1 otherwise.
    IsSlotBootable { slot: i32 },
    /// Exits with 0 if the slot is marked as successful, 1 otherwise.
    IsSlotMarkedSuccessful { slot: i32 },
    /// Marks the running slot as successfully booted.
    MarkBootSuccessful,
    /// Sets the slot to boot next.
    SetActiveBootSlot { slot: i32 },
    /// Marks the slot as unbootable.
    SetSlotAsUnbootable { slot: i32 },
    /// Sets the snapshot merge status.
    SetSnapshotMergeStatus {
        /// One of none, unknown, snapshotted, merging or cancelled.
        status: MergeStatus,
    },
}

impl Command {
    async fn run(self, proxy: &BootControlProxy<'_>) -> zbus::Result<ExitCode> {
        match self {
            Command::GetActiveBootSlot => println!("{}", proxy.get_active_boot_slot().await?),
            Command::GetCurrentSlot => println!("{}", proxy.get_current_slot().await?),
            Command::GetNumberSlots => println!("{}", proxy.get_number_slots().await?),
            Command::GetSnapshotMergeStatus => {
                let status = MergeStatus::from_raw(proxy.get_snapshot_merge_status().await?);

                println!("{status}");
            }
            Command::GetSuffix { slot } => println!("{}", proxy.get_suffix(slot).await?),
            Command::IsSlotBootable { slot } => {
                return Ok(exit_code(proxy.is_slot_bootable(slot).await?));
            }
            Command::IsSlotMarkedSuccessful { slot } => {
                return Ok(exit_code(proxy.is_slot_marked_successful(slot).await?));
            }
            Command::MarkBootSuccessful => proxy.mark_boot_successful().await?,
            Command::SetActiveBootSlot { slot } => proxy.set_active_boot_slot(slot).await?,
            Command::SetSlotAsUnbootable { slot } => proxy.set_slot_as_unbootable(slot).await?,
            Command::SetSnapshotMergeStatus { status } => {
                proxy.set_snapshot_merge_status(status.as_raw()).await?
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

fn exit_code(value: bool) -> ExitCode {
    if value {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> stable_eyre::Result<ExitCode> {
    stable_eyre::install()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .try_init()?;

    let Cli {
        session,
        service_name,
        command,
    } = Parser::parse();

    let connection = if session {
        Connection::session().await?
    } else {
        Connection::system().await?
    };

    let proxy = BootControlProxy::builder(&connection)
        .destination(service_name.as_str())?
        .cache_properties(CacheProperties::No)
        .build()
        .await?;

    debug!(?command, "calling {service_name}");

    let code = command
        .run(&proxy)
        .await
        .wrap_err("boot control call failed")?;

    Ok(code)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_merge_status_argument() {
        let cli = Cli::try_parse_from(["bootctl", "set-snapshot-merge-status", "merging"]).unwrap();

        assert!(matches!(
            cli.command,
            Command::SetSnapshotMergeStatus {
                status: MergeStatus::Merging
            }
        ));

        assert!(Cli::try_parse_from(["bootctl", "set-snapshot-merge-status", "merged"]).is_err());
    }

    #[test]
    fn parse_slot_argument() {
        let cli = Cli::try_parse_from(["bootctl", "--session", "is-slot-bootable", "1"]).unwrap();

        assert!(cli.session);
        assert_eq!(cli.service_name, SERVICE_NAME);
        assert!(matches!(cli.command, Command::IsSlotBootable { slot: 1 }));
    }
}
