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

//! Snapshot merge status.
//!
//! [`MergeStatus`] is the value exchanged with clients. The boot control libraries still speak the
//! previous interface generation, so the [`LegacyMergeStatus`] shape is only used at the backend
//! boundary.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// State of a dynamic partition snapshot merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MergeStatus {
    #[default]
    None = 0,
    Unknown = 1,
    Snapshotted = 2,
    Merging = 3,
    Cancelled = 4,
}

impl MergeStatus {
    pub const ALL: [MergeStatus; 5] = [
        MergeStatus::None,
        MergeStatus::Unknown,
        MergeStatus::Snapshotted,
        MergeStatus::Merging,
        MergeStatus::Cancelled,
    ];

    /// Decodes the ordinal received on the wire, unrecognized values are [`MergeStatus::None`].
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => MergeStatus::None,
            1 => MergeStatus::Unknown,
            2 => MergeStatus::Snapshotted,
            3 => MergeStatus::Merging,
            4 => MergeStatus::Cancelled,
            _ => MergeStatus::None,
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStatus::None => "none",
            MergeStatus::Unknown => "unknown",
            MergeStatus::Snapshotted => "snapshotted",
            MergeStatus::Merging => "merging",
            MergeStatus::Cancelled => "cancelled",
        }
    }
}

impl Display for MergeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// unrecognized merge status {0}
#[derive(Debug, thiserror::Error, displaydoc::Display, PartialEq, Eq)]
pub struct ParseMergeStatusError(String);

impl std::str::FromStr for MergeStatus {
    type Err = ParseMergeStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseMergeStatusError(s.to_string()))
    }
}

/// Merge status in the shape the boot control libraries expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum LegacyMergeStatus {
    #[default]
    None = 0,
    Unknown = 1,
    Snapshotted = 2,
    Merging = 3,
    Cancelled = 4,
}

impl LegacyMergeStatus {
    /// Decodes the value returned by a library, unrecognized values are
    /// [`LegacyMergeStatus::None`].
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => LegacyMergeStatus::None,
            1 => LegacyMergeStatus::Unknown,
            2 => LegacyMergeStatus::Snapshotted,
            3 => LegacyMergeStatus::Merging,
            4 => LegacyMergeStatus::Cancelled,
            _ => LegacyMergeStatus::None,
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

impl From<LegacyMergeStatus> for MergeStatus {
    fn from(value: LegacyMergeStatus) -> Self {
        match value {
            LegacyMergeStatus::None => MergeStatus::None,
            LegacyMergeStatus::Unknown => MergeStatus::Unknown,
            LegacyMergeStatus::Snapshotted => MergeStatus::Snapshotted,
            LegacyMergeStatus::Merging => MergeStatus::Merging,
            LegacyMergeStatus::Cancelled => MergeStatus::Cancelled,
        }
    }
}

impl From<MergeStatus> for LegacyMergeStatus {
    fn from(value: MergeStatus) -> Self {
        match value {
            MergeStatus::None => LegacyMergeStatus::None,
            MergeStatus::Unknown => LegacyMergeStatus::Unknown,
            MergeStatus::Snapshotted => LegacyMergeStatus::Snapshotted,
            MergeStatus::Merging => LegacyMergeStatus::Merging,
            MergeStatus::Cancelled => LegacyMergeStatus::Cancelled,
        }
    }
}
