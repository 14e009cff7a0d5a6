// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for device configuration.

/// Errors that can occur when describing a target device.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    /// No preset exists under the requested name.
    #[error("unknown device '{0}'; expected one of: zc706, zcu102, vc709")]
    UnknownPreset(String),

    /// A bandwidth string could not be parsed.
    #[error("invalid bandwidth '{0}': expected a number followed by an optional GB/s, MB/s or KB/s suffix")]
    InvalidBandwidth(String),

    /// A device parameter is out of range.
    #[error("invalid device parameter '{field}': {detail}")]
    InvalidParameter { field: &'static str, detail: String },
}
