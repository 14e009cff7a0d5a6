// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # device
//!
//! Read-only description of the target FPGA and the arithmetic that maps
//! raw resource counts onto it.
//!
//! - [`DeviceConfig`]: clock, DSP and BRAM budgets, external memory
//!   bandwidth, word width and the feasibility thresholds. Presets for the
//!   boards the toolflow is usually run against (`zc706`, `zcu102`, `vc709`).
//! - [`Bandwidth`]: external memory bandwidth with human-readable parsing
//!   (`"12.8GB/s"`, `"800M"`).
//! - [`Utilization`]: DSP/BRAM usage of one design, summable across the
//!   layers of a partition and checked against the device thresholds.
//!
//! A `DeviceConfig` is shared by reference for a whole exploration run and
//! never mutated.
//!
//! # Example
//! ```
//! use device::{DeviceConfig, Utilization};
//!
//! let zc706 = DeviceConfig::preset("zc706").unwrap();
//! assert_eq!(zc706.words_per_cycle(), 32.0);
//!
//! let util = Utilization::from_resources(&zc706, 450, 0);
//! assert_eq!(util.dsp_util, 50.0);
//! assert!(util.within(&zc706));
//! ```

mod bandwidth;
mod config;
mod error;
mod utilization;

pub use bandwidth::Bandwidth;
pub use config::DeviceConfig;
pub use error::DeviceError;
pub use utilization::Utilization;
