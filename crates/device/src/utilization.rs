// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! DSP and BRAM usage of a design against one device.

use crate::DeviceConfig;
use std::ops::{Add, AddAssign};

/// Resource usage of one layer design or of a whole partition.
///
/// Percentages are relative to the device the figures were computed for;
/// adding two `Utilization`s is only meaningful for the same device.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Utilization {
    /// DSP-equivalent multipliers.
    pub dsp_raw: u64,
    /// `dsp_raw / device.dsp × 100`.
    pub dsp_util: f64,
    /// Block RAMs.
    pub bram_raw: u64,
    /// `bram_raw / device.bram_blocks × 100`.
    pub bram_util: f64,
}

impl Utilization {
    /// Maps parallel multipliers and on-chip words onto `device`.
    pub fn from_resources(device: &DeviceConfig, muls: u64, memory_words: u64) -> Self {
        let bram_raw = device.bram_blocks_for(memory_words);
        Self {
            dsp_raw: muls,
            dsp_util: muls as f64 / device.dsp as f64 * 100.0,
            bram_raw,
            bram_util: bram_raw as f64 / device.bram_blocks as f64 * 100.0,
        }
    }

    /// `true` when both DSP and BRAM are strictly below the device limits.
    pub fn within(&self, device: &DeviceConfig) -> bool {
        self.dsp_util < device.max_dsp_util && self.bram_util < device.max_bram_util
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "DSP {:.2}% ({}), BRAM {:.2}% ({})",
            self.dsp_util, self.dsp_raw, self.bram_util, self.bram_raw
        )
    }
}

impl Add for Utilization {
    type Output = Utilization;

    fn add(self, rhs: Utilization) -> Utilization {
        Utilization {
            dsp_raw: self.dsp_raw + rhs.dsp_raw,
            dsp_util: self.dsp_util + rhs.dsp_util,
            bram_raw: self.bram_raw + rhs.bram_raw,
            bram_util: self.bram_util + rhs.bram_util,
        }
    }
}

impl AddAssign for Utilization {
    fn add_assign(&mut self, rhs: Utilization) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Utilization {
    fn sum<I: Iterator<Item = Utilization>>(iter: I) -> Self {
        iter.fold(Utilization::default(), Add::add)
    }
}
