// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Target device constants.
//!
//! # TOML Format
//! ```toml
//! name = "zc706"
//! clock_hz = 200000000.0
//! dsp = 900
//! bram_blocks = 1090
//! bram_block_bits = 18432
//! mem_bandwidth = "12.8GB/s"
//! word_bits = 16
//! max_dsp_util = 90.0
//! max_bram_util = 90.0
//! ```

use crate::{Bandwidth, DeviceError};

/// Bits in one 18Kb block RAM.
pub const BRAM_18K_BITS: u64 = 18 * 1024;

/// Default feasibility threshold, in percent, for both DSP and BRAM.
pub const DEFAULT_MAX_UTIL: f64 = 90.0;

/// Clock, resource budgets and memory interface of one FPGA board.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    /// Fabric clock in Hz.
    pub clock_hz: f64,
    /// Available DSP slices.
    pub dsp: u64,
    /// Available block RAMs.
    pub bram_blocks: u64,
    /// Capacity of one block RAM in bits.
    #[serde(default = "default_block_bits")]
    pub bram_block_bits: u64,
    /// Sustained external memory bandwidth.
    pub mem_bandwidth: Bandwidth,
    /// Width of one data word in bits.
    #[serde(default = "default_word_bits")]
    pub word_bits: u32,
    /// A design is feasible only while DSP usage stays strictly below this.
    #[serde(default = "default_max_util")]
    pub max_dsp_util: f64,
    /// A design is feasible only while BRAM usage stays strictly below this.
    #[serde(default = "default_max_util")]
    pub max_bram_util: f64,
}

fn default_block_bits() -> u64 {
    BRAM_18K_BITS
}

fn default_word_bits() -> u32 {
    16
}

fn default_max_util() -> f64 {
    DEFAULT_MAX_UTIL
}

impl DeviceConfig {
    /// Xilinx Zynq-7000 ZC706.
    pub fn zc706() -> Self {
        Self {
            name: "zc706".into(),
            clock_hz: 200e6,
            dsp: 900,
            bram_blocks: 1090,
            bram_block_bits: BRAM_18K_BITS,
            mem_bandwidth: Bandwidth::from_gb_per_sec(12.8),
            word_bits: 16,
            max_dsp_util: DEFAULT_MAX_UTIL,
            max_bram_util: DEFAULT_MAX_UTIL,
        }
    }

    /// Xilinx Zynq UltraScale+ ZCU102.
    pub fn zcu102() -> Self {
        Self {
            name: "zcu102".into(),
            clock_hz: 200e6,
            dsp: 2520,
            bram_blocks: 1824,
            mem_bandwidth: Bandwidth::from_gb_per_sec(19.2),
            ..Self::zc706()
        }
    }

    /// Xilinx Virtex-7 VC709.
    pub fn vc709() -> Self {
        Self {
            name: "vc709".into(),
            clock_hz: 200e6,
            dsp: 3600,
            bram_blocks: 2940,
            mem_bandwidth: Bandwidth::from_gb_per_sec(25.6),
            ..Self::zc706()
        }
    }

    /// Looks up a preset by (case-insensitive) name.
    pub fn preset(name: &str) -> Result<Self, DeviceError> {
        match name.to_lowercase().as_str() {
            "zc706" => Ok(Self::zc706()),
            "zcu102" => Ok(Self::zcu102()),
            "vc709" => Ok(Self::vc709()),
            _ => Err(DeviceError::UnknownPreset(name.to_string())),
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["zc706", "zcu102", "vc709"]
    }

    /// Checks that every constant is usable as a divisor or threshold.
    pub fn validate(&self) -> Result<(), DeviceError> {
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(DeviceError::InvalidParameter {
                    field,
                    detail: format!("must be positive and finite, got {value}"),
                })
            }
        };
        positive("clock_hz", self.clock_hz)?;
        positive("dsp", self.dsp as f64)?;
        positive("bram_blocks", self.bram_blocks as f64)?;
        positive("bram_block_bits", self.bram_block_bits as f64)?;
        positive("mem_bandwidth", self.mem_bandwidth.bytes_per_sec())?;
        positive("word_bits", f64::from(self.word_bits))?;
        positive("max_dsp_util", self.max_dsp_util)?;
        positive("max_bram_util", self.max_bram_util)?;
        Ok(())
    }

    /// External memory bandwidth expressed in words per clock cycle.
    pub fn words_per_cycle(&self) -> f64 {
        self.mem_bandwidth.bits_per_sec() / f64::from(self.word_bits) / self.clock_hz
    }

    /// Converts a cycle count to seconds at the fabric clock.
    pub fn cycles_to_seconds(&self, cycles: f64) -> f64 {
        cycles / self.clock_hz
    }

    /// Block RAMs needed to hold `words` on-chip words.
    pub fn bram_blocks_for(&self, words: u64) -> u64 {
        let bits = words * u64::from(self.word_bits);
        bits.div_ceil(self.bram_block_bits)
    }

    /// Kilobytes occupied by `words` on-chip words.
    pub fn words_to_kb(&self, words: u64) -> f64 {
        (words * u64::from(self.word_bits)) as f64 / 8.0 / 1024.0
    }

    /// Share of the external bandwidth, in percent, consumed by a pipeline
    /// moving `words_per_cycle` words every cycle.
    pub fn bandwidth_util(&self, words_per_cycle: f64) -> f64 {
        let bits_per_sec = words_per_cycle * self.clock_hz * f64::from(self.word_bits);
        bits_per_sec / self.mem_bandwidth.bits_per_sec() * 100.0
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{}: {:.0} MHz, {} DSP, {} BRAM ({} bit), {} ({:.2} words/cycle), \
             {}-bit words, limits DSP<{:.0}% BRAM<{:.0}%",
            self.name,
            self.clock_hz / 1e6,
            self.dsp,
            self.bram_blocks,
            self.bram_block_bits,
            self.mem_bandwidth,
            self.words_per_cycle(),
            self.word_bits,
            self.max_dsp_util,
            self.max_bram_util,
        )
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::zc706()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_presets() {
        for name in DeviceConfig::preset_names() {
            let d = DeviceConfig::preset(name).unwrap();
            assert_eq!(&d.name, name);
            d.validate().unwrap();
        }
        assert_eq!(DeviceConfig::preset("ZC706").unwrap().dsp, 900);
    }

    #[test]
    fn test_unknown_preset() {
        assert_eq!(
            DeviceConfig::preset("u280"),
            Err(DeviceError::UnknownPreset("u280".into()))
        );
    }

    #[test]
    fn test_words_per_cycle() {
        // 12.8 GB/s at 200 MHz with 16-bit words = 32 words/cycle.
        assert_relative_eq!(DeviceConfig::zc706().words_per_cycle(), 32.0);
        assert_relative_eq!(DeviceConfig::zcu102().words_per_cycle(), 48.0);
    }

    #[test]
    fn test_bram_blocks_for() {
        let d = DeviceConfig::zc706();
        assert_eq!(d.bram_blocks_for(0), 0);
        // 1152 words × 16 bit = 18432 bit = one block.
        assert_eq!(d.bram_blocks_for(1152), 1);
        assert_eq!(d.bram_blocks_for(1153), 2);
    }

    #[test]
    fn test_words_to_kb() {
        assert_relative_eq!(DeviceConfig::zc706().words_to_kb(512), 1.0);
    }

    #[test]
    fn test_bandwidth_util() {
        let d = DeviceConfig::zc706();
        assert_relative_eq!(d.bandwidth_util(32.0), 100.0);
        assert_relative_eq!(d.bandwidth_util(8.0), 25.0);
    }

    #[test]
    fn test_validate_rejects_zero_clock() {
        let d = DeviceConfig {
            clock_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            d.validate(),
            Err(DeviceError::InvalidParameter { field: "clock_hz", .. })
        ));
    }

    #[test]
    fn test_from_toml_with_defaults() {
        let toml_str = r#"
name = "custom"
clock_hz = 150000000.0
dsp = 1200
bram_blocks = 600
mem_bandwidth = "4.8GB/s"
"#;
        let d: DeviceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(d.word_bits, 16);
        assert_eq!(d.bram_block_bits, BRAM_18K_BITS);
        assert_relative_eq!(d.max_dsp_util, 90.0);
        assert_relative_eq!(d.mem_bandwidth.bytes_per_sec(), 4.8e9);
    }

    #[test]
    fn test_summary() {
        let s = DeviceConfig::zc706().summary();
        assert!(s.starts_with("zc706: 200 MHz, 900 DSP"));
    }
}
