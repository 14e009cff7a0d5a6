// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Exploration configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "./models/x3d_m.json"
//! output_dir = "./reports"
//! singlethreaded = false
//! num_threads = 8
//! se_block = true
//! gap_approx = false
//! bandwidth_splits = [0.2, 0.4, 0.5, 0.6, 0.8]
//! partition_bandwidth_in = 16.0
//! partition_bandwidth_out = 16.0
//! device = "zc706"
//! ```
//!
//! `device` is either a preset name or an inline table:
//!
//! ```toml
//! [device]
//! name = "custom"
//! clock_hz = 150000000
//! dsp = 1200
//! bram_blocks = 1400
//! mem_bandwidth = "10GB/s"
//! ```

use crate::ExplorerError;
use device::DeviceConfig;
use layer_model::ModelOptions;
use std::path::{Path, PathBuf};

/// A named preset or a fully specified device.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum DeviceSelection {
    Preset(String),
    Custom(DeviceConfig),
}

impl Default for DeviceSelection {
    fn default() -> Self {
        Self::Preset("zc706".to_string())
    }
}

impl DeviceSelection {
    pub fn resolve(&self) -> Result<DeviceConfig, ExplorerError> {
        let device = match self {
            Self::Preset(name) => DeviceConfig::preset(name)?,
            Self::Custom(device) => device.clone(),
        };
        device.validate()?;
        Ok(device)
    }
}

/// Configuration of one exploration run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExplorerConfig {
    /// Model manifest, or a directory holding `model.json`.
    pub model_path: PathBuf,
    /// Directory the CSV reports are written to.
    pub output_dir: PathBuf,
    /// Evaluate on the calling thread only.
    #[serde(default)]
    pub singlethreaded: bool,
    /// Number of worker threads (defaults to number of online CPU cores).
    pub num_threads: Option<usize>,
    /// Model squeeze-excitation blocks as one layer rather than their
    /// primitive ops.
    #[serde(default = "default_true")]
    pub se_block: bool,
    /// Use the approximate global-average-pool model.
    #[serde(default)]
    pub gap_approx: bool,
    /// Share of the device bandwidth given to a layer's input; the rest
    /// goes to its output.
    #[serde(default = "default_splits")]
    pub bandwidth_splits: Vec<f64>,
    /// External input bandwidth of every partition, words per cycle
    /// (defaults to half the device bandwidth).
    pub partition_bandwidth_in: Option<f64>,
    /// External output bandwidth of every partition, words per cycle
    /// (defaults to half the device bandwidth).
    pub partition_bandwidth_out: Option<f64>,
    /// Target device. Kept last: TOML tables must follow plain values.
    #[serde(default)]
    pub device: DeviceSelection,
}

fn default_true() -> bool {
    true
}

fn default_splits() -> Vec<f64> {
    vec![0.2, 0.4, 0.5, 0.6, 0.8]
}

impl ExplorerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ExplorerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExplorerError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ExplorerError> {
        toml::from_str(toml_str)
            .map_err(|e| ExplorerError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ExplorerError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExplorerError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.bandwidth_splits.is_empty() {
            return Err(ExplorerError::ConfigError(
                "bandwidth_splits must not be empty".into(),
            ));
        }
        if let Some(s) = self.bandwidth_splits.iter().find(|s| !(**s > 0.0 && **s < 1.0)) {
            return Err(ExplorerError::ConfigError(format!(
                "bandwidth split {s} must lie strictly between 0 and 1"
            )));
        }
        for (name, bw) in [
            ("partition_bandwidth_in", self.partition_bandwidth_in),
            ("partition_bandwidth_out", self.partition_bandwidth_out),
        ] {
            if let Some(bw) = bw.filter(|bw| !(*bw > 0.0)) {
                return Err(ExplorerError::ConfigError(format!(
                    "{name} must be positive, got {bw}"
                )));
            }
        }
        if self.num_threads == Some(0) {
            return Err(ExplorerError::ConfigError("num_threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolves the number of worker threads.
    pub fn resolve_threads(&self) -> usize {
        if self.singlethreaded {
            return 1;
        }
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Partition boundary bandwidths in words per cycle.
    pub fn partition_bandwidth(&self, device: &DeviceConfig) -> (f64, f64) {
        let half = device.words_per_cycle() / 2.0;
        (
            self.partition_bandwidth_in.unwrap_or(half),
            self.partition_bandwidth_out.unwrap_or(half),
        )
    }

    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            gap_approx: self.gap_approx,
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/model.json"),
            output_dir: PathBuf::from("./reports"),
            singlethreaded: false,
            num_threads: None,
            se_block: true,
            gap_approx: false,
            bandwidth_splits: default_splits(),
            partition_bandwidth_in: None,
            partition_bandwidth_out: None,
            device: DeviceSelection::default(),
        }
    }
}
