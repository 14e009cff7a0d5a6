// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Design points and the figures they carry.

use crate::Configuration;
use device::{DeviceConfig, Utilization};
use std::ops::Add;

/// Hardware resources of one layer pipeline under one configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resources {
    /// Parallel multipliers (one DSP each).
    pub muls: u64,
    /// Parallel adders.
    pub adds: u64,
    /// On-chip buffer words (window buffers, weights, accumulators).
    pub memory_words: u64,
    /// Pipeline fill latency in cycles.
    pub depth: u64,
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources {
            muls: self.muls + rhs.muls,
            adds: self.adds + rhs.adds,
            memory_words: self.memory_words + rhs.memory_words,
            depth: self.depth + rhs.depth,
        }
    }
}

/// Performance and resource figures of one evaluated configuration.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Metrics {
    pub latency_cycles: u64,
    pub latency_sec: f64,
    /// Giga-operations per second.
    pub throughput_gops: f64,
    /// Complete input volumes processed per second.
    pub throughput_vols: f64,
    pub utilization: Utilization,
    /// Balanced input rate, words per cycle.
    pub rate_in: f64,
    /// Balanced output rate, words per cycle.
    pub rate_out: f64,
    pub depth: u64,
    pub muls: u64,
    pub adds: u64,
    pub memory_words: u64,
    pub memory_kb: f64,
    pub mem_bounded_in: bool,
    pub mem_bounded_out: bool,
    /// Share of the device's external bandwidth used, in percent.
    pub mem_bw_util: f64,
    /// Operations of one inference through the layer.
    pub total_ops: f64,
}

impl Metrics {
    pub fn dsp_util(&self) -> f64 {
        self.utilization.dsp_util
    }

    pub fn bram_util(&self) -> f64 {
        self.utilization.bram_util
    }

    pub fn within(&self, device: &DeviceConfig) -> bool {
        self.utilization.within(device)
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "latency {} cycles ({:.6} s), {:.3} GOP/s, {:.3} vols/s, {}, depth {}, \
             mem {:.1} KB, bound in/out {}/{}",
            self.latency_cycles,
            self.latency_sec,
            self.throughput_gops,
            self.throughput_vols,
            self.utilization.summary(),
            self.depth,
            self.memory_kb,
            self.mem_bounded_in,
            self.mem_bounded_out,
        )
    }
}

/// A feasible configuration of one layer and its figures.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DesignPoint {
    pub layer: String,
    pub config: Configuration,
    pub metrics: Metrics,
}

/// Why a configuration was rejected by the feasibility gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub layer: String,
    pub config: Configuration,
    pub utilization: Utilization,
}

/// Outcome of evaluating one configuration.
///
/// Exceeding the device budget is an expected outcome of a sweep, not an
/// error, so it is returned as a value the caller has to match on.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Evaluation {
    Feasible(DesignPoint),
    Infeasible(Rejected),
}

impl Evaluation {
    /// Applies the device's DSP and BRAM thresholds to raw figures.
    pub fn gate(
        layer: &str,
        config: Configuration,
        metrics: Metrics,
        device: &DeviceConfig,
    ) -> Evaluation {
        if metrics.within(device) {
            tracing::debug!(layer, %config, latency = metrics.latency_cycles, "accepted design point");
            Evaluation::Feasible(DesignPoint {
                layer: layer.to_string(),
                config,
                metrics,
            })
        } else {
            tracing::debug!(
                layer,
                %config,
                dsp = metrics.dsp_util(),
                bram = metrics.bram_util(),
                "discarding design point"
            );
            Evaluation::Infeasible(Rejected {
                layer: layer.to_string(),
                config,
                utilization: metrics.utilization,
            })
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Evaluation::Feasible(_))
    }

    pub fn feasible(self) -> Option<DesignPoint> {
        match self {
            Evaluation::Feasible(dp) => Some(dp),
            Evaluation::Infeasible(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parallelism;

    fn metrics_with(device: &DeviceConfig, muls: u64, words: u64) -> Metrics {
        Metrics {
            latency_cycles: 1000,
            latency_sec: device.cycles_to_seconds(1000.0),
            throughput_gops: 1.0,
            throughput_vols: 1.0,
            utilization: Utilization::from_resources(device, muls, words),
            rate_in: 1.0,
            rate_out: 1.0,
            depth: 10,
            muls,
            adds: 0,
            memory_words: words,
            memory_kb: device.words_to_kb(words),
            mem_bounded_in: false,
            mem_bounded_out: false,
            mem_bw_util: 0.0,
            total_ops: 1e6,
        }
    }

    fn config() -> Configuration {
        Configuration::new(Parallelism::Shared { coarse_inout: 1.0 }, 1.0, 1.0)
    }

    #[test]
    fn test_gate_feasible() {
        let d = DeviceConfig::zc706();
        let e = Evaluation::gate("l", config(), metrics_with(&d, 100, 0), &d);
        assert!(e.is_feasible());
        assert_eq!(e.feasible().unwrap().layer, "l");
    }

    #[test]
    fn test_gate_dsp_over_budget() {
        let d = DeviceConfig::zc706();
        let e = Evaluation::gate("l", config(), metrics_with(&d, 900, 0), &d);
        match e {
            Evaluation::Infeasible(r) => assert_eq!(r.utilization.dsp_raw, 900),
            Evaluation::Feasible(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_gate_bram_over_budget() {
        let d = DeviceConfig::zc706();
        let e = Evaluation::gate("l", config(), metrics_with(&d, 0, 1152 * 1000), &d);
        assert!(!e.is_feasible());
    }

    #[test]
    fn test_resources_add() {
        let a = Resources {
            muls: 1,
            adds: 2,
            memory_words: 3,
            depth: 4,
        };
        let b = a + a;
        assert_eq!(b.depth, 8);
        assert_eq!(b.memory_words, 6);
    }
}
