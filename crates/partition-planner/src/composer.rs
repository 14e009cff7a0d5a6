// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Composition of per-layer design points into one partition.
//!
//! A partition is a chain of layers resident on the device at the same
//! time, streaming into each other:
//!
//! ```text
//! mem ──bw_in──▶ L0 ──∞──▶ L1 ──∞──▶ … ──∞──▶ Ln ──bw_out──▶ mem
//! ```
//!
//! Only the two ends touch external memory, so every inner edge is
//! evaluated with unbounded bandwidth. The layers run concurrently, so the
//! slowest one sets the partition latency while their resources add up
//! against a single device budget.

use crate::PlannerError;
use device::{DeviceConfig, Utilization};
use layer_model::{Configuration, DesignPoint, Evaluation, LayerModel, Metrics, Rejected};

/// A feasible composition of one configuration per layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartitionPoint {
    /// Partition identifier, e.g. `part_0`.
    pub partition: String,
    /// Position of this combination in the enumeration order.
    pub index: u64,
    /// Per-layer design points, in chain order.
    pub layers: Vec<DesignPoint>,
    /// Aggregate figures of the whole chain.
    pub metrics: Metrics,
}

impl PartitionPoint {
    pub fn latency_cycles(&self) -> u64 {
        self.metrics.latency_cycles
    }

    pub fn dsp_util(&self) -> f64 {
        self.metrics.utilization.dsp_util
    }

    pub fn configs(&self) -> impl Iterator<Item = &Configuration> + '_ {
        self.layers.iter().map(|dp| &dp.config)
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.layers.iter().map(|dp| dp.layer.as_str()).collect();
        format!(
            "{} [{}]: {}",
            self.partition,
            names.join(" → "),
            self.metrics.summary()
        )
    }
}

/// Why a composition was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Infeasibility {
    /// One layer failed its own gate.
    Layer(Rejected),
    /// Every layer fits alone but the sum exceeds the device budget.
    Budget(Utilization),
}

/// Outcome of composing one combination.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Composition {
    Feasible(PartitionPoint),
    Infeasible(Infeasibility),
}

/// Evaluates combinations of per-layer configurations as a partition.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    device: &'a DeviceConfig,
    mem_bw_in: f64,
    mem_bw_out: f64,
}

impl<'a> Composer<'a> {
    /// `mem_bw_in` / `mem_bw_out` are the partition's external bandwidths
    /// in words per cycle.
    pub fn new(device: &'a DeviceConfig, mem_bw_in: f64, mem_bw_out: f64) -> Self {
        Self {
            device,
            mem_bw_in,
            mem_bw_out,
        }
    }

    pub fn device(&self) -> &DeviceConfig {
        self.device
    }

    /// The configuration layer `position` of `len` actually runs with.
    pub fn layer_config(&self, position: usize, len: usize, config: &Configuration) -> Configuration {
        let bw_in = if position == 0 { self.mem_bw_in } else { f64::INFINITY };
        let bw_out = if position + 1 == len {
            self.mem_bw_out
        } else {
            f64::INFINITY
        };
        config.with_bandwidth(bw_in, bw_out)
    }

    /// Composes one configuration per layer.
    pub fn compose(
        &self,
        partition: &str,
        index: u64,
        layers: &[&LayerModel],
        configs: &[&Configuration],
    ) -> Result<Composition, PlannerError> {
        if layers.is_empty() {
            return Err(PlannerError::EmptyPartition(partition.to_string()));
        }
        if layers.len() != configs.len() {
            return Err(PlannerError::ConfigurationCount {
                partition: partition.to_string(),
                expected: layers.len(),
                got: configs.len(),
            });
        }

        let mut points = Vec::with_capacity(layers.len());
        for (i, (layer, config)) in layers.iter().zip(configs).enumerate() {
            let config = self.layer_config(i, layers.len(), config);
            match layer.design_point(&config, self.device)? {
                Evaluation::Feasible(dp) => points.push(dp),
                Evaluation::Infeasible(rejected) => {
                    return Ok(Composition::Infeasible(Infeasibility::Layer(rejected)));
                }
            }
        }

        let metrics = self.aggregate(&points);
        if !metrics.within(self.device) {
            tracing::trace!(
                partition,
                index,
                dsp = metrics.dsp_util(),
                bram = metrics.bram_util(),
                "partition exceeds device budget"
            );
            return Ok(Composition::Infeasible(Infeasibility::Budget(
                metrics.utilization,
            )));
        }

        Ok(Composition::Feasible(PartitionPoint {
            partition: partition.to_string(),
            index,
            layers: points,
            metrics,
        }))
    }

    /// Chain figures: slowest layer's latency, summed resources, boundary
    /// rates from the two ends.
    fn aggregate(&self, points: &[DesignPoint]) -> Metrics {
        let device = self.device;
        let first = &points[0].metrics;
        let last = &points[points.len() - 1].metrics;
        let all = || points.iter().map(|dp| &dp.metrics);

        let latency_cycles = all().map(|m| m.latency_cycles).max().unwrap_or(0);
        let latency_sec = device.cycles_to_seconds(latency_cycles as f64);
        let total_ops: f64 = all().map(|m| m.total_ops).sum();
        let memory_words: u64 = all().map(|m| m.memory_words).sum();

        Metrics {
            latency_cycles,
            latency_sec,
            throughput_gops: total_ops / latency_sec * 1e-9,
            throughput_vols: 1.0 / latency_sec,
            utilization: all().map(|m| m.utilization).sum(),
            rate_in: first.rate_in,
            rate_out: last.rate_out,
            depth: all().map(|m| m.depth).sum(),
            muls: all().map(|m| m.muls).sum(),
            adds: all().map(|m| m.adds).sum(),
            memory_words,
            memory_kb: device.words_to_kb(memory_words),
            mem_bounded_in: first.mem_bounded_in,
            mem_bounded_out: last.mem_bounded_out,
            mem_bw_util: device.bandwidth_util(first.rate_in + last.rate_out),
            total_ops,
        }
    }
}
