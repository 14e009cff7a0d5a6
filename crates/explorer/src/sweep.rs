// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Single-layer configuration sweeps.
//!
//! Candidate fractions are chosen so that every one maps onto a distinct,
//! exact stream count:
//!
//! - fine: `{1/K, kw/K, kh·kw/K, 1}` for a `kd × kh × kw` kernel of `K`
//!   elements, i.e. unrolling one element, one row, one plane or the whole
//!   kernel;
//! - coarse: `d/N` for every divisor `d` of the dimension `N`;
//! - bandwidth: `(s·B, (1−s)·B)` for each configured split `s` of the
//!   device's `B` words per cycle.

use crate::ExplorerError;
use device::DeviceConfig;
use itertools::iproduct;
use layer_model::{
    Configuration, DesignPoint, Evaluation, LayerError, LayerModel, Parallelism, ParallelismKind,
};
use partition_planner::Observer;
use rayon::prelude::*;

/// Fine factors for a kernel, ascending and without duplicates.
pub fn fine_factors(kernel: Option<(usize, usize, usize)>) -> Vec<f64> {
    let Some((kd, kh, kw)) = kernel else {
        return vec![1.0];
    };
    let k = (kd * kh * kw).max(1);
    let mut unrolled = vec![1, kw, kh * kw, k];
    unrolled.sort_unstable();
    unrolled.dedup();
    unrolled.into_iter().map(|u| u as f64 / k as f64).collect()
}

/// `d / n` for every divisor `d` of `n`, ascending.
pub fn coarse_factors(n: usize) -> Vec<f64> {
    let n = n.max(1);
    (1..=n)
        .filter(|d| n % d == 0)
        .map(|d| d as f64 / n as f64)
        .collect()
}

/// `(bw_in, bw_out)` pairs in words per cycle.
pub fn bandwidth_pairs(device: &DeviceConfig, splits: &[f64]) -> Vec<(f64, f64)> {
    let total = device.words_per_cycle();
    splits.iter().map(|s| (s * total, (1.0 - s) * total)).collect()
}

/// Every configuration the sweep evaluates for `model`.
pub fn configurations(model: &LayerModel, device: &DeviceConfig, splits: &[f64]) -> Vec<Configuration> {
    let dims = model.dims();
    let bandwidths = bandwidth_pairs(device, splits);
    let coarse_in = coarse_factors(dims.coarse_in);
    let coarse_out = coarse_factors(dims.coarse_out);

    let parallelism: Vec<Parallelism> = match model.parallelism_kind() {
        ParallelismKind::Conv => iproduct!(fine_factors(dims.kernel), &coarse_in, &coarse_out)
            .map(|(fine, &coarse_in, &coarse_out)| Parallelism::Conv {
                fine,
                coarse_in,
                coarse_out,
            })
            .collect(),
        ParallelismKind::Channels => iproduct!(&coarse_in, &coarse_out)
            .map(|(&coarse_in, &coarse_out)| Parallelism::Channels {
                coarse_in,
                coarse_out,
            })
            .collect(),
        ParallelismKind::Shared => coarse_in
            .iter()
            .map(|&coarse_inout| Parallelism::Shared { coarse_inout })
            .collect(),
    };

    iproduct!(parallelism, &bandwidths)
        .map(|(p, &(bw_in, bw_out))| Configuration::new(p, bw_in, bw_out))
        .collect()
}

/// Feasible design points of one layer, in sweep order.
#[derive(Debug, Clone)]
pub struct LayerSweep {
    pub layer: String,
    pub points: Vec<DesignPoint>,
    pub evaluated: u64,
}

impl LayerSweep {
    pub fn feasible(&self) -> u64 {
        self.points.len() as u64
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let best = self.points.iter().map(|p| p.metrics.latency_cycles).min();
        format!(
            "{}: {}/{} feasible, best latency {}",
            self.layer,
            self.feasible(),
            self.evaluated,
            best.map_or_else(|| "-".to_string(), |c| format!("{c} cycles")),
        )
    }
}

/// Evaluates every configuration of `model`, reporting feasible points to
/// `observer`. With `parallel` set, configurations are spread over the
/// current rayon pool; the result order is the same either way.
pub fn sweep_layer(
    model: &LayerModel,
    device: &DeviceConfig,
    splits: &[f64],
    observer: &dyn Observer,
    parallel: bool,
) -> Result<LayerSweep, ExplorerError> {
    let configs = configurations(model, device, splits);
    tracing::debug!(layer = model.name(), configurations = configs.len(), "sweeping layer");

    let evaluate = |config: &Configuration| -> Result<Option<DesignPoint>, ExplorerError> {
        match model.design_point(config, device) {
            Ok(Evaluation::Feasible(dp)) => {
                observer.layer_point(&dp);
                Ok(Some(dp))
            }
            Ok(Evaluation::Infeasible(_)) => Ok(None),
            // The point is discarded; the rest of the grid is still valid.
            Err(e @ LayerError::ThroughputMismatch { .. }) => {
                tracing::warn!(layer = model.name(), %config, "{e}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    };

    let results: Vec<Option<DesignPoint>> = if parallel {
        configs.par_iter().map(evaluate).collect::<Result<_, _>>()?
    } else {
        configs.iter().map(evaluate).collect::<Result<_, _>>()?
    };

    let sweep = LayerSweep {
        layer: model.name().to_string(),
        points: results.into_iter().flatten().collect(),
        evaluated: configs.len() as u64,
    };
    tracing::info!("{}", sweep.summary());
    Ok(sweep)
}
