// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Performance derivation shared by every primitive layer kind.
//!
//! ```text
//! Γ  = R ∘ S ∘ D            (StageModel::gamma)
//! Γ′ = balance(Γ)           (flow_core::balance)
//! II = W ⊘ Γ′               (0/0 = 0)
//! latency = depth + max(II)
//! ```
//!
//! Each II entry is the number of cycles its stage or edge needs to move
//! its whole workload, so the largest one is the steady-state bottleneck
//! and the pipeline depth is paid once on top of it.

use crate::{LayerError, Metrics, StageModel};
use device::{DeviceConfig, Utilization};
use flow_core::{balance, Balanced};

/// Relative tolerance between input and output volumes/s.
pub const THROUGHPUT_TOLERANCE: f64 = 1e-6;

/// Derives the ungated figures of `model` under `config`.
pub fn derive(
    model: &dyn StageModel,
    config: &crate::Configuration,
    device: &DeviceConfig,
) -> Result<Metrics, LayerError> {
    let name = model.name();
    let factors = config.parallelism.factors();

    let gamma = model.gamma(config).map_err(LayerError::matrix(name))?;
    tracing::trace!(layer = name, "Γ:\n{gamma}");

    let Balanced {
        rates,
        flow_in: rate_in,
        flow_out: rate_out,
        mem_bounded_in,
        mem_bounded_out,
    } = balance(&gamma).map_err(LayerError::matrix(name))?;
    tracing::trace!(layer = name, "Γ balanced:\n{rates}");

    let workload = model.workload_matrix().map_err(LayerError::matrix(name))?;
    let ii = workload.divide(&rates).map_err(LayerError::matrix(name))?;
    tracing::trace!(layer = name, "II:\n{ii}");

    let resources = model.resources(&factors);
    let latency_cycles = (resources.depth as f64 + ii.max()).ceil() as u64;
    let latency_sec = device.cycles_to_seconds(latency_cycles as f64);

    let (volume_in, volume_out) = model.volumes();
    let thr_in = workload.first() / latency_sec / volume_in;
    let thr_out = workload.last() / latency_sec / volume_out;
    if !approx::relative_eq!(thr_in, thr_out, max_relative = THROUGHPUT_TOLERANCE) {
        return Err(LayerError::ThroughputMismatch {
            layer: name.to_string(),
            thr_in,
            thr_out,
        });
    }

    let total_ops = model.total_ops();

    Ok(Metrics {
        latency_cycles,
        latency_sec,
        throughput_gops: total_ops / latency_sec * 1e-9,
        throughput_vols: thr_out,
        utilization: Utilization::from_resources(device, resources.muls, resources.memory_words),
        rate_in,
        rate_out,
        depth: resources.depth,
        muls: resources.muls,
        adds: resources.adds,
        memory_words: resources.memory_words,
        memory_kb: device.words_to_kb(resources.memory_words),
        mem_bounded_in,
        mem_bounded_out,
        mem_bw_util: device.bandwidth_util(rate_in + rate_out),
        total_ops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Configuration, Factors, Parallelism, Resources};
    use flow_core::{MatrixError, StageMatrix, Topology};

    /// A pass-through stage whose output workload can be skewed to break
    /// rate consistency.
    struct Passthrough {
        elements: f64,
        skew: f64,
    }

    impl StageModel for Passthrough {
        fn name(&self) -> &str {
            "passthrough"
        }

        fn topology(&self) -> Topology {
            Topology::TwoStage
        }

        fn rate_matrix(&self, _: &Factors) -> Result<StageMatrix, MatrixError> {
            StageMatrix::from_band(Topology::TwoStage, vec![1.0; 2], vec![1.0; 2])
        }

        fn stream_matrix(&self, _: &Factors) -> Result<StageMatrix, MatrixError> {
            StageMatrix::from_band(Topology::TwoStage, vec![1.0, 4.0], vec![4.0, 1.0])
        }

        fn data_matrix(&self, bw_in: f64, bw_out: f64) -> Result<StageMatrix, MatrixError> {
            StageMatrix::from_band(Topology::TwoStage, vec![bw_in, 1.0], vec![-1.0, -bw_out])
        }

        fn workload_matrix(&self) -> Result<StageMatrix, MatrixError> {
            let e = self.elements;
            StageMatrix::from_band(Topology::TwoStage, vec![e, e], vec![e, e * self.skew])
        }

        fn resources(&self, _: &Factors) -> Resources {
            Resources {
                muls: 4,
                adds: 0,
                memory_words: 0,
                depth: 3,
            }
        }

        fn total_ops(&self) -> f64 {
            self.elements
        }

        fn volumes(&self) -> (f64, f64) {
            (self.elements, self.elements)
        }
    }

    fn config(bw: f64) -> Configuration {
        Configuration::new(Parallelism::Shared { coarse_inout: 1.0 }, bw, bw)
    }

    #[test]
    fn test_latency_is_depth_plus_bottleneck() {
        let model = Passthrough {
            elements: 4096.0,
            skew: 1.0,
        };
        let m = derive(&model, &config(100.0), &DeviceConfig::zc706()).unwrap();
        // 4 words/cycle everywhere: II = 1024, depth 3.
        assert_eq!(m.latency_cycles, 1027);
        assert!(!m.mem_bounded_in);
        assert_eq!(m.rate_in, 4.0);
    }

    #[test]
    fn test_memory_bound_input_slows_layer() {
        let model = Passthrough {
            elements: 4096.0,
            skew: 1.0,
        };
        let m = derive(&model, &config(2.0), &DeviceConfig::zc706()).unwrap();
        assert!(m.mem_bounded_in);
        assert!(m.mem_bounded_out);
        // Input edge: 4096 / 2 = 2048 cycles.
        assert_eq!(m.latency_cycles, 2051);
    }

    #[test]
    fn test_input_bound_throttles_output_rate() {
        let model = Passthrough {
            elements: 4096.0,
            skew: 1.0,
        };
        let config = Configuration::new(Parallelism::Shared { coarse_inout: 1.0 }, 1.0, 100.0);
        let m = derive(&model, &config, &DeviceConfig::zc706()).unwrap();
        assert!(m.mem_bounded_in);
        assert!(!m.mem_bounded_out);
        assert_eq!(m.rate_in, 1.0);
        assert_eq!(m.rate_out, 1.0);
        assert_eq!(m.latency_cycles, 4096 + 3);
        // 1 + 1 words/cycle of the 32 available.
        approx::assert_relative_eq!(m.mem_bw_util, 6.25);
    }

    #[test]
    fn test_throughput_mismatch() {
        let model = Passthrough {
            elements: 4096.0,
            skew: 2.0,
        };
        let err = derive(&model, &config(100.0), &DeviceConfig::zc706()).unwrap_err();
        assert!(matches!(err, LayerError::ThroughputMismatch { .. }));
    }

    #[test]
    fn test_bandwidth_util_reported() {
        let model = Passthrough {
            elements: 4096.0,
            skew: 1.0,
        };
        let d = DeviceConfig::zc706();
        let m = derive(&model, &config(100.0), &d).unwrap();
        // 4 + 4 words/cycle of the 32 available.
        approx::assert_relative_eq!(m.mem_bw_util, 25.0);
    }
}
