// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Squeeze-excitation blocks modeled as one composite layer.
//!
//! The block's primitives (pool, reduce, activation, expand, gate, scale)
//! run back to back, so their latencies and depths add up and their
//! resources are allocated side by side. Only the first primitive reads
//! from external memory and only the last one writes to it; every edge in
//! between is on-chip.

use crate::{Configuration, LayerError, LayerModel, Metrics, ModelOptions};
use device::{DeviceConfig, Utilization};
use model_ir::{LayerDescriptor, ModelError};

#[derive(Debug, Clone, PartialEq)]
pub struct SqueezeExcitationLayer {
    name: String,
    channels_in: usize,
    channels_out: usize,
    primitives: Vec<LayerModel>,
}

impl SqueezeExcitationLayer {
    pub fn from_descriptor(
        desc: &LayerDescriptor,
        options: &ModelOptions,
    ) -> Result<Self, LayerError> {
        let primitives = desc
            .primitive_ops
            .iter()
            .map(|p| {
                if matches!(p.op_kind(), Ok(model_ir::OpKind::SqueezeExcitation)) {
                    return Err(LayerError::Model(ModelError::InvalidLayer {
                        layer: desc.name.clone(),
                        detail: format!("nested squeeze-excitation block '{}'", p.name),
                    }));
                }
                LayerModel::from_descriptor(p, options)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if primitives.is_empty() {
            return Err(LayerError::Model(ModelError::InvalidLayer {
                layer: desc.name.clone(),
                detail: "squeeze-excitation block without primitive ops".into(),
            }));
        }
        Ok(Self {
            name: desc.name.clone(),
            channels_in: desc.input_shape()?.channels,
            channels_out: desc.shape_out.channels,
            primitives,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primitives(&self) -> &[LayerModel] {
        &self.primitives
    }

    pub fn channels_in(&self) -> usize {
        self.channels_in
    }

    pub fn channels_out(&self) -> usize {
        self.channels_out
    }

    /// Configuration handed to primitive `index`: the block's fractions
    /// re-shaped for that primitive, external bandwidth only at the ends.
    fn primitive_config(&self, index: usize, config: &Configuration) -> Configuration {
        let last = self.primitives.len() - 1;
        let kind = self.primitives[index].parallelism_kind();
        Configuration::new(
            config.parallelism.project(kind),
            if index == 0 { config.mem_bw_in } else { f64::INFINITY },
            if index == last { config.mem_bw_out } else { f64::INFINITY },
        )
    }

    /// Ungated figures of the whole block.
    pub fn metrics(
        &self,
        config: &Configuration,
        device: &DeviceConfig,
    ) -> Result<Metrics, LayerError> {
        let parts = self
            .primitives
            .iter()
            .enumerate()
            .map(|(i, p)| p.metrics(&self.primitive_config(i, config), device))
            .collect::<Result<Vec<_>, _>>()?;

        // Non-empty by construction.
        let first = parts[0];
        let last = parts[parts.len() - 1];

        let latency_cycles: u64 = parts.iter().map(|m| m.latency_cycles).sum();
        let total_ops: f64 = parts.iter().map(|m| m.total_ops).sum();
        let memory_words: u64 = parts.iter().map(|m| m.memory_words).sum();
        let utilization: Utilization = parts.iter().map(|m| m.utilization).sum();
        let latency_sec = device.cycles_to_seconds(latency_cycles as f64);

        tracing::trace!(layer = %self.name, primitives = parts.len(), latency_cycles, "composed block");

        Ok(Metrics {
            latency_cycles,
            latency_sec,
            throughput_gops: total_ops / latency_sec * 1e-9,
            throughput_vols: 1.0 / latency_sec,
            utilization,
            rate_in: first.rate_in,
            rate_out: last.rate_out,
            depth: parts.iter().map(|m| m.depth).sum(),
            muls: parts.iter().map(|m| m.muls).sum(),
            adds: parts.iter().map(|m| m.adds).sum(),
            memory_words,
            memory_kb: device.words_to_kb(memory_words),
            mem_bounded_in: first.mem_bounded_in,
            mem_bounded_out: last.mem_bounded_out,
            mem_bw_util: device.bandwidth_util(first.rate_in + last.rate_out),
            total_ops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parallelism;
    use flow_core::TensorShape;

    fn primitive(
        name: &str,
        operation: &str,
        shape_in: Vec<TensorShape>,
        shape_out: TensorShape,
        kernel: Option<Vec<usize>>,
    ) -> LayerDescriptor {
        LayerDescriptor {
            name: name.into(),
            operation: operation.into(),
            shape_in,
            shape_out,
            kernel,
            bias: vec![],
            groups: 1,
            padding: vec![],
            stride: vec![],
            dilation: vec![],
            branching: false,
            primitive_ops: vec![],
        }
    }

    fn se_block() -> LayerDescriptor {
        let x = TensorShape::new(1, 16, 4, 8, 8);
        let v16 = TensorShape::new(1, 16, 1, 1, 1);
        let v4 = TensorShape::new(1, 4, 1, 1, 1);
        let mut se = primitive("se_0", "SqueezeExcitation", vec![x], x, None);
        se.primitive_ops = vec![
            primitive("se_0_gap", "GlobalAveragePool", vec![x], v16, None),
            primitive("se_0_reduce", "Conv", vec![v16], v4, Some(vec![4, 16, 1, 1, 1])),
            primitive("se_0_swish", "Swish", vec![v4], v4, None),
            primitive("se_0_expand", "Conv", vec![v4], v16, Some(vec![16, 4, 1, 1, 1])),
            primitive("se_0_sigmoid", "Sigmoid", vec![v16], v16, None),
            primitive("se_0_scale", "Mul", vec![x, v16], x, None),
        ];
        se
    }

    fn config(c: f64) -> Configuration {
        Configuration::new(
            Parallelism::Channels {
                coarse_in: c,
                coarse_out: c,
            },
            16.0,
            16.0,
        )
    }

    #[test]
    fn test_sums_primitives() {
        let block =
            SqueezeExcitationLayer::from_descriptor(&se_block(), &ModelOptions::default()).unwrap();
        assert_eq!(block.primitives().len(), 6);
        let d = DeviceConfig::zc706();
        let total = block.metrics(&config(1.0), &d).unwrap();

        let mut latency = 0;
        let mut muls = 0;
        for (i, p) in block.primitives().iter().enumerate() {
            let m = p.metrics(&block.primitive_config(i, &config(1.0)), &d).unwrap();
            latency += m.latency_cycles;
            muls += m.muls;
        }
        assert_eq!(total.latency_cycles, latency);
        assert_eq!(total.muls, muls);
    }

    #[test]
    fn test_inner_edges_on_chip() {
        let block =
            SqueezeExcitationLayer::from_descriptor(&se_block(), &ModelOptions::default()).unwrap();
        let c = block.primitive_config(2, &config(0.5));
        assert!(c.mem_bw_in.is_infinite());
        assert!(c.mem_bw_out.is_infinite());
        let first = block.primitive_config(0, &config(0.5));
        assert_eq!(first.mem_bw_in, 16.0);
        assert!(first.mem_bw_out.is_infinite());
        let last = block.primitive_config(5, &config(0.5));
        assert_eq!(last.mem_bw_out, 16.0);
    }

    #[test]
    fn test_nested_block_rejected() {
        let mut outer = se_block();
        outer.primitive_ops.push(se_block());
        let err = SqueezeExcitationLayer::from_descriptor(&outer, &ModelOptions::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_more_parallelism_more_dsp() {
        let block =
            SqueezeExcitationLayer::from_descriptor(&se_block(), &ModelOptions::default()).unwrap();
        let d = DeviceConfig::zc706();
        let low = block.metrics(&config(0.25), &d).unwrap();
        let high = block.metrics(&config(1.0), &d).unwrap();
        assert!(high.muls >= low.muls);
        assert!(high.utilization.dsp_util >= low.utilization.dsp_util);
    }
}
