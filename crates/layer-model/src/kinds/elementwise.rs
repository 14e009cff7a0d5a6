// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Elementwise `Add` / `Mul` of two tensors.
//!
//! When the second operand is a per-channel vector (the excitation branch
//! of a squeeze-excitation block) it is held on-chip and broadcast, so only
//! the primary operand is streamed. Otherwise both operands are streamed
//! and each output element consumes two input words.

use crate::{streams, Factors, LayerError, Resources, StageModel};
use flow_core::{MatrixError, StageMatrix, TensorShape, Topology};
use model_ir::{ElementWiseKind, LayerDescriptor, ModelError, OpKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ElementWiseLayer {
    name: String,
    op: ElementWiseKind,
    output: TensorShape,
    channels: usize,
    broadcast: bool,
    operands: usize,
}

impl ElementWiseLayer {
    pub fn from_descriptor(desc: &LayerDescriptor) -> Result<Self, LayerError> {
        let op = match desc.op_kind()? {
            OpKind::ElementWise(op) => op,
            _ => {
                return Err(LayerError::Model(ModelError::InvalidLayer {
                    layer: desc.name.clone(),
                    detail: "not an elementwise operation".to_string(),
                }))
            }
        };
        let input = desc.input_shape()?;
        let broadcast = desc
            .shape_in
            .get(1)
            .is_some_and(|other| other.spatial_volume() == 1 && input.spatial_volume() > 1);
        let operands = if desc.shape_in.len() > 1 && !broadcast { 2 } else { 1 };
        Ok(Self {
            name: desc.name.clone(),
            op,
            output: desc.shape_out,
            channels: input.channels,
            broadcast,
            operands,
        })
    }

    pub fn op(&self) -> ElementWiseKind {
        self.op
    }

    pub fn is_broadcast(&self) -> bool {
        self.broadcast
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    fn elements(&self) -> f64 {
        self.output.volume_elements() as f64
    }
}

impl StageModel for ElementWiseLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn topology(&self) -> Topology {
        Topology::TwoStage
    }

    fn rate_matrix(&self, _: &Factors) -> Result<StageMatrix, MatrixError> {
        super::single_stage::rate()
    }

    fn stream_matrix(&self, factors: &Factors) -> Result<StageMatrix, MatrixError> {
        super::single_stage::stream(streams(self.channels, factors.coarse_in))
    }

    fn data_matrix(&self, mem_bw_in: f64, mem_bw_out: f64) -> Result<StageMatrix, MatrixError> {
        super::single_stage::data(mem_bw_in, mem_bw_out, self.operands as f64)
    }

    fn workload_matrix(&self) -> Result<StageMatrix, MatrixError> {
        super::single_stage::workload(self.elements() * self.operands as f64, self.elements())
    }

    fn resources(&self, factors: &Factors) -> Resources {
        let n = streams(self.channels, factors.coarse_in) as u64;
        let (muls, adds) = match self.op {
            ElementWiseKind::Add => (0, n),
            ElementWiseKind::Mul => (n, 0),
        };
        Resources {
            muls,
            adds,
            memory_words: if self.broadcast { self.channels as u64 } else { 0 },
            depth: 1,
        }
    }

    fn total_ops(&self) -> f64 {
        self.elements()
    }

    fn volumes(&self) -> (f64, f64) {
        (self.elements() * self.operands as f64, self.elements())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derive, Configuration, Parallelism};
    use device::DeviceConfig;

    fn descriptor(operation: &str, second: TensorShape) -> LayerDescriptor {
        let main = TensorShape::new(1, 16, 4, 8, 8);
        LayerDescriptor {
            name: format!("{operation}_0"),
            operation: operation.into(),
            shape_in: vec![main, second],
            shape_out: main,
            kernel: None,
            bias: vec![],
            groups: 1,
            padding: vec![],
            stride: vec![],
            dilation: vec![],
            branching: false,
            primitive_ops: vec![],
        }
    }

    #[test]
    fn test_two_streamed_operands() {
        let add = ElementWiseLayer::from_descriptor(&descriptor(
            "Add",
            TensorShape::new(1, 16, 4, 8, 8),
        ))
        .unwrap();
        assert!(!add.is_broadcast());
        assert_eq!(add.workload_matrix().unwrap().first(), 2.0 * 4096.0);
        let r = add.resources(&Factors {
            fine: 1.0,
            coarse_in: 0.5,
            coarse_out: 0.5,
        });
        assert_eq!((r.muls, r.adds, r.memory_words), (0, 8, 0));
    }

    #[test]
    fn test_broadcast_mul() {
        let mul = ElementWiseLayer::from_descriptor(&descriptor(
            "Mul",
            TensorShape::new(1, 16, 1, 1, 1),
        ))
        .unwrap();
        assert!(mul.is_broadcast());
        assert_eq!(mul.op(), ElementWiseKind::Mul);
        let r = mul.resources(&Factors {
            fine: 1.0,
            coarse_in: 1.0,
            coarse_out: 1.0,
        });
        assert_eq!((r.muls, r.adds, r.memory_words), (16, 0, 16));
    }

    #[test]
    fn test_rate_consistent() {
        let add = ElementWiseLayer::from_descriptor(&descriptor(
            "Add",
            TensorShape::new(1, 16, 4, 8, 8),
        ))
        .unwrap();
        let config = Configuration::new(Parallelism::Shared { coarse_inout: 0.25 }, 8.0, 8.0);
        let m = derive(&add, &config, &DeviceConfig::zc706()).unwrap();
        // 4 streams, two words each: input flow 8 words/cycle.
        assert_eq!(m.rate_in, 8.0);
        assert_eq!(m.rate_out, 4.0);
        assert_eq!(m.latency_cycles, 1 + 1024);
    }

    #[test]
    fn test_rejects_other_operations() {
        let err = ElementWiseLayer::from_descriptor(&descriptor(
            "Relu",
            TensorShape::new(1, 16, 4, 8, 8),
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            LayerError::Model(ModelError::InvalidLayer { ref layer, .. }) if layer == "Relu_0"
        ));
    }
}
