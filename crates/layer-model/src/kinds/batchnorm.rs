// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference-time batch normalization: one scale and one shift per channel.

use crate::{streams, Factors, LayerError, Resources, StageModel};
use flow_core::{MatrixError, StageMatrix, TensorShape, Topology};
use model_ir::LayerDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormLayer {
    name: String,
    input: TensorShape,
}

impl BatchNormLayer {
    pub fn from_descriptor(desc: &LayerDescriptor) -> Result<Self, LayerError> {
        Ok(Self {
            name: desc.name.clone(),
            input: desc.input_shape()?,
        })
    }

    pub fn channels(&self) -> usize {
        self.input.channels
    }

    fn elements(&self) -> f64 {
        self.input.volume_elements() as f64
    }
}

impl StageModel for BatchNormLayer {
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
        super::single_stage::stream(streams(self.input.channels, factors.coarse_in))
    }

    fn data_matrix(&self, mem_bw_in: f64, mem_bw_out: f64) -> Result<StageMatrix, MatrixError> {
        super::single_stage::data(mem_bw_in, mem_bw_out, 1.0)
    }

    fn workload_matrix(&self) -> Result<StageMatrix, MatrixError> {
        super::single_stage::workload(self.elements(), self.elements())
    }

    fn resources(&self, factors: &Factors) -> Resources {
        let n = streams(self.input.channels, factors.coarse_in) as u64;
        Resources {
            muls: n,
            adds: n,
            memory_words: 2 * self.input.channels as u64,
            depth: 2,
        }
    }

    fn total_ops(&self) -> f64 {
        2.0 * self.elements()
    }

    fn volumes(&self) -> (f64, f64) {
        (self.elements(), self.elements())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resources() {
        let shape = TensorShape::new(1, 24, 4, 8, 8);
        let bn = BatchNormLayer::from_descriptor(&LayerDescriptor {
            name: "BatchNormalization_0".into(),
            operation: "BatchNormalization".into(),
            shape_in: vec![shape],
            shape_out: shape,
            kernel: None,
            bias: vec![],
            groups: 1,
            padding: vec![],
            stride: vec![],
            dilation: vec![],
            branching: false,
            primitive_ops: vec![],
        })
        .unwrap();
        let r = bn.resources(&Factors {
            fine: 1.0,
            coarse_in: 1.0 / 3.0,
            coarse_out: 1.0 / 3.0,
        });
        assert_eq!((r.muls, r.adds, r.memory_words, r.depth), (8, 8, 48, 2));
        assert_eq!(bn.topology(), Topology::TwoStage);
    }
}
