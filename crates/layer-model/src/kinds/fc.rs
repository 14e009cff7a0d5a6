// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully-connected (`Gemm` / `MatMul`) layers.
//!
//! Three stages: `mem → fork → multiply/accumulate → mem`. Each of the
//! `sin` input streams is fanned out to `sout` multipliers, and each output
//! stream accumulates one partial sum per input stream.

use crate::{streams, Factors, LayerError, Resources, StageModel};
use flow_core::{MatrixError, StageMatrix, Topology};
use model_ir::LayerDescriptor;

const T: Topology = Topology::ThreeStage;

#[derive(Debug, Clone, PartialEq)]
pub struct FcLayer {
    name: String,
    features_in: usize,
    features_out: usize,
}

impl FcLayer {
    pub fn from_descriptor(desc: &LayerDescriptor) -> Result<Self, LayerError> {
        Ok(Self {
            name: desc.name.clone(),
            features_in: desc.input_shape()?.volume_elements(),
            features_out: desc.shape_out.volume_elements(),
        })
    }

    pub fn features_in(&self) -> usize {
        self.features_in
    }

    pub fn features_out(&self) -> usize {
        self.features_out
    }

    fn streams(&self, factors: &Factors) -> (f64, f64) {
        (
            streams(self.features_in, factors.coarse_in) as f64,
            streams(self.features_out, factors.coarse_out) as f64,
        )
    }
}

impl StageModel for FcLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn topology(&self) -> Topology {
        T
    }

    fn rate_matrix(&self, _: &Factors) -> Result<StageMatrix, MatrixError> {
        StageMatrix::from_band(T, vec![1.0; 3], vec![1.0; 3])
    }

    fn stream_matrix(&self, factors: &Factors) -> Result<StageMatrix, MatrixError> {
        let (sin, sout) = self.streams(factors);
        StageMatrix::from_band(T, vec![1.0, sin * sout, sout], vec![sin, sin * sout, 1.0])
    }

    fn data_matrix(&self, mem_bw_in: f64, mem_bw_out: f64) -> Result<StageMatrix, MatrixError> {
        StageMatrix::from_band(T, vec![mem_bw_in, 1.0, 1.0], vec![-1.0, -1.0, -mem_bw_out])
    }

    fn workload_matrix(&self) -> Result<StageMatrix, MatrixError> {
        let i = self.features_in as f64;
        let o = self.features_out as f64;
        StageMatrix::from_band(T, vec![i, i * o, o], vec![i, i * o, o])
    }

    fn resources(&self, factors: &Factors) -> Resources {
        let (sin, sout) = self.streams(factors);
        let (sin, sout) = (sin as u64, sout as u64);
        Resources {
            muls: sin * sout,
            adds: sin * sout,
            memory_words: (self.features_in * self.features_out + self.features_out) as u64,
            depth: sin + sout,
        }
    }

    fn total_ops(&self) -> f64 {
        2.0 * self.features_in as f64 * self.features_out as f64
    }

    fn volumes(&self) -> (f64, f64) {
        (self.features_in as f64, self.features_out as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derive, Configuration, Parallelism};
    use device::DeviceConfig;
    use flow_core::TensorShape;

    fn fc(i: usize, o: usize) -> FcLayer {
        FcLayer::from_descriptor(&LayerDescriptor {
            name: "Gemm_0".into(),
            operation: "Gemm".into(),
            shape_in: vec![TensorShape::features(1, i)],
            shape_out: TensorShape::features(1, o),
            kernel: None,
            bias: vec![o],
            groups: 1,
            padding: vec![],
            stride: vec![],
            dilation: vec![],
            branching: false,
            primitive_ops: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_resources() {
        let layer = fc(64, 10);
        let r = layer.resources(&Factors {
            fine: 1.0,
            coarse_in: 0.25,
            coarse_out: 0.5,
        });
        assert_eq!((r.muls, r.adds, r.depth), (80, 80, 21));
        assert_eq!(r.memory_words, 650);
    }

    #[test]
    fn test_compute_bound_latency() {
        let layer = fc(64, 10);
        let config = Configuration::new(
            Parallelism::Channels {
                coarse_in: 0.25,
                coarse_out: 0.5,
            },
            32.0,
            32.0,
        );
        let m = derive(&layer, &config, &DeviceConfig::zc706()).unwrap();
        // 640 MACs over 16 × 5 multipliers, plus a depth of 21.
        assert_eq!(m.latency_cycles, 8 + 21);
        assert_eq!(m.rate_in, 16.0);
        assert_eq!(m.rate_out, 5.0);
        assert_eq!(m.total_ops, 1280.0);
    }

    #[test]
    fn test_topology() {
        let layer = fc(8, 4);
        assert_eq!(layer.topology(), Topology::ThreeStage);
        assert_eq!(layer.workload_matrix().unwrap().shape(), (3, 4));
    }
}
