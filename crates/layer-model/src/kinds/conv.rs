// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 3-D convolution.
//!
//! General and pointwise convolutions use five stages:
//!
//! ```text
//! mem → sliding window → fork → conv → accumulate → mem
//! ```
//!
//! Depthwise convolutions drop the accumulation stage (four stages): every
//! group sees a single input channel, so there is nothing to sum across.
//! Pointwise convolutions keep five stages but their sliding window is a
//! single register with no line buffer.

use super::ceil_tol;
use crate::{streams, Factors, LayerError, Resources, StageModel};
use flow_core::{MatrixError, StageMatrix, TensorShape, Topology};
use model_ir::{ConvKind, LayerDescriptor, ModelError};

/// Fill latency of a convolution pipeline, split per stage group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineDepth {
    /// Sliding-window fill.
    pub window: u64,
    /// Multiply-accumulate tree over the unrolled kernel.
    pub compute: u64,
    /// Cross-channel accumulation; zero for depthwise.
    pub accumulation: u64,
}

impl PipelineDepth {
    pub fn total(&self) -> u64 {
        self.window + self.compute + self.accumulation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvLayer {
    name: String,
    kind: ConvKind,
    input: TensorShape,
    output: TensorShape,
    /// Input channels seen by one group.
    channels: usize,
    filters: usize,
    kernel: (usize, usize, usize),
}

impl ConvLayer {
    pub fn from_descriptor(desc: &LayerDescriptor) -> Result<Self, LayerError> {
        let input = desc.input_shape()?;
        let invalid = |detail: &str| {
            LayerError::Model(ModelError::InvalidLayer {
                layer: desc.name.clone(),
                detail: detail.to_string(),
            })
        };
        let kind = desc.conv_kind().ok_or_else(|| invalid("not a convolution"))?;
        let kernel = desc.kernel_spatial().ok_or_else(|| invalid("missing kernel"))?;
        let channels = match kind {
            ConvKind::Depthwise => input.channels / desc.groups.max(1),
            _ => input.channels,
        };
        Ok(Self {
            name: desc.name.clone(),
            kind,
            input,
            output: desc.shape_out,
            channels,
            filters: desc.shape_out.channels,
            kernel,
        })
    }

    pub fn kind(&self) -> ConvKind {
        self.kind
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn filters(&self) -> usize {
        self.filters
    }

    pub fn kernel(&self) -> (usize, usize, usize) {
        self.kernel
    }

    pub fn kernel_elems(&self) -> usize {
        let (kd, kh, kw) = self.kernel;
        kd * kh * kw
    }

    fn depthwise(&self) -> bool {
        self.kind == ConvKind::Depthwise
    }

    /// Output over input spatial volume (resampling of the window stage).
    fn spatial_ratio(&self) -> f64 {
        self.output.spatial_volume() as f64 / self.input.spatial_volume() as f64
    }

    /// Builds the matrix from its five-stage bands, dropping the
    /// accumulation stage for depthwise layers.
    fn shape(&self, diag: [f64; 5], upper: [f64; 5]) -> Result<StageMatrix, MatrixError> {
        if self.depthwise() {
            StageMatrix::from_band(
                Topology::FourStage,
                diag[..4].to_vec(),
                vec![upper[0], upper[1], upper[2], upper[4]],
            )
        } else {
            StageMatrix::from_band(Topology::FiveStage, diag.to_vec(), upper.to_vec())
        }
    }

    /// Fill latency for the given factors.
    pub fn pipeline_depth(&self, factors: &Factors) -> PipelineDepth {
        let sin = streams(self.channels, factors.coarse_in) as u64;
        let sout = streams(self.filters, factors.coarse_out) as u64;
        let (kd, kh, kw) = self.kernel;
        let kw1 = kw.saturating_sub(1).max(1) as u64;

        let window = match self.kind {
            ConvKind::Pointwise => 1,
            _ => {
                let lines = (self.input.depth * self.input.rows) as u64 * kw1 * sin;
                lines + sin * (kd * kh) as u64 * kw1
            }
        };
        let accumulation = if self.depthwise() { 0 } else { sin * sout };

        PipelineDepth {
            window,
            compute: ceil_tol(1.0 / factors.fine),
            accumulation,
        }
    }

    /// On-chip words held by the sliding-window line buffers.
    pub fn window_buffer(&self) -> u64 {
        if self.kind == ConvKind::Pointwise {
            return 0;
        }
        let (kd, kh, kw) = self.kernel;
        let kw1 = kw.saturating_sub(1).max(1);
        let c = self.channels;
        (self.input.depth * self.input.rows * kw1 * c + c * kd * kh * kw1) as u64
    }
}

impl StageModel for ConvLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn topology(&self) -> Topology {
        if self.depthwise() {
            Topology::FourStage
        } else {
            Topology::FiveStage
        }
    }

    fn rate_matrix(&self, factors: &Factors) -> Result<StageMatrix, MatrixError> {
        let fine = factors.fine;
        self.shape(
            [1.0, self.spatial_ratio(), 1.0, fine, 1.0],
            [1.0, 1.0, fine, 1.0, 1.0],
        )
    }

    fn stream_matrix(&self, factors: &Factors) -> Result<StageMatrix, MatrixError> {
        let sin = streams(self.channels, factors.coarse_in) as f64;
        let sout = streams(self.filters, factors.coarse_out) as f64;
        let both = sin * sout;
        self.shape([1.0, sin, both, both, sout], [sin, sin, both, both, 1.0])
    }

    fn data_matrix(&self, mem_bw_in: f64, mem_bw_out: f64) -> Result<StageMatrix, MatrixError> {
        let k = self.kernel_elems() as f64;
        self.shape(
            [mem_bw_in, k, k, 1.0, 1.0],
            [-1.0, -k, -k, -1.0, -mem_bw_out],
        )
    }

    fn workload_matrix(&self) -> Result<StageMatrix, MatrixError> {
        let in_volume = self.input.spatial_volume() as f64;
        let out_volume = self.output.spatial_volume() as f64;
        let k = self.kernel_elems() as f64;
        let c = self.channels as f64;
        let f = self.filters as f64;

        let read = in_volume * c;
        let windows = out_volume * k * c;
        let products = windows * f;
        let partials = out_volume * c * f;
        let outputs = out_volume * f;
        self.shape(
            [read, windows, products, partials, outputs],
            [read, windows, products, partials, outputs],
        )
    }

    fn resources(&self, factors: &Factors) -> Resources {
        let sin = streams(self.channels, factors.coarse_in) as u64;
        let sout = streams(self.filters, factors.coarse_out) as u64;
        let k = self.kernel_elems() as u64;
        let unrolled = streams(self.kernel_elems(), factors.fine) as u64;

        let muls = unrolled * sin * sout;
        let mut adds = (unrolled - 1) * sin * sout;
        let mut memory_words = self.window_buffer() + k * (self.channels * self.filters) as u64;
        if !self.depthwise() {
            adds += (sin - 1) * sout;
            memory_words += self.channels as u64;
        }

        Resources {
            muls,
            adds,
            memory_words,
            depth: self.pipeline_depth(factors).total(),
        }
    }

    fn total_ops(&self) -> f64 {
        (self.output.spatial_volume() * self.kernel_elems() * self.channels * self.filters) as f64
    }

    fn volumes(&self) -> (f64, f64) {
        (
            (self.input.spatial_volume() * self.channels) as f64,
            (self.output.spatial_volume() * self.filters) as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Configuration, Parallelism};
    use device::DeviceConfig;

    fn descriptor(c: usize, f: usize, k: usize, groups: usize) -> LayerDescriptor {
        LayerDescriptor {
            name: "Conv_0".into(),
            operation: "Conv".into(),
            shape_in: vec![TensorShape::new(1, c, 8, 16, 16)],
            shape_out: TensorShape::new(1, f, 8, 16, 16),
            kernel: Some(vec![f, c / groups, k, k, k]),
            bias: vec![],
            groups,
            padding: vec![k / 2; 3],
            stride: vec![1; 3],
            dilation: vec![1; 3],
            branching: false,
            primitive_ops: vec![],
        }
    }

    fn full() -> Factors {
        Factors {
            fine: 1.0,
            coarse_in: 1.0,
            coarse_out: 1.0,
        }
    }

    #[test]
    fn test_general_topology() {
        let conv = ConvLayer::from_descriptor(&descriptor(16, 32, 3, 1)).unwrap();
        assert_eq!(conv.kind(), ConvKind::General);
        assert_eq!(conv.topology(), Topology::FiveStage);
        assert_eq!(conv.rate_matrix(&full()).unwrap().shape(), (5, 6));
        assert_eq!(conv.workload_matrix().unwrap().shape(), (5, 6));
    }

    #[test]
    fn test_pointwise_depth_and_buffer() {
        let conv = ConvLayer::from_descriptor(&descriptor(32, 64, 1, 1)).unwrap();
        assert_eq!(conv.kind(), ConvKind::Pointwise);
        let depth = conv.pipeline_depth(&full());
        assert_eq!(depth.window + depth.compute, 2);
        assert_eq!(conv.window_buffer(), 0);
        assert_eq!(depth.accumulation, 32 * 64);
    }

    #[test]
    fn test_depthwise_four_stages_no_accumulation() {
        let conv = ConvLayer::from_descriptor(&descriptor(32, 32, 3, 32)).unwrap();
        assert_eq!(conv.kind(), ConvKind::Depthwise);
        assert_eq!(conv.channels(), 1);
        assert_eq!(conv.topology(), Topology::FourStage);
        for m in [
            conv.rate_matrix(&full()).unwrap(),
            conv.stream_matrix(&full()).unwrap(),
            conv.data_matrix(4.0, 4.0).unwrap(),
            conv.workload_matrix().unwrap(),
        ] {
            assert_eq!(m.shape(), (4, 5));
        }
        assert_eq!(conv.pipeline_depth(&full()).accumulation, 0);
    }

    #[test]
    fn test_rate_entries_in_unit_interval() {
        let conv = ConvLayer::from_descriptor(&descriptor(16, 32, 3, 1)).unwrap();
        let rates = conv
            .rate_matrix(&Factors {
                fine: 1.0 / 3.0,
                coarse_in: 0.5,
                coarse_out: 0.5,
            })
            .unwrap();
        assert!(rates.band().all(|(_, _, v)| v > 0.0 && v <= 1.0));
    }

    #[test]
    fn test_data_matrix_signs() {
        let conv = ConvLayer::from_descriptor(&descriptor(16, 32, 3, 1)).unwrap();
        let d = conv.data_matrix(6.0, 2.0).unwrap();
        assert_eq!(d.first(), 6.0);
        assert_eq!(d.last(), -2.0);
        assert_eq!(d.edge(1), -27.0);
        assert!((1..5).all(|i| d.edge(i - 1) < 0.0 && d.stage(i) > 0.0));
    }

    #[test]
    fn test_resources_full_unroll() {
        let conv = ConvLayer::from_descriptor(&descriptor(4, 8, 3, 1)).unwrap();
        let r = conv.resources(&full());
        assert_eq!(r.muls, 27 * 4 * 8);
        assert_eq!(r.adds, 26 * 4 * 8 + 3 * 8);
        // window: 8*16*2*4 + 4*3*3*2, weights 27*4*8, accumulators 4.
        assert_eq!(r.memory_words, 1024 + 72 + 864 + 4);
    }

    #[test]
    fn test_fine_reduces_multipliers() {
        let conv = ConvLayer::from_descriptor(&descriptor(4, 8, 3, 1)).unwrap();
        let partial = conv.resources(&Factors {
            fine: 1.0 / 3.0,
            ..full()
        });
        assert_eq!(partial.muls, 9 * 4 * 8);
        assert_eq!(conv.pipeline_depth(&Factors { fine: 1.0 / 3.0, ..full() }).compute, 3);
    }

    #[test]
    fn test_rate_consistent_design_point() {
        let conv = ConvLayer::from_descriptor(&descriptor(4, 8, 3, 1)).unwrap();
        let config = Configuration::new(
            Parallelism::Conv {
                fine: 1.0 / 3.0,
                coarse_in: 0.5,
                coarse_out: 0.25,
            },
            16.0,
            16.0,
        );
        let m = crate::derive(&conv, &config, &DeviceConfig::zc706()).unwrap();
        assert!(m.latency_cycles > m.depth);
        assert!(m.throughput_vols > 0.0);
    }
}
