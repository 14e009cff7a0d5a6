// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Global average pooling.
//!
//! Two stages: `mem → accumulate/scale → mem`. In approximate mode only the
//! per-channel results are counted as input workload and the fill latency
//! is a constant 2 cycles; in exact mode the whole spatio-temporal volume is
//! streamed and the accumulators must see every element before the first
//! result leaves.

use super::ceil_tol;
use crate::{streams, Factors, LayerError, Resources, StageModel};
use flow_core::{MatrixError, StageMatrix, TensorShape, Topology};
use model_ir::LayerDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub struct GapLayer {
    name: String,
    input: TensorShape,
    channels: usize,
    approximate: bool,
}

impl GapLayer {
    pub fn from_descriptor(desc: &LayerDescriptor, approximate: bool) -> Result<Self, LayerError> {
        let input = desc.input_shape()?;
        Ok(Self {
            name: desc.name.clone(),
            input,
            channels: input.channels,
            approximate,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_approximate(&self) -> bool {
        self.approximate
    }

    /// Words read from memory per inference.
    fn words_in(&self) -> f64 {
        if self.approximate {
            self.channels as f64
        } else {
            self.input.volume_elements() as f64
        }
    }

    pub fn depth(&self, coarse_inout: f64) -> u64 {
        if self.approximate {
            2
        } else {
            ceil_tol(1.0 / coarse_inout) * self.input.spatial_volume() as u64
        }
    }
}

impl StageModel for GapLayer {
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
        super::single_stage::data(mem_bw_in, mem_bw_out, 1.0)
    }

    fn workload_matrix(&self) -> Result<StageMatrix, MatrixError> {
        let words_in = self.words_in();
        StageMatrix::from_band(
            Topology::TwoStage,
            vec![words_in, words_in],
            vec![words_in, self.channels as f64],
        )
    }

    fn resources(&self, factors: &Factors) -> Resources {
        let c = factors.coarse_in;
        Resources {
            muls: streams(2 * self.channels, c) as u64,
            adds: streams(self.channels, c) as u64,
            memory_words: self.channels as u64,
            depth: self.depth(c),
        }
    }

    fn total_ops(&self) -> f64 {
        if self.approximate {
            2.0 * self.channels as f64
        } else {
            (self.input.volume_elements() + self.channels) as f64
        }
    }

    fn volumes(&self) -> (f64, f64) {
        (self.words_in(), self.channels as f64)
    }
}
