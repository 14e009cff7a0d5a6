// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Matrix builders, one module per layer kind.

mod activation;
mod batchnorm;
mod conv;
mod elementwise;
mod fc;
mod gap;
mod se;

pub use activation::ActivationLayer;
pub use batchnorm::BatchNormLayer;
pub use conv::{ConvLayer, PipelineDepth};
pub use elementwise::ElementWiseLayer;
pub use fc::FcLayer;
pub use gap::GapLayer;
pub use se::SqueezeExcitationLayer;

use flow_core::{MatrixError, StageMatrix, Topology};

/// `ceil(x)` that ignores float noise just above an integer.
pub(crate) fn ceil_tol(x: f64) -> u64 {
    (x - 1e-9).ceil().max(0.0) as u64
}

/// Stage matrices shared by the single-stage kinds (elementwise, activation,
/// batch-norm): memory → stage → memory with `n` parallel streams.
pub(crate) mod single_stage {
    use super::*;

    const T: Topology = Topology::TwoStage;

    pub fn rate() -> Result<StageMatrix, MatrixError> {
        StageMatrix::from_band(T, vec![1.0, 1.0], vec![1.0, 1.0])
    }

    pub fn stream(n: usize) -> Result<StageMatrix, MatrixError> {
        let n = n as f64;
        StageMatrix::from_band(T, vec![1.0, n], vec![n, 1.0])
    }

    /// `operands` words are consumed per element produced.
    pub fn data(bw_in: f64, bw_out: f64, operands: f64) -> Result<StageMatrix, MatrixError> {
        StageMatrix::from_band(T, vec![bw_in, 1.0], vec![-operands, -bw_out])
    }

    pub fn workload(words_in: f64, elements_out: f64) -> Result<StageMatrix, MatrixError> {
        StageMatrix::from_band(
            T,
            vec![words_in, elements_out],
            vec![words_in, elements_out],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_tol() {
        assert_eq!(ceil_tol(1.0 / (1.0 / 27.0)), 27);
        assert_eq!(ceil_tol(2.5), 3);
        assert_eq!(ceil_tol(1.0), 1);
        assert_eq!(ceil_tol(0.0), 0);
    }
}
