// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for layer model construction and evaluation.

use crate::ParallelismKind;
use flow_core::MatrixError;
use model_ir::ModelError;

/// Errors that can occur when building or evaluating a layer model.
///
/// An infeasible design point is not an error; see
/// [`Evaluation::Infeasible`](crate::Evaluation::Infeasible).
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// A stage matrix could not be built, combined or balanced.
    #[error("matrix error in layer '{layer}': {source}")]
    Matrix {
        layer: String,
        #[source]
        source: MatrixError,
    },

    /// The layer descriptor is unusable.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A parallelism fraction is outside `(0, 1]`.
    #[error("parallelism factor '{factor}' must lie in (0, 1], got {value}")]
    InvalidFactor { factor: &'static str, value: f64 },

    /// A memory bandwidth allocation is not positive.
    #[error("memory bandwidth '{side}' must be positive, got {value}")]
    InvalidBandwidth { side: &'static str, value: f64 },

    /// The configuration's parallelism does not fit the layer kind.
    #[error("layer '{layer}' expects {expected} parallelism, got {got}")]
    ConfigurationMismatch {
        layer: String,
        expected: ParallelismKind,
        got: ParallelismKind,
    },

    /// Input and output throughput disagree: the matrix builders are
    /// inconsistent for this layer.
    #[error("throughput mismatch in layer '{layer}': in = {thr_in} volumes/s, out = {thr_out} volumes/s")]
    ThroughputMismatch {
        layer: String,
        thr_in: f64,
        thr_out: f64,
    },
}

impl LayerError {
    pub(crate) fn matrix(layer: &str) -> impl FnOnce(MatrixError) -> LayerError + '_ {
        move |source| LayerError::Matrix {
            layer: layer.to_string(),
            source,
        }
    }
}
