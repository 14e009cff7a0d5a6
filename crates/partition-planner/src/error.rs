// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the partition planner.

use layer_model::LayerError;

/// Errors that can occur while composing or searching partitions.
///
/// A partition without any feasible composition is not an error; see
/// [`SearchOutcome::NoFeasible`](crate::SearchOutcome::NoFeasible).
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// A partition must contain at least one layer.
    #[error("partition '{0}' has no layers")]
    EmptyPartition(String),

    /// Every layer needs exactly one candidate set.
    #[error("partition '{partition}' has {layers} layers but {candidates} candidate sets")]
    CandidateMismatch {
        partition: String,
        layers: usize,
        candidates: usize,
    },

    /// A composition was given the wrong number of configurations.
    #[error("partition '{partition}' expects {expected} configurations, got {got}")]
    ConfigurationCount {
        partition: String,
        expected: usize,
        got: usize,
    },

    /// The Cartesian product does not fit in a `u64` index.
    #[error("search space of partition '{0}' is too large to enumerate")]
    SearchSpaceTooLarge(String),

    /// Evaluating one layer failed.
    #[error(transparent)]
    Layer(#[from] LayerError),
}
