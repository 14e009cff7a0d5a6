// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for shape and stage-matrix operations.

use crate::Topology;

/// Errors that can occur when building or combining stage matrices.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    /// Two matrices of different topologies were combined elementwise.
    #[error("topology mismatch: {left} vs {right}")]
    TopologyMismatch { left: Topology, right: Topology },

    /// A band vector does not have one entry per stage.
    #[error("{band} band of a {topology} matrix needs {expected} entries, got {got}")]
    BandLength {
        topology: Topology,
        band: &'static str,
        expected: usize,
        got: usize,
    },

    /// A write targeted an entry outside the diagonal/superdiagonal band.
    #[error("entry ({row}, {col}) lies outside the stage band")]
    OffBand { row: usize, col: usize },

    /// An index is outside the `(S, S+1)` shape.
    #[error("entry ({row}, {col}) is out of bounds for shape {rows}x{cols}")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A rate needed by the balancer is zero or not a number.
    #[error("degenerate rate {value} at ({row}, {col})")]
    DegenerateRate { row: usize, col: usize, value: f64 },

    /// A non-zero workload would have to cross an edge with zero rate.
    #[error("non-zero workload over zero rate at ({row}, {col})")]
    ZeroRate { row: usize, col: usize },

    /// A shape did not have a supported rank.
    #[error("unsupported tensor rank {rank}: expected 5 (NCDHW) or 2 (N, features)")]
    InvalidRank { rank: usize },
}
