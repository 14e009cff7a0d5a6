// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The matrix-builder contract every primitive layer kind implements.
//!
//! A layer decomposes into a fixed chain of stages (its [`Topology`]).
//! Four banded matrices describe it:
//!
//! | matrix   | entry `(i, i)`              | entry `(i, i+1)`              |
//! |----------|-----------------------------|-------------------------------|
//! | rate     | stage duty factor in (0, 1] | edge duty factor in (0, 1]    |
//! | stream   | parallel streams in stage   | parallel streams on edge      |
//! | data     | words produced per stream   | −words consumed per stream    |
//! | workload | elements through the stage  | elements across the edge      |
//!
//! `Γ = rate ∘ stream ∘ data` is the achievable words/cycle of every stage
//! and edge; its `(0, 0)` and `(S-1, S)` entries carry the memory
//! bandwidths. The workload matrix depends on shapes only.

use crate::{Configuration, Factors, Resources};
use flow_core::{MatrixError, StageMatrix, Topology};

pub trait StageModel: Send + Sync {
    fn name(&self) -> &str;

    fn topology(&self) -> Topology;

    fn rate_matrix(&self, factors: &Factors) -> Result<StageMatrix, MatrixError>;

    fn stream_matrix(&self, factors: &Factors) -> Result<StageMatrix, MatrixError>;

    fn data_matrix(&self, mem_bw_in: f64, mem_bw_out: f64) -> Result<StageMatrix, MatrixError>;

    fn workload_matrix(&self) -> Result<StageMatrix, MatrixError>;

    fn resources(&self, factors: &Factors) -> Resources;

    /// Arithmetic operations of one inference.
    fn total_ops(&self) -> f64;

    /// Words that make up one input volume and one output volume, in the
    /// units of the workload matrix's first and last entries.
    fn volumes(&self) -> (f64, f64);

    /// `Γ = rate ∘ stream ∘ data`.
    fn gamma(&self, config: &Configuration) -> Result<StageMatrix, MatrixError> {
        let factors = config.parallelism.factors();
        self.rate_matrix(&factors)?
            .hadamard(&self.stream_matrix(&factors)?)?
            .hadamard(&self.data_matrix(config.mem_bw_in, config.mem_bw_out)?)
    }
}
