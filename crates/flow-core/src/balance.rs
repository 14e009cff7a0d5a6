// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Rate balancing of a combined (Γ) matrix.
//!
//! # Model
//!
//! Row `i` of Γ is the edge leaving node `i`. Node `0` is the input memory
//! and node `S` the output memory; nodes `1..S` are compute stages. For a
//! compute stage `j`:
//!
//! ```text
//! consumes |Γ[j-1, j]| words/cycle from edge j-1
//! produces |Γ[j,   j]| words/cycle onto  edge j
//! ratio    r_j = |Γ[j, j]| / |Γ[j-1, j]|
//! ```
//!
//! The compute-limited input flow is the largest `x` every stage can
//! sustain, `x = min_j |Γ[j-1, j]| / (r_1 ⋯ r_{j-1})`, and the flow on edge
//! `i` is `f_i = x · r_1 ⋯ r_i`.
//!
//! Memory throttles that flow: with `R = r_1 ⋯ r_{S-1}` the sustained input
//! flow is `x' = min(x, bw_in, bw_out / R)`. The balanced matrix Γ′ carries
//! `f_i = x' · r_1 ⋯ r_i` on every internal entry, so a memory bottleneck
//! slows every stage. A boundary is memory-bound when its bandwidth does not
//! exceed the flow it must carry (ties count as bound). A limiting memory
//! entry carries that flow; a non-limiting one keeps its supplied bandwidth.
//!
//! Γ′ is a fixed point: balancing it again yields the same entries and the
//! same flags, because its internal entries already sustain `x'` and its
//! memory entries are unchanged.

use crate::{MatrixError, StageMatrix};

/// Relative slack used when comparing a bandwidth against a flow.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// A balanced rate matrix and its boundary status.
#[derive(Debug, Clone, PartialEq)]
pub struct Balanced {
    /// All-positive, rate-consistent Γ′.
    pub rates: StageMatrix,
    /// Sustained words/cycle read from input memory.
    pub flow_in: f64,
    /// Sustained words/cycle written to output memory.
    pub flow_out: f64,
    /// The input memory edge limits the pipeline.
    pub mem_bounded_in: bool,
    /// The output memory edge limits the pipeline.
    pub mem_bounded_out: bool,
}

/// Balances a combined rate matrix.
///
/// Signs are ignored; only magnitudes matter. Memory bandwidth entries
/// (`(0, 0)` and `(S-1, S)`) may be `+∞` to model on-chip edges. Every other
/// band entry must be finite and non-zero.
pub fn balance(gamma: &StageMatrix) -> Result<Balanced, MatrixError> {
    let s = gamma.stages();
    let mags = gamma.abs();

    for (row, col, value) in mags.band() {
        let memory = (row, col) == (0, 0) || (row, col) == (s - 1, s);
        let bad = value == 0.0 || value.is_nan() || (!memory && value.is_infinite());
        if bad {
            return Err(MatrixError::DegenerateRate { row, col, value });
        }
    }

    // Compute-limited input flow and the end-to-end ratio R.
    let mut ratio_product = 1.0;
    let mut compute_in = f64::INFINITY;
    for j in 1..s {
        let consumed = mags.edge(j - 1);
        compute_in = compute_in.min(consumed / ratio_product);
        ratio_product *= mags.stage(j) / consumed;
    }

    let bandwidth_in = mags.first();
    let bandwidth_out = mags.last();
    let flow_in = compute_in.min(bandwidth_in).min(bandwidth_out / ratio_product);
    let flow_out = flow_in * ratio_product;
    let mem_bounded_in = is_limiting(bandwidth_in, flow_in);
    let mem_bounded_out = is_limiting(bandwidth_out, flow_out);

    // Consistent flow on every edge.
    let mut flows = Vec::with_capacity(s);
    let mut f = flow_in;
    flows.push(f);
    for j in 1..s {
        f *= mags.stage(j) / mags.edge(j - 1);
        flows.push(f);
    }

    let mut diag = flows.clone();
    let mut upper = flows;
    diag[0] = if mem_bounded_in { flow_in } else { bandwidth_in };
    upper[s - 1] = if mem_bounded_out { flow_out } else { bandwidth_out };

    let rates = StageMatrix::from_band(gamma.topology(), diag, upper)?;
    tracing::trace!(
        mem_bounded_in,
        mem_bounded_out,
        compute_in,
        flow_in,
        "balanced rates:\n{rates}"
    );

    Ok(Balanced {
        rates,
        flow_in,
        flow_out,
        mem_bounded_in,
        mem_bounded_out,
    })
}

fn is_limiting(bandwidth: f64, flow: f64) -> bool {
    bandwidth <= flow * (1.0 + RELATIVE_TOLERANCE)
}
