// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # flow-core
//!
//! Numeric primitives shared by every dataflow layer model:
//!
//! - [`TensorShape`]: a five-dimensional (NCDHW) activation shape.
//! - [`Topology`]: the fixed pipeline shapes a layer can decompose into.
//! - [`StageMatrix`]: an `(S, S+1)` matrix whose only non-zero entries lie
//!   on the diagonal (stage self-rates) and the superdiagonal (inter-stage
//!   edges). The sparsity pattern is enforced by construction.
//! - [`balance`]: resolves external memory bandwidth against the
//!   compute-limited flow of a combined rate matrix.
//!
//! # Example
//! ```
//! use flow_core::{balance, StageMatrix, Topology};
//!
//! // memory-in -> one compute stage -> memory-out
//! let gamma = StageMatrix::from_band(
//!     Topology::TwoStage,
//!     vec![8.0, 4.0],
//!     vec![-4.0, -8.0],
//! )
//! .unwrap();
//! let balanced = balance(&gamma).unwrap();
//! assert!(!balanced.mem_bounded_in);
//! assert_eq!(balanced.flow_in, 4.0);
//! assert_eq!(balanced.rates.stage(0), 8.0);
//! ```

mod balance;
mod error;
mod matrix;
mod shape;
mod topology;

pub use balance::{balance, Balanced, RELATIVE_TOLERANCE};
pub use error::MatrixError;
pub use matrix::StageMatrix;
pub use shape::TensorShape;
pub use topology::Topology;
