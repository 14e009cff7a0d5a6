// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed pipeline topologies.
//!
//! A topology with `S` stages is a chain of `S + 1` nodes: external memory
//! (read), `S - 1` compute stages, and external memory (write). Its stage
//! matrices have shape `(S, S + 1)`: row `i` is the edge leaving node `i`.

use std::fmt;

/// The pipeline shapes a layer kind can decompose into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// memory → stage → memory (GAP, elementwise, activation, batch-norm).
    TwoStage,
    /// memory → fork → accumulate → memory (fully-connected).
    ThreeStage,
    /// memory → window → fork → conv → memory (depthwise convolution).
    FourStage,
    /// memory → window → fork → conv → accumulate → memory (convolution).
    FiveStage,
}

impl Topology {
    /// Number of pipeline stages (matrix rows).
    pub const fn stages(self) -> usize {
        match self {
            Self::TwoStage => 2,
            Self::ThreeStage => 3,
            Self::FourStage => 4,
            Self::FiveStage => 5,
        }
    }

    /// Matrix shape `(S, S + 1)`.
    pub const fn shape(self) -> (usize, usize) {
        (self.stages(), self.stages() + 1)
    }

    /// Number of compute stages between the two memory nodes.
    pub const fn compute_stages(self) -> usize {
        self.stages() - 1
    }

    pub fn from_stages(stages: usize) -> Option<Self> {
        match stages {
            2 => Some(Self::TwoStage),
            3 => Some(Self::ThreeStage),
            4 => Some(Self::FourStage),
            5 => Some(Self::FiveStage),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoStage => "two_stage",
            Self::ThreeStage => "three_stage",
            Self::FourStage => "four_stage",
            Self::FiveStage => "five_stage",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape();
        write!(f, "{} ({rows}x{cols})", self.as_str())
    }
}
