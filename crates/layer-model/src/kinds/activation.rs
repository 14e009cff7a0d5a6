// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pointwise activation functions.

use crate::{streams, Factors, LayerError, Resources, StageModel};
use flow_core::{MatrixError, StageMatrix, TensorShape, Topology};
use model_ir::{ActivationKind, LayerDescriptor, ModelError, OpKind};

/// Per-stream cost of one activation unit.
struct UnitCost {
    muls: u64,
    adds: u64,
    depth: u64,
    ops_per_element: f64,
}

fn unit_cost(kind: ActivationKind) -> UnitCost {
    match kind {
        // max(x, 0): one comparator.
        ActivationKind::Relu => UnitCost {
            muls: 0,
            adds: 0,
            depth: 1,
            ops_per_element: 1.0,
        },
        // Piecewise-linear 1 / (1 + e^-x).
        ActivationKind::Sigmoid => UnitCost {
            muls: 2,
            adds: 1,
            depth: 4,
            ops_per_element: 3.0,
        },
        // x · sigmoid(x).
        ActivationKind::Swish => UnitCost {
            muls: 3,
            adds: 1,
            depth: 5,
            ops_per_element: 4.0,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationLayer {
    name: String,
    kind: ActivationKind,
    input: TensorShape,
}

impl ActivationLayer {
    pub fn from_descriptor(desc: &LayerDescriptor) -> Result<Self, LayerError> {
        let kind = match desc.op_kind()? {
            OpKind::Activation(kind) => kind,
            _ => {
                return Err(LayerError::Model(ModelError::InvalidLayer {
                    layer: desc.name.clone(),
                    detail: "not an activation".to_string(),
                }))
            }
        };
        Ok(Self {
            name: desc.name.clone(),
            kind,
            input: desc.input_shape()?,
        })
    }

    pub fn kind(&self) -> ActivationKind {
        self.kind
    }

    pub fn channels(&self) -> usize {
        self.input.channels
    }

    fn elements(&self) -> f64 {
        self.input.volume_elements() as f64
    }
}

impl StageModel for ActivationLayer {
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
        super::single_stage::stream(streams(self.input.channels, factors.coarse_in))
    }

    fn data_matrix(&self, mem_bw_in: f64, mem_bw_out: f64) -> Result<StageMatrix, MatrixError> {
        super::single_stage::data(mem_bw_in, mem_bw_out, 1.0)
    }

    fn workload_matrix(&self) -> Result<StageMatrix, MatrixError> {
        super::single_stage::workload(self.elements(), self.elements())
    }

    fn resources(&self, factors: &Factors) -> Resources {
        let n = streams(self.input.channels, factors.coarse_in) as u64;
        let cost = unit_cost(self.kind);
        Resources {
            muls: cost.muls * n,
            adds: cost.adds * n,
            memory_words: 0,
            depth: cost.depth,
        }
    }

    fn total_ops(&self) -> f64 {
        unit_cost(self.kind).ops_per_element * self.elements()
    }

    fn volumes(&self) -> (f64, f64) {
        (self.elements(), self.elements())
    }
}
