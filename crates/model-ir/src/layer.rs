// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer descriptors and operation classification.
//!
//! A [`LayerDescriptor`] is the per-layer record produced by graph
//! ingestion: shapes, kernel geometry and a few flags. It is immutable once
//! parsed; the layer models in `layer-model` read it to fix their shape
//! state. The operation string is classified into an [`OpKind`] exactly
//! once, and unknown operations fail immediately.

use crate::ModelError;
use flow_core::TensorShape;
use std::fmt;

/// Activation functions with a dedicated hardware stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ActivationKind {
    Relu,
    Sigmoid,
    Swish,
}

/// Elementwise binary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ElementWiseKind {
    Add,
    Mul,
}

/// The operation families a layer model exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OpKind {
    Conv,
    GlobalAveragePool,
    Activation(ActivationKind),
    ElementWise(ElementWiseKind),
    /// `Gemm` and `MatMul` nodes.
    FullyConnected,
    SqueezeExcitation,
    BatchNormalization,
}

impl OpKind {
    /// Classifies an ONNX operation name.
    ///
    /// # Errors
    /// [`ModelError::UnsupportedOperation`] naming both the operation and
    /// the layer it was found in.
    pub fn parse(operation: &str, layer: &str) -> Result<Self, ModelError> {
        let kind = match operation {
            "Conv" => Self::Conv,
            "GlobalAveragePool" => Self::GlobalAveragePool,
            "Relu" => Self::Activation(ActivationKind::Relu),
            "Sigmoid" => Self::Activation(ActivationKind::Sigmoid),
            "Swish" => Self::Activation(ActivationKind::Swish),
            "Add" => Self::ElementWise(ElementWiseKind::Add),
            "Mul" => Self::ElementWise(ElementWiseKind::Mul),
            "Gemm" | "MatMul" => Self::FullyConnected,
            "SqueezeExcitation" => Self::SqueezeExcitation,
            "BatchNormalization" => Self::BatchNormalization,
            other => {
                return Err(ModelError::UnsupportedOperation {
                    operation: other.to_string(),
                    layer: layer.to_string(),
                })
            }
        };
        Ok(kind)
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conv => "conv",
            Self::GlobalAveragePool => "gap",
            Self::Activation(ActivationKind::Relu) => "relu",
            Self::Activation(ActivationKind::Sigmoid) => "sigmoid",
            Self::Activation(ActivationKind::Swish) => "swish",
            Self::ElementWise(ElementWiseKind::Add) => "add",
            Self::ElementWise(ElementWiseKind::Mul) => "mul",
            Self::FullyConnected => "fc",
            Self::SqueezeExcitation => "se",
            Self::BatchNormalization => "batchnorm",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convolution variants. Each maps to a different pipeline topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvKind {
    General,
    /// `groups == channels`; takes precedence over pointwise.
    Depthwise,
    /// Every kernel spatial dimension is 1.
    Pointwise,
}

fn default_groups() -> usize {
    1
}

/// Metadata describing a single layer as produced by graph ingestion.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerDescriptor {
    /// Unique identifier for this layer.
    pub name: String,
    /// ONNX operation name (`"Conv"`, `"GlobalAveragePool"`, ...).
    pub operation: String,
    /// Input shapes; the first one is the primary input.
    pub shape_in: Vec<TensorShape>,
    pub shape_out: TensorShape,
    /// Full kernel shape `[F, C/groups, kd, kh, kw]` for convolutions.
    #[serde(default)]
    pub kernel: Option<Vec<usize>>,
    /// Bias shape; empty when the layer has no bias.
    #[serde(default)]
    pub bias: Vec<usize>,
    #[serde(default = "default_groups")]
    pub groups: usize,
    #[serde(default)]
    pub padding: Vec<usize>,
    #[serde(default)]
    pub stride: Vec<usize>,
    #[serde(default)]
    pub dilation: Vec<usize>,
    /// The output feeds more than one consumer.
    #[serde(default)]
    pub branching: bool,
    /// Inner operations of a squeeze-excitation block, in execution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primitive_ops: Vec<LayerDescriptor>,
}

impl LayerDescriptor {
    /// Classifies the operation string.
    pub fn op_kind(&self) -> Result<OpKind, ModelError> {
        OpKind::parse(&self.operation, &self.name)
    }

    /// The primary input shape.
    pub fn input_shape(&self) -> Result<TensorShape, ModelError> {
        self.shape_in
            .first()
            .copied()
            .ok_or_else(|| self.invalid("no input shape"))
    }

    /// Kernel spatial extent `(kd, kh, kw)`, if this layer has a kernel.
    pub fn kernel_spatial(&self) -> Option<(usize, usize, usize)> {
        match self.kernel.as_deref() {
            Some(&[_, _, kd, kh, kw]) => Some((kd, kh, kw)),
            _ => None,
        }
    }

    pub fn has_bias(&self) -> bool {
        !self.bias.is_empty()
    }

    /// Classifies a convolution. Returns `None` for other operations.
    pub fn conv_kind(&self) -> Option<ConvKind> {
        if self.operation != "Conv" {
            return None;
        }
        let channels = self.shape_in.first()?.channels;
        let (kd, kh, kw) = self.kernel_spatial()?;
        Some(if self.groups == channels {
            ConvKind::Depthwise
        } else if kd * kh * kw == 1 {
            ConvKind::Pointwise
        } else {
            ConvKind::General
        })
    }

    /// Multiply-accumulate count of one inference through this layer.
    pub fn macs(&self) -> u64 {
        let Some(input) = self.shape_in.first() else {
            return 0;
        };
        let out = &self.shape_out;
        let macs = match self.op_kind() {
            Ok(OpKind::Conv) => {
                let (kd, kh, kw) = self.kernel_spatial().unwrap_or((1, 1, 1));
                let per_group = input.channels / self.groups.max(1);
                out.volume_elements() * per_group * kd * kh * kw
            }
            Ok(OpKind::FullyConnected) => input.volume_elements() * out.volume_elements(),
            Ok(OpKind::SqueezeExcitation) => {
                return self.primitive_ops.iter().map(LayerDescriptor::macs).sum()
            }
            Ok(OpKind::GlobalAveragePool) => input.volume_elements(),
            Ok(_) => out.volume_elements(),
            Err(_) => 0,
        };
        macs as u64
    }

    /// Checks the descriptor is usable by a layer model.
    ///
    /// # Checks
    /// - The operation is recognised.
    /// - At least one input shape; no zero-sized dimension anywhere.
    /// - Convolutions carry a rank-5 kernel and a group count dividing the
    ///   input channels.
    /// - Squeeze-excitation blocks carry primitive ops, none of which is
    ///   itself a squeeze-excitation block.
    pub fn validate(&self) -> Result<OpKind, ModelError> {
        let kind = self.op_kind()?;

        let input = self.input_shape()?;
        if self.shape_in.iter().any(TensorShape::is_empty) {
            return Err(self.invalid("input shape has a zero dimension"));
        }
        if self.shape_out.is_empty() {
            return Err(self.invalid("output shape has a zero dimension"));
        }

        match kind {
            OpKind::Conv => {
                if self.kernel_spatial().is_none() {
                    return Err(self.invalid("convolution needs a kernel [F, C/g, kd, kh, kw]"));
                }
                if self.groups == 0 || input.channels % self.groups != 0 {
                    return Err(self.invalid(&format!(
                        "groups {} does not divide {} input channels",
                        self.groups, input.channels
                    )));
                }
            }
            OpKind::SqueezeExcitation => {
                if self.primitive_ops.is_empty() {
                    return Err(self.invalid("squeeze-excitation block has no primitive ops"));
                }
                for op in &self.primitive_ops {
                    if op.validate()? == OpKind::SqueezeExcitation {
                        return Err(self.invalid(&format!(
                            "nested squeeze-excitation block '{}'",
                            op.name
                        )));
                    }
                }
            }
            _ => {}
        }

        Ok(kind)
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        let kind = match (self.op_kind(), self.conv_kind()) {
            (_, Some(ConvKind::Depthwise)) => "conv/depthwise".to_string(),
            (_, Some(ConvKind::Pointwise)) => "conv/pointwise".to_string(),
            (Ok(k), _) => k.to_string(),
            (Err(_), _) => format!("unsupported:{}", self.operation),
        };
        let input = self
            .shape_in
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "[]".into());
        format!(
            "{} ({kind}) {input} -> {}, {} MACs{}",
            self.name,
            self.shape_out,
            self.macs(),
            if self.branching { ", branching" } else { "" },
        )
    }

    fn invalid(&self, detail: &str) -> ModelError {
        ModelError::InvalidLayer {
            layer: self.name.clone(),
            detail: detail.to_string(),
        }
    }
}
