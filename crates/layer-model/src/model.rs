// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The closed set of layer kinds and their single evaluation entry point.

use crate::kinds::{
    ActivationLayer, BatchNormLayer, ConvLayer, ElementWiseLayer, FcLayer, GapLayer,
    SqueezeExcitationLayer,
};
use crate::{derive, Configuration, Evaluation, LayerError, Metrics, ParallelismKind, StageModel};
use device::DeviceConfig;
use flow_core::Topology;
use model_ir::{LayerDescriptor, OpKind};

/// Modeling choices that are not part of a layer descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ModelOptions {
    /// Model global-average-pool layers with the approximate (channel-only)
    /// workload and a constant fill latency.
    pub gap_approx: bool,
}

/// Dimensions a configuration sweep ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepDims {
    /// `(kd, kh, kw)` for convolutions; the fine factor is fixed at 1
    /// otherwise.
    pub kernel: Option<(usize, usize, usize)>,
    pub coarse_in: usize,
    pub coarse_out: usize,
}

/// One layer of a model, ready to be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerModel {
    Convolution(ConvLayer),
    GlobalAveragePool(GapLayer),
    ElementWise(ElementWiseLayer),
    Activation(ActivationLayer),
    BatchNorm(BatchNormLayer),
    FullyConnected(FcLayer),
    SqueezeExcitation(SqueezeExcitationLayer),
}

impl LayerModel {
    /// Builds the model of a descriptor. Fails on unsupported operations.
    pub fn from_descriptor(
        desc: &LayerDescriptor,
        options: &ModelOptions,
    ) -> Result<Self, LayerError> {
        let model = match desc.validate()? {
            OpKind::Conv => Self::Convolution(ConvLayer::from_descriptor(desc)?),
            OpKind::GlobalAveragePool => {
                Self::GlobalAveragePool(GapLayer::from_descriptor(desc, options.gap_approx)?)
            }
            OpKind::ElementWise(_) => Self::ElementWise(ElementWiseLayer::from_descriptor(desc)?),
            OpKind::Activation(_) => Self::Activation(ActivationLayer::from_descriptor(desc)?),
            OpKind::BatchNormalization => Self::BatchNorm(BatchNormLayer::from_descriptor(desc)?),
            OpKind::FullyConnected => Self::FullyConnected(FcLayer::from_descriptor(desc)?),
            OpKind::SqueezeExcitation => {
                Self::SqueezeExcitation(SqueezeExcitationLayer::from_descriptor(desc, options)?)
            }
        };
        tracing::debug!(layer = %desc.name, kind = model.label(), "built layer model");
        Ok(model)
    }

    /// The matrix builders of a primitive kind; `None` for composite blocks.
    pub fn stage_model(&self) -> Option<&dyn StageModel> {
        match self {
            Self::Convolution(l) => Some(l),
            Self::GlobalAveragePool(l) => Some(l),
            Self::ElementWise(l) => Some(l),
            Self::Activation(l) => Some(l),
            Self::BatchNorm(l) => Some(l),
            Self::FullyConnected(l) => Some(l),
            Self::SqueezeExcitation(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Convolution(l) => l.name(),
            Self::GlobalAveragePool(l) => l.name(),
            Self::ElementWise(l) => l.name(),
            Self::Activation(l) => l.name(),
            Self::BatchNorm(l) => l.name(),
            Self::FullyConnected(l) => l.name(),
            Self::SqueezeExcitation(l) => l.name(),
        }
    }

    pub fn topology(&self) -> Option<Topology> {
        self.stage_model().map(|m| m.topology())
    }

    /// The parallelism shape this kind accepts.
    pub fn parallelism_kind(&self) -> ParallelismKind {
        match self {
            Self::Convolution(_) => ParallelismKind::Conv,
            Self::FullyConnected(_) | Self::SqueezeExcitation(_) => ParallelismKind::Channels,
            _ => ParallelismKind::Shared,
        }
    }

    /// Short kind label for tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Convolution(c) => match c.kind() {
                model_ir::ConvKind::General => "conv",
                model_ir::ConvKind::Depthwise => "conv/depthwise",
                model_ir::ConvKind::Pointwise => "conv/pointwise",
            },
            Self::GlobalAveragePool(g) if g.is_approximate() => "gap/approx",
            Self::GlobalAveragePool(_) => "gap",
            Self::ElementWise(_) => "elementwise",
            Self::Activation(_) => "activation",
            Self::BatchNorm(_) => "batchnorm",
            Self::FullyConnected(_) => "fc",
            Self::SqueezeExcitation(_) => "se",
        }
    }

    pub fn dims(&self) -> SweepDims {
        let (kernel, coarse_in, coarse_out) = match self {
            Self::Convolution(c) => (Some(c.kernel()), c.channels(), c.filters()),
            Self::GlobalAveragePool(g) => (None, g.channels(), g.channels()),
            Self::ElementWise(e) => (None, e.channels(), e.channels()),
            Self::Activation(a) => (None, a.channels(), a.channels()),
            Self::BatchNorm(b) => (None, b.channels(), b.channels()),
            Self::FullyConnected(f) => (None, f.features_in(), f.features_out()),
            Self::SqueezeExcitation(s) => (None, s.channels_in(), s.channels_out()),
        };
        SweepDims {
            kernel,
            coarse_in,
            coarse_out,
        }
    }

    /// Ungated figures for `config`.
    pub fn metrics(
        &self,
        config: &Configuration,
        device: &DeviceConfig,
    ) -> Result<Metrics, LayerError> {
        config.validate()?;
        let got = config.parallelism.kind();
        let expected = self.parallelism_kind();
        if got != expected {
            return Err(LayerError::ConfigurationMismatch {
                layer: self.name().to_string(),
                expected,
                got,
            });
        }
        match self {
            Self::Convolution(l) => derive(l, config, device),
            Self::GlobalAveragePool(l) => derive(l, config, device),
            Self::ElementWise(l) => derive(l, config, device),
            Self::Activation(l) => derive(l, config, device),
            Self::BatchNorm(l) => derive(l, config, device),
            Self::FullyConnected(l) => derive(l, config, device),
            Self::SqueezeExcitation(se) => se.metrics(config, device),
        }
    }

    /// Evaluates `config` and applies the device's feasibility gate.
    pub fn design_point(
        &self,
        config: &Configuration,
        device: &DeviceConfig,
    ) -> Result<Evaluation, LayerError> {
        let metrics = self.metrics(config, device)?;
        Ok(Evaluation::gate(self.name(), *config, metrics, device))
    }
}
