// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Analytical performance model of individual layers.
//!
//! Every primitive layer kind implements [`StageModel`]: four banded stage
//! matrices (rate, stream, data, workload) plus its resource and pipeline
//! depth formulas. [`derive`] turns them into [`Metrics`] through the
//! shared balancer, and [`LayerModel::design_point`] applies the device's
//! feasibility gate on top.
//!
//! # Example
//!
//! ```
//! use device::DeviceConfig;
//! use flow_core::TensorShape;
//! use layer_model::{Configuration, LayerModel, ModelOptions, Parallelism};
//! use model_ir::LayerDescriptor;
//!
//! let shape = TensorShape::new(1, 32, 8, 16, 16);
//! let desc = LayerDescriptor {
//!     name: "relu_0".into(),
//!     operation: "Relu".into(),
//!     shape_in: vec![shape],
//!     shape_out: shape,
//!     kernel: None,
//!     bias: vec![],
//!     groups: 1,
//!     padding: vec![],
//!     stride: vec![],
//!     dilation: vec![],
//!     branching: false,
//!     primitive_ops: vec![],
//! };
//! let layer = LayerModel::from_descriptor(&desc, &ModelOptions::default()).unwrap();
//! let config = Configuration::new(Parallelism::Shared { coarse_inout: 0.5 }, 16.0, 16.0);
//! let eval = layer.design_point(&config, &DeviceConfig::zc706()).unwrap();
//! assert!(eval.is_feasible());
//! ```

pub mod config;
pub mod deriver;
pub mod error;
pub mod kinds;
pub mod metrics;
pub mod model;
pub mod pipeline;

pub use config::{streams, Configuration, Factors, Parallelism, ParallelismKind};
pub use deriver::{derive, THROUGHPUT_TOLERANCE};
pub use error::LayerError;
pub use kinds::{
    ActivationLayer, BatchNormLayer, ConvLayer, ElementWiseLayer, FcLayer, GapLayer,
    PipelineDepth, SqueezeExcitationLayer,
};
pub use metrics::{DesignPoint, Evaluation, Metrics, Rejected, Resources};
pub use model::{LayerModel, ModelOptions, SweepDims};
pub use pipeline::StageModel;
