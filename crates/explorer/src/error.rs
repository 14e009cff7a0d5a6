// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the exploration driver.

use std::path::PathBuf;

/// Errors that can occur during an exploration run.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A report file could not be created or read.
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or reading a CSV report failed.
    #[error("CSV report error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration column could not be encoded or decoded.
    #[error("config column error: {0}")]
    ConfigColumn(#[from] serde_json::Error),

    /// The device description is unusable.
    #[error("device error: {0}")]
    Device(#[from] device::DeviceError),

    /// Model loading failed.
    #[error("model error: {0}")]
    Model(#[from] model_ir::ModelError),

    /// Evaluating a layer failed.
    #[error("layer error: {0}")]
    Layer(#[from] layer_model::LayerError),

    /// The partition planner returned an error.
    #[error("planner error: {0}")]
    Planner(#[from] partition_planner::PlannerError),

    /// The worker pool could not be started.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A partition names a layer the model does not have.
    #[error("partition '{partition}' references unknown layer '{layer}'")]
    UnknownLayer { partition: String, layer: String },
}
