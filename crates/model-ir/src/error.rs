// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for descriptor ingestion and graph construction.

/// Errors that can occur when working with model descriptions.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model manifest file could not be read.
    #[error("failed to read manifest: {0}")]
    ManifestReadError(#[from] std::io::Error),

    /// The manifest JSON is malformed.
    #[error("failed to parse manifest: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    /// A layer uses an operation no layer model exists for.
    #[error("{operation} operation in layer {layer} is not supported")]
    UnsupportedOperation { operation: String, layer: String },

    /// A layer descriptor is inconsistent (missing kernel, zero shapes, ...).
    #[error("invalid layer '{layer}': {detail}")]
    InvalidLayer { layer: String, detail: String },

    /// The model graph or its partition list is malformed.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),
}
