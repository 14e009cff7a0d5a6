// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! The per-layer description of a 3-D CNN as handed to the performance
//! model, and the chain/partition structure around it.
//!
//! - [`OpKind`]: the operation families a layer model exists for. Parsing
//!   an unknown ONNX operation fails, naming the operation and the layer.
//! - [`LayerDescriptor`]: shapes, kernel geometry, groups and flags of one
//!   layer (plus the primitive ops of a squeeze-excitation block).
//! - [`ModelGraph`]: the ordered chain of layers and its partitions, with a
//!   **type-state pattern** (`Loaded` → `Validated`).
//! - [`ModelLoader`] / [`ModelManifest`]: JSON manifest ingestion.
//!
//! # Example
//! ```no_run
//! use model_ir::ModelLoader;
//! use std::path::Path;
//!
//! let graph = ModelLoader::load(Path::new("./models/x3d_m.json")).unwrap();
//! println!("{}", graph.summary());
//! for layer in graph.iter_layers() {
//!     println!("  {}", layer.summary());
//! }
//! ```

mod error;
pub mod graph;
mod layer;
mod loader;
mod manifest;

pub use error::ModelError;
pub use graph::{ModelGraph, PartitionSpec};
pub use layer::{ActivationKind, ConvKind, ElementWiseKind, LayerDescriptor, OpKind};
pub use loader::ModelLoader;
pub use manifest::ModelManifest;
