// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model loading from a JSON manifest.
//!
//! The loader accepts either a manifest file or a directory containing
//! `model.json`, parses it and validates the resulting graph in one step.

use crate::{graph, ModelError, ModelGraph, ModelManifest};
use std::path::{Path, PathBuf};

/// Default manifest filename inside a model directory.
const MANIFEST_FILE: &str = "model.json";

/// Loads a model from disk into a validated [`ModelGraph`].
///
/// # Example
/// ```no_run
/// use model_ir::ModelLoader;
/// use std::path::Path;
///
/// let graph = ModelLoader::load(Path::new("./models/x3d_m.json")).unwrap();
/// println!("{}", graph.summary());
/// ```
pub struct ModelLoader;

impl ModelLoader {
    /// Loads and validates a model from a manifest file or model directory.
    pub fn load(path: &Path) -> Result<ModelGraph<graph::Validated>, ModelError> {
        let manifest_path = Self::manifest_path(path);
        tracing::info!(path = %manifest_path.display(), "loading model manifest");
        let manifest = ModelManifest::from_file(&manifest_path)?;
        Self::from_manifest(manifest)
    }

    /// Validates an already-parsed manifest.
    pub fn from_manifest(manifest: ModelManifest) -> Result<ModelGraph<graph::Validated>, ModelError> {
        manifest.into_graph().validate()
    }

    fn manifest_path(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        }
    }
}
