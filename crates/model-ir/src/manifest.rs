// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON model manifest parsing.
//!
//! # Format
//! ```json
//! {
//!   "name": "x3d_m",
//!   "layers": [
//!     {
//!       "name": "Conv_0",
//!       "operation": "Conv",
//!       "shape_in": [[1, 3, 16, 256, 256]],
//!       "shape_out": [1, 24, 16, 128, 128],
//!       "kernel": [24, 3, 1, 3, 3],
//!       "bias": [],
//!       "groups": 1,
//!       "padding": [0, 1, 1],
//!       "stride": [1, 2, 2],
//!       "dilation": [1, 1, 1],
//!       "branching": false
//!     }
//!   ],
//!   "partitions": [["Conv_0"]]
//! }
//! ```
//!
//! `partitions` is optional.

use crate::{LayerDescriptor, ModelError, ModelGraph};
use std::path::Path;

/// Top-level model manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    pub name: String,
    pub layers: Vec<LayerDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Vec<String>>,
}

impl ModelManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Consumes the manifest into an unvalidated graph.
    pub fn into_graph(self) -> ModelGraph {
        ModelGraph::new(self.name, self.layers, self.partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "tiny3d",
        "layers": [
            {
                "name": "Conv_0",
                "operation": "Conv",
                "shape_in": [[1, 3, 8, 32, 32]],
                "shape_out": [1, 16, 8, 16, 16],
                "kernel": [16, 3, 1, 3, 3],
                "bias": [16],
                "groups": 1,
                "padding": [0, 1, 1],
                "stride": [1, 2, 2],
                "dilation": [1, 1, 1],
                "branching": false
            },
            {
                "name": "Relu_1",
                "operation": "Relu",
                "shape_in": [[1, 16, 8, 16, 16]],
                "shape_out": [1, 16, 8, 16, 16]
            },
            {
                "name": "GlobalAveragePool_2",
                "operation": "GlobalAveragePool",
                "shape_in": [[1, 16, 8, 16, 16]],
                "shape_out": [1, 16, 1, 1, 1]
            },
            {
                "name": "Gemm_3",
                "operation": "Gemm",
                "shape_in": [[1, 16]],
                "shape_out": [1, 10]
            }
        ],
        "partitions": [["Conv_0", "Relu_1"], ["GlobalAveragePool_2", "Gemm_3"]]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let m = ModelManifest::from_json(SAMPLE).unwrap();
        assert_eq!(m.name, "tiny3d");
        assert_eq!(m.layers.len(), 4);
        assert_eq!(m.partitions.len(), 2);
        assert_eq!(m.layers[3].shape_in[0].channels, 16);
    }

    #[test]
    fn test_into_validated_graph() {
        let g = ModelManifest::from_json(SAMPLE)
            .unwrap()
            .into_graph()
            .validate()
            .unwrap();
        assert_eq!(g.partitions()[1].layers, vec!["GlobalAveragePool_2", "Gemm_3"]);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ModelManifest::from_json("{ not json"),
            Err(ModelError::ManifestParseError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny3d.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let m = ModelManifest::from_file(&path).unwrap();
        assert_eq!(m.layers[0].name, "Conv_0");

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ModelManifest::from_file(&missing),
            Err(ModelError::ManifestReadError(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let m = ModelManifest::from_json(SAMPLE).unwrap();
        let back = ModelManifest::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(back.layers, m.layers);
    }
}
