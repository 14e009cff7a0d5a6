// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: the network as an ordered chain of layers plus the
//! partitions it is cut into.
//!
//! # Type-State Pattern
//!
//! ```text
//! ModelGraph<Loaded>     : layers parsed, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated>  : every layer classified, partitions resolved.
//! ```
//!
//! The explorer only accepts a `ModelGraph<Validated>`, so a layer with an
//! unsupported operation can never reach a layer model.

use crate::{LayerDescriptor, ModelError, OpKind};
use std::collections::HashSet;
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and its partitions resolved.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Partitions ─────────────────────────────────────────────────────

/// A contiguous group of layers fused into one hardware pipeline.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PartitionSpec {
    /// `part_<i>` in declaration order.
    pub name: String,
    /// Layer names in pipeline order.
    pub layers: Vec<String>,
}

// ── ModelGraph ─────────────────────────────────────────────────────

/// The complete model represented as an ordered sequence of layers.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name, also the stem of every report file.
    pub name: String,
    /// Ordered list of layer descriptors.
    pub layers: Vec<LayerDescriptor>,
    /// Explicit partitions (layer names). Empty means "derive from the
    /// branching flags" on validation.
    pub partitions: Vec<Vec<String>>,
    resolved: Vec<PartitionSpec>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state.
    pub fn new(name: String, layers: Vec<LayerDescriptor>, partitions: Vec<Vec<String>>) -> Self {
        Self {
            name,
            layers,
            partitions,
            resolved: Vec::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph is non-empty.
    /// - Layer names (including squeeze-excitation primitives) are unique.
    /// - Every layer passes [`LayerDescriptor::validate`].
    /// - Declared partitions are non-empty and name known layers.
    pub fn validate(self) -> Result<ModelGraph<Validated>, ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::InvalidGraph(
                "model graph contains no layers".into(),
            ));
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            let names =
                std::iter::once(&layer.name).chain(layer.primitive_ops.iter().map(|p| &p.name));
            for name in names {
                if !seen.insert(name.as_str()) {
                    return Err(ModelError::InvalidLayer {
                        layer: name.clone(),
                        detail: "duplicate layer name".into(),
                    });
                }
            }
        }

        for layer in &self.layers {
            layer.validate()?;
        }

        let resolved = if self.partitions.is_empty() {
            derive_partitions(&self.layers)
        } else {
            let known: HashSet<&str> = self.layers.iter().map(|l| l.name.as_str()).collect();
            let mut resolved = Vec::with_capacity(self.partitions.len());
            for (i, members) in self.partitions.iter().enumerate() {
                if members.is_empty() {
                    return Err(ModelError::InvalidGraph(format!("partition {i} is empty")));
                }
                if let Some(unknown) = members.iter().find(|m| !known.contains(m.as_str())) {
                    return Err(ModelError::InvalidGraph(format!(
                        "partition {i} references unknown layer '{unknown}'"
                    )));
                }
                resolved.push(PartitionSpec {
                    name: format!("part_{i}"),
                    layers: members.clone(),
                });
            }
            resolved
        };

        tracing::debug!(
            model = %self.name,
            layers = self.layers.len(),
            partitions = resolved.len(),
            "model graph validated"
        );

        Ok(ModelGraph {
            name: self.name,
            layers: self.layers,
            partitions: self.partitions,
            resolved,
            _state: std::marker::PhantomData,
        })
    }
}

/// Splits the chain after every branching layer.
fn derive_partitions(layers: &[LayerDescriptor]) -> Vec<PartitionSpec> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for layer in layers {
        current.push(layer.name.clone());
        if layer.branching {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out.into_iter()
        .enumerate()
        .map(|(i, layers)| PartitionSpec {
            name: format!("part_{i}"),
            layers,
        })
        .collect()
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the total number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Returns an iterator over the layers in execution order.
    pub fn iter_layers(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter()
    }

    /// Returns a reference to a layer by index.
    pub fn layer(&self, index: usize) -> Option<&LayerDescriptor> {
        self.layers.get(index)
    }

    /// Looks a top-level layer up by name.
    pub fn layer_by_name(&self, name: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// The resolved partitions, declared or derived.
    pub fn partitions(&self) -> &[PartitionSpec] {
        &self.resolved
    }

    /// Descriptors of one partition in pipeline order.
    pub fn partition_layers(&self, partition: &PartitionSpec) -> Vec<&LayerDescriptor> {
        partition
            .layers
            .iter()
            .filter_map(|name| self.layer_by_name(name))
            .collect()
    }

    /// Total multiply-accumulates of one inference.
    pub fn total_macs(&self) -> u64 {
        self.layers.iter().map(LayerDescriptor::macs).sum()
    }

    /// Layer count per operation kind, in first-seen order.
    pub fn op_histogram(&self) -> Vec<(OpKind, usize)> {
        let mut hist: Vec<(OpKind, usize)> = Vec::new();
        for kind in self.layers.iter().filter_map(|l| l.op_kind().ok()) {
            match hist.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, n)) => *n += 1,
                None => hist.push((kind, 1)),
            }
        }
        hist
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model '{}': {} layers, {} partitions, {:.3} GMACs",
            self.name,
            self.num_layers(),
            self.resolved.len(),
            self.total_macs() as f64 * 1e-9,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} layers):", self.name, self.layers.len())?;
        for layer in &self.layers {
            writeln!(f, "  {}", layer.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::tests::{conv, simple};

    fn chain() -> Vec<LayerDescriptor> {
        let mut c1 = conv("Conv_0", 16, 16, 3, 1);
        c1.branching = true;
        vec![
            c1,
            simple("Relu_1", "Relu", 16),
            conv("Conv_2", 16, 16, 1, 1),
            simple("Add_3", "Add", 16),
        ]
    }

    #[test]
    fn test_validate_ok() {
        let g = ModelGraph::new("x3d".into(), chain(), vec![]).validate().unwrap();
        assert_eq!(g.num_layers(), 4);
    }

    #[test]
    fn test_validate_empty() {
        assert!(ModelGraph::new("empty".into(), vec![], vec![]).validate().is_err());
    }

    #[test]
    fn test_validate_unsupported_operation() {
        let mut layers = chain();
        layers[1].operation = "Softmax".into();
        let err = ModelGraph::new("m".into(), layers, vec![]).validate().unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedOperation { layer, .. } if layer == "Relu_1"));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut layers = chain();
        layers[2].name = "Conv_0".into();
        assert!(ModelGraph::new("m".into(), layers, vec![]).validate().is_err());
    }

    #[test]
    fn test_derived_partitions_split_after_branching() {
        let g = ModelGraph::new("m".into(), chain(), vec![]).validate().unwrap();
        let parts = g.partitions();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "part_0");
        assert_eq!(parts[0].layers, vec!["Conv_0"]);
        assert_eq!(parts[1].layers, vec!["Relu_1", "Conv_2", "Add_3"]);
    }

    #[test]
    fn test_declared_partitions() {
        let declared = vec![
            vec!["Conv_0".to_string(), "Relu_1".to_string()],
            vec!["Conv_2".to_string()],
        ];
        let g = ModelGraph::new("m".into(), chain(), declared).validate().unwrap();
        assert_eq!(g.partitions().len(), 2);
        let layers = g.partition_layers(&g.partitions()[0]);
        assert_eq!(layers[1].name, "Relu_1");
    }

    #[test]
    fn test_declared_partition_unknown_layer() {
        let declared = vec![vec!["Conv_9".to_string()]];
        let err = ModelGraph::new("m".into(), chain(), declared).validate().unwrap_err();
        assert!(err.to_string().contains("Conv_9"));
    }

    #[test]
    fn test_op_histogram() {
        let g = ModelGraph::new("m".into(), chain(), vec![]).validate().unwrap();
        let hist = g.op_histogram();
        assert_eq!(hist[0], (OpKind::Conv, 2));
        assert_eq!(hist.len(), 3);
    }

    #[test]
    fn test_summary_and_display() {
        let g = ModelGraph::new("x3d_m".into(), chain(), vec![]).validate().unwrap();
        assert!(g.summary().contains("4 layers, 2 partitions"));
        assert!(format!("{g}").contains("Conv_2"));
    }
}
