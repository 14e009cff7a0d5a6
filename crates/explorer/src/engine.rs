// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The exploration engine with a type-state enforced pipeline.
//!
//! ```text
//! Explorer<Idle>
//!     │  .load_model() / .with_graph()
//!     ▼
//! Explorer<Loaded>
//!     │  .explore_layers()      → <model>.csv, <model>_pareto.csv
//!     │  .explore_partitions()  → <model>_partitions.csv
//!     ▼
//!   reports
//! ```
//!
//! Each state transition consumes the old value and returns a new one,
//! making invalid state sequences a compile error.

use crate::report::{self, CsvRecorder, ReportRow, ReportWriter};
use crate::sweep::{self, LayerSweep};
use crate::{pareto, ExplorerConfig, ExplorerError};
use device::DeviceConfig;
use layer_model::{Configuration, DesignPoint, LayerModel};
use model_ir::{graph::Validated, LayerDescriptor, ModelGraph, OpKind, PartitionSpec};
use partition_planner::{auto_strategy, Composer, Observer, SearchOutcome, SearchSpace};
use std::path::PathBuf;

// ── Type-state markers ─────────────────────────────────────────

/// Engine is created but no model is loaded.
#[derive(Debug)]
pub struct Idle;

/// A model is loaded and every layer has a performance model.
#[derive(Debug)]
pub struct Loaded;

/// Sealed trait for engine states.
pub trait ExplorerState: std::fmt::Debug {}
impl ExplorerState for Idle {}
impl ExplorerState for Loaded {}

// ── Results ────────────────────────────────────────────────────

/// Outcome of the single-layer stage.
#[derive(Debug, Clone)]
pub struct LayersReport {
    pub sweeps: Vec<LayerSweep>,
    /// Per-layer frontiers, concatenated in layer order.
    pub pareto: Vec<DesignPoint>,
}

impl LayersReport {
    pub fn evaluated(&self) -> u64 {
        self.sweeps.iter().map(|s| s.evaluated).sum()
    }

    pub fn feasible(&self) -> u64 {
        self.sweeps.iter().map(|s| s.feasible()).sum()
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} layers: {}/{} feasible design points, {} on the Pareto front",
            self.sweeps.len(),
            self.feasible(),
            self.evaluated(),
            self.pareto.len(),
        )
    }
}

/// Outcome of searching one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResult {
    pub partition: String,
    pub layers: Vec<String>,
    pub outcome: SearchOutcome,
}

// ── Engine ─────────────────────────────────────────────────────

/// The design-space exploration engine.
///
/// # Example
/// ```no_run
/// use explorer::{Explorer, ExplorerConfig};
///
/// # fn example() -> Result<(), explorer::ExplorerError> {
/// let explorer = Explorer::new(ExplorerConfig::default())?.load_model()?;
/// let layers = explorer.explore_layers()?;
/// println!("{}", layers.summary());
/// for result in explorer.explore_partitions()? {
///     println!("{}: {}", result.partition, result.outcome.summary());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Explorer<S: ExplorerState = Idle> {
    config: ExplorerConfig,
    device: DeviceConfig,
    /// `None` in single-threaded mode.
    pool: Option<rayon::ThreadPool>,
    _state: std::marker::PhantomData<S>,
    // Populated on load:
    graph: Option<ModelGraph<Validated>>,
    layers: Vec<LayerModel>,
    partitions: Vec<PartitionSpec>,
}

// ── Idle → Loaded ──────────────────────────────────────────────

impl Explorer<Idle> {
    /// Creates an engine from the given configuration.
    pub fn new(config: ExplorerConfig) -> Result<Self, ExplorerError> {
        config.validate()?;
        let device = config.device.resolve()?;
        tracing::info!("{}", device.summary());

        let pool = if config.singlethreaded {
            tracing::info!("single-threaded mode");
            None
        } else {
            let threads = config.resolve_threads();
            tracing::info!(threads, "starting worker pool");
            Some(rayon::ThreadPoolBuilder::new().num_threads(threads).build()?)
        };

        Ok(Self {
            config,
            device,
            pool,
            _state: std::marker::PhantomData,
            graph: None,
            layers: Vec::new(),
            partitions: Vec::new(),
        })
    }

    /// Loads the model named by the configuration.
    pub fn load_model(self) -> Result<Explorer<Loaded>, ExplorerError> {
        let graph = model_ir::ModelLoader::load(&self.config.model_path)?;
        self.with_graph(graph)
    }

    /// Uses an already validated graph.
    pub fn with_graph(self, graph: ModelGraph<Validated>) -> Result<Explorer<Loaded>, ExplorerError> {
        tracing::info!("{}", graph.summary());
        let options = self.config.model_options();

        // Layer name → names of the models standing for it.
        let mut expansion: Vec<(String, Vec<String>)> = Vec::new();
        let mut layers = Vec::new();
        for desc in graph.iter_layers() {
            let parts: Vec<&LayerDescriptor> = match desc.op_kind()? {
                OpKind::SqueezeExcitation if !self.config.se_block => {
                    desc.primitive_ops.iter().collect()
                }
                _ => vec![desc],
            };
            let mut names = Vec::with_capacity(parts.len());
            for part in parts {
                let model = LayerModel::from_descriptor(part, &options)?;
                names.push(model.name().to_string());
                layers.push(model);
            }
            expansion.push((desc.name.clone(), names));
        }

        let mut partitions = Vec::with_capacity(graph.partitions().len());
        for spec in graph.partitions() {
            let mut names = Vec::new();
            for layer in &spec.layers {
                let (_, models) = expansion.iter().find(|(n, _)| n == layer).ok_or_else(|| {
                    ExplorerError::UnknownLayer {
                        partition: spec.name.clone(),
                        layer: layer.clone(),
                    }
                })?;
                names.extend(models.iter().cloned());
            }
            partitions.push(PartitionSpec {
                name: spec.name.clone(),
                layers: names,
            });
        }

        tracing::info!(
            models = layers.len(),
            partitions = partitions.len(),
            se_block = self.config.se_block,
            "layer models built"
        );

        Ok(Explorer {
            config: self.config,
            device: self.device,
            pool: self.pool,
            _state: std::marker::PhantomData,
            graph: Some(graph),
            layers,
            partitions,
        })
    }
}

// ── Loaded: explore ────────────────────────────────────────────

impl Explorer<Loaded> {
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    /// Returns the model graph.
    pub fn graph(&self) -> Option<&ModelGraph<Validated>> {
        self.graph.as_ref()
    }

    /// Layer models in execution order, squeeze-excitation blocks expanded
    /// when `se_block` is off.
    pub fn layers(&self) -> &[LayerModel] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&LayerModel> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Partitions over [`Explorer::layers`] names.
    pub fn partitions(&self) -> &[PartitionSpec] {
        &self.partitions
    }

    fn model_name(&self) -> &str {
        self.graph.as_ref().map_or("model", |g| g.name.as_str())
    }

    pub fn layer_report_path(&self) -> PathBuf {
        self.config.output_dir.join(format!("{}.csv", self.model_name()))
    }

    pub fn pareto_report_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}_pareto.csv", self.model_name()))
    }

    pub fn partition_report_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}_partitions.csv", self.model_name()))
    }

    /// Runs `f` inside the worker pool, or inline when single-threaded.
    fn run<T: Send>(&self, f: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    fn ensure_output_dir(&self) -> Result<(), ExplorerError> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(|source| ExplorerError::Io {
            path: self.config.output_dir.clone(),
            source,
        })
    }

    /// Sweeps every layer, reporting feasible points to `observer`.
    pub fn sweep_layers(&self, observer: &dyn Observer) -> Result<Vec<LayerSweep>, ExplorerError> {
        let parallel = self.pool.is_some();
        self.layers
            .iter()
            .map(|layer| {
                self.run(|| {
                    sweep::sweep_layer(
                        layer,
                        &self.device,
                        &self.config.bandwidth_splits,
                        observer,
                        parallel,
                    )
                })
            })
            .collect()
    }

    /// Sweeps every layer and writes the full and Pareto layer reports.
    pub fn explore_layers(&self) -> Result<LayersReport, ExplorerError> {
        self.ensure_output_dir()?;
        let recorder = CsvRecorder::new(Some(ReportWriter::create(&self.layer_report_path())?), None);
        let sweeps = self.sweep_layers(&recorder)?;
        recorder.finish()?;

        let pareto: Vec<DesignPoint> = sweeps
            .iter()
            .flat_map(|s| pareto::pareto_front(s.points.clone()))
            .collect();
        report::write_points(&self.pareto_report_path(), &pareto)?;

        let report = LayersReport { sweeps, pareto };
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Searches every partition over the given candidate sets. A layer
    /// missing from `candidates` has no candidates.
    pub fn search_partitions(
        &self,
        candidates: &[(String, Vec<Configuration>)],
        observer: &dyn Observer,
    ) -> Result<Vec<PartitionResult>, ExplorerError> {
        let (bw_in, bw_out) = self.config.partition_bandwidth(&self.device);
        let composer = Composer::new(&self.device, bw_in, bw_out);
        let strategy = auto_strategy(self.config.singlethreaded);

        let mut results = Vec::with_capacity(self.partitions.len());
        for spec in &self.partitions {
            let mut layers = Vec::with_capacity(spec.layers.len());
            let mut sets = Vec::with_capacity(spec.layers.len());
            for name in &spec.layers {
                let layer = self.layer(name).ok_or_else(|| ExplorerError::UnknownLayer {
                    partition: spec.name.clone(),
                    layer: name.clone(),
                })?;
                layers.push(layer);
                sets.push(
                    candidates
                        .iter()
                        .find(|(l, _)| l == name)
                        .map(|(_, c)| c.clone())
                        .unwrap_or_default(),
                );
            }
            let space = SearchSpace::new(spec.name.clone(), layers, sets)?;
            let outcome = self.run(|| strategy.search(&space, &composer, observer))?;
            results.push(PartitionResult {
                partition: spec.name.clone(),
                layers: spec.layers.clone(),
                outcome,
            });
        }
        Ok(results)
    }

    /// Searches every partition using the Pareto layer report and writes
    /// the partition report: every feasible composition, then one
    /// `<partition>_best` row per implementable partition.
    pub fn explore_partitions(&self) -> Result<Vec<PartitionResult>, ExplorerError> {
        let candidates = report::read_candidates(&self.pareto_report_path())?;
        self.ensure_output_dir()?;
        let writer = ReportWriter::create(&self.partition_report_path())?;
        let recorder = CsvRecorder::new(None, Some(writer));
        let results = self.search_partitions(&candidates, &recorder)?;
        recorder.finish()?;

        let writer = ReportWriter::append(&self.partition_report_path())?;
        for result in &results {
            match result.outcome.best() {
                Some(best) => {
                    let mut row = ReportRow::from_partition(best)?;
                    row.layer = format!("{}_best", result.partition);
                    writer.write(&row)?;
                }
                None => tracing::warn!(
                    partition = %result.partition,
                    "no feasible implementation"
                ),
            }
        }
        writer.flush()?;
        Ok(results)
    }
}
