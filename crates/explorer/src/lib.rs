// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # explorer
//!
//! Drives a full design-space exploration of one model on one device.
//!
//! The explorer takes:
//! - A validated `ModelGraph` from `model-ir`.
//! - A `DeviceConfig` from `device`.
//! - Layer performance models from `layer-model`.
//!
//! And runs two stages, each producing CSV reports under the configured
//! output directory:
//!
//! 1. **Layers.** Every layer is evaluated over its parallelism and
//!    bandwidth grid. All feasible points go to `<model>.csv`, the per-layer
//!    latency/DSP Pareto front to `<model>_pareto.csv`.
//! 2. **Partitions.** The Pareto points become the candidate sets of each
//!    partition search; every feasible composition and the best one per
//!    partition go to `<model>_partitions.csv`.
//!
//! # Type-State Pipeline
//! ```text
//! Explorer<Idle> → Explorer<Loaded>
//! ```
//!
//! # Parallelism
//! Unless `singlethreaded` is set, layer sweeps and partition searches run
//! on a dedicated rayon pool sized by `num_threads`. Results do not depend
//! on the thread count.

mod config;
mod engine;
mod error;
pub mod pareto;
pub mod report;
pub mod sweep;

pub use config::{DeviceSelection, ExplorerConfig};
pub use engine::{Explorer, ExplorerState, Idle, LayersReport, Loaded, PartitionResult};
pub use error::ExplorerError;
pub use report::{CsvRecorder, ReportRow, ReportWriter};
pub use sweep::LayerSweep;
