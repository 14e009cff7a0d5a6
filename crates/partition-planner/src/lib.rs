// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # partition-planner
//!
//! Composes per-layer design points into partitions (chains of layers
//! resident on the device together) and searches each partition's design
//! space for the fastest feasible composition.
//!
//! # Strategies
//!
//! | Strategy | Threads | Outcome |
//! |---|---|---|
//! | [`Exhaustive`] | caller's | best by (latency, DSP, index) |
//! | [`ParallelExhaustive`] | rayon pool | identical to [`Exhaustive`] |
//!
//! New strategies implement [`SearchStrategy`]:
//!
//! ```ignore
//! struct Sampled;
//! impl SearchStrategy for Sampled {
//!     fn name(&self) -> &str { "sampled" }
//!     fn search(&self, space: &SearchSpace<'_>, composer: &Composer<'_>,
//!               observer: &dyn Observer) -> Result<SearchOutcome, PlannerError> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```
//! use device::DeviceConfig;
//! use flow_core::TensorShape;
//! use layer_model::{Configuration, LayerModel, ModelOptions, Parallelism};
//! use model_ir::LayerDescriptor;
//! use partition_planner::{Composer, Exhaustive, NoopObserver, SearchSpace, SearchStrategy};
//!
//! let shape = TensorShape::new(1, 16, 4, 8, 8);
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
//! let relu = LayerModel::from_descriptor(&desc, &ModelOptions::default()).unwrap();
//! let candidates = vec![vec![
//!     Configuration::new(Parallelism::Shared { coarse_inout: 0.5 }, 16.0, 16.0),
//!     Configuration::new(Parallelism::Shared { coarse_inout: 1.0 }, 16.0, 16.0),
//! ]];
//! let space = SearchSpace::new("part_0", vec![&relu], candidates).unwrap();
//! let device = DeviceConfig::zc706();
//! let composer = Composer::new(&device, 16.0, 16.0);
//! let outcome = Exhaustive::new().search(&space, &composer, &NoopObserver).unwrap();
//! println!("{}", outcome.summary());
//! ```

mod composer;
mod error;
mod observer;
pub mod search;

pub use composer::{Composer, Composition, Infeasibility, PartitionPoint};
pub use error::PlannerError;
pub use observer::{NoopObserver, Observer, TracingObserver};
pub use search::exhaustive::Exhaustive;
pub use search::parallel::ParallelExhaustive;
pub use search::{rank, SearchOutcome, SearchSpace, SearchStrategy};

/// Picks the exhaustive strategy matching the threading mode.
pub fn auto_strategy(singlethreaded: bool) -> Box<dyn SearchStrategy> {
    if singlethreaded {
        tracing::info!("single-threaded run → using exhaustive strategy");
        Box::new(Exhaustive::new())
    } else {
        tracing::info!("parallel run → using parallel-exhaustive strategy");
        Box::new(ParallelExhaustive::new())
    }
}
