// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-evaluation hooks.
//!
//! Sweeps and searches report every feasible point they find through an
//! [`Observer`], so persistence and logging stay outside the evaluation
//! code. Observers are called from worker threads and must tolerate
//! interleaved calls.

use crate::PartitionPoint;
use layer_model::DesignPoint;

pub trait Observer: Send + Sync {
    /// A feasible single-layer design point.
    fn layer_point(&self, _point: &DesignPoint) {}

    /// A feasible partition composition.
    fn partition_point(&self, _point: &PartitionPoint) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Emits every event as a `tracing` debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn layer_point(&self, point: &DesignPoint) {
        tracing::debug!(
            layer = %point.layer,
            config = %point.config,
            latency = point.metrics.latency_cycles,
            dsp = point.metrics.dsp_util(),
            "layer design point"
        );
    }

    fn partition_point(&self, point: &PartitionPoint) {
        tracing::debug!(
            partition = %point.partition,
            index = point.index,
            latency = point.latency_cycles(),
            dsp = point.dsp_util(),
            "partition design point"
        );
    }
}
