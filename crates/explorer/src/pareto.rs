// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! (latency, DSP) Pareto frontier of a layer's design points.

use layer_model::DesignPoint;
use std::collections::HashSet;

/// `true` when `a` is no worse than `b` in latency and DSP and strictly
/// better in one of them.
pub fn dominates(a: &DesignPoint, b: &DesignPoint) -> bool {
    let (la, lb) = (a.metrics.latency_cycles, b.metrics.latency_cycles);
    let (da, db) = (a.metrics.dsp_util(), b.metrics.dsp_util());
    la <= lb && da <= db && (la < lb || da < db)
}

/// Drops repeated `(layer, configuration)` pairs, keeping the first.
pub fn dedup(points: Vec<DesignPoint>) -> Vec<DesignPoint> {
    let mut seen = HashSet::new();
    points
        .into_iter()
        .filter(|p| {
            // Configurations hold floats, so key on their exact JSON form.
            let key = serde_json::to_string(&p.config).unwrap_or_default();
            seen.insert((p.layer.clone(), key))
        })
        .collect()
}

/// The non-dominated points, ascending by latency then DSP. Points with
/// identical figures are all kept, in their original order.
pub fn pareto_front(points: Vec<DesignPoint>) -> Vec<DesignPoint> {
    let mut points = dedup(points);
    // Stable: ties keep sweep order.
    points.sort_by(|a, b| {
        a.metrics
            .latency_cycles
            .cmp(&b.metrics.latency_cycles)
            .then_with(|| a.metrics.dsp_util().total_cmp(&b.metrics.dsp_util()))
    });

    let mut front: Vec<DesignPoint> = Vec::new();
    // Lowest DSP among strictly faster latencies, and among the current one.
    let mut best_faster = f64::INFINITY;
    let mut current: Option<(u64, f64)> = None;
    for p in points {
        let (lat, dsp) = (p.metrics.latency_cycles, p.metrics.dsp_util());
        match current {
            Some((l, d)) if l == lat => {
                if dsp == d && d < best_faster {
                    front.push(p);
                }
            }
            _ => {
                if let Some((_, d)) = current {
                    best_faster = best_faster.min(d);
                }
                // Sorted by DSP within a latency, so this is the group's
                // minimum.
                current = Some((lat, dsp));
                if dsp < best_faster {
                    front.push(p);
                }
            }
        }
    }
    front
}
