// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dse layers` command: sweep every layer and write the layer reports.

use explorer::ExplorerConfig;
use std::time::Instant;

pub fn execute(config: ExplorerConfig) -> anyhow::Result<()> {
    super::banner("Layer Sweep");

    let explorer = super::load(config)?;
    println!("  Device: {}", explorer.device().summary());
    println!();

    let start = Instant::now();
    let report = explorer.explore_layers()?;
    let elapsed = start.elapsed();

    println!(
        "  {:<30} {:>10} {:>10} {:>8} {:>14}",
        "Layer", "Evaluated", "Feasible", "Pareto", "Best (cycles)",
    );
    println!("  {}", "-".repeat(76));
    for sweep in &report.sweeps {
        let pareto = report.pareto.iter().filter(|p| p.layer == sweep.layer).count();
        let best = sweep
            .points
            .iter()
            .map(|p| p.metrics.latency_cycles)
            .min()
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "  {:<30} {:>10} {:>10} {:>8} {:>14}",
            super::truncate(&sweep.layer, 30),
            sweep.evaluated,
            sweep.feasible(),
            pareto,
            best,
        );
    }
    println!();
    println!("  {} in {:.2}s", report.summary(), elapsed.as_secs_f64());
    println!("  All points:   {}", explorer.layer_report_path().display());
    println!("  Pareto front: {}", explorer.pareto_report_path().display());
    println!();
    Ok(())
}
