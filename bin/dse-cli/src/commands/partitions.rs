// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dse partitions` command: search each partition for its fastest
//! feasible implementation.
//!
//! Candidates come from the Pareto layer report, which is produced first
//! when missing.

use explorer::ExplorerConfig;
use partition_planner::SearchOutcome;
use std::time::Instant;

pub fn execute(config: ExplorerConfig, fresh: bool) -> anyhow::Result<()> {
    super::banner("Partition Search");

    let explorer = super::load(config)?;
    println!("  Device: {}", explorer.device().summary());
    println!();

    if fresh || !explorer.pareto_report_path().exists() {
        println!("  [1/2] Sweeping layers...");
        let report = explorer.explore_layers()?;
        println!("        {}", report.summary());
    } else {
        println!(
            "  [1/2] Reusing {}",
            explorer.pareto_report_path().display()
        );
    }
    println!();

    println!("  [2/2] Searching partitions...");
    let start = Instant::now();
    let results = explorer.explore_partitions()?;
    let elapsed = start.elapsed();
    println!();

    for result in &results {
        println!("  {} ({} layers)", result.partition, result.layers.len());
        match &result.outcome {
            SearchOutcome::Found {
                best,
                evaluated,
                feasible,
            } => {
                println!("   {}", best.summary());
                println!("   {feasible}/{evaluated} compositions feasible");
                for point in &best.layers {
                    println!(
                        "     {:<28} {}",
                        super::truncate(&point.layer, 28),
                        point.config,
                    );
                }
            }
            SearchOutcome::NoFeasible { .. } => println!("   {}", result.outcome.summary()),
        }
        println!();
    }

    let implementable = results.iter().filter(|r| r.outcome.best().is_some()).count();
    println!(
        "  {implementable}/{} partitions implementable in {:.2}s",
        results.len(),
        elapsed.as_secs_f64(),
    );
    println!("  Report: {}", explorer.partition_report_path().display());
    println!();
    Ok(())
}
