// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dse inspect` command: display the layer models of a network.
//!
//! Prints each model's kind, stage chain, parallelism shape and the size of
//! its sweep grid, followed by the partitions.

use explorer::{sweep, ExplorerConfig};
use model_ir::{graph::Validated, LayerDescriptor, ModelGraph};

pub fn execute(config: ExplorerConfig) -> anyhow::Result<()> {
    super::banner("Model Inspector");

    let explorer = super::load(config)?;
    let device = explorer.device();
    let splits = &explorer.config().bandwidth_splits;

    // ── Summary ────────────────────────────────────────────────
    if let Some(graph) = explorer.graph() {
        println!("  {}", graph.summary());
    }
    println!("  Device: {}", device.summary());
    println!();

    // ── Per-Layer Detail ───────────────────────────────────────
    println!(
        "  {:<4} {:<30} {:<16} {:<12} {:<34} {:>12} {:>8}",
        "Idx", "Name", "Kind", "Stages", "Parallelism", "MACs", "Grid",
    );
    println!("  {}", "-".repeat(123));

    for (i, layer) in explorer.layers().iter().enumerate() {
        let stages = layer.topology().map_or("composite", |t| t.as_str());
        let macs = explorer
            .graph()
            .and_then(|g| find_descriptor(g, layer.name()))
            .map_or(0, LayerDescriptor::macs);
        println!(
            "  {:<4} {:<30} {:<16} {:<12} {:<34} {:>12} {:>8}",
            i,
            super::truncate(layer.name(), 30),
            layer.label(),
            stages,
            layer.parallelism_kind().to_string(),
            macs,
            sweep::configurations(layer, device, splits).len(),
        );
    }
    println!();

    // ── Partitions ─────────────────────────────────────────────
    println!("  Partitions:");
    for partition in explorer.partitions() {
        println!("   {:<10} {}", partition.name, partition.layers.join(" → "));
    }
    println!();
    Ok(())
}

/// Looks a name up among the layers and their squeeze-excitation primitives.
fn find_descriptor<'a>(graph: &'a ModelGraph<Validated>, name: &str) -> Option<&'a LayerDescriptor> {
    graph.iter_layers().find_map(|l| {
        if l.name == name {
            Some(l)
        } else {
            l.primitive_ops.iter().find(|p| p.name == name)
        }
    })
}
