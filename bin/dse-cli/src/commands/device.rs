// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dse device` command: show device budgets.

use anyhow::Context;
use device::DeviceConfig;
use std::path::PathBuf;

pub fn execute(name: Option<String>, config: Option<PathBuf>) -> anyhow::Result<()> {
    super::banner("Devices");

    let devices = match (name, config) {
        (Some(name), _) => vec![DeviceConfig::preset(&name)?],
        (None, Some(path)) => {
            let config = explorer::ExplorerConfig::from_file(&path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            vec![config.device.resolve()?]
        }
        (None, None) => DeviceConfig::preset_names()
            .iter()
            .map(|n| DeviceConfig::preset(n))
            .collect::<Result<_, _>>()?,
    };

    println!(
        "  {:<10} {:>8} {:>6} {:>6} {:>14} {:>10}",
        "Name", "MHz", "DSP", "BRAM", "Bandwidth", "Words/cyc",
    );
    println!("  {}", "-".repeat(60));
    for d in &devices {
        println!(
            "  {:<10} {:>8.0} {:>6} {:>6} {:>14} {:>10.2}",
            d.name,
            d.clock_hz / 1e6,
            d.dsp,
            d.bram_blocks,
            d.mem_bandwidth.to_string(),
            d.words_per_cycle(),
        );
    }
    println!();
    Ok(())
}
