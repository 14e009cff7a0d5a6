// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the options they share.

pub mod device;
pub mod inspect;
pub mod layers;
pub mod partitions;

use anyhow::Context;
use explorer::{DeviceSelection, ExplorerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 2)
        .init();
}

/// Options shared by every command that loads a model.
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Model manifest, or a directory holding `model.json`.
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Directory the CSV reports are written to.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Device preset: zc706, zcu102, vc709.
    #[arg(short, long)]
    pub device: Option<String>,

    /// Number of worker threads.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Evaluate on the main thread only.
    #[arg(long)]
    pub singlethreaded: bool,

    /// Model squeeze-excitation blocks as their primitive ops.
    #[arg(long)]
    pub no_se_block: bool,

    /// Use the approximate global-average-pool model.
    #[arg(long)]
    pub gap_approx: bool,
}

impl RunArgs {
    /// Applies the flags on top of the configuration file, if any.
    pub fn resolve(self, config: Option<PathBuf>) -> anyhow::Result<ExplorerConfig> {
        let mut resolved = match &config {
            Some(path) => ExplorerConfig::from_file(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?,
            None => ExplorerConfig::default(),
        };

        if let Some(model) = self.model {
            resolved.model_path = model;
        }
        if let Some(dir) = self.output_dir {
            resolved.output_dir = dir;
        }
        if let Some(name) = self.device {
            resolved.device = DeviceSelection::Preset(name);
        }
        if let Some(threads) = self.threads {
            resolved.num_threads = Some(threads);
        }
        resolved.singlethreaded |= self.singlethreaded;
        resolved.se_block &= !self.no_se_block;
        resolved.gap_approx |= self.gap_approx;

        resolved.validate()?;
        tracing::debug!(?resolved, "resolved configuration");
        Ok(resolved)
    }
}

/// Builds the explorer and loads its model.
pub fn load(config: ExplorerConfig) -> anyhow::Result<explorer::Explorer<explorer::Loaded>> {
    let model = config.model_path.clone();
    explorer::Explorer::new(config)?
        .load_model()
        .with_context(|| format!("failed to load model from '{}'", model.display()))
}

/// Prints the banner every command opens with.
pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", format!("dse · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}

/// Truncates a string to `max_len` with ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = RunArgs {
            model: Some("m.json".into()),
            device: Some("vc709".into()),
            threads: Some(3),
            no_se_block: true,
            ..RunArgs::default()
        };
        let config = args.resolve(None).unwrap();
        assert_eq!(config.model_path, PathBuf::from("m.json"));
        assert_eq!(config.device, DeviceSelection::Preset("vc709".into()));
        assert_eq!(config.num_threads, Some(3));
        assert!(!config.se_block);
        assert!(!config.gap_approx);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let args = RunArgs {
            threads: Some(0),
            ..RunArgs::default()
        };
        assert!(args.resolve(None).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Conv_0", 10), "Conv_0");
        assert_eq!(truncate("a_very_long_layer_name", 10), "a_very_...");
    }
}
