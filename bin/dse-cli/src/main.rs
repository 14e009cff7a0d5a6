// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # dse
//!
//! Command-line interface for dataflow design-space exploration.
//!
//! ## Usage
//! ```bash
//! # Evaluate every layer and keep the Pareto points
//! dse layers --model ./models/x3d_m.json --device zc706
//!
//! # Search every partition over the Pareto points
//! dse partitions --model ./models/x3d_m.json --threads 8
//!
//! # Inspect the layer models of a network
//! dse inspect --model ./models/x3d_m.json --no-se-block
//!
//! # List device presets
//! dse device
//! ```

mod commands;

use clap::{Parser, Subcommand};
use commands::RunArgs;

#[derive(Parser)]
#[command(
    name = "dse",
    about = "Analytical performance modelling and design-space exploration for FPGA dataflow accelerators",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (explicit flags take precedence).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the layer models, parallelism kinds and partitions of a model.
    Inspect {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Evaluate every layer over its design grid and write the layer reports.
    Layers {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Search every partition for its fastest feasible implementation.
    Partitions {
        #[command(flatten)]
        args: RunArgs,

        /// Re-run the layer stage even when a Pareto report exists.
        #[arg(long)]
        fresh: bool,
    },

    /// Show a device preset, or list them all.
    Device {
        /// Preset name (zc706, zcu102, vc709).
        #[arg(short, long)]
        name: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { args } => commands::inspect::execute(args.resolve(cli.config)?),
        Commands::Layers { args } => commands::layers::execute(args.resolve(cli.config)?),
        Commands::Partitions { args, fresh } => {
            commands::partitions::execute(args.resolve(cli.config)?, fresh)
        }
        Commands::Device { name } => commands::device::execute(name, cli.config),
    }
}
