// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use pennywise::{cli, commands};

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "pennywise=warn",
        1 => "pennywise=info",
        _ => "pennywise=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    if !commands::dispatch(&matches)? {
        cli::build_cli().print_help()?;
        println!();
    }
    Ok(())
}
