/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use newt::{Cli, Engine, EngineCommand};
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr so they never interleave with UCI output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut engine = Engine::new();

    // Commands given on the command line run once, then the engine exits
    let lines = cli.command_lines();
    if !lines.is_empty() {
        for line in &lines {
            engine.send_input(line);
        }
        engine.send_command(EngineCommand::Exit { cleanup: true });
    }

    if let Err(e) = engine.run() {
        eprintln!("{} encountered an error: {e:#}", env!("CARGO_PKG_NAME"));
    }
}
