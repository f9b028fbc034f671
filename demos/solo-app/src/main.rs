// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Refuses to start twice. Launch it in two terminals to see the guard work.
//!
//! ```text
//! RUST_LOG=soloist=debug cargo run -p solo-app -- --key my-app
//! ```

use std::io::BufRead;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use soloist::{ClaimOutcome, InstanceGuard};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Single-instance demo")]
struct Args {
    /// Application key shared by every copy that should exclude the others.
    #[arg(long, default_value = "soloist-demo")]
    key: String,

    /// Give up waiting for the lock semaphore after this many milliseconds.
    #[arg(long)]
    lock_timeout_ms: Option<u64>,

    /// Skip the stale-segment reset on startup.
    #[arg(long)]
    no_reset: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut builder = InstanceGuard::builder(args.key.as_str()).reset_on_open(!args.no_reset);
    if let Some(ms) = args.lock_timeout_ms {
        builder = builder.lock_timeout(Duration::from_millis(ms));
    }
    let mut guard = builder.build();

    match guard.claim() {
        ClaimOutcome::Claimed => {
            println!("running as the only instance of '{}'", guard.key());
            println!("press Enter to exit");

            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);

            ExitCode::SUCCESS
        }
        outcome => {
            eprintln!("refusing to start: {outcome}");
            ExitCode::from(1)
        }
    }
}
