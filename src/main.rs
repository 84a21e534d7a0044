// BMPSIM: Synthetic BMP Session Generation and Replay for Collector Stress Testing
// Copyright (C) 2025-2026 the bmpsim developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Replay a persisted message set against a collector from many simulated clients.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;

use bmpsim::{
    cache,
    replay::{ReplayConfig, ReplayEngine, SessionOutcome, Wait},
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Address of the collector to stress.
    #[arg(short, long, default_value = "127.0.0.1")]
    collector: IpAddr,
    /// TCP port of the collector.
    #[arg(short, long, default_value_t = 1790)]
    port: u16,
    /// Source address of the first simulated client; client i binds the i-th successor.
    #[arg(short = 's', long, default_value = "127.0.0.1")]
    first_source: IpAddr,
    /// Prefix length of the address block the client sources are drawn from.
    #[arg(short = 'l', long, default_value_t = 8)]
    source_prefix_len: u8,
    /// Number of concurrently simulated clients.
    #[arg(short = 'n', long, default_value_t = 1)]
    clients: usize,
    /// Distributed-start window in seconds; each client delays its connect by a random
    /// amount within the window. 0 disables the jitter.
    #[arg(short = 'w', long, default_value_t = 0)]
    start_window: u64,
    /// Test duration in seconds after which all sessions are stopped. 0 runs until ctrl-c.
    #[arg(short, long, default_value_t = 0)]
    duration: u64,
    /// Path to a persisted message-set file produced by compile_scenarios.
    #[arg(short = 'f', long)]
    packets: PathBuf,
    /// Seconds to wait between update batches: one value, or two values forming an
    /// inclusive range to sample from.
    #[arg(long, num_args = 1..=2, default_values_t = [30u64])]
    wait: Vec<u64>,
    /// Seed for jitter and interval sampling, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    // reject invalid combinations before any session starts
    let wait = Wait::from_values(&args.wait)?;
    let set = cache::reload(&args.packets)?;
    let engine = ReplayEngine::new(
        ReplayConfig {
            collector: SocketAddr::new(args.collector, args.port),
            first_source: args.first_source,
            source_prefix_len: args.source_prefix_len,
            num_clients: args.clients,
            start_window: args.start_window,
            duration: args.duration,
            wait,
            seed: args.seed,
        },
        set,
    )?;

    let reports = engine
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    for report in reports.iter().filter(|r| r.outcome != SessionOutcome::Stopped) {
        log::warn!(
            "session {} ({}) failed after {} update batches: {:?}",
            report.id,
            report.source,
            report.batches_sent,
            report.outcome
        );
    }
    let counts = reports.iter().counts_by(|r| match r.outcome {
        SessionOutcome::Stopped => "stopped",
        SessionOutcome::ConnectFailed(_) => "connect failed",
        SessionOutcome::SendFailed(_) => "send failed",
    });
    let batches: u64 = reports.iter().map(|r| r.batches_sent).sum();
    log::info!("sent {batches} update batches in total");
    for (outcome, count) in counts.iter().sorted() {
        log::info!("{count} sessions {outcome}");
    }

    Ok(())
}
