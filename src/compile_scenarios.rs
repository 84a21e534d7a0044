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
//! Compile all scenario files of a directory into persisted message sets.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use itertools::Itertools;
use rayon::prelude::*;

use bmpsim::{cache, compiler::compile, scenario::Scenario};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Directory holding the scenario description files (*.json).
    #[arg(short, long, default_value = "scenarios")]
    scenarios: PathBuf,
    /// Directory the compiled message sets are written to, one file per scenario.
    #[arg(short, long, default_value = "packets")]
    out: PathBuf,
}

/// Compile one scenario file and persist the result under the scenario's name.
fn compile_one(scenario_path: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(scenario_path)
        .with_context(|| format!("loading {}", scenario_path.display()))?;
    let set = compile(&scenario)
        .with_context(|| format!("compiling {}", scenario_path.display()))?;

    let stem = scenario_path
        .file_stem()
        .context("scenario file has no name")?;
    let mut out_path = out_dir.to_path_buf();
    out_path.push(stem);
    out_path.set_extension("json");

    // reload immediately: a message set that does not survive the round trip must never
    // reach the replay tool
    cache::persist_checked(&set, &out_path)
        .with_context(|| format!("persisting {}", out_path.display()))?;

    log::info!(
        "{}: {} messages ({} bytes) -> {}",
        scenario_path.display(),
        set.num_messages(),
        set.wire_size(),
        out_path.display()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    let scenario_files = std::fs::read_dir(&args.scenarios)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .sorted()
        .collect_vec();
    if scenario_files.is_empty() {
        log::warn!("no scenario files found in {}", args.scenarios.display());
        return Ok(());
    }
    std::fs::create_dir_all(&args.out)?;

    let failures: Vec<_> = scenario_files
        .par_iter()
        .filter_map(|path| match compile_one(path, &args.out) {
            Ok(()) => None,
            Err(e) => {
                log::error!("{e:#}");
                Some(path.clone())
            }
        })
        .collect();

    if !failures.is_empty() {
        return Err(format!("{} of {} scenarios failed", failures.len(), scenario_files.len()).into());
    }
    log::info!("compiled {} scenarios", scenario_files.len());
    Ok(())
}
