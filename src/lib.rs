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
//! Library for generating and replaying synthetic BMP sessions against a collector.
//!
//! A [`scenario::Scenario`] describes one simulated router with its peers, announced
//! prefixes and per-prefix path statuses. The [`compiler`] turns it into a reproducible
//! [`compiler::MessageSet`], the [`cache`] persists that set to disk, and the
//! [`replay::ReplayEngine`] streams it to a collector from many concurrent simulated
//! clients.

pub mod cache;
pub mod compiler;
pub mod link;
pub mod replay;
pub mod scenario;
pub mod wire;

#[cfg(test)]
pub(crate) mod test_util;

pub mod prelude {
    pub use super::{
        cache,
        compiler::{compile, CompileError, MessageSet},
        link::LinkAllocator,
        replay::{ReplayConfig, ReplayEngine, SessionOutcome, SessionReport, Wait},
        scenario::Scenario,
    };
}
