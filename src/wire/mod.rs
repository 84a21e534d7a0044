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
//! Module constructing the BMP and BGP messages that make up a compiled scenario.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub mod bgp;
pub mod bmp;

/// A fully framed protocol message in its canonical byte representation.
///
/// Messages are immutable once built; equality and hashing go over the bytes, so two
/// messages are equal exactly when they are byte-identical on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireMessage(Bytes);

impl WireMessage {
    pub(crate) fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
