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
//! Module defining the immutable description of one simulated router and its peering sessions.

use std::{
    hash::{Hash, Hasher},
    net::Ipv4Addr,
    path::Path,
};

use indexmap::IndexMap;
use ipnet::{IpNet, Ipv4Net};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::link;

/// Peers are identified by a free-form string. The same identifier must be used consistently
/// across all per-peer maps of a [`Scenario`].
pub type PeerId = String;

/// Description of the monitored system, sent in the initiation message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalIdentity {
    pub sys_descr: String,
    pub sys_name: String,
}

/// BGP identity of a speaker: its router-id and AS number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BgpIdentity {
    pub bgp_id: Ipv4Addr,
    pub asn: u32,
}

/// Path attributes applied to all prefixes announced by one peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathAttributes {
    #[serde(default = "default_local_pref")]
    pub local_pref: u32,
    #[serde(default)]
    pub med: u32,
    #[serde(default)]
    pub as_path: Vec<u32>,
    pub next_hop: Ipv4Addr,
    /// "normal" (4-byte) community values
    #[serde(default)]
    pub communities: Vec<u32>,
}

fn default_local_pref() -> u32 {
    100
}

/// Per-prefix path status annotation. The status tags are not validated against any registry;
/// they are carried to the collector verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PrefixStatus {
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A basic simulation: N peers of one local router, all announcing the same M IPv4 prefixes.
///
/// The insertion order of `peers` is significant: it fixes both the order in which
/// point-to-point links are allocated from `prefix_for_connection` and the order of the
/// per-peer messages in the compiled output. The same holds for the position of a prefix in
/// `prefixes`, which becomes its index in the path-status annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// select the enterprise-specific path-status TLV encoding instead of the standard one
    #[serde(default)]
    pub enterprise_tlv: bool,
    pub local_info: LocalIdentity,
    pub local_bgp: BgpIdentity,
    pub peers: IndexMap<PeerId, BgpIdentity>,
    /// address pool carved into one point-to-point link per peer
    pub prefix_for_connection: IpNet,
    pub prefixes: Vec<Ipv4Net>,
    pub attributes_per_peer: IndexMap<PeerId, PathAttributes>,
    pub status_per_prefix: IndexMap<PeerId, IndexMap<Ipv4Net, PrefixStatus>>,
}

impl Hash for Scenario {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.enterprise_tlv.hash(state);
        self.local_info.hash(state);
        self.local_bgp.hash(state);
        for (id, peer) in &self.peers {
            id.hash(state);
            peer.hash(state);
        }
        self.prefix_for_connection.hash(state);
        self.prefixes.hash(state);
        for (id, attrs) in &self.attributes_per_peer {
            id.hash(state);
            attrs.hash(state);
        }
        for (id, statuses) in &self.status_per_prefix {
            id.hash(state);
            for (prefix, status) in statuses {
                prefix.hash(state);
                status.hash(state);
            }
        }
    }
}

impl Scenario {
    /// Read a scenario from a JSON file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&raw)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the structural invariants that message compilation relies on.
    ///
    /// Every peer must have an entry in both per-peer maps (and vice versa), every prefix
    /// referenced by a status annotation must be announced, and the connection pool must be
    /// large enough to give each peer its own point-to-point link.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for id in self.peers.keys() {
            if !self.attributes_per_peer.contains_key(id) {
                return Err(ScenarioError::MissingAttributes(id.clone()));
            }
            if !self.status_per_prefix.contains_key(id) {
                return Err(ScenarioError::MissingStatus(id.clone()));
            }
        }
        for id in self.attributes_per_peer.keys() {
            if !self.peers.contains_key(id) {
                return Err(ScenarioError::UnknownPeer(id.clone(), "attributes_per_peer"));
            }
        }
        for (id, statuses) in &self.status_per_prefix {
            if !self.peers.contains_key(id) {
                return Err(ScenarioError::UnknownPeer(id.clone(), "status_per_prefix"));
            }
            for prefix in statuses.keys() {
                if !self.prefixes.contains(prefix) {
                    return Err(ScenarioError::UnannouncedPrefix {
                        peer: id.clone(),
                        prefix: *prefix,
                    });
                }
            }
        }
        let available = link::capacity(self.prefix_for_connection);
        if (self.peers.len() as u128) > available {
            return Err(ScenarioError::PoolTooSmall {
                pool: self.prefix_for_connection,
                peers: self.peers.len(),
                available,
            });
        }
        Ok(())
    }
}

/// Error thrown when a scenario is structurally invalid or cannot be loaded.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("peer {0} has no entry in attributes_per_peer")]
    MissingAttributes(PeerId),
    #[error("peer {0} has no entry in status_per_prefix")]
    MissingStatus(PeerId),
    #[error("peer {0} appears in {1} but is not a configured peer")]
    UnknownPeer(PeerId, &'static str),
    #[error("status for peer {peer} references {prefix}, which is not in the announced prefix list")]
    UnannouncedPrefix { peer: PeerId, prefix: Ipv4Net },
    #[error("connection pool {pool} only fits {available} point-to-point links, but {peers} peers are configured")]
    PoolTooSmall {
        pool: IpNet,
        peers: usize,
        available: u128,
    },
    #[error("cannot read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse scenario file: {0}")]
    Parse(#[from] serde_json::Error),
}
