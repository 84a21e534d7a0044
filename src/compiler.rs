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
//! Module compiling a scenario into the ordered set of messages to replay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    link::{LinkAllocator, LinkError},
    scenario::{Scenario, ScenarioError},
    wire::{
        bgp::{BgpOpen, BgpUpdate},
        bmp::{Initiation, PathStatusTlv, PeerUp, PerPeerHeader, RouteMonitoring},
        WireMessage,
    },
};

/// The compiled output for one scenario: the initiation message, then one peer-up and one
/// route-monitoring message per peer, both in the scenario's peer order.
///
/// Two sets are equal exactly when all member messages are byte-identical and the sequences
/// have the same length; this is the identity used by the message cache. The set is never
/// mutated after compilation, so replay sessions can share one instance freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSet {
    pub initiation: WireMessage,
    pub peer_ups: Vec<WireMessage>,
    pub updates: Vec<WireMessage>,
}

impl MessageSet {
    /// Number of messages across all three parts.
    pub fn num_messages(&self) -> usize {
        1 + self.peer_ups.len() + self.updates.len()
    }

    /// Total wire size of all messages.
    pub fn wire_size(&self) -> usize {
        self.initiation.len()
            + self.peer_ups.iter().map(WireMessage::len).sum::<usize>()
            + self.updates.iter().map(WireMessage::len).sum::<usize>()
    }
}

/// Error thrown when a scenario cannot be compiled. Nothing is emitted on failure.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Compile a scenario into its message set.
///
/// The result is deterministic: the only timestamps in the output are pinned constants, and
/// link allocation follows the peer order of the scenario. Compiling an equal scenario twice
/// yields byte-identical messages.
pub fn compile(sim: &Scenario) -> Result<MessageSet, CompileError> {
    sim.validate()?;

    let mut links = LinkAllocator::new(sim.prefix_for_connection)?;

    let initiation = Initiation {
        sys_descr: sim.local_info.sys_descr.clone(),
        sys_name: sim.local_info.sys_name.clone(),
    }
    .encode();

    // the OPEN we report as sent is the same for every peer
    let sent_open = BgpOpen {
        asn: sim.local_bgp.asn,
        bgp_id: sim.local_bgp.bgp_id,
    }
    .encode();

    let mut peer_ups = Vec::with_capacity(sim.peers.len());
    let mut updates = Vec::with_capacity(sim.peers.len());

    for (peer_id, peer) in &sim.peers {
        let link = links.next_link()?;
        let per_peer = PerPeerHeader {
            peer_addr: link.remote,
            peer_asn: peer.asn,
            peer_bgp_id: u32::from(peer.bgp_id),
        };

        let received_open = BgpOpen {
            asn: peer.asn,
            bgp_id: peer.bgp_id,
        }
        .encode();

        peer_ups.push(
            PeerUp {
                peer: per_peer,
                local_addr: link.local,
                sent_open: sent_open.clone(),
                received_open,
            }
            .encode(),
        );

        let attrs = sim
            .attributes_per_peer
            .get(peer_id)
            .ok_or_else(|| ScenarioError::MissingAttributes(peer_id.clone()))?;
        let update = BgpUpdate {
            as_path: attrs.as_path.clone(),
            next_hop: attrs.next_hop,
            med: attrs.med,
            local_pref: attrs.local_pref,
            communities: attrs.communities.clone(),
            prefixes: sim.prefixes.clone(),
        }
        .encode();

        let statuses = sim
            .status_per_prefix
            .get(peer_id)
            .ok_or_else(|| ScenarioError::MissingStatus(peer_id.clone()))?;
        let mut status_tlvs = Vec::with_capacity(statuses.len());
        for (prefix, status) in statuses {
            let index = sim
                .prefixes
                .iter()
                .position(|p| p == prefix)
                .ok_or_else(|| ScenarioError::UnannouncedPrefix {
                    peer: peer_id.clone(),
                    prefix: *prefix,
                })?;
            status_tlvs.push(PathStatusTlv {
                index: index as u16,
                status: status.status.clone(),
                reason: status.reason.clone(),
            });
        }

        updates.push(
            RouteMonitoring {
                peer: per_peer,
                update,
                status: status_tlvs,
                enterprise: sim.enterprise_tlv,
            }
            .encode(),
        );
    }

    log::debug!(
        "compiled {} peers / {} prefixes into {} messages",
        sim.peers.len(),
        sim.prefixes.len(),
        1 + peer_ups.len() + updates.len()
    );

    Ok(MessageSet {
        initiation,
        peer_ups,
        updates,
    })
}
