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
//! Module carving a connection address pool into per-peer point-to-point links.

use std::net::IpAddr;

use ipnet::{IpNet, IpSubnets};
use thiserror::Error;

/// Prefix length of a point-to-point link: two usable addresses, nothing more.
fn link_prefix_len(pool: &IpNet) -> u8 {
    match pool {
        IpNet::V4(_) => 31,
        IpNet::V6(_) => 127,
    }
}

/// One allocated point-to-point link. The first usable address of the sub-net is ours, the
/// second belongs to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerLink {
    pub local: IpAddr,
    pub remote: IpAddr,
}

/// Number of point-to-point links a pool can yield.
pub fn capacity(pool: IpNet) -> u128 {
    let target = link_prefix_len(&pool);
    let prefix_len = pool.prefix_len();
    if prefix_len > target {
        0
    } else {
        1u128 << (target - prefix_len)
    }
}

/// Hands out point-to-point sub-nets of a connection pool in ascending address order.
///
/// The cursor is scoped to one compilation: a sub-net is never handed out twice, and two
/// allocators over the same pool produce the same sequence.
#[derive(Debug)]
pub struct LinkAllocator {
    pool: IpNet,
    subnets: IpSubnets,
    allocated: usize,
}

impl LinkAllocator {
    pub fn new(pool: IpNet) -> Result<Self, LinkError> {
        let subnets = pool
            .subnets(link_prefix_len(&pool))
            .map_err(|_| LinkError::PoolExhausted { pool, allocated: 0 })?;
        Ok(Self {
            pool,
            subnets,
            allocated: 0,
        })
    }

    /// Allocate the next unused link of the pool.
    pub fn next_link(&mut self) -> Result<PeerLink, LinkError> {
        let net = self.subnets.next().ok_or(LinkError::PoolExhausted {
            pool: self.pool,
            allocated: self.allocated,
        })?;
        let mut hosts = net.hosts();
        // a /31 (or /127) always has exactly two usable hosts
        let local = hosts.next().expect("point-to-point link has two hosts");
        let remote = hosts.next().expect("point-to-point link has two hosts");
        self.allocated += 1;
        Ok(PeerLink { local, remote })
    }
}

/// Format an address the way the BMP per-peer header expects it: 16 bytes, with IPv4
/// embedded in the all-zero IPv6 prefix.
pub fn bmp_peer_addr(addr: IpAddr) -> [u8; 16] {
    match addr {
        IpAddr::V4(v4) => {
            let mut bytes = [0u8; 16];
            bytes[12..].copy_from_slice(&v4.octets());
            bytes
        }
        IpAddr::V6(v6) => v6.octets(),
    }
}

/// Error thrown when the connection pool cannot fit another link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("connection pool {pool} is exhausted after {allocated} point-to-point links")]
    PoolExhausted { pool: IpNet, allocated: usize },
}
