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
//! Shared helpers for the test modules.

use indexmap::IndexMap;

use crate::scenario::{
    BgpIdentity, LocalIdentity, PathAttributes, PrefixStatus, Scenario,
};

/// A two-peer, two-prefix scenario exercising both status encodings' inputs: r1 uses a
/// 2-byte ASN, r2 a 4-byte one.
pub(crate) fn basic_scenario() -> Scenario {
    Scenario {
        enterprise_tlv: false,
        local_info: LocalIdentity {
            sys_descr: "simulated edge router".to_string(),
            sys_name: "sim0".to_string(),
        },
        local_bgp: BgpIdentity {
            bgp_id: "10.0.0.1".parse().unwrap(),
            asn: 65000,
        },
        peers: IndexMap::from([
            (
                "r1".to_string(),
                BgpIdentity {
                    bgp_id: "10.0.0.2".parse().unwrap(),
                    asn: 65001,
                },
            ),
            (
                "r2".to_string(),
                BgpIdentity {
                    bgp_id: "10.0.0.3".parse().unwrap(),
                    asn: 4_200_000_001,
                },
            ),
        ]),
        prefix_for_connection: "10.10.0.0/24".parse().unwrap(),
        prefixes: vec!["10.1.0.0/24".parse().unwrap(), "10.1.1.0/24".parse().unwrap()],
        attributes_per_peer: IndexMap::from([
            (
                "r1".to_string(),
                PathAttributes {
                    local_pref: 100,
                    med: 0,
                    as_path: vec![65001],
                    next_hop: "10.0.0.2".parse().unwrap(),
                    communities: vec![],
                },
            ),
            (
                "r2".to_string(),
                PathAttributes {
                    local_pref: 50,
                    med: 5,
                    as_path: vec![4_200_000_001, 65010],
                    next_hop: "10.0.0.3".parse().unwrap(),
                    communities: vec![0x0001_0002],
                },
            ),
        ]),
        status_per_prefix: IndexMap::from([
            (
                "r1".to_string(),
                IndexMap::from([(
                    "10.1.1.0/24".parse().unwrap(),
                    PrefixStatus {
                        status: vec!["best".to_string()],
                        reason: Some("selected".to_string()),
                    },
                )]),
            ),
            (
                "r2".to_string(),
                IndexMap::from([(
                    "10.1.0.0/24".parse().unwrap(),
                    PrefixStatus {
                        status: vec!["stale".to_string(), "backup".to_string()],
                        reason: None,
                    },
                )]),
            ),
        ]),
    }
}
