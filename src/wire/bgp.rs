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
//! Module building the BGP OPEN and UPDATE messages carried inside BMP.

use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};
use ipnet::Ipv4Net;

use super::WireMessage;

/// Placeholder ASN for the legacy 2-byte "My AS" field when the real ASN needs 4 bytes.
pub const AS_TRANS: u16 = 23456;
/// Hold time advertised in every OPEN.
pub const HOLD_TIME: u16 = 180;

const MSG_OPEN: u8 = 1;
const MSG_UPDATE: u8 = 2;
const HEADER_LEN: usize = 19;

const AFI_IPV4: u16 = 1;
const SAFI_UNICAST: u8 = 1;
const CAP_MULTIPROTOCOL: u8 = 1;
const CAP_ROUTE_REFRESH: u8 = 2;
const CAP_FOUR_BYTE_ASN: u8 = 65;

const ATTR_TRANSITIVE: u8 = 0x40;
const ATTR_OPTIONAL: u8 = 0x80;
const ATTR_ORIGIN: u8 = 1;
const ATTR_AS_PATH: u8 = 2;
const ATTR_NEXT_HOP: u8 = 3;
const ATTR_MED: u8 = 4;
const ATTR_LOCAL_PREF: u8 = 5;
const ATTR_COMMUNITIES: u8 = 8;
const ORIGIN_IGP: u8 = 0;
const AS_SEQUENCE: u8 = 2;

/// The 2-byte ASN to advertise in the OPEN header for a (possibly 4-byte) ASN.
pub fn legacy_asn(asn: u32) -> u16 {
    if asn > u16::MAX as u32 {
        AS_TRANS
    } else {
        asn as u16
    }
}

/// A BGP OPEN advertising multiprotocol IPv4-unicast, route-refresh, and the 4-byte-ASN
/// capability carrying the true ASN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgpOpen {
    pub asn: u32,
    pub bgp_id: Ipv4Addr,
}

impl BgpOpen {
    pub fn encode(&self) -> WireMessage {
        let mut caps = BytesMut::new();
        caps.put_u8(CAP_MULTIPROTOCOL);
        caps.put_u8(4);
        caps.put_u16(AFI_IPV4);
        caps.put_u8(0); // reserved
        caps.put_u8(SAFI_UNICAST);
        caps.put_u8(CAP_ROUTE_REFRESH);
        caps.put_u8(0);
        caps.put_u8(CAP_FOUR_BYTE_ASN);
        caps.put_u8(4);
        caps.put_u32(self.asn);

        let mut body = BytesMut::new();
        body.put_u8(4); // BGP version
        body.put_u16(legacy_asn(self.asn));
        body.put_u16(HOLD_TIME);
        body.put_slice(&self.bgp_id.octets());
        // one optional parameter holding all capabilities
        body.put_u8((caps.len() + 2) as u8);
        body.put_u8(2); // parameter type: capabilities
        body.put_u8(caps.len() as u8);
        body.put_slice(&caps);

        frame(MSG_OPEN, &body)
    }
}

/// A BGP UPDATE announcing a list of IPv4 prefixes with one shared set of path attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgpUpdate {
    pub as_path: Vec<u32>,
    pub next_hop: Ipv4Addr,
    pub med: u32,
    pub local_pref: u32,
    pub communities: Vec<u32>,
    pub prefixes: Vec<Ipv4Net>,
}

impl BgpUpdate {
    pub fn encode(&self) -> WireMessage {
        let mut attrs = BytesMut::new();
        put_attr(&mut attrs, ATTR_TRANSITIVE, ATTR_ORIGIN, &[ORIGIN_IGP]);

        // AS_PATH: a single AS_SEQUENCE segment of 4-byte ASNs
        let mut as_path = BytesMut::new();
        as_path.put_u8(AS_SEQUENCE);
        as_path.put_u8(self.as_path.len() as u8);
        for asn in &self.as_path {
            as_path.put_u32(*asn);
        }
        put_attr(&mut attrs, ATTR_TRANSITIVE, ATTR_AS_PATH, &as_path);

        put_attr(
            &mut attrs,
            ATTR_TRANSITIVE,
            ATTR_NEXT_HOP,
            &self.next_hop.octets(),
        );
        put_attr(
            &mut attrs,
            ATTR_OPTIONAL,
            ATTR_MED,
            &self.med.to_be_bytes(),
        );
        put_attr(
            &mut attrs,
            ATTR_TRANSITIVE,
            ATTR_LOCAL_PREF,
            &self.local_pref.to_be_bytes(),
        );
        let mut communities = BytesMut::new();
        for community in &self.communities {
            communities.put_u32(*community);
        }
        put_attr(
            &mut attrs,
            ATTR_TRANSITIVE | ATTR_OPTIONAL,
            ATTR_COMMUNITIES,
            &communities,
        );

        let mut body = BytesMut::new();
        body.put_u16(0); // no withdrawn routes
        body.put_u16(attrs.len() as u16);
        body.put_slice(&attrs);
        for prefix in &self.prefixes {
            put_nlri(&mut body, *prefix);
        }

        frame(MSG_UPDATE, &body)
    }
}

fn put_attr(buf: &mut BytesMut, flags: u8, code: u8, value: &[u8]) {
    buf.put_u8(flags);
    buf.put_u8(code);
    buf.put_u8(value.len() as u8);
    buf.put_slice(value);
}

fn put_nlri(buf: &mut BytesMut, prefix: Ipv4Net) {
    let len = prefix.prefix_len();
    buf.put_u8(len);
    let octets = prefix.network().octets();
    buf.put_slice(&octets[..(len as usize + 7) / 8]);
}

/// Prepend the 19-byte BGP header (marker, length, type) to a message body.
fn frame(msg_type: u8, body: &[u8]) -> WireMessage {
    let mut msg = BytesMut::with_capacity(HEADER_LEN + body.len());
    msg.put_slice(&[0xff; 16]);
    msg.put_u16((HEADER_LEN + body.len()) as u16);
    msg.put_u8(msg_type);
    msg.put_slice(body);
    WireMessage::new(msg.freeze())
}

#[cfg(test)]
mod test {
    use super::*;
    use byteorder::{BigEndian, ByteOrder};

    fn open_fields(msg: &WireMessage) -> (u16, u32) {
        let bytes = msg.as_bytes();
        // the legacy ASN sits right after the header and version byte
        let my_as = BigEndian::read_u16(&bytes[20..22]);
        // the 4-byte-ASN capability is the last one in the parameter
        let len = bytes.len();
        let cap_asn = BigEndian::read_u32(&bytes[len - 4..]);
        assert_eq!(bytes[len - 6], CAP_FOUR_BYTE_ASN);
        (my_as, cap_asn)
    }

    #[test]
    fn small_asn_is_advertised_directly() {
        let open = BgpOpen {
            asn: 65001,
            bgp_id: "10.0.0.1".parse().unwrap(),
        };
        let (my_as, cap_asn) = open_fields(&open.encode());
        assert_eq!(my_as, 65001);
        assert_eq!(cap_asn, 65001);
    }

    #[test]
    fn large_asn_falls_back_to_as_trans() {
        let open = BgpOpen {
            asn: 4_200_000_001,
            bgp_id: "10.0.0.1".parse().unwrap(),
        };
        let (my_as, cap_asn) = open_fields(&open.encode());
        assert_eq!(my_as, AS_TRANS);
        assert_eq!(cap_asn, 4_200_000_001);
    }

    #[test]
    fn open_header_and_constants() {
        let open = BgpOpen {
            asn: 65001,
            bgp_id: "1.2.3.4".parse().unwrap(),
        };
        let msg = open.encode();
        let bytes = msg.as_bytes();
        assert_eq!(&bytes[..16], &[0xff; 16]);
        assert_eq!(BigEndian::read_u16(&bytes[16..18]) as usize, bytes.len());
        assert_eq!(bytes[18], MSG_OPEN);
        assert_eq!(bytes[19], 4);
        assert_eq!(BigEndian::read_u16(&bytes[22..24]), HOLD_TIME);
        assert_eq!(&bytes[24..28], &[1, 2, 3, 4]);
    }

    #[test]
    fn update_carries_all_prefixes() {
        let update = BgpUpdate {
            as_path: vec![65001, 65002],
            next_hop: "10.0.0.1".parse().unwrap(),
            med: 10,
            local_pref: 200,
            communities: vec![0x0001_0002],
            prefixes: vec!["10.1.0.0/24".parse().unwrap(), "10.1.1.0/25".parse().unwrap()],
        };
        let msg = update.encode();
        let bytes = msg.as_bytes();
        assert_eq!(bytes[18], MSG_UPDATE);

        // skip over the attributes to reach the NLRI
        let attr_len = BigEndian::read_u16(&bytes[21..23]) as usize;
        let nlri = &bytes[23 + attr_len..];
        assert_eq!(nlri, &[24, 10, 1, 0, 25, 10, 1, 1, 0]);
    }

    #[test]
    fn update_encodes_as_sequence_segment() {
        let update = BgpUpdate {
            as_path: vec![4_200_000_000, 65002],
            next_hop: "10.0.0.1".parse().unwrap(),
            med: 0,
            local_pref: 100,
            communities: vec![],
            prefixes: vec!["10.1.0.0/24".parse().unwrap()],
        };
        let bytes = update.encode();
        let bytes = bytes.as_bytes();
        // ORIGIN is the first attribute (flags, code, len, IGP)
        assert_eq!(&bytes[23..27], &[ATTR_TRANSITIVE, ATTR_ORIGIN, 1, ORIGIN_IGP]);
        // AS_PATH follows with one AS_SEQUENCE segment of two 4-byte ASNs
        assert_eq!(&bytes[27..30], &[ATTR_TRANSITIVE, ATTR_AS_PATH, 10]);
        assert_eq!(&bytes[30..32], &[AS_SEQUENCE, 2]);
        assert_eq!(BigEndian::read_u32(&bytes[32..36]), 4_200_000_000);
        assert_eq!(BigEndian::read_u32(&bytes[36..40]), 65002);
    }
}
