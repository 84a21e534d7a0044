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
//! Module building the three BMP message kinds sent to the collector.

use std::net::IpAddr;

use bytes::{BufMut, BytesMut};

use super::WireMessage;
use crate::link::bmp_peer_addr;

const BMP_VERSION: u8 = 3;
const COMMON_HEADER_LEN: usize = 6;

const TYPE_ROUTE_MONITORING: u8 = 0;
const TYPE_PEER_UP: u8 = 3;
const TYPE_INITIATION: u8 = 4;

const INFO_SYS_DESCR: u16 = 1;
const INFO_SYS_NAME: u16 = 2;

/// TLV type of a standard path-status annotation.
pub const TLV_PATH_STATUS: u16 = 0;
/// TLV type of the enterprise-specific path-status annotation (E-bit set).
pub const TLV_PATH_STATUS_ENTERPRISE: u16 = 0x8000;
/// Enterprise number carried by the enterprise-specific TLV.
const ENTERPRISE_NUMBER: u32 = 43874;

/// Timestamp pinned into every per-peer header. Compiled message sets must be reproducible,
/// so the session-established time is a constant rather than the current time.
pub const TIMESTAMP_SECS: u32 = 1_594_819_095;
pub const TIMESTAMP_MICROS: u32 = 956_000;

/// Fixed TCP ports reported in the peer-up notification.
pub const LOCAL_PORT: u16 = 179;
pub const REMOTE_PORT: u16 = 4900;

/// The per-peer header shared by peer-up and route-monitoring messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerPeerHeader {
    pub peer_addr: IpAddr,
    pub peer_asn: u32,
    /// peer router-id, carried as a 32-bit integer
    pub peer_bgp_id: u32,
}

impl PerPeerHeader {
    fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u8(0); // peer type: global instance
        buf.put_u8(0); // peer flags
        buf.put_u64(0); // peer distinguisher
        buf.put_slice(&bmp_peer_addr(self.peer_addr));
        buf.put_u32(self.peer_asn);
        buf.put_u32(self.peer_bgp_id);
        buf.put_u32(TIMESTAMP_SECS);
        buf.put_u32(TIMESTAMP_MICROS);
    }
}

/// The initiation message, carrying the local system description and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initiation {
    pub sys_descr: String,
    pub sys_name: String,
}

impl Initiation {
    pub fn encode(&self) -> WireMessage {
        let mut body = BytesMut::new();
        put_info_tlv(&mut body, INFO_SYS_DESCR, &self.sys_descr);
        put_info_tlv(&mut body, INFO_SYS_NAME, &self.sys_name);
        frame(TYPE_INITIATION, &body)
    }
}

fn put_info_tlv(buf: &mut BytesMut, tlv_type: u16, value: &str) {
    buf.put_u16(tlv_type);
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

/// The peer-up notification: per-peer header, local side of the TCP session, and the two
/// OPEN messages exchanged on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerUp {
    pub peer: PerPeerHeader,
    pub local_addr: IpAddr,
    pub sent_open: WireMessage,
    pub received_open: WireMessage,
}

impl PeerUp {
    pub fn encode(&self) -> WireMessage {
        let mut body = BytesMut::new();
        self.peer.encode_into(&mut body);
        body.put_slice(&bmp_peer_addr(self.local_addr));
        body.put_u16(LOCAL_PORT);
        body.put_u16(REMOTE_PORT);
        body.put_slice(self.sent_open.as_bytes());
        body.put_slice(self.received_open.as_bytes());
        frame(TYPE_PEER_UP, &body)
    }
}

/// One path-status annotation: the index of the prefix in the announced list, the status
/// tags, and an optional free-text reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStatusTlv {
    pub index: u16,
    pub status: Vec<String>,
    pub reason: Option<String>,
}

impl PathStatusTlv {
    /// Encode as a TLV. With `enterprise` the alternate type code is used and the value is
    /// prefixed by the enterprise number; the payload layout is identical otherwise.
    pub(crate) fn encode_into(&self, buf: &mut BytesMut, enterprise: bool) {
        let mut value = BytesMut::new();
        if enterprise {
            value.put_u32(ENTERPRISE_NUMBER);
        }
        value.put_u16(self.index);
        value.put_u8(self.status.len() as u8);
        for status in &self.status {
            value.put_u8(status.len() as u8);
            value.put_slice(status.as_bytes());
        }
        match &self.reason {
            Some(reason) => {
                value.put_u16(reason.len() as u16);
                value.put_slice(reason.as_bytes());
            }
            None => value.put_u16(0),
        }

        buf.put_u16(if enterprise {
            TLV_PATH_STATUS_ENTERPRISE
        } else {
            TLV_PATH_STATUS
        });
        buf.put_u16(value.len() as u16);
        buf.put_slice(&value);
    }
}

/// The route-monitoring message: per-peer header, one BGP UPDATE covering all announced
/// prefixes, and the peer's path-status annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMonitoring {
    pub peer: PerPeerHeader,
    pub update: WireMessage,
    pub status: Vec<PathStatusTlv>,
    pub enterprise: bool,
}

impl RouteMonitoring {
    pub fn encode(&self) -> WireMessage {
        let mut body = BytesMut::new();
        self.peer.encode_into(&mut body);
        body.put_slice(self.update.as_bytes());
        for tlv in &self.status {
            tlv.encode_into(&mut body, self.enterprise);
        }
        frame(TYPE_ROUTE_MONITORING, &body)
    }
}

/// Prepend the BMP common header (version, length, type) to a message body.
fn frame(msg_type: u8, body: &[u8]) -> WireMessage {
    let mut msg = BytesMut::with_capacity(COMMON_HEADER_LEN + body.len());
    msg.put_u8(BMP_VERSION);
    msg.put_u32((COMMON_HEADER_LEN + body.len()) as u32);
    msg.put_u8(msg_type);
    msg.put_slice(body);
    WireMessage::new(msg.freeze())
}
