use ipnet::Ipv4Net;
use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};

use crate::messages::PacketIn;
use crate::types::mac_serde;

/// Fields a flow rule matches on. Unset optional fields are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowMatch {
    #[serde(with = "mac_serde")]
    pub dl_src: MacAddr,
    #[serde(with = "mac_serde")]
    pub dl_dst: MacAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dl_type: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_src: Option<Ipv4Net>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_dst: Option<Ipv4Net>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_proto: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_src: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_dst: Option<u16>,
}

impl FlowMatch {
    pub fn l2(dl_src: MacAddr, dl_dst: MacAddr) -> Self {
        Self {
            dl_src,
            dl_dst,
            dl_type: None,
            nw_src: None,
            nw_dst: None,
            nw_proto: None,
            tp_src: None,
            tp_dst: None,
        }
    }

    /// Builds the match for a frame, adding its network-layer fields when
    /// `l3_matching` is set and the frame carries them.
    pub fn from_packet(packet: &PacketIn, l3_matching: bool) -> Self {
        let mut flow_match = Self::l2(packet.src, packet.dst);

        if let (true, Some(network)) = (l3_matching, packet.network.as_ref()) {
            flow_match.dl_type = Some(network.ethertype);
            flow_match.nw_src = Some(Ipv4Net::from(network.src));
            flow_match.nw_dst = Some(Ipv4Net::from(network.dst));
            flow_match.nw_proto = Some(network.protocol);
            flow_match.tp_src = network.src_port;
            flow_match.tp_dst = network.dst_port;
        }

        flow_match
    }

    pub fn is_l2_only(&self) -> bool {
        self.dl_type.is_none() && self.nw_src.is_none() && self.nw_dst.is_none()
    }
}
