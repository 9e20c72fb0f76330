use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow::FlowMatch;
use crate::network::Link;
use crate::routing::Path;
use crate::types::{FrameClass, mac_serde};
use crate::{PortNo, SwitchId};

/// Everything the controller reacts to, delivered one at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    LinkAdded {
        src: SwitchId,
        dst: SwitchId,
        port: PortNo,
        /// Falls back to the weight table when absent.
        #[serde(default)]
        weight: Option<u32>,
    },
    LinkRemoved {
        src: SwitchId,
        dst: SwitchId,
        port: PortNo,
    },
    SwitchConnected {
        switch: SwitchId,
        ports: Vec<PortNo>,
    },
    SwitchDisconnected {
        switch: SwitchId,
    },
    PacketIn(PacketIn),
    FlowRemoved {
        switch: SwitchId,
        flow_match: FlowMatch,
    },
}

/// A frame punted to the controller, already parsed by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketIn {
    pub switch: SwitchId,
    pub in_port: PortNo,
    pub frame_class: FrameClass,
    #[serde(with = "mac_serde")]
    pub src: MacAddr,
    #[serde(with = "mac_serde")]
    pub dst: MacAddr,
    #[serde(default)]
    pub network: Option<NetworkFields>,
    /// Set when the switch kept the frame in its own buffer.
    #[serde(default)]
    pub buffer_id: Option<u32>,
    #[serde(default)]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFields {
    pub ethertype: u16,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub protocol: u8,
    #[serde(default)]
    pub src_port: Option<u16>,
    #[serde(default)]
    pub dst_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "notification", rename_all = "snake_case")]
pub enum Notification {
    NewSwitch {
        switch: SwitchId,
        ports: Vec<PortNo>,
    },
    NewFlow(NewFlow),
    FlowExpired {
        switch: SwitchId,
        flow_match: FlowMatch,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFlow {
    pub id: Uuid,
    pub path: Path,
    pub flow_match: FlowMatch,
    /// Link-to-port mapping at install time.
    pub links: Vec<Link>,
    pub installed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_packet_in_event() {
        let raw = r#"{"event":"packet_in","switch":1,"in_port":3,"frame_class":"data",
            "src":"00:00:00:00:00:01","dst":"00:00:00:00:00:02","data":[1,2,3]}"#;

        match serde_json::from_str::<Event>(raw).unwrap() {
            Event::PacketIn(packet) => {
                assert_eq!(packet.switch, 1);
                assert_eq!(packet.in_port, 3);
                assert_eq!(packet.dst, MacAddr::new(0, 0, 0, 0, 0, 2));
                assert_eq!(packet.buffer_id, None);
                assert_eq!(packet.data, vec![1, 2, 3]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_link_added_weight_is_optional() {
        let raw = r#"{"event":"link_added","src":1,"dst":2,"port":4}"#;

        match serde_json::from_str::<Event>(raw).unwrap() {
            Event::LinkAdded { weight, port, .. } => {
                assert_eq!(weight, None);
                assert_eq!(port, 4);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
