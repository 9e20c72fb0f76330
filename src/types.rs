use pnet::packet::ethernet::{EtherType, EtherTypes};
use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};

use crate::{PortNo, SwitchId};

/// Attachment point of a host: the switch it hangs off and the port it was seen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchPort {
    pub switch: SwitchId,
    pub port: PortNo,
}

impl SwitchPort {
    pub fn new(switch: SwitchId, port: PortNo) -> Self {
        Self { switch, port }
    }
}

/// Classification of a frame handed up by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameClass {
    /// Topology discovery probe (LLDP).
    Discovery,
    /// Address resolution (ARP).
    AddressResolution,
    Data,
}

impl FrameClass {
    pub fn from_ethertype(ethertype: EtherType) -> Self {
        if ethertype == EtherTypes::Lldp {
            FrameClass::Discovery
        } else if ethertype == EtherTypes::Arp {
            FrameClass::AddressResolution
        } else {
            FrameClass::Data
        }
    }
}

/// Group bit set: broadcast or multicast destination.
pub fn is_group_address(addr: &MacAddr) -> bool {
    addr.0 & 0x01 == 0x01
}

/// Serde glue for `MacAddr` using its textual `aa:bb:cc:dd:ee:ff` form.
pub mod mac_serde {
    use pnet::util::MacAddr;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(addr: &MacAddr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(addr)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MacAddr, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<MacAddr>()
            .map_err(|e| D::Error::custom(format!("invalid mac address {}: {:?}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_address_detection() {
        assert!(is_group_address(&MacAddr::broadcast()));
        assert!(is_group_address(&MacAddr::new(0x01, 0x00, 0x5e, 0x00, 0x00, 0x01)));
        assert!(!is_group_address(&MacAddr::new(0x00, 0x00, 0x00, 0x00, 0x00, 0x01)));
    }

    #[test]
    fn test_frame_class_from_ethertype() {
        assert_eq!(FrameClass::from_ethertype(EtherTypes::Lldp), FrameClass::Discovery);
        assert_eq!(FrameClass::from_ethertype(EtherTypes::Arp), FrameClass::AddressResolution);
        assert_eq!(FrameClass::from_ethertype(EtherTypes::Ipv4), FrameClass::Data);
    }
}
