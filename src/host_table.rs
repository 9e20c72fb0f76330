use std::collections::HashMap;

use log::debug;
use pnet::util::MacAddr;

use crate::types::SwitchPort;
use crate::{PortNo, SwitchId};

/// Where each host was last seen. Entries are overwritten, never aged out.
#[derive(Debug, Clone, Default)]
pub struct HostTable {
    locations: HashMap<MacAddr, SwitchPort>,
}

impl HostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learn(&mut self, addr: MacAddr, switch: SwitchId, port: PortNo) {
        let location = SwitchPort::new(switch, port);
        match self.locations.insert(addr, location) {
            Some(previous) if previous != location => {
                debug!(
                    "Host {} moved from s{}:{} to s{}:{}",
                    addr, previous.switch, previous.port, switch, port
                );
            }
            None => debug!("Learned host {} at s{}:{}", addr, switch, port),
            _ => {}
        }
    }

    pub fn lookup(&self, addr: &MacAddr) -> Option<SwitchPort> {
        self.locations.get(addr).copied()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
