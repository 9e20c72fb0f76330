use log::{debug, warn};

use super::FlowMatch;
use crate::device::{DeviceSession, FlowRule};
use crate::network::Topology;
use crate::routing::Path;
use crate::{PortNo, SwitchId};

pub const DEFAULT_IDLE_TIMEOUT: u16 = 10;

/// A rule handed to a switch's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub switch: SwitchId,
    pub out_port: PortNo,
}

/// Turns a path into one flow rule per switch on it.
#[derive(Debug, Clone)]
pub struct FlowInstaller {
    idle_timeout: u16,
}

impl FlowInstaller {
    pub fn new(idle_timeout: u16) -> Self {
        Self { idle_timeout }
    }

    pub fn idle_timeout(&self) -> u16 {
        self.idle_timeout
    }

    /// Destination switch first (straight out to the host), then every other
    /// switch from source towards destination, each pointing at the next hop.
    ///
    /// Nothing is acknowledged or rolled back. A hop whose link disappeared, or
    /// whose send fails, is skipped and the walk carries on.
    pub fn install<D: DeviceSession>(
        &self,
        topology: &Topology,
        path: &Path,
        flow_match: &FlowMatch,
        host_port: PortNo,
        device: &mut D,
    ) -> Vec<Placement> {
        let mut placed = Vec::with_capacity(path.hops().len());

        debug!(
            "Installing forward from s{} to host port {}",
            path.destination(),
            host_port
        );
        self.place(path.destination(), host_port, flow_match, device, &mut placed);

        for (current, next) in path.segments() {
            let Some(port) = topology.port_toward(current, next) else {
                warn!("No link s{} -> s{} anymore, skipping hop", current, next);
                continue;
            };
            debug!(
                "Installing forward from s{} to s{} output port {}",
                current, next, port
            );
            self.place(current, port, flow_match, device, &mut placed);
        }

        placed
    }

    fn place<D: DeviceSession>(
        &self,
        switch: SwitchId,
        out_port: PortNo,
        flow_match: &FlowMatch,
        device: &mut D,
        placed: &mut Vec<Placement>,
    ) {
        let rule = FlowRule {
            flow_match: flow_match.clone(),
            out_port,
            idle_timeout: self.idle_timeout,
            notify_on_removal: true,
        };

        match device.install_rule(switch, rule) {
            Ok(()) => placed.push(Placement { switch, out_port }),
            Err(e) => warn!("Failed to install rule on s{}: {}", switch, e),
        }
    }
}

impl Default for FlowInstaller {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use pnet::util::MacAddr;

    use super::*;
    use crate::device::{ChannelDevice, DeviceCommand};
    use crate::routing::PathPlanner;

    fn chain() -> Topology {
        let mut topology = Topology::new();
        topology.add_or_update_link(1, 2, 10, 1);
        topology.add_or_update_link(2, 1, 11, 1);
        topology.add_or_update_link(2, 3, 12, 1);
        topology.add_or_update_link(3, 2, 13, 1);
        topology
    }

    fn flow() -> FlowMatch {
        FlowMatch::l2(MacAddr::new(0, 0, 0, 0, 0, 1), MacAddr::new(0, 0, 0, 0, 0, 2))
    }

    #[test]
    fn test_destination_rule_first_then_source_order() {
        let topology = chain();
        let path = PathPlanner::new().compute_path(&topology, 1, 3).unwrap();
        let (mut device, mut rx) = ChannelDevice::new();

        let placed = FlowInstaller::new(10).install(&topology, &path, &flow(), 2, &mut device);

        assert_eq!(
            placed,
            vec![
                Placement { switch: 3, out_port: 2 },
                Placement { switch: 1, out_port: 10 },
                Placement { switch: 2, out_port: 12 },
            ]
        );

        let mut switches = Vec::new();
        while let Ok(DeviceCommand::InstallRule { switch, rule }) = rx.try_recv() {
            assert_eq!(rule.flow_match, flow());
            assert_eq!(rule.idle_timeout, 10);
            assert!(rule.notify_on_removal);
            switches.push(switch);
        }
        assert_eq!(switches, vec![3, 1, 2]);
    }

    #[test]
    fn test_trivial_path_installs_single_rule() {
        let topology = chain();
        let (mut device, _rx) = ChannelDevice::new();

        let placed = FlowInstaller::default().install(&topology, &Path::trivial(2), &flow(), 5, &mut device);

        assert_eq!(placed, vec![Placement { switch: 2, out_port: 5 }]);
    }

    #[test]
    fn test_vanished_link_is_skipped_without_rollback() {
        let mut topology = chain();
        let path = PathPlanner::new().compute_path(&topology, 1, 3).unwrap();
        topology.remove_link(2, 3);
        let (mut device, _rx) = ChannelDevice::new();

        let placed = FlowInstaller::default().install(&topology, &path, &flow(), 2, &mut device);

        assert_eq!(
            placed,
            vec![
                Placement { switch: 3, out_port: 2 },
                Placement { switch: 1, out_port: 10 },
            ]
        );
    }

    #[test]
    fn test_closed_session_keeps_walking() {
        let topology = chain();
        let path = PathPlanner::new().compute_path(&topology, 1, 3).unwrap();
        let (mut device, rx) = ChannelDevice::new();
        drop(rx);

        let placed = FlowInstaller::default().install(&topology, &path, &flow(), 2, &mut device);
        assert!(placed.is_empty());
    }
}
