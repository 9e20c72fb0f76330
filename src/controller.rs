use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::device::{DeviceSession, Payload};
use crate::flow::{FlowInstaller, FlowMatch};
use crate::host_table::HostTable;
use crate::messages::{Event, NewFlow, Notification, PacketIn};
use crate::network::{Topology, WeightTable};
use crate::routing::{Path, PathPlanner};
use crate::types::{FrameClass, SwitchPort, is_group_address};
use crate::{PortNo, SwitchId};

/// What happened to a frame punted to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Dropped,
    /// Replicated out of host ports on this many switches.
    Flooded(usize),
    /// Address resolution frame handed straight to the destination port.
    Relayed(SwitchPort),
    Routed(Path),
}

/// Owns the topology, host table and island cache, and turns each event into
/// device commands.
pub struct Controller<D: DeviceSession> {
    topology: Topology,
    weights: WeightTable,
    planner: PathPlanner,
    hosts: HostTable,
    installer: FlowInstaller,
    l3_matching: bool,
    device: D,
    notifications: broadcast::Sender<Notification>,
}

impl<D: DeviceSession> Controller<D> {
    pub fn new(config: &ControllerConfig, weights: WeightTable, device: D) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));

        Self {
            topology: Topology::new(),
            weights,
            planner: PathPlanner::new(),
            hosts: HostTable::new(),
            installer: FlowInstaller::new(config.idle_timeout_secs),
            l3_matching: config.l3_matching,
            device,
            notifications,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn hosts(&self) -> &HostTable {
        &self.hosts
    }

    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::LinkAdded {
                src,
                dst,
                port,
                weight,
            } => self.link_added(src, dst, port, weight),
            Event::LinkRemoved { src, dst, port } => self.link_removed(src, dst, port),
            Event::SwitchConnected { switch, ports } => self.switch_connected(switch, ports),
            Event::SwitchDisconnected { switch } => self.switch_disconnected(switch),
            Event::PacketIn(packet) => {
                self.packet_in(packet);
            }
            Event::FlowRemoved { switch, flow_match } => self.flow_removed(switch, flow_match),
        }
    }

    fn link_added(&mut self, src: SwitchId, dst: SwitchId, port: PortNo, weight: Option<u32>) {
        let weight = weight.unwrap_or_else(|| self.weights.weight(src, dst));
        debug!(
            "Link added from s{} to s{} over port {} (weight {})",
            src, dst, port, weight
        );
        self.topology.add_or_update_link(src, dst, port, weight);
    }

    fn link_removed(&mut self, src: SwitchId, dst: SwitchId, port: PortNo) {
        match self.topology.port_toward(src, dst) {
            Some(current) if current == port => {
                debug!("Link removed from s{} to s{} over port {}", src, dst, port);
                self.topology.remove_link(src, dst);
            }
            Some(current) => debug!(
                "Ignoring removal of s{} -> s{} port {}, link now uses port {}",
                src, dst, port, current
            ),
            None => debug!("Removal of unknown link s{} -> s{}", src, dst),
        }
    }

    fn switch_connected(&mut self, switch: SwitchId, ports: Vec<PortNo>) {
        info!("New switch connection: s{} ({} ports)", switch, ports.len());
        self.topology.add_or_update_switch(switch, ports.clone());

        for &port in &ports {
            if let Err(e) = self.device.set_port_flooding(switch, port, true) {
                warn!("Failed to enable flooding on s{} port {}: {}", switch, port, e);
            }
        }

        let _ = self.notifications.send(Notification::NewSwitch { switch, ports });
    }

    fn switch_disconnected(&mut self, switch: SwitchId) {
        info!("Switch s{} going down", switch);
        self.topology.remove_switch(switch);
    }

    fn flow_removed(&mut self, switch: SwitchId, flow_match: FlowMatch) {
        debug!(
            "Flow {} -> {} expired on s{}",
            flow_match.dl_src, flow_match.dl_dst, switch
        );
        let _ = self
            .notifications
            .send(Notification::FlowExpired { switch, flow_match });
    }

    pub fn packet_in(&mut self, packet: PacketIn) -> Disposition {
        if !self.topology.is_link_port(packet.switch, packet.in_port) {
            self.hosts.learn(packet.src, packet.switch, packet.in_port);
        }

        if packet.frame_class == FrameClass::Discovery {
            self.drop_frame(&packet);
            return Disposition::Dropped;
        }

        if is_group_address(&packet.dst) {
            return self.flood(&packet);
        }

        let Some(destination) = self.hosts.lookup(&packet.dst) else {
            debug!("Destination {} unknown, flooding", packet.dst);
            return self.flood(&packet);
        };

        if packet.frame_class == FrameClass::AddressResolution {
            if !self.topology.contains_switch(destination.switch) {
                debug!(
                    "s{} holding {} is gone, flooding",
                    destination.switch, packet.dst
                );
                return self.flood(&packet);
            }
            self.drop_frame(&packet);
            self.deliver(&packet, destination);
            return Disposition::Relayed(destination);
        }

        self.planner.ensure_islands(&self.topology);
        let Some(path) = self
            .planner
            .compute_path(&self.topology, packet.switch, destination.switch)
        else {
            debug!(
                "s{} unreachable from s{}, flooding",
                destination.switch, packet.switch
            );
            return self.flood(&packet);
        };

        debug!("Path from {} to {} over path {}", packet.src, packet.dst, path);
        let flow_match = FlowMatch::from_packet(&packet, self.l3_matching);
        let placed = self.installer.install(
            &self.topology,
            &path,
            &flow_match,
            destination.port,
            &mut self.device,
        );
        if placed.len() < path.hops().len() {
            warn!(
                "Placed {} of {} rules for {}",
                placed.len(),
                path.hops().len(),
                path
            );
        } else {
            debug!("Placed {} rules for {}", placed.len(), path);
        }
        self.drop_frame(&packet);
        self.deliver(&packet, destination);

        let _ = self.notifications.send(Notification::NewFlow(NewFlow {
            id: Uuid::new_v4(),
            path: path.clone(),
            flow_match,
            links: self.topology.links().copied().collect(),
            installed_at: Utc::now(),
        }));

        Disposition::Routed(path)
    }

    /// Sends the frame out of every host-facing port in the network. Only the
    /// ingress switch may reuse its buffered copy.
    fn flood(&mut self, packet: &PacketIn) -> Disposition {
        let mut flooded = 0;

        for switch in self.topology.switches() {
            let ingress = switch.id == packet.switch;
            let mut excluded = self.topology.link_ports(switch.id);
            if ingress {
                excluded.insert(packet.in_port);
            }

            if switch.ports.iter().all(|port| excluded.contains(port)) {
                continue;
            }

            let (payload, in_port) = match (ingress, packet.buffer_id) {
                (true, Some(buffer_id)) => (Payload::Buffered { buffer_id }, Some(packet.in_port)),
                (true, None) => (raw(packet), Some(packet.in_port)),
                (false, _) => (raw(packet), None),
            };

            match self
                .device
                .send_flood(switch.id, payload, in_port, excluded.into_iter().collect())
            {
                Ok(()) => flooded += 1,
                Err(e) => warn!("Failed to flood on s{}: {}", switch.id, e),
            }
        }

        Disposition::Flooded(flooded)
    }

    /// Releases the switch buffer holding the frame; unbuffered frames need nothing.
    fn drop_frame(&mut self, packet: &PacketIn) {
        let Some(buffer_id) = packet.buffer_id else {
            return;
        };
        if let Err(e) = self.device.send_drop(packet.switch, buffer_id, packet.in_port) {
            warn!("Failed to drop buffer {} on s{}: {}", buffer_id, packet.switch, e);
        }
    }

    fn deliver(&mut self, packet: &PacketIn, destination: SwitchPort) {
        if let Err(e) = self
            .device
            .send_unicast(destination.switch, raw(packet), destination.port)
        {
            warn!(
                "Failed to forward frame to s{} port {}: {}",
                destination.switch, destination.port, e
            );
        }
    }
}

fn raw(packet: &PacketIn) -> Payload {
    Payload::Raw {
        data: packet.data.clone(),
    }
}
