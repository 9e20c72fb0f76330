use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{PortNo, SwitchId};

#[derive(Debug, Clone, Default)]
pub struct SwitchInfo {
    pub id: SwitchId,
    pub ports: Vec<PortNo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from_switch: SwitchId,
    pub to_switch: SwitchId,
    /// Egress port on `from_switch`.
    pub port: PortNo,
    pub weight: u32,
}

/// A reachable neighbor as seen from one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub switch: SwitchId,
    pub port: PortNo,
    pub weight: u32,
}

/// Known switches and the directed weighted links between them.
///
/// Adjacency is kept in ordered maps so that every walk over the graph visits
/// switches in ascending id order. `version` is bumped on every mutation and is
/// what derived caches compare against.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    switches: BTreeMap<SwitchId, SwitchInfo>,
    links: BTreeMap<SwitchId, BTreeMap<SwitchId, Link>>,
    version: u64,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn add_or_update_switch(&mut self, id: SwitchId, ports: Vec<PortNo>) {
        self.switches.insert(id, SwitchInfo { id, ports });
        self.version += 1;
    }

    /// Drops the switch along with every link that starts or ends at it.
    pub fn remove_switch(&mut self, id: SwitchId) -> Option<SwitchInfo> {
        let removed = self.switches.remove(&id);
        let outgoing = self.links.remove(&id).map_or(0, |links| links.len());

        let mut incoming = 0;
        for links in self.links.values_mut() {
            if links.remove(&id).is_some() {
                incoming += 1;
            }
        }
        self.links.retain(|_, links| !links.is_empty());

        debug!(
            "Removed s{} ({} outgoing, {} incoming links)",
            id, outgoing, incoming
        );
        self.version += 1;
        removed
    }

    /// Inserts the directed link, replacing any previous link for the same pair.
    pub fn add_or_update_link(&mut self, from: SwitchId, to: SwitchId, port: PortNo, weight: u32) {
        for id in [from, to] {
            self.switches.entry(id).or_insert_with(|| {
                debug!("Link references unknown switch s{}, registering it", id);
                SwitchInfo { id, ports: Vec::new() }
            });
        }

        let link = Link {
            from_switch: from,
            to_switch: to,
            port,
            weight,
        };
        self.links.entry(from).or_default().insert(to, link);
        self.version += 1;
    }

    pub fn remove_link(&mut self, from: SwitchId, to: SwitchId) -> Option<Link> {
        let links = self.links.get_mut(&from)?;
        let removed = links.remove(&to);
        if links.is_empty() {
            self.links.remove(&from);
        }
        if removed.is_some() {
            self.version += 1;
        }
        removed
    }

    pub fn neighbors(&self, id: SwitchId) -> Vec<Neighbor> {
        self.links
            .get(&id)
            .map(|links| {
                links
                    .values()
                    .map(|link| Neighbor {
                        switch: link.to_switch,
                        port: link.port,
                        weight: link.weight,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn link(&self, from: SwitchId, to: SwitchId) -> Option<&Link> {
        self.links.get(&from)?.get(&to)
    }

    pub fn port_toward(&self, from: SwitchId, to: SwitchId) -> Option<PortNo> {
        self.link(from, to).map(|link| link.port)
    }

    /// Whether `port` on `switch` is the egress of a discovered inter-switch link.
    pub fn is_link_port(&self, switch: SwitchId, port: PortNo) -> bool {
        self.links
            .get(&switch)
            .is_some_and(|links| links.values().any(|link| link.port == port))
    }

    pub fn link_ports(&self, switch: SwitchId) -> BTreeSet<PortNo> {
        self.links
            .get(&switch)
            .map(|links| links.values().map(|link| link.port).collect())
            .unwrap_or_default()
    }

    pub fn contains_switch(&self, id: SwitchId) -> bool {
        self.switches.contains_key(&id)
    }

    pub fn switch(&self, id: SwitchId) -> Option<&SwitchInfo> {
        self.switches.get(&id)
    }

    pub fn switches(&self) -> impl Iterator<Item = &SwitchInfo> {
        self.switches.values()
    }

    pub fn switch_ids(&self) -> impl Iterator<Item = SwitchId> + '_ {
        self.switches.keys().copied()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values().flat_map(|links| links.values())
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.values().map(|links| links.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_topology() -> Topology {
        let mut topology = Topology::new();
        topology.add_or_update_switch(1, vec![1, 2]);
        topology.add_or_update_switch(2, vec![1, 2, 3]);
        topology.add_or_update_switch(3, vec![1, 2]);
        topology.add_or_update_link(1, 2, 1, 1);
        topology.add_or_update_link(2, 1, 1, 1);
        topology.add_or_update_link(2, 3, 2, 1);
        topology.add_or_update_link(3, 2, 1, 1);
        topology
    }

    #[test]
    fn test_readd_replaces_port_and_weight() {
        let mut topology = line_topology();
        topology.add_or_update_link(1, 2, 4, 9);

        assert_eq!(topology.link_count(), 4);
        assert_eq!(
            topology.neighbors(1),
            vec![Neighbor { switch: 2, port: 4, weight: 9 }]
        );
    }

    #[test]
    fn test_remove_switch_purges_incident_links() {
        let mut topology = line_topology();
        topology.remove_switch(2);

        assert!(!topology.contains_switch(2));
        assert!(topology.neighbors(1).iter().all(|n| n.switch != 2));
        assert!(topology.neighbors(3).iter().all(|n| n.switch != 2));
        assert!(topology.neighbors(2).is_empty());
        assert_eq!(topology.link_count(), 0);
    }

    #[test]
    fn test_every_mutation_bumps_version() {
        let mut topology = Topology::new();
        let mut last = topology.version();

        topology.add_or_update_switch(1, vec![1]);
        assert!(topology.version() > last);
        last = topology.version();

        topology.add_or_update_link(1, 2, 1, 1);
        assert!(topology.version() > last);
        last = topology.version();

        topology.remove_link(1, 2);
        assert!(topology.version() > last);
        last = topology.version();

        topology.remove_switch(1);
        assert!(topology.version() > last);
    }

    #[test]
    fn test_link_ports_are_per_switch() {
        let topology = line_topology();

        assert!(topology.is_link_port(1, 1));
        assert!(!topology.is_link_port(1, 2));
        assert!(topology.is_link_port(2, 2));
        assert!(!topology.is_link_port(2, 3));
        assert_eq!(topology.port_toward(2, 3), Some(2));
        assert_eq!(topology.port_toward(1, 3), None);
    }

    #[test]
    fn test_link_registers_unknown_endpoints() {
        let mut topology = Topology::new();
        topology.add_or_update_link(7, 8, 3, 2);

        assert!(topology.contains_switch(7));
        assert!(topology.contains_switch(8));
        assert!(topology.switch(8).unwrap().ports.is_empty());
    }
}
