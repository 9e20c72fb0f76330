use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use log::debug;

use super::Topology;
use crate::SwitchId;

pub type IslandId = usize;

#[derive(Debug, Clone)]
struct Partition {
    topology_version: u64,
    island_of: HashMap<SwitchId, IslandId>,
    island_count: usize,
}

/// Connected components of the topology, ignoring link direction and weight.
///
/// The partition is only ever rebuilt by an explicit `compute_islands` call and
/// is considered stale as soon as the topology version moves past the one it
/// was built from.
#[derive(Debug, Clone, Default)]
pub struct IslandCache {
    partition: Option<Partition>,
}

impl IslandCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_segmented(&self, topology: &Topology) -> bool {
        self.partition
            .as_ref()
            .is_some_and(|p| p.topology_version == topology.version())
    }

    pub fn compute_islands(&mut self, topology: &Topology) {
        let mut undirected: BTreeMap<SwitchId, BTreeSet<SwitchId>> = BTreeMap::new();
        for link in topology.links() {
            undirected.entry(link.from_switch).or_default().insert(link.to_switch);
            undirected.entry(link.to_switch).or_default().insert(link.from_switch);
        }

        let mut island_of = HashMap::new();
        let mut island_count = 0;

        for start in topology.switch_ids() {
            if island_of.contains_key(&start) {
                continue;
            }

            let island = island_count;
            island_count += 1;
            island_of.insert(start, island);

            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for &next in undirected.get(&current).into_iter().flatten() {
                    if !island_of.contains_key(&next) {
                        island_of.insert(next, island);
                        queue.push_back(next);
                    }
                }
            }
        }

        debug!(
            "Computed {} islands over {} switches (topology v{})",
            island_count,
            island_of.len(),
            topology.version()
        );

        self.partition = Some(Partition {
            topology_version: topology.version(),
            island_of,
            island_count,
        });
    }

    pub fn island_of(&self, switch: SwitchId) -> Option<IslandId> {
        self.partition.as_ref()?.island_of.get(&switch).copied()
    }

    pub fn same_island(&self, a: SwitchId, b: SwitchId) -> bool {
        match (self.island_of(a), self.island_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn island_count(&self) -> usize {
        self.partition.as_ref().map_or(0, |p| p.island_count)
    }
}
