use std::fmt;

use log::debug;
use serde::Serialize;

use crate::SwitchId;
use crate::algorithms::dijkstra::shortest_path;
use crate::network::{IslandCache, Topology};

/// Ordered walk of switches from source to destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    hops: Vec<SwitchId>,
    cost: u64,
}

impl Path {
    pub fn trivial(switch: SwitchId) -> Self {
        Self {
            hops: vec![switch],
            cost: 0,
        }
    }

    pub fn source(&self) -> SwitchId {
        self.hops[0]
    }

    pub fn destination(&self) -> SwitchId {
        self.hops[self.hops.len() - 1]
    }

    pub fn hops(&self) -> &[SwitchId] {
        &self.hops
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Number of links traversed.
    pub fn hop_count(&self) -> usize {
        self.hops.len() - 1
    }

    pub fn is_trivial(&self) -> bool {
        self.hops.len() == 1
    }

    /// Consecutive `(switch, next switch)` pairs in source to destination order.
    pub fn segments(&self) -> impl Iterator<Item = (SwitchId, SwitchId)> + '_ {
        self.hops.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.hops.iter().map(|id| format!("s{}", id)).collect();
        write!(f, "{} (cost {})", rendered.join(" -> "), self.cost)
    }
}

/// Picks routes over the current topology, short-circuiting pairs that sit on
/// different islands before any search runs.
#[derive(Debug, Default)]
pub struct PathPlanner {
    islands: IslandCache,
    searches: u64,
}

impl PathPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_segmented(&self, topology: &Topology) -> bool {
        self.islands.is_segmented(topology)
    }

    pub fn compute_islands(&mut self, topology: &Topology) {
        self.islands.compute_islands(topology);
    }

    /// Recomputes islands only when the topology moved since the last run.
    pub fn ensure_islands(&mut self, topology: &Topology) {
        if !self.is_segmented(topology) {
            self.compute_islands(topology);
        }
    }

    pub fn islands(&self) -> &IslandCache {
        &self.islands
    }

    /// Number of shortest-path searches run so far.
    pub fn search_count(&self) -> u64 {
        self.searches
    }

    /// Returns `None` when the destination is unreachable from `source`.
    pub fn compute_path(
        &mut self,
        topology: &Topology,
        source: SwitchId,
        destination: SwitchId,
    ) -> Option<Path> {
        if source == destination {
            return Some(Path::trivial(source));
        }

        self.ensure_islands(topology);
        if !self.islands.same_island(source, destination) {
            debug!("s{} and s{} are on different islands", source, destination);
            return None;
        }

        self.searches += 1;
        let found = shortest_path(topology, source, destination)?;
        Some(Path {
            hops: found.path,
            cost: found.cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_islands() -> Topology {
        let mut topology = Topology::new();
        for id in 1..=4 {
            topology.add_or_update_switch(id, vec![1, 2]);
        }
        topology.add_or_update_link(1, 2, 1, 1);
        topology.add_or_update_link(2, 1, 1, 1);
        topology.add_or_update_link(3, 4, 1, 1);
        topology.add_or_update_link(4, 3, 1, 1);
        topology
    }

    #[test]
    fn test_same_switch_is_trivial_path() {
        let topology = two_islands();
        let mut planner = PathPlanner::new();

        let path = planner.compute_path(&topology, 3, 3).unwrap();
        assert!(path.is_trivial());
        assert_eq!(path.hop_count(), 0);
        assert_eq!(path.source(), 3);
        assert_eq!(path.destination(), 3);

        let empty = Topology::new();
        assert!(planner.compute_path(&empty, 9, 9).unwrap().is_trivial());
        assert_eq!(planner.search_count(), 0);
    }

    #[test]
    fn test_different_islands_skip_search() {
        let topology = two_islands();
        let mut planner = PathPlanner::new();

        assert_eq!(planner.compute_path(&topology, 1, 3), None);
        assert_eq!(planner.compute_path(&topology, 4, 2), None);
        assert_eq!(planner.search_count(), 0);

        assert!(planner.compute_path(&topology, 1, 2).is_some());
        assert_eq!(planner.search_count(), 1);
    }

    #[test]
    fn test_islands_recomputed_lazily_after_mutation() {
        let mut topology = two_islands();
        let mut planner = PathPlanner::new();

        assert_eq!(planner.compute_path(&topology, 1, 4), None);
        assert!(planner.is_segmented(&topology));

        topology.add_or_update_link(2, 3, 2, 1);
        topology.add_or_update_link(3, 2, 2, 1);
        assert!(!planner.is_segmented(&topology));

        let path = planner.compute_path(&topology, 1, 4).unwrap();
        assert_eq!(path.hops(), &[1, 2, 3, 4]);
        assert_eq!(path.cost(), 3);
        assert_eq!(
            path.segments().collect::<Vec<_>>(),
            vec![(1, 2), (2, 3), (3, 4)]
        );
    }

    #[test]
    fn test_repeated_queries_return_identical_path() {
        let mut topology = Topology::new();
        for (a, b) in [(1, 2), (1, 3), (2, 4), (3, 4)] {
            topology.add_or_update_link(a, b, b as u16, 1);
            topology.add_or_update_link(b, a, a as u16, 1);
        }
        let mut planner = PathPlanner::new();

        let first = planner.compute_path(&topology, 1, 4).unwrap();
        for _ in 0..5 {
            assert_eq!(planner.compute_path(&topology, 1, 4).unwrap(), first);
        }
    }

    #[test]
    fn test_same_island_but_one_way_links_is_unreachable() {
        let mut topology = Topology::new();
        topology.add_or_update_link(1, 2, 1, 1);
        let mut planner = PathPlanner::new();

        assert_eq!(planner.compute_path(&topology, 2, 1), None);
        assert_eq!(planner.search_count(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Path::trivial(5).to_string(), "s5 (cost 0)");
    }
}
