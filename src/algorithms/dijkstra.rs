use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::SwitchId;
use crate::network::Topology;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    pub cost: u64,
    pub path: Vec<SwitchId>,
}

/// Single-source shortest path from `source` to `destination`.
///
/// The heap is keyed by `(cost, switch)` and a neighbor's predecessor only
/// changes on a strictly lower cost, so ties always resolve the same way for
/// the same graph.
pub fn shortest_path(
    topology: &Topology,
    source: SwitchId,
    destination: SwitchId,
) -> Option<ShortestPath> {
    let mut distances: HashMap<SwitchId, u64> = HashMap::new();
    let mut previous: HashMap<SwitchId, SwitchId> = HashMap::new();
    let mut heap = BinaryHeap::new();

    distances.insert(source, 0);
    heap.push(Reverse((0u64, source)));

    while let Some(Reverse((cost, switch))) = heap.pop() {
        if switch == destination {
            break;
        }

        // Skip if we've already found a better path
        if cost > *distances.get(&switch).unwrap_or(&u64::MAX) {
            continue;
        }

        for neighbor in topology.neighbors(switch) {
            let new_cost = cost.saturating_add(u64::from(neighbor.weight));

            if new_cost < *distances.get(&neighbor.switch).unwrap_or(&u64::MAX) {
                distances.insert(neighbor.switch, new_cost);
                previous.insert(neighbor.switch, switch);
                heap.push(Reverse((new_cost, neighbor.switch)));
            }
        }
    }

    let cost = *distances.get(&destination)?;
    Some(ShortestPath {
        cost,
        path: reconstruct_path(&previous, source, destination),
    })
}

fn reconstruct_path(
    previous: &HashMap<SwitchId, SwitchId>,
    source: SwitchId,
    destination: SwitchId,
) -> Vec<SwitchId> {
    let mut path = vec![destination];
    let mut current = destination;

    while current != source {
        match previous.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }

    path.reverse();
    path
}
