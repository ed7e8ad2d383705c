use std::cmp;
use std::collections::BinaryHeap;

use rand::Rng;
use serde::Serialize;

use crate::errors::Error;
use crate::graph::Graph;
use crate::paths::{Path, ShortestPaths};
use crate::problem::{Cargo, Vehicle};

/// Ordered cargo lists, one per vehicle, of the cargo each vehicle is responsible for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Assignment {
    lists: Vec<Vec<usize>>,
}

impl Assignment {
    pub fn new(vehicles: usize) -> Self {
        Self {
            lists: vec![vec![]; vehicles],
        }
    }

    #[cfg(test)]
    pub fn from_lists(lists: Vec<Vec<usize>>) -> Self {
        Self { lists }
    }

    pub fn vehicles(&self) -> usize {
        self.lists.len()
    }

    pub fn cargo(&self, vehicle: usize) -> &[usize] {
        &self.lists[vehicle]
    }

    pub fn push(&mut self, vehicle: usize, cargo: usize) {
        self.lists[vehicle].push(cargo);
    }

    pub fn remove(&mut self, vehicle: usize, index: usize) -> usize {
        self.lists[vehicle].remove(index)
    }

    pub fn swap(&mut self, vehicle: usize, i: usize, j: usize) {
        self.lists[vehicle].swap(i, j);
    }

    pub fn load(&self, vehicle: usize, cargo: &[Cargo]) -> u64 {
        self.lists[vehicle].iter().map(|&c| cargo[c].weight).sum()
    }

    /// Capacity left after every cargo assigned to `vehicle` is on board at once.
    pub fn residual(&self, vehicle: usize, vehicles: &[Vehicle], cargo: &[Cargo]) -> u64 {
        vehicles[vehicle].capacity.saturating_sub(self.load(vehicle, cargo))
    }
}

/// Random weight-sorted greedy assignment used to seed the local search.
///
/// Heaviest cargo first, each one goes to a vehicle drawn uniformly among those that
/// can still hold it and whose start lies in the component of the cargo's origin
/// (`components` as returned by [`Graph::components`]). Drawing only among feasible
/// vehicles keeps the distribution of rejection sampling without its unbounded loop.
pub fn random_assignment<R>(
    components: &[usize],
    vehicles: &[Vehicle],
    cargo: &[Cargo],
    rng: &mut R,
) -> Result<Assignment, Error>
where
    R: Rng + ?Sized,
{
    let mut assignment = Assignment::new(vehicles.len());
    let mut residual = vehicles.iter().map(|v| v.capacity).collect::<Vec<_>>();

    let mut order = (0..cargo.len()).collect::<Vec<_>>();
    order.sort_by_key(|&c| cmp::Reverse(cargo[c].weight));

    for c in order {
        let weight = cargo[c].weight;
        let component = components[cargo[c].origin];
        let feasible = (0..vehicles.len())
            .filter(|&v| residual[v] >= weight && components[vehicles[v].start] == component)
            .collect::<Vec<_>>();
        if feasible.is_empty() {
            return Err(Error::Unassignable {
                cargo: cargo[c].name.clone(),
                weight,
            });
        }

        let v = feasible[rng.random_range(0..feasible.len())];
        assignment.push(v, c);
        residual[v] -= weight;
    }

    Ok(assignment)
}

/// Where a vehicle should go next and what it does on arrival.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Errand {
    pub cargo: usize,
    pub target: usize,
    pub path: Path,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Pickup(Errand),
    Deliver(Errand),
}

impl Action {
    pub fn errand(&self) -> &Errand {
        match self {
            Self::Pickup(errand) | Self::Deliver(errand) => errand,
        }
    }

    pub fn distance(&self) -> u64 {
        self.errand().path.distance
    }
}

#[derive(Clone, Debug)]
pub struct Candidate {
    pub vehicle: usize,
    pub priority: f64,
    pub action: Action,
}

impl Candidate {
    pub fn cargo(&self) -> usize {
        self.action.errand().cargo
    }
}

// Max-heap on priority, lower (vehicle, cargo) ids first on ties
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.vehicle.cmp(&self.vehicle))
            .then_with(|| other.cargo().cmp(&self.cargo()))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == cmp::Ordering::Equal
    }
}

impl Eq for Candidate {}

/// One round of priority-ratio greedy pickup assignment.
///
/// Every (vehicle, unpicked cargo) pair the vehicle has room for is scored, then pairs
/// are committed best-first as long as neither side was committed yet. This is a greedy
/// heuristic: the result is not a maximum-weight matching. At most one candidate per
/// vehicle is returned, ordered by vehicle.
pub fn greedy_round(graph: &Graph, vehicles: &[Vehicle], cargo: &[Cargo]) -> Vec<Candidate> {
    let single = vehicles.len() == 1;
    let mut queue = BinaryHeap::new();

    for (v, vehicle) in vehicles.iter().enumerate() {
        let table = ShortestPaths::from(graph, vehicle.location);
        for (c, item) in cargo.iter().enumerate() {
            if item.picked || !vehicle.fits(item.weight) {
                continue;
            }

            // Unreachable cargo is simply not a candidate for this vehicle
            let Some(path) = table.path_to(item.origin) else {
                continue;
            };

            let denominator = 1.0 + path.distance as f64;
            let priority = if single {
                1.0 / denominator
            } else {
                // Heavier and farther first, so bulky cargo is not starved by vehicles
                // that fill up on nearby light items.
                item.weight as f64 / denominator
            };

            queue.push(Candidate {
                vehicle: v,
                priority,
                action: Action::Pickup(Errand {
                    cargo: c,
                    target: item.origin,
                    path,
                }),
            });
        }
    }

    let mut vehicle_committed = vec![false; vehicles.len()];
    let mut cargo_committed = vec![false; cargo.len()];
    let mut committed = vec![];
    while let Some(candidate) = queue.pop() {
        let (v, c) = (candidate.vehicle, candidate.cargo());
        if !vehicle_committed[v] && !cargo_committed[c] {
            vehicle_committed[v] = true;
            cargo_committed[c] = true;
            committed.push(candidate);
        }
    }

    committed.sort_by_key(|candidate| candidate.vehicle);
    committed
}
