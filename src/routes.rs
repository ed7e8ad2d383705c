use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use crate::assignment::Assignment;
use crate::cli::Traversal;
use crate::errors::Error;
use crate::graph::Graph;
use crate::paths::{self, Path};
use crate::problem::{Cargo, Vehicle};

/// One traversed edge.
///
/// A delivery at the node a vehicle already stands on is logged as a stationary move
/// (`from == to`) that takes no time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Move {
    /// Departure time on the global clock.
    pub time: u64,
    pub vehicle: usize,
    pub from: usize,
    pub to: usize,

    /// Cargo on board while traversing the edge.
    pub carried: Vec<usize>,

    /// Cargo delivered on arrival at `to`.
    pub dropped: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    /// Visited nodes per vehicle, starting at its start node.
    pub routes: Vec<Vec<usize>>,
    pub moves: Vec<Move>,
    pub elapsed: u64,
}

impl Plan {
    pub fn empty(vehicles: &[Vehicle]) -> Self {
        Self {
            routes: vehicles.iter().map(|v| vec![v.location]).collect(),
            moves: vec![],
            elapsed: 0,
        }
    }

    /// Sum of edge weights along every route.
    pub fn energy(&self, graph: &Graph) -> Option<u64> {
        self.routes.iter().try_fold(0, |total, route| Some(total + graph.length(route)?))
    }
}

struct _Simulation<'a, R: ?Sized> {
    graph: &'a Graph,
    vehicles: &'a mut [Vehicle],
    cargo: &'a mut [Cargo],
    traversal: Traversal,
    rng: &'a mut R,
    clock: u64,
    moves: Vec<Move>,
}

impl<R> _Simulation<'_, R>
where
    R: Rng + ?Sized,
{
    fn no_route(&self, from: usize, to: usize) -> Error {
        Error::NoRoute {
            from: self.graph.name(from).to_string(),
            to: self.graph.name(to).to_string(),
        }
    }

    fn path(&mut self, from: usize, to: usize) -> Result<Path, Error> {
        let path = match self.traversal {
            Traversal::Shortest => paths::shortest(self.graph, from, to),
            Traversal::Random => paths::random_walk(self.graph, from, to, &mut *self.rng),
        };

        path.ok_or_else(|| self.no_route(from, to))
    }

    /// Load `cargo` onto `vehicle` unless it was already collected or does not fit.
    fn pick(&mut self, vehicle: usize, cargo: usize) -> bool {
        let item = &mut self.cargo[cargo];
        if item.picked || !self.vehicles[vehicle].load(cargo, item.weight) {
            return false;
        }

        item.picked = true;
        true
    }

    /// Unload everything on board that is destined for `node`.
    fn drop_at(&mut self, vehicle: usize, node: usize) -> Vec<usize> {
        let arrived = self.vehicles[vehicle]
            .carried
            .iter()
            .copied()
            .filter(|&c| self.cargo[c].destination == node)
            .collect::<Vec<_>>();

        for &c in &arrived {
            self.vehicles[vehicle].unload(c, self.cargo[c].weight);
        }

        arrived
    }

    fn travel(
        &mut self,
        vehicle: usize,
        path: &Path,
        pending: &BTreeMap<usize, Vec<usize>>,
        deliver: bool,
        route: &mut Vec<usize>,
    ) -> Result<(), Error> {
        for leg in path.nodes.windows(2) {
            let (from, to) = (leg[0], leg[1]);
            let weight = self.graph.weight(from, to).ok_or_else(|| self.no_route(from, to))?;

            let carried = self.vehicles[vehicle].carried.clone();
            let time = self.clock;
            self.clock = self.clock.checked_add(weight).ok_or(Error::Overflow)?;
            self.vehicles[vehicle].location = to;
            route.push(to);

            if let Some(waiting) = pending.get(&to) {
                for &c in waiting {
                    self.pick(vehicle, c);
                }
            }

            let dropped = if deliver { self.drop_at(vehicle, to) } else { vec![] };
            self.moves.push(Move {
                time,
                vehicle,
                from,
                to,
                carried,
                dropped,
            });
        }

        Ok(())
    }

    fn run(&mut self, vehicle: usize, assigned: &[usize]) -> Result<Vec<usize>, Error> {
        let mut pending = BTreeMap::<usize, Vec<usize>>::new();
        for &c in assigned {
            pending.entry(self.cargo[c].origin).or_default().push(c);
        }

        let mut route = vec![self.vehicles[vehicle].location];
        for &primary in assigned {
            // Possibly collected on an earlier leg already
            if self.cargo[primary].picked {
                continue;
            }

            let origin = self.cargo[primary].origin;
            let path = self.path(self.vehicles[vehicle].location, origin)?;
            self.travel(vehicle, &path, &pending, false, &mut route)?;

            if !self.cargo[primary].picked && !self.pick(vehicle, primary) {
                return Err(Error::Overloaded {
                    vehicle: self.vehicles[vehicle].name.clone(),
                    cargo: self.cargo[primary].name.clone(),
                });
            }

            // Most recently loaded goes first
            while let Some(&top) = self.vehicles[vehicle].carried.last() {
                let location = self.vehicles[vehicle].location;
                let path = self.path(location, self.cargo[top].destination)?;
                if path.nodes.len() == 1 {
                    let carried = self.vehicles[vehicle].carried.clone();
                    let dropped = self.drop_at(vehicle, location);
                    self.moves.push(Move {
                        time: self.clock,
                        vehicle,
                        from: location,
                        to: location,
                        carried,
                        dropped,
                    });
                } else {
                    self.travel(vehicle, &path, &pending, true, &mut route)?;
                }
            }
        }

        Ok(route)
    }
}

/// Simulate every vehicle through its assigned cargo, in vehicle order on one global clock.
///
/// Vehicles and cargo are mutated in place and are expected to be in their reset state.
/// Along the way a vehicle collects any of its own assigned cargo whose origin it passes,
/// and while delivering it drops every cargo whose destination it reaches.
pub fn plan_routes<R>(
    graph: &Graph,
    assignment: &Assignment,
    vehicles: &mut [Vehicle],
    cargo: &mut [Cargo],
    traversal: Traversal,
    rng: &mut R,
) -> Result<Plan, Error>
where
    R: Rng + ?Sized,
{
    let count = vehicles.len();
    if assignment.vehicles() != count {
        return Err(Error::Invalid(format!(
            "assignment covers {} vehicles, the fleet has {count}",
            assignment.vehicles()
        )));
    }

    let mut simulation = _Simulation {
        graph,
        vehicles,
        cargo,
        traversal,
        rng,
        clock: 0,
        moves: vec![],
    };

    let mut routes = Vec::with_capacity(count);
    for vehicle in 0..count {
        routes.push(simulation.run(vehicle, assignment.cargo(vehicle))?);
    }

    Ok(Plan {
        routes,
        moves: simulation.moves,
        elapsed: simulation.clock,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::problem::{self, Problem, fixtures};

    fn corridor() -> Problem {
        let mut graph = Graph::new(["A", "B", "C", "D"]);
        graph.add_edge("A", "B", 1).unwrap();
        graph.add_edge("B", "C", 1).unwrap();
        graph.add_edge("C", "D", 1).unwrap();

        let vehicles = vec![Vehicle::new("T1", 10, 0), Vehicle::new("T2", 10, 3)];
        let cargo = vec![
            Cargo::new("K1", 4, 2, 3),
            Cargo::new("K2", 3, 1, 3),
            Cargo::new("K3", 2, 3, 0),
        ];
        Problem::new(graph, vehicles, cargo).unwrap()
    }

    fn plan(problem: &mut Problem, assignment: &Assignment, traversal: Traversal, seed: u64) -> Result<Plan, Error> {
        let mut rng = StdRng::seed_from_u64(seed);
        plan_routes(
            &problem.graph,
            assignment,
            &mut problem.vehicles,
            &mut problem.cargo,
            traversal,
            &mut rng,
        )
    }

    #[test]
    fn test_single_delivery() {
        let mut problem = fixtures::line();
        let assignment = Assignment::from_lists(vec![vec![0]]);

        for traversal in [Traversal::Shortest, Traversal::Random] {
            problem::reset(&mut problem.vehicles, &mut problem.cargo);
            let plan = plan(&mut problem, &assignment, traversal, 0).unwrap();

            assert_eq!(plan.elapsed, 10);
            assert_eq!(plan.energy(&problem.graph), Some(10));
            assert_eq!(plan.routes, vec![vec![0, 1, 2]]);
            assert_eq!(
                plan.moves,
                vec![
                    Move {
                        time: 0,
                        vehicle: 0,
                        from: 0,
                        to: 1,
                        carried: vec![],
                        dropped: vec![],
                    },
                    Move {
                        time: 5,
                        vehicle: 0,
                        from: 1,
                        to: 2,
                        carried: vec![0],
                        dropped: vec![0],
                    },
                ]
            );
            assert_eq!(problem.vehicles[0].delivered, vec![0]);
            assert_eq!(problem.vehicles[0].residual, 10);
            assert!(problem.cargo[0].picked);
        }
    }

    #[test]
    fn test_opportunistic_pickup() {
        // T1 heads for K1 at C and passes K2's origin B on the way
        let mut problem = corridor();
        let assignment = Assignment::from_lists(vec![vec![0, 1], vec![2]]);
        let plan = plan(&mut problem, &assignment, Traversal::Shortest, 0).unwrap();

        let t1 = plan.moves.iter().filter(|m| m.vehicle == 0).collect::<Vec<_>>();
        assert_eq!(t1.len(), 3);
        assert_eq!((t1[0].from, t1[0].to), (0, 1));
        assert!(t1[0].carried.is_empty());
        assert_eq!((t1[1].from, t1[1].to), (1, 2));
        assert_eq!(t1[1].carried, vec![1]);
        assert_eq!((t1[2].from, t1[2].to), (2, 3));
        assert_eq!(t1[2].carried, vec![1, 0]);
        assert_eq!(t1[2].dropped, vec![1, 0]);

        // T2 starts after T1 on the shared clock
        let t2 = plan.moves.iter().filter(|m| m.vehicle == 1).collect::<Vec<_>>();
        assert_eq!(t2.len(), 3);
        assert_eq!(t2[0].time, 3);
        assert_eq!(t2[0].carried, vec![2]);
        assert_eq!(t2[2].dropped, vec![2]);

        assert_eq!(plan.elapsed, 6);
        assert_eq!(plan.routes[0], vec![0, 1, 2, 3]);
        assert_eq!(plan.routes[1], vec![3, 2, 1, 0]);
        assert!(problem.cargo.iter().all(|c| c.picked));
    }

    #[test]
    fn test_only_own_cargo_is_collected() {
        // T1 passes B, but K2 belongs to T2
        let mut problem = corridor();
        let assignment = Assignment::from_lists(vec![vec![0], vec![1, 2]]);
        let plan = plan(&mut problem, &assignment, Traversal::Shortest, 0).unwrap();

        let t1 = plan.moves.iter().filter(|m| m.vehicle == 0).collect::<Vec<_>>();
        assert!(t1.iter().all(|m| !m.carried.contains(&1)));
        assert_eq!(problem.vehicles[0].delivered, vec![0]);

        let mut delivered = problem.vehicles[1].delivered.clone();
        delivered.sort_unstable();
        assert_eq!(delivered, vec![1, 2]);
    }

    #[test]
    fn test_cargo_at_start_node() {
        let mut problem = corridor();
        let assignment = Assignment::from_lists(vec![vec![], vec![2]]);
        let plan = plan(&mut problem, &assignment, Traversal::Shortest, 0).unwrap();

        assert_eq!(plan.moves.len(), 3);
        assert_eq!(plan.moves[0].carried, vec![2]);
        assert_eq!(plan.routes[0], vec![0]);
        assert_eq!(plan.elapsed, 3);
    }

    #[test]
    fn test_delivery_in_place_is_logged() {
        let mut graph = Graph::new(["A", "B"]);
        graph.add_edge("A", "B", 2).unwrap();
        let mut problem =
            Problem::new(graph, vec![Vehicle::new("T", 5, 0)], vec![Cargo::new("K", 1, 1, 1)]).unwrap();
        let assignment = Assignment::from_lists(vec![vec![0]]);
        let plan = plan(&mut problem, &assignment, Traversal::Shortest, 0).unwrap();

        assert_eq!(plan.moves.len(), 2);
        assert_eq!((plan.moves[1].from, plan.moves[1].to), (1, 1));
        assert_eq!(plan.moves[1].time, 2);
        assert_eq!(plan.moves[1].carried, vec![0]);
        assert_eq!(plan.moves[1].dropped, vec![0]);
        assert_eq!(plan.elapsed, 2);
        assert_eq!(plan.routes[0], vec![0, 1]);
        assert_eq!(plan.energy(&problem.graph), Some(2));
    }

    #[test]
    fn test_clock_overflow_is_an_error() {
        let mut graph = Graph::new(["A", "B", "C"]);
        graph.add_edge("A", "B", u64::MAX).unwrap();
        graph.add_edge("B", "C", 1).unwrap();
        let mut problem =
            Problem::new(graph, vec![Vehicle::new("T", 5, 0)], vec![Cargo::new("K", 1, 1, 2)]).unwrap();
        assert!(problem.validate().is_ok());

        let assignment = Assignment::from_lists(vec![vec![0]]);
        let result = plan(&mut problem, &assignment, Traversal::Shortest, 0);
        assert!(matches!(result, Err(Error::Overflow)));
    }

    #[test]
    fn test_unreachable_cargo_is_an_error() {
        let mut graph = Graph::new(["A", "B"]);
        graph.add_edge("A", "A", 1).unwrap();
        let mut problem =
            Problem::new(graph, vec![Vehicle::new("T", 5, 0)], vec![Cargo::new("K", 1, 1, 0)]).unwrap();
        let assignment = Assignment::from_lists(vec![vec![0]]);

        for traversal in [Traversal::Shortest, Traversal::Random] {
            problem::reset(&mut problem.vehicles, &mut problem.cargo);
            let result = plan(&mut problem, &assignment, traversal, 0);
            assert!(matches!(result, Err(Error::NoRoute { from, to }) if from == "A" && to == "B"));
        }
    }

    #[test]
    fn test_replanning_after_reset_is_identical() {
        let mut problem = fixtures::network();
        let assignment = Assignment::from_lists(vec![vec![0, 4, 1, 2], vec![3]]);

        let first = plan(&mut problem, &assignment, Traversal::Random, 42).unwrap();
        let first_delivered = problem.vehicles.iter().map(|v| v.delivered.clone()).collect::<Vec<_>>();

        problem::reset(&mut problem.vehicles, &mut problem.cargo);
        let second = plan(&mut problem, &assignment, Traversal::Random, 42).unwrap();
        let second_delivered = problem.vehicles.iter().map(|v| v.delivered.clone()).collect::<Vec<_>>();

        assert_eq!(first, second);
        assert_eq!(first_delivered, second_delivered);
        assert_eq!(first.energy(&problem.graph), Some(first.elapsed));
    }
}
