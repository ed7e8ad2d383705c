use std::collections::VecDeque;

use crate::assignment::{self, Action, Errand};
use crate::errors::Error;
use crate::graph::Graph;
use crate::paths::ShortestPaths;
use crate::problem::{self, Cargo, Problem, Vehicle};
use crate::routes::{Move, Plan};

/// What one vehicle does in a round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub vehicle: usize,
    pub action: Action,
}

#[derive(Clone, Debug)]
pub struct Dispatch {
    pub vehicles: Vec<Vehicle>,
    pub plan: Plan,
    pub rounds: usize,
}

fn _execute(graph: &Graph, vehicles: &mut [Vehicle], cargo: &mut [Cargo], task: &Task, plan: &mut Plan) -> Result<(), Error> {
    let v = task.vehicle;
    let Errand { cargo: c, target, path } = task.action.errand();
    if path.nodes.first() != Some(&vehicles[v].location) || path.end() != Some(*target) {
        return Err(Error::Invalid(format!(
            "{} was sent along a path that does not lead from its location to {}",
            vehicles[v].name,
            graph.name(*target)
        )));
    }

    for leg in path.nodes.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        let weight = graph.weight(from, to).ok_or_else(|| Error::NoRoute {
            from: graph.name(from).to_string(),
            to: graph.name(to).to_string(),
        })?;

        plan.moves.push(Move {
            time: plan.elapsed,
            vehicle: v,
            from,
            to,
            carried: vehicles[v].carried.clone(),
            dropped: vec![],
        });
        plan.elapsed = plan.elapsed.checked_add(weight).ok_or(Error::Overflow)?;
        plan.routes[v].push(to);
        vehicles[v].location = to;
    }

    let c = *c;
    match task.action {
        Action::Pickup(_) => {
            if cargo[c].picked || !vehicles[v].load(c, cargo[c].weight) {
                return Err(Error::Overloaded {
                    vehicle: vehicles[v].name.clone(),
                    cargo: cargo[c].name.clone(),
                });
            }
            cargo[c].picked = true;
        }
        Action::Deliver(_) => {
            let carried = vehicles[v].carried.clone();
            vehicles[v].unload(c, cargo[c].weight);
            if path.nodes.len() > 1 {
                // The last move is this task's final leg
                if let Some(last) = plan.moves.last_mut() {
                    last.dropped.push(c);
                }
            } else {
                let location = vehicles[v].location;
                plan.moves.push(Move {
                    time: plan.elapsed,
                    vehicle: v,
                    from: location,
                    to: location,
                    carried,
                    dropped: vec![c],
                });
            }
        }
    }

    Ok(())
}

/// Decide every vehicle's next task: the nearest delivery of something on board if it is
/// strictly closer than the vehicle's next pickup, the pickup otherwise.
pub fn next_round(graph: &Graph, vehicles: &[Vehicle], cargo: &[Cargo]) -> Vec<Task> {
    let pickups = assignment::greedy_round(graph, vehicles, cargo);

    let mut tasks = vec![];
    for (v, vehicle) in vehicles.iter().enumerate() {
        let mut best = pickups
            .iter()
            .find(|candidate| candidate.vehicle == v)
            .map(|candidate| candidate.action.clone());

        if !vehicle.carried.is_empty() {
            let table = ShortestPaths::from(graph, vehicle.location);
            for &c in &vehicle.carried {
                let target = cargo[c].destination;
                let Some(path) = table.path_to(target) else {
                    continue;
                };

                if best.as_ref().is_none_or(|action| path.distance < action.distance()) {
                    best = Some(Action::Deliver(Errand { cargo: c, target, path }));
                }
            }
        }

        if let Some(action) = best {
            tasks.push(Task { vehicle: v, action });
        }
    }

    tasks
}

/// Greedy round-by-round scheduling. Never backtracks.
pub fn dispatch(problem: &Problem, verbose: bool) -> Result<Dispatch, Error> {
    let graph = &problem.graph;
    let mut vehicles = problem.vehicles.clone();
    let mut cargo = problem.cargo.clone();
    problem::reset(&mut vehicles, &mut cargo);

    let mut plan = Plan::empty(&vehicles);
    let mut queue = VecDeque::new();
    let first = assignment::greedy_round(graph, &vehicles, &cargo)
        .into_iter()
        .map(|candidate| Task {
            vehicle: candidate.vehicle,
            action: candidate.action,
        })
        .collect::<Vec<_>>();
    if !first.is_empty() {
        queue.push_back(first);
    }

    let mut rounds = 0;
    while let Some(round) = queue.pop_front() {
        rounds += 1;
        for task in &round {
            _execute(graph, &mut vehicles, &mut cargo, task, &mut plan)?;
        }

        if verbose {
            eprint!("Round #{rounds}: {} tasks, elapsed {}          \r", round.len(), plan.elapsed);
        }

        let next = next_round(graph, &vehicles, &cargo);
        if !next.is_empty() {
            queue.push_back(next);
        }
    }

    if verbose {
        eprintln!();
    }

    let mut delivered = vec![false; cargo.len()];
    for vehicle in &vehicles {
        for &c in &vehicle.delivered {
            delivered[c] = true;
        }
    }

    let stranded = cargo
        .iter()
        .zip(&delivered)
        .filter(|(_, delivered)| !**delivered)
        .map(|(c, _)| c.name.clone())
        .collect::<Vec<_>>();
    if !stranded.is_empty() {
        return Err(Error::Stranded(stranded));
    }

    Ok(Dispatch {
        vehicles,
        plan,
        rounds,
    })
}
