use std::rc::Rc;

use rand::Rng;

use crate::anneal::{self, AnnealState, Schedule};
use crate::assignment::{self, Assignment};
use crate::cli::Traversal;
use crate::errors::Error;
use crate::graph::Graph;
use crate::logger::Logger;
use crate::neighborhoods::Neighborhood;
use crate::problem::{self, Cargo, Problem, Vehicle};
use crate::routes::{self, Plan};

/// One candidate of the local search: an assignment together with the simulation it produced.
///
/// Cloning is a deep copy of everything mutable. Only the graph is shared.
#[derive(Clone, Debug)]
pub struct Solution {
    graph: Rc<Graph>,
    components: Rc<Vec<usize>>,
    traversal: Traversal,

    pub assignment: Assignment,
    pub vehicles: Vec<Vehicle>,
    pub cargo: Vec<Cargo>,
    pub plan: Plan,
    pub neighborhood: Neighborhood,
}

impl Solution {
    pub fn new<R>(problem: &Problem, assignment: Assignment, traversal: Traversal, rng: &mut R) -> Result<Self, Error>
    where
        R: Rng + ?Sized,
    {
        let mut solution = Self {
            graph: problem.graph.clone(),
            components: Rc::new(problem.graph.components()),
            traversal,
            assignment,
            vehicles: problem.vehicles.clone(),
            cargo: problem.cargo.clone(),
            plan: Plan::empty(&problem.vehicles),
            neighborhood: Neighborhood::Initial,
        };
        solution.replan(rng)?;

        Ok(solution)
    }

    /// Seed solution from a random weight-sorted assignment.
    pub fn initialize<R>(problem: &Problem, traversal: Traversal, rng: &mut R) -> Result<Self, Error>
    where
        R: Rng + ?Sized,
    {
        let components = problem.graph.components();
        let assignment = assignment::random_assignment(&components, &problem.vehicles, &problem.cargo, rng)?;
        Self::new(problem, assignment, traversal, rng)
    }

    /// Reset every vehicle and cargo to its initial state and simulate the assignment again.
    pub fn replan<R>(&mut self, rng: &mut R) -> Result<(), Error>
    where
        R: Rng + ?Sized,
    {
        problem::reset(&mut self.vehicles, &mut self.cargo);
        self.plan = routes::plan_routes(
            &self.graph,
            &self.assignment,
            &mut self.vehicles,
            &mut self.cargo,
            self.traversal,
            rng,
        )?;

        Ok(())
    }

    pub fn working_time(&self) -> u64 {
        self.plan.elapsed
    }

    fn _residual(&self, vehicle: usize) -> u64 {
        self.assignment.residual(vehicle, &self.vehicles, &self.cargo)
    }

    fn _reassign<R>(&mut self, from: usize, to: usize, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        let index = rng.random_range(0..self.assignment.cargo(from).len());
        let cargo = self.assignment.cargo(from)[index];
        if self._residual(to) < self.cargo[cargo].weight {
            return false;
        }

        // The target must be able to reach the cargo at all
        if self.components[self.vehicles[to].start] != self.components[self.cargo[cargo].origin] {
            return false;
        }

        self.assignment.remove(from, index);
        self.assignment.push(to, cargo);
        true
    }

    /// Check a finished plan for consistency.
    pub fn verify(&self) -> Result<(), Error> {
        let mut delivered_by = vec![None; self.cargo.len()];
        for (v, vehicle) in self.vehicles.iter().enumerate() {
            if self.assignment.load(v, &self.cargo) > vehicle.capacity {
                return Err(Error::Invalid(format!("{} is assigned more than it can hold", vehicle.name)));
            }

            if !vehicle.carried.is_empty() {
                return Err(Error::Invalid(format!("{} still carries cargo", vehicle.name)));
            }

            for &c in &vehicle.delivered {
                if delivered_by[c].replace(v).is_some() {
                    return Err(Error::Invalid(format!("{} is delivered more than once", self.cargo[c].name)));
                }

                if !self.assignment.cargo(v).contains(&c) {
                    return Err(Error::Invalid(format!(
                        "{} is delivered by {} without being assigned to it",
                        self.cargo[c].name, vehicle.name
                    )));
                }
            }
        }

        if let Some(c) = delivered_by.iter().position(Option::is_none) {
            return Err(Error::Invalid(format!("{} is not delivered", self.cargo[c].name)));
        }

        for m in &self.plan.moves {
            let load = m.carried.iter().map(|&c| self.cargo[c].weight).sum::<u64>();
            if load > self.vehicles[m.vehicle].capacity {
                return Err(Error::Invalid(format!(
                    "{} carries {load} at time {}",
                    self.vehicles[m.vehicle].name, m.time
                )));
            }
        }

        if self.plan.energy(&self.graph) != Some(self.plan.elapsed) {
            return Err(Error::Invalid("routes do not add up to the elapsed time".to_string()));
        }

        Ok(())
    }

    /// Anneal from `restarts` independent random seeds, keeping the lowest energy result.
    pub fn search<R>(
        problem: &Problem,
        traversal: Traversal,
        schedule: &Schedule,
        restarts: usize,
        rng: &mut R,
        logger: &mut Logger,
    ) -> Result<Self, Error>
    where
        R: Rng + ?Sized,
    {
        let mut result: Option<Self> = None;
        for restart in 0..restarts {
            let root = Self::initialize(problem, traversal, rng)?;
            if schedule.verbose {
                eprintln!("Restart #{restart}: initial working time {}", root.working_time());
            }

            let outcome = anneal::anneal(root, schedule, rng, logger)?;
            if schedule.verbose {
                let accepted = outcome.steps.iter().filter(|s| s.accepted).count();
                eprintln!(
                    "Restart #{restart}: best energy {}, final {}, {accepted}/{} candidates accepted",
                    outcome.best_energy,
                    outcome.state.working_time(),
                    outcome.steps.len()
                );
            }

            if result
                .as_ref()
                .is_none_or(|r| outcome.state.working_time() < r.working_time())
            {
                result = Some(outcome.state);
            }
        }

        result.ok_or_else(|| Error::Config("at least one restart is required".to_string()))
    }
}

impl AnnealState for Solution {
    fn energy(&self) -> f64 {
        self.plan.elapsed as f64
    }

    /// Pick two vehicles. Half of the time try to move one cargo from the first to the
    /// second, otherwise (or when that does not fit) swap two cargo of the first.
    fn neighbor<R>(&self, rng: &mut R) -> Result<Self, Error>
    where
        R: Rng + ?Sized,
    {
        let mut next = self.clone();
        let count = next.vehicles.len();
        if count == 0 {
            next.neighborhood = Neighborhood::Idle;
            return Ok(next);
        }

        let a = rng.random_range(0..count);
        let b = rng.random_range(0..count);
        let reassign = rng.random_bool(0.5);

        if reassign && a != b && !next.assignment.cargo(a).is_empty() && next._reassign(a, b, rng) {
            next.neighborhood = Neighborhood::Reassign;
        } else {
            let size = next.assignment.cargo(a).len();
            if size == 0 {
                next.neighborhood = Neighborhood::Idle;
                return Ok(next);
            }

            let i = rng.random_range(0..size);
            let j = rng.random_range(0..size);
            next.assignment.swap(a, i, j);
            next.neighborhood = Neighborhood::Swap;
        }

        next.replan(rng)?;
        Ok(next)
    }

    fn label(&self) -> String {
        self.neighborhood.to_string()
    }
}
