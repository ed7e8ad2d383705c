use std::collections::HashSet;
use std::rc::Rc;

use crate::errors::Error;
use crate::graph::Graph;
use crate::paths::ShortestPaths;

#[derive(Clone, Debug)]
pub struct Vehicle {
    pub name: String,
    pub capacity: u64,
    pub start: usize,

    pub location: usize,
    pub residual: u64,

    /// Cargo on board, most recently loaded last.
    pub carried: Vec<usize>,
    pub delivered: Vec<usize>,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, capacity: u64, start: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            start,
            location: start,
            residual: capacity,
            carried: vec![],
            delivered: vec![],
        }
    }

    pub fn reset(&mut self) {
        self.location = self.start;
        self.residual = self.capacity;
        self.carried.clear();
        self.delivered.clear();
    }

    pub fn fits(&self, weight: u64) -> bool {
        self.residual >= weight
    }

    /// Put `cargo` on board, returning `false` (and changing nothing) if it does not fit.
    pub fn load(&mut self, cargo: usize, weight: u64) -> bool {
        if !self.fits(weight) {
            return false;
        }

        self.residual -= weight;
        self.carried.push(cargo);
        true
    }

    pub fn unload(&mut self, cargo: usize, weight: u64) -> bool {
        match self.carried.iter().position(|&c| c == cargo) {
            Some(i) => {
                self.carried.remove(i);
                self.residual += weight;
                self.delivered.push(cargo);
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cargo {
    pub name: String,
    pub weight: u64,
    pub origin: usize,
    pub destination: usize,
    pub picked: bool,
}

impl Cargo {
    pub fn new(name: impl Into<String>, weight: u64, origin: usize, destination: usize) -> Self {
        Self {
            name: name.into(),
            weight,
            origin,
            destination,
            picked: false,
        }
    }

    pub fn reset(&mut self) {
        self.picked = false;
    }
}

/// Reset the mutable simulation state of a whole fleet and cargo catalog.
pub fn reset(vehicles: &mut [Vehicle], cargo: &mut [Cargo]) {
    vehicles.iter_mut().for_each(Vehicle::reset);
    cargo.iter_mut().for_each(Cargo::reset);
}

/// An immutable problem instance. Catalogs are sorted by name, so index order is id order.
#[derive(Clone, Debug)]
pub struct Problem {
    pub graph: Rc<Graph>,
    pub vehicles: Vec<Vehicle>,
    pub cargo: Vec<Cargo>,
}

impl Problem {
    pub fn new(graph: Graph, mut vehicles: Vec<Vehicle>, mut cargo: Vec<Cargo>) -> Result<Self, Error> {
        vehicles.sort_by(|a, b| a.name.cmp(&b.name));
        cargo.sort_by(|a, b| a.name.cmp(&b.name));

        let mut seen = HashSet::new();
        for name in vehicles.iter().map(|v| &v.name).chain(cargo.iter().map(|c| &c.name)) {
            if !seen.insert(name) {
                return Err(Error::DuplicateId(name.clone()));
            }
        }

        Ok(Self {
            graph: Rc::new(graph),
            vehicles,
            cargo,
        })
    }

    /// Reject instances that no plan could ever complete, before any planning starts.
    pub fn validate(&self) -> Result<(), Error> {
        let max_capacity = self.vehicles.iter().map(|v| v.capacity).max().unwrap_or(0);
        for c in &self.cargo {
            if c.weight > max_capacity {
                return Err(Error::Capacity {
                    cargo: c.name.clone(),
                    weight: c.weight,
                });
            }
        }

        let tables = self
            .vehicles
            .iter()
            .map(|v| ShortestPaths::from(&self.graph, v.start))
            .collect::<Vec<_>>();
        for c in &self.cargo {
            let collectable = self
                .vehicles
                .iter()
                .zip(&tables)
                .any(|(v, table)| v.capacity >= c.weight && table.distance(c.origin).is_some());
            if !collectable {
                return Err(self.no_route(self.capable_start(c), c.origin));
            }

            if ShortestPaths::from(&self.graph, c.origin).distance(c.destination).is_none() {
                return Err(self.no_route(c.origin, c.destination));
            }
        }

        Ok(())
    }

    fn capable_start(&self, cargo: &Cargo) -> usize {
        self.vehicles
            .iter()
            .find(|v| v.capacity >= cargo.weight)
            .map_or(cargo.origin, |v| v.start)
    }

    pub fn no_route(&self, from: usize, to: usize) -> Error {
        Error::NoRoute {
            from: self.graph.name(from).to_string(),
            to: self.graph.name(to).to_string(),
        }
    }
}
