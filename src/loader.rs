use std::fs;
use std::iter::Enumerate;
use std::str::{FromStr, Lines};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::errors::Error;
use crate::graph::Graph;
use crate::problem::{Cargo, Problem, Vehicle};

/// Largest accepted edge weight.
pub const MAX_WEIGHT: u64 = i32::MAX as u64;

static COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());
static STATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([^,\s]+)\s*$").unwrap());
static EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^,\s]+)\s*,\s*([^,\s]+)\s*,\s*([^,\s]+)\s*,\s*(\d+)\s*$").unwrap()
});
static DELIVERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^,\s]+)\s*,\s*(\d+)\s*,\s*([^,\s]+)\s*,\s*([^,\s]+)\s*$").unwrap()
});
static VEHICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^,\s]+)\s*,\s*(\d+)\s*,\s*([^,\s]+)\s*$").unwrap());

struct _Records<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> _Records<'a> {
    /// Next non-blank line with its 1-based number.
    fn next_line(&mut self, expected: &str) -> Result<(usize, &'a str), Error> {
        for (i, line) in self.lines.by_ref() {
            if !line.trim().is_empty() {
                return Ok((i + 1, line));
            }
        }

        Err(Error::Parse {
            line: 0,
            message: format!("unexpected end of input, expected {expected}"),
        })
    }

    fn next(&mut self, regex: &Regex, expected: &str) -> Result<(usize, Captures<'a>), Error> {
        let (line, text) = self.next_line(expected)?;
        match regex.captures(text) {
            Some(captures) => Ok((line, captures)),
            None => Err(Error::Parse {
                line,
                message: format!("expected {expected}, found {text:?}"),
            }),
        }
    }

    fn count(&mut self, section: &str) -> Result<usize, Error> {
        let (line, captures) = self.next(&COUNT, &format!("the number of {section}"))?;
        _number(line, &captures[1])
    }
}

fn _number<T: FromStr>(line: usize, text: &str) -> Result<T, Error> {
    text.parse::<T>().map_err(|_| Error::Parse {
        line,
        message: format!("{text:?} is out of range"),
    })
}

fn _node(graph: &Graph, line: usize, name: &str) -> Result<usize, Error> {
    graph.require(name).map_err(|e| Error::Parse {
        line,
        message: e.to_string(),
    })
}

/// Parse a problem made of four sections, each a count followed by that many records:
/// stations (`name`), edges (`name,a,b,weight`), deliveries
/// (`name,weight,origin,destination`) and vehicles (`name,capacity,start`).
/// Blank lines are ignored.
pub fn parse(text: &str) -> Result<Problem, Error> {
    let mut records = _Records {
        lines: text.lines().enumerate(),
    };

    let stations_count = records.count("stations")?;
    let mut stations = Vec::with_capacity(stations_count);
    for _ in 0..stations_count {
        let (_, captures) = records.next(&STATION, "a station name")?;
        stations.push(captures[1].to_string());
    }

    let mut graph = Graph::new(stations.iter().cloned());
    if graph.len() != stations.len() {
        let mut sorted = stations.clone();
        sorted.sort();
        let duplicate = sorted.windows(2).find(|w| w[0] == w[1]).map(|w| w[0].clone());
        return Err(Error::DuplicateId(duplicate.unwrap_or_default()));
    }

    let edges_count = records.count("edges")?;
    for _ in 0..edges_count {
        let (line, captures) = records.next(&EDGE, "an edge `name,station,station,weight`")?;
        let a = _node(&graph, line, &captures[2])?;
        let b = _node(&graph, line, &captures[3])?;
        let weight = _number::<u64>(line, &captures[4])?;
        if weight > MAX_WEIGHT {
            return Err(Error::Parse {
                line,
                message: format!("edge weight {weight} exceeds {MAX_WEIGHT}"),
            });
        }
        graph.connect(a, b, weight);
    }

    let deliveries_count = records.count("deliveries")?;
    let mut cargo = Vec::with_capacity(deliveries_count);
    for _ in 0..deliveries_count {
        let (line, captures) = records.next(&DELIVERY, "a delivery `name,weight,origin,destination`")?;
        let weight = _number::<u64>(line, &captures[2])?;
        if weight == 0 {
            return Err(Error::Parse {
                line,
                message: "cargo weight must be positive".to_string(),
            });
        }

        let origin = _node(&graph, line, &captures[3])?;
        let destination = _node(&graph, line, &captures[4])?;
        cargo.push(Cargo::new(&captures[1], weight, origin, destination));
    }

    let vehicles_count = records.count("vehicles")?;
    let mut vehicles = Vec::with_capacity(vehicles_count);
    for _ in 0..vehicles_count {
        let (line, captures) = records.next(&VEHICLE, "a vehicle `name,capacity,start`")?;
        let capacity = _number(line, &captures[2])?;
        let start = _node(&graph, line, &captures[3])?;
        vehicles.push(Vehicle::new(&captures[1], capacity, start));
    }

    if let Ok((line, text)) = records.next_line("nothing") {
        return Err(Error::Parse {
            line,
            message: format!("unexpected trailing content {text:?}"),
        });
    }

    Problem::new(graph, vehicles, cargo)
}

pub fn load(path: &str) -> Result<Problem, Error> {
    parse(&fs::read_to_string(path)?)
}
