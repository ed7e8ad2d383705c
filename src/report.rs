use std::fmt;

use serde::Serialize;

use crate::problem::Problem;
use crate::routes::{Move, Plan};

fn _names<'a>(problem: &'a Problem, cargo: &[usize]) -> Vec<&'a str> {
    cargo.iter().map(|&c| problem.cargo[c].name.as_str()).collect()
}

/// A [`Move`] with every index resolved to its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NamedMove<'a> {
    pub time: u64,
    pub vehicle: &'a str,
    pub from: &'a str,
    pub to: &'a str,
    pub carried: Vec<&'a str>,
    pub dropped: Vec<&'a str>,
}

impl<'a> NamedMove<'a> {
    pub fn new(problem: &'a Problem, m: &Move) -> Self {
        Self {
            time: m.time,
            vehicle: &problem.vehicles[m.vehicle].name,
            from: problem.graph.name(m.from),
            to: problem.graph.name(m.to),
            carried: _names(problem, &m.carried),
            dropped: _names(problem, &m.dropped),
        }
    }
}

impl fmt::Display for NamedMove<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "W={}, T={}, N1={}, P1=[{}], N2={}, P2=[{}]",
            self.time,
            self.vehicle,
            self.from,
            self.carried.join(" "),
            self.to,
            self.dropped.join(" "),
        )
    }
}

pub fn named_moves<'a>(problem: &'a Problem, plan: &Plan) -> Vec<NamedMove<'a>> {
    plan.moves.iter().map(|m| NamedMove::new(problem, m)).collect()
}

/// Station names visited by each vehicle, in catalog order.
pub fn named_routes<'a>(problem: &'a Problem, plan: &Plan) -> Vec<(&'a str, Vec<&'a str>)> {
    problem
        .vehicles
        .iter()
        .zip(&plan.routes)
        .map(|(v, route)| {
            (
                v.name.as_str(),
                route.iter().map(|&n| problem.graph.name(n)).collect(),
            )
        })
        .collect()
}

/// The movement listing, one line per move and a closing total.
pub fn movement(problem: &Problem, plan: &Plan) -> String {
    let mut lines = named_moves(problem, plan)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    lines.push(format!("// Takes {} minutes total.", plan.elapsed));
    lines.join("\n")
}
