//! Simulated annealing over any state that can report an energy and produce a neighbor.

use rand::Rng;

use crate::errors::Error;
use crate::logger::Logger;

pub trait AnnealState: Clone {
    /// Objective to minimize.
    fn energy(&self) -> f64;

    /// A perturbed, fully independent copy of `self`.
    fn neighbor<R>(&self, rng: &mut R) -> Result<Self, Error>
    where
        R: Rng + ?Sized;

    fn label(&self) -> String {
        String::new()
    }
}

#[derive(Clone, Debug)]
pub struct Schedule {
    pub iterations: usize,
    pub temperature: f64,
    pub cooling: f64,

    /// Return the best state seen rather than the state held after the last iteration.
    pub keep_best: bool,
    pub verbose: bool,
}

#[derive(Clone, Debug)]
pub struct Step {
    pub iteration: usize,
    pub temperature: f64,
    pub current: f64,
    pub candidate: f64,

    /// The uniform draw the acceptance probability was compared against, only taken
    /// when the candidate is not strictly better.
    pub draw: Option<f64>,
    pub accepted: bool,
    pub label: String,
}

#[derive(Debug)]
pub struct Outcome<S> {
    pub state: S,
    pub best_energy: f64,
    pub steps: Vec<Step>,
}

/// Probability of accepting a candidate that is not better than the current state.
pub fn acceptance(current: f64, candidate: f64, temperature: f64) -> f64 {
    ((current - candidate) / temperature).exp()
}

pub fn anneal<S, R>(initial: S, schedule: &Schedule, rng: &mut R, logger: &mut Logger) -> Result<Outcome<S>, Error>
where
    S: AnnealState,
    R: Rng + ?Sized,
{
    let mut temperature = schedule.temperature;
    let mut current_energy = initial.energy();
    let mut best = schedule.keep_best.then(|| initial.clone());
    let mut best_energy = current_energy;
    let mut current = initial;
    let mut steps = Vec::with_capacity(schedule.iterations);

    for iteration in 1..=schedule.iterations {
        let candidate = current.neighbor(rng)?;
        let candidate_energy = candidate.energy();

        let (accepted, draw) = if candidate_energy < current_energy {
            (true, None)
        } else {
            let draw = rng.random::<f64>();
            (acceptance(current_energy, candidate_energy, temperature) > draw, Some(draw))
        };

        let step = Step {
            iteration,
            temperature,
            current: current_energy,
            candidate: candidate_energy,
            draw,
            accepted,
            label: candidate.label(),
        };
        logger.log(&step)?;

        if schedule.verbose {
            eprint!(
                "Iteration #{iteration}: T = {temperature:.4}, {current_energy}/{best_energy}          \r"
            );
        }

        if accepted {
            current = candidate;
            current_energy = candidate_energy;
            if current_energy < best_energy {
                best_energy = current_energy;
                if let Some(best) = best.as_mut() {
                    *best = current.clone();
                }
            }
        }

        temperature *= schedule.cooling;
        steps.push(step);
    }

    if schedule.verbose {
        eprintln!();
    }

    Ok(Outcome {
        state: best.unwrap_or(current),
        best_energy,
        steps,
    })
}
