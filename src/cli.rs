use std::fmt;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATIONS: usize = 10000;
pub const DEFAULT_TEMPERATURE: f64 = 25000.0;
pub const DEFAULT_COOLING: f64 = 0.99;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Deserialize, Serialize)]
pub enum Traversal {
    #[serde(rename = "shortest")]
    Shortest,
    #[serde(rename = "random")]
    Random,
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Shortest => "shortest",
                Self::Random => "random",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Strategy {
    #[serde(rename = "anneal")]
    Anneal,
    #[serde(rename = "dispatch")]
    Dispatch,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Anneal => "anneal",
                Self::Dispatch => "dispatch",
            }
        )
    }
}

#[derive(Debug, Parser)]
#[command(
    long_about = "Multi-vehicle pickup-and-delivery routing on a weighted station graph, minimizing total elapsed time",
    propagate_version = true,
    version
)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Optimize cargo assignment and routes with simulated annealing
    Anneal {
        /// Path to the problem file
        problem: String,

        /// Number of annealing iterations per restart
        #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,

        /// Initial temperature
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f64,

        /// Cooling factor applied to the temperature after every iteration, in (0, 1)
        #[arg(long, default_value_t = DEFAULT_COOLING)]
        cooling: f64,

        /// How a vehicle finds its way between two stations
        #[arg(long, default_value_t = Traversal::Random)]
        traversal: Traversal,

        /// Return the best solution seen instead of the one held after the last iteration
        #[arg(long)]
        keep_best: bool,

        /// Number of independent annealing runs, the best one is reported
        #[arg(long, default_value_t = 1)]
        restarts: usize,

        /// Seed of the random number generator. Otherwise, a random seed is drawn (and recorded).
        #[arg(long)]
        seed: Option<u64>,

        /// The verbose mode
        #[arg(short, long)]
        verbose: bool,

        /// The directory to store results
        #[arg(long, default_value_t = String::from("outputs/"))]
        outputs: String,

        /// Disable CSV logging per iteration (this can significantly reduce the running time)
        #[arg(long)]
        disable_logging: bool,
    },

    /// Schedule greedily, round by round, choosing between the next pickup and a delivery
    Dispatch {
        /// Path to the problem file
        problem: String,

        /// The verbose mode
        #[arg(short, long)]
        verbose: bool,

        /// The directory to store results
        #[arg(long, default_value_t = String::from("outputs/"))]
        outputs: String,

        /// Do not write any result file
        #[arg(long)]
        disable_logging: bool,
    },
}
