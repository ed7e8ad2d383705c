use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::anneal::Schedule;
use crate::cli::{self, Strategy, Traversal};
use crate::errors::Error;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub problem: String,
    pub strategy: Strategy,

    pub iterations: usize,
    pub temperature: f64,
    pub cooling: f64,
    pub traversal: Traversal,
    pub keep_best: bool,
    pub restarts: usize,
    pub seed: u64,

    pub verbose: bool,
    pub outputs: String,
    pub disable_logging: bool,
}

impl Config {
    pub fn from_arguments(arguments: cli::Arguments) -> Result<Self, Error> {
        let config = match arguments.command {
            cli::Commands::Anneal {
                problem,
                iterations,
                temperature,
                cooling,
                traversal,
                keep_best,
                restarts,
                seed,
                verbose,
                outputs,
                disable_logging,
            } => Self {
                problem,
                strategy: Strategy::Anneal,
                iterations,
                temperature,
                cooling,
                traversal,
                keep_best,
                restarts,
                seed: seed.unwrap_or_else(|| rand::rng().random()),
                verbose,
                outputs,
                disable_logging,
            },
            cli::Commands::Dispatch {
                problem,
                verbose,
                outputs,
                disable_logging,
            } => Self {
                problem,
                strategy: Strategy::Dispatch,
                iterations: 0,
                temperature: cli::DEFAULT_TEMPERATURE,
                cooling: cli::DEFAULT_COOLING,
                traversal: Traversal::Shortest,
                keep_best: false,
                restarts: 0,
                seed: 0,
                verbose,
                outputs,
                disable_logging,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.strategy == Strategy::Dispatch {
            return Ok(());
        }

        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(Error::Config(format!("temperature must be positive, got {}", self.temperature)));
        }

        if !(self.cooling > 0.0 && self.cooling < 1.0) {
            return Err(Error::Config(format!("cooling must lie in (0, 1), got {}", self.cooling)));
        }

        if self.restarts == 0 {
            return Err(Error::Config("at least one restart is required".to_string()));
        }

        Ok(())
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            iterations: self.iterations,
            temperature: self.temperature,
            cooling: self.cooling,
            keep_best: self.keep_best,
            verbose: self.verbose,
        }
    }

    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rand::RngCore;

    use super::*;

    fn config(args: &[&str]) -> Result<Config, Error> {
        Config::from_arguments(cli::Arguments::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_anneal_defaults() {
        let config = config(&["freight", "anneal", "problem.txt", "--seed", "5"]).unwrap();
        assert_eq!(config.strategy, Strategy::Anneal);
        assert_eq!(config.iterations, cli::DEFAULT_ITERATIONS);
        assert_eq!(config.traversal, Traversal::Random);
        assert_eq!(config.restarts, 1);
        assert_eq!(config.seed, 5);
        assert!(!config.keep_best);

        let schedule = config.schedule();
        assert_eq!(schedule.temperature, cli::DEFAULT_TEMPERATURE);
        assert_eq!(schedule.cooling, cli::DEFAULT_COOLING);
        assert_eq!(config.rng().next_u64(), StdRng::seed_from_u64(5).next_u64());
    }

    #[test]
    fn test_anneal_options() {
        let config = config(&[
            "freight",
            "anneal",
            "p.txt",
            "-i",
            "20",
            "--traversal",
            "shortest",
            "--keep-best",
            "--restarts",
            "3",
        ])
        .unwrap();
        assert_eq!(config.iterations, 20);
        assert_eq!(config.traversal, Traversal::Shortest);
        assert!(config.keep_best);
        assert_eq!(config.restarts, 3);
    }

    #[test]
    fn test_invalid_schedule() {
        assert!(matches!(config(&["freight", "anneal", "p", "--cooling", "1.0"]), Err(Error::Config(_))));
        assert!(matches!(config(&["freight", "anneal", "p", "--temperature", "0"]), Err(Error::Config(_))));
        assert!(matches!(config(&["freight", "anneal", "p", "--restarts", "0"]), Err(Error::Config(_))));
    }

    #[test]
    fn test_dispatch() {
        let config = config(&["freight", "dispatch", "p.txt", "--disable-logging"]).unwrap();
        assert_eq!(config.strategy, Strategy::Dispatch);
        assert!(config.disable_logging);
        assert_eq!(config.outputs, "outputs/");
    }

    #[test]
    fn test_serialized_names() {
        let config = config(&["freight", "anneal", "p.txt", "--seed", "1"]).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["strategy"], "anneal");
        assert_eq!(json["traversal"], "random");
        assert_eq!(json["seed"], 1);
    }
}
