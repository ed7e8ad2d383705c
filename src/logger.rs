use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;

use crate::anneal::Step;
use crate::cli::Strategy;
use crate::config::Config;
use crate::errors::Error;
use crate::problem::Problem;
use crate::report::{self, NamedMove};
use crate::routes::Plan;

#[derive(Serialize)]
struct RunJSON<'a> {
    problem: &'a str,
    strategy: Strategy,
    iterations: usize,
    energy: u64,
    elapsed: f64,
    routes: Vec<(&'a str, Vec<&'a str>)>,
    moves: Vec<NamedMove<'a>>,
    config: &'a Config,
}

struct _Output {
    directory: PathBuf,
    problem: String,
    id: String,
}

pub struct Logger {
    _iteration: usize,
    _time_offset: SystemTime,

    _output: Option<_Output>,
    _writer: Option<BufWriter<File>>,
}

impl Logger {
    pub fn new(config: &Config) -> Result<Self, Error> {
        if config.disable_logging && config.strategy == Strategy::Dispatch {
            return Ok(Self::silent());
        }

        let directory = PathBuf::from(&config.outputs);
        if !directory.is_dir() {
            fs::create_dir_all(&directory)?;
        }

        let problem = Path::new(&config.problem)
            .file_stem()
            .and_then(|f| f.to_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Config(format!("{:?} does not name a file", config.problem)))?;
        let id = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect::<String>();

        let mut writer = if config.disable_logging || config.strategy != Strategy::Anneal {
            None
        } else {
            let path = directory.join(format!("{problem}-{id}.csv"));
            eprintln!("Logging iterations to {}", path.display());
            Some(BufWriter::new(File::create(path)?))
        };

        if let Some(ref mut writer) = writer {
            let columns = [
                "Iteration",
                "Temperature",
                "Current energy",
                "Candidate energy",
                "Draw",
                "Accepted",
                "Neighborhood",
            ]
            .join(",");
            writeln!(writer, "sep=,\n{columns}")?;
        }

        Ok(Self {
            _iteration: 0,
            _time_offset: SystemTime::now(),
            _output: Some(_Output { directory, problem, id }),
            _writer: writer,
        })
    }

    /// A logger that records nothing and writes no file.
    pub fn silent() -> Self {
        Self {
            _iteration: 0,
            _time_offset: SystemTime::now(),
            _output: None,
            _writer: None,
        }
    }

    pub fn log(&mut self, step: &Step) -> Result<(), io::Error> {
        self._iteration += 1;
        if let Some(ref mut writer) = self._writer {
            writeln!(
                writer,
                "{},{},{},{},{},{},\"{}\"",
                step.iteration,
                step.temperature,
                step.current,
                step.candidate,
                step.draw.map(|d| d.to_string()).unwrap_or_default(),
                i32::from(step.accepted),
                step.label,
            )?;
        }

        Ok(())
    }

    pub fn finalize(&mut self, problem: &Problem, plan: &Plan, config: &Config) -> Result<(), Error> {
        if let Some(ref mut writer) = self._writer {
            writer.flush()?;
        }

        let Some(output) = &self._output else {
            return Ok(());
        };

        let elapsed = SystemTime::now()
            .duration_since(self._time_offset)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        let json_path = output.directory.join(format!("{}-{}.json", output.problem, output.id));
        let mut json = BufWriter::new(File::create(&json_path)?);
        println!("{}", json_path.display());
        serde_json::to_writer(
            &mut json,
            &RunJSON {
                problem: &output.problem,
                strategy: config.strategy,
                iterations: self._iteration,
                energy: plan.elapsed,
                elapsed,
                routes: report::named_routes(problem, plan),
                moves: report::named_moves(problem, plan),
                config,
            },
        )?;
        json.flush()?;

        let json_path = output
            .directory
            .join(format!("{}-{}-config.json", output.problem, output.id));
        let mut json = BufWriter::new(File::create(&json_path)?);
        println!("{}", json_path.display());
        serde_json::to_writer(&mut json, config)?;
        json.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{env, process};

    use super::*;
    use crate::cli::Traversal;
    use crate::dispatch;
    use crate::problem::fixtures;

    fn config(outputs: &Path, strategy: Strategy, disable_logging: bool) -> Config {
        Config {
            problem: "data/line.txt".to_string(),
            strategy,
            iterations: 1,
            temperature: 1.0,
            cooling: 0.5,
            traversal: Traversal::Shortest,
            keep_best: false,
            restarts: 1,
            seed: 0,
            verbose: false,
            outputs: outputs.to_string_lossy().into_owned(),
            disable_logging,
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let directory = env::temp_dir().join(format!("min-time-freight-{name}-{}", process::id()));
        let _ = fs::remove_dir_all(&directory);
        directory
    }

    fn step(iteration: usize) -> Step {
        Step {
            iteration,
            temperature: 10.0,
            current: 4.0,
            candidate: 6.0,
            draw: Some(0.5),
            accepted: false,
            label: "Swap".to_string(),
        }
    }

    #[test]
    fn test_silent() {
        let mut logger = Logger::silent();
        logger.log(&step(1)).unwrap();
        assert_eq!(logger._iteration, 1);

        let problem = fixtures::line();
        let plan = Plan::empty(&problem.vehicles);
        let directory = scratch("silent");
        logger
            .finalize(&problem, &plan, &config(&directory, Strategy::Anneal, false))
            .unwrap();
        assert!(!directory.exists());
    }

    #[test]
    fn test_anneal_outputs() {
        let directory = scratch("anneal");
        let config = config(&directory, Strategy::Anneal, false);
        let mut logger = Logger::new(&config).unwrap();
        logger.log(&step(1)).unwrap();
        logger.log(&step(2)).unwrap();

        let problem = fixtures::line();
        let plan = dispatch::dispatch(&problem, false).unwrap().plan;
        logger.finalize(&problem, &plan, &config).unwrap();

        let mut files = fs::read_dir(&directory)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        files.sort();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.starts_with("line-")));

        let csv = files.iter().find(|f| f.ends_with(".csv")).unwrap();
        let csv = fs::read_to_string(directory.join(csv)).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "sep=,");
        assert!(lines[1].starts_with("Iteration,Temperature"));
        assert_eq!(lines[3], "2,10,4,6,0.5,0,\"Swap\"");

        let run = files
            .iter()
            .find(|f| f.ends_with(".json") && !f.ends_with("-config.json"))
            .unwrap();
        let run: serde_json::Value = serde_json::from_str(&fs::read_to_string(directory.join(run)).unwrap()).unwrap();
        assert_eq!(run["problem"], "line");
        assert_eq!(run["strategy"], "anneal");
        assert_eq!(run["iterations"], 2);
        assert_eq!(run["energy"], 10);
        assert_eq!(run["moves"][1]["dropped"][0], "K1");
        assert_eq!(run["config"]["seed"], 0);

        fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn test_disabled_csv() {
        let directory = scratch("disabled");
        let config = config(&directory, Strategy::Anneal, true);
        let mut logger = Logger::new(&config).unwrap();
        logger.log(&step(1)).unwrap();

        let problem = fixtures::line();
        logger.finalize(&problem, &Plan::empty(&problem.vehicles), &config).unwrap();

        let files = fs::read_dir(&directory).unwrap().count();
        assert_eq!(files, 2);
        fs::remove_dir_all(&directory).unwrap();
    }
}
