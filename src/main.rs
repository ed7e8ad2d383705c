use std::process;

use clap::Parser;
use colored::Colorize;
use mimalloc::MiMalloc;

mod anneal;
mod assignment;
mod cli;
mod config;
mod dispatch;
mod errors;
mod graph;
mod loader;
mod logger;
mod neighborhoods;
mod paths;
mod problem;
mod report;
mod routes;
mod solutions;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn run() -> Result<u64, errors::Error> {
    let config = config::Config::from_arguments(cli::Arguments::parse())?;
    let problem = loader::load(&config.problem)?;
    problem.validate()?;

    let mut logger = logger::Logger::new(&config)?;
    let plan = match config.strategy {
        cli::Strategy::Anneal => {
            let mut rng = config.rng();
            if config.verbose {
                eprintln!("Seed = {}", config.seed);
            }

            let solution = solutions::Solution::search(
                &problem,
                config.traversal,
                &config.schedule(),
                config.restarts,
                &mut rng,
                &mut logger,
            )?;
            solution.verify()?;
            solution.plan
        }
        cli::Strategy::Dispatch => {
            let result = dispatch::dispatch(&problem, config.verbose)?;
            if config.verbose {
                eprintln!("Dispatched in {} rounds", result.rounds);
                for vehicle in &result.vehicles {
                    eprintln!("{}: {} delivered", vehicle.name, vehicle.delivered.len());
                }
            }

            result.plan
        }
    };

    println!("{}", report::movement(&problem, &plan));
    logger.finalize(&problem, &plan, &config)?;

    Ok(plan.elapsed)
}

fn main() {
    match run() {
        Ok(elapsed) => eprintln!("{}", format!("Result = {elapsed}").red()),
        Err(e) => {
            eprintln!("{}", format!("Error: {e}").red());
            process::exit(1);
        }
    }
}
