//! Command-line front end for running statmerge jobs.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in health and employment jobs against CSVs in the current directory
//! statmerge
//!
//! # Run only the health job, reading and writing under data/oecd
//! statmerge run health --data-dir data/oecd
//!
//! # Add or replace jobs from a configuration file
//! statmerge --config jobs.toml run
//!
//! # Show what would run
//! statmerge list
//! ```

use statmerge::config::{Job, JobRegistry};
use statmerge::logging::{self, LogConfig};
use statmerge::pipeline::{self, JobSummary};

use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "statmerge",
    version,
    about = "Join country-year statistical tables into JSON documents",
    long_about = "Join pairs of country-year statistical tables (CSV) into JSON documents \
                  grouped by year or by country.\n\n\
                  Without a subcommand all configured jobs are run."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Job configuration file (TOML or JSON) adding to or replacing the built-in jobs
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory that relative input and output paths are resolved against
    #[arg(short, long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// More log output (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all configured jobs, or only the named ones
    Run {
        /// Names of the jobs to run
        #[arg(value_name = "JOB")]
        jobs: Vec<String>,
    },
    /// List the configured jobs with their inputs and outputs
    List,
}

fn main() {
    let cli = Cli::parse();
    let log_config =
        LogConfig::from_verbosity(cli.verbose, cli.quiet).with_ansi(io::stderr().is_terminal());
    let exit_code = logging::with_run_logging(&log_config, || run(cli));
    process::exit(exit_code);
}

fn run(cli: Cli) -> i32 {
    let mut registry = match JobRegistry::with_config(cli.config.as_deref()) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return 1;
        }
    };
    if let Some(data_dir) = cli.data_dir {
        registry.data_dir = data_dir;
    }

    match cli.command.unwrap_or(Command::Run { jobs: Vec::new() }) {
        Command::List => {
            for job in registry.jobs() {
                print_job(&registry, job);
            }
            0
        }
        Command::Run { jobs } => match pipeline::run_all(&registry, &jobs) {
            Ok(summaries) => {
                print_summaries(&summaries);
                if summaries.iter().all(JobSummary::all_written) {
                    0
                } else {
                    1
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    }
}

fn print_job(registry: &JobRegistry, job: &Job) {
    println!("{} ({})", job.name(), job.kind());
    for source in job.sources() {
        println!("  input:  {}", registry.resolve(&source.path).display());
    }
    for path in job.output_paths() {
        println!("  output: {}", registry.resolve(path).display());
    }
}

fn print_summaries(summaries: &[JobSummary]) {
    for summary in summaries {
        for output in &summary.outputs {
            if output.written {
                println!(
                    "{}: {} records in {} groups saved to {}",
                    summary.job,
                    output.records,
                    output.groups,
                    output.path.display()
                );
            } else {
                eprintln!("{}: could not write {}", summary.job, output.path.display());
            }
        }
    }
}
