use clap::Parser;
use std::fs;
use std::io::Read;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cheetah::config::{self, Cli, Config, Mode};
use cheetah::driver;
use cheetah::error::{CheetahError, Result};
use cheetah::executor::{ExecOptions, Executor};
use cheetah::session::Session;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            match e {
                // batch failures were already written to the output stream
                CheetahError::Execution(_) | CheetahError::Database(_) => {}
                other => eprintln!("ERROR: {}", other),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let defaults = config::load_defaults()?;
    let config = Config::resolve(cli, defaults)?;
    debug!(mode = ?config.mode, database = %config.connect.database, "resolved configuration");

    eprint!("Connecting to {} ... ", config.connect.database);
    let driver = match driver::connect(&config.connect) {
        Ok(driver) => {
            eprintln!("done");
            driver
        }
        Err(e) => {
            eprintln!("FAIL");
            return Err(e);
        }
    };

    let mut executor = Executor::new(driver);
    executor.verbose = config.verbose;
    executor.timing = config.timing;

    match config.mode {
        Mode::File(ref path) => run_payload(&mut executor, &fs::read_to_string(path)?),
        Mode::Stdin => {
            eprintln!("Reading from stdin ...");
            let mut sql = String::new();
            std::io::stdin().read_to_string(&mut sql)?;
            run_payload(&mut executor, &sql)
        }
        Mode::Interactive => {
            executor.timing = true;
            eprintln!("Type `help` for help");
            let prompt = config.prompt();
            let mut session = Session::new(executor, prompt);
            session.run()?;
            // an ended session reports non-success
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_payload(executor: &mut Executor, sql: &str) -> Result<ExitCode> {
    executor.run(sql, ExecOptions::default())?;
    Ok(ExitCode::SUCCESS)
}
