//! `stu-parse`: scan and parse a Stu build script and print its rules.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};
use miette::GraphicalReportHandler;

use stu_cli::{Args, CliError, error_adapter::to_reportables};

/// Log level from the command line, falling back to `warn`.
fn log_level(args: &Args) -> LevelFilter {
    LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    })
}

/// Render every report of `err` and exit with its status.
fn fail(err: &CliError) -> ! {
    let reporter = GraphicalReportHandler::new();
    for reportable in to_reportables(err) {
        let mut writer = String::new();
        reporter
            .render_report(&mut writer, &reportable)
            .expect("Writing to String buffer is infallible");
        error!("{writer}");
    }

    let code = err.exit_code();
    debug!(code; "Exiting after error");
    process::exit(code);
}

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level(&args))
        .init();
    debug!(args:?; "Parsed arguments");

    if let Err(err) = stu_cli::run(&args) {
        fail(&err);
    }

    info!(input = args.input.as_deref().unwrap_or("-"); "Build script is valid");
}
