#![warn(clippy::all)]

mod app;
mod database;
mod services;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, trace, trace_span};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use crate::app::cli::Cli;
use crate::app::config::Config;
use crate::app::error::AppError;
use crate::database::connection::establish_pooled_connection;
use crate::database::pg_store::PgStore;

fn main() -> ExitCode {
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let subscriber = Registry::default()
        .with(stderr_log)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing::subscriber::set_global_default(subscriber).expect("Unable to set global subscriber");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let span = trace_span!("starting main");
    let _guard = span.enter();

    let config = Config::load()?;

    trace!("Establishing pooled connection");
    let pool = establish_pooled_connection(&config)?;
    let store = PgStore::new(pool);

    cli.execute(&store, &config, &mut std::io::stdout().lock())
}
