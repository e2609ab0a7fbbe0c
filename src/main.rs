use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskman::cli::Cli;
use taskman::cmd::{execute, Commands};
use taskman::config::Config;
use taskman::format::TaskFormatter;
use taskman::shell::run_shell;
use taskman::{TaskService, TaskStore};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::resolve(cli.db, cli.no_color, cli.verbose);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(config.color)
        .with_writer(io::stderr)
        .init();

    info!(db = %config.db_path.display(), "Starting task manager");
    let fmt = TaskFormatter::new(config.color);
    let mut service = TaskService::new(TaskStore::load(&config.db_path));

    let result = match cli.command {
        None | Some(Commands::Shell) => run_shell(&mut service, &fmt, io::stdin().lock(), &mut io::stdout().lock()),
        Some(command) => {
            let mut out = io::stdout().lock();
            execute(command, &mut service, &fmt, &mut out).and_then(|()| out.flush().map_err(Into::into))
        }
    };

    info!(tasks = service.read_available_tasks().len(), "Shutting down");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", fmt.error(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}
