//! stagehand - prepare the sandbox environment and launch an application

use clap::Parser;
use console::style;
use stagehand::cli::Cli;
use stagehand::{exec, logging, prepare, LaunchContext};

fn main() {
    let cli = Cli::parse();

    logging::init_logger(cli.verbose);

    let result = LaunchContext::from_env()
        .and_then(|ctx| prepare(&ctx))
        .and_then(|plan| exec(&plan, &cli.binary, &cli.args));

    // exec only returns on failure; a successful launch never gets here.
    let err = match result {
        Err(e) => e,
        Ok(never) => match never {},
    };
    eprintln!("{} {}", style("error:").red().bold(), err);
    std::process::exit(1);
}
