//! exhauststruct CLI entry point.

use clap::Parser;
use exhauststruct::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    exhauststruct::logging::init(cli.verbose);
    exhauststruct::init();

    let result = match &cli.command {
        Commands::Check(args) => cli::run_check(args),
        Commands::List => cli::run_list(),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
