use clap::Parser;

use dotboard::{cli, log_info, logger};

fn main() -> std::process::ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let args = cli::CliArgs::parse();
    log_info!("CLI run with {} input pattern(s)", args.input.len());
    cli::run(args)
}
