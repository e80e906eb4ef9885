use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::Fetch(args) => commands::fetch::execute(args),
        cli::Command::Inspect(args) => commands::inspect::execute(args),
        cli::Command::Extract(args) => commands::extract::execute(args),
        cli::Command::Defaults(args) => commands::defaults::execute(args),
    };

    std::process::exit(exit_code);
}
