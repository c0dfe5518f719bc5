//! # Command Line Interface
//!
//! Dispatch commands to `commands` module.

use env_logger;
use lytkit::commands;
mod cli;

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let main_cmd = cli::build_cli();
    let matches = main_cmd.get_matches();

    // Record-level copy

    if let Some(cmd) = matches.subcommand_matches("copy") {
        return commands::copy::copy(cmd);
    }

    // List the structures

    if let Some(cmd) = matches.subcommand_matches("cells") {
        return commands::stats::cells(cmd);
    }

    // Structure reference graph

    if let Some(cmd) = matches.subcommand_matches("dot") {
        return commands::stats::dot(cmd);
    }

    // Record statistics

    if let Some(cmd) = matches.subcommand_matches("recstats") {
        return commands::stats::recstats(cmd);
    }

    // Text form

    if let Some(cmd) = matches.subcommand_matches("gds2ascii") {
        return commands::ascii::gds2ascii(cmd);
    }

    if let Some(cmd) = matches.subcommand_matches("ascii2gds") {
        return commands::ascii::ascii2gds(cmd);
    }

    // Cross-format conversion

    if let Some(cmd) = matches.subcommand_matches("gds2oasis") {
        return commands::convert::gds2oasis(cmd);
    }

    if let Some(cmd) = matches.subcommand_matches("oasis2gds") {
        return commands::convert::oasis2gds(cmd);
    }

    // OASIS inspection

    if let Some(cmd) = matches.subcommand_matches("print") {
        return commands::print::print(cmd);
    }

    if let Some(cmd) = matches.subcommand_matches("validate") {
        return commands::print::validate(cmd);
    }

    // Completions

    if let Some(cmd) = matches.subcommand_matches("completions") {
        return commands::completions::generate(cli::build_cli(),cmd);
    }

    eprintln!("No subcommand was found, try `lytkit --help`");
    std::process::exit(1);
}
