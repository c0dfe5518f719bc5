//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.  Each one is a thin front
//! end over the library: parse the arguments, wire a parser to a sink,
//! report the outcome through the process exit status.

pub mod copy;
pub mod stats;
pub mod ascii;
pub mod convert;
pub mod print;
pub mod completions;

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("Command could not be interpreted")]
    InvalidCommand,
    #[error("One of the parameters was out of range")]
    OutOfRange
}
