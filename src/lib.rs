//! A minimal interactive command shell.
//!
//! The shell reads a line, splits it into words (single and double quotes group
//! words into one argument), runs one of the built-in commands `exit`, `cd` and
//! `help`, or otherwise starts the named program and waits for it. There are no
//! pipelines, redirections, background jobs or variable expansion.
//!
//! The main entry point is [`Interpreter`]. Lines come from a [`input::LineSource`]:
//! the `rustyline` editor when interactive, a plain line reader for piped input, or
//! a scripted source when embedding or testing. The public modules [`command`] and [`env`] expose the traits and types
//! for implementing your own commands.

pub mod banner;
mod builtin;
pub mod command;
pub mod env;
mod external;
pub mod input;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod prompt;
pub mod signals;

pub use command::Flow;
pub use interpreter::Interpreter;

/// Names of the built-in commands, in the order they are looked up.
pub fn builtin_names() -> [&'static str; 3] {
    builtin::builtin_names()
}
