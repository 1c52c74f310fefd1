use crate::env::Environment;
use anyhow::Result;
use std::io::{Read, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// The shell never feeds this value back into its own control flow.
pub type ExitCode = i32;

/// What the read loop should do after a command line has been run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep prompting for input.
    Continue,
    /// Leave the loop and terminate the shell successfully.
    Stop,
}

/// Abstraction over a readable input stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// A blanket implementation exists for any type that implements `Read` and `Into<Stdio>`.
pub trait Stdin: Read {
    /// Convert this input into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Read + Into<Stdio>> Stdin for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Abstraction over a writable output stream that can also hand out a
/// [`Stdio`] handle for spawning external processes.
///
/// The stream stays usable after a handle was taken, so the shell can keep writing
/// to it once the child is done.
pub trait Stdout: Write {
    /// A [`Stdio`] handle suitable for `std::process::Command` that targets this output.
    fn stdio(&mut self) -> Stdio;
}

impl Stdout for std::io::Stdout {
    fn stdio(&mut self) -> Stdio {
        Stdio::inherit()
    }
}

impl Stdout for std::io::Stderr {
    fn stdio(&mut self) -> Stdio {
        Stdio::inherit()
    }
}

/// The three standard streams handed to a command for one invocation.
pub struct Streams {
    pub stdin: Box<dyn Stdin>,
    pub stdout: Box<dyn Stdout>,
    pub stderr: Box<dyn Stdout>,
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
/// Errors returned from `execute` are recoverable: the caller reports them and
/// keeps reading input.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(self: Box<Self>, streams: Streams, env: &mut Environment) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
