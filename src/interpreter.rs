use crate::command::{CommandFactory, ExitCode, Flow};
use crate::env::Environment;
use crate::input::{LineSource, ReadEvent};
use crate::io_adapters::{InheritedStreams, StreamProvider};
use crate::lexer;
use crate::prompt::Prompt;
use crate::signals;
use std::io::Write;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal interactive shell that can execute built-in and external commands.
///
/// The interpreter maintains an [`Environment`], the [`Prompt`] state and a list of
/// [`CommandFactory`] objects that are queried in order to create commands by name.
/// See [`Default`] for the factories included out of the box.
///
/// Example
/// ```
/// use minish::{Flow, Interpreter};
/// use minish::io_adapters::CapturedStreams;
///
/// let out = CapturedStreams::new();
/// let mut sh = Interpreter::default().with_streams(out.clone());
/// assert_eq!(sh.run_line("help").unwrap(), Flow::Continue);
/// assert!(out.stdout_text().contains("- exit"));
/// assert_eq!(sh.run_line("exit").unwrap(), Flow::Stop);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    prompt: Prompt,
    io: Box<dyn StreamProvider>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
            prompt: Prompt::new(),
            io: Box::new(InheritedStreams),
        }
    }

    /// Replace the standard streams handed to commands and used for diagnostics.
    pub fn with_streams(mut self, io: impl StreamProvider + 'static) -> Self {
        self.io = Box::new(io);
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code or an error if the command cannot be created
    /// or fails to execute.
    pub fn run(&mut self, name: &str, args: &[&str]) -> anyhow::Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                tracing::debug!(name, ?args, "dispatching command");
                return cmd.execute(self.io.streams(), &mut self.env);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// Run an already tokenized command line.
    ///
    /// An empty token list does nothing. Failures of the command are reported on
    /// stderr and do not stop the shell; the exit code of the command is dropped.
    pub fn run_tokens(&mut self, tokens: &[String]) -> anyhow::Result<Flow> {
        let Some((name, rest)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        match self.run(name, &args) {
            Ok(code) => tracing::debug!(name = name.as_str(), code, "command finished"),
            Err(e) => writeln!(self.io.streams().stderr, "minish: {e:#}")?,
        }

        if self.env.should_exit {
            Ok(Flow::Stop)
        } else {
            Ok(Flow::Continue)
        }
    }

    /// Tokenize and run one raw input line.
    ///
    /// A line with an unterminated quote is rejected with a diagnostic and nothing runs.
    pub fn run_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        match lexer::split_into_tokens(line) {
            Ok(tokens) => self.run_tokens(&tokens),
            Err(e) => {
                tracing::debug!(line, "rejected line: {e}");
                writeln!(self.io.streams().stderr, "minish: {e}")?;
                Ok(Flow::Continue)
            }
        }
    }

    /// The Read-Eval-Print Loop.
    ///
    /// Returns `Ok(())` when the `exit` builtin runs or the input ends. Errors are
    /// fatal: the working directory could not be determined for the prompt, or the
    /// input could not be read.
    pub fn repl(&mut self, input: &mut dyn LineSource) -> anyhow::Result<()> {
        loop {
            if signals::take_pending() {
                self.interrupted()?;
            }

            let prompt = self.prompt.render()?.unwrap_or_default();
            match input.read_line(&prompt)? {
                ReadEvent::Line(line) => {
                    self.prompt.invalidate();
                    if self.run_line(&line)? == Flow::Stop {
                        tracing::debug!("exit requested");
                        return Ok(());
                    }
                }
                ReadEvent::Interrupted => self.interrupted()?,
                ReadEvent::Eof => {
                    tracing::debug!("end of input");
                    return Ok(());
                }
            }
        }
    }

    fn interrupted(&mut self) -> anyhow::Result<()> {
        tracing::debug!(child_running = self.env.child_running, "interrupt");
        signals::announce(&self.env, &mut self.io.streams().stdout)?;
        self.prompt.invalidate();
        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `exit`, `cd`, `help`
    /// - external command launcher
    fn default() -> Self {
        use crate::builtin::builtin_factories;
        use crate::external::ExternalCommand;
        let mut commands = builtin_factories();
        commands.push(Box::new(Factory::<ExternalCommand>::default()));
        Self::new(commands)
    }
}
