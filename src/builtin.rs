use crate::banner;
use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Streams};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Builds the command from the words following its name.
    ///
    /// An `Err` carries argh's usage text (for `--help`) or a usage error.
    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit>;

    /// Executes the command using provided output streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, streams: Streams, env: &mut Environment) -> Result<ExitCode> {
        let Streams {
            mut stdout,
            mut stderr,
            ..
        } = streams;
        let result = T::execute(*self, &mut stdout, &mut stderr, env);
        stdout.flush()?;
        match result {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stderr, "minish: {e:#}")?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, streams: Streams, _env: &mut Environment) -> Result<ExitCode> {
        let Streams {
            mut stdout,
            mut stderr,
            ..
        } = streams;
        if self.is_error {
            stderr.write_all(self.output.as_bytes())?;
            Ok(1)
        } else {
            stdout.write_all(self.output.as_bytes())?;
            Ok(0)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::parse(name, args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// Names of the built-in commands in dispatch order.
pub(crate) fn builtin_names() -> [&'static str; 3] {
    [Exit::name(), Cd::name(), Help::name()]
}

/// Factories for every builtin, in the same order as [`builtin_names`].
pub(crate) fn builtin_factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Help>::default()),
    ]
}

#[derive(FromArgs)]
/// Leave the shell. Any arguments are ignored.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn parse(_name: &str, _args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Exit {})
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    /// The first word is the target, taken verbatim even when it starts with `-`.
    /// Further words are ignored. A leading `--help` shows the usage unless a
    /// directory of that name exists.
    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        match args.first() {
            Some(&"--help") if !Path::new("--help").is_dir() => {
                Self::from_args(&[name], &["--help"])
            }
            first => Ok(Cd {
                target: first.map(|t| t.to_string()),
            }),
        }
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let target = match self.target {
            Some(t) => PathBuf::from(t),
            None => return Err(anyhow::anyhow!("expected argument to `cd` command")),
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        env::set_current_dir(&new_dir)
            .with_context(|| format!("failed to change directory to {}", new_dir.display()))?;
        env.current_dir = env::current_dir().unwrap_or(new_dir);
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the welcome banner and the list of built-in commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn parse(_name: &str, _args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Help {})
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        banner::write_help(stdout, &builtin_names())?;
        Ok(0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env as stdenv;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Serializes every test that reads or changes the process working directory.
    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn make_unique_temp_dir(tag: &str) -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("minish_test_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    fn test_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
            should_exit: false,
            child_running: false,
        }
    }

    #[test]
    fn test_exit_sets_flag() {
        let mut env = test_env();
        let res = Exit {}.execute(&mut Vec::new(), &mut Vec::new(), &mut env);
        assert_eq!(res.unwrap(), 0);
        assert!(env.should_exit);
    }

    #[test]
    fn test_exit_accepts_any_arguments() {
        assert!(Exit::parse("exit", &["1", "--force", "-x"]).is_ok());
    }

    #[test]
    fn test_help_accepts_any_arguments() {
        assert!(Help::parse("help", &["me", "-v"]).is_ok());
    }

    #[test]
    fn test_help_prints_banner_and_builtins() {
        let mut env = test_env();
        let mut out = Vec::new();
        let res = Help {}.execute(&mut out, &mut Vec::new(), &mut env);
        assert_eq!(res.unwrap(), 0);
        assert!(!env.should_exit);

        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("- exit\n- cd\n- help\n"));
    }

    #[test]
    fn test_builtin_names_order() {
        assert_eq!(builtin_names(), ["exit", "cd", "help"]);
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_abs").expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env();

        let cmd = Cd {
            target: Some(canonical_temp.to_string_lossy().to_string()),
        };
        let res = cmd.execute(&mut Vec::new(), &mut Vec::new(), &mut env);

        assert!(res.is_ok());
        let new_canonical = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_canonical, canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);
        assert!(!env.should_exit);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_to_quoted_name_with_space() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_space").expect("failed to create temp dir");
        let docs = temp.join("My Documents");
        fs::create_dir_all(&docs).unwrap();
        let canonical_docs = fs::canonicalize(&docs).unwrap();
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env();
        env.current_dir = fs::canonicalize(&temp).unwrap();

        let cmd = Cd {
            target: Some("My Documents".to_string()),
        };
        let res = cmd.execute(&mut Vec::new(), &mut Vec::new(), &mut env);

        assert!(res.is_ok());
        assert_eq!(
            fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(),
            canonical_docs
        );

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_parse_uses_only_first_word() {
        let cmd = Cd::parse("cd", &["/tmp", "ignored", "--help"]).ok().unwrap();
        assert_eq!(cmd.target.as_deref(), Some("/tmp"));

        let cmd = Cd::parse("cd", &[]).ok().unwrap();
        assert_eq!(cmd.target, None);
    }

    #[test]
    fn test_cd_parse_keeps_dash_prefixed_target() {
        let cmd = Cd::parse("cd", &["-foo"]).ok().unwrap();
        assert_eq!(cmd.target.as_deref(), Some("-foo"));

        let cmd = Cd::parse("cd", &["--", "x"]).ok().unwrap();
        assert_eq!(cmd.target.as_deref(), Some("--"));
    }

    #[test]
    fn test_cd_help_prints_usage() {
        let _lock = lock_current_dir();
        let early = match Cd::parse("cd", &["--help"]) {
            Ok(_) => panic!("expected usage output"),
            Err(early) => early,
        };
        assert!(early.status.is_ok());
        assert!(early.output.contains("Usage: cd"));
    }

    #[test]
    fn test_cd_help_does_not_shadow_directory() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = make_unique_temp_dir("cd_help_dir").expect("failed to create temp dir");
        fs::create_dir_all(temp.join("--help")).unwrap();
        stdenv::set_current_dir(&temp).unwrap();

        let parsed = Cd::parse("cd", &["--help"]);

        stdenv::set_current_dir(&orig).expect("failed to restore cwd");
        assert_eq!(parsed.ok().unwrap().target.as_deref(), Some("--help"));
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_into_dash_prefixed_directory() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_dash").expect("failed to create temp dir");
        let dash = temp.join("-foo");
        fs::create_dir_all(&dash).unwrap();
        let canonical_dash = fs::canonicalize(&dash).unwrap();
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env();
        env.current_dir = fs::canonicalize(&temp).unwrap();

        let cmd = Cd::parse("cd", &["-foo"]).ok().unwrap();
        let res = cmd.execute(&mut Vec::new(), &mut Vec::new(), &mut env);

        assert!(res.is_ok());
        assert_eq!(env.current_dir, canonical_dash);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_without_argument_is_usage_error() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env();

        let cmd = Cd { target: None };
        let err = cmd
            .execute(&mut Vec::new(), &mut Vec::new(), &mut env)
            .unwrap_err();

        assert!(err.to_string().contains("expected argument to `cd`"));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env();

        let name = format!("nonexistent_dir_for_minish_test_{}", std::process::id());
        let cmd = Cd { target: Some(name) };
        let res = cmd.execute(&mut Vec::new(), &mut Vec::new(), &mut env);

        assert!(res.is_err());
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, orig);
    }

    #[test]
    fn test_errors_are_reported_on_stderr_with_prefix() {
        use crate::io_adapters::{MemReader, MemWriter};

        let _lock = lock_current_dir();
        let mut env = test_env();
        let (out, out_buf) = MemWriter::with_handle();
        let (err, err_buf) = MemWriter::with_handle();
        let streams = Streams {
            stdin: Box::new(MemReader::new(Vec::new())),
            stdout: Box::new(out),
            stderr: Box::new(err),
        };

        let cmd: Box<dyn ExecutableCommand> = Box::new(Cd { target: None });
        let code = cmd.execute(streams, &mut env).unwrap();

        assert_eq!(code, 1);
        assert!(out_buf.borrow().is_empty());
        let msg = String::from_utf8(err_buf.borrow().clone()).unwrap();
        assert_eq!(msg, "minish: expected argument to `cd` command\n");
    }

    #[test]
    fn test_factory_matches_exact_case_sensitive_name() {
        let env = test_env();
        let factory = Factory::<Cd>::default();
        assert!(factory.try_create(&env, "cd", &["/"]).is_some());
        assert!(factory.try_create(&env, "CD", &["/"]).is_none());
        assert!(factory.try_create(&env, "cdx", &[]).is_none());
    }
}
