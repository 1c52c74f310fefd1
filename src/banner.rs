use std::io::{self, Write};

/// Printed on startup and by the `help` builtin.
pub const LOGO: &str = r"Welcome to
           _       _     _
 _ __ ___ (_)_ __ (_)___| |__
| '_ ` _ \| | '_ \| / __| '_ \
| | | | | | | | | | \__ \ | | |
|_| |_| |_|_|_| |_|_|___/_| |_|

A minimal interactive shell
";

const USAGE: &str = "Type the program name and arguments and hit enter to start a program.
Single-quotes and double-quotes group words into one argument (e.g. cd 'some dir').
";

/// Writes the logo, the usage hints and the list of built-in commands.
pub fn write_help(out: &mut dyn Write, builtins: &[&str]) -> io::Result<()> {
    writeln!(out, "{LOGO}")?;
    writeln!(out, "{USAGE}")?;
    writeln!(out, "The following built-in commands are supported:")?;
    for name in builtins {
        writeln!(out, "- {name}")?;
    }
    writeln!(out)
}
