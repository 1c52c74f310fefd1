//! Interrupt (SIGINT) handling.
//!
//! The installed handler does nothing but record that an interrupt arrived. The
//! shell consumes that record right after waiting for a foreground child, when a
//! blocked read of piped input fails with `EINTR`, and at the input boundary before
//! reading the next line. All output in response to an interrupt is produced there,
//! on the main thread, via [`announce`].
//!
//! While the line editor owns the terminal, Ctrl-C does not raise SIGINT at all;
//! the editor reports it as an interrupted read instead, and the loop calls
//! [`announce`] for that case too.

use crate::env::Environment;
use anyhow::{Context, Result};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Hint printed when the user interrupts the shell while no child is running.
pub const EXIT_HINT: &str = "To exit minish type 'exit'.";

// Written only by `on_sigint`, drained only by `take_pending`.
static PENDING: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_signum: nix::libc::c_int) {
    PENDING.store(true, Ordering::SeqCst);
}

/// Catches SIGINT for the rest of the process lifetime.
///
/// Blocking reads are not restarted, so a read of piped input returns as soon as
/// the signal lands. Children started afterwards get the default disposition back
/// when they exec, so Ctrl-C still stops them.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler only performs an atomic store, which is async-signal-safe.
    let previous = unsafe { sigaction(Signal::SIGINT, &action) };
    previous.context("failed to install SIGINT handler")?;
    tracing::debug!("SIGINT handler installed");
    Ok(())
}

/// Returns whether an interrupt arrived since the last call, and clears the record.
pub fn take_pending() -> bool {
    PENDING.swap(false, Ordering::SeqCst)
}

/// Writes the response to an interrupt.
///
/// With a foreground child running the child deals with the signal itself and the
/// shell only moves to a fresh line. Otherwise the user is reminded how to leave.
pub fn announce(env: &Environment, out: &mut dyn Write) -> io::Result<()> {
    if env.child_running {
        writeln!(out)?;
    } else {
        writeln!(out)?;
        writeln!(out, "{EXIT_HINT}")?;
    }
    out.flush()
}
