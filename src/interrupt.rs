// src/interrupt.rs

//! SIGINT/SIGTERM handling
//!
//! The handler only sets a flag. The resolver checks it between nodes and
//! the installer checks it before each invocation, so an interrupt during
//! resolution never reaches either package manager.

use crate::error::{Error, Result};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the handler for SIGINT and SIGTERM
pub fn install_handler() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only touches an atomic, which is async-signal-safe.
        unsafe { sigaction(signal, &action) }.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to install {signal} handler: {e}"
            )))
        })?;
    }
    Ok(())
}

/// Whether an interrupt has been received
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Return `Error::Interrupted` if an interrupt has been received
pub fn check(is_interrupted: fn() -> bool) -> Result<()> {
    if is_interrupted() {
        Err(Error::Interrupted)
    } else {
        Ok(())
    }
}
