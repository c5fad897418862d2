// src/signal.rs

//! SIGINT/SIGTERM handling.
//!
//! The handler only sets a flag. The session polls it between records and
//! the blocking reads it is waiting in return `EINTR`, so cancellation takes
//! effect at the next record boundary and the display sink is still dropped
//! (and the terminal restored) on the way out.

use anyhow::{Context, Result};
use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Installs the handler for SIGINT and SIGTERM and returns the flag it sets.
///
/// `SA_RESTART` is left off so a read blocked on the terminal or on stdin
/// returns instead of resuming.
pub fn install_interrupt_handler() -> Result<&'static AtomicBool> {
    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic.
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("failed to install {:?} handler", signal))?;
        debug!("signal: handler installed for {:?}", signal);
    }
    Ok(&INTERRUPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::raise;

    #[test]
    fn sigterm_sets_the_flag() {
        let flag = install_interrupt_handler().expect("install handler");
        raise(Signal::SIGTERM).expect("raise SIGTERM");
        assert!(flag.load(Ordering::SeqCst));
        assert!(std::ptr::eq(flag, &INTERRUPTED));
    }
}
