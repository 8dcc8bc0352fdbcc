//! Process-wide signal disposition for the interpreter and its children.
//!
//! The interpreter ignores `SIGINT` so that an interactive interrupt only
//! reaches the foreground program, and asks not to be notified when a child
//! is merely stopped. Both dispositions are inherited across `fork`, so every
//! child puts `SIGINT` back to its default before replacing its image.

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use super::error::Error;

pub struct SignalPolicy {
    child_state: SigAction,
    interrupt: SigAction,
}

impl SignalPolicy {
    /// The dispositions the interpreter runs under for its whole lifetime.
    pub fn interpreter() -> Self {
        SignalPolicy {
            child_state: SigAction::new(SigHandler::SigDfl, SaFlags::SA_NOCLDSTOP, SigSet::empty()),
            interrupt: SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty()),
        }
    }

    /// Installs both dispositions. Called once, before the first command.
    pub fn install(&self) -> Result<(), Error> {
        unsafe {
            sigaction(Signal::SIGCHLD, &self.child_state).map_err(Error::Signal)?;
            sigaction(Signal::SIGINT, &self.interrupt).map_err(Error::Signal)?;
        }
        debug!("installed interpreter signal policy");
        Ok(())
    }
}

/// Puts `SIGINT` back to default-terminate. Runs in a freshly forked child,
/// so it must stay async-signal-safe: no allocation, no logging.
pub fn restore_default_interrupt() -> nix::Result<()> {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::SA_RESTART, SigSet::empty());
    unsafe { sigaction(Signal::SIGINT, &default) }.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_policy_ignores_interrupts() {
        let policy = SignalPolicy::interpreter();
        policy.install().unwrap();
        let previous = unsafe { sigaction(Signal::SIGINT, &policy.interrupt) }.unwrap();
        assert_eq!(previous.handler(), SigHandler::SigIgn);
    }

    #[test]
    fn child_state_notifications_skip_stops() {
        let policy = SignalPolicy::interpreter();
        policy.install().unwrap();
        let previous = unsafe { sigaction(Signal::SIGCHLD, &policy.child_state) }.unwrap();
        assert_eq!(previous.handler(), SigHandler::SigDfl);
        assert!(previous.flags().contains(SaFlags::SA_NOCLDSTOP));
    }
}
