//! SIGTERM/SIGINT handling for an in-progress sweep.
//!
//! Uses the `signal-hook` crate (behind the `signals` feature) to flip a
//! shared flag. The dispatcher polls the flag before starting each deletion,
//! and the pipeline polls it between repositories.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe interruption state shared between the signal handler, the
/// pipeline, and the delete workers.
///
/// The flag uses `Ordering::Relaxed`: it is polled repeatedly and carries no
/// data that other threads need to observe in order.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a signal and register OS hooks for SIGTERM and SIGINT.
    ///
    /// Registration is best-effort; failures are reported on stderr but not fatal.
    pub fn install() -> Self {
        let signal = Self::detached();
        signal.register();
        signal
    }

    /// Create a signal with no OS hooks (tests, library callers).
    pub fn detached() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether an interruption has been requested.
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Programmatically request interruption.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[cfg(feature = "signals")]
    fn register(&self) {
        use signal_hook::consts::{SIGINT, SIGTERM};

        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.flag)) {
            eprintln!("[ASW-SIGNAL] failed to register SIGTERM: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.flag)) {
            eprintln!("[ASW-SIGNAL] failed to register SIGINT: {e}");
        }
    }

    #[cfg(not(feature = "signals"))]
    fn register(&self) {}
}
