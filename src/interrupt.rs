//! Cooperative cancellation of a running chain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable stop flag.
///
/// The engine polls it once per proposal, before the proposal starts, so a
/// request made while a proposal is in flight takes effect once that proposal
/// and any flush it triggers have completed. Typical use is to hand a clone to
/// a signal handler:
///
/// ```rust
/// use hmc_tomography::interrupt::Interrupt;
///
/// let interrupt = Interrupt::new();
/// let handle = interrupt.clone();
/// std::thread::spawn(move || handle.trigger()).join().unwrap();
/// assert!(interrupt.is_triggered());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the run to stop at the next proposal boundary.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears a previous request so the token can be reused for another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
