//! Request generations.
//!
//! Every request a view-model issues takes a [`Ticket`]. Issuing a newer ticket
//! or closing the generation makes older tickets stale, and a response holding
//! a stale ticket is dropped instead of being applied.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Request counter shared by one view-model
#[derive(Debug, Default)]
pub struct Generation {
    counter: AtomicU64,
    closed: AtomicBool,
}

/// Proof of which generation a request was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Generation {
    /// Create a generation with no outstanding tickets
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every outstanding ticket
    pub fn issue(&self) -> Ticket {
        Ticket(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Supersede outstanding tickets without starting a request
    pub fn invalidate(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Permanently invalidate all tickets, issued or future
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.invalidate();
    }

    /// True once [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// True if `ticket` is the newest one and the generation is open
    pub fn is_current(&self, ticket: Ticket) -> bool {
        !self.is_closed() && self.counter.load(Ordering::SeqCst) == ticket.0
    }
}
