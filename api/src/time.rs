//! The ledger's clock.
//!
//! Every `created_at` and `updated_at` column is stamped from a `TimeSource`
//! rather than the database's `now()`. Pending lists and account pages sort
//! newest first on `created_at`, falling back to the transaction id for rows
//! stamped with the same instant.
//!
//! With the `mock-time` feature the clock stands still until it is moved with
//! [`TimeSource::tick`], [`TimeSource::advance`] or [`TimeSource::set`], so a
//! test decides which transactions share an instant and which sort apart.

use jiff::Timestamp;
#[cfg(feature = "mock-time")]
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct TimeSource {
    #[cfg(feature = "mock-time")]
    stamp: Arc<Mutex<Timestamp>>,
}

impl TimeSource {
    #[allow(clippy::new_without_default)]
    #[cfg(not(feature = "mock-time"))]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(feature = "mock-time")]
    pub fn new(start: Timestamp) -> Self {
        Self {
            stamp: Arc::new(Mutex::new(start)),
        }
    }

    /// The instant to stamp on the next ledger write.
    #[cfg(not(feature = "mock-time"))]
    pub fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    #[cfg(feature = "mock-time")]
    pub fn now(&self) -> Timestamp {
        self.with_stamp(|stamp| *stamp)
    }

    /// Move the clock one second forward. Transactions written after a tick
    /// sort strictly after those written before it.
    #[cfg(feature = "mock-time")]
    pub fn tick(&self) {
        self.advance(jiff::Span::new().seconds(1));
    }

    #[cfg(feature = "mock-time")]
    pub fn advance(&self, span: jiff::Span) {
        self.with_stamp(|stamp| *stamp += span);
    }

    #[cfg(feature = "mock-time")]
    pub fn set(&self, time: Timestamp) {
        self.with_stamp(|stamp| *stamp = time);
    }

    // A panic while holding the lock leaves a valid timestamp behind.
    #[cfg(feature = "mock-time")]
    fn with_stamp<R>(&self, f: impl FnOnce(&mut Timestamp) -> R) -> R {
        let mut stamp = self.stamp.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut stamp)
    }
}
