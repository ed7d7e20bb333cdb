//! Last-known-good reading, kept across read attempts.

use crate::Reading;

/// A single persistent slot holding the most recent validated [`Reading`].
///
/// Starts unset and is only ever overwritten by a successful read; it is
/// never cleared. The caller owns it and passes it into
/// [`Dht22::read`](crate::Dht22::read), which keeps the fallback behavior
/// testable without hardware and leaves the storage decision (static cell,
/// task-local, whatever) to the application. Not a history and not
/// concurrency-safe on its own: reads against one sensor line cannot
/// overlap anyway, and the cache is only touched between them.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingCache {
    last: Option<Reading>,
}

impl ReadingCache {
    /// An empty cache; distinguishable from every physically possible
    /// reading, unlike a sentinel value.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// The last validated reading, if any read has ever succeeded.
    pub fn get(&self) -> Option<Reading> {
        self.last
    }

    /// Overwrite the slot unconditionally.
    pub fn put(&mut self, reading: Reading) {
        self.last = Some(reading);
    }
}
