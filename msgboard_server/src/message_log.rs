use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(test)]
use mockall::automock;

use msgboard_common::MessageEntry;

/// Storage seam for registered messages.
///
/// Implementations must make `append` and `snapshot` atomic with respect to
/// each other: no lost entries, no torn reads.
#[cfg_attr(test, automock)]
pub trait MessageStore {
    /// Stores `entry` at the end of the log and returns the new length.
    fn append(&self, entry: MessageEntry) -> usize;
    /// A copy of every entry stored so far, in arrival order.
    fn snapshot(&self) -> Vec<MessageEntry>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The shared, append-only message log. Cloning yields another handle to the
/// same log.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Arc<Mutex<Vec<MessageEntry>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are pushed whole under the lock, so a panic elsewhere can never
    // leave a partial write behind; the poisoned data is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<MessageEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageStore for MessageLog {
    fn append(&self, entry: MessageEntry) -> usize {
        let mut entries = self.lock();
        entries.push(entry);
        entries.len()
    }

    fn snapshot(&self) -> Vec<MessageEntry> {
        self.lock().clone()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
