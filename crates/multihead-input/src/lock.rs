//! Coarse exclusive access to the host event queue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Whether to take the [`InputLock`] around queue mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Block {
    #[default]
    No,
    Yes,
}

impl From<bool> for Block {
    fn from(block: bool) -> Self {
        if block {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// Lock shared with the host's own event-processing thread.
///
/// Only queue mutation is guarded; coordinate math happens outside it.
#[derive(Debug, Clone, Default)]
pub struct InputLock(Arc<Mutex<()>>);

impl InputLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock if `block` asks for it. The guard releases on drop.
    pub fn acquire(&self, block: Block) -> Option<MutexGuard<'_, ()>> {
        match block {
            Block::Yes => Some(self.0.lock().unwrap_or_else(PoisonError::into_inner)),
            Block::No => None,
        }
    }

    /// Whether someone currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.0.try_lock().is_err()
    }
}
