//! Append-only contribution buckets carried on phase messages

use super::BusError;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct BucketState<T> {
    items: Vec<T>,
    sealed: bool,
}

/// Ordered, append-only collection that subscribers fill while a message is being
/// delivered.
///
/// The publisher seals the bucket once `publish` returns; later pushes fail with
/// [`BusError::BucketSealed`]. Items keep their push order.
pub struct Bucket<T> {
    name: &'static str,
    state: Mutex<BucketState<T>>,
}

impl<T> Bucket<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(BucketState {
                items: Vec::new(),
                sealed: false,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends a contribution
    pub fn push(&self, item: T) -> Result<(), BusError> {
        let mut state = self.lock();
        if state.sealed {
            return Err(BusError::BucketSealed(self.name));
        }
        state.items.push(item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    /// Closes the bucket to further contributions
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    /// Seals the bucket and moves its contents out
    pub fn drain(&self) -> Vec<T> {
        let mut state = self.lock();
        state.sealed = true;
        std::mem::take(&mut state.items)
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.lock().items.clone()
    }

    /// First contribution, if any
    pub fn first(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().items.first().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BucketState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Bucket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("items", &state.items)
            .field("sealed", &state.sealed)
            .finish()
    }
}
