//! Fixed-capacity reservoir sampling.

use crate::random::SyncRandom;

/// Collects at most `N` items from a stream. Once full, each new item
/// overwrites a uniformly chosen slot.
#[derive(Debug, Clone)]
pub struct ReservoirSample<T, const N: usize> {
    items: Vec<T>,
}

impl<T: Copy, const N: usize> ReservoirSample<T, N> {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(N),
        }
    }

    pub fn offer(&mut self, item: T, rng: &mut SyncRandom) {
        if self.items.len() < N {
            self.items.push(item);
        } else if N > 0 {
            let slot = rng.pick_index(N);
            self.items[slot] = item;
        }
    }

    /// A uniformly chosen entry, or `None` when empty.
    pub fn choose(&self, rng: &mut SyncRandom) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[rng.pick_index(self.items.len())])
    }

    /// Drop every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Copy, const N: usize> Default for ReservoirSample<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
