//! Kernel cache implementation
//!
//! Provides a bounded LRU store of partial Q-matrix rows so the solver does not
//! recompute kernel values it has already seen. Each training example owns one
//! slot holding the prefix `[0, len)` of its row. Slots with cached data are
//! linked into a ring ordered by recency; the least recently used slot sits
//! right after the sentinel.
//!
//! Rows are keyed by the solver's *current* position of an example, so the
//! solver must report every position swap through [`KernelCache::swap_index`].

use crate::core::{Result, SVMError};
use std::mem;

#[derive(Debug, Clone, Default)]
struct Slot {
    /// Cached values `[0, data.len())` of this row
    data: Vec<f32>,
    prev: usize,
    next: usize,
}

/// LRU cache of kernel matrix rows with a budget counted in cached values
pub struct KernelCache {
    /// One slot per example plus the ring sentinel at the last index
    slots: Vec<Slot>,
    budget: usize,
    available: usize,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache for `l` rows holding at most `budget` values in total
    pub fn new(l: usize, budget: usize) -> Self {
        let mut slots = vec![Slot::default(); l + 1];
        slots[l].prev = l;
        slots[l].next = l;
        Self {
            slots,
            budget,
            available: budget,
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache whose values fit in `memory_bytes`
    pub fn with_memory_limit(l: usize, memory_bytes: usize) -> Self {
        Self::new(l, memory_bytes / mem::size_of::<f32>())
    }

    fn head(&self) -> usize {
        self.slots.len() - 1
    }

    fn lru_delete(&mut self, h: usize) {
        let (prev, next) = (self.slots[h].prev, self.slots[h].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    fn lru_insert(&mut self, h: usize) {
        let head = self.head();
        let prev = self.slots[head].prev;
        self.slots[h].next = head;
        self.slots[h].prev = prev;
        self.slots[prev].next = h;
        self.slots[head].prev = h;
    }

    /// Drop the cached data of slot `h`, which must currently be linked
    fn evict(&mut self, h: usize) {
        self.lru_delete(h);
        self.available += self.slots[h].data.len();
        self.slots[h].data = Vec::new();
    }

    /// Request the first `len` values of row `index`.
    ///
    /// Returns the row buffer and the position `start` from which the caller
    /// must fill it; `start == len` means everything was already cached. The
    /// row becomes the most recently used one. Least recently used rows are
    /// evicted when the budget would be exceeded.
    ///
    /// # Errors
    /// `InvalidParameter` if `len` alone exceeds the whole budget.
    pub fn get(&mut self, index: usize, len: usize) -> Result<(&mut [f32], usize)> {
        if len > self.budget {
            return Err(SVMError::InvalidParameter(format!(
                "kernel cache holds {} values, cannot cache a row of {len}",
                self.budget
            )));
        }

        let cached = self.slots[index].data.len();
        if cached > 0 {
            self.lru_delete(index);
        }

        let start = if len > cached {
            let more = len - cached;
            while self.available < more {
                let old = self.slots[self.head()].next;
                if old == self.head() {
                    return Err(SVMError::InvalidParameter(
                        "kernel cache accounting is inconsistent".to_string(),
                    ));
                }
                self.evict(old);
            }
            self.slots[index].data.resize(len, 0.0);
            self.available -= more;
            self.misses += 1;
            cached
        } else {
            self.hits += 1;
            len
        };

        if !self.slots[index].data.is_empty() {
            self.lru_insert(index);
        }

        Ok((&mut self.slots[index].data[..len], start))
    }

    /// Exchange positions `i` and `j` in every cached row.
    ///
    /// The two rows trade their data. Any other row that covers both columns
    /// has them swapped; a row covering only the smaller column is cut back to
    /// the prefix that is still valid.
    pub fn swap_index(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }

        if !self.slots[i].data.is_empty() {
            self.lru_delete(i);
        }
        if !self.slots[j].data.is_empty() {
            self.lru_delete(j);
        }
        let data_i = mem::take(&mut self.slots[i].data);
        self.slots[i].data = mem::replace(&mut self.slots[j].data, data_i);
        if !self.slots[i].data.is_empty() {
            self.lru_insert(i);
        }
        if !self.slots[j].data.is_empty() {
            self.lru_insert(j);
        }

        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let head = self.head();
        let mut h = self.slots[head].next;
        while h != head {
            let next = self.slots[h].next;
            let len = self.slots[h].data.len();
            if len > hi {
                self.slots[h].data.swap(lo, hi);
            } else if len > lo {
                if lo == 0 {
                    self.evict(h);
                } else {
                    let data = &mut self.slots[h].data;
                    data.truncate(lo);
                    data.shrink_to_fit();
                    self.available += len - lo;
                }
            }
            h = next;
        }
    }

    /// Number of values currently cached for row `index`
    pub fn cached_len(&self, index: usize) -> usize {
        self.slots[index].data.len()
    }

    /// Total number of cached values across all rows
    pub fn used(&self) -> usize {
        self.budget - self.available
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        self.stats().hit_rate()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            budget: self.budget,
            used: self.used(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Maximum number of cached values
    pub budget: usize,
    /// Number of values currently cached
    pub used: usize,
}

impl CacheStats {
    /// Fraction of requests served without computing new values
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
