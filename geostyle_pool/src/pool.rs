// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interning pool for structurally-equal values.
//!
//! A rendering session builds millions of render states, most of them equal to
//! one another. [`RenderPropertyPool`] maps every distinct value to a single
//! shared [`Arc`], so equal states share storage and downstream code can use
//! [`Arc::ptr_eq`] as a "nothing changed" fast path.

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::DefaultHashBuilder;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Hit/miss counters for a [`RenderPropertyPool`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of live entries.
    pub entries: usize,
    /// Interns answered with an existing instance.
    pub hits: u64,
    /// Interns that registered a new instance.
    pub misses: u64,
}

/// Interns values into shared [`Arc`] handles.
///
/// Values are stored once. Lookups use a hash-bucket index (hash -> small list
/// of candidates), and the whole read-check / insert sequence runs under one
/// mutex, so two threads interning equal values always end up with the same
/// instance.
///
/// Pooled values must never change after insertion. The pool only hands out
/// `Arc<T>`, which makes that hold for types without interior mutability; debug
/// builds additionally re-hash every entry on [`clear`](Self::clear).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use geostyle_pool::RenderPropertyPool;
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct Stroke(u32);
///
/// let pool = RenderPropertyPool::new();
/// let a = pool.intern(Stroke(2));
/// let b = pool.intern(Stroke(2));
/// let c = pool.intern(Stroke(3));
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(!Arc::ptr_eq(&a, &c));
/// assert_eq!(pool.len(), 2);
/// ```
pub struct RenderPropertyPool<T> {
    inner: Mutex<PoolInner<T>>,
    build_hasher: DefaultHashBuilder,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct PoolInner<T> {
    buckets: HashMap<u64, SmallVec<[Arc<T>; 1]>>,
    len: usize,
}

impl<T> Default for RenderPropertyPool<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RenderPropertyPool<T>
where
    T: Eq + Hash,
{
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` distinct values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                buckets: HashMap::with_capacity(capacity),
                len: 0,
            }),
            build_hasher: DefaultHashBuilder::default(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the shared instance equal to `candidate`.
    ///
    /// If an equal value was already interned, that instance is returned and
    /// `candidate` is dropped. Otherwise `candidate` is registered and returned.
    pub fn intern(&self, candidate: T) -> Arc<T> {
        let hash = self.hash(&candidate);
        let mut inner = self.lock();

        if let Some(bucket) = inner.buckets.get(&hash)
            && let Some(existing) = bucket.iter().find(|e| ***e == candidate)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(existing);
        }

        let shared = Arc::new(candidate);
        inner
            .buckets
            .entry(hash)
            .or_default()
            .push(Arc::clone(&shared));
        inner.len += 1;
        self.misses.fetch_add(1, Ordering::Relaxed);
        shared
    }

    /// Returns the pooled instance equal to `value`, without inserting.
    #[must_use]
    pub fn get(&self, value: &T) -> Option<Arc<T>> {
        let hash = self.hash(value);
        self.lock()
            .buckets
            .get(&hash)
            .and_then(|bucket| bucket.iter().find(|e| ***e == *value))
            .map(Arc::clone)
    }

    /// Returns `true` if `value` is the pooled instance for its content.
    #[must_use]
    pub fn is_canonical(&self, value: &Arc<T>) -> bool {
        self.get(value).is_some_and(|pooled| Arc::ptr_eq(&pooled, value))
    }

    /// Returns the number of distinct interned values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len
    }

    /// Returns `true` if the pool holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Checks that every entry still hashes to the bucket it was inserted under.
    ///
    /// A `false` result means a pooled value was mutated after insertion.
    #[must_use]
    pub fn verify(&self) -> bool {
        let inner = self.lock();
        inner
            .buckets
            .iter()
            .all(|(hash, bucket)| bucket.iter().all(|e| self.hash(&**e) == *hash))
    }

    /// Drops every entry, for a session reset.
    ///
    /// Instances already handed out stay valid; they are simply no longer
    /// canonical. Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        debug_assert!(self.verify(), "pooled render state was mutated after interning");
        let mut inner = self.lock();
        let removed = inner.len;
        inner.buckets.clear();
        inner.len = 0;
        drop(inner);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        tracing::debug!(removed, "render property pool cleared");
        removed
    }

    fn hash<Q>(&self, value: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.build_hasher.hash_one(value)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for RenderPropertyPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.inner.lock().unwrap_or_else(PoisonError::into_inner).len;
        f.debug_struct("RenderPropertyPool")
            .field("len", &len)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
