use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::bucket::Bucket;
use crate::config::PoolConfig;

/// Keyed collection of token buckets, one per distinct key, created on first use.
///
/// Clones share the same buckets. Established keys are served under a shard read
/// guard plus the bucket's own lock; only first use of a key takes a shard write
/// lock, held across the check-and-create step.
#[derive(Debug, Clone)]
pub struct Pool<K = String>
where
    K: Eq + Hash,
{
    buckets: Arc<DashMap<K, Bucket, RandomState>>,
    config: PoolConfig,
}

impl<K> Default for Pool<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Pool<K>
where
    K: Eq + Hash,
{
    /// Empty pool using the default bucket config.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Empty pool whose buckets all start from `config`.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            buckets: Arc::new(DashMap::with_hasher(RandomState::new())),
            config,
        }
    }

    /// Config applied to buckets created by [`Pool::allow`].
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Token count for `key`, including refill earned so far. Read-only, and never
    /// creates a bucket.
    pub fn tokens<Q>(&self, key: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.get(key).map(|bucket| bucket.tokens())
    }

    /// Whether `key` already has a bucket.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.contains_key(key)
    }

    /// Number of keys with a bucket.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no key has a bucket yet.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<K> Pool<K>
where
    K: Eq + Hash + Debug,
{
    /// Admission check for `key`, creating its bucket from the pool config if needed.
    pub fn allow<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(bucket) = self.buckets.get(key) {
            return self.admit(key, &bucket);
        }

        let bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| {
                tracing::debug!(key = ?key, config = ?self.config, "creating bucket");
                Bucket::new(self.config)
            })
            .downgrade();
        self.admit(key, &bucket)
    }

    /// Installs a bucket with its own config for `key`, unless one already exists.
    ///
    /// Returns `false` and leaves the existing bucket untouched if `key` was taken.
    pub fn seed(&self, key: K, config: PoolConfig) -> bool {
        match self.buckets.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                tracing::debug!(key = ?slot.key(), config = ?config, "seeding bucket");
                slot.insert(Bucket::new(config));
                true
            }
        }
    }

    fn admit<Q>(&self, key: &Q, bucket: &Bucket) -> bool
    where
        Q: Debug + ?Sized,
    {
        let allowed = bucket.allow();
        if !allowed {
            tracing::trace!(key = ?key, "rate limited");
        }
        allowed
    }
}
