// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crypto::ibe::UserSecretKey;
use crypto::ObjectId;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Cache for verified user secret keys, keyed by the full id and the key
/// server holding the corresponding master key. The full id is stored in hex
/// for stable string equality. Keys must only be inserted after verification
/// against the server's public key.
pub(crate) struct KeyCache {
    inner: Mutex<LruCache<(String, ObjectId), UserSecretKey>>,
}

impl KeyCache {
    /// Create a new cache with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is 0.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("capacity must be greater than 0");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, full_id: &[u8], server: &ObjectId) -> Option<UserSecretKey> {
        let mut cache = self.inner.lock();
        cache.get(&(hex::encode(full_id), *server)).copied()
    }

    pub fn contains(&self, full_id: &[u8], server: &ObjectId) -> bool {
        self.get(full_id, server).is_some()
    }

    pub fn insert(&self, full_id: &[u8], server: ObjectId, key: UserSecretKey) {
        let mut cache = self.inner.lock();
        cache.put((hex::encode(full_id), server), key);
    }
}
