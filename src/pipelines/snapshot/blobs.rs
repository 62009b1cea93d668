// SPDX-License-Identifier: GPL-3.0-only

//! Registry of encoded image blobs
//!
//! A snapshot only holds a [`BlobId`]; the bytes live in a registry until
//! the id is revoked. Revoking releases the bytes, and a revoked id can
//! never be resolved again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Handle to registered image data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId(Uuid);

impl BlobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// Storage for encoded image data addressed by [`BlobId`]
pub trait BlobRegistry: Send + Sync {
    /// Take ownership of `data` and return its handle
    fn register(&self, data: Vec<u8>) -> BlobId;

    /// Bytes behind a live handle
    fn get(&self, id: &BlobId) -> Option<Arc<[u8]>>;

    /// Release the bytes behind a handle
    ///
    /// Returns `false` when the handle was already revoked or never existed.
    fn revoke(&self, id: &BlobId) -> bool;

    /// Number of handles currently holding data
    fn live_count(&self) -> usize;
}

#[derive(Debug, Default)]
struct BlobTable {
    live: HashMap<BlobId, Arc<[u8]>>,
    released: u64,
}

/// Process-local blob registry
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobs {
    table: Arc<Mutex<BlobTable>>,
}

impl InMemoryBlobs {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, BlobTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of handles released over the registry's lifetime
    pub fn released_count(&self) -> u64 {
        self.table().released
    }

    /// Total bytes held by live handles
    pub fn live_bytes(&self) -> usize {
        self.table().live.values().map(|data| data.len()).sum()
    }
}

impl BlobRegistry for InMemoryBlobs {
    fn register(&self, data: Vec<u8>) -> BlobId {
        let id = BlobId::new();
        self.table().live.insert(id, Arc::from(data));
        id
    }

    fn get(&self, id: &BlobId) -> Option<Arc<[u8]>> {
        self.table().live.get(id).cloned()
    }

    fn revoke(&self, id: &BlobId) -> bool {
        let mut table = self.table();
        if table.live.remove(id).is_none() {
            return false;
        }
        table.released += 1;
        true
    }

    fn live_count(&self) -> usize {
        self.table().live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_get_revoke() {
        let blobs = InMemoryBlobs::new();
        let id = blobs.register(vec![1, 2, 3]);

        assert_eq!(blobs.get(&id).as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(blobs.live_count(), 1);
        assert_eq!(blobs.live_bytes(), 3);

        assert!(blobs.revoke(&id));
        assert!(blobs.get(&id).is_none());
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn test_double_revoke_releases_once() {
        let blobs = InMemoryBlobs::new();
        let id = blobs.register(vec![0; 16]);

        assert!(blobs.revoke(&id));
        assert!(!blobs.revoke(&id));
        assert_eq!(blobs.released_count(), 1);
    }

    #[test]
    fn test_bookkeeping_stays_bounded() {
        let blobs = InMemoryBlobs::new();
        for tag in 0..10_000u32 {
            let id = blobs.register(tag.to_le_bytes().to_vec());
            assert!(blobs.revoke(&id));
        }

        assert_eq!(blobs.released_count(), 10_000);
        assert_eq!(blobs.live_count(), 0);
        let table = blobs.table();
        assert!(table.live.is_empty());
        assert!(table.live.capacity() < 10_000);
    }

    #[test]
    fn test_ids_are_unique() {
        let blobs = InMemoryBlobs::new();
        let a = blobs.register(vec![1]);
        let b = blobs.register(vec![1]);
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("blob:"));
    }
}
