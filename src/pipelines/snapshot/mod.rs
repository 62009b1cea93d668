// SPDX-License-Identifier: GPL-3.0-only

//! Bounded snapshot gallery
//!
//! Snapshots are kept most recent first. Inserting beyond the capacity
//! evicts the oldest snapshot and revokes its blob; removal and clearing
//! revoke as well, so every registered blob is released exactly once.

pub mod blobs;
pub mod encoding;

pub use blobs::{BlobId, BlobRegistry, InMemoryBlobs};
pub use encoding::{EncodedImage, encode_png};

use crate::constants::snapshots;
use crate::errors::SnapshotError;
use chrono::{DateTime, Local};
use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// One captured still
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Handle to the encoded PNG data
    pub blob: BlobId,
    pub width: u32,
    pub height: u32,
    /// Encoded size in bytes
    pub size: usize,
    pub captured_at: DateTime<Local>,
}

/// Ordered, bounded collection of snapshots
pub struct SnapshotStore<R: BlobRegistry = InMemoryBlobs> {
    items: VecDeque<Snapshot>,
    registry: R,
    capacity: usize,
}

impl Default for SnapshotStore<InMemoryBlobs> {
    fn default() -> Self {
        Self::new(InMemoryBlobs::new())
    }
}

impl<R: BlobRegistry> SnapshotStore<R> {
    /// Empty store with the default capacity
    pub fn new(registry: R) -> Self {
        Self::with_capacity(registry, snapshots::MAX_SNAPSHOTS)
    }

    pub fn with_capacity(registry: R, capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            registry,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Snapshot at gallery position `index` (0 = most recent)
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.items.get(index)
    }

    /// Most recent first
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.items.iter()
    }

    /// Encoded bytes of a snapshot still held by this store
    pub fn data(&self, snapshot: &Snapshot) -> Option<Arc<[u8]>> {
        self.registry.get(&snapshot.blob)
    }

    /// Encode the composited surface and insert it at the head
    pub fn capture(&mut self, pixels: &RgbaImage) -> Result<Snapshot, SnapshotError> {
        let encoded = encode_png(pixels)?;
        Ok(self.insert(encoded))
    }

    /// Insert already encoded data at the head, evicting beyond capacity
    pub fn insert(&mut self, encoded: EncodedImage) -> Snapshot {
        let size = encoded.data.len();
        let snapshot = Snapshot {
            blob: self.registry.register(encoded.data),
            width: encoded.width,
            height: encoded.height,
            size,
            captured_at: Local::now(),
        };

        info!(
            blob = %snapshot.blob,
            width = snapshot.width,
            height = snapshot.height,
            size,
            "Snapshot captured"
        );
        self.items.push_front(snapshot.clone());

        while self.items.len() > self.capacity {
            if let Some(evicted) = self.items.pop_back() {
                debug!(blob = %evicted.blob, "Evicting oldest snapshot");
                self.registry.revoke(&evicted.blob);
            }
        }

        snapshot
    }

    /// Remove the snapshot at `index` and release its data
    pub fn remove(&mut self, index: usize) -> Result<Snapshot, SnapshotError> {
        let snapshot = self
            .items
            .remove(index)
            .ok_or(SnapshotError::NotFound(index))?;
        self.registry.revoke(&snapshot.blob);
        debug!(blob = %snapshot.blob, index, "Snapshot removed");
        Ok(snapshot)
    }

    /// Release every snapshot; returns how many were released
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        for snapshot in self.items.drain(..) {
            self.registry.revoke(&snapshot.blob);
        }
        if count > 0 {
            info!(count, "Snapshot gallery cleared");
        }
        count
    }
}

impl<R: BlobRegistry> Drop for SnapshotStore<R> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(tag: u8) -> EncodedImage {
        EncodedImage {
            data: vec![tag; 4],
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_insert_at_head() {
        let mut store = SnapshotStore::default();
        let first = store.insert(encoded(1));
        let second = store.insert(encoded(2));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0), Some(&second));
        assert_eq!(store.get(1), Some(&first));
    }

    #[test]
    fn test_eleventh_insert_evicts_oldest_once() {
        let blobs = InMemoryBlobs::new();
        let mut store = SnapshotStore::new(blobs.clone());

        let first = store.insert(encoded(0));
        let mut last = first.clone();
        for tag in 1..=10 {
            last = store.insert(encoded(tag));
        }

        assert_eq!(store.len(), 10);
        assert_eq!(store.get(0), Some(&last));
        assert_eq!(blobs.released_count(), 1);
        assert!(store.data(&first).is_none());
        assert!(!blobs.revoke(&first.blob));
        assert_eq!(blobs.live_count(), 10);
    }

    #[test]
    fn test_clear_releases_everything_once() {
        let blobs = InMemoryBlobs::new();
        let mut store = SnapshotStore::new(blobs.clone());
        let ids: Vec<BlobId> = (0..3).map(|t| store.insert(encoded(t)).blob).collect();

        assert_eq!(store.clear(), 3);
        assert!(store.is_empty());
        assert_eq!(blobs.live_count(), 0);

        assert_eq!(store.clear(), 0);
        assert_eq!(blobs.released_count(), 3);
        for id in &ids {
            assert!(!blobs.revoke(id));
        }
    }

    #[test]
    fn test_remove_by_index() {
        let blobs = InMemoryBlobs::new();
        let mut store = SnapshotStore::new(blobs.clone());
        store.insert(encoded(1));
        let middle = store.insert(encoded(2));
        store.insert(encoded(3));

        let removed = store.remove(1).unwrap();
        assert_eq!(removed, middle);
        assert_eq!(store.len(), 2);
        assert_eq!(blobs.released_count(), 1);
        assert!(store.data(&middle).is_none());

        assert!(matches!(store.remove(5), Err(SnapshotError::NotFound(5))));
    }

    #[test]
    fn test_capture_encodes_png() {
        let mut store = SnapshotStore::default();
        let pixels = RgbaImage::from_pixel(4, 3, image::Rgba([1, 2, 3, 255]));
        let snapshot = store.capture(&pixels).unwrap();

        assert_eq!((snapshot.width, snapshot.height), (4, 3));
        let data = store.data(&snapshot).unwrap();
        assert_eq!(data.len(), snapshot.size);
        assert_eq!(&data[..4], b"\x89PNG");
    }

    #[test]
    fn test_drop_releases_blobs() {
        let blobs = InMemoryBlobs::new();
        {
            let mut store = SnapshotStore::new(blobs.clone());
            store.insert(encoded(1));
            store.insert(encoded(2));
        }
        assert_eq!(blobs.live_count(), 0);
    }
}
