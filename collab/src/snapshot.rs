use crate::types::{Blob, RoomId};
use std::collections::HashMap;

/// Last known content per open document, used to seed late joiners.
///
/// Writes are unconditional overwrites (last-writer-wins) and entries are
/// never evicted: a document edited once stays cached for process lifetime.
/// That unbounded growth is inherited behavior, kept on purpose; a bounded
/// or TTL cache would change what late joiners observe.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: HashMap<RoomId, Blob>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
        }
    }

    /// `None` means no content-change has been seen for this document during
    /// this process lifetime.
    pub fn get(&self, document_id: &str) -> Option<&Blob> {
        self.snapshots.get(document_id)
    }

    pub fn put(&mut self, document_id: &str, content: Blob) {
        self.snapshots.insert(document_id.to_owned(), content);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
