use std::sync::Arc;

use parking_lot::Mutex;

use crate::document::Document;
use crate::error::Error;
use crate::node::{DocumentId, Node, LOCAL_SPACE, MAX_DOCUMENT_IDS};

/// Options for a [`DocumentManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Give documents with more than [`LOCAL_SPACE`] nodes extra overflow
    /// identifiers. Without this such documents are refused with a capacity
    /// error.
    pub allow_overflow: bool,
    /// Initial size of the identifier table. It grows by doubling.
    pub initial_slots: usize,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            allow_overflow: true,
            initial_slots: 16,
        }
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Free,
    Reserved,
    Used { document: Arc<Document>, offset: u32 },
}

#[derive(Debug)]
struct Table {
    slots: Vec<Slot>,
}

impl Table {
    fn grow(&mut self) -> bool {
        let len = self.slots.len();
        if len >= MAX_DOCUMENT_IDS {
            return false;
        }
        let new_len = (len * 2).clamp(1, MAX_DOCUMENT_IDS);
        self.slots.resize(new_len, Slot::Free);
        true
    }

    fn ensure(&mut self, index: usize) {
        while self.slots.len() <= index && self.grow() {}
    }

    fn reserve(&mut self) -> Option<DocumentId> {
        loop {
            if let Some(index) = self.slots.iter().position(|slot| matches!(slot, Slot::Free)) {
                self.slots[index] = Slot::Reserved;
                return Some(DocumentId(index as u16));
            }
            if !self.grow() {
                return None;
            }
        }
    }

    fn available(&self) -> usize {
        let free = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Free))
            .count();
        free + (MAX_DOCUMENT_IDS - self.slots.len())
    }

    fn lookup(&self, node: Node) -> Option<(Arc<Document>, u32)> {
        match self.slots.get(node.document_id().get() as usize)? {
            Slot::Used { document, offset } => Some((document.clone(), offset + node.low())),
            _ => None,
        }
    }
}

/// Registry of live documents.
///
/// Hands out document identifiers, so that node handles of all registered
/// documents are distinct, and maps any handle back to its document. A
/// document with more nodes than one identifier addresses gets additional
/// overflow identifiers, all mapped to the same document at increasing
/// offsets.
///
/// All operations take one lock; the manager can be shared between threads.
///
/// ```rust
/// use xdtm::{Document, DocumentManager};
///
/// let manager = DocumentManager::new();
/// let first = manager.register(Document::parse("<a/>").unwrap())?;
/// let second = manager.register(Document::parse("<b/>").unwrap())?;
///
/// let b = second.document_element().unwrap();
/// let (owner, _local) = manager.owner_of(b);
/// assert!(std::sync::Arc::ptr_eq(&owner, &second));
/// assert_ne!(first.root(), second.root());
/// # Ok::<(), xdtm::Error>(())
/// ```
#[derive(Debug)]
pub struct DocumentManager {
    options: ManagerOptions,
    table: Mutex<Table>,
}

impl DocumentManager {
    /// Create a manager with default options.
    pub fn new() -> Self {
        Self::with_options(ManagerOptions::default())
    }

    /// Create a manager with the given options.
    pub fn with_options(options: ManagerOptions) -> Self {
        let initial = options.initial_slots.clamp(1, MAX_DOCUMENT_IDS);
        DocumentManager {
            table: Mutex::new(Table {
                slots: vec![Slot::Free; initial],
            }),
            options,
        }
    }

    /// Reserve the next free identifier.
    pub fn allocate(&self) -> Result<DocumentId, Error> {
        self.table
            .lock()
            .reserve()
            .ok_or(Error::IdentifiersExhausted {
                needed: 1,
                available: 0,
            })
    }

    /// Register a document under an identifier, with the given local index
    /// offset. The offset is 0 for a document's base identifier and a
    /// multiple of [`LOCAL_SPACE`] for its overflow identifiers.
    ///
    /// The document's own handles only resolve here if `id` is among its
    /// [`Document::document_ids`]; [`DocumentManager::register`] takes care
    /// of that.
    pub fn add_tree(&self, document: Arc<Document>, id: DocumentId, offset: u32) {
        debug_assert_eq!(offset % LOCAL_SPACE, 0);
        let mut table = self.table.lock();
        let index = id.get() as usize;
        table.ensure(index);
        table.slots[index] = Slot::Used { document, offset };
    }

    /// Assign identifiers to a document and register it.
    ///
    /// A document needing more than one identifier gets overflow
    /// identifiers, unless overflow is disabled in which case this is a
    /// capacity error.
    pub fn register(&self, mut document: Document) -> Result<Arc<Document>, Error> {
        let needed = crate::document::identifiers_needed(document.len() as u32);
        if needed > 1 && !self.options.allow_overflow {
            return Err(Error::Capacity {
                nodes: document.len(),
                limit: LOCAL_SPACE as usize,
            });
        }
        let mut table = self.table.lock();
        let available = table.available();
        if needed > available {
            return Err(Error::IdentifiersExhausted { needed, available });
        }
        let mut ids = Vec::with_capacity(needed);
        for _ in 0..needed {
            match table.reserve() {
                Some(id) => ids.push(id),
                None => {
                    for id in ids {
                        table.slots[id.get() as usize] = Slot::Free;
                    }
                    return Err(Error::IdentifiersExhausted { needed, available });
                }
            }
        }
        document.set_ids(ids.clone());
        let document = Arc::new(document);
        for (block, id) in ids.iter().enumerate() {
            table.slots[id.get() as usize] = Slot::Used {
                document: document.clone(),
                offset: block as u32 * LOCAL_SPACE,
            };
        }
        tracing::debug!(
            base = ids[0].get(),
            nodes = document.len(),
            "registered document"
        );
        if needed > 1 {
            tracing::debug!(
                base = ids[0].get(),
                overflow = needed - 1,
                "allocated overflow identifiers"
            );
        }
        Ok(document)
    }

    /// The document owning a handle, and the node's local index in it.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to no registered document.
    pub fn owner_of(&self, node: Node) -> (Arc<Document>, u32) {
        match self.get(node) {
            Some(owner) => owner,
            None => panic!("{:?} belongs to no registered document", node),
        }
    }

    /// Like [`DocumentManager::owner_of`], but `None` for unknown handles.
    pub fn get(&self, node: Node) -> Option<(Arc<Document>, u32)> {
        self.table.lock().lookup(node)
    }

    /// Drop every identifier mapped to a document. Returns how many were
    /// freed.
    pub fn release(&self, document: &Arc<Document>) -> usize {
        let mut table = self.table.lock();
        let mut freed = 0;
        for slot in table.slots.iter_mut() {
            if let Slot::Used { document: used, .. } = slot {
                if Arc::ptr_eq(used, document) {
                    *slot = Slot::Free;
                    freed += 1;
                }
            }
        }
        tracing::debug!(freed, "released document");
        freed
    }

    /// Number of identifiers currently in use or reserved.
    pub fn in_use(&self) -> usize {
        self.table
            .lock()
            .slots
            .iter()
            .filter(|slot| !matches!(slot, Slot::Free))
            .count()
    }

    /// Current size of the identifier table.
    pub fn capacity(&self) -> usize {
        self.table.lock().slots.len()
    }
}

impl Default for DocumentManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_grows_geometrically() {
        let manager = DocumentManager::with_options(ManagerOptions {
            initial_slots: 2,
            ..Default::default()
        });
        let ids = (0..5)
            .map(|_| manager.allocate().unwrap().get())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(manager.capacity(), 8);
        assert_eq!(manager.in_use(), 5);
    }

    #[test]
    fn test_release_frees_identifiers() {
        let manager = DocumentManager::new();
        let document = manager
            .register(Document::parse("<a/>").unwrap())
            .unwrap();
        let root = document.root();
        assert!(manager.get(root).is_some());
        assert_eq!(manager.release(&document), 1);
        assert!(manager.get(root).is_none());
        assert_eq!(manager.in_use(), 0);
    }

    #[test]
    fn test_identifiers_are_reused() {
        let manager = DocumentManager::new();
        let first = manager
            .register(Document::parse("<a/>").unwrap())
            .unwrap();
        manager.release(&first);
        let second = manager
            .register(Document::parse("<b/>").unwrap())
            .unwrap();
        assert_eq!(second.document_ids(), first.document_ids());
    }

    #[test]
    #[should_panic(expected = "no registered document")]
    fn test_unknown_handle_panics() {
        let manager = DocumentManager::new();
        manager.owner_of(Node::from_raw(0));
    }

    #[test]
    fn test_add_tree() {
        let manager = DocumentManager::new();
        let document = Arc::new(Document::parse("<a/>").unwrap());
        let id = manager.allocate().unwrap();
        manager.add_tree(document.clone(), id, 0);
        let (owner, local) = manager.owner_of(Node::new(id, 1));
        assert!(Arc::ptr_eq(&owner, &document));
        assert_eq!(local, 1);
    }
}
