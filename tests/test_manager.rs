use std::sync::Arc;

use xdtm::{
    Axis, Builder, Document, DocumentManager, Error, ManagerOptions, LOCAL_SPACE,
};

// a document element with `count` empty children
fn wide_document(count: usize) -> Document {
    let mut builder = Builder::new();
    builder.start_document().unwrap();
    builder.start_element("", "doc", "doc", &[]).unwrap();
    for _ in 0..count {
        builder.start_element("", "e", "e", &[]).unwrap();
        builder.end_element().unwrap();
    }
    builder.end_element().unwrap();
    builder.end_document().unwrap()
}

#[test]
fn test_overflow_addressing() {
    let manager = DocumentManager::new();
    let small = manager.register(Document::parse("<a/>").unwrap()).unwrap();
    let document = manager.register(wide_document(70_000)).unwrap();
    assert_eq!(document.len(), 70_002);
    assert_eq!(document.document_ids().len(), 2);

    let base = document.document_element().unwrap();
    assert_eq!(base.document_id(), document.document_ids()[0]);
    let (owner, local) = manager.owner_of(base);
    assert!(Arc::ptr_eq(&owner, &document));
    assert_eq!(local, 1);

    let last = document.axis(Axis::Child, base).last().unwrap();
    assert_eq!(last.document_id(), document.document_ids()[1]);
    assert_eq!(last.low(), 70_001 - LOCAL_SPACE);
    let (owner, local) = manager.owner_of(last);
    assert!(Arc::ptr_eq(&owner, &document));
    assert_eq!(local, 70_001);

    // navigation crosses the block boundary
    assert_eq!(document.parent(last), Some(base));
    assert_eq!(document.axis(Axis::Child, base).count(), 70_000);

    let (owner, _) = manager.owner_of(small.root());
    assert!(Arc::ptr_eq(&owner, &small));
}

#[test]
fn test_overflow_disabled() {
    let manager = DocumentManager::with_options(ManagerOptions {
        allow_overflow: false,
        ..Default::default()
    });
    let err = manager.register(wide_document(70_000)).unwrap_err();
    assert!(matches!(err, Error::Capacity { nodes: 70_002, .. }));
    assert_eq!(manager.in_use(), 0);
}

#[test]
fn test_release_frees_all_identifiers() {
    let manager = DocumentManager::new();
    let document = manager.register(wide_document(70_000)).unwrap();
    assert_eq!(manager.in_use(), 2);
    let last = document
        .axis(Axis::Descendant, document.root())
        .last()
        .unwrap();
    assert_eq!(manager.release(&document), 2);
    assert_eq!(manager.in_use(), 0);
    assert!(manager.get(last).is_none());
}

#[test]
fn test_released_identifiers_are_reused() {
    let manager = DocumentManager::new();
    let first = manager.register(Document::parse("<a/>").unwrap()).unwrap();
    let id = first.document_ids()[0];
    manager.release(&first);
    let second = manager.register(Document::parse("<b/>").unwrap()).unwrap();
    assert_eq!(second.document_ids()[0], id);
}

#[test]
fn test_table_grows_geometrically() {
    let manager = DocumentManager::with_options(ManagerOptions {
        initial_slots: 2,
        ..Default::default()
    });
    let documents = (0..5)
        .map(|_| manager.register(Document::parse("<a/>").unwrap()).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(manager.in_use(), 5);
    assert_eq!(manager.capacity(), 8);
    for document in &documents {
        let (owner, local) = manager.owner_of(document.root());
        assert!(Arc::ptr_eq(&owner, document));
        assert_eq!(local, 0);
    }
}

#[test]
fn test_allocate_and_add_tree() {
    let manager = DocumentManager::new();
    let id = manager.allocate().unwrap();
    assert_eq!(manager.in_use(), 1);
    let document = Arc::new(Document::parse("<a/>").unwrap());
    manager.add_tree(document.clone(), id, 0);
    assert_eq!(manager.in_use(), 1);
    // an unregistered document counts its identifiers from zero
    let (owner, _) = manager.owner_of(document.root());
    assert!(Arc::ptr_eq(&owner, &document));
}

#[test]
#[should_panic(expected = "belongs to no registered document")]
fn test_owner_of_unknown_handle() {
    let manager = DocumentManager::new();
    let document = Document::parse("<a/>").unwrap();
    manager.owner_of(document.root());
}

#[test]
fn test_shared_between_threads() {
    let manager = Arc::new(DocumentManager::new());
    let handles = (0..4)
        .map(|_| {
            let manager = manager.clone();
            std::thread::spawn(move || {
                let document = manager
                    .register(Document::parse("<a><b/></a>").unwrap())
                    .unwrap();
                let b = document
                    .axis(Axis::Descendant, document.root())
                    .last()
                    .unwrap();
                let (owner, _) = manager.owner_of(b);
                assert!(Arc::ptr_eq(&owner, &document));
                document.document_ids()[0]
            })
        })
        .collect::<Vec<_>>();
    let mut ids = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[test]
fn test_registered_documents_tell_handles_apart() {
    let manager = DocumentManager::new();
    let one = manager.register(Document::parse("<a><b/></a>").unwrap()).unwrap();
    let two = manager.register(Document::parse("<x><y/></x>").unwrap()).unwrap();
    let y = two.axis(Axis::Descendant, two.root()).last().unwrap();
    assert!(two.contains(y));
    assert!(!one.contains(y));
    // without registration both documents use identifier 0
    let unregistered = Document::parse("<a><b/></a>").unwrap();
    let b = unregistered.axis(Axis::Descendant, unregistered.root()).last().unwrap();
    assert!(Document::parse("<x><y/></x>").unwrap().contains(b));
}

#[test]
#[should_panic(expected = "does not belong to this document")]
fn test_handle_of_same_sized_document_panics() {
    let manager = DocumentManager::new();
    let one = manager.register(Document::parse("<a><b/></a>").unwrap()).unwrap();
    let two = manager.register(Document::parse("<x><y/></x>").unwrap()).unwrap();
    let y = two.axis(Axis::Descendant, two.root()).last().unwrap();
    one.node_name(y);
}
