use crate::{BASE_ID, Category, IdError, IdTable, IdentityRegistry, NullRegistry, ObjectId};

/// Registry that records every forwarded triple.
#[derive(Default)]
struct RecordingRegistry {
    seen: Vec<(Category, ObjectId, String)>,
}

impl IdentityRegistry for RecordingRegistry {
    fn register(&mut self, category: Category, id: ObjectId, canonical_key: &str) {
        self.seen.push((category, id, canonical_key.to_owned()));
    }
}

#[test]
fn get_or_create_is_idempotent() {
    let mut ids = IdTable::new();
    let mut reg = NullRegistry;

    let a = ids.get_or_create("5", Category::Material, &mut reg).unwrap();
    let b = ids.get_or_create("5", Category::Material, &mut reg).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.raw(), BASE_ID);
    assert_eq!(ids.len(Category::Material), 1);
}

#[test]
fn categories_are_independent_namespaces() {
    let mut ids = IdTable::new();
    let mut reg = NullRegistry;

    let mat = ids.get_or_create("5", Category::Material, &mut reg).unwrap();
    let tex = ids.get_or_create("5", Category::Texture, &mut reg).unwrap();

    // Same raw value is fine; the point is the mappings don't alias.
    assert_eq!(mat.raw(), BASE_ID);
    assert_eq!(tex.raw(), BASE_ID);
    assert!(ids.contains("5", Category::Material));
    assert!(ids.contains("5", Category::Texture));
    assert!(!ids.contains("5", Category::Layer));
}

#[test]
fn reserved_zero_key() {
    let mut ids = IdTable::new();
    let mut reg = RecordingRegistry::default();

    let id = ids.get_or_create("0", Category::Viewport, &mut reg).unwrap();
    assert_eq!(id, ObjectId::NONE);
    // Never memoized, never forwarded.
    assert_eq!(ids.len(Category::Viewport), 0);
    assert!(reg.seen.is_empty());
    // But it always resolves.
    assert!(ids.contains("0", Category::Viewport));
    assert_eq!(
        ids.lookup_existing("0", Category::Viewport).unwrap(),
        ObjectId::NONE
    );
}

#[test]
fn allocation_skips_forced_ids() {
    let mut ids = IdTable::new();
    let mut reg = NullRegistry;

    ids.set_special("pinned", ObjectId(BASE_ID), Category::Overlay, &mut reg);
    ids.set_special("pinned2", ObjectId(BASE_ID + 1), Category::Overlay, &mut reg);

    let fresh = ids.get_or_create("x", Category::Overlay, &mut reg).unwrap();
    assert_eq!(fresh.raw(), BASE_ID + 2);
}

#[test]
fn clear_restarts_allocation_at_base() {
    let mut ids = IdTable::new();
    let mut reg = NullRegistry;

    for key in ["a", "b", "c"] {
        ids.get_or_create(key, Category::Metafile, &mut reg).unwrap();
    }
    assert_eq!(
        ids.get_or_create("d", Category::Metafile, &mut reg)
            .unwrap()
            .raw(),
        BASE_ID + 3
    );

    ids.clear(Category::Metafile);
    assert!(ids.is_empty(Category::Metafile));
    assert_eq!(
        ids.get_or_create("e", Category::Metafile, &mut reg)
            .unwrap()
            .raw(),
        BASE_ID
    );
}

#[test]
fn create_new_rejects_known_keys() {
    let mut ids = IdTable::new();
    let mut reg = NullRegistry;

    ids.create_new("7", Category::Metafile, &mut reg).unwrap();
    let err = ids.create_new("7", Category::Metafile, &mut reg).unwrap_err();
    assert!(matches!(err, IdError::AlreadyKnown { .. }));

    // Introducing the "no object" key is always a consistency violation.
    let err = ids.create_new("0", Category::Metafile, &mut reg).unwrap_err();
    assert!(matches!(err, IdError::AlreadyKnown { .. }));
}

#[test]
fn lookup_existing_rejects_unknown_keys() {
    let ids = IdTable::new();
    let err = ids.lookup_existing("9", Category::HlBranch).unwrap_err();
    assert!(matches!(err, IdError::NeverIntroduced { .. }));
}

#[test]
fn registry_forwarded_once_per_fresh_mapping() {
    let mut ids = IdTable::new();
    let mut reg = RecordingRegistry::default();

    ids.get_or_create("007", Category::Material, &mut reg).unwrap();
    ids.get_or_create("007", Category::Material, &mut reg).unwrap();
    ids.get_or_create("8", Category::Material, &mut reg).unwrap();

    assert_eq!(
        reg.seen,
        vec![
            (Category::Material, ObjectId(BASE_ID), "7".to_owned()),
            (Category::Material, ObjectId(BASE_ID + 1), "8".to_owned()),
        ]
    );
}

#[test]
fn set_special_forwards_fresh_nonzero_mappings() {
    let mut ids = IdTable::new();
    let mut reg = RecordingRegistry::default();

    ids.set_special("sun", ObjectId(12), Category::Background, &mut reg);
    ids.set_special("none", ObjectId::NONE, Category::Background, &mut reg);
    // Re-forcing the same key must not forward again.
    ids.set_special("sun", ObjectId(13), Category::Background, &mut reg);

    assert_eq!(
        reg.seen,
        vec![(Category::Background, ObjectId(12), "sun".to_owned())]
    );
    assert_eq!(
        ids.lookup_existing("sun", Category::Background).unwrap(),
        ObjectId(13)
    );
}
