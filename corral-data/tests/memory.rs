use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;

use corral_data::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Note {
    meta: EntityMeta,
    title: String,
}

struct NewNote {
    title: String,
}

#[derive(Default)]
struct NotePatch {
    title: Option<String>,
    // Lets a test try to smuggle identity changes through `apply`.
    tamper_id: Option<u64>,
    explode: bool,
}

impl Entity for Note {
    type Draft = NewNote;
    type Patch = NotePatch;

    fn build(meta: EntityMeta, draft: NewNote) -> Self {
        if draft.title == "boom" {
            panic!("cannot build a note titled boom");
        }
        Note {
            meta,
            title: draft.title,
        }
    }

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn apply(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(id) = patch.tamper_id {
            self.meta.id = id;
            self.meta.created_at = chrono::DateTime::<chrono::Utc>::MIN_UTC;
        }
        if patch.explode {
            panic!("patch exploded halfway");
        }
    }
}

fn note(title: &str) -> NewNote {
    NewNote {
        title: title.to_string(),
    }
}

fn rename(title: &str) -> NotePatch {
    NotePatch {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

#[test]
fn create_assigns_sequential_ids_and_equal_timestamps() {
    let repo = InMemoryRepository::<Note>::new();
    let a = repo.create(note("a"));
    let b = repo.create(note("b"));

    assert_eq!(a.meta.id, 1);
    assert_eq!(b.meta.id, 2);
    assert_eq!(a.meta.created_at, a.meta.updated_at);
    assert!(b.meta.created_at > a.meta.created_at);
    assert_eq!(repo.count(), 2);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let repo = InMemoryRepository::<Note>::new();
    repo.create(note("a"));
    let b = repo.create(note("b"));
    assert!(repo.delete(b.id()));

    let c = repo.create(note("c"));
    assert_eq!(c.id(), 3);
}

#[test]
fn get_by_id_returns_stored_record() {
    let repo = InMemoryRepository::<Note>::new();
    let created = repo.create(note("hello"));

    assert_eq!(repo.get_by_id(created.id()), Some(created));
    assert_eq!(repo.get_by_id(99), None);
}

#[test]
fn get_all_is_a_snapshot_in_creation_order() {
    let repo = InMemoryRepository::<Note>::new();
    repo.create(note("first"));
    repo.create(note("second"));

    let mut snapshot = repo.get_all();
    snapshot.clear();

    let titles: Vec<_> = repo.get_all().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["first", "second"]);
}

#[test]
fn update_merges_patch_and_advances_updated_at() {
    let repo = InMemoryRepository::<Note>::new();
    let created = repo.create(note("draft"));

    let updated = repo.update(created.id(), rename("final")).unwrap();
    assert_eq!(updated.title, "final");
    assert_eq!(updated.meta.id, created.meta.id);
    assert_eq!(updated.meta.created_at, created.meta.created_at);
    assert!(updated.meta.updated_at > created.meta.updated_at);
    assert_eq!(repo.get_by_id(created.id()), Some(updated));
}

#[test]
fn empty_update_only_touches_updated_at() {
    let repo = InMemoryRepository::<Note>::new();
    let created = repo.create(note("same"));

    let updated = repo.update(created.id(), NotePatch::default()).unwrap();
    assert_eq!(updated.title, "same");
    assert!(updated.meta.updated_at > created.meta.updated_at);
}

#[test]
fn update_keeps_identity_even_if_apply_rewrites_it() {
    let repo = InMemoryRepository::<Note>::new();
    let created = repo.create(note("x"));

    let patch = NotePatch {
        tamper_id: Some(42),
        ..Default::default()
    };
    let updated = repo.update(created.id(), patch).unwrap();
    assert_eq!(updated.meta.id, created.meta.id);
    assert_eq!(updated.meta.created_at, created.meta.created_at);
    assert!(repo.get_by_id(42).is_none());
}

#[test]
fn update_missing_returns_none() {
    let repo = InMemoryRepository::<Note>::new();
    repo.create(note("a"));
    assert!(repo.update(7, rename("b")).is_none());
    assert_eq!(repo.get_all()[0].title, "a");
}

#[test]
fn delete_missing_leaves_collection_unchanged() {
    let repo = InMemoryRepository::<Note>::new();
    repo.create(note("a"));
    let before = repo.get_all();

    assert!(!repo.delete(5));
    assert_eq!(repo.get_all(), before);
}

#[test]
fn delete_removes_record() {
    let repo = InMemoryRepository::<Note>::new();
    let a = repo.create(note("a"));
    let b = repo.create(note("b"));

    assert!(repo.delete(a.id()));
    assert!(repo.get_by_id(a.id()).is_none());
    assert_eq!(repo.get_all(), vec![b]);
    assert!(!repo.delete(a.id()));
}

#[test]
fn concurrent_creates_get_distinct_ids() {
    const N: usize = 64;
    let repo = InMemoryRepository::<Note>::new();

    std::thread::scope(|scope| {
        for i in 0..N {
            let repo = &repo;
            scope.spawn(move || {
                repo.create(note(&format!("note-{i}")));
            });
        }
    });

    let ids: BTreeSet<u64> = repo.get_all().iter().map(Entity::id).collect();
    let expected: BTreeSet<u64> = (1..=N as u64).collect();
    assert_eq!(ids, expected);
    assert_eq!(repo.count(), N);
}

#[test]
fn create_unique_rejects_conflicting_record() {
    let repo = InMemoryRepository::<Note>::new();
    repo.create_unique(note("taken"), |n| n.title == "taken").unwrap();

    let err = repo
        .create_unique(note("taken"), |n| n.title == "taken")
        .unwrap_err();
    assert!(matches!(err, DataError::Conflict(_)));
    assert_eq!(repo.count(), 1);
}

#[test]
fn update_unique_ignores_the_record_itself() {
    let repo = InMemoryRepository::<Note>::new();
    let a = repo.create(note("a"));
    repo.create(note("b"));

    let same = repo
        .update_unique(a.id(), rename("a"), |n| n.title == "a")
        .unwrap();
    assert!(same.is_some());

    let err = repo
        .update_unique(a.id(), rename("b"), |n| n.title == "b")
        .unwrap_err();
    assert!(matches!(err, DataError::Conflict(_)));
    assert_eq!(repo.get_by_id(a.id()).unwrap().title, "a");

    let missing = repo.update_unique(99, rename("c"), |_| false).unwrap();
    assert!(missing.is_none());
}

#[test]
fn conflict_maps_to_http_conflict() {
    let err: corral_core::HttpError = DataError::Conflict("dup".into()).into();
    assert!(matches!(err, corral_core::HttpError::Conflict(ref m) if m == "dup"));
}

#[test]
fn panicking_build_leaves_store_and_ids_untouched() {
    let repo = InMemoryRepository::<Note>::new();
    repo.create(note("a"));

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| repo.create(note("boom"))));
    assert!(outcome.is_err());

    assert_eq!(repo.count(), 1);
    assert_eq!(repo.create(note("b")).id(), 2);
}

#[test]
fn panicking_apply_leaves_record_unchanged() {
    let repo = InMemoryRepository::<Note>::new();
    let created = repo.create(note("steady"));

    let patch = NotePatch {
        title: Some("half".to_string()),
        tamper_id: Some(9),
        explode: true,
    };
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| repo.update(created.id(), patch)));
    assert!(outcome.is_err());

    assert_eq!(repo.get_by_id(created.id()), Some(created));
    assert!(repo.get_by_id(9).is_none());
    let renamed = repo.update(1, rename("after")).unwrap();
    assert_eq!(renamed.title, "after");
}
