//! History store properties, checked against both backends
//!
//! Randomized upsert sequences use a seeded RNG so failures replay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;
use xliker::{
    Article, HistoryStore, Kind, MemoryStore, OpenStore, Record, RecordPatch, SqliteStore, Status,
};

fn backends(max_items: i64) -> Vec<(&'static str, Box<dyn HistoryStore>)> {
    let memory: Box<dyn HistoryStore> = Box::new(MemoryStore::new().with_max_items(max_items));
    let sqlite: Box<dyn HistoryStore> = Box::new(
        SqliteStore::open_in_memory()
            .expect("in-memory sqlite")
            .with_max_items(max_items),
    );
    vec![("memory", memory), ("sqlite", sqlite)]
}

fn keys(store: &dyn HistoryStore) -> Vec<String> {
    store.get_all().unwrap().into_iter().map(|r| r.key).collect()
}

#[test]
fn oldest_records_are_evicted_first() {
    for (name, store) in backends(2) {
        for key in ["A", "B", "C"] {
            store.upsert(Record::new(key, Kind::Like)).unwrap();
        }
        assert_eq!(keys(store.as_ref()), ["C", "B"], "{}", name);
    }
}

#[test]
fn random_sequences_stay_bounded_and_unique() {
    let mut rng = StdRng::seed_from_u64(7);
    for max_items in [1_i64, 3, 8] {
        for (name, store) in backends(max_items) {
            for _ in 0..200 {
                let key = format!("k{}", rng.gen_range(0..12));
                let size = store.upsert(Record::new(key.clone(), Kind::Bookmark)).unwrap();

                let all = keys(store.as_ref());
                assert_eq!(size, all.len(), "{}", name);
                assert!(all.len() <= max_items as usize, "{}", name);
                assert_eq!(all.first(), Some(&key), "{}", name);

                let mut unique = all.clone();
                unique.sort();
                unique.dedup();
                assert_eq!(unique.len(), all.len(), "{}: duplicate keys", name);
            }
        }
    }
}

#[test]
fn non_positive_capacity_keeps_nothing() {
    for max_items in [0_i64, -5] {
        for (name, store) in backends(max_items) {
            let size = store.upsert(Record::new("k", Kind::Like)).unwrap();
            assert_eq!(size, 0, "{}", name);
            assert!(store.get_all().unwrap().is_empty(), "{}", name);
        }
    }
}

#[test]
fn patch_on_missing_key_changes_nothing() {
    for (name, store) in backends(5) {
        store.upsert(Record::new("a", Kind::Like)).unwrap();
        let before = store.get_all().unwrap();

        let found = store
            .patch("ghost", &RecordPatch::status(Status::Done))
            .unwrap();

        assert!(!found, "{}", name);
        assert_eq!(store.get_all().unwrap(), before, "{}", name);
    }
}

#[test]
fn patch_only_overwrites_given_fields() {
    for (name, store) in backends(5) {
        let original = Record::new("a", Kind::Like)
            .with_primary_text("text")
            .with_external_links(vec!["https://e.example".into()]);
        store.upsert(original.clone()).unwrap();
        store.upsert(Record::new("b", Kind::Bookmark)).unwrap();

        let article = Article {
            resolved_url: "https://e.example/final".into(),
            title: "T".into(),
            ..Default::default()
        };
        store
            .patch(
                "a",
                &RecordPatch::status(Status::Summarizing).with_enrichment(Some(article.clone())),
            )
            .unwrap();

        let patched = store.get("a").unwrap().unwrap();
        assert_eq!(patched.status, Status::Summarizing, "{}", name);
        assert_eq!(patched.enrichment, Some(article), "{}", name);
        assert_eq!(patched.primary_text, "text", "{}", name);
        assert_eq!(patched.external_links, original.external_links, "{}", name);
        assert_eq!(patched.id, original.id, "{}", name);
        assert!(patched.summary.is_none(), "{}", name);
        // Patching never reorders.
        assert_eq!(keys(store.as_ref()), ["b", "a"], "{}", name);
    }
}

#[test]
fn error_can_be_set_and_cleared() {
    for (name, store) in backends(5) {
        store.upsert(Record::new("a", Kind::Like)).unwrap();
        store
            .patch("a", &RecordPatch::new().with_error("boom"))
            .unwrap();
        assert_eq!(
            store.get("a").unwrap().unwrap().error_message.as_deref(),
            Some("boom"),
            "{}",
            name
        );

        store.patch("a", &RecordPatch::new().clear_error()).unwrap();
        assert!(store.get("a").unwrap().unwrap().error_message.is_none(), "{}", name);
    }
}

#[test]
fn clear_empties_history() {
    for (name, store) in backends(5) {
        store.upsert(Record::new("a", Kind::Like)).unwrap();
        store.clear().unwrap();
        assert!(store.get_all().unwrap().is_empty(), "{}", name);
    }
}

#[test]
fn sqlite_history_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("history.db");

    {
        let store = SqliteStore::open(&path).unwrap().with_max_items(3);
        store
            .upsert(Record::new("a", Kind::Like).with_primary_text("kept"))
            .unwrap();
        store.upsert(Record::new("b", Kind::Bookmark)).unwrap();
        store
            .patch("a", &RecordPatch::status(Status::Done).with_summary("outline"))
            .unwrap();
    }

    let reopened = SqliteStore::open(&path).unwrap().with_max_items(3);
    assert_eq!(keys(&reopened), ["b", "a"]);
    let a = reopened.get("a").unwrap().unwrap();
    assert_eq!(a.status, Status::Done);
    assert_eq!(a.summary.as_deref(), Some("outline"));
    assert_eq!(a.primary_text, "kept");
}

#[test]
fn smaller_capacity_applies_on_next_upsert() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.db");

    {
        let store = SqliteStore::open(&path).unwrap().with_max_items(5);
        for key in ["a", "b", "c", "d"] {
            store.upsert(Record::new(key, Kind::Like)).unwrap();
        }
    }

    let store = SqliteStore::open(&path).unwrap().with_max_items(2);
    assert_eq!(keys(&store).len(), 4);
    store.upsert(Record::new("e", Kind::Like)).unwrap();
    assert_eq!(keys(&store), ["e", "d"]);
}
