//! Store operations over the in-process engine.

use idbkv::engine::MemoryFactory;
use idbkv::{shallow_merge, Database, Key, KeyQuery, KeyRange, Store, Value};
use idbkv_testkit::generators::{object_value, shuffled_keys};
use idbkv_testkit::TestFixture;
use proptest::prelude::*;

fn store(fixture: &TestFixture, stores: &[&str], name: &str) -> Store<MemoryFactory> {
    let db = Database::new(
        fixture.factory(),
        fixture.unique_name("db"),
        stores.iter().copied(),
    )
    .unwrap();
    db.store(name)
}

fn block_on<T>(fut: impl std::future::Future<Output = T>) -> T {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(fut)
}

#[tokio::test]
async fn test_put_then_get_and_count() {
    let fixture = TestFixture::new();
    let objects = store(&fixture, &["objects"], "objects");

    let value = Value::object([("title", Value::from("a")), ("n", Value::from(1))]);
    let key = objects.put(42, value.clone()).await.unwrap();

    assert_eq!(key, Key::from(42));
    assert_eq!(objects.get(42).await.unwrap(), Some(value));
    assert_eq!(objects.count(42).await.unwrap(), 1);
}

#[tokio::test]
async fn test_remove_then_absent() {
    let fixture = TestFixture::new();
    let objects = store(&fixture, &["objects"], "objects");

    objects.put("k", "v").await.unwrap();
    objects.remove("k").await.unwrap();

    assert_eq!(objects.get("k").await.unwrap(), None);
    assert_eq!(objects.count("k").await.unwrap(), 0);

    // Removing again is fine.
    objects.remove("k").await.unwrap();
}

#[tokio::test]
async fn test_clear_empties_store() {
    let fixture = TestFixture::new();
    let objects = store(&fixture, &["objects", "other"], "objects");
    let other = objects.database().store("other");

    for k in ["a", "b", "c"] {
        objects.put(k, k).await.unwrap();
    }
    other.put("a", "kept").await.unwrap();

    objects.clear().await.unwrap();
    for k in ["a", "b", "c"] {
        assert_eq!(objects.count(k).await.unwrap(), 0);
    }
    assert_eq!(objects.count(KeyQuery::All).await.unwrap(), 0);
    assert_eq!(other.get("a").await.unwrap(), Some(Value::from("kept")));
}

#[tokio::test]
async fn test_update_merges_existing() {
    let fixture = TestFixture::new();
    let objects = store(&fixture, &["objects"], "objects");

    let original = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
    let partial = Value::object([("b", Value::from(3)), ("c", Value::from(4))]);
    objects.put("k", original.clone()).await.unwrap();

    let (key, merged) = objects.update("k", partial.clone()).await.unwrap();
    let expected = shallow_merge(Some(original), partial);

    assert_eq!(key, Key::from("k"));
    assert_eq!(merged, expected);
    assert_eq!(objects.get("k").await.unwrap(), Some(expected));
}

#[tokio::test]
async fn test_concurrent_updates_keep_all_fields() {
    let fixture = TestFixture::new();
    let objects = store(&fixture, &["objects"], "objects");
    objects.put("k", Value::object([("a", 0)])).await.unwrap();

    let (first, second) = tokio::join!(
        objects.update("k", Value::object([("b", 1)])),
        objects.update("k", Value::object([("c", 2)])),
    );
    first.unwrap();
    second.unwrap();

    let stored = objects.get("k").await.unwrap().unwrap();
    let fields = stored.as_object().unwrap();
    assert_eq!(fields.len(), 3);
}

#[tokio::test]
async fn test_buffers_store_bytes() {
    let fixture = TestFixture::new();
    let buffers = store(&fixture, &["buffers"], "buffers");

    let payload = Value::from(vec![0u8, 1, 2, 254, 255]);
    buffers.put("blob", payload.clone()).await.unwrap();
    assert_eq!(buffers.get("blob").await.unwrap(), Some(payload));
}

#[tokio::test]
async fn test_mixed_key_types_sorted_by_type() {
    let fixture = TestFixture::new();
    let objects = store(&fixture, &["objects"], "objects");

    let keys = vec![
        Key::Array(vec![Key::from(1)]),
        Key::from(vec![1u8, 2]),
        Key::from("b"),
        Key::date(5.0).unwrap(),
        Key::from(10),
        Key::from("a"),
        Key::from(-1),
    ];
    for key in &keys {
        objects.put(key.clone(), Value::Null).await.unwrap();
    }

    let mut expected = keys.clone();
    expected.sort();
    assert_eq!(objects.get_all_keys().await.unwrap(), expected);
    assert_eq!(expected.first(), Some(&Key::from(-1)));
    assert_eq!(expected.last(), Some(&Key::Array(vec![Key::from(1)])));
}

#[tokio::test]
async fn test_count_ranges() {
    let fixture = TestFixture::new();
    let numbers = store(&fixture, &["numbers"], "numbers");
    for n in 1..=10 {
        numbers.put(n, n).await.unwrap();
    }

    assert_eq!(numbers.count(KeyRange::lower_bound(5, false)).await.unwrap(), 6);
    assert_eq!(numbers.count(KeyRange::lower_bound(5, true)).await.unwrap(), 5);
    assert_eq!(numbers.count(KeyRange::upper_bound(3, false)).await.unwrap(), 3);
    assert_eq!(numbers.count(KeyRange::only(7)).await.unwrap(), 1);
    assert_eq!(numbers.count(None::<Key>).await.unwrap(), 10);
}

proptest! {
    #[test]
    fn test_get_all_sorted_regardless_of_insertion(keys in shuffled_keys(24)) {
        let fixture = TestFixture::new();
        let numbers = store(&fixture, &["numbers"], "numbers");

        let (stored_keys, stored_values) = block_on(async {
            for k in &keys {
                numbers.put(*k, *k).await.unwrap();
            }
            (
                numbers.get_all_keys().await.unwrap(),
                numbers.get_all().await.unwrap(),
            )
        });

        let mut sorted = keys.clone();
        sorted.sort();
        let expected_keys: Vec<Key> = sorted.iter().map(|k| Key::from(*k)).collect();
        let expected_values: Vec<Value> = sorted.iter().map(|k| Value::from(*k)).collect();
        prop_assert_eq!(stored_keys, expected_keys);
        prop_assert_eq!(stored_values, expected_values);
    }

    #[test]
    fn test_update_matches_shallow_merge(
        existing in proptest::option::of(object_value(4)),
        partial in object_value(4),
    ) {
        let fixture = TestFixture::new();
        let objects = store(&fixture, &["objects"], "objects");

        let (merged, stored) = block_on(async {
            if let Some(existing) = &existing {
                objects.put("k", existing.clone()).await.unwrap();
            }
            let (_, merged) = objects.update("k", partial.clone()).await.unwrap();
            (merged, objects.get("k").await.unwrap())
        });

        let expected = shallow_merge(existing, partial);
        prop_assert_eq!(&merged, &expected);
        prop_assert_eq!(stored, Some(expected));
    }
}
