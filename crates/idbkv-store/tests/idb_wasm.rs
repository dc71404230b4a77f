#![cfg(all(target_arch = "wasm32", feature = "web"))]

use std::collections::BTreeMap;

use idbkv_core::{Key, KeyRange, Schema, Value};
use idbkv_store::{Connection, Factory, IdbFactory, StoreError};
use wasm_bindgen_test::wasm_bindgen_test;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

fn unique_db_name(prefix: &str) -> String {
    let now = js_sys::Date::now() as u64;
    let rand = (js_sys::Math::random() * 1_000_000.0) as u64;
    format!("{prefix}-{now:x}-{rand:x}")
}

fn schema(name: &str, stores: &[&str], version: u32) -> Schema {
    Schema::new(name, stores.iter().copied(), version).unwrap()
}

#[wasm_bindgen_test(async)]
async fn test_buffers_round_trip() {
    let name = unique_db_name("idbkv-buffers");
    let factory = IdbFactory::from_global().unwrap();
    let conn = factory.open(&schema(&name, &["buffers"], 1)).await.unwrap();

    let payload = Value::from(vec![1u8, 2, 3, 255]);
    let key = conn
        .put("buffers", &Key::from("blob"), &payload)
        .await
        .unwrap();
    assert_eq!(key, Key::from("blob"));

    let stored = conn.get("buffers", &key).await.unwrap().unwrap();
    assert_eq!(stored.as_bytes().map(|b| &b[..]), Some(&[1u8, 2, 3, 255][..]));

    conn.close();
    factory.delete_database(&name).await.unwrap();
}

#[wasm_bindgen_test(async)]
async fn test_objects_update_merges() {
    let name = unique_db_name("idbkv-objects");
    let factory = IdbFactory::from_global().unwrap();
    let conn = factory.open(&schema(&name, &["objects"], 1)).await.unwrap();

    let key = Key::from(7);
    conn.put(
        "objects",
        &key,
        &Value::object([("a", Value::from(1)), ("b", Value::from("x"))]),
    )
    .await
    .unwrap();

    let merged = conn
        .update("objects", &key, &Value::object([("b", Value::from("y"))]))
        .await
        .unwrap();

    let expected: BTreeMap<String, Value> = [
        ("a".to_string(), Value::from(1)),
        ("b".to_string(), Value::from("y")),
    ]
    .into_iter()
    .collect();
    assert_eq!(merged, Value::Object(expected.clone()));
    assert_eq!(
        conn.get("objects", &key).await.unwrap(),
        Some(Value::Object(expected))
    );

    conn.close();
    factory.delete_database(&name).await.unwrap();
}

#[wasm_bindgen_test(async)]
async fn test_keys_sorted_and_counted() {
    let name = unique_db_name("idbkv-keys");
    let factory = IdbFactory::from_global().unwrap();
    let conn = factory.open(&schema(&name, &["n"], 1)).await.unwrap();

    for k in [3, 1, 2] {
        conn.put("n", &Key::from(k), &Value::from(k)).await.unwrap();
    }
    conn.put("n", &Key::from("z"), &Value::Null).await.unwrap();

    let keys = conn.get_all_keys("n").await.unwrap();
    assert_eq!(
        keys,
        vec![Key::from(1), Key::from(2), Key::from(3), Key::from("z")]
    );

    let range = KeyRange::bound(Key::from(2), Key::from(3), false, false).unwrap();
    assert_eq!(conn.count("n", &range.into()).await.unwrap(), 2);
    assert_eq!(conn.count("n", &Key::from("z").into()).await.unwrap(), 1);

    conn.delete("n", &Key::from(1)).await.unwrap();
    conn.delete("n", &Key::from(99)).await.unwrap();
    assert_eq!(conn.get_all("n").await.unwrap().len(), 3);

    conn.clear("n").await.unwrap();
    assert!(conn.get_all("n").await.unwrap().is_empty());

    conn.close();
    factory.delete_database(&name).await.unwrap();
}

#[wasm_bindgen_test(async)]
async fn test_upgrade_keeps_common_stores() {
    let name = unique_db_name("idbkv-animals");
    let factory = IdbFactory::from_global().unwrap();

    let v1 = factory
        .open(&schema(&name, &["horses", "birds"], 1))
        .await
        .unwrap();
    v1.put("horses", &Key::from("h"), &Value::from("neigh"))
        .await
        .unwrap();
    v1.close();

    let v2 = factory
        .open(&schema(&name, &["horses", "insects"], 2))
        .await
        .unwrap();
    assert_eq!(v2.version(), 2);
    assert_eq!(v2.store_names(), vec!["horses", "insects"]);
    assert_eq!(
        v2.get("horses", &Key::from("h")).await.unwrap(),
        Some(Value::from("neigh"))
    );
    assert!(matches!(
        v2.get("birds", &Key::from("b")).await,
        Err(StoreError::NotFound { .. })
    ));

    v2.close();
    factory.delete_database(&name).await.unwrap();
}

#[wasm_bindgen_test(async)]
async fn test_blocked_upgrade_reconciles_after_close() {
    let name = unique_db_name("idbkv-blocked");
    let factory = IdbFactory::from_global().unwrap();

    let v1 = factory
        .open(&schema(&name, &["horses", "birds"], 1))
        .await
        .unwrap();
    v1.put("horses", &Key::from("h"), &Value::from("neigh"))
        .await
        .unwrap();

    let v2_schema = schema(&name, &["horses", "insects"], 2);
    let blocked = factory.open(&v2_schema).await;
    assert!(matches!(blocked, Err(StoreError::Blocked { .. })));

    v1.close();
    let v2 = factory.open(&v2_schema).await.unwrap();
    assert_eq!(v2.version(), 2);
    assert_eq!(v2.store_names(), vec!["horses", "insects"]);
    v2.put("insects", &Key::from("ant"), &Value::from(6))
        .await
        .unwrap();
    assert_eq!(
        v2.get("horses", &Key::from("h")).await.unwrap(),
        Some(Value::from("neigh"))
    );

    v2.close();
    factory.delete_database(&name).await.unwrap();
}

#[wasm_bindgen_test(async)]
async fn test_closed_connection_rejects() {
    let name = unique_db_name("idbkv-closed");
    let factory = IdbFactory::from_global().unwrap();
    let conn = factory.open(&schema(&name, &["s"], 1)).await.unwrap();
    conn.close();

    let result = conn.get("s", &Key::from(1)).await;
    assert!(matches!(result, Err(StoreError::InvalidState(_))));

    factory.delete_database(&name).await.unwrap();
}
