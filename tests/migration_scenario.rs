//! Full catalog upgrade against the in-memory backend.

use catalog_migrate::migrations::{run_migrations, RunOptions};
use catalog_migrate::store::backends::memory::MemoryStore;
use catalog_migrate::store::{Document, DocumentStore, Filter, FindExt};
use serde_json::{json, Value as JsonValue};

async fn seeded_catalog() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .seed(
            "sample",
            [
                json!({"_id": "s1", "uid": 1, "version": 1, "id": "S1"}),
                json!({"_id": "s2", "uid": 2, "version": 1, "id": "S2"}),
            ],
        )
        .await
        .unwrap();
    store
        .seed(
            "individual",
            [json!({
                "_id": "i1",
                "uid": 100,
                "id": "IND1",
                "samples": [{"uid": 1, "version": 1, "id": "S1"}]
            })],
        )
        .await
        .unwrap();
    store
        .seed(
            "file",
            [
                json!({"_id": "f1", "id": "a.vcf", "tags": null}),
                json!({"_id": "f2", "id": "b.vcf"}),
                json!({"_id": "f3", "id": "c.vcf", "tags": ["raw"]}),
            ],
        )
        .await
        .unwrap();
    store
        .seed("dataset", [json!({"_id": "d1", "id": "DS1"})])
        .await
        .unwrap();
    store
        .seed(
            "metadata",
            [json!({
                "_id": "META",
                "version": "1.4.0",
                "creationDate": "20190101120000",
                "admin": {"email": "a@b.com", "password": "p", "secretKey": "k"}
            })],
        )
        .await
        .unwrap();
    store
        .seed(
            "user",
            [json!({"_id": "u1", "id": "alice", "tools": [{"id": "t"}]})],
        )
        .await
        .unwrap();
    store
        .seed(
            "study",
            [json!({
                "_id": "st1",
                "id": "study1",
                "experiments": [],
                "lastModified": "20190101",
                "cipher": "none",
                "variableSets": [{
                    "id": "vs1",
                    "variables": [
                        {"id": "name", "type": "TEXT"},
                        {"id": "label", "type": "STRING"},
                        {"id": "nested", "type": "OBJECT", "variableSet": [
                            {"id": "inner", "type": "TEXT"}
                        ]}
                    ]
                }]
            })],
        )
        .await
        .unwrap();
    store
}

async fn by_id(store: &MemoryStore, collection: &str, id: &str) -> Document {
    store
        .find_in(collection)
        .filter(Filter::by_id(json!(id)))
        .fetch_one()
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_full_upgrade() {
    let store = seeded_catalog().await;

    let report = run_migrations(&store, &RunOptions::default()).await.unwrap();
    assert_eq!(report.target_version, "2.0.0");
    assert_eq!(report.applied.len(), 6);

    // Samples
    let s1 = by_id(&store, "sample", "s1").await;
    assert_eq!(s1["_individualUid"], json!(100));
    assert_eq!(s1["individualId"], json!("IND1"));
    let s2 = by_id(&store, "sample", "s2").await;
    assert_eq!(s2["_individualUid"], json!(-1));
    assert_eq!(s2["individualId"], json!(""));

    // Files
    assert_eq!(by_id(&store, "file", "f1").await["tags"], json!([]));
    assert!(!by_id(&store, "file", "f2").await.contains_key("tags"));
    assert_eq!(by_id(&store, "file", "f3").await["tags"], json!(["raw"]));

    // Dataset
    let collections = store.collection_names().await.unwrap();
    assert!(!collections.contains(&"dataset".to_string()));

    // Admin user
    let admin = store
        .find_in("user")
        .filter(Filter::eq("id", "opencga"))
        .fetch_one()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin["email"], json!("a@b.com"));
    assert_eq!(admin["password"], json!("p"));
    assert_eq!(admin["account"]["type"], json!("ADMINISTRATOR"));
    assert_eq!(admin["account"]["creationDate"], json!("20190101120000"));
    assert!(!admin.contains_key("tools"));

    let metadata = by_id(&store, "metadata", "META").await;
    assert_eq!(metadata["admin"], json!({"secretKey": "k"}));
    assert_eq!(metadata["version"], json!("1.4.0"));

    // Obsolete fields
    let alice = by_id(&store, "user", "u1").await;
    assert!(!alice.contains_key("tools"));
    let study = by_id(&store, "study", "st1").await;
    for field in ["experiments", "lastModified", "cipher"] {
        assert!(!study.contains_key(field), "{} still present", field);
    }

    // Variable types
    assert_eq!(
        study["variableSets"],
        json!([{
            "id": "vs1",
            "variables": [
                {"id": "name", "type": "STRING"},
                {"id": "label", "type": "STRING"},
                {"id": "nested", "type": "OBJECT", "variableSet": [
                    {"id": "inner", "type": "STRING"}
                ]}
            ]
        }])
    );
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let store = seeded_catalog().await;
    run_migrations(&store, &RunOptions::default()).await.unwrap();

    let mut before: Vec<(String, Vec<Document>)> = Vec::new();
    for name in store.collection_names().await.unwrap() {
        let docs = store.documents(&name).await;
        before.push((name, docs));
    }

    let report = run_migrations(&store, &RunOptions::default()).await.unwrap();

    for (name, docs) in before {
        assert_eq!(store.documents(&name).await, docs, "collection {} changed", name);
    }
    let summary = |id: &str| {
        report
            .applied
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.summary.clone())
            .unwrap()
    };
    assert_eq!(summary("m002_file_tags").get("files"), Some(0));
    assert_eq!(summary("m003_drop_dataset").get("dropped"), Some(0));
    assert_eq!(summary("m004_admin_user").get("inserted"), Some(0));
    assert_eq!(summary("m006_variable_type").get("studies_updated"), Some(0));
}

#[tokio::test]
async fn test_selected_step_only() {
    let store = seeded_catalog().await;
    let options = RunOptions {
        steps: vec!["m002_file_tags".to_string()],
        ..RunOptions::default()
    };

    let report = run_migrations(&store, &options).await.unwrap();

    assert_eq!(report.applied_ids(), vec!["m002_file_tags"]);
    assert_eq!(by_id(&store, "file", "f1").await["tags"], json!([]));
    assert!(store.collection_names().await.unwrap().contains(&"dataset".to_string()));
    let study = by_id(&store, "study", "st1").await;
    assert_eq!(study["cipher"], JsonValue::from("none"));
}

#[tokio::test]
async fn test_missing_metadata_stops_after_earlier_steps() {
    let store = seeded_catalog().await;
    store.drop_collection("metadata").await.unwrap();

    let result = run_migrations(&store, &RunOptions::default()).await;

    assert!(result.is_err());
    // Steps before the admin bootstrap stay applied, later ones never ran.
    assert_eq!(by_id(&store, "file", "f1").await["tags"], json!([]));
    assert_eq!(by_id(&store, "study", "st1").await["cipher"], json!("none"));
}
