use egui::vec2;
use paint_document::persistence::DocumentRecord;
use paint_document::{Document, DocumentStore, EditorConfig, PersistenceError};
use std::fs;
use uuid::Uuid;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sample_document(name: &str, config: &EditorConfig) -> Document {
    let mut document = Document::new(name, vec2(320.0, 240.0), config);
    document.add_layer();
    document.commit_stroke(1, b"opaque stroke bytes".to_vec());
    document.set_layer_opacity(0, 0.6);
    document
}

#[test]
fn save_then_load_restores_document() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let document = sample_document("Portrait", &config);

    store.save(&document).unwrap();
    let loaded = store.load(document.id()).unwrap();

    assert_eq!(loaded.name(), "Portrait");
    assert_eq!(loaded.layers().layers(), document.layers().layers());
    assert_eq!(loaded.active_layer_index(), document.active_layer_index());
    assert_eq!(loaded.created_at(), document.created_at());
    assert_eq!(loaded.updated_at(), document.updated_at());
    assert_eq!(store.recent().len(), 1);
}

#[test]
fn save_leaves_no_temp_files() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let mut document = sample_document("Portrait", &config);
    store.save(&document).unwrap();
    document.rename("Portrait 2");
    store.save(&document).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, [format!("{}.json", document.id())]);
    assert_eq!(store.load(document.id()).unwrap().name(), "Portrait 2");
    assert_eq!(store.recent().len(), 1);
}

#[test]
fn file_uses_documented_field_names() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let document = sample_document("Fields", &config);
    store.save(&document).unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(store.path_for(document.id())).unwrap()).unwrap();
    for key in [
        "id",
        "name",
        "canvasWidth",
        "canvasHeight",
        "backgroundColor",
        "layers",
        "activeLayerIndex",
        "createdAt",
        "updatedAt",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    let layer = &json["layers"][1];
    assert_eq!(layer["version"], 1);
    assert_eq!(layer["isVisible"], true);
    assert!(layer["drawingData"].is_string());
}

#[test]
fn scan_skips_corrupt_files_and_sorts_newest_first() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();

    let older = sample_document("Older", &config);
    let mut newer = sample_document("Newer", &config);
    newer.rename("Newer");
    store.save(&newer).unwrap();
    store.save(&older).unwrap();
    fs::write(dir.path().join("broken.json"), b"{ this is not a document").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let reopened = DocumentStore::open(dir.path(), &config).unwrap();
    let names: Vec<&str> = reopened
        .recent()
        .entries()
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(names, ["Newer", "Older"]);
    assert!(dir.path().join("broken.json").exists());
}

#[test]
fn scan_deletes_documents_beyond_the_cap() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let documents: Vec<Document> = (0..4)
        .map(|i| sample_document(&format!("Doc {i}"), &config))
        .collect();
    for document in &documents {
        store.save(document).unwrap();
    }

    let capped = EditorConfig {
        max_recent_documents: 2,
        ..EditorConfig::default()
    };
    let reopened = DocumentStore::open(dir.path(), &capped).unwrap();
    let kept: Vec<Uuid> = reopened.recent().entries().iter().map(|e| e.id).collect();
    assert_eq!(kept, [documents[3].id(), documents[2].id()]);
    assert!(!reopened.path_for(documents[0].id()).exists());
    assert!(!reopened.path_for(documents[1].id()).exists());
    assert!(reopened.path_for(documents[3].id()).exists());
}

#[test]
fn saving_past_the_cap_removes_oldest_file() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig {
        max_recent_documents: 1,
        ..EditorConfig::default()
    };
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let first = sample_document("First", &config);
    let second = sample_document("Second", &config);
    store.save(&first).unwrap();
    store.save(&second).unwrap();

    assert_eq!(store.recent().len(), 1);
    assert!(!store.path_for(first.id()).exists());
    assert!(matches!(
        store.load(first.id()),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn legacy_layers_without_version_load_at_zero() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let document = sample_document("Legacy", &config);

    let mut json = serde_json::to_value(DocumentRecord::from(&document)).unwrap();
    for layer in json["layers"].as_array_mut().unwrap() {
        layer.as_object_mut().unwrap().remove("version");
    }
    fs::write(
        dir.path().join(format!("{}.json", document.id())),
        serde_json::to_vec(&json).unwrap(),
    )
    .unwrap();

    let store = DocumentStore::open(dir.path(), &config).unwrap();
    let loaded = store.load(document.id()).unwrap();
    assert!(loaded.layers().iter().all(|layer| layer.version() == 0));
    assert_eq!(
        loaded.layers().layers()[1].content(),
        b"opaque stroke bytes"
    );
}

#[test]
fn delete_removes_file_and_index_entry() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let document = sample_document("Gone", &config);
    store.save(&document).unwrap();

    store.delete(document.id()).unwrap();
    assert!(store.recent().is_empty());
    assert!(matches!(
        store.delete(document.id()),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn failed_save_keeps_previous_file_and_index() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let mut document = sample_document("Before", &config);
    store.save(&document).unwrap();

    // A directory where the temp file goes makes the write fail
    fs::create_dir(dir.path().join(format!(".{}.json.tmp", document.id()))).unwrap();
    document.rename("After");
    assert!(matches!(
        store.save(&document),
        Err(PersistenceError::IoError(_))
    ));

    assert_eq!(store.load(document.id()).unwrap().name(), "Before");
    assert_eq!(store.recent().get(document.id()).unwrap().name, "Before");
}

#[test]
fn scan_skips_files_not_named_after_their_document() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let document = sample_document("Original", &config);
    store.save(&document).unwrap();
    fs::copy(store.path_for(document.id()), dir.path().join("copy.json")).unwrap();

    let reopened = DocumentStore::open(dir.path(), &config).unwrap();
    assert_eq!(reopened.recent().len(), 1);
    assert_eq!(
        reopened.recent().get(document.id()).unwrap().path,
        reopened.path_for(document.id())
    );
    assert!(dir.path().join("copy.json").exists());
    assert_eq!(reopened.load(document.id()).unwrap().name(), "Original");
}

#[test]
fn saving_an_old_document_at_the_cap_keeps_it() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig {
        max_recent_documents: 2,
        ..EditorConfig::default()
    };
    let mut store = DocumentStore::open(dir.path(), &config).unwrap();
    let stale = sample_document("Stale", &config);
    std::thread::sleep(std::time::Duration::from_millis(5));
    let first = sample_document("First", &config);
    let second = sample_document("Second", &config);
    store.save(&first).unwrap();
    store.save(&second).unwrap();

    store.save(&stale).unwrap();

    assert_eq!(store.recent().len(), 2);
    assert!(store.recent().get(stale.id()).is_some());
    assert!(store.path_for(stale.id()).exists());
    assert!(!store.path_for(first.id()).exists());
    assert!(store.path_for(second.id()).exists());
}
