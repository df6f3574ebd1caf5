//! Checkpoint lifecycle through the contents manager

use super::test_utils::{fs_manager, memory_manager, notebook_with_code, save_notebook, save_text, test_key};
use nbcontents::backend::MemoryBackend;
use nbcontents::checkpoints::SledCheckpointStore;
use nbcontents::manager::UntitledNames;
use nbcontents::notary::{DigestAlgorithm, MemorySignatureStore, NotebookNotary};
use nbcontents::path::HideFilter;
use nbcontents::{ContentsError, ContentsManager, ModelRequest};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_restore_is_byte_exact() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 1"], true));
    let original = std::fs::read(temp_dir.path().join("nb.ipynb")).unwrap();

    let checkpoint = cm.create_checkpoint("nb.ipynb").unwrap();
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 2", "y = 3"], true));
    assert_ne!(std::fs::read(temp_dir.path().join("nb.ipynb")).unwrap(), original);

    cm.restore_checkpoint("nb.ipynb", &checkpoint.id).unwrap();
    assert_eq!(std::fs::read(temp_dir.path().join("nb.ipynb")).unwrap(), original);
}

#[test]
fn test_list_is_oldest_first() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "one");
    let first = cm.create_checkpoint("a.txt").unwrap();
    save_text(&cm, "a.txt", "two");
    let second = cm.create_checkpoint("a.txt").unwrap();

    let ids: Vec<String> = cm
        .list_checkpoints("a.txt")
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn test_delete_file_clears_checkpoints() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "one");
    let checkpoint = cm.create_checkpoint("a.txt").unwrap();
    cm.delete("a.txt").unwrap();

    assert!(matches!(
        cm.list_checkpoints("a.txt"),
        Err(ContentsError::NotFound(_))
    ));
    // A new file at the same path starts without history
    save_text(&cm, "a.txt", "fresh");
    assert!(cm.list_checkpoints("a.txt").unwrap().is_empty());
    assert!(matches!(
        cm.restore_checkpoint("a.txt", &checkpoint.id),
        Err(ContentsError::NotFound(_))
    ));
}

#[test]
fn test_rename_carries_checkpoints() {
    let cm = memory_manager();
    cm.save(ModelRequest::directory(), "dir").unwrap();
    save_text(&cm, "dir/a.txt", "one");
    let checkpoint = cm.create_checkpoint("dir/a.txt").unwrap();

    cm.update(ModelRequest::rename("moved"), "dir").unwrap();
    let listed = cm.list_checkpoints("moved/a.txt").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, checkpoint.id);

    save_text(&cm, "moved/a.txt", "two");
    cm.restore_checkpoint("moved/a.txt", &checkpoint.id).unwrap();
    assert_eq!(cm.get("moved/a.txt", true).unwrap().text(), Some("one"));
}

#[test]
fn test_unknown_restore_leaves_content() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "current");
    cm.create_checkpoint("a.txt").unwrap();

    assert!(matches!(
        cm.restore_checkpoint("a.txt", "ffffffffffffffff"),
        Err(ContentsError::NotFound(_))
    ));
    assert_eq!(cm.get("a.txt", true).unwrap().text(), Some("current"));
}

#[test]
fn test_checkpoint_rejects_directories_and_missing_files() {
    let cm = memory_manager();
    cm.save(ModelRequest::directory(), "dir").unwrap();
    assert!(matches!(
        cm.create_checkpoint("dir"),
        Err(ContentsError::InvalidOperation(_))
    ));
    assert!(matches!(
        cm.create_checkpoint("missing.txt"),
        Err(ContentsError::NotFound(_))
    ));
    assert!(cm.list_checkpoints("dir").unwrap().is_empty());
}

#[test]
fn test_delete_single_checkpoint() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "one");
    let keep = cm.create_checkpoint("a.txt").unwrap();
    let drop = cm.create_checkpoint("a.txt").unwrap();

    cm.delete_checkpoint("a.txt", &drop.id).unwrap();
    let ids: Vec<String> = cm
        .list_checkpoints("a.txt")
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![keep.id]);
    assert!(matches!(
        cm.delete_checkpoint("a.txt", &drop.id),
        Err(ContentsError::NotFound(_))
    ));
}

#[test]
fn test_sled_checkpoints_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("checkpoints.db");

    let build = |backend: Arc<MemoryBackend>| {
        let notary = NotebookNotary::new(
            test_key(),
            DigestAlgorithm::Blake3Keyed,
            Arc::new(MemorySignatureStore::default()),
        );
        ContentsManager::new(
            backend,
            Arc::new(SledCheckpointStore::new(&db_path, 10).unwrap()),
            Arc::new(notary),
            HideFilter::default(),
            UntitledNames::default(),
        )
    };

    let backend = Arc::new(MemoryBackend::new());
    let id = {
        let cm = build(backend.clone());
        save_text(&cm, "a.txt", "persisted");
        cm.create_checkpoint("a.txt").unwrap().id
    };

    let cm = build(backend);
    save_text(&cm, "a.txt", "changed");
    cm.restore_checkpoint("a.txt", &id).unwrap();
    assert_eq!(cm.get("a.txt", true).unwrap().text(), Some("persisted"));
}
