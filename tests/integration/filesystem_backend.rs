//! Contents manager over a real directory tree

use super::test_utils::{fs_manager, save_text};
use nbcontents::{ContentKind, ContentsError, ModelRequest};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_created_entities_land_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());

    cm.create(Some(ModelRequest::directory()), "", "").unwrap();
    cm.create(None, "Untitled Folder", ".ipynb").unwrap();
    save_text(&cm, "Untitled Folder/notes.md", "# notes");

    let dir = temp_dir.path().join("Untitled Folder");
    assert!(dir.is_dir());
    assert!(dir.join("Untitled.ipynb").is_file());
    assert_eq!(fs::read_to_string(dir.join("notes.md")).unwrap(), "# notes");
}

#[test]
fn test_preexisting_files_are_served() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("data")).unwrap();
    fs::write(temp_dir.path().join("data/table.csv"), "a,b\n1,2\n").unwrap();
    fs::write(temp_dir.path().join("data/cache.pyc"), [0u8, 1, 2]).unwrap();
    let cm = fs_manager(temp_dir.path());

    let listing = cm.get("data", true).unwrap();
    let children = listing.children().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "table.csv");
    assert_eq!(children[0].kind, ContentKind::File);

    let csv = cm.get("data/table.csv", true).unwrap();
    assert_eq!(csv.text(), Some("a,b\n1,2\n"));
    assert_eq!(csv.mimetype.as_deref(), Some("text/csv"));
    assert!(csv.writable);
}

#[test]
fn test_rename_and_delete_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());
    cm.save(ModelRequest::directory(), "a").unwrap();
    save_text(&cm, "a/file.txt", "content");

    cm.update(ModelRequest::rename("b"), "a").unwrap();
    assert!(!temp_dir.path().join("a").exists());
    assert!(temp_dir.path().join("b/file.txt").is_file());

    cm.delete("b/file.txt").unwrap();
    cm.delete("b").unwrap();
    assert!(!temp_dir.path().join("b").exists());
}

#[test]
fn test_overwrite_leaves_no_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());
    for i in 0..5 {
        save_text(&cm, "a.txt", &format!("version {}", i));
    }

    let entries: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["a.txt".to_string()]);
    assert_eq!(cm.get("a.txt", true).unwrap().text(), Some("version 4"));
}

#[test]
fn test_directory_kind_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());
    save_text(&cm, "taken", "file");

    assert!(matches!(
        cm.save(ModelRequest::directory(), "taken"),
        Err(ContentsError::AlreadyExists(_))
    ));
    assert!(matches!(
        cm.save(ModelRequest::text("x"), "taken/child.txt"),
        Err(ContentsError::NotFound(_))
    ));
}

#[test]
fn test_info_string_names_root() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());
    assert!(cm.info_string().starts_with("Serving contents from local directory"));
}
