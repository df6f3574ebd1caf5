//! Contents API behavior over the in-memory backend

use super::test_utils::{memory_manager, notebook_with_code, save_notebook, save_text};
use nbcontents::notebook::{Cell, Notebook, Source};
use nbcontents::path::normalize;
use nbcontents::{Content, ContentKind, ContentsError, Format, GetOptions, ModelRequest};
use serde_json::json;

#[test]
fn test_create_twice_in_directory() {
    let cm = memory_manager();
    cm.save(ModelRequest::directory(), "work").unwrap();

    let first = cm.create(None, "work", ".ipynb").unwrap();
    let second = cm.create(None, "work", ".ipynb").unwrap();
    assert_eq!(first.path.as_str(), "work/Untitled.ipynb");
    assert_eq!(second.path.as_str(), "work/Untitled0.ipynb");
    assert_eq!(first.kind, ContentKind::Notebook);

    let text = cm.create(None, "work", ".txt").unwrap();
    assert_eq!(text.path.as_str(), "work/untitled.txt");
    assert_eq!(text.kind, ContentKind::File);
}

#[test]
fn test_create_at_exact_path_never_overwrites() {
    let cm = memory_manager();
    cm.create(None, "notes.txt", ".txt").unwrap();
    assert!(matches!(
        cm.create(None, "notes.txt", ".txt"),
        Err(ContentsError::AlreadyExists(_))
    ));
}

#[test]
fn test_create_requires_parent() {
    let cm = memory_manager();
    assert!(matches!(
        cm.create(None, "missing/nb.ipynb", ".ipynb"),
        Err(ContentsError::NotFound(_))
    ));
}

#[test]
fn test_copy_names() {
    let cm = memory_manager();
    save_notebook(&cm, "nb.ipynb", &Notebook::new());

    let first = cm.copy("nb.ipynb", None).unwrap();
    assert_eq!(first.path.as_str(), "nb-Copy.ipynb");
    let second = cm.copy("nb.ipynb", None).unwrap();
    assert_eq!(second.path.as_str(), "nb-Copy0.ipynb");
    // Copying a copy does not stack markers
    let third = cm.copy("nb-Copy0.ipynb", Some("")).unwrap();
    assert_eq!(third.path.as_str(), "nb-Copy1.ipynb");
}

#[test]
fn test_copy_to_explicit_path() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "alpha");
    cm.save(ModelRequest::directory(), "dir").unwrap();

    cm.copy("a.txt", Some("dir/b.txt")).unwrap();
    assert_eq!(cm.get("dir/b.txt", true).unwrap().text(), Some("alpha"));
    assert!(matches!(
        cm.copy("a.txt", Some("dir/b.txt")),
        Err(ContentsError::AlreadyExists(_))
    ));
    assert!(matches!(
        cm.copy("dir", None),
        Err(ContentsError::InvalidOperation(_))
    ));
}

#[test]
fn test_hidden_entries_excluded_but_readable() {
    let cm = memory_manager();
    save_text(&cm, "visible.py", "x = 1");
    save_text(&cm, "visible.pyc", "compiled");
    cm.save(ModelRequest::directory(), "__pycache__").unwrap();

    let listing = cm.get("", true).unwrap();
    let names: Vec<&str> = listing
        .children()
        .unwrap()
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["visible.py"]);

    let hidden = cm.get("visible.pyc", true).unwrap();
    assert_eq!(hidden.text(), Some("compiled"));
    assert!(cm.dir_exists("__pycache__").unwrap());
}

#[test]
fn test_listing_children_carry_no_content() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "alpha");
    save_notebook(&cm, "b.ipynb", &Notebook::new());

    let listing = cm.get("", true).unwrap();
    assert_eq!(listing.format, Some(Format::Json));
    for child in listing.children().unwrap() {
        assert!(child.content.is_none());
        assert!(child.format.is_none());
    }
    let kinds: Vec<ContentKind> = listing.children().unwrap().iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![ContentKind::File, ContentKind::Notebook]);
}

#[test]
fn test_rename_moves_directory_tree() {
    let cm = memory_manager();
    cm.save(ModelRequest::directory(), "src").unwrap();
    save_text(&cm, "src/a.txt", "alpha");

    let moved = cm.update(ModelRequest::rename("dst"), "src").unwrap();
    assert_eq!(moved.path.as_str(), "dst");
    assert!(!cm.exists("src").unwrap());
    assert_eq!(cm.get("dst/a.txt", true).unwrap().text(), Some("alpha"));
}

#[test]
fn test_rename_refuses_existing_target() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "alpha");
    save_text(&cm, "b.txt", "beta");
    assert!(matches!(
        cm.update(ModelRequest::rename("b.txt"), "a.txt"),
        Err(ContentsError::AlreadyExists(_))
    ));
    assert!(matches!(
        cm.update(ModelRequest::rename("c.txt"), "missing.txt"),
        Err(ContentsError::NotFound(_))
    ));
    assert_eq!(cm.get("b.txt", true).unwrap().text(), Some("beta"));
}

#[test]
fn test_delete_rules() {
    let cm = memory_manager();
    cm.save(ModelRequest::directory(), "dir").unwrap();
    save_text(&cm, "dir/a.txt", "alpha");

    assert!(matches!(cm.delete("dir"), Err(ContentsError::InvalidOperation(_))));
    assert!(matches!(cm.delete(""), Err(ContentsError::InvalidOperation(_))));
    assert!(matches!(cm.delete("nope"), Err(ContentsError::NotFound(_))));

    cm.delete("dir/a.txt").unwrap();
    cm.delete("dir").unwrap();
    assert!(!cm.exists("dir").unwrap());
}

#[test]
fn test_invalid_notebook_saves_with_message() {
    let cm = memory_manager();
    let mut nb = notebook_with_code(&["print(1)"], true);
    nb.cells.push(Cell {
        cell_type: "bogus".to_string(),
        ..Cell::markdown("")
    });

    let saved = cm.save(ModelRequest::notebook(&nb).unwrap(), "bad.ipynb").unwrap();
    let message = saved.message.expect("validation message");
    assert!(message.contains("bogus"));

    let loaded = cm.get("bad.ipynb", true).unwrap();
    assert!(loaded.message.as_deref().unwrap().contains("bogus"));
    assert_eq!(loaded.notebook().unwrap().cells.len(), 3);
}

#[test]
fn test_schema_invalid_notebook_is_viewable_and_fixable() {
    let cm = memory_manager();
    let document = json!({
        "cells": [{"cell_type": "code", "source": 5, "metadata": {},
                   "outputs": [], "execution_count": null}],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5
    });
    let request = ModelRequest {
        content: Some(document),
        ..ModelRequest::notebook(&Notebook::new()).unwrap()
    };

    let saved = cm.save(request, "odd.ipynb").unwrap();
    assert!(saved.message.unwrap().contains("source must be a string"));

    let loaded = cm.get("odd.ipynb", true).unwrap();
    assert!(loaded.message.as_deref().unwrap().contains("source must be a string"));
    let nb = loaded.notebook().unwrap();
    assert_eq!(nb.cells[0].source, Source::Other(json!(5)));
    assert!(!nb.cells[0].is_trusted());

    // readable sources still carry trust
    cm.trust_notebook("odd.ipynb").unwrap();
    let trusted = cm.get("odd.ipynb", true).unwrap();
    assert!(trusted.notebook().unwrap().cells[0].is_trusted());

    // written straight to storage, bypassing save
    let raw = normalize("raw.ipynb").unwrap();
    let bytes = serde_json::to_vec(&json!({"cells": {}, "metadata": {}, "nbformat": "4"})).unwrap();
    cm.backend().write_raw(&raw, &bytes).unwrap();
    let loaded = cm.get("raw.ipynb", true).unwrap();
    assert!(loaded.message.as_deref().unwrap().contains("nbformat"));

    // fix and save back
    let mut fixed = loaded.notebook().unwrap().clone();
    fixed.extra.clear();
    fixed.cells.push(Cell::code("x = 1"));
    let saved = cm.save(ModelRequest::notebook(&fixed).unwrap(), "raw.ipynb").unwrap();
    assert!(saved.message.is_none());
    assert!(cm.get("raw.ipynb", true).unwrap().message.is_none());
}

#[test]
fn test_non_object_notebook_is_unreadable() {
    let cm = memory_manager();
    let request = ModelRequest {
        content: Some(json!([1, 2, 3])),
        ..ModelRequest::notebook(&Notebook::new()).unwrap()
    };
    assert!(matches!(
        cm.save(request, "list.ipynb"),
        Err(ContentsError::InvalidContent(_))
    ));
    assert!(!cm.exists("list.ipynb").unwrap());

    cm.backend()
        .write_raw(&normalize("broken.ipynb").unwrap(), b"{\"cells\": [")
        .unwrap();
    assert!(matches!(
        cm.get("broken.ipynb", true),
        Err(ContentsError::InvalidContent(_))
    ));
}

#[test]
fn test_binary_file_round_trip() {
    let cm = memory_manager();
    let bytes = [0u8, 159, 146, 150, 255];
    cm.save(ModelRequest::binary(&bytes), "blob.bin").unwrap();

    let model = cm.get("blob.bin", true).unwrap();
    assert_eq!(model.format, Some(Format::Base64));
    assert_eq!(model.mimetype.as_deref(), Some("application/octet-stream"));

    let forced = cm.get_with(
        "blob.bin",
        GetOptions {
            format: Some(Format::Text),
            ..GetOptions::default()
        },
    );
    assert!(matches!(forced, Err(ContentsError::InvalidContent(_))));
}

#[test]
fn test_paths_are_normalized() {
    let cm = memory_manager();
    cm.save(ModelRequest::directory(), "/dir/").unwrap();
    save_text(&cm, "dir/a.txt", "alpha");

    let model = cm.get("/dir/a.txt", false).unwrap();
    assert_eq!(model.path.as_str(), "dir/a.txt");
    assert!(model.content.is_none());
    assert!(matches!(
        cm.get("dir/../a.txt", true),
        Err(ContentsError::InvalidPath(_))
    ));
    assert!(matches!(
        cm.get("dir/.ipynb_checkpoints/a.txt", true),
        Err(ContentsError::InvalidPath(_))
    ));
}

#[test]
fn test_model_wire_shape() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "alpha");
    let value = serde_json::to_value(cm.get("a.txt", true).unwrap()).unwrap();
    assert_eq!(value["type"], "file");
    assert_eq!(value["format"], "text");
    assert_eq!(value["content"], "alpha");
    assert_eq!(value["mimetype"], "text/plain");

    let dir = serde_json::to_value(cm.get("", true).unwrap()).unwrap();
    assert_eq!(dir["type"], "directory");
    assert!(matches!(
        cm.get("", true).unwrap().content,
        Some(Content::Directory(_))
    ));
}
