//! Notebook trust across save and load

use super::test_utils::{fs_manager, memory_manager, notebook_with_code, save_notebook, save_text};
use nbcontents::notary::SignatureStore;
use nbcontents::notebook::{Cell, Notebook, TRUSTED_KEY};
use nbcontents::ContentsError;
use tempfile::TempDir;

fn trusted_flags(nb: &Notebook) -> Vec<bool> {
    nb.code_cells().map(|c| c.is_trusted()).collect()
}

#[test]
fn test_trusted_save_is_trusted_on_load() {
    let cm = memory_manager();
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["a = 1", "b = 2"], true));

    let loaded = cm.get("nb.ipynb", true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![true, true]);
}

#[test]
fn test_untrusted_save_does_not_sign() {
    let cm = memory_manager();
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["import os"], false));
    assert_eq!(cm.trust().notary().store().len().unwrap(), 0);

    let loaded = cm.get("nb.ipynb", true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![false]);
}

#[test]
fn test_partially_trusted_save_does_not_sign() {
    let cm = memory_manager();
    let mut nb = notebook_with_code(&["a = 1"], true);
    nb.cells.push(Cell::code("b = 2"));
    save_notebook(&cm, "nb.ipynb", &nb);

    let loaded = cm.get("nb.ipynb", true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![false, false]);
}

#[test]
fn test_external_code_edit_revokes_trust() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 1"], true));

    let on_disk = temp_dir.path().join("nb.ipynb");
    let tampered = std::fs::read_to_string(&on_disk)
        .unwrap()
        .replace("x = 1", "x = 666");
    std::fs::write(&on_disk, tampered).unwrap();

    let loaded = cm.get("nb.ipynb", true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![false]);
}

#[test]
fn test_markdown_edit_keeps_trust() {
    let cm = memory_manager();
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 1"], true));

    let mut nb = cm.get("nb.ipynb", true).unwrap().notebook().unwrap().clone();
    nb.cells[0] = Cell::markdown("# rewritten");
    save_notebook(&cm, "nb.ipynb", &nb);

    let loaded = cm.get("nb.ipynb", true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![true]);
}

#[test]
fn test_trust_flags_never_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let cm = fs_manager(temp_dir.path());
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 1"], true));

    let raw = std::fs::read_to_string(temp_dir.path().join("nb.ipynb")).unwrap();
    assert!(!raw.contains(&format!("\"{}\"", TRUSTED_KEY)));
    assert!(raw.ends_with('\n'));
    assert!(raw.starts_with("{\n \""));
}

#[test]
fn test_trust_notebook_signs_current_cells() {
    let cm = memory_manager();
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["rm_rf()"], false));
    cm.trust_notebook("nb.ipynb").unwrap();

    let loaded = cm.get("nb.ipynb", true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![true]);
}

#[test]
fn test_trust_notebook_rejects_non_notebooks() {
    let cm = memory_manager();
    save_text(&cm, "a.txt", "x");
    assert!(matches!(
        cm.trust_notebook("a.txt"),
        Err(ContentsError::InvalidOperation(_))
    ));
    assert!(matches!(
        cm.trust_notebook("missing.ipynb"),
        Err(ContentsError::NotFound(_))
    ));
}

#[test]
fn test_untrust_notebook_forgets_signature() {
    let cm = memory_manager();
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 1"], true));
    assert_eq!(cm.trust().notary().store().len().unwrap(), 1);

    cm.untrust_notebook("nb.ipynb").unwrap();
    assert_eq!(cm.trust().notary().store().len().unwrap(), 0);
    let loaded = cm.get("nb.ipynb", true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![false]);

    assert!(matches!(
        cm.untrust_notebook("missing.ipynb"),
        Err(ContentsError::NotFound(_))
    ));
}

#[test]
fn test_copy_of_trusted_notebook_is_trusted() {
    let cm = memory_manager();
    save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 1"], true));
    let copy = cm.copy("nb.ipynb", None).unwrap();

    let loaded = cm.get(copy.path.as_str(), true).unwrap();
    assert_eq!(trusted_flags(loaded.notebook().unwrap()), vec![true]);
}
