//! Layered configuration and wiring the manager from it

use super::test_utils::{notebook_with_code, save_notebook, with_isolated_env};
use nbcontents::config::{ConfigLoader, ContentsConfig};
use nbcontents::{ContentsError, ContentsManager};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_workspace_config(workspace: &Path, name: &str, body: &str) {
    let dir = workspace.join(".nbcontents");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), body).unwrap();
}

const IN_MEMORY: &str = r#"
backend = "memory"

[notary]
secret = "integration-secret"
store = "memory"

[checkpoints]
backend = "memory"
"#;

#[test]
fn test_defaults_without_files() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    let config = with_isolated_env(&temp_dir, &[], || ConfigLoader::load(&workspace).unwrap());
    assert_eq!(config, ContentsConfig::default());
    assert_eq!(config.backend, "fs");
    assert_eq!(config.checkpoints.max_per_path, 10);
}

#[test]
fn test_in_memory_manager_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_config(&workspace, "config.toml", IN_MEMORY);

    let cm = with_isolated_env(&temp_dir, &[], || {
        let config = ConfigLoader::load(&workspace).unwrap();
        ContentsManager::from_config(&config, &workspace).unwrap()
    });
    assert_eq!(cm.info_string(), "Serving contents from in-memory contents");

    cm.create(None, "", ".ipynb").unwrap();
    assert!(cm.file_exists("Untitled.ipynb").unwrap());
    assert!(!workspace.join("Untitled.ipynb").exists());
}

#[test]
fn test_sled_stores_persist_trust_and_checkpoints() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(workspace.join("contents")).unwrap();
    write_workspace_config(
        &workspace,
        "config.toml",
        r#"
root_dir = "contents"

[notary]
secret_file = "state/secret"
db_path = "state/notary.db"

[checkpoints]
path = "state/checkpoints.db"
"#,
    );

    let checkpoint_id = with_isolated_env(&temp_dir, &[], || {
        let config = ConfigLoader::load(&workspace).unwrap();
        let cm = ContentsManager::from_config(&config, &workspace).unwrap();
        save_notebook(&cm, "nb.ipynb", &notebook_with_code(&["x = 1"], true));
        cm.create_checkpoint("nb.ipynb").unwrap().id
    });
    assert!(workspace.join("contents/nb.ipynb").is_file());
    assert!(workspace.join("state/secret").is_file());

    with_isolated_env(&temp_dir, &[], || {
        let config = ConfigLoader::load(&workspace).unwrap();
        let cm = ContentsManager::from_config(&config, &workspace).unwrap();
        let loaded = cm.get("nb.ipynb", true).unwrap();
        assert!(loaded.notebook().unwrap().code_cells().all(|c| c.is_trusted()));
        let ids: Vec<String> = cm
            .list_checkpoints("nb.ipynb")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![checkpoint_id.clone()]);
    });
}

#[test]
fn test_global_then_workspace_then_env_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    let global_dir = temp_dir.path().join("config").join("nbcontents");
    fs::create_dir_all(&global_dir).unwrap();
    fs::write(
        global_dir.join("config.toml"),
        "untitled_notebook = \"Scratch\"\nuntitled_file = \"scratch\"\nuntitled_directory = \"Box\"\n",
    )
    .unwrap();
    write_workspace_config(&workspace, "config.toml", "untitled_notebook = \"Draft\"\nuntitled_file = \"draft\"\n");
    write_workspace_config(&workspace, "ci.toml", "untitled_file = \"ci\"\n");

    let config = with_isolated_env(&temp_dir, &[("NBCONTENTS_ENV", "ci")], || {
        ConfigLoader::load(&workspace).unwrap()
    });
    assert_eq!(config.untitled_notebook, "Draft");
    assert_eq!(config.untitled_file, "ci");
    assert_eq!(config.untitled_directory, "Box");
}

#[test]
fn test_environment_overrides_files() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_config(&workspace, "config.toml", IN_MEMORY);

    let config = with_isolated_env(
        &temp_dir,
        &[
            ("NBCONTENTS__UNTITLED_NOTEBOOK", "FromEnv"),
            ("NBCONTENTS__CHECKPOINTS__MAX_PER_PATH", "3"),
            ("NBCONTENTS__HIDE_GLOBS", "*.tmp,*.bak"),
        ],
        || ConfigLoader::load(&workspace).unwrap(),
    );
    assert_eq!(config.untitled_notebook, "FromEnv");
    assert_eq!(config.checkpoints.max_per_path, 3);
    assert_eq!(config.hide_globs, vec!["*.tmp".to_string(), "*.bak".to_string()]);
    assert_eq!(config.backend, "memory");
}

#[test]
fn test_explicit_file_layer() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_config(&workspace, "config.toml", IN_MEMORY);
    let extra = temp_dir.path().join("extra.toml");
    fs::write(&extra, "untitled_directory = \"Folder\"\n").unwrap();

    let config = with_isolated_env(&temp_dir, &[], || {
        ConfigLoader::load_with(&workspace, Some(&extra)).unwrap()
    });
    assert_eq!(config.untitled_directory, "Folder");
    assert_eq!(config.backend, "memory");

    let only_file = ConfigLoader::load_from_file(&extra).unwrap();
    assert_eq!(only_file.untitled_directory, "Folder");
    assert_eq!(only_file.backend, "fs");
}

#[test]
fn test_invalid_values_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bad.toml");
    fs::write(
        &file,
        "backend = \"s3\"\n\n[notary]\ncull_fraction = 1.5\n",
    )
    .unwrap();

    match ConfigLoader::load_from_file(&file) {
        Err(ContentsError::ConfigError(message)) => {
            assert!(message.contains("backend"));
            assert!(message.contains("cull_fraction"));
        }
        other => panic!("expected config error, got {:?}", other.map(|_| ())),
    }
}
