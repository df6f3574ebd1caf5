//! Contents Manager
//!
//! Path-addressed CRUD over files, directories and notebooks. Every operation
//! normalizes its path first, then talks to storage only through the
//! [`StorageBackend`]. Notebooks pass through the [`TrustMediator`] on load and
//! save; checkpoints go to the configured [`CheckpointStore`].

use crate::backend::{EntryStat, FileSystemBackend, MemoryBackend, StorageBackend};
use crate::checkpoints::{
    CheckpointModel, CheckpointStore, MemoryCheckpointStore, SledCheckpointStore,
};
use crate::concurrency::PathLockManager;
use crate::config::ContentsConfig;
use crate::error::ContentsError;
use crate::model::{Content, ContentKind, Format, Model, ModelRequest};
use crate::notary::{
    MemorySignatureStore, NotebookNotary, SignatureStore, SigningKey, SledSignatureStore,
};
use crate::notebook::{self, Notebook};
use crate::path::{self, normalize, split_extension, ApiPath, HideFilter};
use crate::trust::{TrustMediator, TrustState};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extension that marks a file as a notebook
pub const NOTEBOOK_EXTENSION: &str = ".ipynb";

const COPY_MARKER: &str = "-Copy";

/// Base names for entities created without an explicit name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntitledNames {
    pub notebook: String,
    pub file: String,
    pub directory: String,
}

impl Default for UntitledNames {
    fn default() -> Self {
        Self {
            notebook: "Untitled".to_string(),
            file: "untitled".to_string(),
            directory: "Untitled Folder".to_string(),
        }
    }
}

/// Optional hints for [`ContentsManager::get_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetOptions {
    pub content: bool,
    /// Expected kind; a notebook may be read as a plain file
    pub kind: Option<ContentKind>,
    /// Forced encoding for file content
    pub format: Option<Format>,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            content: true,
            kind: None,
            format: None,
        }
    }
}

impl GetOptions {
    /// Metadata only, no content
    pub fn metadata() -> Self {
        Self {
            content: false,
            ..Self::default()
        }
    }
}

pub struct ContentsManager {
    backend: Arc<dyn StorageBackend>,
    checkpoints: Arc<dyn CheckpointStore>,
    trust: TrustMediator,
    hide: HideFilter,
    untitled: UntitledNames,
    locks: PathLockManager,
}

fn is_notebook_name(name: &str) -> bool {
    name.ends_with(NOTEBOOK_EXTENSION)
}

fn kind_of(name: &str, stat: &EntryStat) -> ContentKind {
    if stat.is_dir {
        ContentKind::Directory
    } else if is_notebook_name(name) {
        ContentKind::Notebook
    } else {
        ContentKind::File
    }
}

fn base_model(path: &ApiPath, kind: ContentKind, stat: &EntryStat) -> Model {
    Model {
        name: path.name().to_string(),
        path: path.clone(),
        kind,
        content: None,
        format: None,
        mimetype: None,
        created: stat.created,
        last_modified: stat.last_modified,
        writable: stat.writable,
        message: None,
    }
}

fn guess_mimetype(name: &str, format: Format) -> String {
    match mime_guess::from_path(name).first() {
        Some(mime) => mime.essence_str().to_string(),
        None if format == Format::Text => "text/plain".to_string(),
        None => "application/octet-stream".to_string(),
    }
}

/// `nb-Copy3` -> `nb`
fn strip_copy_marker(base: &str) -> &str {
    let trimmed = base.trim_end_matches(|c: char| c.is_ascii_digit());
    trimmed.strip_suffix(COPY_MARKER).unwrap_or(base)
}

impl ContentsManager {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        checkpoints: Arc<dyn CheckpointStore>,
        notary: Arc<NotebookNotary>,
        hide: HideFilter,
        untitled: UntitledNames,
    ) -> Self {
        Self {
            backend,
            checkpoints,
            trust: TrustMediator::new(notary),
            hide,
            untitled,
            locks: PathLockManager::new(),
        }
    }

    /// Everything in memory: contents, checkpoints and signatures
    pub fn in_memory(key: SigningKey) -> Self {
        let notary = NotebookNotary::new(
            key,
            crate::notary::DigestAlgorithm::Blake3Keyed,
            Arc::new(MemorySignatureStore::default()),
        );
        Self::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryCheckpointStore::default()),
            Arc::new(notary),
            HideFilter::default(),
            UntitledNames::default(),
        )
    }

    /// Wire up backends and stores as configured
    ///
    /// Relative paths in `config` are taken against `workspace_root`.
    pub fn from_config(
        config: &ContentsConfig,
        workspace_root: &Path,
    ) -> Result<Self, ContentsError> {
        let backend: Arc<dyn StorageBackend> = match config.backend.as_str() {
            "memory" => Arc::new(MemoryBackend::new()),
            _ => Arc::new(FileSystemBackend::new(config.root_path(workspace_root))?),
        };

        let policy = config.notary.policy();
        let store: Arc<dyn SignatureStore> = match config.notary.store.as_str() {
            "memory" => Arc::new(MemorySignatureStore::new(policy)),
            _ => Arc::new(SledSignatureStore::new(
                config.notary_db_path(workspace_root),
                policy,
            )?),
        };
        let key = match &config.notary.secret {
            Some(secret) => SigningKey::from_secret(secret.as_bytes()),
            None => SigningKey::load_or_create(&config.secret_file_path(workspace_root))?,
        };
        let notary = NotebookNotary::new(key, config.notary.algorithm.parse()?, store);

        let max = config.checkpoints.max_per_path;
        let checkpoints: Arc<dyn CheckpointStore> = match config.checkpoints.backend.as_str() {
            "memory" => Arc::new(MemoryCheckpointStore::new(max)),
            _ => Arc::new(SledCheckpointStore::new(
                config.checkpoint_db_path(workspace_root),
                max,
            )?),
        };

        let manager = Self::new(
            backend,
            checkpoints,
            Arc::new(notary),
            HideFilter::new(&config.hide_globs)?,
            UntitledNames {
                notebook: config.untitled_notebook.clone(),
                file: config.untitled_file.clone(),
                directory: config.untitled_directory.clone(),
            },
        );
        info!("{}", manager.info_string());
        Ok(manager)
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn trust(&self) -> &TrustMediator {
        &self.trust
    }

    /// One-line description of what is being served
    pub fn info_string(&self) -> String {
        format!("Serving contents from {}", self.backend.describe())
    }

    /// Should `name` appear in directory listings?
    pub fn should_list(&self, name: &str) -> bool {
        !self.hide.is_hidden(name)
    }

    pub fn exists(&self, path: &str) -> Result<bool, ContentsError> {
        let path = normalize(path)?;
        Ok(self.backend.file_exists(&path)? || self.backend.dir_exists(&path)?)
    }

    pub fn file_exists(&self, path: &str) -> Result<bool, ContentsError> {
        Ok(self.backend.file_exists(&normalize(path)?)?)
    }

    pub fn dir_exists(&self, path: &str) -> Result<bool, ContentsError> {
        Ok(self.backend.dir_exists(&normalize(path)?)?)
    }

    fn exists_at(&self, path: &ApiPath) -> Result<bool, ContentsError> {
        Ok(self.backend.file_exists(path)? || self.backend.dir_exists(path)?)
    }

    /// First free name in `dir` for `name`
    ///
    /// `name` itself when free, then `<base>0<ext>`, `<base>1<ext>`, ... with
    /// the extension taken at the last dot.
    pub fn increment_filename(&self, name: &str, dir: &str) -> Result<String, ContentsError> {
        let dir = normalize(dir)?;
        let (base, ext) = split_extension(name);
        self.first_free_name(&dir, base, ext, "")
    }

    fn first_free_name(
        &self,
        dir: &ApiPath,
        base: &str,
        ext: &str,
        insert: &str,
    ) -> Result<String, ContentsError> {
        let first = format!("{}{}", base, ext);
        if !self.exists_at(&path::join(dir, &first)?)? {
            return Ok(first);
        }
        let mut index: u64 = 0;
        loop {
            let candidate = format!("{}{}{}{}", base, insert, index, ext);
            if !self.exists_at(&path::join(dir, &candidate)?)? {
                return Ok(candidate);
            }
            index += 1;
        }
    }

    fn require_parent_dir(&self, path: &ApiPath) -> Result<(), ContentsError> {
        let parent = path.parent();
        if self.backend.dir_exists(&parent)? {
            Ok(())
        } else {
            Err(ContentsError::NotFound(format!(
                "parent directory {:?} of {}",
                parent.as_str(),
                path
            )))
        }
    }

    // ---- read ----

    /// Model for `path`, with content unless `content` is false
    pub fn get(&self, path: &str, content: bool) -> Result<Model, ContentsError> {
        self.get_with(
            path,
            GetOptions {
                content,
                ..GetOptions::default()
            },
        )
    }

    pub fn get_with(&self, path: &str, options: GetOptions) -> Result<Model, ContentsError> {
        let path = normalize(path)?;
        self.get_at(&path, options)
    }

    fn get_at(&self, path: &ApiPath, options: GetOptions) -> Result<Model, ContentsError> {
        if self.backend.dir_exists(path)? {
            if matches!(options.kind, Some(kind) if kind != ContentKind::Directory) {
                return Err(ContentsError::InvalidOperation(format!(
                    "{} is a directory",
                    path
                )));
            }
            return self.directory_model(path, options.content);
        }
        if !self.backend.file_exists(path)? {
            return Err(ContentsError::NotFound(path.to_string()));
        }
        match options.kind {
            Some(ContentKind::Directory) => Err(ContentsError::InvalidOperation(format!(
                "{} is not a directory",
                path
            ))),
            Some(ContentKind::File) => self.file_model(path, options.content, options.format),
            _ if is_notebook_name(path.name()) => self.notebook_model(path, options.content),
            Some(ContentKind::Notebook) => Err(ContentsError::InvalidOperation(format!(
                "{} is not a notebook",
                path
            ))),
            None => self.file_model(path, options.content, options.format),
        }
    }

    fn directory_model(&self, path: &ApiPath, content: bool) -> Result<Model, ContentsError> {
        let stat = self.backend.stat(path)?;
        let mut model = base_model(path, ContentKind::Directory, &stat);
        if !content {
            return Ok(model);
        }

        let mut children = Vec::new();
        for name in self.backend.list_children(path)? {
            if !self.should_list(&name) {
                continue;
            }
            let child = match path::join(path, &name) {
                Ok(child) => child,
                Err(e) => {
                    debug!(dir = %path, name = %name, error = %e, "Skipping unaddressable entry");
                    continue;
                }
            };
            let stat = self.backend.stat(&child)?;
            children.push(base_model(&child, kind_of(&name, &stat), &stat));
        }
        model.content = Some(Content::Directory(children));
        model.format = Some(Format::Json);
        Ok(model)
    }

    fn file_model(
        &self,
        path: &ApiPath,
        content: bool,
        format: Option<Format>,
    ) -> Result<Model, ContentsError> {
        let stat = self.backend.stat(path)?;
        let mut model = base_model(path, ContentKind::File, &stat);
        if !content {
            return Ok(model);
        }

        let bytes = self.backend.read_raw(path)?;
        let (text, format) = match format {
            Some(Format::Base64) => (BASE64.encode(&bytes), Format::Base64),
            Some(Format::Text) => match String::from_utf8(bytes) {
                Ok(text) => (text, Format::Text),
                Err(_) => {
                    return Err(ContentsError::InvalidContent(format!(
                        "{} is not UTF-8 encoded",
                        path
                    )))
                }
            },
            _ => match String::from_utf8(bytes) {
                Ok(text) => (text, Format::Text),
                Err(e) => (BASE64.encode(e.as_bytes()), Format::Base64),
            },
        };
        model.mimetype = Some(guess_mimetype(path.name(), format));
        model.content = Some(Content::Text(text));
        model.format = Some(format);
        Ok(model)
    }

    fn notebook_model(&self, path: &ApiPath, content: bool) -> Result<Model, ContentsError> {
        let stat = self.backend.stat(path)?;
        let mut model = base_model(path, ContentKind::Notebook, &stat);
        if !content {
            return Ok(model);
        }

        let bytes = self.backend.read_raw(path)?;
        let mut nb = Notebook::from_slice(&bytes)?;
        self.trust.mark_cells_from_signature(&mut nb, path);
        if let Err(e) = notebook::validate(&nb) {
            warn!(path = %path, "Notebook does not validate");
            model.message = Some(e.to_string());
        }
        model.content = Some(Content::Notebook(nb));
        model.format = Some(Format::Json);
        Ok(model)
    }

    // ---- write ----

    /// Write a model at `path`, returning its metadata
    pub fn save(&self, request: ModelRequest, path: &str) -> Result<Model, ContentsError> {
        let path = normalize(path)?;
        let lock = self.locks.get_lock(&path);
        let _guard = lock.write();
        self.save_locked(request, &path)
    }

    /// Caller holds the write lock for `path`
    fn save_locked(&self, request: ModelRequest, path: &ApiPath) -> Result<Model, ContentsError> {
        let kind = request.kind()?;
        if path.is_root() {
            if kind == ContentKind::Directory {
                return self.get_at(path, GetOptions::metadata());
            }
            return Err(ContentsError::InvalidPath(
                "cannot write content to the root".to_string(),
            ));
        }
        self.require_parent_dir(path)?;

        let mut message = None;
        match kind {
            ContentKind::Notebook => {
                let content = request.content.ok_or_else(|| {
                    ContentsError::InvalidContent("no notebook content".to_string())
                })?;
                let nb = Notebook::from_value(content)?;
                message = self.save_notebook(path, &nb)?;
            }
            ContentKind::File => {
                let bytes = decode_file_content(&request)?;
                self.backend.write_raw(path, &bytes)?;
            }
            ContentKind::Directory => {
                if self.backend.file_exists(path)? {
                    return Err(ContentsError::AlreadyExists(format!(
                        "{} exists and is not a directory",
                        path
                    )));
                }
                if !self.backend.dir_exists(path)? {
                    self.backend.create_dir(path)?;
                }
            }
        }
        debug!(path = %path, kind = %kind, "Saved");

        let mut model = self.get_at(path, GetOptions::metadata())?;
        model.message = message;
        Ok(model)
    }

    /// Validate, sign if trusted, persist without trust flags. Returns the
    /// validation message, if any.
    fn save_notebook(&self, path: &ApiPath, nb: &Notebook) -> Result<Option<String>, ContentsError> {
        let message = match notebook::validate(nb) {
            Ok(()) => None,
            Err(e) => {
                warn!(path = %path, "Saving notebook that does not validate");
                Some(e.to_string())
            }
        };
        self.trust.prepare_for_save(nb, path);
        self.backend.write_raw(path, &nb.to_persisted_bytes()?)?;
        Ok(message)
    }

    /// Create a new entity
    ///
    /// When `path` is an existing directory a fresh untitled name is picked
    /// inside it; otherwise `path` is the full target and must be free.
    /// Without content, `ext` decides between an empty notebook and an empty
    /// text file.
    pub fn create(
        &self,
        request: Option<ModelRequest>,
        path: &str,
        ext: &str,
    ) -> Result<Model, ContentsError> {
        let path = normalize(path)?;
        let request = self.default_request(request.unwrap_or_default(), ext)?;
        let kind = request.kind()?;

        if self.backend.dir_exists(&path)? {
            let dir_lock = self.locks.get_lock(&path);
            let _dir_guard = dir_lock.write();
            let name = match kind {
                ContentKind::Directory => {
                    self.first_free_name(&path, &self.untitled.directory, "", " ")?
                }
                ContentKind::Notebook => self.first_free_name(&path, &self.untitled.notebook, ext, "")?,
                ContentKind::File => self.first_free_name(&path, &self.untitled.file, ext, "")?,
            };
            let target = path::join(&path, &name)?;
            let lock = self.locks.get_lock(&target);
            let _guard = lock.write();
            return self.save_new(request, &target);
        }

        let lock = self.locks.get_lock(&path);
        let _guard = lock.write();
        self.save_new(request, &path)
    }

    fn default_request(&self, request: ModelRequest, ext: &str) -> Result<ModelRequest, ContentsError> {
        if request.kind.as_deref() == Some(ContentKind::Directory.as_str()) {
            return Ok(request);
        }
        if request.content.is_some() {
            return Ok(request);
        }
        if ext == NOTEBOOK_EXTENSION {
            ModelRequest::notebook(&Notebook::new())
        } else {
            Ok(ModelRequest::text(""))
        }
    }

    /// Caller holds the write lock for `target`
    fn save_new(&self, request: ModelRequest, target: &ApiPath) -> Result<Model, ContentsError> {
        if self.exists_at(target)? {
            return Err(ContentsError::AlreadyExists(target.to_string()));
        }
        let model = self.save_locked(request, target)?;
        info!(path = %target, "Created");
        Ok(model)
    }

    /// Copy a file or notebook; never overwrites
    ///
    /// `to` defaults to the source's directory. When `to` is a directory the
    /// copy is named `<base>-Copy<ext>`, numbered like untitled names.
    pub fn copy(&self, from: &str, to: Option<&str>) -> Result<Model, ContentsError> {
        let from = normalize(from)?;
        if self.backend.dir_exists(&from)? {
            return Err(ContentsError::InvalidOperation(format!(
                "cannot copy directory {}",
                from
            )));
        }
        if !self.backend.file_exists(&from)? {
            return Err(ContentsError::NotFound(from.to_string()));
        }
        let to = match to {
            Some(to) => normalize(to)?,
            None => from.parent(),
        };

        let into_dir = self.backend.dir_exists(&to)?;
        let dir_lock = into_dir.then(|| self.locks.get_lock(&to));
        let _dir_guard = dir_lock.as_ref().map(|lock| lock.write());
        let target = if into_dir {
            let (base, ext) = split_extension(from.name());
            let base = format!("{}{}", strip_copy_marker(base), COPY_MARKER);
            let name = self.first_free_name(&to, &base, ext, "")?;
            path::join(&to, &name)?
        } else {
            to
        };

        let lock = self.locks.get_lock(&target);
        let _guard = lock.write();
        if self.exists_at(&target)? {
            return Err(ContentsError::AlreadyExists(target.to_string()));
        }
        self.require_parent_dir(&target)?;
        let bytes = self.backend.read_raw(&from)?;
        self.backend.write_raw(&target, &bytes)?;
        info!(from = %from, to = %target, "Copied");
        self.get_at(&target, GetOptions::metadata())
    }

    /// Apply a partial model; currently a rename when `request.path` differs
    pub fn update(&self, request: ModelRequest, path: &str) -> Result<Model, ContentsError> {
        let path = normalize(path)?;
        let target = match request.path.as_deref() {
            Some(new) => normalize(new)?,
            None => path.clone(),
        };
        let message = if target != path {
            self.rename(&path, &target)?
        } else {
            None
        };
        let mut model = self.get_at(&target, GetOptions::metadata())?;
        model.message = message;
        Ok(model)
    }

    /// Move `old` to `new` along with its checkpoints
    ///
    /// The content move is final once the backend rename succeeds. A checkpoint
    /// re-key that fails twice is reported back as a message.
    fn rename(&self, old: &ApiPath, new: &ApiPath) -> Result<Option<String>, ContentsError> {
        if old.is_root() || new.is_root() {
            return Err(ContentsError::InvalidOperation(
                "cannot rename the root".to_string(),
            ));
        }
        if new.starts_with(old) {
            return Err(ContentsError::InvalidOperation(format!(
                "cannot move {} inside itself",
                old
            )));
        }
        let (first, second) = self.locks.get_pair(old, new);
        let _first = first.write();
        let _second = second.as_ref().map(|lock| lock.write());

        if !self.exists_at(old)? {
            return Err(ContentsError::NotFound(old.to_string()));
        }
        if self.exists_at(new)? {
            return Err(ContentsError::AlreadyExists(new.to_string()));
        }
        self.require_parent_dir(new)?;
        self.backend.rename(old, new)?;
        let message = match self
            .checkpoints
            .rename_all(old, new)
            .or_else(|_| self.checkpoints.rename_all(old, new))
        {
            Ok(()) => None,
            Err(e) => {
                warn!(from = %old, to = %new, error = %e, "Failed to move checkpoints");
                Some(format!("Checkpoints of {} were not moved: {}", old, e))
            }
        };
        info!(from = %old, to = %new, "Renamed");
        Ok(message)
    }

    /// Remove a file or an empty directory, along with its checkpoints
    pub fn delete(&self, path: &str) -> Result<(), ContentsError> {
        let path = normalize(path)?;
        if path.is_root() {
            return Err(ContentsError::InvalidOperation(
                "cannot delete the root".to_string(),
            ));
        }
        let lock = self.locks.get_lock(&path);
        let _guard = lock.write();

        if self.backend.dir_exists(&path)? {
            if !self.backend.list_children(&path)?.is_empty() {
                return Err(ContentsError::InvalidOperation(format!(
                    "directory {} is not empty",
                    path
                )));
            }
        } else if !self.backend.file_exists(&path)? {
            return Err(ContentsError::NotFound(path.to_string()));
        }

        self.backend.delete_physical(&path)?;
        if let Err(e) = self.checkpoints.delete_all(&path) {
            warn!(path = %path, error = %e, "Failed to drop checkpoints");
        }
        info!(path = %path, "Deleted");
        Ok(())
    }

    // ---- trust ----

    /// Explicitly trust a notebook: sign its current code cells
    pub fn trust_notebook(&self, path: &str) -> Result<TrustState, ContentsError> {
        let path = normalize(path)?;
        let mut nb = self.read_notebook_for_trust(&path)?;
        self.trust.force_trust(&mut nb, &path)
    }

    /// Withdraw trust from a notebook: forget the signature of its current code cells
    pub fn untrust_notebook(&self, path: &str) -> Result<TrustState, ContentsError> {
        let path = normalize(path)?;
        let mut nb = self.read_notebook_for_trust(&path)?;
        self.trust.revoke(&mut nb, &path)
    }

    fn read_notebook_for_trust(&self, path: &ApiPath) -> Result<Notebook, ContentsError> {
        if !self.backend.file_exists(path)? {
            return Err(ContentsError::NotFound(path.to_string()));
        }
        if !is_notebook_name(path.name()) {
            return Err(ContentsError::InvalidOperation(format!(
                "{} is not a notebook",
                path
            )));
        }
        Notebook::from_slice(&self.backend.read_raw(path)?)
    }

    // ---- checkpoints ----

    pub fn create_checkpoint(&self, path: &str) -> Result<CheckpointModel, ContentsError> {
        let path = normalize(path)?;
        if self.backend.dir_exists(&path)? {
            return Err(ContentsError::InvalidOperation(format!(
                "cannot checkpoint directory {}",
                path
            )));
        }
        let lock = self.locks.get_lock(&path);
        let _guard = lock.write();
        let checkpoint = self.checkpoints.create(self.backend.as_ref(), &path)?;
        debug!(path = %path, id = %checkpoint.id, "Created checkpoint");
        Ok(checkpoint)
    }

    /// Checkpoints of an existing path, oldest first
    pub fn list_checkpoints(&self, path: &str) -> Result<Vec<CheckpointModel>, ContentsError> {
        let path = normalize(path)?;
        if !self.exists_at(&path)? {
            return Err(ContentsError::NotFound(path.to_string()));
        }
        self.checkpoints.list(&path)
    }

    pub fn restore_checkpoint(&self, path: &str, id: &str) -> Result<(), ContentsError> {
        let path = normalize(path)?;
        let lock = self.locks.get_lock(&path);
        let _guard = lock.write();
        if !self.backend.file_exists(&path)? {
            return Err(ContentsError::NotFound(path.to_string()));
        }
        self.checkpoints.restore(self.backend.as_ref(), &path, id)?;
        info!(path = %path, id = %id, "Restored checkpoint");
        Ok(())
    }

    pub fn delete_checkpoint(&self, path: &str, id: &str) -> Result<(), ContentsError> {
        let path = normalize(path)?;
        self.checkpoints.delete(&path, id)
    }
}

/// Bytes of a file request: `text` or `base64` content
fn decode_file_content(request: &ModelRequest) -> Result<Vec<u8>, ContentsError> {
    let text = match &request.content {
        Some(Value::String(text)) => text,
        Some(_) => {
            return Err(ContentsError::InvalidContent(
                "file content must be a string".to_string(),
            ))
        }
        None => return Err(ContentsError::InvalidContent("no file content".to_string())),
    };
    match request.format.as_deref() {
        Some("text") => Ok(text.as_bytes().to_vec()),
        Some("base64") => BASE64
            .decode(text.as_bytes())
            .map_err(|e| ContentsError::InvalidContent(format!("invalid base64: {}", e))),
        other => Err(ContentsError::InvalidContent(format!(
            "file format must be 'text' or 'base64', got {:?}",
            other
        ))),
    }
}
