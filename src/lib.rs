//! nbcontents: Contents Manager for notebook servers
//!
//! Path-addressed access to files, directories and notebooks under a contents
//! root, with checkpoints and signature-based notebook trust.

pub mod backend;
pub mod checkpoints;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod model;
pub mod notary;
pub mod notebook;
pub mod path;
pub mod trust;

pub use error::ContentsError;
pub use manager::{ContentsManager, GetOptions};
pub use model::{Content, ContentKind, Format, Model, ModelRequest};
pub use path::ApiPath;
