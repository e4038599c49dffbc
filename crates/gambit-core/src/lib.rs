//! Gambit - Core Library
//!
//! Reading-time estimation for lessons, gallery indexing and uploads over
//! object storage, and session gating for the backoffice admin area.

pub mod config;
pub mod error;
pub mod gallery;
pub mod reading_time;
pub mod session;
pub mod storage;
pub mod upload;

pub use config::*;
pub use error::*;
pub use gallery::GalleryIndexer;
pub use reading_time::{estimate, estimate_lesson};
pub use session::{can_access_admin, require_admin, AuthBackend, AuthEvent, SessionState};
pub use storage::{ListOptions, MemoryStore, ObjectStore};
pub use upload::{UploadPolicy, Uploader};

pub use gambit_types::*;
