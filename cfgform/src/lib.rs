//! # cfgform
//!
//! A bidirectional codec between nested configuration documents and flat,
//! path-addressed form fields.
//!
//! A document (a JSON or TOML tree) is projected through a schema registry
//! into field descriptors: one per editable value, each carrying its
//! path, kind and type hint. A presentation layer renders them as inputs
//! and sends back the edited values keyed by path; the assembler decodes
//! those into a new document.
//!
//! ## Features
//!
//! - Paths with indexed-collection segments: `EXCHANGES.withdrawals[0].retries`
//! - Range pairs split into `_MIN` / `_MAX` inputs and joined on the way back
//! - Lists, numeric lists and tag-sets with declared separators and dedup
//! - Explicit integer/float declaration per field, with defaults
//! - File-backed store for TOML and JSON with automatic backup before saving
//! - Optional HTTP API (`web` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgform::data::{assemble, project, Schema};
//! use serde_json::json;
//!
//! let document = json!({"SETTINGS": {"THREADS": 4, "ACCOUNTS_RANGE": [1, 10]}});
//! let projection = project(&document, &Schema::builtin()).unwrap();
//! let bindings = projection.bindings().unwrap();
//!
//! let rebuilt = assemble(&bindings).unwrap();
//! assert_eq!(rebuilt["SETTINGS"]["ACCOUNTS_RANGE"], json!([1, 10]));
//! ```
//!
//! ## Modules
//!
//! - [`data`] - paths, field kinds, schema registry, projection and assembly
//! - [`error`] - path and type errors
//! - [`transport`] - loading and saving documents
//! - [`session`] - one load/edit/save cycle
//! - [`web`] - HTTP API (requires `web` feature)

/// Paths, field kinds, schema registry, projection and assembly.
pub mod data;

/// Path and type errors.
pub mod error;

/// Config store trait and the file-backed store.
pub mod transport;

/// Edit session over a config store.
pub mod session;

/// HTTP API for remote editing.
///
/// This module is only available when the `web` feature is enabled.
#[cfg(feature = "web")]
pub mod web;

pub use error::{CodecError, PathError, TypeError};
pub use serde_json::Value;
pub use session::{EditSession, SessionError};
pub use transport::{ConfigStore, FileStore, TransportError};
