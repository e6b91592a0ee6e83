//! Configuration data model and the path codec.
//!
//! ## Architecture
//!
//! - [`path`] - field path parsing
//! - [`resolve`] - reading and creating locations inside a document
//! - [`kind`] - field kinds, encode/decode and shape classification
//! - [`field`] - field descriptors and flat bindings
//! - [`schema`] - sections, groups and declared fields
//! - [`project`] - document to descriptors
//! - [`assemble`] - bindings to document

/// Reassembly of bindings into a document.
pub mod assemble;

/// Field descriptors and bindings.
pub mod field;

/// Field kinds and the value codec.
pub mod kind;

/// Field path parsing.
pub mod path;

/// Projection of a document into descriptors.
pub mod project;

/// Path resolution.
pub mod resolve;

/// Schema registry.
pub mod schema;

pub use assemble::{TreeAssembler, assemble};
pub use field::{FieldBinding, FieldDescriptor};
pub use kind::{FieldKind, RawValue, Separator, TypeHint, classify};
pub use path::{FieldPath, Segment};
pub use project::{GroupView, Projection, SectionView, project};
pub use schema::{FieldSpec, Group, GroupSource, Schema, SchemaError, Section};
