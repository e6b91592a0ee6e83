//! # cfgform-cli
//!
//! Command line front-end for the `cfgform` configuration codec.
//!
//! ## Features
//!
//! - **Field listing**: every editable field with its path, kind and value
//! - **Apply**: submit a JSON array of field bindings and save the result
//! - **Check**: verify that a config survives projection and reassembly
//! - **Schema**: dump the JSON schema of the binding wire format
//! - **Serve**: run the HTTP editing API
//!
//! ## Modules
//!
//! - [`commands`] - subcommand handlers
//! - [`ctx`] - application context
//! - [`render`] - terminal output

/// Subcommand handlers.
pub mod commands;

/// Application context and state management.
pub mod ctx;

/// Colored listings and document differences.
pub mod render;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
