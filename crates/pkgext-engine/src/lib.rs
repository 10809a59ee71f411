//! pkgext engine - drives extensions over a source document
//!
//! This crate implements the host side of a build:
//! - Loading XML into the element model
//! - A thin shim for core-namespace elements
//! - Dispatching extension elements and attributes by namespace
//! - Bind-time key verification and extension validators

pub mod document;
pub mod host;
pub mod binder;
pub mod compiler;

pub use document::{load_file, load_str, LoadError};
pub use host::CORE_NAMESPACE;
pub use binder::verify_keys;
pub use compiler::{Build, Compilation, Compiler, EngineError};
