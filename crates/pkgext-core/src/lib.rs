//! pkgext core
//!
//! Host-independent building blocks shared by every extension: table schemas,
//! rows, the element model, strict attribute parsing, bit-flag sets and the
//! diagnostic catalog.
//! Never renumber message ids - they are part of the public API.

pub mod diagnostic;
pub mod catalog;
pub mod schema;
pub mod row;
pub mod element;
pub mod parse;
pub mod flags;
pub mod extension;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, Location, MessageDef, Severity};
pub use catalog::{host_messages, MessageCatalog};
pub use schema::{ColumnDefinition, ColumnType, ForeignKey, SchemaRegistry, TableDefinition};
pub use row::{Output, Row, SimpleReference, Value};
pub use element::{Attribute, Element};
pub use parse::{ContextMap, ErrorMark, ParseContext, YesNo};
pub use flags::{BitFlag, FlagSet};
pub use extension::{
    DecompiledElement, Decompiler, Extension, ElementParser, ExtensionError, RegistryError,
    SchemaProvider, Validator,
};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, ExtensionSettings, MessagePolicy};
