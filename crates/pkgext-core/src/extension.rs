//! Extension seams
//!
//! An extension contributes tables ([`SchemaProvider`]), consumes elements and
//! attributes in its namespace ([`ElementParser`]), checks cross-row rules once
//! every row is collected ([`Validator`]) and may turn rows back into elements
//! ([`Decompiler`]).

use crate::diagnostic::{Diagnostic, MessageDef};
use crate::element::{Attribute, Element};
use crate::parse::{ContextMap, ParseContext};
use crate::row::Output;
use crate::schema::{ColumnType, TableDefinition};

/// Host-contract violations. These abort the build instead of being reported
/// as user diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Column '{column}' in table '{table}' expects a {expected} value")]
    TypeMismatch {
        table: String,
        column: String,
        expected: ColumnType,
    },

    #[error("Column '{column}' in table '{table}' is not nullable")]
    MissingValue { table: String, column: String },

    #[error("Row for table '{table}' has {actual} columns, definition has {expected}")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Row '{key}' must exist in table '{table}' but was not found")]
    MissingRow { table: String, key: String },

    #[error("Value {value} in column '{column}' of table '{table}' is out of range")]
    ValueOutOfRange {
        table: String,
        column: String,
        value: i64,
    },
}

/// Errors assembling registries and catalogs
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Table '{0}' is defined more than once")]
    DuplicateTable(String),

    #[error("Message id {id} is used by both {existing} and {duplicate}")]
    DuplicateMessageId {
        id: u32,
        existing: String,
        duplicate: String,
    },

    #[error("Namespace '{0}' is claimed by more than one extension")]
    DuplicateNamespace(String),
}

/// Exposes table definitions
pub trait SchemaProvider {
    fn table_definitions(&self) -> Vec<TableDefinition>;
}

/// Consumes elements and attributes in one namespace
pub trait ElementParser {
    /// Namespace URI handled by this parser
    fn namespace(&self) -> &'static str;

    /// Parse an element of this namespace nested under `parent`
    fn parse_element(
        &self,
        ctx: &mut ParseContext<'_>,
        parent: &Element,
        element: &Element,
        context: &ContextMap,
    ) -> Result<(), ExtensionError>;

    /// Parse this namespace's attributes on a foreign element. The host has
    /// already emitted the element's own rows.
    fn parse_attributes(
        &self,
        ctx: &mut ParseContext<'_>,
        element: &Element,
        attributes: &[&Attribute],
        _context: &ContextMap,
    ) -> Result<(), ExtensionError> {
        for attribute in attributes {
            ctx.unexpected_attribute(element, &attribute.name);
        }
        Ok(())
    }
}

/// Checks invariants spanning the collected rows
pub trait Validator {
    fn validate(&self, _output: &Output) -> Result<Vec<Diagnostic>, ExtensionError> {
        Ok(Vec::new())
    }
}

/// An element recovered from rows, with the row it belongs under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompiledElement {
    /// Table of the parent row (e.g. `Component`)
    pub parent_table: String,

    /// Primary key of the parent row
    pub parent_key: String,

    pub element: Element,
}

/// Turns rows back into source elements
pub trait Decompiler {
    fn decompile(&self, output: &Output) -> Result<Vec<DecompiledElement>, ExtensionError>;
}

/// A complete extension
pub trait Extension: SchemaProvider + ElementParser + Validator + Send + Sync {
    /// Short name used in configuration (e.g. `bal`)
    fn name(&self) -> &'static str;

    /// Messages this extension may report
    fn messages(&self) -> &'static [MessageDef];

    fn decompiler(&self) -> Option<&dyn Decompiler> {
        None
    }
}
