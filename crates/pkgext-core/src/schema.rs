//! Table schemas and the schema registry

use crate::extension::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Plain string
    String,

    /// Integer
    Number,

    /// String that may be replaced by localized text at bind time
    Localized,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "STRING"),
            Self::Number => write!(f, "NUMBER"),
            Self::Localized => write!(f, "LOCALIZED"),
        }
    }
}

/// Reference from a column to a key column of another table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referenced table
    pub table: String,

    /// Referenced column
    pub column: String,
}

/// A column in a table definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Value type
    pub column_type: ColumnType,

    /// Part of the primary key
    pub primary_key: bool,

    /// May be left null
    pub nullable: bool,

    /// Foreign key reference
    pub foreign_key: Option<ForeignKey>,
}

impl ColumnDefinition {
    /// Create a non-nullable column that is not part of any key
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            nullable: false,
            foreign_key: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Number)
    }

    pub fn localized(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Localized)
    }

    /// Mark as primary key column
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allow null
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Reference a key column of another table
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

/// A named table with ordered columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name
    pub name: String,

    /// Ordered list of columns
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create a table from columns
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Find a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Columns forming the primary key, in order
    pub fn primary_key_columns(&self) -> Vec<&ColumnDefinition> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Immutable set of table definitions keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableDefinition>,
}

impl SchemaRegistry {
    /// Build a registry. Two definitions for the same table name are rejected.
    pub fn new(definitions: impl IntoIterator<Item = TableDefinition>) -> Result<Self, RegistryError> {
        let mut tables = BTreeMap::new();

        for definition in definitions {
            if tables.contains_key(&definition.name) {
                return Err(RegistryError::DuplicateTable(definition.name));
            }
            tables.insert(definition.name.clone(), definition);
        }

        Ok(Self { tables })
    }

    /// Look up a table definition
    pub fn lookup(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// All tables in name order
    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_table() -> TableDefinition {
        TableDefinition::new(
            "MsiDriverPackages",
            vec![
                ColumnDefinition::string("Component")
                    .primary_key()
                    .references("Component", "Component"),
                ColumnDefinition::number("Flags"),
                ColumnDefinition::number("Sequence").nullable(),
            ],
        )
    }

    #[test]
    fn column_builders() {
        let table = driver_table();
        let component = table.column("Component").unwrap();

        assert!(component.primary_key);
        assert!(!component.nullable);
        assert_eq!(component.foreign_key.as_ref().unwrap().table, "Component");
        assert!(table.column("Sequence").unwrap().nullable);
        assert_eq!(table.column_index("Flags"), Some(1));
        assert_eq!(table.column_names(), vec!["Component", "Flags", "Sequence"]);
        assert_eq!(table.primary_key_columns().len(), 1);
    }

    #[test]
    fn registry_lookup() {
        let registry = SchemaRegistry::new(vec![driver_table()]).unwrap();

        assert!(registry.lookup("MsiDriverPackages").is_some());
        assert!(registry.lookup("Missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_rejects_duplicate_table() {
        let err = SchemaRegistry::new(vec![driver_table(), driver_table()]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTable(name) if name == "MsiDriverPackages"));
    }
}
