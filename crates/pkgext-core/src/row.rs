//! Rows and the output model they are emitted into

use crate::diagnostic::Location;
use crate::extension::ExtensionError;
use crate::schema::{ColumnType, SchemaRegistry, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A column value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether the value may be stored in a column of this type
    pub fn fits(&self, column_type: ColumnType) -> bool {
        match (self, column_type) {
            (Self::Null, _) => true,
            (Self::Number(_), ColumnType::Number) => true,
            (Self::Text(_), ColumnType::String | ColumnType::Localized) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One column of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub column: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub value: Value,
}

/// An instance of a table definition, tagged with the location that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Table name
    pub table: String,

    /// Values in column order
    pub fields: Vec<Field>,

    /// Where the row came from
    pub location: Location,
}

impl Row {
    /// Create a row with every column null
    pub fn new(definition: &TableDefinition, location: Location) -> Self {
        Self {
            table: definition.name.clone(),
            fields: definition
                .columns
                .iter()
                .map(|c| Field {
                    column: c.name.clone(),
                    column_type: c.column_type,
                    value: Value::Null,
                })
                .collect(),
            location,
        }
    }

    /// Set a column value. The column must exist and accept the value's type.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<(), ExtensionError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.column == column)
            .ok_or_else(|| ExtensionError::UnknownColumn {
                table: self.table.clone(),
                column: column.to_string(),
            })?;

        let value = value.into();
        if !value.fits(field.column_type) {
            return Err(ExtensionError::TypeMismatch {
                table: self.table.clone(),
                column: field.column.clone(),
                expected: field.column_type,
            });
        }

        field.value = value;
        Ok(())
    }

    /// Builder form of [`Row::set`]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Result<Self, ExtensionError> {
        self.set(column, value)?;
        Ok(self)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.column == column).map(|f| &f.value)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn get_number(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_number)
    }

    /// Primary key rendered as slash-separated column values
    pub fn primary_key(&self, definition: &TableDefinition) -> String {
        definition
            .primary_key_columns()
            .iter()
            .map(|c| self.get(&c.name).map(Value::to_string).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// A reference to a row by primary key, for values that carry a key
/// without a foreign-key column (e.g. `[#File]` inside a registry value)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleReference {
    pub table: String,
    pub key: String,
    pub location: Location,
}

/// Rows grouped by table, in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    tables: BTreeMap<String, Vec<Row>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    references: Vec<SimpleReference>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row after checking it against its table definition
    pub fn add(&mut self, row: Row, registry: &SchemaRegistry) -> Result<(), ExtensionError> {
        let definition = registry
            .lookup(&row.table)
            .ok_or_else(|| ExtensionError::UnknownTable(row.table.clone()))?;

        Self::check_row(&row, definition)?;

        self.tables.entry(row.table.clone()).or_default().push(row);
        Ok(())
    }

    fn check_row(row: &Row, definition: &TableDefinition) -> Result<(), ExtensionError> {
        if row.fields.len() != definition.columns.len() {
            return Err(ExtensionError::ColumnCountMismatch {
                table: row.table.clone(),
                expected: definition.columns.len(),
                actual: row.fields.len(),
            });
        }

        for (field, column) in row.fields.iter().zip(&definition.columns) {
            if field.column != column.name {
                return Err(ExtensionError::UnknownColumn {
                    table: row.table.clone(),
                    column: field.column.clone(),
                });
            }

            if field.column_type != column.column_type || !field.value.fits(column.column_type) {
                return Err(ExtensionError::TypeMismatch {
                    table: row.table.clone(),
                    column: column.name.clone(),
                    expected: column.column_type,
                });
            }

            if field.value.is_null() && !column.nullable {
                return Err(ExtensionError::MissingValue {
                    table: row.table.clone(),
                    column: column.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Record a reference that must resolve at bind time
    pub fn add_reference(&mut self, reference: SimpleReference, registry: &SchemaRegistry) -> Result<(), ExtensionError> {
        if registry.lookup(&reference.table).is_none() {
            return Err(ExtensionError::UnknownTable(reference.table));
        }
        self.references.push(reference);
        Ok(())
    }

    pub fn references(&self) -> &[SimpleReference] {
        &self.references
    }

    /// Rows of a table (empty when none were emitted)
    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First row of `table` whose `column` equals `value`
    pub fn find(&self, table: &str, column: &str, value: &str) -> Option<&Row> {
        self.rows(table)
            .iter()
            .find(|row| row.get_str(column) == Some(value))
    }

    /// Tables that received rows, with their rows
    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables.iter().map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Move every row of `other` into this output
    pub fn merge(&mut self, other: Output) {
        for (table, rows) in other.tables {
            self.tables.entry(table).or_default().extend(rows);
        }
        self.references.extend(other.references);
    }

    /// Total rows across all tables
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDefinition;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![TableDefinition::new(
            "MsiDriverPackages",
            vec![
                ColumnDefinition::string("Component").primary_key(),
                ColumnDefinition::number("Flags"),
                ColumnDefinition::number("Sequence").nullable(),
            ],
        )])
        .unwrap()
    }

    fn driver_row(registry: &SchemaRegistry) -> Row {
        Row::new(
            registry.lookup("MsiDriverPackages").unwrap(),
            Location::with_line("product.wxs", 4),
        )
    }

    #[test]
    fn set_and_add() {
        let registry = registry();
        let mut row = driver_row(&registry);
        row.set("Component", "DriverComp").unwrap();
        row.set("Flags", 0x11i64).unwrap();

        let mut output = Output::new();
        output.add(row, &registry).unwrap();

        let stored = &output.rows("MsiDriverPackages")[0];
        assert_eq!(stored.get_str("Component"), Some("DriverComp"));
        assert_eq!(stored.get_number("Flags"), Some(0x11));
        assert_eq!(stored.get("Sequence"), Some(&Value::Null));
        assert_eq!(output.row_count(), 1);
    }

    #[test]
    fn unknown_column_is_a_host_error() {
        let registry = registry();
        let mut row = driver_row(&registry);
        let err = row.set("Nope", 1i64).unwrap_err();
        assert!(matches!(err, ExtensionError::UnknownColumn { .. }));
    }

    #[test]
    fn missing_required_value_is_rejected() {
        let registry = registry();
        let row = driver_row(&registry).with("Component", "C").unwrap();

        let err = Output::new().add(row, &registry).unwrap_err();
        assert!(matches!(err, ExtensionError::MissingValue { column, .. } if column == "Flags"));
    }

    #[test]
    fn set_rejects_values_of_the_wrong_type() {
        let registry = registry();
        let mut row = driver_row(&registry);

        let err = row.set("Flags", "lots").unwrap_err();
        assert!(matches!(err, ExtensionError::TypeMismatch { ref column, .. } if column == "Flags"));
        assert!(matches!(row.set("Component", 7i64), Err(ExtensionError::TypeMismatch { .. })));
        assert_eq!(row.get("Flags"), Some(&Value::Null));
    }

    #[test]
    fn add_rejects_rows_that_bypass_set() {
        let registry = registry();
        let mut row = driver_row(&registry).with("Component", "C").unwrap();
        row.fields[1].value = Value::Text("lots".to_string());

        let err = Output::new().add(row, &registry).unwrap_err();
        assert!(matches!(err, ExtensionError::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_table_is_rejected() {
        let registry = registry();
        let row = Row {
            table: "Ghost".to_string(),
            fields: Vec::new(),
            location: Location::default(),
        };
        assert!(matches!(
            Output::new().add(row, &registry),
            Err(ExtensionError::UnknownTable(name)) if name == "Ghost"
        ));
    }

    #[test]
    fn output_json_roundtrip() {
        let registry = registry();
        let row = driver_row(&registry)
            .with("Component", "C")
            .and_then(|r| r.with("Flags", 2i64))
            .unwrap();
        let mut output = Output::new();
        output.add(row, &registry).unwrap();

        let json = serde_json::to_string(&output).unwrap();
        let parsed: Output = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
    }

    #[test]
    fn option_values_convert_to_null() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Number(5));
    }
}
