//! Bind-time key verification
//!
//! Primary keys must be unique within a table, every non-null foreign key
//! value must resolve to a row of the referenced table, and so must every
//! simple reference.

use pkgext_core::{catalog, Diagnostic, ExtensionError, Output, SchemaRegistry};
use std::collections::HashSet;
use tracing::debug;

/// Check primary and foreign keys of every row in `output`
pub fn verify_keys(output: &Output, registry: &SchemaRegistry) -> Result<Vec<Diagnostic>, ExtensionError> {
    let mut diagnostics = Vec::new();

    for (table, rows) in output.tables() {
        let definition = registry
            .lookup(table)
            .ok_or_else(|| ExtensionError::UnknownTable(table.to_string()))?;

        if !definition.primary_key_columns().is_empty() {
            let mut seen = HashSet::new();
            for row in rows {
                let key = row.primary_key(definition);
                if !seen.insert(key.clone()) {
                    diagnostics.push(catalog::DUPLICATE_PRIMARY_KEY.at(&row.location, &[&key, table]));
                }
            }
        }

        for column in &definition.columns {
            let Some(foreign_key) = &column.foreign_key else {
                continue;
            };

            let target = registry
                .lookup(&foreign_key.table)
                .ok_or_else(|| ExtensionError::UnknownTable(foreign_key.table.clone()))?;
            if target.column(&foreign_key.column).is_none() {
                return Err(ExtensionError::UnknownColumn {
                    table: foreign_key.table.clone(),
                    column: foreign_key.column.clone(),
                });
            }

            let known: HashSet<String> = output
                .rows(&foreign_key.table)
                .iter()
                .filter_map(|r| r.get(&foreign_key.column))
                .filter(|v| !v.is_null())
                .map(ToString::to_string)
                .collect();

            for row in rows {
                let Some(value) = row.get(&column.name).filter(|v| !v.is_null()) else {
                    continue;
                };
                let value = value.to_string();
                if !known.contains(&value) {
                    diagnostics.push(catalog::UNRESOLVED_REFERENCE.at(
                        &row.location,
                        &[&value, table, &column.name, &foreign_key.table],
                    ));
                }
            }
        }
    }

    for reference in output.references() {
        let definition = registry
            .lookup(&reference.table)
            .ok_or_else(|| ExtensionError::UnknownTable(reference.table.clone()))?;

        let resolved = output
            .rows(&reference.table)
            .iter()
            .any(|row| row.primary_key(definition) == reference.key);
        if !resolved {
            diagnostics.push(catalog::UNRESOLVED_SIMPLE_REFERENCE.at(
                &reference.location,
                &[&reference.key, &reference.table],
            ));
        }
    }

    debug!(issues = diagnostics.len(), "verified keys");
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgext_core::{ColumnDefinition, Location, Row, SimpleReference, TableDefinition};
    use pretty_assertions::assert_eq;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![
            TableDefinition::new("Component", vec![ColumnDefinition::string("Component").primary_key()]),
            TableDefinition::new(
                "MsiDriverPackages",
                vec![
                    ColumnDefinition::string("Component")
                        .primary_key()
                        .references("Component", "Component"),
                    ColumnDefinition::number("Flags"),
                ],
            ),
        ])
        .unwrap()
    }

    fn add(output: &mut Output, registry: &SchemaRegistry, table: &str, values: &[(&str, pkgext_core::Value)], line: usize) {
        let mut row = Row::new(registry.lookup(table).unwrap(), Location::with_line("p.wxs", line));
        for (column, value) in values {
            row.set(column, value.clone()).unwrap();
        }
        output.add(row, registry).unwrap();
    }

    #[test]
    fn resolved_keys_are_clean() {
        let registry = registry();
        let mut output = Output::new();
        add(&mut output, &registry, "Component", &[("Component", "A".into())], 1);
        add(
            &mut output,
            &registry,
            "MsiDriverPackages",
            &[("Component", "A".into()), ("Flags", 0i64.into())],
            2,
        );

        assert!(verify_keys(&output, &registry).unwrap().is_empty());
    }

    #[test]
    fn duplicate_and_dangling_keys() {
        let registry = registry();
        let mut output = Output::new();
        add(&mut output, &registry, "Component", &[("Component", "A".into())], 1);
        add(&mut output, &registry, "Component", &[("Component", "A".into())], 2);
        add(
            &mut output,
            &registry,
            "MsiDriverPackages",
            &[("Component", "B".into()), ("Flags", 0i64.into())],
            3,
        );

        let diagnostics = verify_keys(&output, &registry).unwrap();
        let ids: Vec<u32> = diagnostics.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![catalog::DUPLICATE_PRIMARY_KEY.id, catalog::UNRESOLVED_REFERENCE.id]);
        assert_eq!(diagnostics[0].location.as_ref().and_then(|l| l.line), Some(2));
        assert!(diagnostics[1].message.contains("'B'"));
    }

    #[test]
    fn simple_references_resolve_against_primary_keys() {
        let registry = registry();
        let mut output = Output::new();
        add(&mut output, &registry, "Component", &[("Component", "A".into())], 1);
        for (key, line) in [("A", 2), ("Gone", 3)] {
            let reference = SimpleReference {
                table: "Component".to_string(),
                key: key.to_string(),
                location: Location::with_line("p.wxs", line),
            };
            output.add_reference(reference, &registry).unwrap();
        }

        let diagnostics = verify_keys(&output, &registry).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, catalog::UNRESOLVED_SIMPLE_REFERENCE.id);
        assert_eq!(diagnostics[0].location.as_ref().and_then(|l| l.line), Some(3));
        assert!(diagnostics[0].message.contains("'Gone'"));
    }
}
