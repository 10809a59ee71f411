//! Strict attribute parsing helpers
//!
//! Every reader reports its own diagnostic and returns `None` when the value
//! is unusable, so a parser can keep going and surface every problem in one
//! pass. Parsers take an [`ErrorMark`] before reading attributes and only emit
//! rows when no error was reported since.

use crate::catalog;
use crate::diagnostic::{Diagnostic, Location, MessageDef, Severity};
use crate::element::{Attribute, Element};
use crate::extension::ExtensionError;
use crate::row::{Output, Row, SimpleReference};
use crate::schema::SchemaRegistry;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Host-supplied facts about the enclosing elements (`ComponentId`, `FileId`, ...)
pub type ContextMap = BTreeMap<String, String>;

/// Keys the host places in a [`ContextMap`]
pub mod context {
    pub const COMPONENT_ID: &str = "ComponentId";
    pub const DIRECTORY_ID: &str = "DirectoryId";
    pub const FILE_ID: &str = "FileId";
    pub const PACKAGE_ID: &str = "PackageId";
    pub const PAYLOAD_ID: &str = "PayloadId";
    pub const CONTAINER_ID: &str = "ContainerId";
    pub const VARIABLE_NAME: &str = "VariableName";
}

/// Longest identifier accepted in key columns
pub const MAX_IDENTIFIER_LENGTH: usize = 72;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("identifier regex is valid"));

/// Whether `value` is a legal identifier
pub fn is_identifier(value: &str) -> bool {
    value.len() <= MAX_IDENTIFIER_LENGTH && IDENTIFIER.is_match(value)
}

/// Stable identifier derived from the parts that make a row unique.
///
/// The same parts always produce the same identifier: prefix followed by 32
/// uppercase hex digits of a SHA-256 digest.
pub fn generate_identifier(prefix: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join("|").as_bytes());
    let digest = hasher.finalize();
    format!("{}{}", prefix, hex::encode_upper(&digest[..16]))
}

/// A yes/no attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    pub fn is_yes(&self) -> bool {
        *self == Self::Yes
    }
}

/// Position in the diagnostic stream, counted in errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorMark(usize);

/// Everything an element parser may touch during one compile pass
pub struct ParseContext<'a> {
    registry: &'a SchemaRegistry,
    output: &'a mut Output,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> ParseContext<'a> {
    pub fn new(registry: &'a SchemaRegistry, output: &'a mut Output, diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Self {
            registry,
            output,
            diagnostics,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.registry
    }

    /// Rows emitted so far
    pub fn output(&self) -> &Output {
        self.output
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics
    }

    /// Record a message at a location
    pub fn message(&mut self, def: &MessageDef, location: &Location, args: &[&str]) {
        self.diagnostics.push(def.at(location, args));
    }

    fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn error_mark(&self) -> ErrorMark {
        ErrorMark(self.error_count())
    }

    pub fn has_errors_since(&self, mark: ErrorMark) -> bool {
        self.error_count() > mark.0
    }

    /// Create an empty row for a registered table
    pub fn new_row(&self, table: &str, location: &Location) -> Result<Row, ExtensionError> {
        let definition = self
            .registry
            .lookup(table)
            .ok_or_else(|| ExtensionError::UnknownTable(table.to_string()))?;
        Ok(Row::new(definition, location.clone()))
    }

    /// Add a finished row to the output
    pub fn emit(&mut self, row: Row) -> Result<(), ExtensionError> {
        self.output.add(row, self.registry)
    }

    /// Require a row of `table` keyed `key` to exist once every document is parsed
    pub fn reference(&mut self, table: &str, key: &str, location: &Location) -> Result<(), ExtensionError> {
        let reference = SimpleReference {
            table: table.to_string(),
            key: key.to_string(),
            location: location.clone(),
        };
        self.output.add_reference(reference, self.registry)
    }

    pub fn unexpected_attribute(&mut self, element: &Element, attribute: &str) {
        self.message(&catalog::UNEXPECTED_ATTRIBUTE, &element.location, &[&element.name, attribute]);
    }

    pub fn unexpected_element(&mut self, parent: &Element, child: &Element) {
        self.message(&catalog::UNEXPECTED_ELEMENT, &child.location, &[&parent.name, &child.name]);
    }

    pub fn expected_attribute(&mut self, element: &Element, attribute: &str) {
        self.message(&catalog::EXPECTED_ATTRIBUTE, &element.location, &[&element.name, attribute]);
    }

    /// `attribute` cannot be combined with `other`
    pub fn illegal_attribute_with_other(&mut self, element: &Element, attribute: &str, other: &str) {
        self.message(
            &catalog::ILLEGAL_ATTRIBUTE_WITH_OTHER_ATTRIBUTE,
            &element.location,
            &[&element.name, attribute, other],
        );
    }

    /// Unqualified attributes of an extension element. Qualified ones are
    /// reported as unexpected.
    pub fn local_attributes<'e>(&mut self, element: &'e Element) -> Vec<&'e Attribute> {
        let mut local = Vec::with_capacity(element.attributes.len());
        for attribute in &element.attributes {
            if attribute.namespace.is_some() {
                self.unexpected_attribute(element, &attribute.name);
            } else {
                local.push(attribute);
            }
        }
        local
    }

    /// Report every child of an element that takes none
    pub fn no_children(&mut self, element: &Element) {
        for child in &element.children {
            self.unexpected_element(element, child);
        }
    }

    /// Non-empty string value
    pub fn string_value(&mut self, element: &Element, attribute: &Attribute) -> Option<String> {
        if attribute.value.is_empty() {
            self.message(
                &catalog::ILLEGAL_EMPTY_ATTRIBUTE_VALUE,
                &element.location,
                &[&element.name, &attribute.name],
            );
            return None;
        }
        Some(attribute.value.clone())
    }

    /// Legal identifier value
    pub fn identifier_value(&mut self, element: &Element, attribute: &Attribute) -> Option<String> {
        let value = self.string_value(element, attribute)?;
        if !is_identifier(&value) {
            self.message(
                &catalog::ILLEGAL_IDENTIFIER,
                &element.location,
                &[&element.name, &attribute.name, &value],
            );
            return None;
        }
        Some(value)
    }

    /// `yes` or `no`
    pub fn yes_no_value(&mut self, element: &Element, attribute: &Attribute) -> Option<YesNo> {
        let parsed = YesNo::parse(&attribute.value);
        if parsed.is_none() {
            self.message(
                &catalog::ILLEGAL_YES_NO_VALUE,
                &element.location,
                &[&element.name, &attribute.name, &attribute.value],
            );
        }
        parsed
    }

    /// Integer within `min..=max`
    pub fn integer_value(&mut self, element: &Element, attribute: &Attribute, min: i64, max: i64) -> Option<i64> {
        match attribute.value.trim().parse::<i64>() {
            Ok(value) if (min..=max).contains(&value) => Some(value),
            _ => {
                self.message(
                    &catalog::ILLEGAL_INTEGER_VALUE,
                    &element.location,
                    &[
                        &element.name,
                        &attribute.name,
                        &attribute.value,
                        &min.to_string(),
                        &max.to_string(),
                    ],
                );
                None
            }
        }
    }

    /// One of a fixed set of values. The error names every legal option.
    pub fn enum_value<T: Copy>(&mut self, element: &Element, attribute: &Attribute, options: &[(&str, T)]) -> Option<T> {
        if let Some((_, value)) = options.iter().find(|(name, _)| *name == attribute.value) {
            return Some(*value);
        }

        let legal = options
            .iter()
            .map(|(name, _)| format!("'{}'", name))
            .collect::<Vec<_>>()
            .join(", ");
        self.message(
            &catalog::ILLEGAL_ATTRIBUTE_VALUE,
            &element.location,
            &[&element.name, &attribute.name, &attribute.value, &legal],
        );
        None
    }

    /// Dotted version with one to four parts, each 0-65534
    pub fn version_value(&mut self, element: &Element, attribute: &Attribute) -> Option<String> {
        let value = self.string_value(element, attribute)?;
        let parts: Vec<&str> = value.split('.').collect();
        let valid = parts.len() <= 4
            && parts
                .iter()
                .all(|part| part.parse::<u32>().map(|n| n <= 65534).unwrap_or(false));

        if !valid {
            self.message(
                &catalog::ILLEGAL_VERSION_VALUE,
                &element.location,
                &[&element.name, &attribute.name, &value],
            );
            return None;
        }
        Some(value)
    }

    /// Required, non-empty inner text
    pub fn element_text(&mut self, element: &Element) -> Option<String> {
        match element.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(text.to_string()),
            _ => {
                self.message(&catalog::EXPECTED_ELEMENT_TEXT, &element.location, &[&element.name]);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDefinition, TableDefinition};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![TableDefinition::new(
            "Sample",
            vec![ColumnDefinition::string("Id").primary_key()],
        )])
        .unwrap()
    }

    fn element() -> Element {
        Element::new("urn:test", "Driver").with_location(Location::with_line("t.wxs", 9))
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("_Abc.1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier(&"a".repeat(73)));
    }

    #[test]
    fn generated_identifiers_are_stable() {
        let a = generate_identifier("fex", &["Comp", "Name"]);
        let b = generate_identifier("fex", &["Comp", "Name"]);
        let c = generate_identifier("fex", &["Comp", "Other"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 3 + 32);
        assert!(is_identifier(&a));
    }

    #[test]
    fn yes_no_reports_illegal_value() {
        let registry = registry();
        let mut output = Output::new();
        let mut diagnostics = Vec::new();
        let mut ctx = ParseContext::new(&registry, &mut output, &mut diagnostics);

        let mark = ctx.error_mark();
        assert_eq!(ctx.yes_no_value(&element(), &Attribute::new("Legacy", "yes")), Some(YesNo::Yes));
        assert!(!ctx.has_errors_since(mark));

        assert_eq!(ctx.yes_no_value(&element(), &Attribute::new("Legacy", "true")), None);
        assert!(ctx.has_errors_since(mark));
        assert_eq!(diagnostics[0].id, catalog::ILLEGAL_YES_NO_VALUE.id);
        assert_eq!(diagnostics[0].location, Some(Location::with_line("t.wxs", 9)));
    }

    #[test]
    fn enum_value_names_legal_options() {
        let registry = registry();
        let mut output = Output::new();
        let mut diagnostics = Vec::new();
        let mut ctx = ParseContext::new(&registry, &mut output, &mut diagnostics);

        let options = [("tcp", 6), ("udp", 17)];
        assert_eq!(ctx.enum_value(&element(), &Attribute::new("Protocol", "udp"), &options), Some(17));
        assert_eq!(ctx.enum_value(&element(), &Attribute::new("Protocol", "icmp"), &options), None);

        assert!(diagnostics[0].message.contains("'tcp', 'udp'"));
        assert!(diagnostics[0].message.contains("'icmp'"));
    }

    #[test]
    fn integer_and_version_ranges() {
        let registry = registry();
        let mut output = Output::new();
        let mut diagnostics = Vec::new();
        let mut ctx = ParseContext::new(&registry, &mut output, &mut diagnostics);
        let el = element();

        assert_eq!(ctx.integer_value(&el, &Attribute::new("Sequence", "12"), 0, 100), Some(12));
        assert_eq!(ctx.integer_value(&el, &Attribute::new("Sequence", "-1"), 0, 100), None);
        assert_eq!(ctx.integer_value(&el, &Attribute::new("Sequence", "x"), 0, 100), None);
        assert_eq!(ctx.version_value(&el, &Attribute::new("V", "2.0")).as_deref(), Some("2.0"));
        assert_eq!(ctx.version_value(&el, &Attribute::new("V", "1.2.3.4.5")), None);
        assert_eq!(ctx.version_value(&el, &Attribute::new("V", "1.65535")), None);
        assert_eq!(diagnostics.len(), 4);
    }

    #[test]
    fn empty_values_and_text() {
        let registry = registry();
        let mut output = Output::new();
        let mut diagnostics = Vec::new();
        let mut ctx = ParseContext::new(&registry, &mut output, &mut diagnostics);

        assert_eq!(ctx.identifier_value(&element(), &Attribute::new("Id", "")), None);
        assert_eq!(ctx.element_text(&element().with_text("  ")), None);
        assert_eq!(ctx.element_text(&element().with_text(" a ")).as_deref(), Some("a"));

        let ids: Vec<u32> = diagnostics.iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            vec![catalog::ILLEGAL_EMPTY_ATTRIBUTE_VALUE.id, catalog::EXPECTED_ELEMENT_TEXT.id]
        );
    }

    #[test]
    fn emit_checks_the_registry() {
        let registry = registry();
        let mut output = Output::new();
        let mut diagnostics = Vec::new();
        let mut ctx = ParseContext::new(&registry, &mut output, &mut diagnostics);

        let row = ctx.new_row("Sample", &Location::default()).unwrap().with("Id", "A").unwrap();
        ctx.emit(row).unwrap();
        assert!(ctx.new_row("Missing", &Location::default()).is_err());
        assert_eq!(output.rows("Sample").len(), 1);
    }

    #[test]
    fn references_need_a_registered_table() {
        let registry = registry();
        let mut output = Output::new();
        let mut diagnostics = Vec::new();
        let mut ctx = ParseContext::new(&registry, &mut output, &mut diagnostics);

        ctx.reference("Sample", "A", &Location::with_line("t.wxs", 3)).unwrap();
        assert!(matches!(
            ctx.reference("Missing", "A", &Location::default()),
            Err(ExtensionError::UnknownTable(_))
        ));
        assert_eq!(output.references().len(), 1);
        assert_eq!(output.references()[0].key, "A");
    }
}
