//! Generic attributed-node model handed to element parsers

use crate::diagnostic::Location;
use serde::{Deserialize, Serialize};

/// An attribute with an optional namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Attribute without a namespace
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute qualified by an extension namespace
    pub fn qualified(namespace: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A parsed element with its source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Namespace URI
    pub namespace: Option<String>,

    /// Local name
    pub name: String,

    /// Attributes in document order
    pub attributes: Vec<Attribute>,

    /// Child elements in document order
    pub children: Vec<Element>,

    /// Trimmed inner text, if any
    pub text: Option<String>,

    /// Where the element starts
    pub location: Location,
}

impl Element {
    /// Create an element in a namespace
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            location: Location::default(),
        }
    }

    /// Add an unqualified attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a namespace-qualified attribute
    pub fn with_qualified_attribute(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes.push(Attribute::qualified(namespace, name, value));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Whether the element belongs to a namespace
    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }

    /// Value of an unqualified attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of a namespace-qualified attribute
    pub fn qualified_attribute(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Render as an indented XML fragment. `xmlns` is written wherever the
    /// namespace differs from the parent's.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, None, 0);
        out
    }

    fn write_xml(&self, out: &mut String, scope: Option<&str>, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);

        if self.namespace.as_deref() != scope {
            if let Some(ns) = &self.namespace {
                out.push_str(&format!(" xmlns=\"{}\"", escape(ns)));
            }
        }

        // One prefix per distinct attribute namespace, declared at first use
        let mut prefixes: Vec<&str> = Vec::new();
        for attribute in &self.attributes {
            match &attribute.namespace {
                Some(ns) => {
                    let index = match prefixes.iter().position(|p| *p == ns.as_str()) {
                        Some(index) => index,
                        None => {
                            prefixes.push(ns);
                            out.push_str(&format!(" xmlns:{}=\"{}\"", prefix(prefixes.len() - 1), escape(ns)));
                            prefixes.len() - 1
                        }
                    };
                    out.push_str(&format!(
                        " {}:{}=\"{}\"",
                        prefix(index),
                        attribute.name,
                        escape(&attribute.value)
                    ));
                }
                None => out.push_str(&format!(" {}=\"{}\"", attribute.name, escape(&attribute.value))),
            }
        }

        if self.children.is_empty() && self.text.is_none() {
            out.push_str(" />\n");
            return;
        }

        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape(text));
        }

        if !self.children.is_empty() {
            out.push('\n');
            for child in &self.children {
                child.write_xml(out, self.namespace.as_deref(), depth + 1);
            }
            out.push_str(&indent);
        }

        out.push_str(&format!("</{}>\n", self.name));
    }
}

fn prefix(index: usize) -> String {
    match index {
        0 => "ext".to_string(),
        n => format!("ext{}", n + 1),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://schemas.microsoft.com/wix/DifxAppExtension";

    #[test]
    fn attribute_lookup_respects_namespace() {
        let element = Element::new("urn:core", "Payload")
            .with_attribute("Id", "BAFn")
            .with_qualified_attribute("urn:bal", "BAFunctions", "yes");

        assert_eq!(element.attribute("Id"), Some("BAFn"));
        assert_eq!(element.attribute("BAFunctions"), None);
        assert_eq!(element.qualified_attribute("urn:bal", "BAFunctions"), Some("yes"));
    }

    #[test]
    fn xml_rendering() {
        let driver = Element::new(NS, "Driver")
            .with_attribute("ForceInstall", "yes")
            .with_attribute("Sequence", "3");

        assert_eq!(
            driver.to_xml(),
            format!("<Driver xmlns=\"{}\" ForceInstall=\"yes\" Sequence=\"3\" />\n", NS)
        );
    }

    #[test]
    fn qualified_attributes_declare_each_namespace_once() {
        let payload = Element::new("urn:core", "Payload")
            .with_attribute("Id", "BAFn")
            .with_qualified_attribute("urn:bal", "BAFunctions", "yes")
            .with_qualified_attribute("urn:bal", "Overridable", "no")
            .with_qualified_attribute("urn:util", "Search", "x");

        assert_eq!(
            payload.to_xml(),
            "<Payload xmlns=\"urn:core\" Id=\"BAFn\" xmlns:ext=\"urn:bal\" ext:BAFunctions=\"yes\" \
             ext:Overridable=\"no\" xmlns:ext2=\"urn:util\" ext2:Search=\"x\" />\n"
        );
    }

    #[test]
    fn xml_escapes_values_and_nests_children() {
        let parent = Element::new("urn:core", "Component")
            .with_attribute("Id", "A&B")
            .with_child(Element::new("urn:core", "Condition").with_text("x < 3"));

        let xml = parent.to_xml();
        assert!(xml.contains("Id=\"A&amp;B\""));
        assert!(xml.contains("  <Condition>x &lt; 3</Condition>\n"));
        assert!(xml.ends_with("</Component>\n"));
    }
}
