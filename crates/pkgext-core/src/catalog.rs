//! Message catalog
//!
//! Host messages occupy ids 1-99. Each extension contributes its own range.

use crate::diagnostic::{MessageDef, Severity};
use crate::extension::RegistryError;
use std::collections::BTreeMap;

pub const UNEXPECTED_ATTRIBUTE: MessageDef = MessageDef::error(
    1,
    "UnexpectedAttribute",
    "The {0} element contains an unexpected attribute '{1}'.",
);

pub const UNEXPECTED_ELEMENT: MessageDef = MessageDef::error(
    2,
    "UnexpectedElement",
    "The {0} element contains an unexpected child element '{1}'.",
);

pub const EXPECTED_ATTRIBUTE: MessageDef = MessageDef::error(
    3,
    "ExpectedAttribute",
    "The {0}/@{1} attribute was not found; it is required.",
);

pub const ILLEGAL_ATTRIBUTE_VALUE: MessageDef = MessageDef::error(
    4,
    "IllegalAttributeValue",
    "The {0}/@{1} attribute's value, '{2}', is not one of the legal options: {3}.",
);

pub const ILLEGAL_YES_NO_VALUE: MessageDef = MessageDef::error(
    5,
    "IllegalYesNoValue",
    "The {0}/@{1} attribute's value, '{2}', is not a legal yes/no value. The only legal values are 'no' and 'yes'.",
);

pub const ILLEGAL_INTEGER_VALUE: MessageDef = MessageDef::error(
    6,
    "IllegalIntegerValue",
    "The {0}/@{1} attribute's value, '{2}', is not a legal integer value. Legal integer values are from {3} to {4}.",
);

pub const ILLEGAL_IDENTIFIER: MessageDef = MessageDef::error(
    7,
    "IllegalIdentifier",
    "The {0}/@{1} attribute's value, '{2}', is not a legal identifier. Identifiers may contain ASCII characters A-Z, a-z, digits, underscores (_), or periods (.), must begin with a letter or underscore, and are at most 72 characters long.",
);

pub const ILLEGAL_EMPTY_ATTRIBUTE_VALUE: MessageDef = MessageDef::error(
    8,
    "IllegalEmptyAttributeValue",
    "The {0}/@{1} attribute's value cannot be an empty string. If a value is not required, simply remove the entire attribute.",
);

pub const ILLEGAL_ATTRIBUTE_WITH_OTHER_ATTRIBUTE: MessageDef = MessageDef::error(
    9,
    "IllegalAttributeWithOtherAttribute",
    "The {0}/@{1} attribute cannot be specified when attribute {2} is present.",
);

pub const ILLEGAL_ELEMENT_WITH_ATTRIBUTE: MessageDef = MessageDef::error(
    10,
    "IllegalElementWithAttribute",
    "The {0} element cannot be specified when the {1}/@{2} attribute is present.",
);

pub const EXPECTED_ELEMENT_TEXT: MessageDef = MessageDef::error(
    11,
    "ExpectedElementText",
    "The {0} element's inner text is missing; it is required.",
);

pub const UNSUPPORTED_EXTENSION_ELEMENT: MessageDef = MessageDef::error(
    12,
    "UnsupportedExtensionElement",
    "The {0} element contains an unhandled extension element '{1}'. Please ensure that the extension for elements in the '{2}' namespace has been provided.",
);

pub const UNSUPPORTED_EXTENSION_ATTRIBUTE: MessageDef = MessageDef::error(
    13,
    "UnsupportedExtensionAttribute",
    "The {0} element contains an unhandled extension attribute '{1}'. Please ensure that the extension for attributes in the '{2}' namespace has been provided.",
);

pub const DUPLICATE_PRIMARY_KEY: MessageDef = MessageDef::error(
    14,
    "DuplicatePrimaryKey",
    "The primary key '{0}' is duplicated in table '{1}'. Please remove one of the entries or rename a part of the primary key to avoid the collision.",
);

pub const UNRESOLVED_REFERENCE: MessageDef = MessageDef::error(
    15,
    "UnresolvedReference",
    "Unresolved reference to '{0}' in table '{1}', column '{2}'. No row in table '{3}' has that key.",
);

pub const ILLEGAL_ATTRIBUTE_WHEN_NESTED: MessageDef = MessageDef::error(
    16,
    "IllegalAttributeWhenNested",
    "The {0}/@{1} attribute cannot be specified when the {0} element is nested under a {2} element.",
);

pub const ILLEGAL_VERSION_VALUE: MessageDef = MessageDef::error(
    17,
    "IllegalVersionValue",
    "The {0}/@{1} attribute's value, '{2}', is not a valid version. Legal version values look like 'x.x.x.x' where x is an integer from 0 to 65534.",
);

pub const ROOT_ELEMENT_NOT_RECOGNIZED: MessageDef = MessageDef::error(
    18,
    "RootElementNotRecognized",
    "The root element '{0}' in namespace '{1}' is not recognized. The document must start with a Wix element in the '{2}' namespace.",
);

pub const UNRESOLVED_SIMPLE_REFERENCE: MessageDef = MessageDef::error(
    19,
    "UnresolvedSimpleReference",
    "Unresolved reference to '{0}' in table '{1}'. No row of that table has this key.",
);

pub const UNKNOWN_HOST_ELEMENT: MessageDef = MessageDef::warning(
    90,
    "UnknownHostElement",
    "The {0} element is not understood by this host and was traversed without producing rows.",
);

/// Messages reported by the host and the shared parse helpers
pub fn host_messages() -> &'static [MessageDef] {
    static MESSAGES: [MessageDef; 20] = [
        UNEXPECTED_ATTRIBUTE,
        UNEXPECTED_ELEMENT,
        EXPECTED_ATTRIBUTE,
        ILLEGAL_ATTRIBUTE_VALUE,
        ILLEGAL_YES_NO_VALUE,
        ILLEGAL_INTEGER_VALUE,
        ILLEGAL_IDENTIFIER,
        ILLEGAL_EMPTY_ATTRIBUTE_VALUE,
        ILLEGAL_ATTRIBUTE_WITH_OTHER_ATTRIBUTE,
        ILLEGAL_ELEMENT_WITH_ATTRIBUTE,
        EXPECTED_ELEMENT_TEXT,
        UNSUPPORTED_EXTENSION_ELEMENT,
        UNSUPPORTED_EXTENSION_ATTRIBUTE,
        DUPLICATE_PRIMARY_KEY,
        UNRESOLVED_REFERENCE,
        ILLEGAL_ATTRIBUTE_WHEN_NESTED,
        ILLEGAL_VERSION_VALUE,
        ROOT_ELEMENT_NOT_RECOGNIZED,
        UNRESOLVED_SIMPLE_REFERENCE,
        UNKNOWN_HOST_ELEMENT,
    ];
    &MESSAGES
}

/// Every known message keyed by id
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: BTreeMap<u32, MessageDef>,
}

impl MessageCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the host messages
    pub fn with_host_messages() -> Result<Self, RegistryError> {
        let mut catalog = Self::new();
        catalog.register(host_messages())?;
        Ok(catalog)
    }

    /// Add a set of messages. Reusing an id is an error even when the text matches.
    pub fn register(&mut self, defs: &[MessageDef]) -> Result<(), RegistryError> {
        for def in defs {
            if let Some(existing) = self.messages.get(&def.id) {
                return Err(RegistryError::DuplicateMessageId {
                    id: def.id,
                    existing: existing.name.to_string(),
                    duplicate: def.name.to_string(),
                });
            }
            self.messages.insert(def.id, *def);
        }
        Ok(())
    }

    /// Find a message by id
    pub fn lookup(&self, id: u32) -> Option<&MessageDef> {
        self.messages.get(&id)
    }

    /// Find a message by its symbolic name
    pub fn lookup_name(&self, name: &str) -> Option<&MessageDef> {
        self.messages.values().find(|def| def.name == name)
    }

    /// Format a message by id
    pub fn format(&self, id: u32, args: &[&str]) -> Option<String> {
        self.lookup(id).map(|def| def.render(args))
    }

    /// Messages in id order
    pub fn iter(&self) -> impl Iterator<Item = &MessageDef> {
        self.messages.values()
    }

    /// Number of messages with the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.messages.values().filter(|def| def.severity == severity).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_ids_are_unique_and_in_range() {
        let catalog = MessageCatalog::with_host_messages().unwrap();
        assert_eq!(catalog.len(), host_messages().len());
        assert!(catalog.iter().all(|def| def.id < 100));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut catalog = MessageCatalog::with_host_messages().unwrap();
        let clash = MessageDef::error(3, "SomethingElse", "text");

        let err = catalog.register(&[clash]).unwrap_err();
        assert!(err.to_string().contains("ExpectedAttribute"));
        assert!(err.to_string().contains("SomethingElse"));
    }

    #[test]
    fn format_by_id() {
        let catalog = MessageCatalog::with_host_messages().unwrap();
        assert_eq!(
            catalog.format(3, &["Driver", "Id"]).as_deref(),
            Some("The Driver/@Id attribute was not found; it is required.")
        );
        assert!(catalog.format(9999, &[]).is_none());
    }

    #[test]
    fn lookup_by_name() {
        let catalog = MessageCatalog::with_host_messages().unwrap();
        assert_eq!(catalog.lookup_name("UnresolvedReference").map(|d| d.id), Some(15));
        assert_eq!(catalog.count(Severity::Warning), 1);
    }
}
