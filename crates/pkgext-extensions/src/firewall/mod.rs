//! Windows Firewall exceptions (`FirewallException` under `Component` or `File`)

mod compiler;

use pkgext_core::parse::YesNo;
use pkgext_core::{
    BitFlag, ColumnDefinition, ContextMap, Element, ElementParser, Extension, ExtensionError, FlagSet,
    MessageDef, ParseContext, SchemaProvider, TableDefinition, Validator,
};

pub const NAMESPACE: &str = "http://schemas.microsoft.com/wix/FirewallExtension";

pub const EXCEPTION_TABLE: &str = "WixFirewallException";

pub const ILLEGAL_REMOTE_ADDRESS_WITH_SCOPE_ATTRIBUTE: MessageDef = MessageDef::error(
    6401,
    "IllegalRemoteAddressWithScopeAttribute",
    "The RemoteAddress element cannot be specified because its parent FirewallException already specified the Scope attribute. To use RemoteAddress, omit the Scope attribute.",
);

pub const ILLEGAL_EMPTY_REMOTE_ADDRESS: MessageDef = MessageDef::error(
    6402,
    "IllegalEmptyRemoteAddress",
    "The RemoteAddress element's inner text cannot be an empty string or completely whitespace. If you don't want a remote address, remove the entire RemoteAddress element.",
);

pub const NO_EXCEPTION_SPECIFIED: MessageDef = MessageDef::error(
    6403,
    "NoExceptionSpecified",
    "The FirewallException element doesn't identify the target of the firewall exception. To create an application exception, nest the FirewallException element under a File element or provide a value for the File or Program attributes. To create a port exception, provide a value for the Port attribute.",
);

pub const DUPLICATE_REMOTE_ADDRESS: MessageDef = MessageDef::warning(
    6404,
    "DuplicateRemoteAddress",
    "The remote address '{0}' is listed more than once for firewall exception '{1}'. The duplicate is ignored.",
);

static MESSAGES: [MessageDef; 4] = [
    ILLEGAL_REMOTE_ADDRESS_WITH_SCOPE_ATTRIBUTE,
    ILLEGAL_EMPTY_REMOTE_ADDRESS,
    NO_EXCEPTION_SPECIFIED,
    DUPLICATE_REMOTE_ADDRESS,
];

const ATTRIBUTE_BITS: [BitFlag; 1] = [BitFlag::new("IgnoreFailure", 0x1, YesNo::Yes)];

/// `WixFirewallException.Attributes`
pub const EXCEPTION_ATTRIBUTES: FlagSet = FlagSet::new(&ATTRIBUTE_BITS);

pub const PROTOCOL_TCP: i64 = 6;
pub const PROTOCOL_UDP: i64 = 17;

pub const PROFILE_DOMAIN: i64 = 1;
pub const PROFILE_PRIVATE: i64 = 2;
pub const PROFILE_PUBLIC: i64 = 4;
pub const PROFILE_ALL: i64 = 2147483647;

#[derive(Debug, Default)]
pub struct FirewallExtension;

impl FirewallExtension {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaProvider for FirewallExtension {
    fn table_definitions(&self) -> Vec<TableDefinition> {
        vec![TableDefinition::new(
            EXCEPTION_TABLE,
            vec![
                ColumnDefinition::string("WixFirewallException").primary_key(),
                ColumnDefinition::localized("Name"),
                ColumnDefinition::localized("RemoteAddresses").nullable(),
                ColumnDefinition::string("Port").nullable(),
                ColumnDefinition::number("Protocol").nullable(),
                ColumnDefinition::string("Program").nullable(),
                ColumnDefinition::number("Attributes"),
                ColumnDefinition::number("Profile"),
                ColumnDefinition::string("Component_").references("Component", "Component"),
                ColumnDefinition::localized("Description").nullable(),
            ],
        )]
    }
}

impl ElementParser for FirewallExtension {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    fn parse_element(
        &self,
        ctx: &mut ParseContext<'_>,
        parent: &Element,
        element: &Element,
        context: &ContextMap,
    ) -> Result<(), ExtensionError> {
        match (parent.name.as_str(), element.name.as_str()) {
            ("Component" | "File", "FirewallException") => {
                compiler::parse_firewall_exception(ctx, parent, element, context)
            }
            _ => {
                ctx.unexpected_element(parent, element);
                Ok(())
            }
        }
    }
}

impl Validator for FirewallExtension {}

impl Extension for FirewallExtension {
    fn name(&self) -> &'static str {
        "firewall"
    }

    fn messages(&self) -> &'static [MessageDef] {
        &MESSAGES
    }
}
