//! HTTP URL namespace reservations (`UrlReservation` under `Component` or `ServiceInstall`)

mod compiler;

use pkgext_core::{
    ColumnDefinition, ContextMap, Element, ElementParser, Extension, ExtensionError, MessageDef, ParseContext,
    SchemaProvider, TableDefinition, Validator,
};

pub const NAMESPACE: &str = "http://schemas.microsoft.com/wix/HttpExtension";

pub const RESERVATION_TABLE: &str = "WixHttpUrlReservation";
pub const ACE_TABLE: &str = "WixHttpUrlAce";

pub const NO_SECURITY_SPECIFIED: MessageDef = MessageDef::error(
    6701,
    "NoSecuritySpecified",
    "The UrlReservation for URL '{0}' does not specify any security. Include at least one UrlAce element or specify the Sddl attribute.",
);

pub const URL_MISSING_TRAILING_SLASH: MessageDef = MessageDef::warning(
    6704,
    "UrlMissingTrailingSlash",
    "The UrlReservation URL '{0}' does not end with a '/'. The HTTP server matches reservations by prefix, so add the trailing slash.",
);

static MESSAGES: [MessageDef; 2] = [NO_SECURITY_SPECIFIED, URL_MISSING_TRAILING_SLASH];

/// `HandleExisting` values
pub const HANDLE_EXISTING_REPLACE: i64 = 0;
pub const HANDLE_EXISTING_IGNORE: i64 = 1;
pub const HANDLE_EXISTING_FAIL: i64 = 2;

/// `Rights` values (generic access masks)
pub const RIGHTS_ALL: i64 = 0x1000_0000;
pub const RIGHTS_REGISTER: i64 = 0x2000_0000;
pub const RIGHTS_DELEGATE: i64 = 0x4000_0000;

#[derive(Debug, Default)]
pub struct HttpExtension;

impl HttpExtension {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaProvider for HttpExtension {
    fn table_definitions(&self) -> Vec<TableDefinition> {
        vec![
            TableDefinition::new(
                RESERVATION_TABLE,
                vec![
                    ColumnDefinition::string("WixHttpUrlReservation").primary_key(),
                    ColumnDefinition::number("HandleExisting"),
                    ColumnDefinition::string("Sddl").nullable(),
                    ColumnDefinition::string("Url"),
                    ColumnDefinition::string("Component_").references("Component", "Component"),
                ],
            ),
            TableDefinition::new(
                ACE_TABLE,
                vec![
                    ColumnDefinition::string("WixHttpUrlAce").primary_key(),
                    ColumnDefinition::string("WixHttpUrlReservation_")
                        .references(RESERVATION_TABLE, "WixHttpUrlReservation"),
                    ColumnDefinition::string("SecurityPrincipal"),
                    ColumnDefinition::number("Rights"),
                ],
            ),
        ]
    }
}

impl ElementParser for HttpExtension {
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
            ("Component" | "ServiceInstall", "UrlReservation") => {
                compiler::parse_url_reservation(ctx, element, context)
            }
            _ => {
                ctx.unexpected_element(parent, element);
                Ok(())
            }
        }
    }
}

impl Validator for HttpExtension {}

impl Extension for HttpExtension {
    fn name(&self) -> &'static str {
        "http"
    }

    fn messages(&self) -> &'static [MessageDef] {
        &MESSAGES
    }
}
