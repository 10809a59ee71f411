//! PowerShell snap-in registration (`SnapIn` under `File`)
//!
//! Nothing here has a table of its own. A snap-in is registered by writing
//! host `Registry` rows under the PowerShell snap-in key.

mod compiler;

use pkgext_core::{
    ContextMap, Element, ElementParser, Extension, ExtensionError, MessageDef, ParseContext, SchemaProvider,
    TableDefinition, Validator,
};

pub const NAMESPACE: &str = "http://schemas.microsoft.com/wix/PSExtension";

/// `Registry.Root` for HKEY_LOCAL_MACHINE
pub const HKLM: i64 = 2;

#[derive(Debug, Default)]
pub struct PowerShellExtension;

impl PowerShellExtension {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaProvider for PowerShellExtension {
    fn table_definitions(&self) -> Vec<TableDefinition> {
        Vec::new()
    }
}

impl ElementParser for PowerShellExtension {
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
            ("File", "SnapIn") => compiler::parse_snap_in(ctx, element, context),
            _ => {
                ctx.unexpected_element(parent, element);
                Ok(())
            }
        }
    }
}

impl Validator for PowerShellExtension {}

impl Extension for PowerShellExtension {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn messages(&self) -> &'static [MessageDef] {
        &[]
    }
}
