//! Driver installation (`Driver` under `Component`)

mod compiler;
mod decompiler;

use pkgext_core::parse::YesNo;
use pkgext_core::{
    BitFlag, ColumnDefinition, ContextMap, Decompiler, Element, ElementParser, Extension, ExtensionError,
    FlagSet, MessageDef, ParseContext, SchemaProvider, TableDefinition, Validator,
};

pub const NAMESPACE: &str = "http://schemas.microsoft.com/wix/DifxAppExtension";

pub const DRIVER_TABLE: &str = "MsiDriverPackages";

const DRIVER_FLAG_BITS: [BitFlag; 5] = [
    BitFlag::new("ForceInstall", 0x1, YesNo::Yes),
    BitFlag::new("PlugAndPlayPrompt", 0x2, YesNo::No),
    BitFlag::new("AddRemovePrograms", 0x4, YesNo::No),
    BitFlag::new("Legacy", 0x8, YesNo::Yes),
    BitFlag::new("DeleteFiles", 0x10, YesNo::Yes),
];

/// `MsiDriverPackages.Flags`
pub const DRIVER_FLAGS: FlagSet = FlagSet::new(&DRIVER_FLAG_BITS);

#[derive(Debug, Default)]
pub struct DifxAppExtension {
    decompiler: decompiler::DriverDecompiler,
}

impl DifxAppExtension {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaProvider for DifxAppExtension {
    fn table_definitions(&self) -> Vec<TableDefinition> {
        vec![TableDefinition::new(
            DRIVER_TABLE,
            vec![
                ColumnDefinition::string("Component")
                    .primary_key()
                    .references("Component", "Component"),
                ColumnDefinition::number("Flags"),
                ColumnDefinition::number("Sequence").nullable(),
                ColumnDefinition::string("ReferenceComponents").nullable(),
            ],
        )]
    }
}

impl ElementParser for DifxAppExtension {
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
            ("Component", "Driver") => compiler::parse_driver(ctx, element, context),
            _ => {
                ctx.unexpected_element(parent, element);
                Ok(())
            }
        }
    }
}

impl Validator for DifxAppExtension {}

impl Extension for DifxAppExtension {
    fn name(&self) -> &'static str {
        "difxapp"
    }

    fn messages(&self) -> &'static [MessageDef] {
        &[]
    }

    fn decompiler(&self) -> Option<&dyn Decompiler> {
        Some(&self.decompiler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_flag_combination_survives_decode_then_encode() {
        for bits in 0..0x20u32 {
            let attributes = DRIVER_FLAGS.decode(bits);
            assert_eq!(DRIVER_FLAGS.encode(attributes.iter().copied()), bits);
        }
    }

    #[test]
    fn force_install_and_delete_files() {
        let bits = DRIVER_FLAGS.encode([("ForceInstall", YesNo::Yes), ("DeleteFiles", YesNo::Yes)]);
        assert_eq!(bits, 0x11);
        assert_eq!(
            DRIVER_FLAGS.decode(0x11),
            vec![("ForceInstall", YesNo::Yes), ("DeleteFiles", YesNo::Yes)]
        );
    }

    #[test]
    fn default_values_leave_bits_clear() {
        let bits = DRIVER_FLAGS.encode([
            ("ForceInstall", YesNo::No),
            ("PlugAndPlayPrompt", YesNo::Yes),
            ("AddRemovePrograms", YesNo::Yes),
            ("Legacy", YesNo::No),
            ("DeleteFiles", YesNo::No),
        ]);
        assert_eq!(bits, 0);
        assert_eq!(DRIVER_FLAGS.encode([("PlugAndPlayPrompt", YesNo::No)]), 0x2);
    }
}
