//! Bootstrapper application support
//!
//! Covers the standard and managed bootstrapper applications: their options
//! and theme variables, install conditions, prerequisite packages and the
//! optional BAFunctions payload. Cross-row rules are checked in [`binder`].

mod binder;
mod compiler;

use pkgext_core::{
    Attribute, ColumnDefinition, ContextMap, Diagnostic, Element, ElementParser, Extension, ExtensionError,
    MessageDef, Output, ParseContext, SchemaProvider, TableDefinition, Validator,
};

pub const NAMESPACE: &str = "http://schemas.microsoft.com/wix/BalExtension";

pub const CONDITION_TABLE: &str = "WixBalCondition";
pub const OPTIONS_TABLE: &str = "WixStdbaOptions";
pub const PREREQ_TABLE: &str = "WixMbaPrereqInformation";
pub const BA_FUNCTIONS_TABLE: &str = "WixBalBAFunctions";
pub const PACKAGE_INFO_TABLE: &str = "WixBalPackageInfo";
pub const OVERRIDABLE_VARIABLE_TABLE: &str = "WixStdbaOverridableVariable";

/// Container the host places bootstrapper application payloads in
pub const UX_CONTAINER: &str = "WixUXContainer";

/// Id prefix of the managed bootstrapper application host
pub const MANAGED_HOST_PREFIX: &str = "ManagedBootstrapperApplicationHost";

pub const ATTRIBUTE_REQUIRES_PREREQ_PACKAGE: MessageDef = MessageDef::error(
    6801,
    "AttributeRequiresPrereqPackage",
    "When the {0}/@{1} attribute is specified, the {0}/@PrereqPackage attribute must be set to \"yes\".",
);

pub const MISSING_PREREQ: MessageDef = MessageDef::error(
    6802,
    "MissingPrereq",
    "There must be at least one PrereqPackage when using the ManagedBootstrapperApplicationHost. This is typically done by referencing a package group that marks the .NET Framework package as a prerequisite.",
);

pub const MULTIPLE_PREREQ_LICENSES: MessageDef = MessageDef::error(
    6803,
    "MultiplePrereqLicenses",
    "There may only be one package in the bundle that has either the PrereqLicenseFile attribute or the PrereqLicenseUrl attribute.",
);

pub const MULTIPLE_BA_FUNCTIONS: MessageDef = MessageDef::error(
    6804,
    "MultipleBAFunctions",
    "WixStandardBootstrapperApplication doesn't support multiple BAFunctions DLLs.",
);

pub const BA_FUNCTIONS_PAYLOAD_REQUIRED_IN_UX_CONTAINER: MessageDef = MessageDef::error(
    6805,
    "BAFunctionsPayloadRequiredInUXContainer",
    "The BAFunctions DLL Payload element must be located inside the BootstrapperApplication container.",
);

static MESSAGES: [MessageDef; 5] = [
    ATTRIBUTE_REQUIRES_PREREQ_PACKAGE,
    MISSING_PREREQ,
    MULTIPLE_PREREQ_LICENSES,
    MULTIPLE_BA_FUNCTIONS,
    BA_FUNCTIONS_PAYLOAD_REQUIRED_IN_UX_CONTAINER,
];

#[derive(Debug, Default)]
pub struct BalExtension;

impl BalExtension {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaProvider for BalExtension {
    fn table_definitions(&self) -> Vec<TableDefinition> {
        vec![
            TableDefinition::new(
                CONDITION_TABLE,
                vec![
                    ColumnDefinition::string("Condition").primary_key(),
                    ColumnDefinition::localized("Message"),
                ],
            ),
            TableDefinition::new(
                OPTIONS_TABLE,
                vec![
                    ColumnDefinition::number("SuppressOptionsUI").nullable(),
                    ColumnDefinition::number("SuppressDowngradeFailure").nullable(),
                    ColumnDefinition::number("SuppressRepair").nullable(),
                    ColumnDefinition::number("ShowVersion").nullable(),
                    ColumnDefinition::number("SupportCacheOnly").nullable(),
                ],
            ),
            TableDefinition::new(
                PREREQ_TABLE,
                vec![
                    ColumnDefinition::string("PackageId")
                        .primary_key()
                        .references("WixBundlePackage", "WixBundlePackage"),
                    ColumnDefinition::localized("LicenseFile").nullable(),
                    ColumnDefinition::localized("LicenseUrl").nullable(),
                ],
            ),
            TableDefinition::new(
                BA_FUNCTIONS_TABLE,
                vec![ColumnDefinition::string("PayloadId")
                    .primary_key()
                    .references("Payload", "Payload")],
            ),
            TableDefinition::new(
                PACKAGE_INFO_TABLE,
                vec![
                    ColumnDefinition::string("PackageId")
                        .primary_key()
                        .references("WixBundlePackage", "WixBundlePackage"),
                    ColumnDefinition::number("DisplayInternalUI"),
                ],
            ),
            TableDefinition::new(
                OVERRIDABLE_VARIABLE_TABLE,
                vec![ColumnDefinition::string("Name")
                    .primary_key()
                    .references("WixBundleVariable", "WixBundleVariable")],
            ),
        ]
    }
}

impl ElementParser for BalExtension {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    fn parse_element(
        &self,
        ctx: &mut ParseContext<'_>,
        parent: &Element,
        element: &Element,
        _context: &ContextMap,
    ) -> Result<(), ExtensionError> {
        match (parent.name.as_str(), element.name.as_str()) {
            ("Bundle", "Condition") => compiler::parse_condition(ctx, element),
            ("BootstrapperApplicationRef", "WixStandardBootstrapperApplication") => {
                compiler::parse_standard_ba(ctx, element)
            }
            ("BootstrapperApplicationRef", "WixManagedBootstrapperApplicationHost") => {
                compiler::parse_managed_host(ctx, element)
            }
            _ => {
                ctx.unexpected_element(parent, element);
                Ok(())
            }
        }
    }

    fn parse_attributes(
        &self,
        ctx: &mut ParseContext<'_>,
        element: &Element,
        attributes: &[&Attribute],
        context: &ContextMap,
    ) -> Result<(), ExtensionError> {
        match element.name.as_str() {
            "Payload" => compiler::parse_payload_attributes(ctx, element, attributes, context),
            "MsiPackage" | "ExePackage" | "MspPackage" | "MsuPackage" => {
                compiler::parse_package_attributes(ctx, element, attributes, context)
            }
            "Variable" => compiler::parse_variable_attributes(ctx, element, attributes, context),
            _ => {
                for attribute in attributes {
                    ctx.unexpected_attribute(element, &attribute.name);
                }
                Ok(())
            }
        }
    }
}

impl Validator for BalExtension {
    fn validate(&self, output: &Output) -> Result<Vec<Diagnostic>, ExtensionError> {
        let mut diagnostics = binder::check_ba_functions(output)?;
        diagnostics.extend(binder::check_prereqs(output));
        Ok(diagnostics)
    }
}

impl Extension for BalExtension {
    fn name(&self) -> &'static str {
        "bal"
    }

    fn messages(&self) -> &'static [MessageDef] {
        &MESSAGES
    }
}
