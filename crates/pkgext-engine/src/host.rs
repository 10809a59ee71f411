//! Host shim for core-namespace elements
//!
//! This is not a compiler for the core language. It emits just enough rows
//! (components, files, payloads, packages, ...) for extension rows to
//! reference, and tracks the context extensions are handed.

use crate::compiler::Compiler;
use pkgext_core::catalog;
use pkgext_core::parse::{context, generate_identifier};
use pkgext_core::{
    Attribute, ColumnDefinition, ContextMap, Element, ExtensionError, ParseContext, TableDefinition,
};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Namespace of the core language
pub const CORE_NAMESPACE: &str = "http://schemas.microsoft.com/wix/2006/wi";

/// Container every bootstrapper application payload is packaged in
pub const UX_CONTAINER: &str = "WixUXContainer";

/// Container for payloads outside any explicit container
pub const ATTACHED_CONTAINER: &str = "WixAttachedContainer";

/// Core elements that are walked without producing rows
const PASS_THROUGH: &[&str] = &[
    "Wix",
    "Product",
    "Module",
    "Fragment",
    "Feature",
    "ComponentGroup",
    "Chain",
    "PackageGroup",
];

/// Core elements known to carry nothing extensions depend on
const IGNORED: &[&str] = &[
    "Package",
    "MajorUpgrade",
    "MediaTemplate",
    "Media",
    "Property",
    "ComponentRef",
    "ComponentGroupRef",
    "FeatureRef",
    "PackageGroupRef",
    "CustomAction",
    "InstallExecuteSequence",
    "InstallUISequence",
    "Custom",
    "Condition",
    "Shortcut",
    "RegistryKey",
    "RegistryValue",
    "UIRef",
    "WixVariable",
    "RemotePayload",
    "MsiProperty",
    "ExitCode",
    "CommandLine",
    "Log",
    "RelatedBundle",
    "Update",
    "ServiceControl",
];

/// Tables owned by the host
pub fn table_definitions() -> Vec<TableDefinition> {
    vec![
        TableDefinition::new(
            "Component",
            vec![
                ColumnDefinition::string("Component").primary_key(),
                ColumnDefinition::string("Directory_").nullable(),
            ],
        ),
        TableDefinition::new(
            "File",
            vec![
                ColumnDefinition::string("File").primary_key(),
                ColumnDefinition::string("Component_").references("Component", "Component"),
                ColumnDefinition::localized("Name").nullable(),
            ],
        ),
        TableDefinition::new(
            "ServiceInstall",
            vec![
                ColumnDefinition::string("ServiceInstall").primary_key(),
                ColumnDefinition::localized("Name"),
                ColumnDefinition::string("Component_").references("Component", "Component"),
            ],
        ),
        TableDefinition::new(
            "Registry",
            vec![
                ColumnDefinition::string("Registry").primary_key(),
                ColumnDefinition::number("Root"),
                ColumnDefinition::localized("Key"),
                ColumnDefinition::localized("Name").nullable(),
                ColumnDefinition::localized("Value").nullable(),
                ColumnDefinition::string("Component_").references("Component", "Component"),
            ],
        ),
        TableDefinition::new(
            "WixVariable",
            vec![
                ColumnDefinition::string("WixVariable").primary_key(),
                ColumnDefinition::localized("Value"),
            ],
        ),
        TableDefinition::new(
            "WixBootstrapperApplication",
            vec![ColumnDefinition::string("Id").primary_key()],
        ),
        TableDefinition::new(
            "WixBundleContainer",
            vec![
                ColumnDefinition::string("WixBundleContainer").primary_key(),
                ColumnDefinition::string("Type"),
            ],
        ),
        TableDefinition::new(
            "Payload",
            vec![
                ColumnDefinition::string("Payload").primary_key(),
                ColumnDefinition::localized("Name").nullable(),
                ColumnDefinition::string("SourceFile").nullable(),
                ColumnDefinition::string("Container_").references("WixBundleContainer", "WixBundleContainer"),
            ],
        ),
        TableDefinition::new(
            "WixBundlePackage",
            vec![
                ColumnDefinition::string("WixBundlePackage").primary_key(),
                ColumnDefinition::string("Type"),
            ],
        ),
        TableDefinition::new(
            "WixBundleVariable",
            vec![
                ColumnDefinition::string("WixBundleVariable").primary_key(),
                ColumnDefinition::localized("Value").nullable(),
                ColumnDefinition::string("Type").nullable(),
            ],
        ),
    ]
}

/// Walk a core element, its extension attributes and its children
pub(crate) fn walk(
    compiler: &Compiler,
    ctx: &mut ParseContext<'_>,
    parent: Option<&Element>,
    element: &Element,
    inherited: &ContextMap,
) -> Result<(), ExtensionError> {
    let mut scope = inherited.clone();

    match element.name.as_str() {
        name if PASS_THROUGH.contains(&name) => {}
        "Bundle" => bundle(ctx, element)?,
        "Directory" | "DirectoryRef" => {
            if let Some(id) = element.attribute("Id") {
                scope.insert(context::DIRECTORY_ID.to_string(), id.to_string());
            }
        }
        "Component" => component(ctx, element, &mut scope)?,
        "File" => file(ctx, parent, element, &mut scope)?,
        "ServiceInstall" => service_install(ctx, parent, element, &scope)?,
        "BootstrapperApplication" | "BootstrapperApplicationRef" => {
            bootstrapper_application(ctx, element, &mut scope)?
        }
        "Container" => container(ctx, element, &mut scope)?,
        "Payload" => payload(ctx, element, &mut scope)?,
        "MsiPackage" | "ExePackage" | "MspPackage" | "MsuPackage" => package(ctx, element, &mut scope)?,
        "Variable" => variable(ctx, element, &mut scope)?,
        name if IGNORED.contains(&name) => {
            trace!(element = name, "skipping core element");
        }
        _ => {
            ctx.message(&catalog::UNKNOWN_HOST_ELEMENT, &element.location, &[&element.name]);
        }
    }

    dispatch_attributes(compiler, ctx, element, &scope)?;

    for child in &element.children {
        if child.is_in(CORE_NAMESPACE) {
            walk(compiler, ctx, Some(element), child, &scope)?;
        } else {
            dispatch_element(compiler, ctx, element, child, &scope)?;
        }
    }

    Ok(())
}

/// Hand an extension element to the extension owning its namespace
fn dispatch_element(
    compiler: &Compiler,
    ctx: &mut ParseContext<'_>,
    parent: &Element,
    element: &Element,
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    let namespace = element.namespace.as_deref().unwrap_or_default();

    match compiler.extension_for(namespace) {
        Some(extension) => {
            debug!(extension = extension.name(), element = %element.name, "dispatching element");
            extension.parse_element(ctx, parent, element, scope)
        }
        None => {
            ctx.message(
                &catalog::UNSUPPORTED_EXTENSION_ELEMENT,
                &element.location,
                &[&parent.name, &element.name, namespace],
            );
            Ok(())
        }
    }
}

/// Hand each namespace's attributes on a core element to its extension
fn dispatch_attributes(
    compiler: &Compiler,
    ctx: &mut ParseContext<'_>,
    element: &Element,
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    let mut by_namespace: BTreeMap<&str, Vec<&Attribute>> = BTreeMap::new();
    for attribute in &element.attributes {
        if let Some(namespace) = attribute.namespace.as_deref() {
            by_namespace.entry(namespace).or_default().push(attribute);
        }
    }

    for (namespace, attributes) in by_namespace {
        match compiler.extension_for(namespace) {
            Some(extension) => {
                debug!(extension = extension.name(), element = %element.name, "dispatching attributes");
                extension.parse_attributes(ctx, element, &attributes, scope)?;
            }
            None => {
                for attribute in attributes {
                    ctx.message(
                        &catalog::UNSUPPORTED_EXTENSION_ATTRIBUTE,
                        &element.location,
                        &[&element.name, &attribute.name, namespace],
                    );
                }
            }
        }
    }

    Ok(())
}

/// Required identifier attribute of a core element
fn required_id(ctx: &mut ParseContext<'_>, element: &Element, name: &str) -> Option<String> {
    match element.attributes.iter().find(|a| a.namespace.is_none() && a.name == name) {
        Some(attribute) => ctx.identifier_value(element, attribute),
        None => {
            ctx.expected_attribute(element, name);
            None
        }
    }
}

/// Optional identifier attribute of a core element
fn optional_id(ctx: &mut ParseContext<'_>, element: &Element, name: &str) -> Option<String> {
    element
        .attributes
        .iter()
        .find(|a| a.namespace.is_none() && a.name == name)
        .and_then(|attribute| ctx.identifier_value(element, attribute))
}

fn bundle(ctx: &mut ParseContext<'_>, element: &Element) -> Result<(), ExtensionError> {
    for (id, kind) in [(UX_CONTAINER, "ux"), (ATTACHED_CONTAINER, "attached")] {
        let row = ctx
            .new_row("WixBundleContainer", &element.location)?
            .with("WixBundleContainer", id)?
            .with("Type", kind)?;
        ctx.emit(row)?;
    }
    Ok(())
}

fn component(ctx: &mut ParseContext<'_>, element: &Element, scope: &mut ContextMap) -> Result<(), ExtensionError> {
    let Some(id) = required_id(ctx, element, "Id") else {
        return Ok(());
    };

    let row = ctx
        .new_row("Component", &element.location)?
        .with("Component", id.as_str())?
        .with("Directory_", scope.get(context::DIRECTORY_ID))?;
    ctx.emit(row)?;

    scope.insert(context::COMPONENT_ID.to_string(), id);
    Ok(())
}

fn file(
    ctx: &mut ParseContext<'_>,
    parent: Option<&Element>,
    element: &Element,
    scope: &mut ContextMap,
) -> Result<(), ExtensionError> {
    let Some(component_id) = scope.get(context::COMPONENT_ID).cloned() else {
        if let Some(parent) = parent {
            ctx.unexpected_element(parent, element);
        }
        return Ok(());
    };

    let source = element.attribute("Source").or_else(|| element.attribute("Name")).unwrap_or_default();
    let id = match element.attribute("Id") {
        Some(_) => optional_id(ctx, element, "Id"),
        None => Some(generate_identifier("fil", &[component_id.as_str(), source])),
    };
    let Some(id) = id else {
        return Ok(());
    };

    let row = ctx
        .new_row("File", &element.location)?
        .with("File", id.as_str())?
        .with("Component_", component_id)?
        .with("Name", element.attribute("Name"))?;
    ctx.emit(row)?;

    scope.insert(context::FILE_ID.to_string(), id);
    Ok(())
}

fn service_install(
    ctx: &mut ParseContext<'_>,
    parent: Option<&Element>,
    element: &Element,
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    let Some(component_id) = scope.get(context::COMPONENT_ID).cloned() else {
        if let Some(parent) = parent {
            ctx.unexpected_element(parent, element);
        }
        return Ok(());
    };

    let id = required_id(ctx, element, "Id");
    let name = element.attribute("Name");
    if name.is_none() {
        ctx.expected_attribute(element, "Name");
    }
    let (Some(id), Some(name)) = (id, name) else {
        return Ok(());
    };

    let row = ctx
        .new_row("ServiceInstall", &element.location)?
        .with("ServiceInstall", id)?
        .with("Name", name)?
        .with("Component_", component_id)?;
    ctx.emit(row)
}

fn bootstrapper_application(
    ctx: &mut ParseContext<'_>,
    element: &Element,
    scope: &mut ContextMap,
) -> Result<(), ExtensionError> {
    let is_ref = element.name == "BootstrapperApplicationRef";
    let id = if is_ref {
        required_id(ctx, element, "Id")
    } else {
        optional_id(ctx, element, "Id").or_else(|| Some("WixBootstrapperApplication".to_string()))
    };

    if let Some(id) = id {
        // A reference may repeat in other fragments; only the first one defines the row
        if is_ref && ctx.output().find("WixBootstrapperApplication", "Id", &id).is_some() {
            trace!(id = %id, "bootstrapper application already referenced");
        } else {
            let row = ctx
                .new_row("WixBootstrapperApplication", &element.location)?
                .with("Id", id)?;
            ctx.emit(row)?;
        }
    }

    scope.insert(context::CONTAINER_ID.to_string(), UX_CONTAINER.to_string());
    Ok(())
}

fn container(ctx: &mut ParseContext<'_>, element: &Element, scope: &mut ContextMap) -> Result<(), ExtensionError> {
    let Some(id) = required_id(ctx, element, "Id") else {
        return Ok(());
    };

    let kind = match element.attribute("Type") {
        Some("attached") => "attached",
        _ => "detached",
    };

    let row = ctx
        .new_row("WixBundleContainer", &element.location)?
        .with("WixBundleContainer", id.as_str())?
        .with("Type", kind)?;
    ctx.emit(row)?;

    scope.insert(context::CONTAINER_ID.to_string(), id);
    Ok(())
}

fn payload(ctx: &mut ParseContext<'_>, element: &Element, scope: &mut ContextMap) -> Result<(), ExtensionError> {
    let source = element.attribute("SourceFile");
    let id = match element.attribute("Id") {
        Some(_) => optional_id(ctx, element, "Id"),
        None => match source {
            Some(source) => Some(generate_identifier("pay", &[source])),
            None => {
                ctx.expected_attribute(element, "SourceFile");
                None
            }
        },
    };
    let Some(id) = id else {
        return Ok(());
    };

    let container = scope
        .get(context::CONTAINER_ID)
        .cloned()
        .unwrap_or_else(|| ATTACHED_CONTAINER.to_string());

    let row = ctx
        .new_row("Payload", &element.location)?
        .with("Payload", id.as_str())?
        .with("Name", element.attribute("Name"))?
        .with("SourceFile", source)?
        .with("Container_", container)?;
    ctx.emit(row)?;

    scope.insert(context::PAYLOAD_ID.to_string(), id);
    Ok(())
}

fn package(ctx: &mut ParseContext<'_>, element: &Element, scope: &mut ContextMap) -> Result<(), ExtensionError> {
    let id = match element.attribute("Id") {
        Some(_) => optional_id(ctx, element, "Id"),
        None => match element.attribute("SourceFile") {
            Some(source) => Some(package_id_from_source(source)),
            None => {
                ctx.expected_attribute(element, "Id");
                None
            }
        },
    };
    let Some(id) = id else {
        return Ok(());
    };

    let kind = element.name.trim_end_matches("Package");
    let row = ctx
        .new_row("WixBundlePackage", &element.location)?
        .with("WixBundlePackage", id.as_str())?
        .with("Type", kind)?;
    ctx.emit(row)?;

    scope.insert(context::PACKAGE_ID.to_string(), id);
    Ok(())
}

/// Package id taken from the source file name, with illegal characters replaced
fn package_id_from_source(source: &str) -> String {
    let file_name = source.rsplit(['\\', '/']).next().unwrap_or(source);
    let mut id: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
        .collect();

    if id.starts_with(|c: char| c.is_ascii_digit() || c == '.') || id.is_empty() {
        id.insert(0, '_');
    }
    id
}

fn variable(ctx: &mut ParseContext<'_>, element: &Element, scope: &mut ContextMap) -> Result<(), ExtensionError> {
    let Some(name) = required_id(ctx, element, "Name") else {
        return Ok(());
    };

    let row = ctx
        .new_row("WixBundleVariable", &element.location)?
        .with("WixBundleVariable", name.as_str())?
        .with("Value", element.attribute("Value"))?
        .with("Type", element.attribute("Type"))?;
    ctx.emit(row)?;

    scope.insert(context::VARIABLE_NAME.to_string(), name);
    Ok(())
}
