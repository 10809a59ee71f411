use super::*;
use pkgext_core::parse::{context, YesNo};
use pkgext_core::Location;
use tracing::trace;

/// Theme attributes and the variable suffix each one is written to
const THEME_VARIABLES: [(&str, &str); 5] = [
    ("LicenseFile", "LicenseRtf"),
    ("LicenseUrl", "LicenseUrl"),
    ("LogoFile", "Logo"),
    ("ThemeFile", "ThemeXml"),
    ("LocalizationFile", "ThemeWxl"),
];

/// Yes/no options of the standard bootstrapper application, one column each
const STDBA_OPTIONS: [&str; 5] = [
    "SuppressOptionsUI",
    "SuppressDowngradeFailure",
    "SuppressRepair",
    "ShowVersion",
    "SupportCacheOnly",
];

/// `Condition`: a launch condition with the message shown when it fails
pub(super) fn parse_condition(ctx: &mut ParseContext<'_>, element: &Element) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let mut message = None;

    for attribute in ctx.local_attributes(element) {
        match attribute.name.as_str() {
            "Message" => message = ctx.string_value(element, attribute),
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }

    if element.attribute("Message").is_none() {
        ctx.expected_attribute(element, "Message");
    }
    let condition = ctx.element_text(element);
    ctx.no_children(element);

    let (Some(condition), Some(message)) = (condition, message) else {
        return Ok(());
    };
    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    let row = ctx
        .new_row(CONDITION_TABLE, &element.location)?
        .with("Condition", condition)?
        .with("Message", message)?;
    ctx.emit(row)
}

/// `WixStandardBootstrapperApplication`
pub(super) fn parse_standard_ba(ctx: &mut ParseContext<'_>, element: &Element) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let mut theme = Vec::new();
    let mut options = Vec::new();
    let mut launch_target = None;

    for attribute in ctx.local_attributes(element) {
        let name = attribute.name.as_str();
        if let Some((_, suffix)) = THEME_VARIABLES.iter().find(|(a, _)| *a == name) {
            if let Some(value) = theme_value(ctx, element, attribute) {
                theme.push((*suffix, value));
            }
        } else if STDBA_OPTIONS.contains(&name) {
            if let Some(value) = ctx.yes_no_value(element, attribute) {
                options.push((name, value));
            }
        } else if name == "LaunchTarget" {
            launch_target = ctx.string_value(element, attribute);
        } else {
            ctx.unexpected_attribute(element, name);
        }
    }
    exclusive_license(ctx, element);
    ctx.no_children(element);

    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    write_theme_variables(ctx, &element.location, "WixStdba", theme)?;

    if let Some(target) = launch_target {
        let row = ctx
            .new_row("WixBundleVariable", &element.location)?
            .with("WixBundleVariable", "LaunchTarget")?
            .with("Value", target)?
            .with("Type", "string")?;
        ctx.emit(row)?;
    }

    if options.iter().any(|(_, value)| value.is_yes()) {
        let mut row = ctx.new_row(OPTIONS_TABLE, &element.location)?;
        for (name, value) in options {
            if value.is_yes() {
                row.set(name, 1i64)?;
            }
        }
        ctx.emit(row)?;
    }

    Ok(())
}

/// `WixManagedBootstrapperApplicationHost`
pub(super) fn parse_managed_host(ctx: &mut ParseContext<'_>, element: &Element) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let mut theme = Vec::new();
    let mut net_fx_package = None;

    for attribute in ctx.local_attributes(element) {
        let name = attribute.name.as_str();
        if let Some((_, suffix)) = THEME_VARIABLES.iter().find(|(a, _)| *a == name) {
            if let Some(value) = theme_value(ctx, element, attribute) {
                theme.push((*suffix, value));
            }
        } else if name == "NetFxPackageId" {
            net_fx_package = ctx.identifier_value(element, attribute);
        } else {
            ctx.unexpected_attribute(element, name);
        }
    }
    exclusive_license(ctx, element);
    ctx.no_children(element);

    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    write_theme_variables(ctx, &element.location, "Preqba", theme)?;

    if let Some(package) = net_fx_package {
        let row = ctx.new_row(PREREQ_TABLE, &element.location)?.with("PackageId", package)?;
        ctx.emit(row)?;
    }

    Ok(())
}

/// `LicenseUrl` may be empty to suppress the license link; every other
/// theme attribute needs a value.
fn theme_value(ctx: &mut ParseContext<'_>, element: &Element, attribute: &Attribute) -> Option<String> {
    if attribute.name == "LicenseUrl" {
        Some(attribute.value.clone())
    } else {
        ctx.string_value(element, attribute)
    }
}

fn exclusive_license(ctx: &mut ParseContext<'_>, element: &Element) {
    if element.attribute("LicenseFile").is_some() && element.attribute("LicenseUrl").is_some() {
        ctx.illegal_attribute_with_other(element, "LicenseFile", "LicenseUrl");
    }
}

fn write_theme_variables(
    ctx: &mut ParseContext<'_>,
    location: &Location,
    prefix: &str,
    theme: Vec<(&str, String)>,
) -> Result<(), ExtensionError> {
    for (suffix, value) in theme {
        let name = format!("{}{}", prefix, suffix);
        trace!(variable = %name, "theme variable");
        let row = ctx
            .new_row("WixVariable", location)?
            .with("WixVariable", name)?
            .with("Value", value)?;
        ctx.emit(row)?;
    }
    Ok(())
}

/// `bal:BAFunctions` on `Payload`
pub(super) fn parse_payload_attributes(
    ctx: &mut ParseContext<'_>,
    element: &Element,
    attributes: &[&Attribute],
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    for attribute in attributes {
        match attribute.name.as_str() {
            "BAFunctions" => {
                let enabled = ctx.yes_no_value(element, attribute).is_some_and(|v| v.is_yes());
                if let (true, Some(payload)) = (enabled, scope.get(context::PAYLOAD_ID)) {
                    let row = ctx
                        .new_row(BA_FUNCTIONS_TABLE, &element.location)?
                        .with("PayloadId", payload)?;
                    ctx.emit(row)?;
                }
            }
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }
    Ok(())
}

/// `bal:PrereqPackage`, `bal:PrereqLicenseFile`, `bal:PrereqLicenseUrl` and
/// (on `MsiPackage` only) `bal:DisplayInternalUI`
pub(super) fn parse_package_attributes(
    ctx: &mut ParseContext<'_>,
    element: &Element,
    attributes: &[&Attribute],
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let mut prereq = None;
    let mut license_file = None;
    let mut license_url = None;
    let mut display_internal_ui = None;

    for attribute in attributes {
        match attribute.name.as_str() {
            "PrereqPackage" => prereq = ctx.yes_no_value(element, attribute),
            "PrereqLicenseFile" => license_file = ctx.string_value(element, attribute).map(|v| (attribute, v)),
            "PrereqLicenseUrl" => license_url = ctx.string_value(element, attribute).map(|v| (attribute, v)),
            "DisplayInternalUI" if element.name == "MsiPackage" => {
                display_internal_ui = ctx.yes_no_value(element, attribute)
            }
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }

    let is_prereq = prereq.is_some_and(|p| p.is_yes());
    if !is_prereq {
        for (attribute, _) in license_file.iter().chain(license_url.iter()) {
            ctx.message(
                &ATTRIBUTE_REQUIRES_PREREQ_PACKAGE,
                &element.location,
                &[&element.name, &attribute.name],
            );
        }
    }

    let Some(package) = scope.get(context::PACKAGE_ID) else {
        return Ok(());
    };
    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    if is_prereq {
        let row = ctx
            .new_row(PREREQ_TABLE, &element.location)?
            .with("PackageId", package)?
            .with("LicenseFile", license_file.map(|(_, v)| v))?
            .with("LicenseUrl", license_url.map(|(_, v)| v))?;
        ctx.emit(row)?;
    }

    if display_internal_ui.is_some_and(|v| v == YesNo::Yes) {
        let row = ctx
            .new_row(PACKAGE_INFO_TABLE, &element.location)?
            .with("PackageId", package)?
            .with("DisplayInternalUI", 1i64)?;
        ctx.emit(row)?;
    }

    Ok(())
}

/// `bal:Overridable` on `Variable`
pub(super) fn parse_variable_attributes(
    ctx: &mut ParseContext<'_>,
    element: &Element,
    attributes: &[&Attribute],
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    for attribute in attributes {
        match attribute.name.as_str() {
            "Overridable" => {
                let overridable = ctx.yes_no_value(element, attribute).is_some_and(|v| v.is_yes());
                if let (true, Some(name)) = (overridable, scope.get(context::VARIABLE_NAME)) {
                    let row = ctx
                        .new_row(OVERRIDABLE_VARIABLE_TABLE, &element.location)?
                        .with("Name", name)?;
                    ctx.emit(row)?;
                }
            }
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }
    Ok(())
}
