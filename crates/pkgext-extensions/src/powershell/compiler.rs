use super::HKLM;
use pkgext_core::parse::{context, generate_identifier};
use pkgext_core::{ContextMap, Element, ExtensionError, Location, ParseContext};
use tracing::trace;

const DEFAULT_POWERSHELL_VERSION: &str = "1.0";

/// Engine key a snap-in registers under. Engines 1 and 2 share key `1`,
/// later engines use `3`.
fn engine_key(required_version: &str) -> &'static str {
    let major = required_version
        .split('.')
        .next()
        .and_then(|part| part.parse::<u32>().ok())
        .unwrap_or(1);

    if major < 3 {
        "1"
    } else {
        "3"
    }
}

/// `SnapIn`: registry values describing the snap-in assembly in the parent file
pub(super) fn parse_snap_in(
    ctx: &mut ParseContext<'_>,
    element: &Element,
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let mut id = None;
    let mut custom_type = None;
    let mut description = None;
    let mut required_version = None;
    let mut vendor = None;
    let mut version = None;

    for attribute in ctx.local_attributes(element) {
        match attribute.name.as_str() {
            "Id" => id = ctx.identifier_value(element, attribute),
            "CustomSnapInType" => custom_type = ctx.string_value(element, attribute),
            "Description" => description = ctx.string_value(element, attribute),
            "RequiredPowerShellVersion" => required_version = ctx.version_value(element, attribute),
            "Vendor" => vendor = ctx.string_value(element, attribute),
            "Version" => version = ctx.version_value(element, attribute),
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }

    if element.attribute("Id").is_none() {
        ctx.expected_attribute(element, "Id");
    }

    let mut extra_files = Vec::new();
    for child in &element.children {
        match child.name.as_str() {
            "FormatsFile" | "TypesFile" if child.is_in(super::NAMESPACE) => {
                if let Some(file_id) = parse_file_reference(ctx, child) {
                    let value_name = child.name.trim_end_matches("File");
                    extra_files.push((value_name, file_id, child.location.clone()));
                }
            }
            _ => ctx.unexpected_element(element, child),
        }
    }

    let (Some(component), Some(file)) = (scope.get(context::COMPONENT_ID), scope.get(context::FILE_ID)) else {
        return Ok(());
    };
    let Some(id) = id else {
        return Ok(());
    };
    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    let required_version = required_version.unwrap_or_else(|| DEFAULT_POWERSHELL_VERSION.to_string());
    let key = format!(
        "SOFTWARE\\Microsoft\\PowerShell\\{}\\PowerShellSnapIns\\{}",
        engine_key(&required_version),
        id
    );
    trace!(snap_in = %id, key = %key, "snap-in registration");

    let mut values = vec![
        ("ApplicationBase", format!("[${}]", component)),
        ("AssemblyName", format!("!(bind.assemblyFullName.{})", file)),
        ("ModuleName", format!("[#{}]", file)),
        ("PowerShellVersion", required_version),
        (
            "Version",
            version.unwrap_or_else(|| format!("!(bind.assemblyVersion.{})", file)),
        ),
    ];
    values.extend(description.map(|d| ("Description", d)));
    values.extend(vendor.map(|v| ("Vendor", v)));
    values.extend(custom_type.map(|t| ("CustomPSSnapInType", t)));

    for (name, value) in values {
        write_value(ctx, &element.location, &key, name, &value, component, name)?;
    }

    for (name, file_id, location) in extra_files {
        ctx.reference("File", &file_id, &location)?;
        let value = format!("[~][#{}]", file_id);
        write_value(ctx, &location, &key, name, &value, component, &file_id)?;
    }

    Ok(())
}

/// `FormatsFile` / `TypesFile`: the referenced file id
fn parse_file_reference(ctx: &mut ParseContext<'_>, element: &Element) -> Option<String> {
    let mut file_id = None;

    for attribute in ctx.local_attributes(element) {
        match attribute.name.as_str() {
            "FileId" => file_id = ctx.identifier_value(element, attribute),
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }
    ctx.no_children(element);

    if element.attribute("FileId").is_none() {
        ctx.expected_attribute(element, "FileId");
    }
    file_id
}

/// Emit one HKLM registry value under the snap-in key
fn write_value(
    ctx: &mut ParseContext<'_>,
    location: &Location,
    key: &str,
    name: &str,
    value: &str,
    component: &str,
    discriminator: &str,
) -> Result<(), ExtensionError> {
    let id = generate_identifier("reg", &[key, name, discriminator]);
    let row = ctx
        .new_row("Registry", location)?
        .with("Registry", id)?
        .with("Root", HKLM)?
        .with("Key", key)?
        .with("Name", name)?
        .with("Value", value)?
        .with("Component_", component)?;
    ctx.emit(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_keys() {
        assert_eq!(engine_key("1.0"), "1");
        assert_eq!(engine_key("2"), "1");
        assert_eq!(engine_key("3.0"), "3");
        assert_eq!(engine_key("5.1"), "3");
    }
}
