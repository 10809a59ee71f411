use super::*;
use pkgext_core::catalog;
use pkgext_core::parse::{context, generate_identifier};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Any,
    LocalSubnet,
}

impl Scope {
    fn remote_addresses(self) -> &'static str {
        match self {
            Self::Any => "*",
            Self::LocalSubnet => "LocalSubnet",
        }
    }
}

/// `FirewallException`: one `WixFirewallException` row
pub(super) fn parse_firewall_exception(
    ctx: &mut ParseContext<'_>,
    parent: &Element,
    element: &Element,
    scope_map: &ContextMap,
) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let nested_file = match parent.name.as_str() {
        "File" => scope_map.get(context::FILE_ID).cloned(),
        _ => None,
    };

    let mut id = None;
    let mut name = None;
    let mut file = None;
    let mut program = None;
    let mut port = None;
    let mut protocol = None;
    let mut scope = None;
    let mut profile = None;
    let mut description = None;
    let mut flags = Vec::new();

    for attribute in ctx.local_attributes(element) {
        match attribute.name.as_str() {
            "Id" => id = ctx.identifier_value(element, attribute),
            "Name" => name = ctx.string_value(element, attribute),
            "File" => {
                if nested_file.is_some() {
                    ctx.message(
                        &catalog::ILLEGAL_ATTRIBUTE_WHEN_NESTED,
                        &element.location,
                        &[&element.name, &attribute.name, &parent.name],
                    );
                } else {
                    file = ctx.identifier_value(element, attribute);
                }
            }
            "IgnoreFailure" => {
                if let Some(value) = ctx.yes_no_value(element, attribute) {
                    flags.push(("IgnoreFailure", value));
                }
            }
            "Port" => port = ctx.string_value(element, attribute),
            "Program" => {
                if nested_file.is_some() {
                    ctx.message(
                        &catalog::ILLEGAL_ATTRIBUTE_WHEN_NESTED,
                        &element.location,
                        &[&element.name, &attribute.name, &parent.name],
                    );
                } else {
                    program = ctx.string_value(element, attribute);
                }
            }
            "Protocol" => {
                protocol = ctx.enum_value(element, attribute, &[("tcp", PROTOCOL_TCP), ("udp", PROTOCOL_UDP)])
            }
            "Scope" => {
                scope = ctx.enum_value(
                    element,
                    attribute,
                    &[("any", Scope::Any), ("localSubnet", Scope::LocalSubnet)],
                )
            }
            "Profile" => {
                profile = ctx.enum_value(
                    element,
                    attribute,
                    &[
                        ("domain", PROFILE_DOMAIN),
                        ("private", PROFILE_PRIVATE),
                        ("public", PROFILE_PUBLIC),
                        ("all", PROFILE_ALL),
                    ],
                )
            }
            "Description" => description = ctx.string_value(element, attribute),
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }

    if name.is_none() && element.attribute("Name").is_none() {
        ctx.expected_attribute(element, "Name");
    }

    if file.is_some() && program.is_some() {
        ctx.illegal_attribute_with_other(element, "File", "Program");
    }

    let scoped = scope.is_some() || element.attribute("Scope").is_some();
    let mut remote_addresses: Vec<String> = Vec::new();
    for child in &element.children {
        if !(child.is_in(NAMESPACE) && child.name == "RemoteAddress") {
            ctx.unexpected_element(element, child);
            continue;
        }

        if scoped {
            ctx.message(&ILLEGAL_REMOTE_ADDRESS_WITH_SCOPE_ATTRIBUTE, &child.location, &[]);
            continue;
        }

        let address = child.text.as_deref().map(str::trim).unwrap_or_default();
        if address.is_empty() {
            ctx.message(&ILLEGAL_EMPTY_REMOTE_ADDRESS, &child.location, &[]);
        } else if remote_addresses.iter().any(|a| a == address) {
            let label = name.as_deref().unwrap_or(&element.name);
            ctx.message(&DUPLICATE_REMOTE_ADDRESS, &child.location, &[address, label]);
        } else {
            remote_addresses.push(address.to_string());
        }
    }

    // A program is the nested file, the File attribute, or Program
    let program = match (nested_file, file, program) {
        (Some(file), _, _) | (None, Some(file), _) => Some(format!("[#{}]", file)),
        (None, None, program) => program,
    };

    if port.is_none() && program.is_none() && !ctx.has_errors_since(mark) {
        ctx.message(&NO_EXCEPTION_SPECIFIED, &element.location, &[]);
    }

    let Some(component) = scope_map.get(context::COMPONENT_ID) else {
        return Ok(());
    };
    let Some(name) = name else {
        return Ok(());
    };
    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    let remote_addresses = match scope {
        Some(scope) => Some(scope.remote_addresses().to_string()),
        None if remote_addresses.is_empty() => None,
        None => Some(remote_addresses.join(",")),
    };

    if protocol.is_none() && port.is_some() {
        protocol = Some(PROTOCOL_TCP);
    }

    let id = id.unwrap_or_else(|| {
        generate_identifier(
            "fex",
            &[
                name.as_str(),
                remote_addresses.as_deref().unwrap_or_default(),
                port.as_deref().unwrap_or_default(),
                program.as_deref().unwrap_or_default(),
                component.as_str(),
            ],
        )
    });
    trace!(id = %id, component = %component, "firewall exception");

    let row = ctx
        .new_row(EXCEPTION_TABLE, &element.location)?
        .with("WixFirewallException", id)?
        .with("Name", name)?
        .with("RemoteAddresses", remote_addresses)?
        .with("Port", port)?
        .with("Protocol", protocol)?
        .with("Program", program)?
        .with("Attributes", EXCEPTION_ATTRIBUTES.encode(flags))?
        .with("Profile", profile.unwrap_or(PROFILE_ALL))?
        .with("Component_", component)?
        .with("Description", description)?;
    ctx.emit(row)
}
