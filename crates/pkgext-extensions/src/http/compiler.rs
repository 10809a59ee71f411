use super::*;
use pkgext_core::catalog;
use pkgext_core::parse::{context, generate_identifier};
use tracing::trace;

/// A parsed `UrlAce`, written once the reservation id is known
struct Ace {
    id: Option<String>,
    principal: String,
    rights: i64,
    location: pkgext_core::Location,
}

/// `UrlReservation` and its `UrlAce` children
pub(super) fn parse_url_reservation(
    ctx: &mut ParseContext<'_>,
    element: &Element,
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let mut id = None;
    let mut handle_existing = None;
    let mut sddl = None;
    let mut url = None;

    for attribute in ctx.local_attributes(element) {
        match attribute.name.as_str() {
            "Id" => id = ctx.identifier_value(element, attribute),
            "HandleExisting" => {
                handle_existing = ctx.enum_value(
                    element,
                    attribute,
                    &[
                        ("replace", HANDLE_EXISTING_REPLACE),
                        ("ignore", HANDLE_EXISTING_IGNORE),
                        ("fail", HANDLE_EXISTING_FAIL),
                    ],
                )
            }
            "Sddl" => sddl = ctx.string_value(element, attribute),
            "Url" => url = ctx.string_value(element, attribute),
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }

    if element.attribute("Url").is_none() {
        ctx.expected_attribute(element, "Url");
    }

    let mut aces = Vec::new();
    for child in &element.children {
        if !(child.is_in(NAMESPACE) && child.name == "UrlAce") {
            ctx.unexpected_element(element, child);
            continue;
        }

        if element.attribute("Sddl").is_some() {
            ctx.message(
                &catalog::ILLEGAL_ELEMENT_WITH_ATTRIBUTE,
                &child.location,
                &[&child.name, &element.name, "Sddl"],
            );
            continue;
        }

        if let Some(ace) = parse_url_ace(ctx, child) {
            aces.push(ace);
        }
    }

    if let Some(url) = &url {
        if !url.ends_with('/') {
            ctx.message(&URL_MISSING_TRAILING_SLASH, &element.location, &[url.as_str()]);
        }
        if sddl.is_none() && aces.is_empty() && !ctx.has_errors_since(mark) {
            ctx.message(&NO_SECURITY_SPECIFIED, &element.location, &[url.as_str()]);
        }
    }

    let Some(component) = scope.get(context::COMPONENT_ID) else {
        return Ok(());
    };
    let Some(url) = url else {
        return Ok(());
    };
    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    let id = id.unwrap_or_else(|| generate_identifier("url", &[component.as_str(), url.as_str()]));
    trace!(id = %id, url = %url, aces = aces.len(), "url reservation");

    let row = ctx
        .new_row(RESERVATION_TABLE, &element.location)?
        .with("WixHttpUrlReservation", id.as_str())?
        .with("HandleExisting", handle_existing.unwrap_or(HANDLE_EXISTING_REPLACE))?
        .with("Sddl", sddl)?
        .with("Url", url)?
        .with("Component_", component)?;
    ctx.emit(row)?;

    for ace in aces {
        let ace_id = ace.id.unwrap_or_else(|| {
            generate_identifier("ace", &[id.as_str(), ace.principal.as_str(), &ace.rights.to_string()])
        });
        let row = ctx
            .new_row(ACE_TABLE, &ace.location)?
            .with("WixHttpUrlAce", ace_id)?
            .with("WixHttpUrlReservation_", id.as_str())?
            .with("SecurityPrincipal", ace.principal)?
            .with("Rights", ace.rights)?;
        ctx.emit(row)?;
    }

    Ok(())
}

fn parse_url_ace(ctx: &mut ParseContext<'_>, element: &Element) -> Option<Ace> {
    let mark = ctx.error_mark();
    let mut id = None;
    let mut principal = None;
    let mut rights = None;

    for attribute in ctx.local_attributes(element) {
        match attribute.name.as_str() {
            "Id" => id = ctx.identifier_value(element, attribute),
            "SecurityPrincipal" => principal = ctx.string_value(element, attribute),
            "Rights" => {
                rights = ctx.enum_value(
                    element,
                    attribute,
                    &[("all", RIGHTS_ALL), ("delegate", RIGHTS_DELEGATE), ("register", RIGHTS_REGISTER)],
                )
            }
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }
    ctx.no_children(element);

    if element.attribute("SecurityPrincipal").is_none() {
        ctx.expected_attribute(element, "SecurityPrincipal");
    }
    if ctx.has_errors_since(mark) {
        return None;
    }

    Some(Ace {
        id,
        principal: principal?,
        rights: rights.unwrap_or(RIGHTS_ALL),
        location: element.location.clone(),
    })
}
