use super::{DRIVER_FLAGS, DRIVER_TABLE};
use pkgext_core::parse::context;
use pkgext_core::{ContextMap, Element, ExtensionError, ParseContext};
use tracing::trace;

/// `Driver`: one `MsiDriverPackages` row keyed by the enclosing component
pub(super) fn parse_driver(
    ctx: &mut ParseContext<'_>,
    element: &Element,
    scope: &ContextMap,
) -> Result<(), ExtensionError> {
    let mark = ctx.error_mark();
    let mut flags = Vec::new();
    let mut sequence = None;

    for attribute in ctx.local_attributes(element) {
        match attribute.name.as_str() {
            name if DRIVER_FLAGS.flag(name).is_some() => {
                if let Some(value) = ctx.yes_no_value(element, attribute) {
                    flags.push((name, value));
                }
            }
            "Sequence" => sequence = ctx.integer_value(element, attribute, 0, i64::from(i32::MAX)),
            _ => ctx.unexpected_attribute(element, &attribute.name),
        }
    }
    ctx.no_children(element);

    let Some(component) = scope.get(context::COMPONENT_ID) else {
        return Ok(());
    };
    if ctx.has_errors_since(mark) {
        return Ok(());
    }

    let bits = DRIVER_FLAGS.encode(flags);
    trace!(component = %component, flags = bits, "driver package");

    let row = ctx
        .new_row(DRIVER_TABLE, &element.location)?
        .with("Component", component)?
        .with("Flags", bits)?
        .with("Sequence", sequence)?;
    ctx.emit(row)
}
