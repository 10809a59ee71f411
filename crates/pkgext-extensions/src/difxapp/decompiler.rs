use super::{DRIVER_FLAGS, DRIVER_TABLE, NAMESPACE};
use pkgext_core::{DecompiledElement, Decompiler, Element, ExtensionError, Output};
use tracing::warn;

/// Turns `MsiDriverPackages` rows back into `Driver` elements
#[derive(Debug, Default)]
pub(super) struct DriverDecompiler;

impl Decompiler for DriverDecompiler {
    fn decompile(&self, output: &Output) -> Result<Vec<DecompiledElement>, ExtensionError> {
        let mut elements = Vec::new();

        for row in output.rows(DRIVER_TABLE) {
            let component = row.get_str("Component").ok_or_else(|| ExtensionError::MissingValue {
                table: DRIVER_TABLE.to_string(),
                column: "Component".to_string(),
            })?;
            let flags = row.get_number("Flags").unwrap_or_default();
            let bits = u32::try_from(flags).map_err(|_| ExtensionError::ValueOutOfRange {
                table: DRIVER_TABLE.to_string(),
                column: "Flags".to_string(),
                value: flags,
            })?;

            let unknown = DRIVER_FLAGS.unknown_bits(bits);
            if unknown != 0 {
                warn!(component, unknown, "ignoring unknown driver flag bits");
            }

            let mut driver = Element::new(NAMESPACE, "Driver").with_location(row.location.clone());
            for (attribute, value) in DRIVER_FLAGS.decode(bits) {
                driver = driver.with_attribute(attribute, value.as_str());
            }
            if let Some(sequence) = row.get_number("Sequence") {
                driver = driver.with_attribute("Sequence", sequence.to_string());
            }

            elements.push(DecompiledElement {
                parent_table: "Component".to_string(),
                parent_key: component.to_string(),
                element: driver,
            });
        }

        Ok(elements)
    }
}
