use super::*;
use tracing::debug;

/// At most one BAFunctions payload, and it must ship in the UX container.
///
/// Every extra row is reported, then every misplaced payload.
pub(super) fn check_ba_functions(output: &Output) -> Result<Vec<Diagnostic>, ExtensionError> {
    let rows = output.rows(BA_FUNCTIONS_TABLE);
    let mut diagnostics: Vec<Diagnostic> = rows
        .iter()
        .skip(1)
        .map(|row| MULTIPLE_BA_FUNCTIONS.at(&row.location, &[]))
        .collect();

    for row in rows {
        let payload_id = row.get_str("PayloadId").unwrap_or_default();
        let payload = output
            .find("Payload", "Payload", payload_id)
            .ok_or_else(|| ExtensionError::MissingRow {
                table: "Payload".to_string(),
                key: payload_id.to_string(),
            })?;

        if payload.get_str("Container_") != Some(UX_CONTAINER) {
            diagnostics.push(BA_FUNCTIONS_PAYLOAD_REQUIRED_IN_UX_CONTAINER.at(&payload.location, &[]));
        }
    }

    Ok(diagnostics)
}

/// The managed host needs a prerequisite package, and at most one license
/// among all of them. Each rule stops at its first violation.
pub(super) fn check_prereqs(output: &Output) -> Vec<Diagnostic> {
    let Some(ba) = output
        .rows("WixBootstrapperApplication")
        .iter()
        .find(|row| row.get_str("Id").is_some_and(|id| id.starts_with(MANAGED_HOST_PREFIX)))
    else {
        return Vec::new();
    };

    let prereqs = output.rows(PREREQ_TABLE);
    if prereqs.is_empty() {
        debug!("managed host without prerequisite packages");
        return vec![MISSING_PREREQ.at(&ba.location, &[])];
    }

    let mut license_seen = false;
    for row in prereqs {
        for column in ["LicenseFile", "LicenseUrl"] {
            if row.get(column).is_some_and(|v| !v.is_null()) {
                if license_seen {
                    return vec![MULTIPLE_PREREQ_LICENSES.at(&row.location, &[])];
                }
                license_seen = true;
            }
        }
    }

    Vec::new()
}
