mod common;

use common::{build, compile, ids, lines};
use pkgext_core::{catalog, Output};
use pretty_assertions::assert_eq;

fn snap_in(snap_in: &str) -> String {
    format!(
        r#"<Fragment>
  <Component Id="PsComp">
    <File Id="SnapDll" Source="snap.dll">
      {snap_in}
    </File>
    <File Id="Formats" Source="snap.format.ps1xml" />
    <File Id="Types" Source="snap.types.ps1xml" />
  </Component>
</Fragment>"#
    )
}

fn value<'a>(output: &'a Output, name: &str) -> Option<&'a str> {
    output
        .find("Registry", "Name", name)
        .and_then(|row| row.get_str("Value"))
}

#[test]
fn snap_in_registration_values() {
    let build = build(&snap_in(
        r#"<ps:SnapIn Id="MySnapIn" Description="Tools" Vendor="Contoso">
        <ps:FormatsFile FileId="Formats" />
        <ps:TypesFile FileId="Types" />
      </ps:SnapIn>"#,
    ));
    assert_eq!(ids(&build.diagnostics), Vec::<u32>::new());

    let rows = build.output.rows("Registry");
    assert_eq!(rows.len(), 9);
    for row in rows {
        assert_eq!(
            row.get_str("Key"),
            Some(r"SOFTWARE\Microsoft\PowerShell\1\PowerShellSnapIns\MySnapIn")
        );
        assert_eq!(row.get_number("Root"), Some(2));
        assert_eq!(row.get_str("Component_"), Some("PsComp"));
        assert!(row.get_str("Registry").unwrap().starts_with("reg"));
    }

    let output = &build.output;
    assert_eq!(value(output, "ApplicationBase"), Some("[$PsComp]"));
    assert_eq!(value(output, "AssemblyName"), Some("!(bind.assemblyFullName.SnapDll)"));
    assert_eq!(value(output, "ModuleName"), Some("[#SnapDll]"));
    assert_eq!(value(output, "PowerShellVersion"), Some("1.0"));
    assert_eq!(value(output, "Version"), Some("!(bind.assemblyVersion.SnapDll)"));
    assert_eq!(value(output, "Description"), Some("Tools"));
    assert_eq!(value(output, "Vendor"), Some("Contoso"));
    assert_eq!(value(output, "Formats"), Some("[~][#Formats]"));
    assert_eq!(value(output, "Types"), Some("[~][#Types]"));
    assert_eq!(value(output, "CustomPSSnapInType"), None);
}

#[test]
fn later_engines_use_their_own_key() {
    let compilation = compile(&snap_in(
        r#"<ps:SnapIn Id="Modern" RequiredPowerShellVersion="3.0" Version="2.1" CustomSnapInType="Contoso.SnapIn" />"#,
    ));
    assert_eq!(ids(&compilation.diagnostics), Vec::<u32>::new());

    let output = &compilation.output;
    assert_eq!(
        output.rows("Registry")[0].get_str("Key"),
        Some(r"SOFTWARE\Microsoft\PowerShell\3\PowerShellSnapIns\Modern")
    );
    assert_eq!(value(output, "PowerShellVersion"), Some("3.0"));
    assert_eq!(value(output, "Version"), Some("2.1"));
    assert_eq!(value(output, "CustomPSSnapInType"), Some("Contoso.SnapIn"));
}

#[test]
fn snap_in_requires_id_and_valid_versions() {
    let compilation = compile(&snap_in(
        r#"<ps:SnapIn RequiredPowerShellVersion="latest">
        <ps:FormatsFile />
      </ps:SnapIn>"#,
    ));

    assert_eq!(
        ids(&compilation.diagnostics),
        vec![
            catalog::ILLEGAL_VERSION_VALUE.id,
            catalog::EXPECTED_ATTRIBUTE.id,
            catalog::EXPECTED_ATTRIBUTE.id
        ]
    );
    assert!(compilation.output.rows("Registry").is_empty());
}

#[test]
fn snap_in_must_be_under_file() {
    let compilation = compile(
        r#"<Fragment>
  <Component Id="PsComp">
    <ps:SnapIn Id="Stray" />
  </Component>
</Fragment>"#,
    );

    assert_eq!(ids(&compilation.diagnostics), vec![catalog::UNEXPECTED_ELEMENT.id]);
    assert_eq!(compilation.diagnostics[0].location.as_ref().and_then(|l| l.line), Some(9));
}

#[test]
fn formats_file_must_name_a_file_in_the_build() {
    let build = build(&snap_in(
        r#"<ps:SnapIn Id="MySnap">
        <ps:FormatsFile FileId="DoesNotExist" />
      </ps:SnapIn>"#,
    ));

    assert_eq!(ids(&build.diagnostics), vec![catalog::UNRESOLVED_SIMPLE_REFERENCE.id]);
    assert_eq!(lines(&build.diagnostics), vec![11]);
    assert!(build.diagnostics[0].message.contains("'DoesNotExist'"));
}
