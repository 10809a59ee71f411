mod common;

use common::{build, compile, ids};
use pkgext_core::catalog;
use pkgext_extensions::http::{
    ACE_TABLE, HANDLE_EXISTING_FAIL, HANDLE_EXISTING_REPLACE, NO_SECURITY_SPECIFIED, RESERVATION_TABLE, RIGHTS_ALL,
    RIGHTS_REGISTER, URL_MISSING_TRAILING_SLASH,
};
use pretty_assertions::assert_eq;

fn service(body: &str) -> String {
    format!(
        r#"<Fragment>
  <Component Id="SvcComp">
    <ServiceInstall Id="Svc" Name="MyService">
      {body}
    </ServiceInstall>
  </Component>
</Fragment>"#
    )
}

#[test]
fn reservation_with_aces() {
    let build = build(&service(
        r#"<http:UrlReservation Id="Api" Url="http://+:8080/api/" HandleExisting="fail">
        <http:UrlAce SecurityPrincipal="NT SERVICE\MyService" />
        <http:UrlAce Id="Users" SecurityPrincipal="BUILTIN\Users" Rights="register" />
      </http:UrlReservation>"#,
    ));
    assert_eq!(ids(&build.diagnostics), Vec::<u32>::new());

    let reservation = &build.output.rows(RESERVATION_TABLE)[0];
    assert_eq!(reservation.get_str("WixHttpUrlReservation"), Some("Api"));
    assert_eq!(reservation.get_number("HandleExisting"), Some(HANDLE_EXISTING_FAIL));
    assert_eq!(reservation.get_str("Component_"), Some("SvcComp"));
    assert!(reservation.get("Sddl").unwrap().is_null());

    let aces = build.output.rows(ACE_TABLE);
    assert_eq!(aces.len(), 2);
    assert!(aces[0].get_str("WixHttpUrlAce").unwrap().starts_with("ace"));
    assert_eq!(aces[0].get_number("Rights"), Some(RIGHTS_ALL));
    assert_eq!(aces[0].get_str("WixHttpUrlReservation_"), Some("Api"));
    assert_eq!(aces[1].get_str("WixHttpUrlAce"), Some("Users"));
    assert_eq!(aces[1].get_number("Rights"), Some(RIGHTS_REGISTER));
    assert_eq!(aces[1].location.line, Some(12));
}

#[test]
fn sddl_reservation_under_component() {
    let build = build(
        r#"<Fragment>
  <Component Id="Web">
    <http:UrlReservation Url="http://+:80/" Sddl="D:(A;;GX;;;WD)" />
  </Component>
</Fragment>"#,
    );
    assert_eq!(ids(&build.diagnostics), Vec::<u32>::new());

    let reservation = &build.output.rows(RESERVATION_TABLE)[0];
    assert!(reservation.get_str("WixHttpUrlReservation").unwrap().starts_with("url"));
    assert_eq!(reservation.get_number("HandleExisting"), Some(HANDLE_EXISTING_REPLACE));
    assert_eq!(reservation.get_str("Sddl"), Some("D:(A;;GX;;;WD)"));
}

#[test]
fn sddl_and_aces_are_exclusive() {
    let compilation = compile(&service(
        r#"<http:UrlReservation Url="http://+:80/" Sddl="D:(A;;GX;;;WD)">
        <http:UrlAce SecurityPrincipal="Everyone" />
      </http:UrlReservation>"#,
    ));

    assert_eq!(
        ids(&compilation.diagnostics),
        vec![catalog::ILLEGAL_ELEMENT_WITH_ATTRIBUTE.id]
    );
    assert!(compilation.output.rows(RESERVATION_TABLE).is_empty());
}

#[test]
fn reservation_needs_security() {
    let compilation = compile(&service(r#"<http:UrlReservation Url="http://+:80/" />"#));
    assert_eq!(ids(&compilation.diagnostics), vec![NO_SECURITY_SPECIFIED.id]);
    assert!(compilation.diagnostics[0].message.contains("http://+:80/"));
}

#[test]
fn missing_trailing_slash_warns() {
    let build = build(&service(
        r#"<http:UrlReservation Url="http://+:80/api" Sddl="D:(A;;GX;;;WD)" />"#,
    ));

    assert_eq!(ids(&build.diagnostics), vec![URL_MISSING_TRAILING_SLASH.id]);
    assert!(!build.has_errors());
    assert_eq!(build.output.rows(RESERVATION_TABLE).len(), 1);
}

#[test]
fn ace_requires_principal_and_known_rights() {
    let compilation = compile(&service(
        r#"<http:UrlReservation Url="http://+:80/">
        <http:UrlAce Rights="everything" />
      </http:UrlReservation>"#,
    ));

    assert_eq!(
        ids(&compilation.diagnostics),
        vec![catalog::ILLEGAL_ATTRIBUTE_VALUE.id, catalog::EXPECTED_ATTRIBUTE.id]
    );
    assert!(compilation.output.rows(ACE_TABLE).is_empty());
}

#[test]
fn reservation_outside_component_is_unexpected() {
    let compilation = compile(r#"<Fragment><http:UrlReservation Url="http://+:80/" /></Fragment>"#);
    assert_eq!(ids(&compilation.diagnostics), vec![catalog::UNEXPECTED_ELEMENT.id]);
}
