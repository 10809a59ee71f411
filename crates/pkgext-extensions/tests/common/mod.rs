#![allow(dead_code)]

use pkgext_core::{Diagnostic, Element, MessagePolicy};
use pkgext_engine::{load_str, Build, Compilation, Compiler};

pub fn document(body: &str) -> Element {
    let text = format!(
        r#"<Wix xmlns="http://schemas.microsoft.com/wix/2006/wi"
     xmlns:bal="http://schemas.microsoft.com/wix/BalExtension"
     xmlns:difx="http://schemas.microsoft.com/wix/DifxAppExtension"
     xmlns:fw="http://schemas.microsoft.com/wix/FirewallExtension"
     xmlns:http="http://schemas.microsoft.com/wix/HttpExtension"
     xmlns:ps="http://schemas.microsoft.com/wix/PSExtension">
{body}
</Wix>"#
    );
    load_str(&text, "test.wxs").unwrap()
}

pub fn compiler() -> Compiler {
    Compiler::new(pkgext_extensions::all()).unwrap()
}

pub fn compile(body: &str) -> Compilation {
    compiler().compile(&document(body)).unwrap()
}

pub fn build(body: &str) -> Build {
    compiler().build(&document(body), &MessagePolicy::default()).unwrap()
}

/// Build several documents as one unit
pub fn build_all(bodies: &[&str]) -> Build {
    let roots: Vec<Element> = bodies.iter().map(|body| document(body)).collect();
    compiler().build_all(&roots, &MessagePolicy::default()).unwrap()
}

pub fn ids(diagnostics: &[Diagnostic]) -> Vec<u32> {
    diagnostics.iter().map(|d| d.id).collect()
}

pub fn lines(diagnostics: &[Diagnostic]) -> Vec<usize> {
    diagnostics
        .iter()
        .filter_map(|d| d.location.as_ref().and_then(|l| l.line))
        .collect()
}
