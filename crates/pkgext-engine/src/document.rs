//! XML loading into the element model

use pkgext_core::{Attribute, Element, Location};
use std::path::Path;

/// Errors loading a source document
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("XML error in {file}: {message}")]
    Xml { file: String, message: String },
}

/// Load a document from disk
pub fn load_file(path: &Path) -> Result<Element, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    load_str(&text, &path.display().to_string())
}

/// Load a document from text. `file` is only used for source locations.
pub fn load_str(text: &str, file: &str) -> Result<Element, LoadError> {
    let document = roxmltree::Document::parse(text).map_err(|e| LoadError::Xml {
        file: file.to_string(),
        message: e.to_string(),
    })?;

    Ok(convert(&document, document.root_element(), file))
}

fn convert(document: &roxmltree::Document<'_>, node: roxmltree::Node<'_, '_>, file: &str) -> Element {
    let position = document.text_pos_at(node.range().start);
    let location = Location::with_position(file, position.row as usize, position.col as usize);

    let attributes = node
        .attributes()
        .map(|a| Attribute {
            namespace: a.namespace().map(str::to_string),
            name: a.name().to_string(),
            value: a.value().to_string(),
        })
        .collect();

    let children = node
        .children()
        .filter(|child| child.is_element())
        .map(|child| convert(document, child, file))
        .collect();

    let text: String = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();
    let text = text.trim();

    Element {
        namespace: node.tag_name().namespace().map(str::to_string),
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        text: (!text.is_empty()).then(|| text.to_string()),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"<?xml version="1.0"?>
<Wix xmlns="http://schemas.microsoft.com/wix/2006/wi"
     xmlns:difx="http://schemas.microsoft.com/wix/DifxAppExtension">
  <Fragment>
    <Component Id="DriverComp" difx:Custom="1">
      <difx:Driver ForceInstall="yes" />
    </Component>
    <Condition>  Installed  </Condition>
  </Fragment>
</Wix>
"#;

    #[test]
    fn converts_namespaces_attributes_and_lines() {
        let root = load_str(SOURCE, "product.wxs").unwrap();
        assert_eq!(root.name, "Wix");
        assert!(root.is_in("http://schemas.microsoft.com/wix/2006/wi"));

        let fragment = &root.children[0];
        let component = &fragment.children[0];
        assert_eq!(component.attribute("Id"), Some("DriverComp"));
        assert_eq!(
            component.qualified_attribute("http://schemas.microsoft.com/wix/DifxAppExtension", "Custom"),
            Some("1")
        );
        assert_eq!(component.location.line, Some(5));

        let driver = &component.children[0];
        assert!(driver.is_in("http://schemas.microsoft.com/wix/DifxAppExtension"));
        assert_eq!(driver.location.file, "product.wxs");
        assert_eq!(driver.location.line, Some(6));
    }

    #[test]
    fn trims_inner_text() {
        let root = load_str(SOURCE, "product.wxs").unwrap();
        let condition = &root.children[0].children[1];
        assert_eq!(condition.text.as_deref(), Some("Installed"));
        assert_eq!(root.children[0].text, None);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = load_str("<Wix><Fragment></Wix>", "bad.wxs").unwrap_err();
        assert!(matches!(err, LoadError::Xml { .. }));
        assert!(err.to_string().contains("bad.wxs"));
    }
}
