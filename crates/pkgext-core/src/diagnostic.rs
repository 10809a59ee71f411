//! Messages and diagnostic reporting
//!
//! IMPORTANT: Message ids are versioned and stable.
//! NEVER renumber or reuse an id for a different meaning.
//! Add new messages with new ids only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Warning - reported but the build continues
    Warning,

    /// Error - the build fails once the pass completes
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Source file path
    pub file: String,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,

    /// Optional column number (1-indexed)
    pub column: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }

    /// Create a location with file and line number
    pub fn with_line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: None,
        }
    }

    /// Create a location with file, line, and column
    pub fn with_position(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        Ok(())
    }
}

/// A catalog entry: stable id, severity and a format string with `{0}`, `{1}`... placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageDef {
    /// Stable numeric id
    pub id: u32,

    /// Stable symbolic name
    pub name: &'static str,

    /// Default severity
    pub severity: Severity,

    /// English format string
    pub format: &'static str,
}

impl MessageDef {
    pub const fn error(id: u32, name: &'static str, format: &'static str) -> Self {
        Self {
            id,
            name,
            severity: Severity::Error,
            format,
        }
    }

    pub const fn warning(id: u32, name: &'static str, format: &'static str) -> Self {
        Self {
            id,
            name,
            severity: Severity::Warning,
            format,
        }
    }

    /// Substitute positional arguments into the format string.
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn render(&self, args: &[&str]) -> String {
        let mut out = String::with_capacity(self.format.len() + 16);
        let mut rest = self.format;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let substituted = after.find('}').and_then(|close| {
                let index: usize = after[..close].parse().ok()?;
                let arg = args.get(index)?;
                Some((arg, close))
            });

            match substituted {
                Some((arg, close)) => {
                    out.push_str(arg);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// Build a diagnostic for this message at a source location
    pub fn at(&self, location: &Location, args: &[&str]) -> Diagnostic {
        Diagnostic::new(self, args).with_location(location.clone())
    }
}

/// A reported message with structured metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable numeric id
    pub id: u32,

    /// Stable symbolic name
    pub name: String,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a diagnostic from a catalog entry and its arguments
    pub fn new(def: &MessageDef, args: &[&str]) -> Self {
        Self {
            id: def.id,
            name: def.name.to_string(),
            severity: def.severity,
            message: def.render(args),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Whether this diagnostic fails the build
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{} PKG{:04}: {}", self.severity, self.id, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: MessageDef = MessageDef::error(
        42,
        "SampleMessage",
        "The {0}/@{1} attribute's value, '{2}', is not legal.",
    );

    #[test]
    fn render_positional_arguments() {
        assert_eq!(
            SAMPLE.render(&["Driver", "Sequence", "abc"]),
            "The Driver/@Sequence attribute's value, 'abc', is not legal."
        );
    }

    #[test]
    fn render_leaves_missing_placeholders() {
        assert_eq!(
            SAMPLE.render(&["Driver"]),
            "The Driver/@{1} attribute's value, '{2}', is not legal."
        );
    }

    #[test]
    fn render_ignores_non_numeric_braces() {
        let def = MessageDef::warning(1, "Braces", "key {name} and {0}");
        assert_eq!(def.render(&["x"]), "key {name} and x");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = SAMPLE.at(&Location::with_line("bundle.wxs", 12), &["a", "b", "c"]);

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("SampleMessage"));
        assert!(json.contains("\"error\""));
        assert!(json.contains("bundle.wxs"));
    }

    #[test]
    fn display_includes_location_and_id() {
        let diag = SAMPLE.at(&Location::with_position("a.wxs", 3, 7), &["x", "y", "z"]);
        assert_eq!(
            diag.to_string(),
            "a.wxs:3:7: error PKG0042: The x/@y attribute's value, 'z', is not legal."
        );
    }
}
