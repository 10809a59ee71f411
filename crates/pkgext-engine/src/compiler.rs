//! Compile and bind a document with a set of extensions

use crate::binder::verify_keys;
use crate::document::{load_file, LoadError};
use crate::host::{self, CORE_NAMESPACE};
use pkgext_core::{
    catalog, ContextMap, DecompiledElement, Diagnostic, Element, Extension, ExtensionError,
    MessageCatalog, MessagePolicy, Output, ParseContext, RegistryError, SchemaRegistry,
};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Errors that abort a build
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Extension failure: {0}")]
    Extension(#[from] ExtensionError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Rows and messages from the parse pass
#[derive(Debug, Default)]
pub struct Compilation {
    pub output: Output,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Rows and policy-filtered messages from a full compile and bind
#[derive(Debug, Default)]
pub struct Build {
    pub output: Output,
    pub diagnostics: Vec<Diagnostic>,
}

impl Build {
    /// Whether any error survived the message policy
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Host tables and messages combined with a set of extensions
pub struct Compiler {
    registry: SchemaRegistry,
    catalog: MessageCatalog,
    extensions: Vec<Box<dyn Extension>>,
}

impl Compiler {
    /// Assemble the schema registry and message catalog.
    ///
    /// Fails when two parties define the same table or message id, or when two
    /// extensions claim the same namespace.
    pub fn new(extensions: Vec<Box<dyn Extension>>) -> Result<Self, RegistryError> {
        let mut namespaces = HashSet::new();
        let mut definitions = host::table_definitions();
        let mut catalog = MessageCatalog::with_host_messages()?;

        for extension in &extensions {
            if !namespaces.insert(extension.namespace()) {
                return Err(RegistryError::DuplicateNamespace(extension.namespace().to_string()));
            }
            definitions.extend(extension.table_definitions());
            catalog.register(extension.messages())?;
            debug!(extension = extension.name(), namespace = extension.namespace(), "registered extension");
        }

        Ok(Self {
            registry: SchemaRegistry::new(definitions)?,
            catalog,
            extensions,
        })
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    pub fn extensions(&self) -> impl Iterator<Item = &dyn Extension> {
        self.extensions.iter().map(|e| e.as_ref())
    }

    /// Extension owning a namespace
    pub fn extension_for(&self, namespace: &str) -> Option<&dyn Extension> {
        self.extensions()
            .find(|e| e.namespace() == namespace)
    }

    /// Parse a document into rows
    pub fn compile(&self, root: &Element) -> Result<Compilation, ExtensionError> {
        self.compile_all(std::slice::from_ref(root))
    }

    /// Parse every document of one build unit into a shared output
    pub fn compile_all(&self, roots: &[Element]) -> Result<Compilation, ExtensionError> {
        let mut compilation = Compilation::default();
        let mut ctx = ParseContext::new(&self.registry, &mut compilation.output, &mut compilation.diagnostics);

        for root in roots {
            if root.is_in(CORE_NAMESPACE) && root.name == "Wix" {
                host::walk(self, &mut ctx, None, root, &ContextMap::new())?;
            } else {
                ctx.message(
                    &catalog::ROOT_ELEMENT_NOT_RECOGNIZED,
                    &root.location,
                    &[&root.name, root.namespace.as_deref().unwrap_or_default(), CORE_NAMESPACE],
                );
            }
        }

        debug!(
            documents = roots.len(),
            rows = compilation.output.row_count(),
            diagnostics = compilation.diagnostics.len(),
            "compiled build unit"
        );
        Ok(compilation)
    }

    /// Verify keys and run every extension's validator over the collected rows
    pub fn bind(&self, output: &Output) -> Result<Vec<Diagnostic>, ExtensionError> {
        let mut diagnostics = verify_keys(output, &self.registry)?;

        for extension in &self.extensions {
            let found = extension.validate(output)?;
            debug!(extension = extension.name(), issues = found.len(), "validated");
            diagnostics.extend(found);
        }

        Ok(diagnostics)
    }

    /// Compile, then bind when the parse pass was clean, then apply the message policy
    pub fn build(&self, root: &Element, policy: &MessagePolicy) -> Result<Build, ExtensionError> {
        self.build_all(std::slice::from_ref(root), policy)
    }

    /// Build several documents as one unit. Keys and validators see the rows
    /// of every document together.
    pub fn build_all(&self, roots: &[Element], policy: &MessagePolicy) -> Result<Build, ExtensionError> {
        let Compilation { output, mut diagnostics } = self.compile_all(roots)?;

        if diagnostics.iter().any(Diagnostic::is_error) {
            info!("skipping bind after compile errors");
        } else {
            diagnostics.extend(self.bind(&output)?);
        }

        Ok(Build {
            output,
            diagnostics: policy.apply_all(diagnostics),
        })
    }

    /// Load source files and build them as one unit
    pub fn build_files<P: AsRef<Path>>(&self, paths: &[P], policy: &MessagePolicy) -> Result<Build, EngineError> {
        let roots = paths
            .iter()
            .map(|path| {
                debug!(file = %path.as_ref().display(), "loading source");
                load_file(path.as_ref())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.build_all(&roots, policy)?)
    }

    /// Recover source elements from rows
    pub fn decompile(&self, output: &Output) -> Result<Vec<DecompiledElement>, ExtensionError> {
        let mut elements = Vec::new();
        for extension in &self.extensions {
            if let Some(decompiler) = extension.decompiler() {
                elements.extend(decompiler.decompile(output)?);
            }
        }
        Ok(elements)
    }
}
