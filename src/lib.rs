//! Generates stub implementations of Go interfaces.
//!
//! A stub is a struct with one `<Method>Func` function field per interface
//! method, and forwarding methods that call the field when it is set and
//! return zero values otherwise.

pub mod config;
pub mod extract;
pub mod format;
pub mod loader;
pub mod qualify;
pub mod reference;
pub mod render;

mod error;

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

pub use error::Error;

use self::{
    config::Config,
    extract::{Extractor, Interface, Method},
    format::SourceFormatter,
    loader::PackageResolver,
    render::StubSpec,
};

#[derive(Debug)]
pub struct Generator<F> {
    config:    Config,
    formatter: F,
}

/// Formatted stub source and, when a destination was given, where it belongs.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Generated {
    pub source: String,
    pub path:   Option<PathBuf>,
}

impl<F: SourceFormatter> Generator<F> {
    pub fn new(config: Config, formatter: F) -> Self {
        Self { config, formatter }
    }

    /// Resolves `reference` to its flattened method list.
    pub fn interface(&self, reference: &str) -> Result<Interface, Error> {
        Extractor::new(PackageResolver::new(&self.config), &self.formatter).interface(reference)
    }

    /// Renders a stub named `recv` for the interface at `reference`.
    ///
    /// `out` is taken relative to the configured output root; the stub then
    /// belongs to the package named after its parent directory. Without `out`
    /// the stub is generated in the interface's own package.
    pub fn generate(&self, recv: &str, reference: &str, out: Option<&Path>) -> Result<Generated, Error> {
        let iface = self.interface(reference)?;
        let path = out.map(|out| self.config.output_root().join(out));
        let package = path
            .as_deref()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| iface.package.clone());

        tracing::debug!(
            recv,
            %package,
            methods = iface.funcs.len(),
            "generating stub for {}",
            iface.reference
        );

        let spec = StubSpec {
            recv: recv.to_string(),
            package,
            interface: iface.qualified_name(),
            methods: iface
                .funcs
                .into_iter()
                .map(|func| Method {
                    recv: recv.to_string(),
                    func,
                })
                .collect(),
        };
        let source = render::render(&spec, &self.formatter)?;

        Ok(Generated { source, path })
    }
}

impl Generated {
    /// Writes the source to its path, creating missing directories. Returns
    /// `false` when there is no path to write to.
    pub fn save(&self) -> Result<bool, Error> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        let write_failure = |source: io::Error| Error::WriteFailure {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_failure)?;
        }

        fs::write(path, &self.source).map_err(write_failure)?;

        Ok(true)
    }
}
