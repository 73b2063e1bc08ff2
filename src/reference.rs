use std::{fmt, path::Path};

use testgen_gosyntax::{ast::Expr, parse_file, FileSet};

use crate::{format::SourceFormatter, Error};

/// An interface declaration named by import path and identifier.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct InterfaceRef {
    pub import_path: String,
    pub identifier:  String,
}

impl InterfaceRef {
    pub fn new(import_path: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            identifier:  identifier.into(),
        }
    }

    /// Parses `path/to/pkg.Identifier`, or infers the import path of a bare
    /// `pkg.Identifier` through `formatter`.
    pub fn parse(reference: &str, formatter: &dyn SourceFormatter) -> Result<Self, Error> {
        match Self::parse_qualified(reference)? {
            | Some(iref) => Ok(iref),
            | None => Self::infer(reference, formatter),
        }
    }

    /// `None` when `reference` has no path separator and needs inference.
    pub fn parse_qualified(reference: &str) -> Result<Option<Self>, Error> {
        let malformed = |reason: &'static str| Error::MalformedReference {
            reference: reference.to_string(),
            reason,
        };

        if reference.split_whitespace().count() != 1 {
            return Err(malformed("expected a single word"));
        }

        let Some(slash) = reference.rfind('/') else {
            return Ok(None);
        };

        if reference.ends_with('/') {
            return Err(malformed("interface name cannot end with a '/' character"));
        }

        if reference.ends_with('.') {
            return Err(malformed("interface name cannot end with a '.' character"));
        }

        if reference[slash..].matches('.').count() != 1 {
            return Err(malformed("expected exactly one '.' after the last '/'"));
        }

        match reference.rsplit_once('.') {
            | Some((path, id)) => Ok(Some(Self::new(path, id))),
            | None => Err(malformed("missing identifier")),
        }
    }

    /// Declares a variable of type `reference` in a scratch package and lets
    /// the formatter add the import that makes it resolve.
    pub fn infer(reference: &str, formatter: &dyn SourceFormatter) -> Result<Self, Error> {
        let src = format!("package hack\n\nvar i {reference}\n");
        let processed = formatter
            .process(&src)
            .map_err(|source| Error::UnresolvedImport {
                reference: reference.to_string(),
                source,
            })?;
        let file = parse_file(&mut FileSet::new(), Path::new("hack.go"), &processed)?;
        let unrecognized = || Error::UnrecognizedInterface {
            reference: reference.to_string(),
        };
        let import = file.imports.first().ok_or_else(unrecognized)?;
        let identifier = file
            .value_specs()
            .find_map(|spec| match &spec.ty {
                | Some(Expr::Selector { sel, .. }) => Some(sel.name.clone()),
                | _ => None,
            })
            .ok_or_else(unrecognized)?;

        tracing::debug!(reference, import_path = %import.path, "inferred import path");

        Ok(Self::new(import.path.clone(), identifier))
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.import_path, self.identifier)
    }
}
