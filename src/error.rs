use std::{io, path::PathBuf};

use crate::format::FormatError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("couldn't parse interface `{reference}`: {reason}")]
    MalformedReference {
        reference: String,
        reason:    &'static str,
    },

    #[error("couldn't resolve an import for interface `{reference}`")]
    UnresolvedImport {
        reference: String,
        #[source]
        source:    FormatError,
    },

    #[error("unrecognized interface: {reference}")]
    UnrecognizedInterface { reference: String },

    #[error("couldn't find package {import_path}")]
    PackageNotFound { import_path: String },

    #[error("type {identifier} not found in {import_path}")]
    TypeNotFound {
        import_path: String,
        identifier:  String,
    },

    #[error("not an interface: {reference}")]
    NotAnInterface { reference: String },

    #[error("empty interface: {reference}")]
    EmptyInterface { reference: String },

    #[error("cyclic interface embedding: {}", chain.join(" -> "))]
    CyclicEmbedding { chain: Vec<String> },

    #[error("the formatter rejected the generated source:\n{buffer}")]
    RenderFailure {
        #[source]
        source: FormatError,
        buffer: String,
    },

    #[error("failed to write {}", path.display())]
    WriteFailure {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to expand stub template")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Syntax(#[from] testgen_gosyntax::Error),
}
