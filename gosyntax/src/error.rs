use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{}: syntax error: {message}", filename.display())]
    Syntax { filename: PathBuf, message: String },

    #[error("malformed build constraint `{line}`: {message}")]
    Constraint { line: String, message: String },
}
