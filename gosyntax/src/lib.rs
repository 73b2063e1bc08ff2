pub mod ast;
pub mod constraint;
pub mod parser;

mod error;
mod fileset;
mod printer;

pub use constraint::{file_constraint, Constraint};
pub use error::Error;
pub use fileset::{FileSet, Pos, Position};
pub use parser::parse_file;
