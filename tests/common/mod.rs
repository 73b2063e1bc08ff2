use std::path::{Path, PathBuf};

use testgen::{
    config::Config,
    format::{FormatError, SourceFormatter},
};
use testgen_gosyntax::{ast::Expr, parse_file, FileSet};

pub fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

pub fn config(output_root: &Path) -> Config {
    let testdata = testdata();

    Config {
        goroot:      Some(testdata.join("goroot")),
        gopath:      vec![testdata.join("gopath")],
        modules:     vec![testdata.join("mod")],
        goimports:   None,
        output_root: Some(output_root.to_path_buf()),
    }
}

/// Stands in for `goimports`: rejects source it cannot parse, and adds the
/// import for scratch `var i pkg.Name` declarations whose package it knows.
#[derive(Debug)]
pub struct FakeImports {
    known: Vec<(&'static str, &'static str)>,
}

impl Default for FakeImports {
    fn default() -> Self {
        Self {
            known: vec![
                ("io", "io"),
                ("store", "example.com/store"),
                ("api", "example.org/mod/api"),
            ],
        }
    }
}

impl SourceFormatter for FakeImports {
    fn process(&self, src: &str) -> Result<String, FormatError> {
        let rejected = |stderr: String| FormatError::Rejected {
            program: "fake-goimports".into(),
            stderr,
        };
        let file = parse_file(&mut FileSet::new(), Path::new("<standard input>"), src)
            .map_err(|err| rejected(err.to_string()))?;

        if file.package.name != "hack" {
            return Ok(src.to_string());
        }

        let qualifier = match file.value_specs().next().and_then(|spec| spec.ty.as_ref()) {
            | Some(Expr::Selector { x, .. }) => match &**x {
                | Expr::Ident(ident) => ident.name.clone(),
                | _ => return Err(rejected("expected a package name".to_string())),
            },
            | Some(_) => return Ok(src.to_string()),
            | None => return Err(rejected("expected type".to_string())),
        };

        match self.known.iter().find(|(name, _)| *name == qualifier) {
            | Some((_, path)) => Ok(src.replacen(
                "package hack\n",
                &format!("package hack\n\nimport \"{path}\"\n"),
                1,
            )),
            | None => Ok(src.to_string()),
        }
    }
}

/// Rejects every buffer.
#[derive(Debug)]
pub struct Rejecting;

impl SourceFormatter for Rejecting {
    fn process(&self, _src: &str) -> Result<String, FormatError> {
        Err(FormatError::Rejected {
            program: "fake-goimports".into(),
            stderr:  "<standard input>:1:1: expected 'package', found 'EOF'".to_string(),
        })
    }
}
