use testgen_gosyntax::ast::{inspect_mut, Expr};

use crate::loader::LoadedPackage;

/// Prefixes every exported identifier in `expr` with `pkg`.
///
/// Selector expressions are already qualified and are left alone, including
/// the identifiers inside them.
pub fn qualify(expr: &mut Expr, pkg: &str) {
    inspect_mut(expr, &mut |node: &mut Expr| match node {
        | Expr::Ident(ident) => {
            if ident.is_exported() {
                let sel = ident.clone();

                *node = Expr::Selector {
                    x: Box::new(Expr::ident(pkg)),
                    sel,
                };
            }

            false
        },
        | Expr::Selector { .. } => false,
        | _ => true,
    });
}

impl LoadedPackage {
    /// Renders `expr` as seen from outside this package.
    pub fn full_type(&self, expr: &Expr) -> String {
        let mut expr = expr.clone();

        qualify(&mut expr, &self.name);

        expr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use testgen_gosyntax::{parse_file, FileSet};

    use super::*;

    fn parse_type(src: &str) -> Expr {
        let file = parse_file(
            &mut FileSet::new(),
            Path::new("t.go"),
            &format!("package http\n\ntype T {src}\n"),
        )
        .unwrap();
        let ty = file.type_specs().next().unwrap().ty.clone();

        ty
    }

    fn qualified(src: &str) -> String {
        let mut expr = parse_type(src);

        qualify(&mut expr, "http");

        expr.to_string()
    }

    #[test]
    fn exported_local_names() {
        let cases = [
            ("int", "int"),
            ("Handler", "http.Handler"),
            ("io.Reader", "io.Reader"),
            ("*Request", "*http.Request"),
            ("[]*Cookie", "[]*http.Cookie"),
            ("map[string][]Header", "map[string][]http.Header"),
            ("func(w ResponseWriter, r *Request) error", "func(w http.ResponseWriter, r *http.Request) error"),
            ("<-chan ConnState", "<-chan http.ConnState"),
            ("struct{ Name string; Body io.ReadCloser }", "struct{ Name string; Body io.ReadCloser }"),
            ("interface{ Serve(Conn) }", "interface{ Serve(http.Conn) }"),
            ("List[Header, url.URL]", "http.List[http.Header, url.URL]"),
            ("unexported", "unexported"),
        ];

        for (src, want) in cases {
            assert_eq!(qualified(src), want, "{src}");
        }
    }

    #[test]
    fn idempotent() {
        let cases = ["*Request", "map[Key]*Value", "func(...Option) Client", "io.Writer"];

        for src in cases {
            let once = qualified(src);

            assert_eq!(qualified(&once), once, "{src}");
        }
    }
}
