use std::fmt;

use crate::ast::{ChanDir, Expr, Field, FuncType};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | Expr::Ident(ident) => f.write_str(&ident.name),
            | Expr::Selector { x, sel } => write!(f, "{x}.{}", sel.name),
            | Expr::Star { x, .. } => write!(f, "*{x}"),
            | Expr::Array { len, elt, .. } => {
                write!(f, "[{}]{elt}", len.as_deref().unwrap_or_default())
            },
            | Expr::Map { key, value, .. } => write!(f, "map[{key}]{value}"),
            | Expr::Chan { dir, value, .. } => match dir {
                | ChanDir::Both => write!(f, "chan {value}"),
                | ChanDir::Send => write!(f, "chan<- {value}"),
                | ChanDir::Recv => write!(f, "<-chan {value}"),
            },
            | Expr::Func { ty, .. } => write!(f, "func{}", Signature(ty)),
            | Expr::Interface { methods, .. } => {
                f.write_str("interface{")?;
                write_members(f, methods, |f, field| match (&field.names[..], &field.ty) {
                    | ([name], Expr::Func { ty, .. }) => {
                        write!(f, "{}{}", name.name, Signature(ty))
                    },
                    | _ => write!(f, "{}", field.ty),
                })?;
                f.write_str("}")
            },
            | Expr::Struct { fields, .. } => {
                f.write_str("struct{")?;
                write_members(f, fields, |f, field| {
                    write_field(f, field)?;

                    if let Some(tag) = &field.tag {
                        write!(f, " {tag}")?;
                    }

                    Ok(())
                })?;
                f.write_str("}")
            },
            | Expr::Ellipsis { elt, .. } => write!(f, "...{elt}"),
            | Expr::Index { x, indices } => {
                write!(f, "{x}[")?;
                write_list(f, indices, |f, index| write!(f, "{index}"))?;
                f.write_str("]")
            },
            | Expr::Paren { x, .. } => write!(f, "({x})"),
            | Expr::Union(terms) => write_separated(f, terms, " | ", |f, term| write!(f, "{term}")),
            | Expr::Tilde { x, .. } => write!(f, "~{x}"),
            | Expr::Bad { raw, .. } => f.write_str(raw),
        }
    }
}

/// Parameters and results of a func type, without the `func` keyword.
struct Signature<'a>(&'a FuncType);

impl fmt::Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.0.params, write_field)?;
        f.write_str(")")?;

        match &self.0.results[..] {
            | [] => Ok(()),
            | [result] if result.names.is_empty() => write!(f, " {}", result.ty),
            | results => {
                f.write_str(" (")?;
                write_list(f, results, write_field)?;
                f.write_str(")")
            },
        }
    }
}

fn write_field(f: &mut fmt::Formatter<'_>, field: &Field) -> fmt::Result {
    if !field.names.is_empty() {
        write_separated(f, &field.names, ", ", |f, name| f.write_str(&name.name))?;
        f.write_str(" ")?;
    }

    write!(f, "{}", field.ty)
}

fn write_members<T>(
    f: &mut fmt::Formatter<'_>,
    members: &[T],
    write: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    if members.is_empty() {
        return Ok(());
    }

    f.write_str(" ")?;
    write_separated(f, members, "; ", write)?;
    f.write_str(" ")
}

fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    write: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    write_separated(f, items, ", ", write)
}

fn write_separated<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    sep: &str,
    write: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }

        write(f, item)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::Ident, FileSet, Pos};

    fn parse_type(src: &str) -> Expr {
        let file = crate::parse_file(
            &mut FileSet::new(),
            "t.go".as_ref(),
            &format!("package t\n\ntype T {src}\n"),
        )
        .unwrap();
        let ty = file.type_specs().next().unwrap().ty.clone();

        ty
    }

    #[test]
    fn canonical() {
        let cases = [
            ("int", "int"),
            ("* Widget", "*Widget"),
            ("[ ]byte", "[]byte"),
            ("[4]int", "[4]int"),
            ("[...]string", "[...]string"),
            ("map[string] []*http.Request", "map[string][]*http.Request"),
            ("chan<-  int", "chan<- int"),
            ("<-chan int", "<-chan int"),
            ("chan struct{}", "chan struct{}"),
            (
                "func(a, b int, c ...string) (n int, err error)",
                "func(a, b int, c ...string) (n int, err error)",
            ),
            ("func() error", "func() error"),
            ("func() (int, error)", "func() (int, error)"),
            ("func(int,string,)", "func(int, string)"),
            ("interface{}", "interface{}"),
            (
                "interface{\n\tio.Reader\n\tClose() error\n}",
                "interface{ io.Reader; Close() error }",
            ),
            (
                "struct {\n\tA, B int `json:\"a\"`\n\tio.Writer\n}",
                "struct{ A, B int `json:\"a\"`; io.Writer }",
            ),
            ("List[int, *Node]", "List[int, *Node]"),
            ("interface{ ~int | ~string }", "interface{ ~int | ~string }"),
            ("(int)", "(int)"),
        ];

        for (i, (src, want)) in cases.into_iter().enumerate() {
            assert_eq!(parse_type(src).to_string(), want, "case {i}: {src}");
        }
    }

    #[test]
    fn synthesized() {
        let expr = Expr::Star {
            pos: Pos::NONE,
            x:   Box::new(Expr::selector("http", "Request")),
        };

        assert_eq!(expr.to_string(), "*http.Request");
        assert_eq!(Expr::Ident(Ident::new("error")).to_string(), "error");
    }
}
