//! nom parser for Go source files.
//!
//! Only the declaration level is modelled: the package clause, imports, type
//! declarations and typed variable declarations. Everything else is skipped
//! statement by statement, honoring Go's semicolon insertion at line ends.

mod lexical;
mod types;

use std::path::Path;

use nom::{
    branch::alt,
    character::complete::char,
    combinator::{eof, opt, peek},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Parser as _,
};
use nom_locate::LocatedSpan;
use nom_supreme::{error::ErrorTree, final_parser::final_parser, ParserExt};

use self::{
    lexical::{ident, inline_space, keyword, skip_statement, space, string_lit, terminator, unquote},
    types::{ident_list, ty, type_elem},
};
use crate::{
    ast::{Decl, Expr, Field, File, ImportName, ImportSpec, TypeSpec, ValueSpec},
    Error,
    FileSet,
    Pos,
};

/// Source text tagged with the base position of its file in the [`FileSet`].
pub type Span<'a> = LocatedSpan<&'a str, u32>;

type IResult<'a, O> = nom::IResult<Span<'a>, O, ErrorTree<Span<'a>>>;

fn pos(span: &Span) -> Pos {
    Pos::new(span.extra, span.location_offset())
}

/// Parses `source` and registers it in `fset` under `filename`.
pub fn parse_file(fset: &mut FileSet, filename: &Path, source: &str) -> Result<File, Error> {
    let base = fset.add_file(filename, source);
    let body = source.strip_prefix('\u{feff}').unwrap_or(source);
    let base = base + (source.len() - body.len()) as u32;

    final_parser(source_file)(Span::new_extra(body, base)).map_err(|err: ErrorTree<Span>| {
        Error::Syntax {
            filename: filename.to_path_buf(),
            message:  err
                .map_locations(|span| {
                    format!("{}:{}", span.location_line(), span.get_utf8_column())
                })
                .to_string(),
        }
    })
}

enum TopLevel {
    Imports(Vec<ImportSpec>),
    Decl(Decl),
}

fn source_file(input: Span) -> IResult<File> {
    let (input, (package, items)) = delimited(
        space,
        pair(
            delimited(
                pair(keyword("package"), inline_space),
                ident,
                pair(terminator, space),
            ),
            many0(terminated(top_level, space)),
        ),
        eof,
    )
    .context("source file")
    .parse(input)?;
    let mut imports = Vec::new();
    let mut decls = Vec::new();

    for item in items {
        match item {
            | TopLevel::Imports(specs) => imports.extend(specs),
            | TopLevel::Decl(decl) => decls.push(decl),
        }
    }

    Ok((
        input,
        File {
            package,
            imports,
            decls,
        },
    ))
}

/// One top-level declaration including its terminator. A declaration the
/// grammar cannot read falls through to [`other_decl`] and is skipped.
fn top_level(input: Span) -> IResult<TopLevel> {
    alt((
        terminated(
            preceded(pair(keyword("import"), inline_space), grouped(import_spec)),
            terminator,
        )
        .map(TopLevel::Imports),
        terminated(
            preceded(pair(keyword("type"), inline_space), grouped(type_spec)),
            terminator,
        )
        .map(|specs| TopLevel::Decl(Decl::Type(specs))),
        terminated(
            preceded(pair(keyword("var"), inline_space), grouped(value_spec)),
            terminator,
        )
        .map(|specs| TopLevel::Decl(Decl::Var(specs))),
        terminated(other_decl, terminator).map(|pos| TopLevel::Decl(Decl::Other(pos))),
    ))
    .context("top-level declaration")
    .parse(input)
}

/// `spec` or `( spec; spec; ... )`.
fn grouped<'a, O>(
    spec: fn(Span<'a>) -> IResult<'a, O>,
) -> impl FnMut(Span<'a>) -> IResult<'a, Vec<O>> {
    move |input| {
        alt((
            delimited(
                pair(char('('), space),
                many0(terminated(spec, pair(terminator, space))),
                char(')'),
            ),
            spec.map(|spec| vec![spec]),
        ))
        .parse(input)
    }
}

fn import_spec(input: Span) -> IResult<ImportSpec> {
    let (input, (name, path)) = pair(
        opt(terminated(
            alt((
                char('.').value(ImportName::Dot),
                ident.map(|ident| match ident.name.as_str() {
                    | "_" => ImportName::Blank,
                    | _ => ImportName::Name(ident),
                }),
            )),
            inline_space,
        )),
        string_lit,
    )
    .context("import spec")
    .parse(input)?;

    Ok((
        input,
        ImportSpec {
            name,
            path: unquote(path.fragment()),
        },
    ))
}

fn type_spec(input: Span) -> IResult<TypeSpec> {
    let (input, (name, type_params, assign)) = tuple((
        ident,
        opt(preceded(inline_space, type_params)),
        opt(preceded(inline_space, char('='))),
    ))
    .parse(input)?;
    let (input, ty) = preceded(
        inline_space,
        alt((terminated(ty, peek(terminator)), bad_type)),
    )
    .context("type spec")
    .parse(input)?;

    Ok((
        input,
        TypeSpec {
            name,
            type_params: type_params.unwrap_or_default(),
            alias: assign.is_some(),
            ty,
        },
    ))
}

/// `[K comparable, V any]`. An array length such as `[N]` has no constraint
/// and fails here, leaving it to the array type.
fn type_params(input: Span) -> IResult<Vec<Field>> {
    delimited(
        pair(char('['), space),
        terminated(
            separated_list1(
                delimited(space, char(','), space),
                pair(ident_list, preceded(inline_space, type_elem)).map(|(names, ty)| Field {
                    names,
                    ty,
                    tag: None,
                }),
            ),
            opt(pair(space, char(','))),
        ),
        pair(space, char(']')),
    )
    .context("type parameters")
    .parse(input)
}

fn bad_type(input: Span) -> IResult<Expr> {
    let (input, raw) = skip_statement(input)?;

    Ok((
        input,
        Expr::Bad {
            pos: pos(&raw),
            raw: raw.fragment().trim().to_string(),
        },
    ))
}

fn value_spec(input: Span) -> IResult<ValueSpec> {
    let (input, (names, ty, _)) = tuple((
        ident_list,
        opt(preceded(inline_space, ty)),
        opt(tuple((inline_space, char('='), skip_statement))),
    ))
    .context("var spec")
    .parse(input)?;

    Ok((input, ValueSpec { names, ty }))
}

fn other_decl(input: Span) -> IResult<Pos> {
    let (input, skipped) = skip_statement(input)?;
    let head = skipped.fragment().split_whitespace().next().unwrap_or_default();

    if matches!(head, "import" | "type" | "var") {
        tracing::debug!(
            line = skipped.location_line(),
            "skipping `{head}` declaration the parser could not read"
        );
    }

    Ok((input, pos(&skipped)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ChanDir;

    fn parse(src: &str) -> File {
        match parse_file(&mut FileSet::new(), Path::new("test.go"), src) {
            | Ok(file) => file,
            | Err(err) => panic!("{err}"),
        }
    }

    #[test]
    fn ok() {
        struct Case {
            input:  &'static str,
            assert: Box<dyn FnOnce(File)>,
        }

        let cases = [
            Case {
                input:  "package empty",
                assert: Box::new(|file| {
                    assert_eq!(file.package.name, "empty");
                    assert!(file.imports.is_empty());
                    assert!(file.decls.is_empty());
                }),
            },
            Case {
                input:  "// Package doc.\npackage p // trailing\n\nimport \"io\"\nimport (\n\t\"net/http\"\n\tyaml \"gopkg.in/yaml.v3\"\n\t. \"strings\"\n\t_ \"embed\"\n)\n",
                assert: Box::new(|file| {
                    let paths = file.imports.iter().map(|spec| spec.path.as_str()).collect::<Vec<_>>();

                    assert_eq!(paths, ["io", "net/http", "gopkg.in/yaml.v3", "strings", "embed"]);
                    assert!(matches!(&file.imports[2].name, Some(ImportName::Name(id)) if id.name == "yaml"));
                    assert_eq!(file.imports[3].name, Some(ImportName::Dot));
                    assert_eq!(file.imports[4].name, Some(ImportName::Blank));
                }),
            },
            Case {
                input:  include_str!("../../tests/testdata/client.go"),
                assert: Box::new(|file| {
                    let specs = file.type_specs().collect::<Vec<_>>();
                    let names = specs.iter().map(|spec| spec.name.name.as_str()).collect::<Vec<_>>();

                    assert_eq!(names, ["Client", "Widget", "Pair", "Events", "ID", "Number"]);
                    assert!(matches!(
                        &specs[0].ty,
                        Expr::Interface { methods, .. }
                            if methods.len() == 4
                                && methods[0].names.is_empty()
                                && methods[1].names[0].name == "Get"
                    ));
                    assert!(matches!(&specs[1].ty, Expr::Struct { fields, .. } if fields.len() == 3));
                    assert_eq!(specs[2].type_params.len(), 1);
                    assert!(matches!(
                        &specs[3].ty,
                        Expr::Chan { dir: ChanDir::Recv, .. }
                    ));
                    assert!(specs[4].alias);
                    assert!(matches!(&specs[5].ty, Expr::Interface { methods, .. } if methods.len() == 1));
                }),
            },
            Case {
                input:  "package hack\n\nimport \"io\"\n\nvar i io.Reader\n",
                assert: Box::new(|file| {
                    let spec = file.value_specs().next().unwrap();

                    assert_eq!(spec.names[0].name, "i");
                    assert!(matches!(
                        &spec.ty,
                        Some(Expr::Selector { x, sel })
                            if matches!(&**x, Expr::Ident(id) if id.name == "io") && sel.name == "Reader"
                    ));
                }),
            },
            Case {
                input:  "package p\n\nvar (\n\tx = 1\n\ty, z int = 2, 3\n)\n\nconst c = `}`\n",
                assert: Box::new(|file| {
                    let specs = file.value_specs().collect::<Vec<_>>();

                    assert_eq!(specs.len(), 2);
                    assert!(specs[0].ty.is_none());
                    assert_eq!(specs[1].names.len(), 2);
                    assert!(matches!(file.decls[1], Decl::Other(_)));
                }),
            },
        ];

        for (i, case) in cases.into_iter().enumerate() {
            match parse_file(&mut FileSet::new(), Path::new("test.go"), case.input) {
                | Ok(file) => (case.assert)(file),
                | Err(err) => panic!("{i}: {err}"),
            }
        }
    }

    #[test]
    fn unreadable_type_is_kept_as_bad() {
        let file = parse("package p\n\ntype T = a.b.c\n\ntype U interface{ M() }\n");
        let specs = file.type_specs().collect::<Vec<_>>();

        assert_eq!(specs.len(), 2);
        assert!(matches!(&specs[0].ty, Expr::Bad { raw, .. } if raw == "a.b.c"));
        assert_eq!(specs[1].name.name, "U");
    }

    #[test]
    fn positions_resolve_through_fileset() {
        let mut fset = FileSet::new();
        let _ = parse_file(&mut fset, Path::new("a.go"), "package a\n").unwrap();
        let file = parse_file(&mut fset, Path::new("b.go"), "package a\n\ntype Reader interface {\n\tRead() error\n}\n").unwrap();
        let spec = file.type_specs().next().unwrap();
        let position = fset.position(spec.name.pos).unwrap();

        assert_eq!(position.to_string(), "b.go:3:6");
        assert_eq!(fset.position(spec.ty.pos()).unwrap().to_string(), "b.go:3:13");
    }

    #[test]
    fn leading_byte_order_mark() {
        let mut fset = FileSet::new();
        let file = parse_file(&mut fset, Path::new("bom.go"), "\u{feff}package bom\n\ntype T int\n").unwrap();
        let spec = file.type_specs().next().unwrap();

        assert_eq!(file.package.name, "bom");
        assert_eq!(fset.position(spec.name.pos).unwrap().to_string(), "bom.go:3:6");
    }

    #[test]
    fn syntax_error() {
        let err = parse_file(&mut FileSet::new(), Path::new("bad.go"), "packag x\n").unwrap_err();

        assert!(err.to_string().starts_with("bad.go: syntax error"), "{err}");
    }
}
