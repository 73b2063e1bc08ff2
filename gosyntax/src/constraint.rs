//! Build constraints from the header of a Go file.
//!
//! `//go:build` lines take precedence. Legacy `// +build` lines are read only
//! when no `//go:build` line is present; separate lines are ANDed, space
//! separated options ORed and comma separated terms ANDed.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, space0},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
    Parser as _,
};
use nom_supreme::{
    error::ErrorTree,
    final_parser::{final_parser, Location},
    ParserExt,
};

use crate::Error;

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    /// Parses a `//go:build` expression such as `linux && (amd64 || arm64)`.
    pub fn parse(expr: &str) -> Result<Self, Error> {
        final_parser(delimited(space0, or_expr, space0))(expr).map_err(|err: ErrorTree<Location>| {
            Error::Constraint {
                line:    expr.to_string(),
                message: err.to_string(),
            }
        })
    }

    /// Parses the text after `// +build`.
    pub fn parse_plus_build(line: &str) -> Result<Self, Error> {
        let bad = || Error::Constraint {
            line:    line.to_string(),
            message: "malformed +build line".to_string(),
        };
        let options = line
            .split_whitespace()
            .map(|option| {
                option
                    .split(',')
                    .map(|term| {
                        let (negated, name) = match term.strip_prefix('!') {
                            | Some(name) => (true, name),
                            | None => (false, term),
                        };

                        if name.is_empty() || !name.chars().all(is_tag_char) {
                            return Err(bad());
                        }

                        let tag = Constraint::Tag(name.to_string());

                        Ok(if negated { Constraint::Not(Box::new(tag)) } else { tag })
                    })
                    .reduce(|lhs, rhs| Ok(Constraint::And(Box::new(lhs?), Box::new(rhs?))))
                    .unwrap_or_else(|| Err(bad()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        options
            .into_iter()
            .reduce(|lhs, rhs| Constraint::Or(Box::new(lhs), Box::new(rhs)))
            .ok_or_else(bad)
    }

    /// Evaluates the constraint, asking `satisfied` about each tag.
    pub fn eval(&self, satisfied: &mut impl FnMut(&str) -> bool) -> bool {
        match self {
            | Constraint::Tag(tag) => satisfied(tag),
            | Constraint::Not(inner) => !inner.eval(satisfied),
            | Constraint::And(lhs, rhs) => lhs.eval(satisfied) && rhs.eval(satisfied),
            | Constraint::Or(lhs, rhs) => lhs.eval(satisfied) || rhs.eval(satisfied),
        }
    }
}

/// The build constraint in the header of `source`, if any.
///
/// The header ends at the first line that is neither blank nor a comment.
pub fn file_constraint(source: &str) -> Result<Option<Constraint>, Error> {
    let mut go_build = None;
    let mut plus_build = Vec::new();
    let mut in_block = false;

    for line in source.trim_start_matches('\u{feff}').lines().map(str::trim) {
        if in_block {
            in_block = !line.contains("*/");

            continue;
        }

        if line.is_empty() {
            continue;
        }

        if line.starts_with("/*") {
            in_block = !line[2..].contains("*/");

            continue;
        }

        let Some(comment) = line.strip_prefix("//") else {
            break;
        };

        if let Some(expr) = comment.strip_prefix("go:build") {
            if go_build.is_none() && (expr.is_empty() || expr.starts_with(char::is_whitespace)) {
                go_build = Some(expr);
            }
        } else if let Some(expr) = comment.trim_start().strip_prefix("+build") {
            if expr.is_empty() || expr.starts_with(char::is_whitespace) {
                plus_build.push(expr);
            }
        }
    }

    if let Some(expr) = go_build {
        return Constraint::parse(expr).map(Some);
    }

    let mut constraint = None;

    for line in plus_build {
        let rhs = Constraint::parse_plus_build(line)?;

        constraint = Some(match constraint {
            | Some(lhs) => Constraint::And(Box::new(lhs), Box::new(rhs)),
            | None => rhs,
        });
    }

    Ok(constraint)
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

type PResult<'a, O> = IResult<&'a str, O, ErrorTree<&'a str>>;

fn or_expr(input: &str) -> PResult<Constraint> {
    pair(and_expr, many0(preceded(delimited(space0, tag("||"), space0), and_expr)))
        .map(|(first, rest)| {
            rest.into_iter()
                .fold(first, |lhs, rhs| Constraint::Or(Box::new(lhs), Box::new(rhs)))
        })
        .parse(input)
}

fn and_expr(input: &str) -> PResult<Constraint> {
    pair(unary, many0(preceded(delimited(space0, tag("&&"), space0), unary)))
        .map(|(first, rest)| {
            rest.into_iter()
                .fold(first, |lhs, rhs| Constraint::And(Box::new(lhs), Box::new(rhs)))
        })
        .parse(input)
}

fn unary(input: &str) -> PResult<Constraint> {
    alt((
        preceded(pair(char('!'), space0), unary).map(|inner| Constraint::Not(Box::new(inner))),
        delimited(pair(char('('), space0), or_expr, pair(space0, char(')'))),
        take_while1(is_tag_char).map(|tag: &str| Constraint::Tag(tag.to_string())),
    ))
    .context("build tag")
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, tags: &[&str]) -> bool {
        Constraint::parse(expr)
            .unwrap()
            .eval(&mut |tag| tags.contains(&tag))
    }

    #[test]
    fn expressions() {
        let linux = ["linux", "amd64", "unix"];
        let cases = [
            ("linux", true),
            ("windows", false),
            ("!windows", true),
            ("linux && amd64", true),
            ("linux && !amd64", false),
            ("windows || darwin", false),
            ("windows || linux && arm64", false),
            ("windows || linux && amd64", true),
            ("(windows || linux) && !(arm64)", true),
            ("!!linux", true),
            ("  unix  ", true),
        ];

        for (expr, want) in cases {
            assert_eq!(eval(expr, &linux), want, "{expr}");
        }
    }

    #[test]
    fn malformed() {
        for expr in ["", "linux &&", "(linux", "linux windows", "a | b"] {
            assert!(Constraint::parse(expr).is_err(), "{expr}");
        }

        assert!(Constraint::parse_plus_build(" linux,").is_err());
    }

    #[test]
    fn header() {
        let satisfied = |source: &str| {
            file_constraint(source)
                .unwrap()
                .map_or(true, |c| c.eval(&mut |tag| tag == "linux" || tag == "amd64"))
        };

        assert!(satisfied("package a\n"));
        assert!(!satisfied("//go:build ignore\n\npackage main\n"));
        assert!(!satisfied("// Copyright\n\n/* block\n*/\n//go:build windows\n\npackage a\n"));
        assert!(satisfied("//go:build !windows\n\npackage a\n"));
        assert!(satisfied("package a\n\n//go:build windows\n"));
        assert!(!satisfied("// +build linux,386 darwin\n\npackage a\n"));
        assert!(satisfied("// +build linux,amd64 darwin\n// +build !windows\n\npackage a\n"));
        assert!(!satisfied("// +build linux\n// +build ignore\n\npackage a\n"));
        // `//go:build` wins over `// +build`.
        assert!(satisfied("//go:build linux\n// +build windows\n\npackage a\n"));
        assert!(!satisfied("\u{feff}//go:build windows\npackage a\n"));
        assert!(file_constraint("//go:build linux &&\n\npackage a\n").is_err());
    }
}
