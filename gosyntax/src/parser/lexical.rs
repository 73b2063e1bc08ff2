use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{char, line_ending, one_of, satisfy},
    combinator::{eof, not, peek, recognize, verify},
    error::{ContextError, ErrorKind, ParseError},
    sequence::{delimited, pair, preceded, terminated},
    InputTake,
    Parser as _,
};
use nom_supreme::{error::ErrorTree, ParserExt};

use super::{pos, IResult, Span};
use crate::ast::Ident;

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Whitespace, newlines and comments.
pub(super) fn space(input: Span) -> IResult<()> {
    let n = trivia_len(input.fragment(), true);
    let (input, _) = input.take_split(n);

    Ok((input, ()))
}

/// Whitespace and comments that do not end the current line.
pub(super) fn inline_space(input: Span) -> IResult<()> {
    let n = trivia_len(input.fragment(), false);
    let (input, _) = input.take_split(n);

    Ok((input, ()))
}

pub(super) fn ws<'a, F: 'a, O>(inner: F) -> impl FnMut(Span<'a>) -> IResult<'a, O>
where
    F: FnMut(Span<'a>) -> IResult<'a, O>,
{
    delimited(space, inner, space)
}

/// End of a declaration or interface/struct member: a semicolon, the end of
/// the line, a closing bracket of the enclosing group, or the end of input.
pub(super) fn terminator(input: Span) -> IResult<()> {
    preceded(
        inline_space,
        alt((
            char(';').value(()),
            pair(tag("//"), take_till(|c: char| c == '\n')).value(()),
            // `inline_space` already consumed single-line block comments.
            peek(tag("/*")).value(()),
            line_ending.value(()),
            peek(one_of(")}")).value(()),
            eof.value(()),
        )),
    )
    .context("terminator")
    .parse(input)
}

pub(super) fn ident(input: Span) -> IResult<Ident> {
    let (rest, name) = verify(
        recognize(pair(
            satisfy(|c| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
        |name: &Span| !KEYWORDS.contains(name.fragment()),
    )
    .context("identifier")
    .parse(input)?;

    Ok((
        rest,
        Ident {
            pos:  pos(&name),
            name: name.fragment().to_string(),
        },
    ))
}

pub(super) fn keyword<'a>(kw: &'static str) -> impl FnMut(Span<'a>) -> IResult<'a, Span<'a>> {
    move |input| {
        terminated(
            tag(kw),
            not(satisfy(|c: char| c.is_alphanumeric() || c == '_')),
        )
        .context(kw)
        .parse(input)
    }
}

/// Interpreted or raw string literal, quotes included.
pub(super) fn string_lit(input: Span) -> IResult<Span> {
    match input.fragment().chars().next() {
        | Some('"' | '`') => (),
        | _ => return Err(nom::Err::Error(ErrorTree::from_error_kind(input, ErrorKind::Char))),
    }

    match quoted_len(input.fragment()) {
        | Some(n) => {
            let (rest, lit) = input.take_split(n);

            Ok((rest, lit))
        },
        | None => Err(nom::Err::Failure(ErrorTree::add_context(
            input,
            "unterminated string literal",
            ErrorTree::from_error_kind(input, ErrorKind::Char),
        ))),
    }
}

pub(super) fn unquote(lit: &str) -> String {
    if let Some(raw) = lit.strip_prefix('`') {
        return raw.trim_end_matches('`').to_string();
    }

    let inner = lit
        .strip_prefix('"')
        .and_then(|lit| lit.strip_suffix('"'))
        .unwrap_or(lit);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            | '\\' => match chars.next() {
                | Some('n') => out.push('\n'),
                | Some('t') => out.push('\t'),
                | Some(c) => out.push(c),
                | None => (),
            },
            | c => out.push(c),
        }
    }

    out
}

/// Skips the rest of a statement whose grammar is not modelled, stopping in
/// front of the terminator that ends it.
pub(super) fn skip_statement(input: Span) -> IResult<Span> {
    let n = statement_len(input.fragment());

    if n == 0 {
        return Err(nom::Err::Error(ErrorTree::add_context(
            input,
            "statement",
            ErrorTree::from_error_kind(input, ErrorKind::TakeUntil),
        )));
    }

    let (rest, skipped) = input.take_split(n);

    Ok((rest, skipped))
}

/// Text up to the `]` closing an array length.
pub(super) fn array_len(input: Span) -> IResult<Span> {
    let s = input.fragment();
    let mut depth = 0usize;

    for (i, c) in s.char_indices() {
        match c {
            | '[' | '(' | '{' => depth += 1,
            | ']' if depth == 0 => {
                let (rest, len) = input.take_split(i);

                return Ok((rest, len));
            },
            | ']' | ')' | '}' => depth = depth.saturating_sub(1),
            | '\n' => break,
            | _ => (),
        }
    }

    Err(nom::Err::Error(ErrorTree::from_error_kind(input, ErrorKind::TakeUntil)))
}

fn trivia_len(s: &str, newlines: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;

    loop {
        match bytes.get(i) {
            | Some(b' ' | b'\t' | b'\r') => i += 1,
            | Some(b'\n') if newlines => i += 1,
            | Some(b'/') if newlines && bytes.get(i + 1) == Some(&b'/') => {
                i = s[i..].find('\n').map_or(s.len(), |n| i + n + 1);
            },
            | Some(b'/') if bytes.get(i + 1) == Some(&b'*') => match s[i + 2..].find("*/") {
                | Some(n) => {
                    let end = i + 2 + n + 2;

                    if !newlines && s[i..end].contains('\n') {
                        break;
                    }

                    i = end;
                },
                | None => break,
            },
            | _ => break,
        }
    }

    i
}

/// Length of a string, raw string or rune literal at the start of `s`.
fn quoted_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    let (_, quote) = chars.next()?;

    if quote == '`' {
        return s[1..].find('`').map(|n| n + 2);
    }

    loop {
        let (i, c) = chars.next()?;

        match c {
            | '\\' => {
                chars.next()?;
            },
            | '\n' => return None,
            | c if c == quote => return Some(i + 1),
            | _ => (),
        }
    }
}

fn statement_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut last = None;
    let mut prev = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        match b {
            | b'"' | b'`' | b'\'' => {
                i += quoted_len(&s[i..]).unwrap_or(s.len() - i);
                prev = last;
                last = Some(b'"');

                continue;
            },
            | b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i += s[i..].find('\n').unwrap_or(s.len() - i);

                continue;
            },
            | b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = s[i + 2..].find("*/").map_or(s.len(), |n| i + 2 + n + 2);

                if depth == 0 && s[i..end].contains('\n') && inserts_semicolon(last, prev) {
                    return i;
                }

                i = end;

                continue;
            },
            | b'(' | b'[' | b'{' => depth += 1,
            | b')' | b']' | b'}' => {
                if depth == 0 {
                    return i;
                }

                depth -= 1;
            },
            | b';' if depth == 0 => return i,
            | b'\n' if depth == 0 && inserts_semicolon(last, prev) => return i,
            | b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;

                continue;
            },
            | _ => (),
        }

        prev = last;
        last = Some(b);
        i += 1;
    }

    i
}

/// Whether a newline after `last` ends the statement.
fn inserts_semicolon(last: Option<u8>, prev: Option<u8>) -> bool {
    match last {
        | Some(b')' | b']' | b'}' | b'"') => true,
        | Some(b'+') => prev == Some(b'+'),
        | Some(b'-') => prev == Some(b'-'),
        | Some(b) => b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80,
        | None => false,
    }
}
