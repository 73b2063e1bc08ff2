use std::mem;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, opt},
    error::{ContextError, ErrorKind, ParseError},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Parser as _,
};
use nom_supreme::{error::ErrorTree, ParserExt};

use super::{
    lexical::{array_len, ident, inline_space, keyword, space, string_lit, terminator, ws},
    pos,
    IResult,
    Span,
};
use crate::ast::{ChanDir, Expr, Field, FuncType, Ident};

pub(super) fn ty(input: Span) -> IResult<Expr> {
    alt((
        paren_type,
        pointer_type,
        array_type,
        map_type,
        chan_type,
        func_type,
        interface_type,
        struct_type,
        type_name,
    ))
    .context("type")
    .parse(input)
}

/// `pkg.Name`, `Name` or an instantiation such as `List[int]`.
pub(super) fn type_name(input: Span) -> IResult<Expr> {
    let (input, (name, sel, indices)) = tuple((
        ident,
        opt(preceded(char('.'), ident)),
        opt(delimited(
            pair(char('['), space),
            terminated(separated_list1(ws(char(',')), ty), opt(ws(char(',')))),
            pair(space, char(']')),
        )),
    ))
    .context("type name")
    .parse(input)?;
    let expr = match sel {
        | Some(sel) => Expr::Selector {
            x: Box::new(Expr::Ident(name)),
            sel,
        },
        | None => Expr::Ident(name),
    };
    let expr = match indices {
        | Some(indices) => Expr::Index {
            x: Box::new(expr),
            indices,
        },
        | None => expr,
    };

    Ok((input, expr))
}

fn paren_type(input: Span) -> IResult<Expr> {
    let (input, (open, x)) = pair(
        tag("("),
        terminated(ws(ty), char(')')),
    )
    .parse(input)?;

    Ok((
        input,
        Expr::Paren {
            pos: pos(&open),
            x:   Box::new(x),
        },
    ))
}

fn pointer_type(input: Span) -> IResult<Expr> {
    let (input, (star, x)) = pair(tag("*"), preceded(inline_space, ty)).parse(input)?;

    Ok((
        input,
        Expr::Star {
            pos: pos(&star),
            x:   Box::new(x),
        },
    ))
}

/// `[]T`, `[N]T` or `[...]T`.
fn array_type(input: Span) -> IResult<Expr> {
    let (input, (open, len, elt)) = tuple((
        tag("["),
        terminated(preceded(space, array_len), char(']')),
        preceded(inline_space, ty),
    ))
    .context("array type")
    .parse(input)?;
    let len = len.fragment().trim();

    Ok((
        input,
        Expr::Array {
            pos: pos(&open),
            len: (!len.is_empty()).then(|| len.to_string()),
            elt: Box::new(elt),
        },
    ))
}

fn map_type(input: Span) -> IResult<Expr> {
    let (input, (kw, key, value)) = tuple((
        keyword("map"),
        delimited(
            pair(inline_space, char('[')),
            ws(ty),
            char(']'),
        ),
        preceded(inline_space, ty),
    ))
    .context("map type")
    .parse(input)?;

    Ok((
        input,
        Expr::Map {
            pos:   pos(&kw),
            key:   Box::new(key),
            value: Box::new(value),
        },
    ))
}

/// `chan T`, `chan<- T` or `<-chan T`. The arrow binds to the leftmost `chan`.
fn chan_type(input: Span) -> IResult<Expr> {
    let recv = tuple((
        tag("<-"),
        preceded(inline_space, keyword("chan")),
        preceded(inline_space, ty),
    ))
    .map(|(arrow, _, value)| (arrow, ChanDir::Recv, value));
    let other = tuple((
        keyword("chan"),
        preceded(inline_space, opt(tag("<-"))),
        preceded(inline_space, ty),
    ))
    .map(|(kw, arrow, value)| {
        let dir = match arrow {
            | Some(_) => ChanDir::Send,
            | None => ChanDir::Both,
        };

        (kw, dir, value)
    });
    let (input, (start, dir, value)) = alt((recv, other)).context("chan type").parse(input)?;

    Ok((
        input,
        Expr::Chan {
            pos: pos(&start),
            dir,
            value: Box::new(value),
        },
    ))
}

fn func_type(input: Span) -> IResult<Expr> {
    let (input, (kw, ty)) = pair(keyword("func"), preceded(inline_space, signature))
        .context("func type")
        .parse(input)?;

    Ok((input, Expr::Func { pos: pos(&kw), ty }))
}

fn interface_type(input: Span) -> IResult<Expr> {
    let (input, (kw, methods)) = pair(
        keyword("interface"),
        members(interface_elem),
    )
    .context("interface type")
    .parse(input)?;

    Ok((
        input,
        Expr::Interface {
            pos: pos(&kw),
            methods,
        },
    ))
}

fn struct_type(input: Span) -> IResult<Expr> {
    let (input, (kw, fields)) = pair(keyword("struct"), members(struct_field))
        .context("struct type")
        .parse(input)?;

    Ok((input, Expr::Struct { pos: pos(&kw), fields }))
}

/// `{ member; member }` with members ended by semicolons or newlines.
fn members<'a>(
    member: fn(Span<'a>) -> IResult<'a, Field>,
) -> impl FnMut(Span<'a>) -> IResult<'a, Vec<Field>> {
    move |input| {
        delimited(
            tuple((inline_space, char('{'), space)),
            many0(terminated(member, pair(terminator, space))),
            char('}'),
        )
        .parse(input)
    }
}

fn interface_elem(input: Span) -> IResult<Field> {
    alt((method_spec, type_elem.map(Field::anonymous)))
        .context("interface element")
        .parse(input)
}

fn method_spec(input: Span) -> IResult<Field> {
    let (input, (name, ty)) = pair(ident, preceded(inline_space, signature)).parse(input)?;

    Ok((
        input,
        Field {
            names: vec![name.clone()],
            ty:    Expr::Func { pos: name.pos, ty },
            tag:   None,
        },
    ))
}

/// Embedded type or type-set element such as `~int | ~string`.
pub(super) fn type_elem(input: Span) -> IResult<Expr> {
    let (input, mut terms) = separated_list1(
        delimited(inline_space, char('|'), space),
        type_term,
    )
    .parse(input)?;

    if terms.len() == 1 {
        return Ok((input, terms.remove(0)));
    }

    Ok((input, Expr::Union(terms)))
}

fn type_term(input: Span) -> IResult<Expr> {
    alt((
        pair(tag("~"), preceded(inline_space, ty)).map(|(tilde, x)| Expr::Tilde {
            pos: pos(&tilde),
            x:   Box::new(x),
        }),
        ty,
    ))
    .parse(input)
}

fn struct_field(input: Span) -> IResult<Field> {
    let (input, ((names, ty), tag)) = pair(
        alt((
            pair(ident_list, preceded(inline_space, ty)),
            map(ty, |ty| (Vec::new(), ty)),
        )),
        opt(preceded(inline_space, string_lit)),
    )
    .context("struct field")
    .parse(input)?;

    Ok((
        input,
        Field {
            names,
            ty,
            tag: tag.map(|tag| tag.fragment().to_string()),
        },
    ))
}

pub(super) fn ident_list(input: Span) -> IResult<Vec<Ident>> {
    separated_list1(delimited(inline_space, char(','), space), ident).parse(input)
}

pub(super) fn signature(input: Span) -> IResult<FuncType> {
    let (input, (params, results)) = pair(
        parameters,
        opt(preceded(
            inline_space,
            alt((parameters, ty.map(|ty| vec![Field::anonymous(ty)]))),
        )),
    )
    .context("signature")
    .parse(input)?;

    Ok((
        input,
        FuncType {
            params,
            results: results.unwrap_or_default(),
        },
    ))
}

#[derive(Debug)]
enum ParamItem {
    Named(Ident, Expr),
    Anonymous(Expr),
}

fn parameters(input: Span) -> IResult<Vec<Field>> {
    let start = input;
    let (input, items) = delimited(
        pair(char('('), space),
        terminated(separated_list0(ws(char(',')), param_item), opt(ws(char(',')))),
        pair(space, char(')')),
    )
    .context("parameters")
    .parse(input)?;

    match group_params(items) {
        | Some(fields) => Ok((input, fields)),
        | None => Err(nom::Err::Error(ErrorTree::add_context(
            start,
            "mixed named and unnamed parameters",
            ErrorTree::from_error_kind(start, ErrorKind::Verify),
        ))),
    }
}

fn param_item(input: Span) -> IResult<ParamItem> {
    alt((
        pair(ident, preceded(inline_space, param_type))
            .map(|(name, ty)| ParamItem::Named(name, ty)),
        param_type.map(ParamItem::Anonymous),
    ))
    .parse(input)
}

fn param_type(input: Span) -> IResult<Expr> {
    alt((
        pair(tag("..."), preceded(inline_space, ty)).map(|(dots, elt)| Expr::Ellipsis {
            pos: pos(&dots),
            elt: Box::new(elt),
        }),
        ty,
    ))
    .parse(input)
}

/// Applies Go's grouping rule: if any entry is named, every bare identifier is
/// a name sharing the type of the next named entry (`a, b int`); otherwise
/// every entry is an anonymous type.
fn group_params(items: Vec<ParamItem>) -> Option<Vec<Field>> {
    if !items.iter().any(|item| matches!(item, ParamItem::Named(..))) {
        return Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    | ParamItem::Anonymous(ty) => Some(Field::anonymous(ty)),
                    | ParamItem::Named(..) => None,
                })
                .collect(),
        );
    }

    let mut fields = Vec::new();
    let mut pending = Vec::new();

    for item in items {
        match item {
            | ParamItem::Anonymous(Expr::Ident(name)) => pending.push(name),
            | ParamItem::Anonymous(_) => return None,
            | ParamItem::Named(name, ty) => {
                pending.push(name);
                fields.push(Field {
                    names: mem::take(&mut pending),
                    ty,
                    tag: None,
                });
            },
        }
    }

    pending.is_empty().then_some(fields)
}
