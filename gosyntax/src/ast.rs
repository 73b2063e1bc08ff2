//! Syntax tree for the declaration-level subset of Go the generator reads.
//!
//! Function bodies, constant blocks and initializer expressions are not
//! represented; only their positions survive as [`Decl::Other`].

use crate::Pos;

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls:   Vec<Decl>,
}

impl File {
    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            | Decl::Type(specs) => specs.as_slice(),
            | _ => &[][..],
        })
    }

    pub fn value_specs(&self) -> impl Iterator<Item = &ValueSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            | Decl::Var(specs) => specs.as_slice(),
            | _ => &[][..],
        })
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Ident {
    pub pos:  Pos,
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pos:  Pos::NONE,
            name: name.into(),
        }
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    /// Unquoted import path.
    pub path: String,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum ImportName {
    Dot,
    Blank,
    Name(Ident),
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Decl {
    Type(Vec<TypeSpec>),
    Var(Vec<ValueSpec>),
    Other(Pos),
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TypeSpec {
    pub name:        Ident,
    pub type_params: Vec<Field>,
    pub alias:       bool,
    pub ty:          Expr,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty:    Option<Expr>,
}

/// A parameter group, result group, struct field or interface entry.
///
/// In an interface, a field with one name is a method whose type is
/// [`Expr::Func`]; a field without names is an embedded type or a type-set
/// element.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty:    Expr,
    /// Raw struct tag literal, quotes included.
    pub tag:   Option<String>,
}

impl Field {
    pub fn anonymous(ty: Expr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct FuncType {
    pub params:  Vec<Field>,
    pub results: Vec<Field>,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Expr {
    Ident(Ident),
    /// Qualified identifier such as `io.Reader`.
    Selector {
        x:   Box<Expr>,
        sel: Ident,
    },
    Star {
        pos: Pos,
        x:   Box<Expr>,
    },
    /// Slice when `len` is `None`, otherwise an array with its raw length text.
    Array {
        pos: Pos,
        len: Option<String>,
        elt: Box<Expr>,
    },
    Map {
        pos:   Pos,
        key:   Box<Expr>,
        value: Box<Expr>,
    },
    Chan {
        pos:   Pos,
        dir:   ChanDir,
        value: Box<Expr>,
    },
    Func {
        pos: Pos,
        ty:  FuncType,
    },
    Interface {
        pos:     Pos,
        methods: Vec<Field>,
    },
    Struct {
        pos:    Pos,
        fields: Vec<Field>,
    },
    /// Variadic parameter type `...T`.
    Ellipsis {
        pos: Pos,
        elt: Box<Expr>,
    },
    /// Generic instantiation `T[A, B]`.
    Index {
        x:       Box<Expr>,
        indices: Vec<Expr>,
    },
    Paren {
        pos: Pos,
        x:   Box<Expr>,
    },
    Union(Vec<Expr>),
    Tilde {
        pos: Pos,
        x:   Box<Expr>,
    },
    /// Right-hand side of a type declaration the parser could not read.
    Bad {
        pos: Pos,
        raw: String,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(Ident::new(name))
    }

    pub fn selector(pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Selector {
            x:   Box::new(Self::ident(pkg)),
            sel: Ident::new(name),
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            | Expr::Ident(ident) => ident.pos,
            | Expr::Selector { x, .. } | Expr::Index { x, .. } => x.pos(),
            | Expr::Union(terms) => terms.first().map(Expr::pos).unwrap_or_default(),
            | Expr::Star { pos, .. }
            | Expr::Array { pos, .. }
            | Expr::Map { pos, .. }
            | Expr::Chan { pos, .. }
            | Expr::Func { pos, .. }
            | Expr::Interface { pos, .. }
            | Expr::Struct { pos, .. }
            | Expr::Ellipsis { pos, .. }
            | Expr::Paren { pos, .. }
            | Expr::Tilde { pos, .. }
            | Expr::Bad { pos, .. } => *pos,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Expr::Ellipsis { .. })
    }
}

/// Pre-order traversal over the type nodes of `expr`.
///
/// `f` is called for every node; when it returns `false` the children of that
/// node are not visited. Parameter, result and field names are never visited,
/// only their types.
pub fn inspect_mut<F>(expr: &mut Expr, f: &mut F)
where
    F: FnMut(&mut Expr) -> bool,
{
    if !f(expr) {
        return;
    }

    match expr {
        | Expr::Ident(_) | Expr::Bad { .. } => (),
        | Expr::Selector { x, .. } => inspect_mut(x, f),
        | Expr::Star { x, .. } | Expr::Paren { x, .. } | Expr::Tilde { x, .. } => {
            inspect_mut(x, f)
        },
        | Expr::Array { elt, .. } | Expr::Ellipsis { elt, .. } => inspect_mut(elt, f),
        | Expr::Map { key, value, .. } => {
            inspect_mut(key, f);
            inspect_mut(value, f);
        },
        | Expr::Chan { value, .. } => inspect_mut(value, f),
        | Expr::Func { ty, .. } => {
            for field in ty.params.iter_mut().chain(ty.results.iter_mut()) {
                inspect_mut(&mut field.ty, f);
            }
        },
        | Expr::Interface { methods: fields, .. } | Expr::Struct { fields, .. } => {
            for field in fields {
                inspect_mut(&mut field.ty, f);
            }
        },
        | Expr::Index { x, indices } => {
            inspect_mut(x, f);

            for index in indices {
                inspect_mut(index, f);
            }
        },
        | Expr::Union(terms) => {
            for term in terms {
                inspect_mut(term, f);
            }
        },
    }
}
