use serde::Serialize;
use testgen_gosyntax::ast::{Expr, Field, File, FuncType, ImportName};

use crate::{
    format::SourceFormatter,
    loader::{LoadedPackage, PackageResolver},
    reference::InterfaceRef,
    Error,
};

/// Predeclared types that can never name an interface.
const PREDECLARED: &[&str] = &[
    "bool", "byte", "comparable", "complex64", "complex128", "float32", "float64", "int", "int8",
    "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr",
];

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct Param {
    /// Empty for anonymous parameters.
    pub name: String,
    /// Qualified type text.
    pub ty:   String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty:   ty.into(),
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.ty.starts_with("...")
    }
}

/// A method signature without its receiver.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct Func {
    pub name:    String,
    pub params:  Vec<Param>,
    pub results: Vec<Param>,
}

/// A [`Func`] attached to the receiver type it is generated on.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct Method {
    pub recv: String,
    #[serde(flatten)]
    pub func: Func,
}

/// The flattened method set of an interface declaration.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Interface {
    pub reference: InterfaceRef,
    /// Name of the declaring package.
    pub package:   String,
    pub funcs:     Vec<Func>,
}

impl Interface {
    /// The interface as spelled from another package, e.g. `http.Handler`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.reference.identifier)
    }
}

enum Embedded {
    Interface(InterfaceRef),
    Funcs(Vec<Func>),
}

/// Resolves interface references into flat method lists, loading every
/// package it visits afresh.
#[derive(Debug)]
pub struct Extractor<'a> {
    packages:  PackageResolver<'a>,
    formatter: &'a dyn SourceFormatter,
}

impl<'a> Extractor<'a> {
    pub fn new(packages: PackageResolver<'a>, formatter: &'a dyn SourceFormatter) -> Self {
        Self {
            packages,
            formatter,
        }
    }

    pub fn interface(&self, reference: &str) -> Result<Interface, Error> {
        let iref = InterfaceRef::parse(reference, self.formatter)?;

        self.resolve(iref, &mut Vec::new())
    }

    /// `chain` holds the interfaces currently being expanded, outermost first.
    fn resolve(&self, iref: InterfaceRef, chain: &mut Vec<InterfaceRef>) -> Result<Interface, Error> {
        if chain.contains(&iref) {
            return Err(Error::CyclicEmbedding {
                chain: chain
                    .iter()
                    .chain([&iref])
                    .map(ToString::to_string)
                    .collect(),
            });
        }

        let pkg = self.packages.load(&iref.import_path)?;
        let (file, spec) = pkg.lookup(&iref.identifier).ok_or_else(|| Error::TypeNotFound {
            import_path: iref.import_path.clone(),
            identifier:  iref.identifier.clone(),
        })?;
        let members = match &spec.ty {
            | Expr::Interface { methods, .. } => methods,
            | _ => {
                return Err(Error::NotAnInterface {
                    reference: iref.to_string(),
                })
            },
        };

        if !spec.type_params.is_empty() {
            tracing::warn!("ignoring type parameters of {iref}");
        }

        if members.is_empty() {
            return Err(Error::EmptyInterface {
                reference: iref.to_string(),
            });
        }

        chain.push(iref.clone());

        let mut funcs = Vec::with_capacity(members.len());

        for member in members {
            match (&member.names[..], &member.ty) {
                | ([name], Expr::Func { ty, .. }) => funcs.push(pkg.func(&name.name, ty)),
                | _ => match self.embedded(&pkg, file, member)? {
                    | Embedded::Interface(embedded) => {
                        tracing::debug!("expanding {embedded} embedded in {iref}");

                        funcs.extend(self.resolve(embedded, chain)?.funcs);
                    },
                    | Embedded::Funcs(predeclared) => funcs.extend(predeclared),
                },
            }
        }

        chain.pop();

        if funcs.is_empty() {
            return Err(Error::EmptyInterface {
                reference: iref.to_string(),
            });
        }

        Ok(Interface {
            reference: iref,
            package: pkg.name,
            funcs,
        })
    }

    /// Resolves an embedded member to the interface it names.
    fn embedded(&self, pkg: &LoadedPackage, file: &File, member: &Field) -> Result<Embedded, Error> {
        let not_an_interface = || {
            let reference = pkg.full_type(&member.ty);

            if let Some(position) = pkg.fset.position(member.ty.pos()) {
                tracing::debug!("{position}: embedded {reference} is not an interface");
            }

            Error::NotAnInterface { reference }
        };

        match &member.ty {
            | Expr::Paren { x, .. } => self.embedded(pkg, file, &Field::anonymous((**x).clone())),
            | Expr::Ident(ident) if pkg.lookup(&ident.name).is_none() => {
                match ident.name.as_str() {
                    | "error" => Ok(Embedded::Funcs(vec![Func {
                        name:    "Error".to_string(),
                        params:  Vec::new(),
                        results: vec![Param::new("", "string")],
                    }])),
                    | "any" => Ok(Embedded::Funcs(Vec::new())),
                    | name if PREDECLARED.contains(&name) => Err(not_an_interface()),
                    | name => Ok(Embedded::Interface(InterfaceRef::new(&pkg.import_path, name))),
                }
            },
            | Expr::Ident(ident) => Ok(Embedded::Interface(InterfaceRef::new(
                &pkg.import_path,
                &ident.name,
            ))),
            | Expr::Selector { x, sel } => {
                let Expr::Ident(qualifier) = &**x else {
                    return Err(not_an_interface());
                };

                match import_path(file, &qualifier.name) {
                    | Some(path) => Ok(Embedded::Interface(InterfaceRef::new(path, &sel.name))),
                    | None => {
                        let reference = pkg.full_type(&member.ty);

                        tracing::debug!("no import of {} in scope, inferring {reference}", qualifier.name);

                        Ok(Embedded::Interface(InterfaceRef::infer(&reference, self.formatter)?))
                    },
                }
            },
            | _ => Err(not_an_interface()),
        }
    }
}

impl LoadedPackage {
    fn func(&self, name: &str, ty: &FuncType) -> Func {
        Func {
            name:    name.to_string(),
            params:  self.params(&ty.params),
            results: self.params(&ty.results),
        }
    }

    /// One [`Param`] per declared name, or one unnamed param for an anonymous group.
    fn params(&self, fields: &[Field]) -> Vec<Param> {
        let mut params = Vec::new();

        for field in fields {
            let ty = self.full_type(&field.ty);

            if field.names.is_empty() {
                params.push(Param::new("", ty));
            } else {
                params.extend(field.names.iter().map(|name| Param::new(&name.name, &ty)));
            }
        }

        params
    }
}

/// Import path bound to `name` in `file`, by explicit alias or by the name the
/// package is assumed to declare.
fn import_path<'f>(file: &'f File, name: &str) -> Option<&'f str> {
    file.imports
        .iter()
        .find(|spec| match &spec.name {
            | Some(ImportName::Name(alias)) => alias.name == name,
            | Some(ImportName::Dot | ImportName::Blank) => false,
            | None => assumed_name(&spec.path) == name,
        })
        .map(|spec| spec.path.as_str())
}

/// `example.com/go-widgets/v2` is assumed to declare package `widgets`.
fn assumed_name(path: &str) -> &str {
    let mut elems = path.rsplit('/');
    let mut name = elems.next().unwrap_or(path);

    if is_major_version(name) {
        name = elems.next().unwrap_or(name);
    }

    let name = name.strip_prefix("go-").unwrap_or(name);

    name.split('.').next().unwrap_or(name)
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assumed_package_names() {
        let cases = [
            ("io", "io"),
            ("net/http", "http"),
            ("example.com/go-widgets/v2", "widgets"),
            ("gopkg.in/yaml.v3", "yaml"),
            ("github.com/x/v2ray", "v2ray"),
        ];

        for (path, want) in cases {
            assert_eq!(assumed_name(path), want, "{path}");
        }
    }
}
