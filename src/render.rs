use std::collections::HashSet;

use serde::Serialize;
use tera::Tera;

use crate::{
    extract::{Method, Param},
    format::SourceFormatter,
    Error,
};

static STUB_TMPL: &str = include_str!("stub.go.tera.tmpl");

const NUMERIC: &[&str] = &[
    "byte", "complex64", "complex128", "float32", "float64", "int", "int8", "int16", "int32",
    "int64", "rune", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
];

/// Everything the stub template needs.
#[derive(Clone, Debug)]
pub struct StubSpec {
    pub recv:      String,
    pub package:   String,
    /// Qualified name of the stubbed interface, returned as the receiver itself.
    pub interface: String,
    pub methods:   Vec<Method>,
}

#[derive(Serialize, Debug)]
struct MethodView<'a> {
    name:     &'a str,
    recv:     &'a str,
    this:     &'a str,
    params:   String,
    results:  String,
    args:     String,
    defaults: String,
}

/// Expands the stub template and hands the result to `formatter`.
pub fn render(spec: &StubSpec, formatter: &dyn SourceFormatter) -> Result<String, Error> {
    let buffer = expand(spec)?;

    tracing::debug!(recv = %spec.recv, methods = spec.methods.len(), "formatting stub");

    formatter
        .process(&buffer)
        .map_err(|source| Error::RenderFailure { source, buffer })
}

/// The unformatted stub source.
pub fn expand(spec: &StubSpec) -> Result<String, tera::Error> {
    let methods = spec
        .methods
        .iter()
        .map(|method| view(method, &spec.interface))
        .collect::<Vec<_>>();
    let mut ctx = tera::Context::new();

    ctx.insert("package", &spec.package);
    ctx.insert("recv", &spec.recv);
    ctx.insert("interface", &spec.interface);
    ctx.insert("methods", &methods);

    Tera::one_off(STUB_TMPL, &ctx, false)
}

fn view<'a>(method: &'a Method, interface: &str) -> MethodView<'a> {
    let func = &method.func;
    let names = param_names(&func.params);
    let this = ["t", "stub", "s", "self"]
        .into_iter()
        .find(|this| !names.iter().any(|name| name.as_str() == *this))
        .unwrap_or("t_");
    let params = names
        .iter()
        .zip(&func.params)
        .map(|(name, param)| format!("{name} {}", param.ty))
        .collect::<Vec<_>>();
    let args = names
        .iter()
        .zip(&func.params)
        .map(|(name, param)| match param.is_variadic() {
            | true => format!("{name}..."),
            | false => name.clone(),
        })
        .collect::<Vec<_>>();
    let results = match func.results.is_empty() {
        | true => String::new(),
        | false => format!(
            " ({},)",
            func.results
                .iter()
                .map(|result| result.ty.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let defaults = func
        .results
        .iter()
        .map(|result| zero_value(&result.ty, interface, this))
        .collect::<Vec<_>>();

    MethodView {
        name: &func.name,
        recv: &method.recv,
        this,
        params: params.join(", "),
        results,
        args: args.join(", "),
        defaults: defaults.join(", "),
    }
}

/// Parameter names usable in a forwarding call: anonymous and blank
/// parameters become `p0`, `p1`, ... by position.
fn param_names(params: &[Param]) -> Vec<String> {
    let taken = params
        .iter()
        .map(|param| param.name.as_str())
        .collect::<HashSet<_>>();

    params
        .iter()
        .enumerate()
        .map(|(i, param)| match param.name.as_str() {
            | "" | "_" => {
                let mut name = format!("p{i}");

                while taken.contains(name.as_str()) {
                    name.push('_');
                }

                name
            },
            | name => name.to_string(),
        })
        .collect()
}

/// Go expression for the zero value of `ty`. A result of the stubbed
/// interface's own type evaluates to the receiver `this`.
pub fn zero_value(ty: &str, interface: &str, this: &str) -> String {
    if ty == interface {
        return this.to_string();
    }

    match ty {
        | "error" | "any" => return "nil".to_string(),
        | "bool" => return "false".to_string(),
        | "string" => return r#""""#.to_string(),
        | ty if NUMERIC.contains(&ty) => return "0".to_string(),
        | _ => (),
    }

    if let Some(elem) = ty.strip_prefix('*') {
        return match has_composite_literal(elem) {
            | true => format!("&{elem}{{}}"),
            | false => format!("new({elem})"),
        };
    }

    let nilable = ["[]", "map[", "chan ", "chan<- ", "<-chan ", "func(", "interface{"];

    if nilable.iter().any(|prefix| ty.starts_with(prefix)) {
        return "nil".to_string();
    }

    format!("{ty}{{}}")
}

fn has_composite_literal(ty: &str) -> bool {
    let predeclared = ["bool", "string", "error", "any"];
    let no_literal = ["*", "chan ", "chan<- ", "<-chan ", "func(", "interface{"];

    !(predeclared.contains(&ty)
        || NUMERIC.contains(&ty)
        || no_literal.iter().any(|prefix| ty.starts_with(prefix)))
}
