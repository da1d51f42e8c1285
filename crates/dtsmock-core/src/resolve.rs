//! Type-driven default values.
//!
//! [`TypeResolver::resolve`] never fails: every shape it does not recognise
//! falls back to a placeholder string naming what was expected.

use crate::entity::ParameterEntity;
use crate::imports::ImportResolver;
use crate::naming::is_generic_symbol;
use crate::scan::Corpus;
use crate::type_expr::{Keyword, Literal, TypeExpr};

/// The error-like object passed first to error-first callbacks.
pub const CALLBACK_ERROR: &str = "{'code': '','data': '','name': '','message': '','stack': ''}";

const CONSTRUCTED: [&str; 6] = ["Set", "WeakMap", "WeakSet", "Date", "Error", "RegExp"];

const ZERO_LENGTH: [&str; 13] = [
    "ArrayBuffer",
    "SharedArrayBuffer",
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
    "BigInt64Array",
    "BigUint64Array",
];

/// Where the value is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSite<'n> {
    /// `return <value>` of a stub.
    Return,
    /// An object or class property with the given name.
    Property(&'n str),
    /// An argument handed to a callback.
    Argument,
}

/// Result of resolving a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockValue {
    /// `void`: a stub returns nothing.
    NoValue,
    Expr(String),
}

impl MockValue {
    /// The expression, with `undefined` standing in for no value.
    pub fn into_expr(self) -> String {
        match self {
            MockValue::NoValue => "undefined".to_string(),
            MockValue::Expr(expr) => expr,
        }
    }
}

pub struct TypeResolver<'a> {
    corpus: Corpus<'a>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(corpus: Corpus<'a>) -> Self {
        Self { corpus }
    }

    fn placeholder(&self, what: &str) -> String {
        self.corpus.config.placeholder(what)
    }

    /// Placeholder for an unknown value at `site`.
    fn unknown(&self, site: ValueSite<'_>) -> String {
        match site {
            ValueSite::Property(name) => self.placeholder(name),
            _ => self.placeholder("type"),
        }
    }

    /// Shorthand for [`resolve`](Self::resolve) followed by [`MockValue::into_expr`].
    pub fn value(&self, ty: Option<&TypeExpr>, site: ValueSite<'_>, imports: &mut ImportResolver<'_>) -> String {
        self.resolve(ty, site, imports).into_expr()
    }

    pub fn resolve(
        &self,
        ty: Option<&TypeExpr>,
        site: ValueSite<'_>,
        imports: &mut ImportResolver<'_>,
    ) -> MockValue {
        let Some(ty) = ty else {
            return MockValue::Expr(self.placeholder("type"));
        };
        let expr = match ty {
            TypeExpr::Keyword { keyword } => return self.keyword(*keyword, site),
            TypeExpr::Reference { name, args } => self.reference(name, args, site, imports),
            TypeExpr::Union { members } => return self.union(members, site, imports),
            TypeExpr::Intersection { members } => return self.resolve(members.first(), site, imports),
            TypeExpr::ArrayOf { element } => self.array(Some(element)),
            TypeExpr::Tuple { elements } => {
                let values: Vec<String> = elements
                    .iter()
                    .map(|e| self.value(Some(e), ValueSite::Argument, imports))
                    .collect();
                format!("[{}]", values.join(", "))
            }
            TypeExpr::Function { .. } => self.unknown(site),
            TypeExpr::ObjectLiteral => "{}".to_string(),
            TypeExpr::Literal { literal } => literal_value(literal),
            TypeExpr::ImportType { path, qualifier, .. } => imports.resolve_import_type(path, qualifier),
            TypeExpr::This => "this".to_string(),
            TypeExpr::Other { text } => self.placeholder(text),
        };
        MockValue::Expr(expr)
    }

    fn keyword(&self, keyword: Keyword, site: ValueSite<'_>) -> MockValue {
        let expr = match keyword {
            Keyword::String => match site {
                ValueSite::Property(name) => self.placeholder(name),
                _ => "''".to_string(),
            },
            Keyword::Number => "0".to_string(),
            Keyword::BigInt => "0n".to_string(),
            Keyword::Boolean => "true".to_string(),
            Keyword::Void | Keyword::Never => match site {
                ValueSite::Return => return MockValue::NoValue,
                _ => "undefined".to_string(),
            },
            Keyword::Null => "null".to_string(),
            Keyword::Undefined => "undefined".to_string(),
            Keyword::Any | Keyword::Unknown => self.unknown(site),
            Keyword::Object => "{}".to_string(),
            Keyword::Symbol => "Symbol()".to_string(),
        };
        MockValue::Expr(expr)
    }

    fn reference(
        &self,
        name: &str,
        args: &[TypeExpr],
        site: ValueSite<'_>,
        imports: &mut ImportResolver<'_>,
    ) -> String {
        if is_generic_symbol(name) {
            return self.unknown(site);
        }
        if let Some(value) = self.library_shape(name, args, site, imports) {
            return value;
        }
        let overrides = self.corpus.overrides;
        if let Some(factory) = overrides.factory(name) {
            return factory.to_string();
        }
        if !name.contains('.') && self.corpus.snapshot.is_class(name) {
            return format!("new {}()", imports.resolve_reference(name));
        }
        if let Some(value) = overrides.value(name, &self.corpus.config.placeholder_tag) {
            return value;
        }
        imports.resolve_reference(name)
    }

    /// Built-in generic and runtime types.
    fn library_shape(
        &self,
        name: &str,
        args: &[TypeExpr],
        site: ValueSite<'_>,
        imports: &mut ImportResolver<'_>,
    ) -> Option<String> {
        let value = match name {
            "Promise" => format!(
                "new Promise((resolve, reject) => {{\n    resolve({});\n}})",
                self.placeholder("type")
            ),
            "Array" | "ReadonlyArray" => self.array(args.first()),
            "Map" | "ReadonlyMap" => "{key: {}}".to_string(),
            "Record" => "{}".to_string(),
            "String" => self.value(Some(&TypeExpr::keyword(Keyword::String)), site, imports),
            "Number" => "0".to_string(),
            "Boolean" => "true".to_string(),
            "Readonly" => match args.first() {
                Some(TypeExpr::Reference { name, args }) if args.is_empty() => name.clone(),
                other => self.value(other, site, imports),
            },
            "IterableIterator" | "Iterator" => self.iterator(args),
            _ if CONSTRUCTED.contains(&name) => format!("new {name}()"),
            _ if ZERO_LENGTH.contains(&name) => format!("new {name}(0)"),
            _ => return None,
        };
        Some(value)
    }

    fn array(&self, element: Option<&TypeExpr>) -> String {
        let inner = match element {
            Some(TypeExpr::Keyword { keyword }) => match keyword {
                Keyword::String => "''",
                Keyword::Number => "0",
                Keyword::Boolean => "true",
                Keyword::Object => "{}",
                _ => "",
            },
            _ => "",
        };
        format!("[{inner}]")
    }

    /// An object that yields one value, then reports completion forever.
    fn iterator(&self, args: &[TypeExpr]) -> String {
        let pair = args.len() > 1 || matches!(args.first(), Some(TypeExpr::Tuple { elements }) if elements.len() > 1);
        let value = if pair {
            format!("[{}, {}]", self.placeholder("key"), self.placeholder("value"))
        } else {
            self.placeholder("type")
        };
        format!(
            "(() => {{
    let index = 0;
    return {{
        *[Symbol.iterator]() {{
            yield {value};
        }},
        next: () => {{
            if (index < 1) {{
                index++;
                return {{ value: {value}, done: false }};
            }}
            return {{ done: true }};
        }}
    }};
}})()"
        )
    }

    fn union(&self, members: &[TypeExpr], site: ValueSite<'_>, imports: &mut ImportResolver<'_>) -> MockValue {
        let chosen = members
            .iter()
            .find(|m| !m.is_array_like() && !m.is_generic())
            .or_else(|| members.first());
        match chosen {
            Some(TypeExpr::Literal {
                literal: Literal::String(s),
            }) => MockValue::Expr(double_quoted(s)),
            Some(member) => self.resolve(Some(member), site, imports),
            None => MockValue::Expr(self.unknown(site)),
        }
    }

    /// Arguments a stub passes to its trailing callback parameter.
    pub fn callback_args(&self, param: &ParameterEntity, imports: &mut ImportResolver<'_>) -> Vec<String> {
        let data = |resolver: &Self, args: &[TypeExpr], imports: &mut ImportResolver<'_>| {
            args.first()
                .filter(|ty| !ty.is_void())
                .map(|ty| resolver.value(Some(ty), ValueSite::Argument, imports))
        };
        match &param.ty {
            Some(TypeExpr::Reference { name, args }) => match name.as_str() {
                "AsyncCallback" => std::iter::once(CALLBACK_ERROR.to_string())
                    .chain(data(self, args, imports))
                    .collect(),
                "Callback" => data(self, args, imports).into_iter().collect(),
                "ErrorCallback" => vec![CALLBACK_ERROR.to_string()],
                _ => Vec::new(),
            },
            Some(TypeExpr::Function { params, .. }) => params
                .iter()
                .map(|p| self.value(p.ty.as_ref(), ValueSite::Argument, imports))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn literal_value(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => double_quoted(s),
        Literal::Number(n) => n.clone(),
        Literal::Bool(b) => b.to_string(),
    }
}

fn double_quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
