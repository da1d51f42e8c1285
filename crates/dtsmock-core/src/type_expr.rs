//! Canonical model of a declared type, built once from the syntax tree.

use dtsmock_syntax::{DtsType, FunctionType, Primitive};
use serde::Serialize;
use std::fmt;

/// A primitive keyword type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    String,
    Number,
    Boolean,
    Void,
    Null,
    Undefined,
    Any,
    Unknown,
    Never,
    Object,
    Symbol,
    BigInt,
}

impl From<Primitive> for Keyword {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::String => Keyword::String,
            Primitive::Number => Keyword::Number,
            Primitive::Boolean => Keyword::Boolean,
            Primitive::Void => Keyword::Void,
            Primitive::Null => Keyword::Null,
            Primitive::Undefined => Keyword::Undefined,
            Primitive::Any => Keyword::Any,
            Primitive::Unknown => Keyword::Unknown,
            Primitive::Never => Keyword::Never,
            Primitive::Object => Keyword::Object,
            Primitive::Symbol => Keyword::Symbol,
            Primitive::BigInt => Keyword::BigInt,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Keyword::String => "string",
            Keyword::Number => "number",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
            Keyword::Any => "any",
            Keyword::Unknown => "unknown",
            Keyword::Never => "never",
            Keyword::Object => "object",
            Keyword::Symbol => "symbol",
            Keyword::BigInt => "bigint",
        };
        f.write_str(s)
    }
}

/// A literal type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Literal {
    /// Unquoted contents.
    String(String),
    Number(String),
    Bool(bool),
}

/// A parameter of a function type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnParam {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub rest: bool,
}

/// The shapes type resolution branches on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    Keyword { keyword: Keyword },
    /// A possibly dotted name with type arguments.
    Reference { name: String, args: Vec<TypeExpr> },
    Union { members: Vec<TypeExpr> },
    Intersection { members: Vec<TypeExpr> },
    ArrayOf { element: Box<TypeExpr> },
    Tuple { elements: Vec<TypeExpr> },
    Function { params: Vec<FnParam>, ret: Box<TypeExpr> },
    /// `{ ... }` including mapped types.
    ObjectLiteral,
    Literal { literal: Literal },
    /// `import('path').A.B<T>`
    ImportType {
        path: String,
        qualifier: Vec<String>,
        args: Vec<TypeExpr>,
    },
    /// `this` in return position.
    This,
    /// Anything else, kept as a short description.
    Other { text: String },
}

/// Coarse syntax-kind tag stored next to raw type text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Missing,
    Keyword,
    Reference,
    Union,
    Intersection,
    Array,
    Tuple,
    Function,
    TypeLiteral,
    Literal,
    ImportType,
    Other,
}

impl TypeExpr {
    pub fn keyword(keyword: Keyword) -> Self {
        TypeExpr::Keyword { keyword }
    }

    pub fn reference(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Reference {
            name: name.into(),
            args,
        }
    }

    /// Build the model from a syntax-tree type.
    pub fn from_dts(ty: &DtsType) -> Self {
        match ty {
            DtsType::Primitive(p) => TypeExpr::keyword((*p).into()),
            DtsType::Named { name, type_args } => {
                TypeExpr::reference(name.clone(), type_args.iter().map(Self::from_dts).collect())
            }
            DtsType::StringLiteral(s) => TypeExpr::Literal {
                literal: Literal::String(s.clone()),
            },
            DtsType::NumberLiteral(n) => TypeExpr::Literal {
                literal: Literal::Number(n.clone()),
            },
            DtsType::BooleanLiteral(b) => TypeExpr::Literal {
                literal: Literal::Bool(*b),
            },
            DtsType::Union(types) => TypeExpr::Union {
                members: types.iter().map(Self::from_dts).collect(),
            },
            DtsType::Intersection(types) => TypeExpr::Intersection {
                members: types.iter().map(Self::from_dts).collect(),
            },
            DtsType::Array(inner) => TypeExpr::ArrayOf {
                element: Box::new(Self::from_dts(inner)),
            },
            DtsType::Tuple(elements) => TypeExpr::Tuple {
                elements: elements.iter().map(|e| Self::from_dts(&e.ty)).collect(),
            },
            DtsType::Function(f) => Self::from_function(f),
            DtsType::Object(_) | DtsType::Mapped { .. } => TypeExpr::ObjectLiteral,
            DtsType::Import {
                path,
                qualifier,
                type_args,
            } => TypeExpr::ImportType {
                path: path.clone(),
                qualifier: qualifier.clone(),
                args: type_args.iter().map(Self::from_dts).collect(),
            },
            DtsType::Parenthesized(inner) => Self::from_dts(inner),
            // Type guards evaluate to a boolean at runtime.
            DtsType::Predicate { ty: Some(_), .. } => TypeExpr::keyword(Keyword::Boolean),
            DtsType::Predicate { ty: None, .. } => TypeExpr::keyword(Keyword::Void),
            DtsType::This => TypeExpr::This,
            DtsType::TypeOf(name) => TypeExpr::Other {
                text: format!("typeof {name}"),
            },
            DtsType::KeyOf(_) => TypeExpr::Other { text: "keyof".into() },
            DtsType::IndexAccess { .. } => TypeExpr::Other {
                text: "indexed".into(),
            },
            DtsType::Conditional { .. } => TypeExpr::Other {
                text: "conditional".into(),
            },
            DtsType::Infer(name) => TypeExpr::Other { text: name.clone() },
            DtsType::TemplateLiteral(_) => TypeExpr::keyword(Keyword::String),
        }
    }

    fn from_function(f: &FunctionType) -> Self {
        let params = f
            .params
            .iter()
            .map(|p| FnParam {
                name: p.name.clone(),
                ty: p.ty.as_ref().map(|t| Self::from_dts(&t.ty)),
                rest: p.rest,
            })
            .collect();
        if f.is_constructor {
            return TypeExpr::Other {
                text: "constructor".into(),
            };
        }
        TypeExpr::Function {
            params,
            ret: Box::new(Self::from_dts(&f.return_type)),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeExpr::Keyword { .. } => TypeKind::Keyword,
            TypeExpr::Reference { .. } => TypeKind::Reference,
            TypeExpr::Union { .. } => TypeKind::Union,
            TypeExpr::Intersection { .. } => TypeKind::Intersection,
            TypeExpr::ArrayOf { .. } => TypeKind::Array,
            TypeExpr::Tuple { .. } => TypeKind::Tuple,
            TypeExpr::Function { .. } => TypeKind::Function,
            TypeExpr::ObjectLiteral => TypeKind::TypeLiteral,
            TypeExpr::Literal { .. } => TypeKind::Literal,
            TypeExpr::ImportType { .. } => TypeKind::ImportType,
            TypeExpr::This | TypeExpr::Other { .. } => TypeKind::Other,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self,
            TypeExpr::Keyword {
                keyword: Keyword::Void | Keyword::Never
            }
        )
    }

    /// `T[]`, `Array<T>` and friends.
    pub fn is_array_like(&self) -> bool {
        match self {
            TypeExpr::ArrayOf { .. } | TypeExpr::Tuple { .. } => true,
            TypeExpr::Reference { name, .. } => name == "Array" || name == "ReadonlyArray",
            _ => false,
        }
    }

    /// A reference carrying type arguments.
    pub fn is_generic(&self) -> bool {
        matches!(self, TypeExpr::Reference { args, .. } if !args.is_empty())
    }

    /// The referenced name, for reference types.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Reference { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeExpr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Keyword { keyword } => write!(f, "{keyword}"),
            TypeExpr::Reference { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeExpr::Union { members } => write_list(f, members, " | "),
            TypeExpr::Intersection { members } => write_list(f, members, " & "),
            TypeExpr::ArrayOf { element } => match **element {
                TypeExpr::Union { .. } | TypeExpr::Intersection { .. } | TypeExpr::Function { .. } => {
                    write!(f, "({element})[]")
                }
                _ => write!(f, "{element}[]"),
            },
            TypeExpr::Tuple { elements } => {
                f.write_str("[")?;
                write_list(f, elements, ", ")?;
                f.write_str("]")
            }
            TypeExpr::Function { params, ret } => {
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if param.rest {
                        f.write_str("...")?;
                    }
                    f.write_str(&param.name)?;
                    if let Some(ty) = &param.ty {
                        write!(f, ": {ty}")?;
                    }
                }
                write!(f, ") => {ret}")
            }
            TypeExpr::ObjectLiteral => f.write_str("{...}"),
            TypeExpr::Literal { literal } => match literal {
                Literal::String(s) => write!(f, "'{s}'"),
                Literal::Number(n) => f.write_str(n),
                Literal::Bool(b) => write!(f, "{b}"),
            },
            TypeExpr::ImportType {
                path,
                qualifier,
                args,
            } => {
                write!(f, "import('{path}')")?;
                for q in qualifier {
                    write!(f, ".{q}")?;
                }
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeExpr::This => f.write_str("this"),
            TypeExpr::Other { text } => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtsmock_syntax::{parse, DtsItem};

    fn alias_type(src: &str) -> TypeExpr {
        let file = parse(src).unwrap();
        match &file.items[0] {
            DtsItem::TypeAlias(alias) => TypeExpr::from_dts(&alias.ty.ty),
            other => panic!("expected type alias, got {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_is_unwrapped() {
        let ty = alias_type("type A = (string);");
        assert_eq!(ty, TypeExpr::keyword(Keyword::String));
    }

    #[test]
    fn test_display_round_trips_common_shapes() {
        assert_eq!(alias_type("type A = Map<string, Array<number>>;").to_string(), "Map<string, Array<number>>");
        assert_eq!(alias_type("type A = (string | number)[];").to_string(), "(string | number)[]");
        assert_eq!(alias_type("type A = 'a' | 3;").to_string(), "'a' | 3");
        assert_eq!(
            alias_type("type A = (err: Error, data?: string) => void;").to_string(),
            "(err: Error, data: string) => void"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(alias_type("type A = string;").kind(), TypeKind::Keyword);
        assert_eq!(alias_type("type A = B.C;").kind(), TypeKind::Reference);
        assert_eq!(alias_type("type A = { a: string };").kind(), TypeKind::TypeLiteral);
        assert_eq!(alias_type("type A = import('./x').Y;").kind(), TypeKind::ImportType);
        assert_eq!(alias_type("type A = [string, number];").kind(), TypeKind::Tuple);
    }

    #[test]
    fn test_predicates() {
        let ty = alias_type("type G = (x: unknown) => x is string;");
        let TypeExpr::Function { ret, .. } = ty else {
            panic!("expected function");
        };
        assert_eq!(*ret, TypeExpr::keyword(Keyword::Boolean));
    }

    #[test]
    fn test_array_and_generic_predicates() {
        assert!(alias_type("type A = string[];").is_array_like());
        assert!(alias_type("type A = Array<string>;").is_array_like());
        assert!(alias_type("type A = Promise<void>;").is_generic());
        assert!(!alias_type("type A = Foo;").is_generic());
    }
}
