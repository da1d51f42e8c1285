//! Syntax tree for TypeScript declaration files.
//!
//! Declarations carry the byte spans the extractor needs to recover verbatim
//! type text; nested [`DtsType`] nodes are structural only.

use std::fmt;

/// A half-open byte range into the parsed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The trimmed source text covered by this span.
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        src.get(self.start..self.end).unwrap_or_default().trim()
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end.max(self.start))
    }
}

/// A parsed .d.ts file.
#[derive(Debug, Clone, PartialEq)]
pub struct DtsFile {
    /// Triple-slash directives in source order.
    pub references: Vec<Reference>,
    pub items: Vec<DtsItem>,
}

/// A `/// <reference ... />` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Path(String),
    Types(String),
}

/// Declaration modifiers that influence where generated code is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub export: bool,
    pub declare: bool,
    pub default: bool,
}

/// A top-level or module-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DtsItem {
    Function(DtsFunction),
    Interface(DtsInterface),
    TypeAlias(DtsTypeAlias),
    Class(DtsClass),
    Enum(DtsEnum),
    Variable(DtsVariable),
    Module(DtsModule),
    Import(DtsImport),
    ImportEquals(DtsImportEquals),
    Export(DtsExport),
    /// A statement the parser recognised only well enough to skip.
    Unsupported(Span),
}

/// `declare function name<T>(params): ReturnType;`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsFunction {
    pub modifiers: Modifiers,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnnotation>,
    pub span: Span,
}

/// `interface Name<T> extends Base { members }`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsInterface {
    pub modifiers: Modifiers,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeAnnotation>,
    pub members: Vec<InterfaceMember>,
    pub span: Span,
}

/// `type Name<T> = Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsTypeAlias {
    pub modifiers: Modifiers,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeAnnotation,
    pub span: Span,
}

/// `declare class Name<T> extends Base implements Interface { members }`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsClass {
    pub modifiers: Modifiers,
    /// Empty for `export default class { ... }`.
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<TypeAnnotation>,
    pub implements: Vec<TypeAnnotation>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

/// `declare enum Name { A, B = 2, C = "c" }`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsEnum {
    pub modifiers: Modifiers,
    pub name: String,
    pub is_const: bool,
    pub members: Vec<EnumMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub init: Option<EnumInit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumInit {
    Number(String),
    String(String),
    /// Any other initializer, kept as trimmed source text.
    Expr(String),
}

/// `declare const a: A, b: B;`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsVariable {
    pub modifiers: Modifiers,
    pub kind: VariableKind,
    pub declarators: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    /// Initializer source text, e.g. `const VERSION = "1.0";`
    pub init: Option<String>,
}

/// `namespace A { }`, `module "x" { }` or `declare global { }`.
///
/// Dotted names (`namespace A.B {}`) parse as nested modules.
#[derive(Debug, Clone, PartialEq)]
pub struct DtsModule {
    pub modifiers: Modifiers,
    pub name: ModuleName,
    pub kind: ModuleKind,
    /// `None` for shorthand ambient modules (`declare module "x";`).
    pub body: Option<Vec<DtsItem>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleName {
    Ident(String),
    /// A quoted name; ambient modules describe an external package.
    String(String),
}

impl ModuleName {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleName::Ident(s) | ModuleName::String(s) => s,
        }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self, ModuleName::String(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Namespace,
    Module,
    Global,
}

/// An ES import declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DtsImport {
    pub type_only: bool,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportSpecifier>,
    /// Module specifier with quotes removed.
    pub path: String,
    pub span: Span,
}

/// `name` or `name as alias` inside import braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub name: String,
    pub alias: Option<String>,
    pub type_only: bool,
}

impl ImportSpecifier {
    /// The identifier this specifier binds in the importing file.
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `import name = require("path");` or `import name = A.B;`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsImportEquals {
    pub modifiers: Modifiers,
    pub name: String,
    pub target: ImportEqualsTarget,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEqualsTarget {
    Require(String),
    Entity(String),
}

/// An export statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DtsExport {
    /// `export = name;`
    Equals(String),
    /// `export default name;`
    Default(String),
    /// `export { name, name2 as alias } [from "path"];`
    Named {
        specifiers: Vec<(String, Option<String>)>,
        from: Option<String>,
        type_only: bool,
    },
    /// `export * [as ns] from "path";`
    All { alias: Option<String>, from: String },
    /// `export as namespace Name;`
    AsNamespace(String),
}

/// A generic type parameter with optional constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<DtsType>,
    pub default: Option<DtsType>,
}

/// A type in annotation position together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub ty: DtsType,
    pub span: Span,
}

/// A function/method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Identifier, or the source text of a destructuring pattern.
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    pub optional: bool,
    pub rest: bool,
}

/// A member name; computed names keep the text between the brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberName {
    pub text: String,
    pub computed: bool,
}

impl MemberName {
    pub fn ident(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            computed: false,
        }
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.computed {
            write!(f, "[{}]", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

/// A member of an interface or object literal type.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceMember {
    Property(PropertyMember),
    Method(MethodMember),
    CallSignature(CallSignature),
    ConstructSignature(CallSignature),
    IndexSignature(IndexSignature),
}

/// `name?: Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMember {
    pub name: MemberName,
    pub ty: Option<TypeAnnotation>,
    pub optional: bool,
    pub readonly: bool,
}

/// `name<T>(params): ReturnType;`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMember {
    pub name: MemberName,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnnotation>,
    pub optional: bool,
}

/// `(params): ReturnType;`, also used for construct signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSignature {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnnotation>,
}

/// `[key: string]: Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSignature {
    pub key_name: String,
    pub key_type: TypeAnnotation,
    pub value_type: TypeAnnotation,
    pub readonly: bool,
}

/// A member of a class.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Property(ClassProperty),
    Method(ClassMethod),
    Constructor(CallSignature),
    IndexSignature(IndexSignature),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProperty {
    pub name: MemberName,
    pub ty: Option<TypeAnnotation>,
    pub optional: bool,
    pub readonly: bool,
    pub is_static: bool,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMethod {
    pub name: MemberName,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnnotation>,
    pub optional: bool,
    pub is_static: bool,
    pub visibility: Visibility,
}

/// Visibility modifier for class members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// A TypeScript type.
#[derive(Debug, Clone, PartialEq)]
pub enum DtsType {
    /// A possibly qualified name with type arguments: `Promise<T>`, `a.B`
    Named {
        name: String,
        type_args: Vec<DtsType>,
    },
    /// `string`, `number`, `boolean`, `void`, ...
    Primitive(Primitive),
    /// `"GET"`
    StringLiteral(String),
    /// `1`, `-1`
    NumberLiteral(String),
    /// `true`, `false`
    BooleanLiteral(bool),
    /// `A | B | C`
    Union(Vec<DtsType>),
    /// `A & B & C`
    Intersection(Vec<DtsType>),
    /// `(a: T, b: U) => R` and `new (a: T) => R`
    Function(Box<FunctionType>),
    /// `{ key: Type, key2?: Type2 }`
    Object(Vec<InterfaceMember>),
    /// `T[]`
    Array(Box<DtsType>),
    /// `[T, U, V]`
    Tuple(Vec<TupleElement>),
    /// `typeof foo.bar`
    TypeOf(String),
    /// `keyof T`
    KeyOf(Box<DtsType>),
    /// `T[K]`
    IndexAccess {
        object: Box<DtsType>,
        index: Box<DtsType>,
    },
    /// `T extends U ? X : Y`
    Conditional {
        check: Box<DtsType>,
        extends: Box<DtsType>,
        true_type: Box<DtsType>,
        false_type: Box<DtsType>,
    },
    /// `{ [K in keyof T]: T[K] }`
    Mapped {
        key_name: String,
        key_constraint: Box<DtsType>,
        value_type: Box<DtsType>,
    },
    /// `infer T`
    Infer(String),
    /// `` `prefix_${T}` `` kept as its raw body.
    TemplateLiteral(String),
    /// `import("path").A.B<T>`
    Import {
        path: String,
        qualifier: Vec<String>,
        type_args: Vec<DtsType>,
    },
    /// `x is T` or `asserts x is T`
    Predicate {
        param: String,
        ty: Option<Box<DtsType>>,
    },
    /// `(T)`
    Parenthesized(Box<DtsType>),
    /// `this`
    This,
}

/// A primitive TypeScript type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
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

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Void => "void",
            Primitive::Null => "null",
            Primitive::Undefined => "undefined",
            Primitive::Any => "any",
            Primitive::Unknown => "unknown",
            Primitive::Never => "never",
            Primitive::Object => "object",
            Primitive::Symbol => "symbol",
            Primitive::BigInt => "bigint",
        };
        f.write_str(s)
    }
}

/// `(params) => ReturnType`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Box<DtsType>,
    pub is_constructor: bool,
}

/// An element in a tuple type.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub ty: DtsType,
    pub name: Option<String>,
    pub optional: bool,
    pub rest: bool,
}
