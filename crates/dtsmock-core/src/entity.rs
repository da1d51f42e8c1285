//! The entity tree produced by the extractor.
//!
//! Entities are plain data: every raw type text is kept next to its parsed
//! [`TypeExpr`] so warnings and placeholders can quote the declaration.

use crate::type_expr::{TypeExpr, TypeKind};
use indexmap::IndexMap;
use serde::Serialize;

/// Everything declared in one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceFileEntity {
    pub imports: Vec<ImportElementEntity>,
    pub exports: Vec<ExportEntity>,
    /// `/// <reference path>` targets as written.
    pub references: Vec<String>,
    pub declarations: Vec<Declaration>,
}

/// One declaration in a file or module body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "declaration", rename_all = "snake_case")]
pub enum Declaration {
    Class(ClassEntity),
    Interface(InterfaceEntity),
    Enum(EnumEntity),
    Function(FunctionGroup),
    TypeAlias(TypeAliasEntity),
    Module(ModuleBlockEntity),
    Variable(VariableEntity),
    ImportEquals(ImportEqualsEntity),
}

impl Declaration {
    /// The declared name; variables have one name per declarator.
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Class(c) => Some(&c.name),
            Declaration::Interface(i) => Some(&i.name),
            Declaration::Enum(e) => Some(&e.name),
            Declaration::Function(f) => Some(&f.name),
            Declaration::TypeAlias(t) => Some(&t.name),
            Declaration::Module(m) => Some(&m.name),
            Declaration::ImportEquals(i) => Some(&i.name),
            Declaration::Variable(_) => None,
        }
    }

    pub fn modifiers(&self) -> ModifierSet {
        match self {
            Declaration::Class(c) => c.modifiers,
            Declaration::Interface(i) => i.modifiers,
            Declaration::Enum(e) => e.modifiers,
            Declaration::Function(f) => f.modifiers,
            Declaration::TypeAlias(t) => t.modifiers,
            Declaration::Module(m) => m.modifiers,
            Declaration::Variable(v) => v.modifiers,
            Declaration::ImportEquals(i) => i.modifiers,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModifierSet {
    pub export: bool,
    pub declare: bool,
    pub default: bool,
}

impl From<dtsmock_syntax::Modifiers> for ModifierSet {
    fn from(m: dtsmock_syntax::Modifiers) -> Self {
        Self {
            export: m.export,
            declare: m.declare,
            default: m.default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeritageKind {
    Extends,
    Implements,
}

/// One type named in an `extends`/`implements` clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeritageEntity {
    pub kind: HeritageKind,
    /// Name without type arguments.
    pub name: String,
    pub raw: String,
}

/// A property or member name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberKey {
    pub text: String,
    /// `[Symbol.iterator]` style names; `text` holds the inner expression.
    pub computed: bool,
}

impl MemberKey {
    /// Key used for overload grouping and shadowing.
    pub fn lookup(&self) -> String {
        if self.computed {
            format!("[{}]", self.text)
        } else {
            self.text.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterEntity {
    pub name: String,
    pub raw_type: String,
    pub kind: TypeKind,
    pub ty: Option<TypeExpr>,
    pub optional: bool,
    pub rest: bool,
}

impl ParameterEntity {
    /// Does the name suggest the argument is a completion callback?
    pub fn is_callback(&self) -> bool {
        self.name.to_ascii_lowercase().contains("callback")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnTypeEntity {
    pub raw: String,
    pub kind: TypeKind,
    pub ty: Option<TypeExpr>,
}

impl ReturnTypeEntity {
    pub fn missing() -> Self {
        Self {
            raw: String::new(),
            kind: TypeKind::Missing,
            ty: None,
        }
    }
}

/// One signature of a method, function or call signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodEntity {
    pub name: MemberKey,
    pub params: Vec<ParameterEntity>,
    pub return_type: ReturnTypeEntity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyEntity {
    pub name: MemberKey,
    pub raw_type: String,
    pub kind: TypeKind,
    pub ty: Option<TypeExpr>,
    pub optional: bool,
    pub readonly: bool,
}

/// Overloads grouped by name, in first-seen order.
pub type MethodGroups = IndexMap<String, Vec<MethodEntity>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntity {
    pub name: String,
    pub modifiers: ModifierSet,
    pub heritage: Vec<HeritageEntity>,
    pub constructors: Vec<Vec<ParameterEntity>>,
    pub properties: Vec<PropertyEntity>,
    pub methods: MethodGroups,
    pub static_properties: Vec<PropertyEntity>,
    pub static_methods: MethodGroups,
}

impl ClassEntity {
    /// The `extends` base, if any.
    pub fn base(&self) -> Option<&HeritageEntity> {
        self.heritage.iter().find(|h| h.kind == HeritageKind::Extends)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSignatureEntity {
    pub key: String,
    pub raw_type: String,
    pub kind: TypeKind,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceEntity {
    pub name: String,
    pub modifiers: ModifierSet,
    pub type_params: Vec<String>,
    pub heritage: Vec<HeritageEntity>,
    pub construct_signatures: Vec<MethodEntity>,
    pub methods: MethodGroups,
    pub properties: Vec<PropertyEntity>,
    pub call_signatures: Vec<MethodEntity>,
    pub index_signatures: Vec<IndexSignatureEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EnumValue {
    Number(String),
    String(String),
    Expr(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMemberEntity {
    pub name: String,
    pub value: Option<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumEntity {
    pub name: String,
    pub modifiers: ModifierSet,
    pub is_const: bool,
    pub members: Vec<EnumMemberEntity>,
}

/// Same-named function declarations in one scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionGroup {
    pub name: String,
    pub modifiers: ModifierSet,
    pub overloads: Vec<MethodEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAliasEntity {
    pub name: String,
    pub modifiers: ModifierSet,
    pub type_params: Vec<String>,
    pub raw: String,
    pub kind: TypeKind,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaratorEntity {
    pub name: String,
    pub raw_type: String,
    pub kind: TypeKind,
    pub ty: Option<TypeExpr>,
    /// Initializer source text.
    pub init: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableEntity {
    pub modifiers: ModifierSet,
    pub is_const: bool,
    pub declarators: Vec<VariableDeclaratorEntity>,
}

/// `import X = A.B;` inside a module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportEqualsEntity {
    pub name: String,
    pub modifiers: ModifierSet,
    pub target: String,
}

/// A namespace or module block; owns its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleBlockEntity {
    /// Name without quotes.
    pub name: String,
    pub modifiers: ModifierSet,
    /// `declare module "name"` rather than an identifier.
    pub ambient: bool,
    pub exports: Vec<ExportEntity>,
    pub body: Vec<Declaration>,
}

impl ModuleBlockEntity {
    /// Registered in the napi table only when declared with an identifier name.
    pub fn is_ambient_string_module(&self) -> bool {
        self.ambient && self.modifiers.declare
    }
}

/// A named binding in an import clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBinding {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportBinding {
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportElementEntity {
    pub path: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportBinding>,
}

impl ImportElementEntity {
    /// Every local name the import introduces.
    pub fn bound_names(&self) -> impl Iterator<Item = &str> {
        self.default
            .as_deref()
            .into_iter()
            .chain(self.namespace.as_deref())
            .chain(self.named.iter().map(ImportBinding::local))
    }

    pub fn binds(&self, name: &str) -> bool {
        self.bound_names().any(|n| n == name)
    }

    /// A lone default import such as `import image from '...'`.
    pub fn is_default_only(&self) -> bool {
        self.default.is_some() && self.namespace.is_none() && self.named.is_empty()
    }

    /// The import clause in canonical spelling: `X, { a, b as c }`, `* as ns`.
    pub fn clause(&self) -> String {
        let mut parts = Vec::new();
        if let Some(default) = &self.default {
            parts.push(default.clone());
        }
        if let Some(namespace) = &self.namespace {
            parts.push(format!("* as {namespace}"));
        }
        if !self.named.is_empty() {
            let names: Vec<String> = self
                .named
                .iter()
                .map(|b| match &b.alias {
                    Some(alias) => format!("{} as {}", b.name, alias),
                    None => b.name.clone(),
                })
                .collect();
            parts.push(format!("{{ {} }}", names.join(", ")));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportEntity {
    /// `export default name;`
    Default { name: String },
    /// `export = name;`
    Equals { name: String },
    Named {
        names: Vec<String>,
        from: Option<String>,
        type_only: bool,
    },
    All {
        alias: Option<String>,
        from: String,
    },
    AsNamespace { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_clause_spelling() {
        let import = ImportElementEntity {
            path: "./x".into(),
            default: Some("Ctx".into()),
            namespace: None,
            named: vec![
                ImportBinding {
                    name: "A".into(),
                    alias: None,
                },
                ImportBinding {
                    name: "B".into(),
                    alias: Some("_B".into()),
                },
            ],
        };
        assert_eq!(import.clause(), "Ctx, { A, B as _B }");
        assert!(import.binds("_B"));
        assert!(!import.binds("B"));
        assert!(!import.is_default_only());
    }

    #[test]
    fn test_callback_parameter_detection() {
        let param = ParameterEntity {
            name: "asyncCallback".into(),
            raw_type: "AsyncCallback<void>".into(),
            kind: TypeKind::Reference,
            ty: None,
            optional: false,
            rest: false,
        };
        assert!(param.is_callback());
    }
}
