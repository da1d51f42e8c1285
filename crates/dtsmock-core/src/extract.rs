//! Builds the entity tree from a parsed declaration file.
//!
//! Extraction is a pure function of the syntax tree and source text: it never
//! consults the scan snapshot, so running it twice on the same input yields
//! equal entities.

use crate::entity::*;
use crate::type_expr::{TypeExpr, TypeKind};
use crate::warning::{Warning, WarningKind};
use dtsmock_syntax::{
    ClassMember, DtsClass, DtsEnum, DtsExport, DtsFile, DtsImport, DtsInterface, DtsItem,
    DtsModule, DtsTypeAlias, DtsVariable, EnumInit, ImportEqualsTarget, InterfaceMember,
    MemberName, ModuleKind, Param, Reference, Span, TypeAnnotation, TypeParam, VariableKind,
};
use indexmap::IndexMap;
use std::path::Path;

/// Result of extracting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub entity: SourceFileEntity,
    pub warnings: Vec<Warning>,
}

/// Extract the entity tree of `file`, parsed from `src` at `path`.
pub fn extract(path: &Path, src: &str, file: &DtsFile) -> Extraction {
    let mut extractor = Extractor {
        path,
        src,
        warnings: Vec::new(),
    };

    let mut imports = Vec::new();
    let mut scope = Scope::default();
    extractor.extract_items(&file.items, &mut scope, &mut imports);

    let references = file
        .references
        .iter()
        .filter_map(|r| match r {
            Reference::Path(p) => Some(p.clone()),
            Reference::Types(_) => None,
        })
        .collect();

    Extraction {
        entity: SourceFileEntity {
            imports,
            exports: scope.exports,
            references,
            declarations: scope.declarations,
        },
        warnings: extractor.warnings,
    }
}

/// Declarations of one file or module body.
#[derive(Default)]
struct Scope {
    declarations: Vec<Declaration>,
    /// Function name -> index of its group in `declarations`.
    functions: IndexMap<String, usize>,
    exports: Vec<ExportEntity>,
}

impl Scope {
    fn push_function(&mut self, name: &str, modifiers: ModifierSet, signature: MethodEntity) {
        if let Some(&idx) = self.functions.get(name) {
            if let Some(Declaration::Function(group)) = self.declarations.get_mut(idx) {
                group.overloads.push(signature);
                return;
            }
        }
        self.functions.insert(name.to_string(), self.declarations.len());
        self.declarations.push(Declaration::Function(FunctionGroup {
            name: name.to_string(),
            modifiers,
            overloads: vec![signature],
        }));
    }
}

struct Extractor<'a> {
    path: &'a Path,
    src: &'a str,
    warnings: Vec<Warning>,
}

impl<'a> Extractor<'a> {
    fn skip(&mut self, span: Span, what: &str) {
        let text = span.text(self.src);
        let preview: String = text.lines().next().unwrap_or_default().chars().take(60).collect();
        tracing::warn!(
            file = %self.path.display(),
            span = ?(span.start..span.end),
            kind = what,
            "skipping declaration"
        );
        self.warnings.push(Warning::new(
            WarningKind::Skipped,
            format!("{}: skipped {what} `{preview}`", self.path.display()),
        ));
    }

    fn extract_items(
        &mut self,
        items: &[DtsItem],
        scope: &mut Scope,
        imports: &mut Vec<ImportElementEntity>,
    ) {
        for item in items {
            match item {
                DtsItem::Function(f) => {
                    if f.name.is_empty() {
                        self.skip(f.span, "anonymous function");
                        continue;
                    }
                    let signature =
                        self.signature(MemberName::ident(&f.name), &f.params, f.return_type.as_ref());
                    scope.push_function(&f.name, f.modifiers.into(), signature);
                }
                DtsItem::Interface(i) => scope.declarations.push(Declaration::Interface(self.interface(i))),
                DtsItem::TypeAlias(t) => scope.declarations.push(Declaration::TypeAlias(self.type_alias(t))),
                DtsItem::Class(c) => {
                    if c.name.is_empty() {
                        self.skip(c.span, "anonymous class");
                        continue;
                    }
                    scope.declarations.push(Declaration::Class(self.class(c)));
                }
                DtsItem::Enum(e) => scope.declarations.push(Declaration::Enum(self.enumeration(e))),
                DtsItem::Variable(v) => scope.declarations.push(Declaration::Variable(self.variable(v))),
                DtsItem::Module(m) if m.kind == ModuleKind::Global => {
                    if let Some(body) = &m.body {
                        self.extract_items(body, scope, imports);
                    }
                }
                DtsItem::Module(m) => {
                    let module = self.module(m, imports);
                    scope.declarations.push(Declaration::Module(module));
                }
                DtsItem::Import(i) => imports.push(import_entity(i)),
                DtsItem::ImportEquals(i) => match &i.target {
                    ImportEqualsTarget::Require(path) => imports.push(ImportElementEntity {
                        path: path.clone(),
                        default: Some(i.name.clone()),
                        namespace: None,
                        named: Vec::new(),
                    }),
                    ImportEqualsTarget::Entity(target) => {
                        scope.declarations.push(Declaration::ImportEquals(ImportEqualsEntity {
                            name: i.name.clone(),
                            modifiers: i.modifiers.into(),
                            target: target.clone(),
                        }))
                    }
                },
                DtsItem::Export(e) => scope.exports.push(export_entity(e)),
                DtsItem::Unsupported(span) => self.skip(*span, "unsupported statement"),
            }
        }
    }

    fn annotation(&self, ann: Option<&TypeAnnotation>) -> (String, TypeKind, Option<TypeExpr>) {
        match ann {
            Some(ann) => {
                let ty = TypeExpr::from_dts(&ann.ty);
                (ann.span.text(self.src).to_string(), ty.kind(), Some(ty))
            }
            None => (String::new(), TypeKind::Missing, None),
        }
    }

    fn param(&self, p: &Param) -> ParameterEntity {
        let (raw_type, kind, ty) = self.annotation(p.ty.as_ref());
        ParameterEntity {
            name: p.name.trim().to_string(),
            raw_type,
            kind,
            ty,
            optional: p.optional,
            rest: p.rest,
        }
    }

    fn signature(&self, name: MemberName, params: &[Param], ret: Option<&TypeAnnotation>) -> MethodEntity {
        let (raw, kind, ty) = self.annotation(ret);
        MethodEntity {
            name: member_key(&name),
            params: params.iter().map(|p| self.param(p)).collect(),
            return_type: ReturnTypeEntity { raw, kind, ty },
        }
    }

    fn property(
        &self,
        name: &MemberName,
        ty: Option<&TypeAnnotation>,
        optional: bool,
        readonly: bool,
    ) -> PropertyEntity {
        let (raw_type, kind, ty) = self.annotation(ty);
        PropertyEntity {
            name: member_key(name),
            raw_type,
            kind,
            ty,
            optional,
            readonly,
        }
    }

    fn heritage(&self, kind: HeritageKind, ann: &TypeAnnotation) -> HeritageEntity {
        let raw = ann.span.text(self.src).to_string();
        let name = match &ann.ty {
            dtsmock_syntax::DtsType::Named { name, .. } => name.clone(),
            _ => raw.split('<').next().unwrap_or_default().trim().to_string(),
        };
        HeritageEntity { kind, name, raw }
    }

    fn class(&self, c: &DtsClass) -> ClassEntity {
        let mut heritage = Vec::new();
        if let Some(base) = &c.extends {
            heritage.push(self.heritage(HeritageKind::Extends, base));
        }
        for ty in &c.implements {
            heritage.push(self.heritage(HeritageKind::Implements, ty));
        }

        let mut class = ClassEntity {
            name: c.name.clone(),
            modifiers: c.modifiers.into(),
            heritage,
            constructors: Vec::new(),
            properties: Vec::new(),
            methods: MethodGroups::new(),
            static_properties: Vec::new(),
            static_methods: MethodGroups::new(),
        };

        for member in &c.members {
            match member {
                ClassMember::Constructor(sig) => {
                    class.constructors.push(sig.params.iter().map(|p| self.param(p)).collect());
                }
                ClassMember::Property(p) => {
                    let prop = self.property(&p.name, p.ty.as_ref(), p.optional, p.readonly);
                    if p.is_static {
                        class.static_properties.push(prop);
                    } else {
                        class.properties.push(prop);
                    }
                }
                ClassMember::Method(m) => {
                    let sig = self.signature(m.name.clone(), &m.params, m.return_type.as_ref());
                    let groups = if m.is_static {
                        &mut class.static_methods
                    } else {
                        &mut class.methods
                    };
                    groups.entry(sig.name.lookup()).or_default().push(sig);
                }
                ClassMember::IndexSignature(_) => {}
            }
        }
        class
    }

    fn interface(&self, i: &DtsInterface) -> InterfaceEntity {
        let mut interface = InterfaceEntity {
            name: i.name.clone(),
            modifiers: i.modifiers.into(),
            type_params: type_param_names(&i.type_params),
            heritage: i
                .extends
                .iter()
                .map(|ty| self.heritage(HeritageKind::Extends, ty))
                .collect(),
            construct_signatures: Vec::new(),
            methods: MethodGroups::new(),
            properties: Vec::new(),
            call_signatures: Vec::new(),
            index_signatures: Vec::new(),
        };

        for member in &i.members {
            match member {
                InterfaceMember::Property(p) => {
                    interface
                        .properties
                        .push(self.property(&p.name, p.ty.as_ref(), p.optional, p.readonly));
                }
                InterfaceMember::Method(m) => {
                    let sig = self.signature(m.name.clone(), &m.params, m.return_type.as_ref());
                    interface.methods.entry(sig.name.lookup()).or_default().push(sig);
                }
                InterfaceMember::CallSignature(sig) => {
                    let sig = self.signature(MemberName::ident(""), &sig.params, sig.return_type.as_ref());
                    interface.call_signatures.push(sig);
                }
                InterfaceMember::ConstructSignature(sig) => {
                    let sig = self.signature(MemberName::ident("new"), &sig.params, sig.return_type.as_ref());
                    interface.construct_signatures.push(sig);
                }
                InterfaceMember::IndexSignature(sig) => {
                    let ty = TypeExpr::from_dts(&sig.value_type.ty);
                    interface.index_signatures.push(IndexSignatureEntity {
                        key: sig.key_name.clone(),
                        raw_type: sig.value_type.span.text(self.src).to_string(),
                        kind: ty.kind(),
                        ty,
                    });
                }
            }
        }
        interface
    }

    fn enumeration(&self, e: &DtsEnum) -> EnumEntity {
        EnumEntity {
            name: e.name.clone(),
            modifiers: e.modifiers.into(),
            is_const: e.is_const,
            members: e
                .members
                .iter()
                .map(|m| EnumMemberEntity {
                    name: m.name.clone(),
                    value: m.init.as_ref().map(|init| match init {
                        EnumInit::Number(n) => EnumValue::Number(n.clone()),
                        EnumInit::String(s) => EnumValue::String(s.clone()),
                        EnumInit::Expr(e) => EnumValue::Expr(e.clone()),
                    }),
                })
                .collect(),
        }
    }

    fn type_alias(&self, t: &DtsTypeAlias) -> TypeAliasEntity {
        let ty = TypeExpr::from_dts(&t.ty.ty);
        TypeAliasEntity {
            name: t.name.clone(),
            modifiers: t.modifiers.into(),
            type_params: type_param_names(&t.type_params),
            raw: t.ty.span.text(self.src).to_string(),
            kind: ty.kind(),
            ty,
        }
    }

    fn variable(&self, v: &DtsVariable) -> VariableEntity {
        VariableEntity {
            modifiers: v.modifiers.into(),
            is_const: v.kind == VariableKind::Const,
            declarators: v
                .declarators
                .iter()
                .map(|d| {
                    let (raw_type, kind, ty) = self.annotation(d.ty.as_ref());
                    VariableDeclaratorEntity {
                        name: d.name.clone(),
                        raw_type,
                        kind,
                        ty,
                        init: d.init.clone(),
                    }
                })
                .collect(),
        }
    }

    fn module(&mut self, m: &DtsModule, imports: &mut Vec<ImportElementEntity>) -> ModuleBlockEntity {
        let mut scope = Scope::default();
        if let Some(body) = &m.body {
            self.extract_items(body, &mut scope, imports);
        }
        ModuleBlockEntity {
            name: m.name.as_str().to_string(),
            modifiers: m.modifiers.into(),
            ambient: m.name.is_ambient(),
            exports: scope.exports,
            body: scope.declarations,
        }
    }
}

fn member_key(name: &MemberName) -> MemberKey {
    MemberKey {
        text: name.text.trim().to_string(),
        computed: name.computed,
    }
}

fn type_param_names(params: &[TypeParam]) -> Vec<String> {
    params.iter().map(|p| p.name.clone()).collect()
}

fn import_entity(i: &DtsImport) -> ImportElementEntity {
    ImportElementEntity {
        path: i.path.clone(),
        default: i.default.clone(),
        namespace: i.namespace.clone(),
        named: i
            .named
            .iter()
            .map(|s| ImportBinding {
                name: s.name.clone(),
                alias: s.alias.clone(),
            })
            .collect(),
    }
}

fn export_entity(e: &DtsExport) -> ExportEntity {
    match e {
        DtsExport::Equals(name) => ExportEntity::Equals { name: name.clone() },
        DtsExport::Default(name) => ExportEntity::Default { name: name.clone() },
        DtsExport::Named {
            specifiers,
            from,
            type_only,
        } => ExportEntity::Named {
            names: specifiers
                .iter()
                .map(|(name, alias)| alias.clone().unwrap_or_else(|| name.clone()))
                .collect(),
            from: from.clone(),
            type_only: *type_only,
        },
        DtsExport::All { alias, from } => ExportEntity::All {
            alias: alias.clone(),
            from: from.clone(),
        },
        DtsExport::AsNamespace(name) => ExportEntity::AsNamespace { name: name.clone() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_expr::Keyword;

    fn run(src: &str) -> Extraction {
        let file = dtsmock_syntax::parse(src).unwrap();
        extract(Path::new("test.d.ts"), src, &file)
    }

    #[test]
    fn test_overloads_keep_declaration_order() {
        let src = r#"
            declare namespace battery {
                function get(callback: AsyncCallback<number>): void;
                function other(): void;
                function get(): Promise<number>;
            }
        "#;
        let entity = run(src).entity;
        let Declaration::Module(module) = &entity.declarations[0] else {
            panic!("expected module");
        };
        assert_eq!(module.body.len(), 2);
        let Declaration::Function(group) = &module.body[0] else {
            panic!("expected function group");
        };
        assert_eq!(group.overloads.len(), 2);
        assert_eq!(group.overloads[0].params[0].name, "callback");
        assert_eq!(group.overloads[1].return_type.raw, "Promise<number>");
    }

    #[test]
    fn test_method_overloads_group_in_first_seen_order() {
        let src = r#"
            interface Player {
                on(type: 'play', cb: Callback<void>): void;
                play(): void;
                on(type: 'stop', cb: Callback<void>): void;
            }
        "#;
        let Declaration::Interface(iface) = &run(src).entity.declarations[0] else {
            panic!("expected interface");
        };
        let names: Vec<_> = iface.methods.keys().cloned().collect();
        assert_eq!(names, ["on", "play"]);
        assert_eq!(iface.methods["on"].len(), 2);
        assert_eq!(iface.methods["on"][1].params[0].raw_type, "'stop'");
    }

    #[test]
    fn test_raw_type_text_and_kind() {
        let src = "declare class Img { read(buf: ArrayBuffer, opts?: { a: number }): Promise<Array<string>>; }";
        let Declaration::Class(class) = &run(src).entity.declarations[0] else {
            panic!("expected class");
        };
        let read = &class.methods["read"][0];
        assert_eq!(read.params[1].raw_type, "{ a: number }");
        assert_eq!(read.params[1].kind, TypeKind::TypeLiteral);
        assert!(read.params[1].optional);
        assert_eq!(read.return_type.kind, TypeKind::Reference);
    }

    #[test]
    fn test_static_members_are_separated() {
        let src = "declare class Fetch { static fetch(o: Options): void; static VERSION: string; ok: boolean; }";
        let Declaration::Class(class) = &run(src).entity.declarations[0] else {
            panic!("expected class");
        };
        assert!(class.static_methods.contains_key("fetch"));
        assert_eq!(class.static_properties.len(), 1);
        assert_eq!(class.properties.len(), 1);
    }

    #[test]
    fn test_computed_member_names() {
        let src = "interface It { [Symbol.iterator](): IterableIterator<string>; }";
        let Declaration::Interface(iface) = &run(src).entity.declarations[0] else {
            panic!("expected interface");
        };
        let (key, methods) = iface.methods.first().unwrap();
        assert_eq!(key, "[Symbol.iterator]");
        assert!(methods[0].name.computed);
        assert_eq!(methods[0].name.text, "Symbol.iterator");
    }

    #[test]
    fn test_global_is_flattened_and_require_becomes_import() {
        let src = r#"
            import fs = require('fs');
            declare global {
                interface Window { title: string; }
            }
        "#;
        let entity = run(src).entity;
        assert_eq!(entity.imports.len(), 1);
        assert_eq!(entity.imports[0].default.as_deref(), Some("fs"));
        assert!(matches!(&entity.declarations[0], Declaration::Interface(i) if i.name == "Window"));
    }

    #[test]
    fn test_unsupported_statement_warns_and_contributes_nothing() {
        let extraction = run("foo();\ndeclare const x: number;");
        assert_eq!(extraction.entity.declarations.len(), 1);
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].kind, WarningKind::Skipped);
    }

    #[test]
    fn test_type_alias_model() {
        let Declaration::TypeAlias(alias) = &run("type Mode = 'a' | 'b';").entity.declarations[0] else {
            panic!("expected alias");
        };
        assert_eq!(alias.kind, TypeKind::Union);
        assert_eq!(alias.raw, "'a' | 'b'");

        let Declaration::Variable(var) = &run("declare const n: number;").entity.declarations[0] else {
            panic!("expected variable");
        };
        assert_eq!(var.declarators[0].ty, Some(TypeExpr::keyword(Keyword::Number)));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let src = r#"
            import { Callback } from './@ohos.base';
            /// <reference path="./other.d.ts" />
            declare namespace a { class B extends C { m(): void; } enum E { X = 1, Y } }
            export default a;
        "#;
        assert_eq!(run(src), run(src));
    }
}
