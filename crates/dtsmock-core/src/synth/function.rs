//! Functions, enums, variables, type aliases and property values.

use super::{object_key, Emitter, Placement, Synth};
use crate::entity::{
    EnumEntity, EnumValue, FunctionGroup, ImportEqualsEntity, MemberKey, MethodEntity, ParameterEntity,
    PropertyEntity, ReturnTypeEntity, TypeAliasEntity, VariableDeclaratorEntity, VariableEntity,
};
use crate::naming::js_string;
use crate::resolve::ValueSite;
use crate::type_expr::{FnParam, TypeExpr, TypeKind};
use crate::warning::WarningKind;

impl<'a> Synth<'a> {
    /// `export function name(...args) {...}` for a module-less file.
    pub(super) fn function(&mut self, out: &mut Emitter, group: &'a FunctionGroup) {
        let owner = self.logical.clone();
        out.open(&format!("export function {}(...args) {{", group.name));
        self.stub_body(out, &owner, &group.name, &group.overloads);
        out.close("}");
    }

    /// `name: function (...args) {...},` inside a module object.
    pub(super) fn function_entry(&mut self, out: &mut Emitter, group: &'a FunctionGroup, owner: &str) {
        out.open(&format!("{}: function (...args) {{", plain_key(&group.name)));
        self.stub_body(out, owner, &group.name, &group.overloads);
        out.close("},");
    }

    pub(super) fn enumeration(&mut self, out: &mut Emitter, e: &'a EnumEntity, placement: Placement) {
        out.open(&format!("{} {} = {{", placement.keyword(), e.name));
        let mut next: Option<i64> = Some(0);
        for member in &e.members {
            let value = match &member.value {
                Some(EnumValue::Number(n)) => {
                    next = parse_int(n).and_then(|v| v.checked_add(1));
                    n.clone()
                }
                Some(EnumValue::String(s)) => {
                    next = None;
                    js_string(s)
                }
                Some(EnumValue::Expr(expr)) if is_constant_expr(expr) => {
                    next = None;
                    expr.clone()
                }
                Some(EnumValue::Expr(expr)) => {
                    next = None;
                    self.warn(
                        WarningKind::Simplified,
                        format!("{}.{} = {expr} is not a constant", e.name, member.name),
                    );
                    self.corpus.config.placeholder(&member.name)
                }
                None => match next {
                    Some(v) => {
                        next = v.checked_add(1);
                        v.to_string()
                    }
                    None => {
                        self.warn(
                            WarningKind::Simplified,
                            format!("{}.{} has no computable value", e.name, member.name),
                        );
                        self.corpus.config.placeholder(&member.name)
                    }
                },
            };
            out.line(&format!("{}: {value},", plain_key(&member.name)));
        }
        out.close("};");
    }

    pub(super) fn variable(&mut self, out: &mut Emitter, var: &'a VariableEntity, placement: Placement) {
        for declarator in &var.declarators {
            let value = self.declarator_value(declarator);
            out.line(&format!("{} {} = {value};", placement.keyword(), declarator.name));
        }
    }

    /// `name: value,` entries of a module object.
    pub(super) fn variable_entries(&mut self, out: &mut Emitter, var: &'a VariableEntity) {
        for declarator in &var.declarators {
            let value = self.declarator_value(declarator);
            out.line(&format!("{}: {value},", plain_key(&declarator.name)));
        }
    }

    fn declarator_value(&mut self, declarator: &VariableDeclaratorEntity) -> String {
        if let Some(init) = &declarator.init {
            return init.clone();
        }
        self.types.value(
            declarator.ty.as_ref(),
            ValueSite::Property(&declarator.name),
            &mut self.imports,
        )
    }

    pub(super) fn type_alias(&mut self, out: &mut Emitter, alias: &'a TypeAliasEntity, placement: Placement) {
        let value = match &alias.ty {
            TypeExpr::ImportType {
                path, qualifier, ..
            } => self.imports.resolve_import_type(path, qualifier),
            ty => self
                .types
                .value(Some(ty), ValueSite::Property(&alias.name), &mut self.imports),
        };
        out.line(&format!("{} {} = {value};", placement.keyword(), alias.name));
    }

    pub(super) fn import_equals(&mut self, out: &mut Emitter, import: &'a ImportEqualsEntity) {
        let value = self.imports.resolve_reference(&import.target);
        out.line(&format!("const {} = {value};", import.name));
    }

    /// Initial value of a property; function-typed properties become stubs.
    pub(super) fn property_value(&mut self, owner: &str, prop: &PropertyEntity) -> String {
        let Some(TypeExpr::Function { params, ret }) = &prop.ty else {
            return self.types.value(
                prop.ty.as_ref(),
                ValueSite::Property(&prop.name.text),
                &mut self.imports,
            );
        };
        let signature = MethodEntity {
            name: prop.name.clone(),
            params: params.iter().map(parameter).collect(),
            return_type: ReturnTypeEntity {
                raw: ret.to_string(),
                kind: ret.kind(),
                ty: Some((**ret).clone()),
            },
        };
        let mut inner = Emitter::default();
        inner.open("function (...args) {");
        self.stub_body(
            &mut inner,
            owner,
            &prop.name.lookup(),
            std::slice::from_ref(&signature),
        );
        inner.close("}");
        inner.finish_expr()
    }
}

fn parameter(param: &FnParam) -> ParameterEntity {
    ParameterEntity {
        name: param.name.clone(),
        raw_type: param.ty.as_ref().map(ToString::to_string).unwrap_or_default(),
        kind: param
            .ty
            .as_ref()
            .map(TypeExpr::kind)
            .unwrap_or(TypeKind::Missing),
        ty: param.ty.clone(),
        optional: false,
        rest: param.rest,
    }
}

/// Object key for a plain declared name.
pub(super) fn plain_key(name: &str) -> String {
    object_key(&MemberKey {
        text: name.to_string(),
        computed: false,
    })
}

fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    text.parse().ok()
}

/// Literal arithmetic such as `1 << 3` or `0x10 | 2`.
fn is_constant_expr(expr: &str) -> bool {
    expr.chars()
        .all(|c| c.is_ascii_alphanumeric() || " +-*/%<>|&^~().".contains(c))
        && expr
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .all(|word| word.starts_with(|c: char| c.is_ascii_digit()))
}
