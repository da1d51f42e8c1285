//! Namespaces and modules become `mock<Name>()` factories.

use super::class::bases_first;
use super::function::plain_key;
use super::{Emitter, Placement, Synth};
use crate::entity::{Declaration, ModuleBlockEntity};
use crate::index::Table;
use crate::naming::{factory_name, sanitize_ident, upper_first};

/// Rendering order inside any scope; enums come first so later initializers can use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Enum,
    ImportEquals,
    TypeAlias,
    Class,
    Interface,
    Module,
}

const ORDER: [Category; 6] = [
    Category::Enum,
    Category::ImportEquals,
    Category::TypeAlias,
    Category::Class,
    Category::Interface,
    Category::Module,
];

fn category(decl: &Declaration) -> Option<Category> {
    match decl {
        Declaration::Enum(_) => Some(Category::Enum),
        Declaration::ImportEquals(_) => Some(Category::ImportEquals),
        Declaration::TypeAlias(_) => Some(Category::TypeAlias),
        Declaration::Class(_) => Some(Category::Class),
        Declaration::Interface(_) => Some(Category::Interface),
        Declaration::Module(_) => Some(Category::Module),
        Declaration::Function(_) | Declaration::Variable(_) => None,
    }
}

/// Non-exported declarations live inside the factory.
fn inside_factory(decl: &Declaration) -> Option<Placement> {
    match decl {
        Declaration::Class(_) | Declaration::Interface(_) | Declaration::Enum(_)
            if !decl.modifiers().export =>
        {
            Some(Placement::Local)
        }
        Declaration::Module(_) => Some(Placement::Local),
        _ => None,
    }
}

/// Exported declarations, aliases and import-equals sit next to the factory.
fn beside_factory(decl: &Declaration) -> Option<Placement> {
    match decl {
        Declaration::Class(_) | Declaration::Interface(_) | Declaration::Enum(_)
            if decl.modifiers().export =>
        {
            Some(Placement::Export)
        }
        Declaration::TypeAlias(alias) if alias.modifiers.export => Some(Placement::Export),
        Declaration::TypeAlias(_) | Declaration::ImportEquals(_) => Some(Placement::Local),
        _ => None,
    }
}

fn everything(decl: &Declaration) -> Option<Placement> {
    category(decl).map(|_| Placement::Local)
}

/// Names a module object re-exposes: its classes, interfaces, enums, aliases and sub-modules.
fn export_names(body: &[Declaration]) -> Vec<String> {
    body.iter()
        .filter_map(|decl| match decl {
            Declaration::Class(c) => Some(upper_first(&c.name)),
            Declaration::Interface(i) => Some(i.name.clone()),
            Declaration::Enum(e) => Some(e.name.clone()),
            Declaration::TypeAlias(t) => Some(t.name.clone()),
            Declaration::Module(m) => Some(sanitize_ident(&m.name)),
            _ => None,
        })
        .collect()
}

impl<'a> Synth<'a> {
    pub(super) fn module(&mut self, out: &mut Emitter, module: &'a ModuleBlockEntity, first: bool) {
        let factory = factory_name(&module.name);
        let object = sanitize_ident(&module.name);
        if !module.is_ambient_string_module() && self.is_marker_file() {
            self.register(Table::Napi, &factory);
        }

        out.open(&format!("export function {factory}() {{"));
        if first && self.is_system_file() {
            let last = self.last_segment().to_string();
            self.systemplugin_table(out, &last);
            self.register(Table::System, &factory);
        }
        self.scope(out, &module.body, inside_factory);

        out.open(&format!("const {object} = {{"));
        let entity = self.entity;
        for decl in &module.body {
            if let Declaration::Variable(var) = decl {
                self.variable_entries(out, var);
            }
        }
        for decl in &entity.declarations {
            match decl {
                Declaration::Function(group) => self.function_entry(out, group, &object),
                Declaration::Variable(var) => self.variable_entries(out, var),
                _ => {}
            }
        }
        for decl in &module.body {
            if let Declaration::Function(group) = decl {
                self.function_entry(out, group, &object);
            }
        }
        if !module.ambient {
            for name in export_names(&module.body) {
                out.line(&format!("{}: {name},", plain_key(&name)));
            }
        }
        out.close("};");
        out.line(&format!("return {object};"));
        out.close("}");
        self.file_scope.insert(factory);

        for decl in &module.body {
            if let Some(Placement::Export) = beside_factory(decl) {
                if let Some(name) = decl.name() {
                    let name = match decl {
                        Declaration::Class(_) => upper_first(name),
                        _ => name.to_string(),
                    };
                    self.file_scope.insert(name);
                }
            }
        }
        out.blank();
        self.scope(out, &module.body, beside_factory);
    }

    /// Render the declarations `pick` selects, grouped by [`Category`].
    fn scope(
        &mut self,
        out: &mut Emitter,
        body: &'a [Declaration],
        pick: fn(&Declaration) -> Option<Placement>,
    ) {
        let ordered = bases_first(body);
        for wanted in ORDER {
            for &decl in &ordered {
                if category(decl) != Some(wanted) {
                    continue;
                }
                let Some(placement) = pick(decl) else {
                    continue;
                };
                match decl {
                    Declaration::Enum(e) => self.enumeration(out, e, placement),
                    Declaration::ImportEquals(import) => self.import_equals(out, import),
                    Declaration::TypeAlias(alias) => self.type_alias(out, alias, placement),
                    Declaration::Class(class) => self.class(out, class, body, placement),
                    Declaration::Interface(iface) => self.interface(out, iface, body, placement),
                    Declaration::Module(nested) => self.nested_module(out, nested),
                    Declaration::Function(_) | Declaration::Variable(_) => {}
                }
                out.blank();
            }
        }
    }

    /// A namespace inside a module: an immediately invoked function returning its object.
    fn nested_module(&mut self, out: &mut Emitter, module: &'a ModuleBlockEntity) {
        let object = sanitize_ident(&module.name);
        out.open(&format!("const {object} = (() => {{"));
        self.scope(out, &module.body, everything);
        out.open("return {");
        for decl in &module.body {
            match decl {
                Declaration::Variable(var) => self.variable_entries(out, var),
                Declaration::Function(group) => self.function_entry(out, group, &object),
                _ => {}
            }
        }
        for name in export_names(&module.body) {
            out.line(&format!("{}: {name},", plain_key(&name)));
        }
        out.close("};");
        out.close("})();");
    }
}
