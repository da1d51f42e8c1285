//! Mock code synthesis for one extracted file.
//!
//! The body is rendered first so every import it asks for is known before
//! the header is written. Rendering never fails; anything that cannot be
//! expressed faithfully becomes a placeholder plus a [`Warning`].

mod class;
mod function;
mod interface;
mod module;

use crate::entity::{Declaration, ExportEntity, MemberKey, MethodEntity, SourceFileEntity};
use crate::imports::ImportResolver;
use crate::index::{Registration, Table};
use crate::naming::{factory_name, js_string, sanitize_ident, upper_first};
use crate::paths::logical_name_of;
use crate::resolve::{MockValue, TypeResolver, ValueSite};
use crate::scan::Corpus;
use crate::warning::{Warning, WarningKind};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

const INDENT: &str = "    ";

/// Generated code for one file plus what it asks of the rest of the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthOutput {
    pub code: String,
    pub registrations: Vec<Registration>,
    /// Files this one imports from and that must be generated too.
    pub scheduled: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Render the mock module for `entity`, which was extracted from `path`.
pub fn synthesize<'a>(corpus: Corpus<'a>, path: &'a Path, entity: &'a SourceFileEntity) -> SynthOutput {
    let heritage = heritage_names(&entity.declarations);
    let mut synth = Synth {
        corpus,
        types: TypeResolver::new(corpus),
        imports: ImportResolver::new(corpus, path, &entity.imports, heritage),
        entity,
        path,
        logical: logical_name_of(path, &corpus.config.scoped_marker),
        file_scope: IndexSet::new(),
        registrations: Vec::new(),
        warnings: Vec::new(),
    };

    let mut body = Emitter::default();
    synth.file(&mut body);

    let translated: Vec<String> = entity
        .imports
        .iter()
        .filter_map(|import| synth.imports.translate_import(import))
        .collect();
    let outcome = synth.imports.finish();
    let header: IndexSet<String> = outcome.imports.into_iter().chain(translated).collect();

    let mut code = String::new();
    for statement in &header {
        code.push_str(statement);
        code.push('\n');
    }
    if !header.is_empty() {
        code.push('\n');
    }
    code.push_str(&body.finish());

    let mut warnings = synth.warnings;
    warnings.extend(outcome.warnings);
    SynthOutput {
        code,
        registrations: synth.registrations,
        scheduled: outcome.scheduled,
        warnings,
    }
}

/// Indentation-aware line writer.
#[derive(Debug, Default)]
pub(crate) struct Emitter {
    out: String,
    level: usize,
}

impl Emitter {
    /// Write `text` at the current level; embedded newlines keep their relative indentation.
    pub fn line(&mut self, text: &str) {
        for line in text.lines() {
            if !line.is_empty() {
                for _ in 0..self.level {
                    self.out.push_str(INDENT);
                }
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }

    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.level += 1;
    }

    pub fn close(&mut self, text: &str) {
        self.level = self.level.saturating_sub(1);
        self.line(text);
    }

    /// `}, {` style lines that end one block and start the next.
    pub fn reopen(&mut self, text: &str) {
        self.close(text);
        self.level += 1;
    }

    /// A separating empty line, never doubled and never leading.
    pub fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// The output with exactly one trailing newline.
    pub fn finish(self) -> String {
        let trimmed = self.out.trim_end_matches('\n');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}\n")
        }
    }

    /// The output as an expression, without its trailing newline.
    pub fn finish_expr(self) -> String {
        self.out.trim_end().to_string()
    }
}

/// `export const` or `const` for a rendered binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Export,
    Local,
}

impl Placement {
    fn keyword(self) -> &'static str {
        match self {
            Placement::Export => "export const",
            Placement::Local => "const",
        }
    }
}

pub(crate) struct Synth<'a> {
    corpus: Corpus<'a>,
    types: TypeResolver<'a>,
    imports: ImportResolver<'a>,
    entity: &'a SourceFileEntity,
    path: &'a Path,
    logical: String,
    /// Names bound at the top level of the generated file.
    file_scope: IndexSet<String>,
    registrations: Vec<Registration>,
    warnings: Vec<Warning>,
}

impl<'a> Synth<'a> {
    fn warn(&mut self, kind: WarningKind, message: String) {
        tracing::warn!(file = %self.path.display(), kind = ?kind, "{message}");
        self.warnings.push(Warning::new(kind, message));
    }

    fn register(&mut self, table: Table, factory: &str) {
        let registration = Registration {
            table,
            factory: factory.to_string(),
        };
        if !self.registrations.contains(&registration) {
            self.registrations.push(registration);
        }
    }

    /// Final `_` segment of the logical name, e.g. `battery` for `ohos_battery`.
    fn last_segment(&self) -> &str {
        self.logical.rsplit('_').next().unwrap_or(&self.logical)
    }

    fn is_system_file(&self) -> bool {
        self.corpus.config.is_system_file(&self.logical)
    }

    /// Does the file name itself start with the module marker (`@ohos.battery.d.ts`)?
    fn is_marker_file(&self) -> bool {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&self.corpus.config.module_marker))
    }

    fn has_modules(&self) -> bool {
        self.entity
            .declarations
            .iter()
            .any(|d| matches!(d, Declaration::Module(_)))
    }

    fn file(&mut self, out: &mut Emitter) {
        let entity = self.entity;
        let has_modules = self.has_modules();
        let mut elements: Vec<String> = Vec::new();
        let mut first_module = true;

        for decl in class::bases_first(&entity.declarations) {
            match decl {
                Declaration::Module(module) => {
                    self.module(out, module, first_module);
                    first_module = false;
                }
                Declaration::Class(class) => {
                    let m = class.modifiers;
                    let placement = if m.export || m.declare || m.default {
                        Placement::Export
                    } else {
                        Placement::Local
                    };
                    self.class(out, class, &entity.declarations, placement);
                    elements.push(upper_first(&class.name));
                }
                Declaration::Interface(iface) => {
                    self.interface(out, iface, &entity.declarations, Placement::Export);
                    elements.push(iface.name.clone());
                }
                Declaration::Enum(e) => {
                    self.enumeration(out, e, Placement::Export);
                    elements.push(e.name.clone());
                }
                Declaration::TypeAlias(alias) => {
                    self.type_alias(out, alias, Placement::Export);
                    elements.push(alias.name.clone());
                }
                Declaration::Function(group) if !has_modules => {
                    self.function(out, group);
                    elements.push(group.name.clone());
                }
                Declaration::Variable(var) if !has_modules => {
                    self.variable(out, var, Placement::Export);
                    elements.extend(var.declarators.iter().map(|d| d.name.clone()));
                }
                // Folded into the module objects instead.
                Declaration::Function(_) | Declaration::Variable(_) => continue,
                Declaration::ImportEquals(import) => {
                    self.import_equals(out, import);
                    self.file_scope.insert(import.name.clone());
                }
            }
            out.blank();
        }
        self.file_scope.extend(elements.iter().cloned());

        if !has_modules && self.corpus.config.has_factory_prefix(&self.logical) {
            self.file_factory(out, &elements);
            out.blank();
        }
        self.exports(out);
    }

    /// `mock<Last>()` wrapping every top-level element of a module-less file.
    fn file_factory(&mut self, out: &mut Emitter, elements: &[String]) {
        let last = self.last_segment().to_string();
        let upper = upper_first(&sanitize_ident(&last));
        let factory = format!("mock{upper}");
        let object = format!("mockModule{upper}");

        out.open(&format!("export function {factory}() {{"));
        if self.is_system_file() {
            self.systemplugin_table(out, &last);
            self.register(Table::System, &factory);
        } else if self
            .logical
            .starts_with(&self.corpus.config.reverse_domain_prefix)
        {
            self.register(Table::Napi, &factory);
        }
        out.open(&format!("const {object} = {{"));
        for element in elements {
            out.line(&format!("{element}: {element},"));
        }
        out.close("};");
        if elements.iter().any(|e| *e == upper) {
            out.line(&format!("return {object}.{upper};"));
        } else {
            out.line(&format!("return {object};"));
        }
        out.close("}");
        self.file_scope.insert(factory);
    }

    /// `global.systemplugin.<name> = {...}` from the static methods of the default class.
    fn systemplugin_table(&mut self, out: &mut Emitter, name: &str) {
        let entity = self.entity;
        let class = entity.declarations.iter().find_map(|d| match d {
            Declaration::Class(c) if c.modifiers.default => Some(c),
            _ => None,
        });
        out.open(&format!("global.systemplugin.{name} = {{"));
        if let Some(class) = class {
            for (key, overloads) in &class.static_methods {
                out.open(&format!("{}: function (...args) {{", object_key(&overloads[0].name)));
                self.stub_body(out, name, key, overloads);
                out.close("},");
            }
        }
        out.close("};");
    }

    fn exports(&mut self, out: &mut Emitter) {
        let entity = self.entity;
        let mut default_done = entity
            .declarations
            .iter()
            .any(|d| matches!(d, Declaration::Class(c) if c.modifiers.default));

        for export in &entity.exports {
            match export {
                ExportEntity::Default { name } | ExportEntity::Equals { name } => {
                    if default_done {
                        continue;
                    }
                    let module = entity.declarations.iter().find_map(|d| match d {
                        Declaration::Module(m) if m.name == *name => Some(m),
                        _ => None,
                    });
                    let target = if let Some(module) = module {
                        Some(factory_name(&module.name))
                    } else if self.file_scope.contains(name) {
                        Some(name.clone())
                    } else {
                        let upper = upper_first(name);
                        self.file_scope.contains(&upper).then_some(upper)
                    };
                    match target {
                        Some(target) => {
                            out.line(&format!("export default {target};"));
                            default_done = true;
                        }
                        None => self.warn(
                            WarningKind::Skipped,
                            format!("default export `{name}` has no generated counterpart"),
                        ),
                    }
                }
                ExportEntity::All { alias, from } => {
                    match self.imports.translate_export_path(from) {
                        Some(path) => match alias {
                            Some(alias) => out.line(&format!("export * as {alias} from '{path}';")),
                            None => out.line(&format!("export * from '{path}';")),
                        },
                        None => self.warn(
                            WarningKind::Missing,
                            format!("re-export source `{from}` is not part of the corpus"),
                        ),
                    }
                }
                ExportEntity::Named { .. } | ExportEntity::AsNamespace { .. } => {}
            }
        }
    }

    /// Body shared by every stubbed callable: warn, call back, return.
    fn stub_body(&mut self, out: &mut Emitter, owner: &str, member: &str, overloads: &[MethodEntity]) {
        out.line(&warn_statement(owner, member));

        let callback = overloads
            .iter()
            .find_map(|o| o.params.last().filter(|p| p.is_callback()));
        if let Some(param) = callback {
            let mut args = vec!["this".to_string()];
            args.extend(self.types.callback_args(param, &mut self.imports));
            out.open("if (args && typeof args[args.length - 1] === 'function') {");
            out.line(&format!("args[args.length - 1].call({});", args.join(", ")));
            out.close("}");
        }

        for overload in overloads {
            let value = self.types.resolve(
                overload.return_type.ty.as_ref(),
                ValueSite::Return,
                &mut self.imports,
            );
            if let MockValue::Expr(expr) = value {
                out.line(&format!("return {expr};"));
                break;
            }
        }
    }
}

/// The console warning every stub starts with.
pub(crate) fn warn_statement(owner: &str, member: &str) -> String {
    let message = format!(
        "The {owner}.{member} interface in the Previewer is a mocked implementation and may behave differently than on a real device."
    );
    format!("console.warn({});", js_string(&message))
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Key of an object-literal entry or class method.
pub(crate) fn object_key(key: &MemberKey) -> String {
    if key.computed {
        format!("[{}]", key.text)
    } else if is_identifier(&key.text) {
        key.text.clone()
    } else {
        js_string(&key.text)
    }
}

/// `target.key`, `target['key']` or `target[expr]`.
pub(crate) fn member_access(target: &str, key: &MemberKey) -> String {
    if key.computed {
        format!("{target}[{}]", key.text)
    } else if is_identifier(&key.text) {
        format!("{target}.{}", key.text)
    } else {
        format!("{target}[{}]", js_string(&key.text))
    }
}

/// Every name used in a class heritage clause, plus the head of dotted names.
fn heritage_names(decls: &[Declaration]) -> IndexSet<String> {
    let mut names = IndexSet::new();
    for decl in decls {
        match decl {
            Declaration::Class(class) => {
                for heritage in &class.heritage {
                    names.insert(heritage.name.clone());
                    if let Some((head, _)) = heritage.name.split_once('.') {
                        names.insert(head.to_string());
                    }
                }
            }
            Declaration::Module(module) => names.extend(heritage_names(&module.body)),
            _ => {}
        }
    }
    names
}
