//! Cross-file reference resolution and import bookkeeping for one file.

use crate::entity::ImportElementEntity;
use crate::naming::{factory_name, starts_lowercase, upper_first};
use crate::overrides::ImportAction;
use crate::paths::{generated_module, logical_name, normalize_path, relative_module_path};
use crate::scan::Corpus;
use crate::warning::{Warning, WarningKind};
use indexmap::IndexSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// What resolving a file's references produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    /// Synthesized import statements, deduplicated, in first-request order.
    pub imports: Vec<String>,
    /// Files that must be generated for those imports to resolve.
    pub scheduled: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Resolves names that cross file boundaries for the file at `current`.
pub struct ImportResolver<'a> {
    corpus: Corpus<'a>,
    current: &'a Path,
    imports: &'a [ImportElementEntity],
    /// Names used in `extends`/`implements` clauses of the file.
    heritage: IndexSet<String>,
    synthesized: IndexSet<String>,
    scheduled: IndexSet<PathBuf>,
    warnings: Vec<Warning>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(
        corpus: Corpus<'a>,
        current: &'a Path,
        imports: &'a [ImportElementEntity],
        heritage: IndexSet<String>,
    ) -> Self {
        Self {
            corpus,
            current,
            imports,
            heritage,
            synthesized: IndexSet::new(),
            scheduled: IndexSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn corpus(&self) -> Corpus<'a> {
        self.corpus
    }

    pub fn current(&self) -> &Path {
        self.current
    }

    pub fn warn(&mut self, kind: WarningKind, message: String) {
        tracing::warn!(file = %self.current.display(), kind = ?kind, "{message}");
        self.warnings.push(Warning::new(kind, message));
    }

    /// Record an import statement; returns false if the same text was already requested.
    pub fn add_import(&mut self, statement: String) -> bool {
        self.synthesized.insert(statement)
    }

    pub fn schedule(&mut self, path: &Path) {
        if path != self.current && self.scheduled.insert(path.to_path_buf()) {
            tracing::debug!(file = %self.current.display(), target = %path.display(), "scheduling");
        }
    }

    /// Does the translated form of this import bind `mock<Last>` instead of its default name?
    fn rewrites_default(&self, import: &ImportElementEntity) -> bool {
        import.is_default_only()
            && import.path.contains(&self.corpus.config.module_marker)
            && import
                .default
                .as_deref()
                .is_some_and(|name| !self.heritage.contains(name))
    }

    fn target_logical_name(&self, path: &str) -> String {
        let last = path.rsplit('/').next().unwrap_or_default();
        logical_name(last, &self.corpus.config.scoped_marker)
    }

    /// Value expression for a type name that is neither a primitive nor a known class.
    ///
    /// Names that resolve nowhere are logged and returned bare.
    pub fn resolve_reference(&mut self, name: &str) -> String {
        if let Some(resolved) = self.resolve_binding(name) {
            return resolved;
        }
        if !name.contains(['<', '[']) {
            self.warn(WarningKind::Unresolved, format!("unresolved type `{name}`"));
        }
        name.to_string()
    }

    /// Like [`resolve_reference`](Self::resolve_reference), but `None` when
    /// nothing in scope or in the shared files binds `name`.
    pub fn resolve_binding(&mut self, name: &str) -> Option<String> {
        if let Some((head, rest)) = name.split_once('.') {
            let import = self
                .imports
                .iter()
                .find(|i| i.default.as_deref() == Some(head));
            if let Some(import) = import.filter(|i| self.rewrites_default(i)) {
                let target = self.target_logical_name(&import.path);
                if self.corpus.snapshot.is_legal_import(&target) {
                    return Some(format!("{}().{rest}", module_factory_name(&import.path)));
                }
                self.warn(
                    WarningKind::Unresolved,
                    format!("`{name}` refers to `{}`, which is not generated", import.path),
                );
                return Some(self.corpus.config.placeholder(name));
            }
            return Some(name.to_string());
        }

        let alias = format!("_{name}");
        let aliased = self.imports.iter().any(|i| {
            i.named
                .iter()
                .any(|b| b.name == name && b.alias.as_deref() == Some(alias.as_str()))
        });
        if aliased {
            return Some(alias);
        }

        if let Some(import) = self.imports.iter().find(|i| i.binds(name)) {
            if self.rewrites_default(import) {
                return Some(format!("{}()", module_factory_name(&import.path)));
            }
            return Some(name.to_string());
        }
        if starts_lowercase(name) {
            return Some(name.to_string());
        }

        let snapshot = self.corpus.snapshot;
        if snapshot
            .facts(self.current)
            .is_some_and(|facts| facts.declared.contains(name) || facts.nested.contains(name))
        {
            return Some(name.to_string());
        }

        for shared in &self.corpus.config.shared_files {
            if shared.as_path() == self.current {
                continue;
            }
            let declares = snapshot
                .facts(shared)
                .is_some_and(|facts| facts.declared.contains(name));
            if declares {
                let module = relative_module_path(
                    self.current,
                    &generated_module(shared, &self.corpus.config.scoped_marker),
                );
                self.add_import(format!("import {{ {name} }} from '{module}';"));
                self.schedule(shared);
                return Some(name.to_string());
            }
        }
        None
    }

    /// Locate the declaration file an `import('path')` type points at.
    fn locate(&self, path: &str) -> Option<PathBuf> {
        let dir = self.current.parent().unwrap_or(Path::new(""));
        let mut candidates = vec![normalize_path(&dir.join(path))];
        let rooted = path
            .trim_start_matches("./")
            .trim_start_matches("../")
            .trim_start_matches("api/");
        candidates.push(normalize_path(Path::new(rooted)));

        candidates.into_iter().find_map(|candidate| {
            [".d.ts", ".d.ets"].into_iter().find_map(|ext| {
                let mut file = OsString::from(candidate.as_os_str());
                file.push(ext);
                let file = PathBuf::from(file);
                self.corpus.snapshot.facts(&file).is_some().then_some(file)
            })
        })
    }

    /// Value expression for `import('path').Qualifier`.
    pub fn resolve_import_type(&mut self, path: &str, qualifier: &[String]) -> String {
        let config = self.corpus.config;
        let Some(target) = self.locate(path) else {
            self.warn(WarningKind::Missing, format!("cannot find import `{path}`"));
            return config.placeholder("type");
        };
        let module = relative_module_path(self.current, &generated_module(&target, &config.scoped_marker));
        let facts = self.corpus.snapshot.facts(&target).cloned().unwrap_or_default();

        let Some((first, rest)) = qualifier.split_first() else {
            self.warn(
                WarningKind::Simplified,
                format!("import type `{path}` has no qualifier"),
            );
            return config.placeholder("type");
        };
        let rest: String = rest.iter().map(|segment| format!(".{segment}")).collect();
        self.schedule(&target);

        if first == "default" {
            // Default classes are exported by name too; one binding serves both
            // spellings.
            if let Some(class) = &facts.default_export_class {
                let class = upper_first(class);
                self.add_import(format!("import {{ {class} as _{class} }} from '{module}';"));
                return format!("_{class}{rest}");
            }
            if let Some(name) = &facts.default_export_name {
                let factory = factory_name(name);
                self.add_import(format!("import {{ {factory} }} from '{module}';"));
                return format!("{factory}(){rest}");
            }
            self.warn(
                WarningKind::Unresolved,
                format!("`{}` has no default export", target.display()),
            );
            return config.placeholder("type");
        }

        self.add_import(format!("import {{ {first} as _{first} }} from '{module}';"));
        format!("_{first}{rest}")
    }

    /// Re-emit one of the file's own imports against the generated layout.
    ///
    /// Returns `None` when the target will not be generated.
    pub fn translate_import(&self, import: &ImportElementEntity) -> Option<String> {
        if let Some(statement) = self.reference_import(import) {
            return Some(statement);
        }

        let config = self.corpus.config;
        let overrides = self.corpus.overrides;
        let target = self.target_logical_name(&import.path);
        if !self.corpus.snapshot.is_known_file(&target) && !overrides.is_always_known(&target) {
            return None;
        }

        let mut path = match import.path.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{target}"),
            None => target.clone(),
        };
        let current = crate::paths::logical_name_of(self.current, &config.scoped_marker);
        match overrides.import_action(&current, &path) {
            Some(ImportAction::Drop) => return None,
            Some(ImportAction::ParentDir) => path = format!(".{path}"),
            None => {}
        }
        if !path.starts_with("./") && !path.starts_with("../") {
            path = format!("./{path}");
        }

        if import.bound_names().next().is_none() {
            return Some(format!("import '{path}';"));
        }
        let clause = if self.rewrites_default(import) {
            format!("{{ {} }}", module_factory_name(&import.path))
        } else {
            let clause = import.clause();
            overrides
                .rewrite_clause(&clause)
                .map(str::to_string)
                .unwrap_or(clause)
        };
        Some(format!("import {clause} from '{path}';"))
    }

    /// A bare package import that a referenced file declares as `declare module "name"`.
    fn reference_import(&self, import: &ImportElementEntity) -> Option<String> {
        if import.path.contains('.') {
            return None;
        }
        let snapshot = self.corpus.snapshot;
        let facts = snapshot.facts(self.current)?;
        let declaring = facts.references.iter().find(|reference| {
            snapshot
                .facts(reference)
                .is_some_and(|f| f.ambient_modules.contains(&import.path))
        })?;
        let module = relative_module_path(
            self.current,
            &generated_module(declaring, &self.corpus.config.scoped_marker),
        );
        Some(format!("import {} from '{module}';", import.clause()))
    }

    /// Path of an `export * from 'path'` target in the generated layout.
    pub fn translate_export_path(&self, from: &str) -> Option<String> {
        let target = self.target_logical_name(from);
        if !self.corpus.snapshot.is_known_file(&target) {
            return None;
        }
        let path = match from.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{target}"),
            None => target,
        };
        if path.starts_with("./") || path.starts_with("../") {
            Some(path)
        } else {
            Some(format!("./{path}"))
        }
    }

    pub fn finish(self) -> ImportOutcome {
        ImportOutcome {
            imports: self.synthesized.into_iter().collect(),
            scheduled: self.scheduled.into_iter().collect(),
            warnings: self.warnings,
        }
    }
}

/// `mock<Last>` for a module path such as `@ohos.multimedia.image`.
pub fn module_factory_name(path: &str) -> String {
    let last = path.rsplit('.').next().unwrap_or(path);
    let last = last.rsplit('/').next().unwrap_or(last);
    factory_name(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ImportBinding;
    use crate::test_support::fixture;

    fn import(path: &str, default: Option<&str>, named: &[(&str, Option<&str>)]) -> ImportElementEntity {
        ImportElementEntity {
            path: path.into(),
            default: default.map(Into::into),
            namespace: None,
            named: named
                .iter()
                .map(|(name, alias)| ImportBinding {
                    name: (*name).into(),
                    alias: alias.map(Into::into),
                })
                .collect(),
        }
    }

    #[test]
    fn test_shared_file_import_is_synthesized_once() {
        let fx = fixture(
            &[
                ("@internal/component/ets/common.d.ts", "declare interface Resource { id: number; }"),
                ("@ohos.battery.d.ts", "declare namespace battery {}"),
            ],
            &[],
        );
        let current = Path::new("@ohos.battery.d.ts");
        let mut resolver = ImportResolver::new(fx.corpus(), current, &[], IndexSet::new());
        assert_eq!(resolver.resolve_reference("Resource"), "Resource");
        assert_eq!(resolver.resolve_reference("Resource"), "Resource");
        let outcome = resolver.finish();
        assert_eq!(
            outcome.imports,
            ["import { Resource } from './@internal/component/ets/common';"]
        );
        assert_eq!(outcome.scheduled, [PathBuf::from("@internal/component/ets/common.d.ts")]);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_dotted_default_import_calls_factory() {
        let fx = fixture(
            &[
                ("@ohos.multimedia.image.d.ts", "declare namespace image { interface PixelMap {} }"),
                ("@ohos.camera.d.ts", "import image from './@ohos.multimedia.image';"),
            ],
            &[],
        );
        let imports = [import("./@ohos.multimedia.image", Some("image"), &[])];
        let mut resolver =
            ImportResolver::new(fx.corpus(), Path::new("@ohos.camera.d.ts"), &imports, IndexSet::new());
        assert_eq!(resolver.resolve_reference("image.PixelMap"), "mockImage().PixelMap");
        assert_eq!(
            resolver.translate_import(&imports[0]).as_deref(),
            Some("import { mockImage } from './ohos_multimedia_image';")
        );
    }

    #[test]
    fn test_heritage_default_import_is_kept() {
        let fx = fixture(&[("@ohos.app.ability.common.d.ts", "declare namespace common {}")], &[]);
        let imports = [import("./@ohos.app.ability.common", Some("Context"), &[])];
        let heritage = IndexSet::from(["Context".to_string()]);
        let resolver = ImportResolver::new(fx.corpus(), Path::new("ability.d.ts"), &imports, heritage);
        assert_eq!(
            resolver.translate_import(&imports[0]).as_deref(),
            Some("import Context from './ohos_app_ability_common';")
        );
    }

    #[test]
    fn test_underscore_alias_and_unresolved() {
        let fx = fixture(&[("x.d.ts", "")], &[]);
        let imports = [import("./ctx", None, &[("Context", Some("_Context"))])];
        let mut resolver = ImportResolver::new(fx.corpus(), Path::new("x.d.ts"), &imports, IndexSet::new());
        assert_eq!(resolver.resolve_reference("Context"), "_Context");
        assert_eq!(resolver.resolve_reference("Nowhere"), "Nowhere");
        let outcome = resolver.finish();
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::Unresolved);
    }

    #[test]
    fn test_translate_import_quirks() {
        let fx = fixture(&[("basic.d.ts", ""), ("tag/tagSession.d.ts", ""), ("tag/ApplicationContext.d.ts", "")], &[]);
        let resolver = ImportResolver::new(fx.corpus(), Path::new("tag/tagSession.d.ts"), &[], IndexSet::new());
        let basic = import("./basic", None, &[("TagInfo", None)]);
        assert_eq!(
            resolver.translate_import(&basic).as_deref(),
            Some("import { TagInfo } from '../basic';")
        );

        let resolver = ImportResolver::new(fx.corpus(), Path::new("tag/Context.d.ts"), &[], IndexSet::new());
        let app = import("./ApplicationContext", Some("ApplicationContext"), &[]);
        assert_eq!(resolver.translate_import(&app), None);
    }

    #[test]
    fn test_reference_path_rewrites_bare_module_import() {
        let fx = fixture(
            &[
                ("arkui/decl.d.ts", "declare module \"SpecialEvent\" { export const x: number; }"),
                ("arkui/user.d.ts", "import Event from 'SpecialEvent';"),
            ],
            &[("arkui/user.d.ts", "arkui/decl.d.ts")],
        );
        let imports = [import("SpecialEvent", Some("Event"), &[])];
        let resolver =
            ImportResolver::new(fx.corpus(), Path::new("arkui/user.d.ts"), &imports, IndexSet::new());
        assert_eq!(
            resolver.translate_import(&imports[0]).as_deref(),
            Some("import Event from './decl';")
        );
    }

    #[test]
    fn test_import_type_default_class() {
        let fx = fixture(
            &[
                ("application/Context.d.ts", "export default class Context {}"),
                ("@ohos.app.ability.common.d.ts", "declare namespace common {}"),
            ],
            &[],
        );
        let mut resolver = ImportResolver::new(
            fx.corpus(),
            Path::new("@ohos.app.ability.common.d.ts"),
            &[],
            IndexSet::new(),
        );
        let value = resolver.resolve_import_type("./application/Context", &["default".to_string()]);
        assert_eq!(value, "_Context");
        let named = resolver.resolve_import_type("./application/Context", &["Context".into(), "Inner".into()]);
        assert_eq!(named, "_Context.Inner");
        let missing = resolver.resolve_import_type("./nope", &["X".into()]);
        assert_eq!(missing, "'[PC Preview] unknown type'");

        let outcome = resolver.finish();
        assert_eq!(
            outcome.imports,
            ["import { Context as _Context } from './application/Context';"]
        );
        assert_eq!(outcome.warnings[0].kind, WarningKind::Missing);
    }
}
