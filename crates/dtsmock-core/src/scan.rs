//! The scan phase: corpus-wide facts gathered before any file is generated.
//!
//! A [`Scanner`] is fed every input, shared and referenced file; calling
//! [`Scanner::finish`] freezes the result into a [`ScanSnapshot`] which the
//! generation phase only ever reads.

use crate::config::MockConfig;
use crate::entity::{Declaration, ExportEntity, SourceFileEntity};
use crate::naming::upper_first;
use crate::overrides::OverrideTable;
use crate::paths::{logical_name, logical_name_of};
use indexmap::{IndexMap, IndexSet};
use std::path::{Path, PathBuf};

/// Per-file facts other files resolve against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFacts {
    pub logical_name: String,
    /// Names declared at file level, including inside `declare global`.
    pub declared: IndexSet<String>,
    /// Names declared inside the file's namespaces, at any depth.
    pub nested: IndexSet<String>,
    /// Names of `declare module "name"` blocks.
    pub ambient_modules: IndexSet<String>,
    /// `export default class X`
    pub default_export_class: Option<String>,
    /// `export default x;` or `export = x;`
    pub default_export_name: Option<String>,
    pub has_modules: bool,
    /// Reference-path targets that exist, resolved against the API root.
    pub references: Vec<PathBuf>,
}

/// Read-only caches shared by every generation step.
#[derive(Debug, Clone, Default)]
pub struct ScanSnapshot {
    file_names: IndexSet<String>,
    class_names: IndexSet<String>,
    legal_imports: IndexSet<String>,
    files: IndexMap<PathBuf, FileFacts>,
}

impl ScanSnapshot {
    /// Was a class with this (capitalized) name declared anywhere in the corpus?
    pub fn is_class(&self, name: &str) -> bool {
        self.class_names.contains(name)
    }

    /// Will a generated file with this logical name exist?
    pub fn is_known_file(&self, logical_name: &str) -> bool {
        self.file_names.contains(logical_name)
    }

    /// Is an import naming this logical target re-emitted by some generated file?
    pub fn is_legal_import(&self, logical_name: &str) -> bool {
        self.legal_imports.contains(logical_name)
    }

    pub fn facts(&self, path: &Path) -> Option<&FileFacts> {
        self.files.get(path)
    }
}

/// Everything the generation phase reads but never writes.
#[derive(Debug, Clone, Copy)]
pub struct Corpus<'a> {
    pub snapshot: &'a ScanSnapshot,
    pub config: &'a MockConfig,
    pub overrides: &'a OverrideTable,
}

/// Accumulates a [`ScanSnapshot`]. Append-only.
pub struct Scanner<'a> {
    config: &'a MockConfig,
    overrides: &'a OverrideTable,
    snapshot: ScanSnapshot,
    import_targets: Vec<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a MockConfig, overrides: &'a OverrideTable) -> Self {
        Self {
            config,
            overrides,
            snapshot: ScanSnapshot::default(),
            import_targets: Vec::new(),
        }
    }

    /// Record one file. `references` are its existing reference-path targets.
    pub fn add_file(&mut self, path: &Path, entity: &SourceFileEntity, references: Vec<PathBuf>) {
        let logical = logical_name_of(path, &self.config.scoped_marker);
        tracing::debug!(file = %path.display(), name = %logical, "scanning");
        self.snapshot.file_names.insert(logical.clone());

        let mut facts = FileFacts {
            logical_name: logical,
            references,
            ..FileFacts::default()
        };

        for declaration in &entity.declarations {
            if let Some(name) = declaration.name() {
                facts.declared.insert(name.to_string());
            }
            match declaration {
                Declaration::Class(class) => {
                    self.snapshot.class_names.insert(class.name.clone());
                    if class.modifiers.default && facts.default_export_class.is_none() {
                        facts.default_export_class = Some(class.name.clone());
                    }
                }
                Declaration::Module(module) => {
                    facts.has_modules = true;
                    if module.ambient {
                        facts.ambient_modules.insert(module.name.clone());
                    }
                    self.collect_nested(&module.body, &mut facts.nested);
                }
                Declaration::Variable(var) => {
                    for d in &var.declarators {
                        facts.declared.insert(d.name.clone());
                    }
                }
                _ => {}
            }
        }

        for export in &entity.exports {
            if let ExportEntity::Default { name } | ExportEntity::Equals { name } = export {
                facts.default_export_name.get_or_insert_with(|| name.clone());
            }
        }

        for import in &entity.imports {
            let last = import.path.rsplit('/').next().unwrap_or_default();
            self.import_targets
                .push(logical_name(last, &self.config.scoped_marker));
        }

        self.snapshot.files.insert(path.to_path_buf(), facts);
    }

    fn collect_nested(&mut self, body: &[Declaration], nested: &mut IndexSet<String>) {
        for declaration in body {
            if let Some(name) = declaration.name() {
                nested.insert(name.to_string());
            }
            match declaration {
                Declaration::Class(class) => {
                    self.snapshot.class_names.insert(upper_first(&class.name));
                }
                Declaration::Module(module) => self.collect_nested(&module.body, nested),
                _ => {}
            }
        }
    }

    /// Freeze the caches.
    pub fn finish(mut self) -> ScanSnapshot {
        for target in std::mem::take(&mut self.import_targets) {
            if self.snapshot.file_names.contains(&target) || self.overrides.is_always_known(&target) {
                self.snapshot.legal_imports.insert(target);
            }
        }
        tracing::debug!(
            files = self.snapshot.files.len(),
            classes = self.snapshot.class_names.len(),
            legal_imports = self.snapshot.legal_imports.len(),
            "scan complete"
        );
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    fn scan(files: &[(&str, &str)]) -> ScanSnapshot {
        let config = MockConfig::default();
        let overrides = OverrideTable::builtin(&config.placeholder_tag);
        let mut scanner = Scanner::new(&config, &overrides);
        for (path, src) in files {
            let path = Path::new(path);
            let parsed = dtsmock_syntax::parse(src).unwrap();
            let entity = extract(path, src, &parsed).entity;
            scanner.add_file(path, &entity, Vec::new());
        }
        scanner.finish()
    }

    #[test]
    fn test_class_names_include_nested_capitalized() {
        let snapshot = scan(&[(
            "@ohos.net.http.d.ts",
            "declare class Top {}\ndeclare namespace http { class request {} namespace inner { class Deep {} } }",
        )]);
        assert!(snapshot.is_class("Top"));
        assert!(snapshot.is_class("Request"));
        assert!(snapshot.is_class("Deep"));
        assert!(!snapshot.is_class("request"));
    }

    #[test]
    fn test_file_names_and_legal_imports() {
        let snapshot = scan(&[
            ("@ohos.base.d.ts", "export interface Callback<T> { (data: T): void; }"),
            (
                "@ohos.battery.d.ts",
                "import { Callback } from './@ohos.base';\nimport Want from './@ohos.app.ability.Want';\nimport x from './@ohos.missing';",
            ),
        ]);
        assert!(snapshot.is_known_file("ohos_base"));
        assert!(snapshot.is_legal_import("ohos_base"));
        assert!(!snapshot.is_legal_import("ohos_missing"));
        assert!(!snapshot.is_legal_import("ohos_app_ability_Want"));
    }

    #[test]
    fn test_default_exports_recorded() {
        let snapshot = scan(&[
            ("ability/Context.d.ts", "export default class Context extends BaseContext {}"),
            ("@ohos.router.d.ts", "declare namespace router {}\nexport default router;"),
        ]);
        let ctx = snapshot.facts(Path::new("ability/Context.d.ts")).unwrap();
        assert_eq!(ctx.default_export_class.as_deref(), Some("Context"));
        assert!(ctx.declared.contains("Context"));
        let router = snapshot.facts(Path::new("@ohos.router.d.ts")).unwrap();
        assert_eq!(router.default_export_name.as_deref(), Some("router"));
        assert!(router.has_modules);
    }
}
