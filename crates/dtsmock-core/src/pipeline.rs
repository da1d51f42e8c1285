//! The two-phase run: scan the whole corpus, then generate from a worklist.
//!
//! All paths handed to the pipeline are relative to the API root; the
//! [`SourceProvider`] decides what that root is.

use crate::config::MockConfig;
use crate::entity::{Declaration, SourceFileEntity};
use crate::error::PipelineError;
use crate::extract::extract;
use crate::index::{IndexBuilder, IndexEntry};
use crate::overrides::OverrideTable;
use crate::paths::{generated_module, logical_name_of, normalize_path};
use crate::scan::{Corpus, Scanner};
use crate::synth::synthesize;
use crate::type_expr::TypeExpr;
use crate::warning::{Warning, WarningKind};
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Supplies declaration sources by API-root-relative path.
pub trait SourceProvider {
    fn read_file(&self, path: &Path) -> Result<String, io::Error>;
    fn exists(&self, path: &Path) -> bool;
}

/// Reads sources below a directory.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceProvider for FileSystemSource {
    fn read_file(&self, path: &Path) -> Result<String, io::Error> {
        fs::read_to_string(self.root.join(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }
}

/// Sources held in memory, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: IndexMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), source.into());
        self
    }

    pub fn with(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl SourceProvider for MemorySource {
    fn read_file(&self, path: &Path) -> Result<String, io::Error> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

/// One generated script.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    /// Declaration file it was generated from.
    pub source: PathBuf,
    /// Where it belongs below the output root.
    pub output: PathBuf,
    pub logical_name: String,
    pub is_system: bool,
    pub code: String,
    /// Extraction and synthesis warnings for this file.
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// In generation order: inputs first, then files scheduled by them.
    pub files: Vec<GeneratedFile>,
    /// Contents of `napi/index.js`.
    pub napi_index: String,
    /// Contents of `index.js`.
    pub system_index: String,
    pub napi_entries: Vec<IndexEntry>,
    pub system_entries: Vec<IndexEntry>,
    /// Required inputs that could not be read or parsed.
    pub failures: Vec<PipelineError>,
    /// Warnings not tied to a generated file, such as missing reference targets.
    pub warnings: Vec<Warning>,
}

struct Loaded {
    entity: SourceFileEntity,
    warnings: Vec<Warning>,
}

pub struct Pipeline<S> {
    source: S,
    config: MockConfig,
    overrides: OverrideTable,
}

impl<S: SourceProvider> Pipeline<S> {
    pub fn new(source: S, config: MockConfig) -> Self {
        let overrides =
            OverrideTable::builtin(&config.placeholder_tag).with_values(&config.overrides.values);
        Self {
            source,
            config,
            overrides,
        }
    }

    /// Generate mocks for `inputs` and for every shared file they end up needing.
    pub fn run(&self, inputs: &[PathBuf]) -> PipelineOutput {
        let mut output = PipelineOutput::default();
        let mut scanner = Scanner::new(&self.config, &self.overrides);
        let mut loaded: IndexMap<PathBuf, Loaded> = IndexMap::new();
        let mut attempted: IndexSet<PathBuf> = IndexSet::new();

        let mut queue: VecDeque<(PathBuf, bool)> = inputs
            .iter()
            .map(|p| (normalize_path(p), true))
            .chain(self.config.shared_files.iter().map(|p| (p.clone(), false)))
            .collect();

        // Scan: every file that generation could touch must be known first.
        while let Some((path, required)) = queue.pop_front() {
            if !attempted.insert(path.clone()) {
                continue;
            }
            if !required && !self.source.exists(&path) {
                tracing::debug!(file = %path.display(), "optional file not present");
                continue;
            }
            let file = match self.load(&path) {
                Ok(file) => file,
                Err(err) if required => {
                    tracing::warn!(file = %path.display(), "{err}");
                    output.failures.push(err);
                    continue;
                }
                Err(err) => {
                    tracing::warn!(file = %path.display(), "{err}");
                    output.warnings.push(Warning::new(WarningKind::Missing, err.to_string()));
                    continue;
                }
            };

            let mut references = Vec::new();
            for reference in &file.entity.references {
                match self.locate_reference(&path, reference) {
                    Some(target) => references.push(target),
                    None => {
                        let message = format!(
                            "{}: referenced file `{reference}` does not exist",
                            path.display()
                        );
                        tracing::warn!(file = %path.display(), reference = %reference, "referenced file does not exist");
                        output.warnings.push(Warning::new(WarningKind::Missing, message));
                    }
                }
            }
            queue.extend(references.iter().map(|r| (r.clone(), false)));
            for import in import_type_paths(&file.entity) {
                if let Some(target) = self.locate_import_type(&path, &import) {
                    queue.push_back((target, false));
                }
            }

            scanner.add_file(&path, &file.entity, references);
            loaded.insert(path, file);
        }

        let snapshot = scanner.finish();
        let corpus = Corpus {
            snapshot: &snapshot,
            config: &self.config,
            overrides: &self.overrides,
        };

        // Generate: inputs first; files they import from join the worklist.
        let mut index = IndexBuilder::new(&self.config);
        let mut worklist: VecDeque<PathBuf> = inputs
            .iter()
            .map(|p| normalize_path(p))
            .filter(|p| loaded.contains_key(p))
            .collect();
        let mut generated: IndexSet<PathBuf> = IndexSet::new();

        while let Some(path) = worklist.pop_front() {
            if !generated.insert(path.clone()) {
                continue;
            }
            let Some(file) = loaded.get(&path) else {
                continue;
            };
            tracing::debug!(file = %path.display(), "generating");
            let synthesized = synthesize(corpus, &path, &file.entity);

            for scheduled in synthesized.scheduled {
                if !generated.contains(&scheduled) {
                    worklist.push_back(scheduled);
                }
            }

            let logical_name = logical_name_of(&path, &self.config.scoped_marker);
            let is_system = self.config.is_system_file(&logical_name);
            let module = generated_module(&path, &self.config.scoped_marker);
            for registration in &synthesized.registrations {
                index.register(registration.table, &logical_name, &module, &registration.factory);
            }

            let mut warnings = file.warnings.clone();
            warnings.extend(synthesized.warnings);
            output.files.push(GeneratedFile {
                source: path,
                output: output_path(&module, is_system),
                logical_name,
                is_system,
                code: synthesized.code,
                warnings,
            });
        }

        output.napi_index = index.render_napi();
        output.system_index = index.render_system();
        output.napi_entries = index.napi_entries().to_vec();
        output.system_entries = index.system_entries().to_vec();
        tracing::info!(
            generated = output.files.len(),
            failed = output.failures.len(),
            napi = output.napi_entries.len(),
            system = output.system_entries.len(),
            "generation complete"
        );
        output
    }

    /// Read, parse and extract one file.
    fn load(&self, path: &Path) -> Result<Loaded, PipelineError> {
        if !self.source.exists(path) {
            return Err(PipelineError::Missing(path.to_path_buf()));
        }
        let src = self.source.read_file(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = dtsmock_syntax::parse(&src).map_err(|error| PipelineError::Parse {
            path: path.to_path_buf(),
            source_code: src.clone(),
            error,
        })?;
        let extraction = extract(path, &src, &parsed);
        Ok(Loaded {
            entity: extraction.entity,
            warnings: extraction.warnings,
        })
    }

    /// Resolve a `/// <reference path>` target written in `from`.
    fn locate_reference(&self, from: &Path, reference: &str) -> Option<PathBuf> {
        let dir = from.parent().unwrap_or(Path::new(""));
        let mut candidates = vec![normalize_path(&dir.join(reference))];
        let rooted = reference.trim_start_matches("./").trim_start_matches("../");
        candidates.push(normalize_path(Path::new(rooted)));
        if let Some(file) = rooted.strip_prefix("component/") {
            candidates.push(Path::new("@internal/component/ets").join(file));
        }
        candidates.into_iter().find(|c| self.source.exists(c))
    }

    /// Resolve the path of an `import('path')` type written in `from`.
    fn locate_import_type(&self, from: &Path, path: &str) -> Option<PathBuf> {
        let dir = from.parent().unwrap_or(Path::new(""));
        let rooted = path
            .trim_start_matches("./")
            .trim_start_matches("../")
            .trim_start_matches("api/");
        [normalize_path(&dir.join(path)), normalize_path(Path::new(rooted))]
            .into_iter()
            .find_map(|candidate| {
                [".d.ts", ".d.ets"].into_iter().find_map(|ext| {
                    let mut file = OsString::from(candidate.as_os_str());
                    file.push(ext);
                    let file = PathBuf::from(file);
                    self.source.exists(&file).then_some(file)
                })
            })
    }
}

/// `napi/<dir>/<name>.js` for napi-side files, `<dir>/<name>.js` for system files.
fn output_path(module: &Path, is_system: bool) -> PathBuf {
    let mut file = OsString::from(module.as_os_str());
    file.push(".js");
    let file = PathBuf::from(file);
    if is_system {
        file
    } else {
        Path::new("napi").join(file)
    }
}

/// Every `import('...')` path used anywhere in the file's types.
fn import_type_paths(entity: &SourceFileEntity) -> IndexSet<String> {
    let mut paths = IndexSet::new();
    let mut visit = |ty: &TypeExpr| collect_import_types(ty, &mut paths);
    walk_declarations(&entity.declarations, &mut visit);
    paths
}

fn walk_declarations(decls: &[Declaration], visit: &mut impl FnMut(&TypeExpr)) {
    for decl in decls {
        match decl {
            Declaration::Class(class) => {
                for prop in class.properties.iter().chain(&class.static_properties) {
                    prop.ty.iter().for_each(&mut *visit);
                }
                for overloads in class.methods.values().chain(class.static_methods.values()) {
                    walk_signatures(overloads, visit);
                }
            }
            Declaration::Interface(iface) => {
                for prop in &iface.properties {
                    prop.ty.iter().for_each(&mut *visit);
                }
                for overloads in iface.methods.values() {
                    walk_signatures(overloads, visit);
                }
                walk_signatures(&iface.call_signatures, visit);
                for sig in &iface.index_signatures {
                    visit(&sig.ty);
                }
            }
            Declaration::Function(group) => walk_signatures(&group.overloads, visit),
            Declaration::TypeAlias(alias) => visit(&alias.ty),
            Declaration::Variable(var) => {
                for d in &var.declarators {
                    d.ty.iter().for_each(&mut *visit);
                }
            }
            Declaration::Module(module) => walk_declarations(&module.body, visit),
            Declaration::Enum(_) | Declaration::ImportEquals(_) => {}
        }
    }
}

fn walk_signatures(overloads: &[crate::entity::MethodEntity], visit: &mut impl FnMut(&TypeExpr)) {
    for overload in overloads {
        for param in &overload.params {
            param.ty.iter().for_each(&mut *visit);
        }
        overload.return_type.ty.iter().for_each(&mut *visit);
    }
}

fn collect_import_types(ty: &TypeExpr, out: &mut IndexSet<String>) {
    match ty {
        TypeExpr::ImportType { path, args, .. } => {
            out.insert(path.clone());
            args.iter().for_each(|a| collect_import_types(a, out));
        }
        TypeExpr::Reference { args, .. } => args.iter().for_each(|a| collect_import_types(a, out)),
        TypeExpr::Union { members } | TypeExpr::Intersection { members } => {
            members.iter().for_each(|m| collect_import_types(m, out))
        }
        TypeExpr::ArrayOf { element } => collect_import_types(element, out),
        TypeExpr::Tuple { elements } => elements.iter().for_each(|e| collect_import_types(e, out)),
        TypeExpr::Function { params, ret } => {
            params
                .iter()
                .filter_map(|p| p.ty.as_ref())
                .for_each(|t| collect_import_types(t, out));
            collect_import_types(ret, out);
        }
        TypeExpr::Keyword { .. }
        | TypeExpr::ObjectLiteral
        | TypeExpr::Literal { .. }
        | TypeExpr::This
        | TypeExpr::Other { .. } => {}
    }
}
