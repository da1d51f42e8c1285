//! Mock generation for ambient declaration files.
//!
//! A run has two strictly ordered phases. The scan phase extracts every file
//! that generation could touch and freezes the corpus-wide caches into a
//! [`ScanSnapshot`]. The generation phase then walks a worklist, synthesizing
//! one script per file against that read-only snapshot and collecting factory
//! registrations into the two dispatch tables built by [`IndexBuilder`].

mod config;
mod entity;
mod error;
mod extract;
mod imports;
mod index;
mod naming;
mod overrides;
mod paths;
mod pipeline;
mod resolve;
mod scan;
mod synth;
#[cfg(test)]
mod test_support;
mod type_expr;
mod warning;

pub use config::{ConfigError, MockConfig, OverridesConfig};
pub use entity::*;
pub use error::PipelineError;
pub use extract::{extract, Extraction};
pub use imports::{module_factory_name, ImportOutcome, ImportResolver};
pub use index::{IndexBuilder, IndexEntry, Registration, Table};
pub use naming::{camel_join, factory_name, upper_first};
pub use overrides::{ImportAction, OverrideTable};
pub use paths::{generated_module, is_declaration_file, logical_name, logical_name_of};
pub use pipeline::{
    FileSystemSource, GeneratedFile, MemorySource, Pipeline, PipelineOutput, SourceProvider,
};
pub use resolve::{MockValue, TypeResolver, ValueSite, CALLBACK_ERROR};
pub use scan::{Corpus, FileFacts, ScanSnapshot, Scanner};
pub use synth::{synthesize, SynthOutput};
pub use type_expr::{FnParam, Keyword, Literal, TypeExpr, TypeKind};
pub use warning::{Warning, WarningKind};
