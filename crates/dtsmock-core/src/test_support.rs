//! Shared fixtures for unit tests.

use crate::config::MockConfig;
use crate::extract::extract;
use crate::overrides::OverrideTable;
use crate::scan::{Corpus, ScanSnapshot, Scanner};
use std::path::{Path, PathBuf};

pub(crate) struct Fixture {
    pub config: MockConfig,
    pub overrides: OverrideTable,
    pub snapshot: ScanSnapshot,
}

/// Scan `files`; `references` lists (from, to) reference-path pairs.
pub(crate) fn fixture(files: &[(&str, &str)], references: &[(&str, &str)]) -> Fixture {
    let config = MockConfig::default();
    let overrides = OverrideTable::builtin(&config.placeholder_tag);
    let mut scanner = Scanner::new(&config, &overrides);
    for (path, src) in files {
        let parsed = dtsmock_syntax::parse(src).expect("fixture source parses");
        let entity = extract(Path::new(path), src, &parsed).entity;
        let refs = references
            .iter()
            .filter(|(from, _)| from == path)
            .map(|(_, to)| PathBuf::from(to))
            .collect();
        scanner.add_file(Path::new(path), &entity, refs);
    }
    let snapshot = scanner.finish();
    Fixture {
        config,
        overrides,
        snapshot,
    }
}

impl Fixture {
    pub fn corpus(&self) -> Corpus<'_> {
        Corpus {
            snapshot: &self.snapshot,
            config: &self.config,
            overrides: &self.overrides,
        }
    }
}
