//! Walking the API tree and laying generated files out on disk.

use anyhow::{Context, Result};
use dtsmock_core::{is_declaration_file, MockConfig, PipelineOutput};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// `/`-joined path of `path` below `root`.
fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded(root: &Path, entry: &DirEntry, config: &MockConfig) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let key = relative_key(root, entry.path());
    config.exclude_dirs.iter().any(|dir| {
        key == *dir
            || key.starts_with(&format!("{dir}/"))
            || entry.file_name().to_str() == Some(dir.as_str())
    })
}

/// Every declaration file below `api_dir`, relative to it, in a stable order.
pub fn collect_inputs(api_dir: &Path, config: &MockConfig) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    let walker = WalkDir::new(api_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(api_dir, entry, config));
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", api_dir.display()))?;
        if entry.file_type().is_file() && is_declaration_file(entry.path()) {
            let relative = entry.path().strip_prefix(api_dir).unwrap_or(entry.path());
            inputs.push(relative.to_path_buf());
        }
    }
    tracing::debug!(count = inputs.len(), dir = %api_dir.display(), "collected inputs");
    Ok(inputs)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Write every generated file plus `napi/index.js` and `index.js`; returns the paths written.
pub fn write_output(out_dir: &Path, output: &PipelineOutput) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(output.files.len() + 2);
    for file in &output.files {
        let path = out_dir.join(&file.output);
        write_file(&path, &file.code)?;
        written.push(path);
    }

    let napi_index = out_dir.join("napi").join("index.js");
    write_file(&napi_index, &output.napi_index)?;
    written.push(napi_index);

    let system_index = out_dir.join("index.js");
    write_file(&system_index, &output.system_index)?;
    written.push(system_index);

    tracing::info!(count = written.len(), dir = %out_dir.display(), "wrote output");
    Ok(written)
}
