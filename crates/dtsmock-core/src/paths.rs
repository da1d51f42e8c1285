//! Logical names and relative module paths.
//!
//! All paths handled by the core are relative to the API root and use
//! forward slashes once rendered into generated code.

use std::path::{Component, Path, PathBuf};

const DECLARATION_SUFFIXES: [&str; 3] = [".d.ts", ".d.ets", ".ts"];

/// Strip a declaration-file suffix from a file name.
pub fn strip_declaration_suffix(file_name: &str) -> &str {
    DECLARATION_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(file_name)
}

/// Is this path a declaration file we know how to read?
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".d.ts") || n.ends_with(".d.ets"))
}

/// Logical base name of a declaration file or module specifier segment.
///
/// `@ohos.multimedia.image.d.ts` -> `ohos_multimedia_image`
pub fn logical_name(file_name: &str, scoped_marker: &str) -> String {
    let base = strip_declaration_suffix(file_name);
    let base = match base.find(scoped_marker) {
        Some(idx) if !scoped_marker.is_empty() => &base[idx + scoped_marker.len()..],
        _ => base,
    };
    base.replace('.', "_")
}

/// Logical name of the file at `path`.
pub fn logical_name_of(path: &Path, scoped_marker: &str) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    logical_name(file_name, scoped_marker)
}

/// Resolve `.` and `..` components lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Module specifier leading from the file `from` to the module `to`.
///
/// Both paths are relative to the same root; `to` is the extension-less
/// target. The result always starts with `./` or `../`.
pub fn relative_module_path(from: &Path, to: &Path) -> String {
    let from_dir: Vec<_> = from
        .parent()
        .map(|p| normalize_path(p).components().map(|c| c.as_os_str().to_owned()).collect())
        .unwrap_or_default();
    let target: Vec<_> = normalize_path(to)
        .components()
        .map(|c| c.as_os_str().to_owned())
        .collect();

    let common = from_dir
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_dir.len() {
        segments.push("..".to_string());
    }
    for part in &target[common..] {
        segments.push(part.to_string_lossy().into_owned());
    }

    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// The generated module path (without extension) for a source file.
pub fn generated_module(path: &Path, scoped_marker: &str) -> PathBuf {
    let logical = logical_name_of(path, scoped_marker);
    match path.parent() {
        Some(dir) => dir.join(logical),
        None => PathBuf::from(logical),
    }
}
