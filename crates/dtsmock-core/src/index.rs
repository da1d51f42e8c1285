//! Aggregates per-file factories into the two dispatch tables.

use crate::config::MockConfig;
use crate::naming::camel_join;
use serde::Serialize;
use std::path::Path;

/// Which dispatch table a factory is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Keyed by dot-joined reverse-domain names, dispatched from `global.requireNapi`.
    Napi,
    /// Keyed by plain file names, dispatched from `global.systemplugin.require`.
    System,
}

/// A factory a generated file asks to be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub table: Table,
    pub factory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Logical name of the generated file.
    pub file_name: String,
    /// Module specifier relative to the table's root directory.
    pub module_path: String,
    pub factory: String,
    /// Name the factory is bound to in the index; differs from `factory` on collision.
    pub binding: String,
    /// Dispatch label.
    pub label: String,
}

/// Collects registrations in arrival order.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    reverse_domain_prefix: String,
    napi: Vec<IndexEntry>,
    system: Vec<IndexEntry>,
}

impl IndexBuilder {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            reverse_domain_prefix: config.reverse_domain_prefix.clone(),
            napi: Vec::new(),
            system: Vec::new(),
        }
    }

    /// Register `factory` exported by the generated module at `module`
    /// (extension-less, relative to the table root).
    pub fn register(&mut self, table: Table, file_name: &str, module: &Path, factory: &str) {
        let label = match table {
            Table::Napi => match file_name.strip_prefix(self.reverse_domain_prefix.as_str()) {
                Some(rest) if !self.reverse_domain_prefix.is_empty() => rest.replace('_', "."),
                _ => file_name.to_string(),
            },
            Table::System => file_name.to_string(),
        };
        let entries = match table {
            Table::Napi => &mut self.napi,
            Table::System => &mut self.system,
        };

        if entries
            .iter()
            .any(|e| e.file_name == file_name && e.factory == factory)
        {
            return;
        }

        let taken = |name: &str| entries.iter().any(|e| e.binding == name);
        let binding = if !taken(factory) {
            factory.to_string()
        } else {
            let base = camel_join(file_name);
            let mut candidate = base.clone();
            let mut n = 2;
            while taken(&candidate) || candidate == factory {
                candidate = format!("{base}{n}");
                n += 1;
            }
            tracing::debug!(file = file_name, factory, binding = %candidate, "factory name collision");
            candidate
        };

        let module = module
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(IndexEntry {
            file_name: file_name.to_string(),
            module_path: format!("./{module}"),
            factory: factory.to_string(),
            binding,
            label,
        });
    }

    pub fn napi_entries(&self) -> &[IndexEntry] {
        &self.napi
    }

    pub fn system_entries(&self) -> &[IndexEntry] {
        &self.system
    }

    /// `napi/index.js`: installs `global.requireNapi`.
    pub fn render_napi(&self) -> String {
        let mut out = render_imports(&self.napi);
        out.push_str("export function mockRequireNapiFun() {\n");
        out.push_str("    global.requireNapi = function (...args) {\n");
        out.push_str("        const globalNapi = global.requireNapiPreview(...args);\n");
        out.push_str("        if (globalNapi !== undefined) {\n");
        out.push_str(
            "            console.log(`${JSON.stringify(args)} called the dynamic library Api (${JSON.stringify(globalNapi)})`);\n",
        );
        out.push_str("            return globalNapi;\n");
        out.push_str("        }\n");
        out.push_str("        console.log(`${JSON.stringify(args[0])} called the mockApi`);\n");
        out.push_str("        switch (args[0]) {\n");
        render_cases(&self.napi, "            ", &mut out);
        out.push_str("        }\n");
        out.push_str("        if (global.hosMockFunc !== undefined) {\n");
        out.push_str("            return global.hosMockFunc(args[0]);\n");
        out.push_str("        }\n");
        out.push_str("    };\n");
        out.push_str("}\n");
        out
    }

    /// `index.js`: installs `global.systemplugin`.
    pub fn render_system(&self) -> String {
        let mut out = render_imports(&self.system);
        out.push_str("export function mockSystemPlugin() {\n");
        out.push_str("    global.systemplugin = {};\n");
        for entry in &self.system {
            out.push_str(&format!("    {}();\n", entry.binding));
        }
        out.push_str("    global.systemplugin.require = function (...args) {\n");
        out.push_str("        switch (args[0]) {\n");
        render_cases(&self.system, "            ", &mut out);
        out.push_str("        }\n");
        out.push_str("    };\n");
        out.push_str("}\n");
        out
    }
}

fn render_imports(entries: &[IndexEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        if entry.binding == entry.factory {
            out.push_str(&format!("import {{ {} }} from '{}';\n", entry.factory, entry.module_path));
        } else {
            out.push_str(&format!(
                "import {{ {} as {} }} from '{}';\n",
                entry.factory, entry.binding, entry.module_path
            ));
        }
    }
    if !entries.is_empty() {
        out.push('\n');
    }
    out
}

fn render_cases(entries: &[IndexEntry], indent: &str, out: &mut String) {
    for entry in entries {
        out.push_str(&format!("{indent}case '{}':\n", entry.label));
        out.push_str(&format!("{indent}    return {}();\n", entry.binding));
    }
}
