//! Fixed name-keyed exceptions to the general resolution rules.
//!
//! Every entry here is data: a type name, file name or import clause that the
//! platform declarations spell in a way the general rules get wrong.

use indexmap::{IndexMap, IndexSet};

/// What to do with an import of a given path from a given file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    /// Omit the import entirely.
    Drop,
    /// The generated file lives one directory further up than the path says.
    ParentDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportRule {
    file: String,
    path: String,
    action: ImportAction,
}

/// The override table consulted by the resolvers.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    /// Type name -> literal JS value.
    values: IndexMap<String, String>,
    /// Type names that resolve to a placeholder tagged with the name itself.
    tagged: IndexSet<String>,
    /// Type name -> call into another file's factory.
    factories: IndexMap<String, String>,
    import_rules: Vec<ImportRule>,
    /// Verbatim import clause -> replacement clause.
    clause_rewrites: IndexMap<String, String>,
    /// Logical file names that are importable even when not part of the corpus.
    always_known: IndexSet<String>,
}

impl OverrideTable {
    /// The table every run starts from.
    pub fn builtin(placeholder_tag: &str) -> Self {
        let mut table = Self::default();

        table.values.insert("GLboolean".into(), "true".into());
        table.values.insert("GLuint".into(), "0".into());
        table.values.insert("GLint".into(), "0".into());
        table.values.insert("Object".into(), "{}".into());
        table.values.insert(
            "WebGLActiveInfo".into(),
            format!(
                "{{size: '{tag} unknown GLint', type: 0, name: '{tag} unknown name'}}",
                tag = placeholder_tag
            ),
        );
        for name in ["GLenum", "NotificationFlags", "HTMLCanvasElement"] {
            table.tagged.insert(name.into());
        }

        table.factories.insert("Want".into(), "mockWant().Want".into());
        table.factories.insert(
            "InputMethodExtensionContext".into(),
            "mockInputMethodExtensionContext().InputMethodExtensionContext".into(),
        );

        let rules = [
            ("tagSession", "./basic", ImportAction::ParentDir),
            ("notificationContent", "./ohos_multimedia_image", ImportAction::ParentDir),
            ("AbilityContext", "../ohos_application_Ability", ImportAction::Drop),
            ("Context", "./ApplicationContext", ImportAction::Drop),
        ];
        table.import_rules = rules
            .into_iter()
            .map(|(file, path, action)| ImportRule {
                file: file.into(),
                path: path.into(),
                action,
            })
            .collect();

        table.clause_rewrites.insert(
            "AccessibilityExtensionContext, { AccessibilityElement }".into(),
            "{ AccessibilityExtensionContext, AccessibilityElement }".into(),
        );
        table
            .clause_rewrites
            .insert("{ image }".into(), "{ mockImage as image }".into());

        table.always_known.insert("ohos_application_want".into());
        table
    }

    /// Add user-configured literal values, replacing built-in ones of the same name.
    pub fn with_values(mut self, values: &IndexMap<String, String>) -> Self {
        for (name, value) in values {
            self.tagged.shift_remove(name);
            self.values.insert(name.clone(), value.clone());
        }
        self
    }

    /// Literal JS value for a type name, if overridden.
    pub fn value(&self, name: &str, placeholder_tag: &str) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.tagged
            .contains(name)
            .then(|| crate::naming::js_string(&format!("{placeholder_tag} unknown {name}")))
    }

    /// Factory call standing in for direct construction of a type.
    pub fn factory(&self, name: &str) -> Option<&str> {
        self.factories.get(name).map(String::as_str)
    }

    pub fn import_action(&self, file: &str, path: &str) -> Option<ImportAction> {
        self.import_rules
            .iter()
            .find(|rule| rule.file == file && rule.path == path)
            .map(|rule| rule.action)
    }

    pub fn rewrite_clause(&self, clause: &str) -> Option<&str> {
        self.clause_rewrites.get(clause.trim()).map(String::as_str)
    }

    pub fn is_always_known(&self, logical_name: &str) -> bool {
        self.always_known.contains(logical_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_values() {
        let table = OverrideTable::builtin("[PC Preview]");
        assert_eq!(table.value("GLboolean", "[PC Preview]").as_deref(), Some("true"));
        assert_eq!(table.value("GLuint", "[PC Preview]").as_deref(), Some("0"));
        assert_eq!(
            table.value("GLenum", "[PC Preview]").as_deref(),
            Some("'[PC Preview] unknown GLenum'")
        );
        assert_eq!(table.value("Foo", "[PC Preview]"), None);
    }

    #[test]
    fn test_user_values_replace_tagged() {
        let mut values = IndexMap::new();
        values.insert("GLenum".to_string(), "0".to_string());
        let table = OverrideTable::builtin("[PC Preview]").with_values(&values);
        assert_eq!(table.value("GLenum", "[PC Preview]").as_deref(), Some("0"));
    }

    #[test]
    fn test_import_rules() {
        let table = OverrideTable::builtin("[PC Preview]");
        assert_eq!(
            table.import_action("tagSession", "./basic"),
            Some(ImportAction::ParentDir)
        );
        assert_eq!(
            table.import_action("Context", "./ApplicationContext"),
            Some(ImportAction::Drop)
        );
        assert_eq!(table.import_action("Context", "./basic"), None);
        assert_eq!(table.rewrite_clause("{ image }"), Some("{ mockImage as image }"));
        assert!(table.is_always_known("ohos_application_want"));
    }
}
