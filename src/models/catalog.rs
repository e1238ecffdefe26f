//! The icon catalog: every bundled SVG, split into folder and file icons.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use super::icon_entry::{IconEntry, IconKind};

/// Extensions whose icon is not simply named after the extension.
static EXTENSION_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("py", "python"),
        ("js", "javascript"),
        ("ts", "typescript"),
        ("jsx", "react"),
        ("tsx", "react_ts"),
        ("md", "markdown"),
        ("rb", "ruby"),
        ("rs", "rust"),
        ("cs", "csharp"),
        ("scss", "sass"),
        ("sh", "console"),
        ("bat", "console"),
        ("txt", "document"),
        ("7z", "zip"),
        ("tar", "zip"),
        ("gz", "zip"),
        ("yml", "yaml"),
        ("dockerfile", "docker"),
        ("vb", "visualstudio"),
        ("sql", "database"),
    ])
});

/// Icon name to look for when the target has extension `ext`.
pub fn icon_name_for_extension(ext: &str) -> String {
    let ext = ext.to_lowercase();
    EXTENSION_ALIASES
        .get(ext.as_str())
        .map(|alias| alias.to_string())
        .unwrap_or(ext)
}

#[derive(Debug, Clone, Default)]
pub struct IconCatalog {
    folders: Vec<IconEntry>,
    files: Vec<IconEntry>,
}

impl IconCatalog {
    /// Build a catalog from entries in any order; each list ends up sorted
    /// by path.
    pub fn from_entries(entries: impl IntoIterator<Item = IconEntry>) -> Self {
        let (mut folders, mut files): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(IconEntry::is_folder);
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { folders, files }
    }

    pub fn entries(&self, kind: IconKind) -> &[IconEntry] {
        match kind {
            IconKind::Folder => &self.folders,
            IconKind::File => &self.files,
        }
    }

    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries of `kind` whose stem contains `query`, ignoring case.
    pub fn filter(&self, kind: IconKind, query: &str) -> Vec<IconEntry> {
        let query = query.to_lowercase();
        self.entries(kind)
            .iter()
            .filter(|entry| entry.matches(&query))
            .cloned()
            .collect()
    }

    /// File icon matching the extension of `target`, if any.
    pub fn suggest_for_target(&self, target: &Path) -> Option<&IconEntry> {
        let ext = target.extension()?.to_str()?;
        if ext.is_empty() {
            return None;
        }
        let name = icon_name_for_extension(ext);
        self.files.iter().find(|entry| entry.stem == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> IconCatalog {
        IconCatalog::from_entries(
            names
                .iter()
                .filter_map(|name| IconEntry::from_path(Path::new(&format!("/icons/{name}")))),
        )
    }

    #[test]
    fn entries_are_split_and_sorted() {
        let catalog = catalog(&["rust.svg", "folder-src.svg", "c.svg", "folder-docs.svg"]);
        let folders: Vec<_> = catalog
            .entries(IconKind::Folder)
            .iter()
            .map(|e| e.stem.as_str())
            .collect();
        let files: Vec<_> = catalog
            .entries(IconKind::File)
            .iter()
            .map(|e| e.stem.as_str())
            .collect();
        assert_eq!(folders, ["folder-docs", "folder-src"]);
        assert_eq!(files, ["c", "rust"]);
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn filter_keeps_order_and_ignores_case() {
        let catalog = catalog(&["javascript.svg", "Java.svg", "json.svg", "rust.svg"]);
        let hits: Vec<_> = catalog
            .filter(IconKind::File, "JAVA")
            .into_iter()
            .map(|e| e.stem)
            .collect();
        assert_eq!(hits, ["Java", "javascript"]);
        assert_eq!(catalog.filter(IconKind::File, "").len(), 4);
        assert!(catalog.filter(IconKind::Folder, "").is_empty());
    }

    #[test]
    fn whitespace_query_is_matched_literally() {
        let catalog = catalog(&["javascript.svg", "rust.svg"]);
        assert!(catalog.filter(IconKind::File, " ").is_empty());
        assert!(catalog.filter(IconKind::File, " rust").is_empty());
    }

    #[test]
    fn suggestion_uses_alias_table() {
        let catalog = catalog(&["python.svg", "zip.svg", "json.svg", "folder-python.svg"]);
        let suggest = |p: &str| {
            catalog
                .suggest_for_target(Path::new(p))
                .map(|e| e.stem.clone())
        };
        assert_eq!(suggest("/tmp/main.py").as_deref(), Some("python"));
        assert_eq!(suggest("/tmp/archive.TAR").as_deref(), Some("zip"));
        assert_eq!(suggest("/tmp/data.json").as_deref(), Some("json"));
        assert_eq!(suggest("/tmp/Makefile"), None);
        assert_eq!(suggest("/tmp/notes.unknown"), None);
    }

    #[test]
    fn alias_falls_back_to_extension() {
        assert_eq!(icon_name_for_extension("yml"), "yaml");
        assert_eq!(icon_name_for_extension("Go"), "go");
        assert_eq!(icon_name_for_extension("toml"), "toml");
    }
}
