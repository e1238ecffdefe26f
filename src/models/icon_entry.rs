use std::path::{Path, PathBuf};

const FOLDER_PREFIX: &str = "folder-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Folder,
    File,
}

impl IconKind {
    /// Folder icons are the SVGs named `folder-*`.
    pub fn from_file_name(name: &str) -> Self {
        if name.starts_with(FOLDER_PREFIX) {
            Self::Folder
        } else {
            Self::File
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Folder => "Folders",
            Self::File => "Files",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconEntry {
    pub path: PathBuf,
    pub stem: String,
    pub kind: IconKind,
}

impl IconEntry {
    /// Build an entry from an SVG path. Returns `None` for paths without a
    /// UTF-8 file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stem = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            path: path.to_path_buf(),
            kind: IconKind::from_file_name(name),
            stem,
        })
    }

    pub fn is_folder(&self) -> bool {
        self.kind == IconKind::Folder
    }

    /// Label shown under the tile.
    pub fn display_name(&self, max_chars: usize) -> String {
        let name = self.stem.replace(FOLDER_PREFIX, "");
        if name.chars().count() > max_chars {
            let keep = max_chars.saturating_sub(3);
            let mut short: String = name.chars().take(keep).collect();
            short.push_str("...");
            short
        } else {
            name.to_string()
        }
    }

    pub fn matches(&self, query_lower: &str) -> bool {
        query_lower.is_empty() || self.stem.to_lowercase().contains(query_lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_folder_prefix() {
        let folder = IconEntry::from_path(Path::new("/icons/folder-src.svg")).unwrap();
        let file = IconEntry::from_path(Path::new("/icons/rust.svg")).unwrap();
        assert_eq!(folder.kind, IconKind::Folder);
        assert_eq!(folder.stem, "folder-src");
        assert_eq!(file.kind, IconKind::File);
    }

    #[test]
    fn display_name_strips_prefix_and_truncates() {
        let short = IconEntry::from_path(Path::new("folder-src.svg")).unwrap();
        assert_eq!(short.display_name(15), "src");

        let long = IconEntry::from_path(Path::new("folder-node_modules-open.svg")).unwrap();
        assert_eq!(long.display_name(15), "node_modules...");

        let exact = IconEntry::from_path(Path::new("fifteen_chars__.svg")).unwrap();
        assert_eq!(exact.display_name(15), "fifteen_chars__");
    }

    #[test]
    fn display_name_drops_every_folder_prefix() {
        let nested = IconEntry::from_path(Path::new("folder-src-folder-open.svg")).unwrap();
        assert_eq!(nested.display_name(15), "src-open");
    }

    #[test]
    fn matches_is_case_insensitive_substring() {
        let entry = IconEntry::from_path(Path::new("TypeScript.svg")).unwrap();
        assert!(entry.matches(""));
        assert!(entry.matches("script"));
        assert!(entry.matches("types"));
        assert!(!entry.matches("rust"));
    }
}
