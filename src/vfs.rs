use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A file or directory staged for output, before anything touches the disk.
#[derive(Debug, Clone)]
pub struct VirtualEntry {
    /// Path of the template entry, relative to the template root.
    pub source: PathBuf,
    /// Rendered path, relative to the output root.
    pub destination: PathBuf,
    /// Substituted contents when the entry is a file.
    pub content: Option<String>,
    /// Permissions copied from the template file onto the output file.
    pub permissions: Option<std::fs::Permissions>,
    /// Indicates whether this entry is a file (`true`) or a directory (`false`).
    pub is_file: bool,
}
impl VirtualEntry {
    pub fn directory(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            content: None,
            permissions: None,
            is_file: false,
        }
    }

    pub fn file(source: PathBuf, destination: PathBuf, content: String) -> Self {
        Self {
            source,
            destination,
            content: Some(content),
            permissions: None,
            is_file: true,
        }
    }
}
/// The full output of a render, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct VirtualFS {
    pub entries: Vec<VirtualEntry>,
}
impl VirtualFS {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: VirtualEntry) {
        self.entries.push(entry);
    }

    pub fn files(&self) -> impl Iterator<Item = &VirtualEntry> {
        self.entries.iter().filter(|e| e.is_file)
    }

    pub fn directories(&self) -> impl Iterator<Item = &VirtualEntry> {
        self.entries.iter().filter(|e| !e.is_file)
    }

    /// Directory entries with duplicate destinations removed, first occurrence kept.
    pub fn distinct_directories(&self) -> Vec<&VirtualEntry> {
        let mut seen: HashSet<&Path> = HashSet::new();

        self.directories()
            .filter(|entry| seen.insert(entry.destination.as_path()))
            .collect()
    }

    /// Finds the first pair of entries rendered to the same destination where at least
    /// one of them is a file. Directories sharing a destination simply merge.
    pub fn find_collision(&self) -> Option<(&VirtualEntry, &VirtualEntry)> {
        let mut seen: HashMap<&Path, &VirtualEntry> = HashMap::new();

        for entry in &self.entries {
            if let Some(&previous) = seen.get(entry.destination.as_path()) {
                if previous.is_file || entry.is_file {
                    return Some((previous, entry));
                }
                continue;
            }

            seen.insert(entry.destination.as_path(), entry);
        }

        None
    }
}
