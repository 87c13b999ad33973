use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Front-matter line marking a file copied verbatim from the source language
pub const OVERRIDE_FRONT_MATTER_LINE: &str = "translation-override: true";

/// Front-matter delimiter
const FRONT_MATTER_DELIMITER: &str = "---";

/// One directory visited by [`FileManager::walk_top_down`]
///
/// All paths are relative to the walk's base directory and use `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// The visited directory
    pub directory: String,
    /// Direct subdirectories, sorted by name
    pub subdirectories: Vec<String>,
    /// Direct files, sorted by name
    pub files: Vec<String>,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Delete a directory and everything below it, if it exists
    pub fn remove_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_dir_all(path).with_context(|| format!("Failed to remove directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow::anyhow!("Source file does not exist: {:?}", from));
        }

        // Ensure the target directory exists
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        Ok(())
    }

    /// Walk `base/root` top-down, one [`DirectoryListing`] per directory
    ///
    /// A directory is listed before any of its subdirectories are visited,
    /// and subdirectories are visited in name order.
    pub fn walk_top_down<P: AsRef<Path>>(base: P, root: &str) -> Result<Vec<DirectoryListing>> {
        let base = base.as_ref();
        let root = root.trim_end_matches('/').to_string();
        let mut listings = Vec::new();
        let mut pending = vec![root];

        while let Some(directory) = pending.pop() {
            let mut subdirectories = Vec::new();
            let mut files = Vec::new();

            let entries = WalkDir::new(base.join(&directory))
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name();
            for entry in entries {
                let entry = entry.context("Failed to read directory entry")?;
                let name = entry.file_name().to_string_lossy().to_string();
                if entry.file_type().is_dir() {
                    subdirectories.push(join_relative(&directory, &name));
                } else if entry.file_type().is_file() {
                    files.push(join_relative(&directory, &name));
                }
            }

            // Reverse so the stack pops them in name order
            pending.extend(subdirectories.iter().rev().cloned());
            listings.push(DirectoryListing {
                directory,
                subdirectories,
                files,
            });
        }

        Ok(listings)
    }

    /// Files below `base` with the given extension, as sorted `/`-separated relative paths
    ///
    /// The `.git` directory is never entered.
    pub fn find_files<P: AsRef<Path>>(base: P, extension: &str) -> Result<Vec<String>> {
        let base = base.as_ref();
        let mut result = Vec::new();

        let walker = WalkDir::new(base)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");
        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(extension) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(base) {
                result.push(to_slash_path(relative));
            }
        }

        Ok(result)
    }
}

/// Join two `/`-separated relative paths
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Render a relative path with `/` separators
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace every `/from/` segment of `path` with `/to/`
pub fn rewrite_locale_segment(path: &str, from: &str, to: &str) -> String {
    path.replace(&format!("/{}/", from), &format!("/{}/", to))
}

/// Whether `path` has a directory segment equal to `segment`
pub fn has_segment(path: &str, segment: &str) -> bool {
    let mut parts: Vec<&str> = path.split('/').collect();
    parts.pop();
    parts.contains(&segment)
}

/// Ensure `content` carries `line` inside a leading `---` front-matter block
///
/// Returns `None` when the line is already present. A block is created when
/// the content has none.
pub fn inject_front_matter(content: &str, line: &str) -> Option<String> {
    let mut lines = content.split_inclusive('\n');
    let opens_block = lines
        .next()
        .map(|first| first.trim_end() == FRONT_MATTER_DELIMITER)
        .unwrap_or(false);

    if opens_block {
        let mut closed = false;
        for existing in lines {
            let existing = existing.trim_end();
            if existing == FRONT_MATTER_DELIMITER {
                closed = true;
                break;
            }
            if existing == line {
                return None;
            }
        }
        if closed {
            let (first, rest) = content.split_at(content.find('\n').map(|i| i + 1).unwrap_or(content.len()));
            return Some(format!("{}{}\n{}", first, line, rest));
        }
    }

    Some(format!("{}\n{}\n{}\n{}", FRONT_MATTER_DELIMITER, line, FRONT_MATTER_DELIMITER, content))
}

/// Absolute path of a `/`-separated relative path below `base`
pub fn resolve<P: AsRef<Path>>(base: P, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(base.as_ref().to_path_buf(), |path, part| path.join(part))
}
