/*!
 * Translation status tree and approved-file resolution.
 *
 * The platform reports, per language, a tree of directory and file nodes
 * with word counts. Only leaf file nodes can be approved; directories just
 * contribute their name to the paths of their children.
 */

use serde::Deserialize;
use std::collections::BTreeSet;

use crate::providers::deserialize_count;

/// Extension of message catalog files
pub const MESSAGE_FILE_EXTENSION: &str = ".po";

/// Kind of a status tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
    /// Version branches and anything else the platform may add
    #[serde(other)]
    Other,
}

/// One node of the status tree
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusNode {
    pub name: String,
    pub node_type: NodeType,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub words: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub words_approved: u64,
    #[serde(default)]
    pub files: Vec<StatusNode>,
}

/// Status tree for one language (`language-status`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LanguageStatus {
    #[serde(default)]
    pub files: Vec<StatusNode>,
}

impl StatusNode {
    /// Leaf file node
    pub fn file(name: &str, words: u64, words_approved: u64) -> Self {
        Self {
            name: name.to_string(),
            node_type: NodeType::File,
            words,
            words_approved,
            files: Vec::new(),
        }
    }

    /// Directory node holding `files`
    pub fn directory(name: &str, files: Vec<StatusNode>) -> Self {
        Self {
            name: name.to_string(),
            node_type: NodeType::Directory,
            words: 0,
            words_approved: 0,
            files,
        }
    }

    /// Whether this node is a file ready to be pulled
    ///
    /// Fully approved files always are; message catalogs are as soon as a
    /// single word is approved, since catalogs merge incrementally.
    pub fn is_approved(&self) -> bool {
        if self.node_type != NodeType::File {
            return false;
        }
        let fully_approved = self.words == self.words_approved;
        let partial_catalog = self.name.ends_with(MESSAGE_FILE_EXTENSION) && self.words_approved > 0;
        fully_approved || partial_catalog
    }
}

/// Repository-relative paths of every approved file in `status`
pub fn approved_files(status: &LanguageStatus) -> BTreeSet<String> {
    let mut approved = BTreeSet::new();
    // (node, parent path)
    let mut stack: Vec<(&StatusNode, String)> = status.files.iter().map(|n| (n, String::new())).collect();

    while let Some((node, parent)) = stack.pop() {
        let path = if parent.is_empty() {
            node.name.clone()
        } else {
            format!("{}/{}", parent, node.name)
        };
        if node.is_approved() {
            approved.insert(path.clone());
        }
        for child in &node.files {
            stack.push((child, path.clone()));
        }
    }

    approved
}
