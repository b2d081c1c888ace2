//! Shared data model: the walked file tree, discovered code entities, and
//! the (not yet populated) relationship records between them.
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::indexer::languages::Language;

/// One filesystem entry in a walked repository tree.
///
/// Children are owned exclusively by their parent and have no back-pointer.
/// The tree builder stores siblings sorted by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub language: Language,
    pub size: u64,
    pub depth: usize,
    pub children: Vec<FileNode>,
}

impl FileNode {
    pub fn directory(path: PathBuf, name: String, depth: usize) -> Self {
        Self {
            path,
            name,
            is_dir: true,
            language: Language::Unknown,
            size: 0,
            depth,
            children: Vec::new(),
        }
    }

    pub fn file(path: PathBuf, name: String, language: Language, size: u64, depth: usize) -> Self {
        Self {
            path,
            name,
            is_dir: false,
            language,
            size,
            depth,
            children: Vec::new(),
        }
    }

    /// Pre-order traversal: a node is yielded before its children, siblings in
    /// stored order.
    pub fn iter(&self) -> FileNodeIter<'_> {
        FileNodeIter { stack: vec![self] }
    }

    /// Leaf nodes only, in traversal order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.iter().filter(|n| !n.is_dir)
    }

    /// Number of files in the tree, optionally restricted to one language.
    pub fn count_files(&self, language: Option<Language>) -> usize {
        self.files()
            .filter(|n| language.is_none_or(|l| n.language == l))
            .count()
    }

    pub fn files_by_language(&self, language: Language) -> Vec<&Path> {
        self.files()
            .filter(|n| n.language == language)
            .map(|n| n.path.as_path())
            .collect()
    }
}

pub struct FileNodeIter<'a> {
    stack: Vec<&'a FileNode>,
}

impl<'a> Iterator for FileNodeIter<'a> {
    type Item = &'a FileNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Kind of declaration an entity was discovered as.
///
/// New languages add variants here so every `match` on the kind is forced to
/// handle them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Function,
    Class,
    /// JAC `node` declaration.
    Node,
    /// JAC `walker` declaration.
    Walker,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Class => "class",
            EntityKind::Node => "node",
            EntityKind::Walker => "walker",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub file_path: PathBuf,
    /// 1-based.
    pub line_number: usize,
    pub end_line: usize,
    pub language: Language,
    pub docstring: Option<String>,
    pub signature: Option<String>,
    pub modifiers: Vec<String>,
    /// Name of the enclosing entity, used as a lookup key only.
    pub parent_entity: Option<String>,
}

impl CodeEntity {
    pub fn new(
        name: impl Into<String>,
        kind: EntityKind,
        file_path: impl Into<PathBuf>,
        line_number: usize,
        language: Language,
    ) -> Self {
        let line_number = line_number.max(1);
        Self {
            name: name.into(),
            kind,
            file_path: file_path.into(),
            line_number,
            end_line: line_number,
            language,
            docstring: None,
            signature: None,
            modifiers: Vec::new(),
            parent_entity: None,
        }
    }

    /// Sets the end line, never letting it fall before the start line.
    pub fn with_end_line(mut self, end_line: usize) -> Self {
        self.end_line = end_line.max(self.line_number);
        self
    }

    /// Registry key used by the analyzer: `<path>::<name>`.
    pub fn qualified_key(&self) -> String {
        format!("{}::{}", self.file_path.display(), self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Calls,
    Extends,
    Implements,
    Imports,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Calls => "calls",
            RelationKind::Extends => "extends",
            RelationKind::Implements => "implements",
            RelationKind::Imports => "imports",
        }
    }
}

/// A directed edge between two entities. Nothing produces these yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeRelationship {
    pub source_entity: String,
    pub target_entity: String,
    pub relationship_type: RelationKind,
    pub source_file: PathBuf,
    pub target_file: PathBuf,
    pub line_number: usize,
}
