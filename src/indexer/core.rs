use super::code_parser::{EntityExtractor, ExtractError};
use super::file_tree::IgnoreRules;
use super::languages::classify;
use crate::models::{CodeEntity, CodeRelationship, EntityKind, FileNode};
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Aggregated result of analyzing one repository tree.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RepositoryAnalysis {
    pub entities: Vec<CodeEntity>,
    pub entity_count: usize,
    /// Files selected for extraction, whether or not they yielded entities.
    pub file_count: usize,
}

impl RepositoryAnalysis {
    /// Entity totals per kind, in kind order.
    pub fn kind_counts(&self) -> BTreeMap<EntityKind, usize> {
        let mut counts = BTreeMap::new();
        for entity in &self.entities {
            *counts.entry(entity.kind).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub total_entities: usize,
    pub total_relationships: usize,
    pub entity_types: BTreeMap<EntityKind, usize>,
}

pub struct CodeAnalyzer {
    extractor: EntityExtractor,
    ignore: IgnoreRules,
    entities: HashMap<String, CodeEntity>,
    relationships: Vec<CodeRelationship>,
}

impl CodeAnalyzer {
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_ignore_rules(IgnoreRules::default())
    }

    pub fn with_ignore_rules(ignore: IgnoreRules) -> Result<Self, ExtractError> {
        Ok(Self {
            extractor: EntityExtractor::new()?,
            ignore,
            entities: HashMap::new(),
            relationships: Vec::new(),
        })
    }

    /// Extracts entities from a single file and records them in the registry.
    pub fn analyze_file<P: AsRef<Path>>(&mut self, file_path: P) -> Vec<CodeEntity> {
        let entities = self.extractor.extract(file_path);
        for entity in &entities {
            self.entities.insert(entity.qualified_key(), entity.clone());
        }
        entities
    }

    /// Runs extraction over every analyzable leaf of `tree`, in traversal order.
    pub fn analyze_repository(&mut self, tree: Option<&FileNode>) -> RepositoryAnalysis {
        let Some(tree) = tree else {
            return RepositoryAnalysis::default();
        };

        let file_paths = collect_code_files(tree);
        let mut all_entities = Vec::new();
        for path in &file_paths {
            all_entities.extend(self.analyze_file(path));
        }

        info!(
            "Analyzed {} files, found {} entities",
            file_paths.len(),
            all_entities.len()
        );

        RepositoryAnalysis {
            entity_count: all_entities.len(),
            file_count: file_paths.len(),
            entities: all_entities,
        }
    }

    /// Scans a directory on disk without building a tree first. Honors
    /// `.gitignore` files as well as the ignore rules.
    pub fn analyze_directory<P: AsRef<Path>>(
        &mut self,
        root: P,
    ) -> BTreeMap<PathBuf, Vec<CodeEntity>> {
        let ignore = self.ignore.clone();
        let walker = WalkBuilder::new(root.as_ref())
            .hidden(false)
            .filter_entry(move |entry| !ignore.is_ignored(&entry.file_name().to_string_lossy()))
            .build();

        let mut results = BTreeMap::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() || !classify(path).is_extractable() {
                continue;
            }
            let entities = self.analyze_file(path);
            results.insert(path.to_path_buf(), entities);
        }

        results
    }

    /// Every entity seen so far, keyed `<path>::<name>`.
    pub fn entities(&self) -> &HashMap<String, CodeEntity> {
        &self.entities
    }

    /// Relationship records. No extractor produces these yet.
    pub fn relationships(&self) -> &[CodeRelationship] {
        &self.relationships
    }

    pub fn graph_stats(&self) -> GraphStats {
        let mut entity_types = BTreeMap::new();
        for entity in self.entities.values() {
            *entity_types.entry(entity.kind).or_insert(0) += 1;
        }
        GraphStats {
            total_entities: self.entities.len(),
            total_relationships: self.relationships.len(),
            entity_types,
        }
    }
}

/// Analyzable leaf paths, parent before children, siblings in stored order.
fn collect_code_files(tree: &FileNode) -> Vec<PathBuf> {
    tree.files()
        .filter(|n| n.language.is_extractable())
        .map(|n| n.path.clone())
        .collect()
}
