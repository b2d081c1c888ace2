/// Markdown document assembly from mapping and analysis results.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::config::Config;
use crate::indexer::core::RepositoryAnalysis;
use crate::mapper::RepositorySummary;
use crate::models::FileNode;

/// Everything one document is rendered from.
pub struct DocumentData<'a> {
    pub repo_name: &'a str,
    pub summary: &'a RepositorySummary,
    pub tree: Option<&'a FileNode>,
    pub analysis: &'a RepositoryAnalysis,
}

pub struct ReportAssembler {
    key_entity_limit: usize,
    structure_depth: usize,
    content: String,
}

impl ReportAssembler {
    pub fn new(config: &Config) -> Self {
        Self {
            key_entity_limit: config.key_entity_limit,
            structure_depth: config.structure_depth,
            content: String::new(),
        }
    }

    /// Renders the full document and keeps it as the current content.
    pub fn generate(&mut self, data: &DocumentData<'_>) -> &str {
        let sections = [
            header(data.repo_name),
            overview(data.summary),
            entry_points(data.summary),
            self.structure(data.tree),
            self.key_entities(data.analysis),
            statistics(data.analysis),
        ];
        self.content = sections.join("\n\n");
        &self.content
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Writes the current content to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.content)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    fn structure(&self, tree: Option<&FileNode>) -> String {
        let Some(tree) = tree else {
            return "## Project Structure\n\nNo files found.".to_string();
        };

        let mut lines = Vec::new();
        for node in tree.iter().filter(|n| n.depth <= self.structure_depth) {
            let indent = "  ".repeat(node.depth);
            let suffix = if node.is_dir { "/" } else { "" };
            lines.push(format!("{indent}{}{suffix}", node.name));
        }
        format!("## Project Structure\n\n```\n{}\n```", lines.join("\n"))
    }

    fn key_entities(&self, analysis: &RepositoryAnalysis) -> String {
        if analysis.entities.is_empty() {
            return "## Key Entities\n\nNo entities found.".to_string();
        }

        let mut content = String::from("## Key Entities\n\n");
        for entity in analysis.entities.iter().take(self.key_entity_limit) {
            content.push_str(&format!(
                "- **{}** ({}) - `{}`:{}\n",
                entity.name,
                entity.kind,
                entity.file_path.display(),
                entity.line_number
            ));
        }
        content.trim_end().to_string()
    }
}

fn header(repo_name: &str) -> String {
    format!(
        "# {repo_name} Documentation\n\nGenerated: {}",
        Local::now().to_rfc3339()
    )
}

fn overview(summary: &RepositorySummary) -> String {
    format!(
        "## Overview\n\nPrimary Language: **{}**\n\n### README\n\n{}",
        summary.primary_language, summary.readme
    )
}

fn entry_points(summary: &RepositorySummary) -> String {
    if summary.entry_points.is_empty() {
        return "## Entry Points\n\nNo entry points identified.".to_string();
    }
    let items: Vec<String> = summary
        .entry_points
        .iter()
        .map(|p| format!("- `{}`", p.display()))
        .collect();
    format!("## Entry Points\n\n{}", items.join("\n"))
}

fn statistics(analysis: &RepositoryAnalysis) -> String {
    let mut content = format!(
        "## Statistics\n\n- **Total Files**: {}\n- **Total Entities**: {}\n",
        analysis.file_count, analysis.entity_count
    );
    for (kind, count) in analysis.kind_counts() {
        content.push_str(&format!("  - {kind}: {count}\n"));
    }
    content.push_str(&format!("- **Last Updated**: {}\n", Local::now().to_rfc3339()));
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::languages::Language;
    use crate::models::{CodeEntity, EntityKind};
    use std::path::PathBuf;

    fn summary() -> RepositorySummary {
        RepositorySummary {
            repo_path: PathBuf::from("/tmp/test_repo"),
            primary_language: Language::Python,
            entry_points: vec![PathBuf::from("app.py")],
            readme: "This is a test repository".to_string(),
        }
    }

    fn analysis(count: usize) -> RepositoryAnalysis {
        let entities: Vec<CodeEntity> = (0..count)
            .map(|i| {
                CodeEntity::new(
                    format!("func_{i}"),
                    EntityKind::Function,
                    "app.py",
                    i + 1,
                    Language::Python,
                )
            })
            .collect();
        RepositoryAnalysis {
            entity_count: entities.len(),
            file_count: 5,
            entities,
        }
    }

    #[test]
    fn test_generate_sections() {
        let mut tree = FileNode::directory("/tmp/test_repo".into(), "test_repo".into(), 0);
        tree.children.push(FileNode::file(
            "/tmp/test_repo/app.py".into(),
            "app.py".into(),
            Language::Python,
            12,
            1,
        ));
        let summary = summary();
        let analysis = analysis(1);
        let mut assembler = ReportAssembler::new(&Config::default());

        let doc = assembler
            .generate(&DocumentData {
                repo_name: "test_repo",
                summary: &summary,
                tree: Some(&tree),
                analysis: &analysis,
            })
            .to_string();

        assert!(doc.starts_with("# test_repo Documentation"));
        assert!(doc.contains("Primary Language: **python**"));
        assert!(doc.contains("This is a test repository"));
        assert!(doc.contains("- `app.py`"));
        assert!(doc.contains("test_repo/\n  app.py"));
        assert!(doc.contains("- **func_0** (function) - `app.py`:1"));
        assert!(doc.contains("- **Total Files**: 5"));
        assert!(doc.contains("- **Total Entities**: 1"));
        assert!(doc.contains("  - function: 1"));
        assert_eq!(assembler.content(), doc);
    }

    #[test]
    fn test_key_entities_are_limited() {
        let summary = summary();
        let analysis = analysis(15);
        let mut assembler = ReportAssembler::new(&Config::default());

        let doc = assembler.generate(&DocumentData {
            repo_name: "big",
            summary: &summary,
            tree: None,
            analysis: &analysis,
        });

        assert!(doc.contains("**func_9**"));
        assert!(!doc.contains("**func_10**"));
        assert!(doc.contains("- **Total Entities**: 15"));
        assert!(doc.contains("No files found."));
    }

    #[test]
    fn test_no_entities() {
        let summary = summary();
        let analysis = RepositoryAnalysis::default();
        let mut assembler = ReportAssembler::new(&Config::default());

        let doc = assembler.generate(&DocumentData {
            repo_name: "empty",
            summary: &summary,
            tree: None,
            analysis: &analysis,
        });
        assert!(doc.contains("## Key Entities\n\nNo entities found."));
    }

    #[test]
    fn test_structure_depth_is_bounded() {
        let mut config = Config::default();
        config.structure_depth = 1;

        let mut inner = FileNode::directory("/r/src".into(), "src".into(), 1);
        inner.children.push(FileNode::file(
            "/r/src/deep.py".into(),
            "deep.py".into(),
            Language::Python,
            1,
            2,
        ));
        let mut tree = FileNode::directory("/r".into(), "r".into(), 0);
        tree.children.push(inner);

        let assembler = ReportAssembler::new(&config);
        let section = assembler.structure(Some(&tree));
        assert!(section.contains("  src/"));
        assert!(!section.contains("deep.py"));
    }

    #[test]
    fn test_save() {
        let temp = tempfile::tempdir().unwrap();
        let summary = summary();
        let analysis = analysis(2);
        let mut assembler = ReportAssembler::new(&Config::default());
        assembler.generate(&DocumentData {
            repo_name: "saved",
            summary: &summary,
            tree: None,
            analysis: &analysis,
        });

        let path = temp.path().join("saved_documentation.md");
        assembler.save(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), assembler.content());

        let bad = temp.path().join("missing-dir").join("x.md");
        assert!(assembler.save(&bad).is_err());
    }
}
