/// End-to-end documentation pipeline: acquire → map → analyze → render → write.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::indexer::core::CodeAnalyzer;
use crate::mapper::{AcquireError, RepoMapper, repo_name};
use crate::report::{DocumentData, ReportAssembler};

pub const DOC_SUFFIX: &str = "_documentation.md";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to clone repository: {0}")]
    Acquisition(#[from] AcquireError),

    #[error("Failed to save documentation: {0:#}")]
    Write(anyhow::Error),
}

/// Uniform result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub message: String,
    pub output_path: Option<PathBuf>,
}

pub struct Supervisor {
    output_dir: PathBuf,
    mapper: RepoMapper,
    analyzer: CodeAnalyzer,
    assembler: ReportAssembler,
    current_doc: Option<PathBuf>,
}

impl Supervisor {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            output_dir: config.output_dir.clone(),
            mapper: RepoMapper::new(config)?,
            analyzer: CodeAnalyzer::with_ignore_rules(config.ignore_rules()?)?,
            assembler: ReportAssembler::new(config),
            current_doc: None,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Documents the repository at `location` (local directory or clone URL).
    ///
    /// Never fails outright; problems are reported through the outcome.
    pub async fn process_repository(&mut self, location: &str) -> ProcessOutcome {
        match self.run(location).await {
            Ok(path) => {
                info!("Documentation written to {}", path.display());
                self.current_doc = Some(path.clone());
                ProcessOutcome {
                    success: true,
                    message: "Documentation generated successfully".to_string(),
                    output_path: Some(path),
                }
            }
            Err(e) => {
                error!("Processing {location} failed: {e}");
                ProcessOutcome {
                    success: false,
                    message: e.to_string(),
                    output_path: None,
                }
            }
        }
    }

    async fn run(&mut self, location: &str) -> Result<PathBuf, PipelineError> {
        let checkout = self.mapper.acquire(location).await?;
        let result = self.document(checkout.root(), location);
        checkout.cleanup();
        result
    }

    fn document(&mut self, root: &Path, location: &str) -> Result<PathBuf, PipelineError> {
        let map = self.mapper.map(root);
        let analysis = self.analyzer.analyze_repository(map.tree.as_ref());

        let name = repo_name(location);
        self.assembler.generate(&DocumentData {
            repo_name: &name,
            summary: &map.summary,
            tree: map.tree.as_ref(),
            analysis: &analysis,
        });

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| PipelineError::Write(anyhow::Error::new(e).context(format!(
                "failed to create {}",
                self.output_dir.display()
            ))))?;
        let output_file = self.output_dir.join(format!("{name}{DOC_SUFFIX}"));
        self.assembler
            .save(&output_file)
            .map_err(PipelineError::Write)?;

        Ok(output_file)
    }

    /// Text of the last document this supervisor wrote, if it is still readable.
    pub fn get_documentation(&self) -> Option<String> {
        let path = self.current_doc.as_ref()?;
        fs::read_to_string(path).ok()
    }

    /// File names of generated documents in the output directory, sorted.
    pub fn list_generated_docs(&self) -> Vec<String> {
        list_generated_docs(&self.output_dir)
    }
}

/// File names in `dir` ending with [`DOC_SUFFIX`], sorted. Empty when the
/// directory is missing.
pub fn list_generated_docs(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(DOC_SUFFIX))
        .collect();
    names.sort();
    names
}
