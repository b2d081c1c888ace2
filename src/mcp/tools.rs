/// MCP Tool handlers for codegenius.
///
/// 1. process_repository  – run the documentation pipeline on a repository
/// 2. get_documentation   – fetch the most recently generated document
/// 3. list_generated_docs – list documents in the output directory
/// 4. analyze_code        – extract entities from a local directory
use crate::indexer::core::CodeAnalyzer;
use crate::mcp::server::McpContext;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::PathBuf;

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct ProcessRepositoryParams {
    /// Git URL or local directory of the repository to document
    repo_url: String,
}

#[derive(Deserialize, JsonSchema)]
struct AnalyzeCodeParams {
    /// Directory to analyze recursively
    directory: String,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: McpContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    // ── Tool 1: process_repository ──────────────────────────────────

    #[tool(
        description = "Generate markdown documentation for a repository. Accepts a git URL (shallow-cloned into a temporary directory) or a local directory path."
    )]
    async fn process_repository(
        &self,
        params: Parameters<ProcessRepositoryParams>,
    ) -> Result<CallToolResult, McpError> {
        let repo_url = params.0.repo_url.trim().to_string();
        if repo_url.is_empty() {
            return error_result("repo_url is required");
        }

        let mut supervisor = self.ctx.supervisor.lock().await;
        let outcome = supervisor.process_repository(&repo_url).await;

        let value = serde_json::to_value(&outcome)
            .map_err(|e| McpError::internal_error(format!("serialize failed: {e}"), None))?;
        json_result(value)
    }

    // ── Tool 2: get_documentation ───────────────────────────────────

    #[tool(description = "Return the text of the most recently generated documentation")]
    async fn get_documentation(&self) -> Result<CallToolResult, McpError> {
        let supervisor = self.ctx.supervisor.lock().await;
        match supervisor.get_documentation() {
            Some(doc) => Ok(CallToolResult::success(vec![Content::text(doc)])),
            None => error_result("No documentation has been generated yet"),
        }
    }

    // ── Tool 3: list_generated_docs ─────────────────────────────────

    #[tool(description = "List documentation files in the output directory")]
    async fn list_generated_docs(&self) -> Result<CallToolResult, McpError> {
        let supervisor = self.ctx.supervisor.lock().await;
        let docs = supervisor.list_generated_docs();

        json_result(serde_json::json!({
            "output_dir": supervisor.output_dir(),
            "documents": docs,
        }))
    }

    // ── Tool 4: analyze_code ────────────────────────────────────────

    #[tool(
        description = "Extract functions, classes, nodes and walkers from Python and JAC files under a local directory, without writing documentation"
    )]
    async fn analyze_code(
        &self,
        params: Parameters<AnalyzeCodeParams>,
    ) -> Result<CallToolResult, McpError> {
        let directory = PathBuf::from(params.0.directory.trim());
        if directory.as_os_str().is_empty() {
            return error_result("directory is required");
        }
        if !directory.is_dir() {
            return error_result(&format!("directory not found: {}", directory.display()));
        }

        let ignore = self
            .ctx
            .config
            .ignore_rules()
            .map_err(|e| McpError::invalid_params(format!("{e:#}"), None))?;

        let (files, stats) = tokio::task::spawn_blocking(move || {
            let mut analyzer = CodeAnalyzer::with_ignore_rules(ignore)?;
            let files = analyzer.analyze_directory(&directory);
            Ok::<_, crate::indexer::code_parser::ExtractError>((files, analyzer.graph_stats()))
        })
        .await
        .map_err(|e| McpError::internal_error(format!("analysis task failed: {e}"), None))?
        .map_err(|e| McpError::internal_error(format!("analyzer init failed: {e}"), None))?;

        let files_json: Vec<serde_json::Value> = files
            .iter()
            .map(|(path, entities)| {
                serde_json::json!({
                    "file": path,
                    "entities": entities,
                })
            })
            .collect();

        json_result(serde_json::json!({
            "files": files_json,
            "stats": stats,
        }))
    }
}
