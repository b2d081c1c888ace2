//! # codegenius - Repository Documentation Generator
//!
//! Maps a repository (local directory or git URL), extracts code entities
//! and renders a single markdown document describing it. Also serves the
//! pipeline to AI assistants via the Model Context Protocol (MCP).
//!
//! ## Architecture
//!
//! - **[`config`]** - Configuration loading, validation, and defaults
//! - **[`models`]** - File tree nodes, code entities, relationship records
//! - **[`indexer`]** - File tree building, language classification, entity extraction
//! - **[`mapper`]** - Repository acquisition (clone or local) and structural summary
//! - **[`report`]** - Markdown document assembly
//! - **[`supervisor`]** - End-to-end pipeline orchestration
//! - **[`mcp`]** - MCP server with 4 tool handlers (stdio transport via rmcp)

pub mod config;
pub mod indexer;
pub mod mapper;
pub mod mcp;
pub mod models;
pub mod report;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod test_utils;
