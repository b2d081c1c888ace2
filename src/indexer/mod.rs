//! Repository walking and code entity extraction.
pub mod code_parser;
pub mod core;
pub mod file_tree;
pub mod languages;

pub use code_parser::{EntityExtractor, ExtractError};
pub use self::core::{CodeAnalyzer, GraphStats, RepositoryAnalysis};
pub use file_tree::{FileTreeBuilder, IgnoreRules, build_tree};
pub use languages::{Language, classify};
