use serde::Serialize;
use std::path::Path;

/// Language tag assigned to a file from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Jac,
    JavaScript,
    TypeScript,
    Java,
    Go,
    Rust,
    Cpp,
    #[default]
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Jac => "jac",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Cpp => "cpp",
            Language::Unknown => "unknown",
        }
    }

    /// Looks up a bare extension (no dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Language::Python,
            "jac" => Language::Jac,
            "js" | "jsx" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "cpp" | "cc" | "cxx" | "h" | "hpp" => Language::Cpp,
            _ => Language::Unknown,
        }
    }

    /// Whether entities can currently be extracted from files of this language.
    pub fn is_extractable(&self) -> bool {
        matches!(self, Language::Python | Language::Jac)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a file name (or path) by its extension.
pub fn classify<P: AsRef<Path>>(filename: P) -> Language {
    filename
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(Language::from_extension)
        .unwrap_or(Language::Unknown)
}

/// Tree-sitter grammar plus the declaration query run against it.
pub struct GrammarConfig {
    pub language: tree_sitter::Language,
    pub query: &'static str,
}

pub fn python_grammar() -> GrammarConfig {
    GrammarConfig {
        language: tree_sitter_python::LANGUAGE.into(),
        query: r#"
(function_definition
  name: (identifier) @name) @function

(class_definition
  name: (identifier) @name) @class
"#,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_extensions() {
        assert_eq!(classify("x.py"), Language::Python);
        assert_eq!(classify("graph.jac"), Language::Jac);
        assert_eq!(classify("app.js"), Language::JavaScript);
        assert_eq!(classify("app.ts"), Language::TypeScript);
        assert_eq!(classify("Main.java"), Language::Java);
        assert_eq!(classify("main.go"), Language::Go);
        assert_eq!(classify("lib.rs"), Language::Rust);
        assert_eq!(classify("engine.cc"), Language::Cpp);
        assert_eq!(classify("engine.h"), Language::Cpp);
        assert_eq!(classify("engine.cpp"), Language::Cpp);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("X.PY"), Language::Python);
        assert_eq!(classify("Walkers.JaC"), Language::Jac);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("x.unknownext"), Language::Unknown);
        assert_eq!(classify("Makefile"), Language::Unknown);
        assert_eq!(classify(".bashrc"), Language::Unknown);
    }

    #[test]
    fn test_classify_full_path() {
        assert_eq!(classify("/tmp/repo/src/util.py"), Language::Python);
    }

    #[test]
    fn test_extractable_set() {
        assert!(Language::Python.is_extractable());
        assert!(Language::Jac.is_extractable());
        assert!(!Language::Rust.is_extractable());
        assert!(!Language::Unknown.is_extractable());
    }

    #[test]
    fn test_python_query_compiles() {
        let grammar = python_grammar();
        assert!(tree_sitter::Query::new(&grammar.language, grammar.query).is_ok());
    }
}
