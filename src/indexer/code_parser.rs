use super::languages::{Language, classify, python_grammar};
use crate::models::{CodeEntity, EntityKind};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;
use tree_sitter::{Node, Parser, Query, QueryCursor, StreamingIterator};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("invalid declaration query: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("syntax error in source")]
    Syntax,
}

/// Pulls named declarations out of source files.
///
/// Python goes through tree-sitter; JAC is scanned with two regexes. Every
/// other language yields nothing.
static JAC_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnode\s+(\w+)").expect("valid node regex"));
static JAC_WALKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bwalker\s+(\w+)").expect("valid walker regex"));

pub struct EntityExtractor {
    parser: Parser,
    python_query: Query,
}

impl EntityExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let grammar = python_grammar();
        let mut parser = Parser::new();
        parser.set_language(&grammar.language)?;
        let python_query = Query::new(&grammar.language, grammar.query)?;

        Ok(Self {
            parser,
            python_query,
        })
    }

    /// Extracts entities from one file. Read and parse failures are logged and
    /// produce an empty list.
    pub fn extract<P: AsRef<Path>>(&mut self, file_path: P) -> Vec<CodeEntity> {
        let file_path = file_path.as_ref();
        match self.try_extract(file_path) {
            Ok(entities) => entities,
            Err(e) => {
                warn!("Error analyzing {}: {e}", file_path.display());
                Vec::new()
            }
        }
    }

    pub fn try_extract(&mut self, file_path: &Path) -> Result<Vec<CodeEntity>, ExtractError> {
        match classify(file_path) {
            Language::Python => {
                let source = fs::read(file_path)?;
                self.extract_python(&source, file_path)
            }
            Language::Jac => {
                let source = fs::read(file_path)?;
                Ok(self.extract_jac(&String::from_utf8_lossy(&source), file_path))
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Every function and class definition in the module, nested ones
    /// included, in source order.
    pub fn extract_python(
        &mut self,
        source: &[u8],
        file_path: &Path,
    ) -> Result<Vec<CodeEntity>, ExtractError> {
        let tree = self.parser.parse(source, None).ok_or(ExtractError::Syntax)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(ExtractError::Syntax);
        }

        let query = &self.python_query;
        let mut cursor = QueryCursor::new();
        let mut entities = Vec::new();
        let mut seen = HashSet::new();

        let mut matches = cursor.matches(query, root, source);
        while let Some(m) = matches.next() {
            let mut main_node = None;
            let mut kind = None;
            let mut name = None;

            for cap in m.captures {
                match query.capture_names()[cap.index as usize] {
                    "name" => name = cap.node.utf8_text(source).ok(),
                    "function" => {
                        main_node = Some(cap.node);
                        kind = Some(EntityKind::Function);
                    }
                    "class" => {
                        main_node = Some(cap.node);
                        kind = Some(EntityKind::Class);
                    }
                    _ => {}
                }
            }

            let (Some(node), Some(kind), Some(name)) = (main_node, kind, name) else {
                continue;
            };
            if !seen.insert(node.start_byte()) {
                continue;
            }

            let mut entity = CodeEntity::new(
                name,
                kind,
                file_path,
                node.start_position().row + 1,
                Language::Python,
            )
            .with_end_line(node.end_position().row + 1);
            entity.docstring = python_docstring(node, source);
            entity.signature = python_signature(node, source);
            entity.modifiers = python_modifiers(node, source);

            entities.push((node.start_byte(), entity));
        }

        entities.sort_by_key(|(start, _)| *start);
        Ok(entities.into_iter().map(|(_, e)| e).collect())
    }

    /// `node X` declarations first, then `walker Y`, each in text order.
    pub fn extract_jac(&self, content: &str, file_path: &Path) -> Vec<CodeEntity> {
        let mut entities = Vec::new();
        for (pattern, kind) in [
            (&*JAC_NODE, EntityKind::Node),
            (&*JAC_WALKER, EntityKind::Walker),
        ] {
            for caps in pattern.captures_iter(content) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let line = line_at(content, whole.start());
                entities.push(CodeEntity::new(
                    name.as_str(),
                    kind,
                    file_path,
                    line,
                    Language::Jac,
                ));
            }
        }
        entities
    }
}

/// 1-based line of a byte offset.
fn line_at(content: &str, offset: usize) -> usize {
    content[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

/// Header of a `def`/`class` up to its own colon, collapsed to one line.
/// Comments after the colon and the body are left out.
fn python_signature(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let colon = node.children(&mut cursor).filter(|c| c.kind() == ":").last()?;
    let header = source.get(node.start_byte()..colon.start_byte())?;
    let header = std::str::from_utf8(header).ok()?;
    let signature = header.split_whitespace().collect::<Vec<_>>().join(" ");
    (!signature.is_empty()).then_some(signature)
}

fn python_modifiers(node: Node, source: &[u8]) -> Vec<String> {
    let mut modifiers = Vec::new();

    if let Some(parent) = node.parent() {
        if parent.kind() == "decorated_definition" {
            let mut cursor = parent.walk();
            for child in parent.children(&mut cursor) {
                if child.kind() != "decorator" {
                    continue;
                }
                if let Ok(text) = child.utf8_text(source) {
                    let text = text.trim_start_matches('@').trim();
                    let name = text.split('(').next().unwrap_or(text).trim();
                    if !name.is_empty() {
                        modifiers.push(name.to_string());
                    }
                }
            }
        }
    }

    let mut cursor = node.walk();
    if node.children(&mut cursor).any(|c| c.kind() == "async") {
        modifiers.insert(0, "async".to_string());
    }

    modifiers
}

/// The string literal opening a function or class body, if there is one.
fn python_docstring(node: Node, source: &[u8]) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    let raw = literal.utf8_text(source).ok()?;
    let doc = clean_docstring(strip_string_quotes(raw));
    (!doc.is_empty()).then_some(doc)
}

fn strip_string_quotes(raw: &str) -> &str {
    let unprefixed = raw.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = unprefixed
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    unprefixed
}

/// Trims the first line and removes the common indentation of the rest.
fn clean_docstring(doc: &str) -> String {
    let mut lines = doc.lines();
    let first = lines.next().unwrap_or("").trim().to_string();
    let rest: Vec<&str> = lines.collect();

    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first];
    cleaned.extend(rest.iter().map(|l| {
        l.get(indent..)
            .map(str::trim_end)
            .unwrap_or_else(|| l.trim())
            .to_string()
    }));

    cleaned.join("\n").trim().to_string()
}
