use crate::error::{Result, ScaffoldError};
use crate::language::Language;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// AST-based extractor for a file's exported surface
pub struct ScaffoldExtractor {
    parser: Parser,
}

impl ScaffoldExtractor {
    /// Create a new extractor for a language
    pub fn new(language: Language) -> Result<Self> {
        if !language.supports_scaffold() {
            return Err(ScaffoldError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ScaffoldError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser })
    }

    /// Extract the exported surface of `content`.
    ///
    /// Deterministic and idempotent: identical content always yields an
    /// identical scaffold, and private/protected members never appear.
    pub fn extract(&mut self, content: &str) -> Result<String> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ScaffoldError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        let mut scaffold = String::new();
        let mut cursor = root.walk();

        for child in root.named_children(&mut cursor) {
            if child.kind() == "export_statement" {
                // `export class Foo {}` wraps the declaration; comments sit
                // on the export statement itself.
                let comments = leading_comments(child, content);
                let mut inner = child.walk();
                for decl in child.named_children(&mut inner) {
                    emit_declaration(&mut scaffold, decl, content, &comments);
                }
            } else if node_text(child, content).starts_with("export ") {
                let comments = leading_comments(child, content);
                emit_declaration(&mut scaffold, child, content, &comments);
            }
        }

        Ok(scaffold.trim().to_string())
    }
}

/// Extract the scaffold of a file on disk.
///
/// Returns `None` for file types scaffolding is not defined for.
pub fn scaffold_file(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    let language = Language::from_path(path);
    if !language.supports_scaffold() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let mut extractor = ScaffoldExtractor::new(language)?;
    Ok(Some(extractor.extract(&content)?))
}

fn emit_declaration(scaffold: &mut String, node: Node, content: &str, comments: &str) {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" => {
            scaffold.push_str(comments);
            scaffold.push_str(&class_scaffold(node, content));
            scaffold.push_str("\n\n");
        }
        "function_declaration" | "generator_function_declaration" => {
            scaffold.push_str(comments);
            scaffold.push_str(&function_scaffold(node, content));
            scaffold.push_str("\n\n");
        }
        "interface_declaration" | "type_alias_declaration" => {
            scaffold.push_str(comments);
            scaffold.push_str(node_text(node, content));
            scaffold.push_str("\n\n");
        }
        "lexical_declaration" | "variable_declaration" => {
            scaffold.push_str(comments);
            scaffold.push_str(&variable_scaffold(node, content));
            scaffold.push('\n');
        }
        _ => {}
    }
}

/// Class header plus public member signatures, bodies elided
fn class_scaffold(node: Node, content: &str) -> String {
    let text = node_text(node, content);
    let header = text.split('{').next().unwrap_or(text).trim();
    let mut scaffold = format!("{header} {{\n");

    let mut cursor = node.walk();
    let class_body = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "class_body");

    if let Some(body) = class_body {
        let mut body_cursor = body.walk();
        for member in body.named_children(&mut body_cursor) {
            if is_private_member(member, content) {
                continue;
            }

            match member.kind() {
                "method_definition" | "abstract_method_signature" | "method_signature" => {
                    scaffold.push_str(&leading_comments(member, content));
                    scaffold.push_str("  ");
                    scaffold.push_str(&method_signature(member, content));
                    scaffold.push('\n');
                }
                "public_field_definition" | "property_signature" => {
                    scaffold.push_str(&leading_comments(member, content));
                    scaffold.push_str("  ");
                    scaffold.push_str(&property_signature(member, content));
                    scaffold.push('\n');
                }
                _ => {}
            }
        }
    }

    scaffold.push('}');
    scaffold
}

fn function_scaffold(node: Node, content: &str) -> String {
    let text = node_text(node, content);
    let signature = text.split('{').next().unwrap_or(text).trim();
    ensure_semicolon(signature)
}

fn variable_scaffold(node: Node, content: &str) -> String {
    let text = node_text(node, content);
    let lhs = text.split('=').next().unwrap_or(text).trim();
    ensure_semicolon(lhs)
}

fn method_signature(node: Node, content: &str) -> String {
    let text = node_text(node, content);
    let signature = text.split('{').next().unwrap_or(text).trim();
    let signature = ensure_semicolon(signature.trim_end_matches(';').trim_end());
    ensure_public_prefix(&signature)
}

fn property_signature(node: Node, content: &str) -> String {
    let text = node_text(node, content);
    let without_initializer = text.split('=').next().unwrap_or(text).trim();
    let signature = ensure_semicolon(without_initializer.trim_end_matches(';').trim_end());
    ensure_public_prefix(&signature)
}

/// Private by modifier (`private`/`protected`) or by `#name`
fn is_private_member(member: Node, content: &str) -> bool {
    let mut cursor = member.walk();
    for child in member.children(&mut cursor) {
        match child.kind() {
            "accessibility_modifier" => {
                let modifier = node_text(child, content);
                if modifier == "private" || modifier == "protected" {
                    return true;
                }
            }
            "private_property_identifier" => return true,
            _ => {}
        }
    }
    false
}

/// Comments directly above `node`, separated from it by whitespace only
fn leading_comments(node: Node, content: &str) -> String {
    let mut comments: Vec<&str> = Vec::new();
    let mut boundary = node.start_byte();
    let mut current = node;

    while let Some(prev) = current.prev_sibling() {
        if prev.kind() != "comment" {
            break;
        }
        let gap = &content[prev.end_byte()..boundary];
        if !gap.chars().all(char::is_whitespace) {
            break;
        }
        comments.push(node_text(prev, content));
        boundary = prev.start_byte();
        current = prev;
    }

    if comments.is_empty() {
        return String::new();
    }
    comments.reverse();
    let mut joined = comments.join("\n");
    joined.push('\n');
    joined
}

fn ensure_semicolon(text: &str) -> String {
    if text.ends_with(';') {
        text.to_string()
    } else {
        format!("{text};")
    }
}

fn ensure_public_prefix(signature: &str) -> String {
    if signature.starts_with("public ") {
        signature.to_string()
    } else {
        format!("public {signature}")
    }
}

fn node_text<'a>(node: Node, content: &'a str) -> &'a str {
    &content[node.start_byte()..node.end_byte()]
}
