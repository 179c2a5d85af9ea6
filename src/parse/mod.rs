//! tree-sitter parsing and conversion into the owned graph model.
//!
//! The parse tree is copied into a [`Graph`] in a single preorder
//! pass and the tree-sitter tree is dropped; nothing downstream holds
//! grammar lifetimes. Only named grammar nodes are materialized;
//! punctuation and keyword tokens carry no analysis value.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, ScanError};
use crate::graph::{Graph, NId, Node};
use crate::lang::Language;

/// Parse one file's source into a graph.
///
/// A grammar that cannot load is a fatal error; a file tree-sitter
/// cannot produce output for is a recoverable per-file parse error.
/// Partial trees with error nodes are kept: analysis degrades to the
/// recognizable parts.
pub fn parse_source(lang: &dyn Language, source: &str, path: &Path) -> Result<Graph> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&lang.grammar())
        .map_err(|e| ScanError::Grammar {
            language: lang.name(),
            message: e.to_string(),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ScanError::Parse {
            file: path.display().to_string(),
            message: "parser produced no tree".to_owned(),
        })?;

    if tree.root_node().has_error() {
        debug!(
            path = %path.display(),
            "parse tree contains error nodes, continuing with partial tree"
        );
    }
    Ok(to_graph(lang, source, &tree))
}

fn to_graph(lang: &dyn Language, source: &str, tree: &tree_sitter::Tree) -> Graph {
    let mut graph = Graph::new();
    let mut cursor = tree.root_node().walk();
    // Ancestor chain of materialized nodes, and one flag per descent
    // level recording whether that level added a node.
    let mut parents: Vec<NId> = Vec::new();
    let mut added_at_level: Vec<bool> = Vec::new();

    loop {
        let ts_node = cursor.node();
        let mut added = false;
        if ts_node.is_named() {
            let start = ts_node.start_position();
            let end = ts_node.end_position();
            let text = source.get(ts_node.byte_range()).unwrap_or("");
            let node = Node::new(
                lang.map_kind(ts_node.kind()),
                ts_node.kind(),
                cursor.field_name(),
                text,
                start.row + 1,
                start.column + 1,
                end.row + 1,
            );
            let id = graph.add_node(parents.last().copied(), node);
            parents.push(id);
            added = true;
        }

        if cursor.goto_first_child() {
            added_at_level.push(added);
            continue;
        }
        if added {
            parents.pop();
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return graph;
            }
            if added_at_level.pop().unwrap_or(false) {
                parents.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{LanguageRegistry, NodeKind};

    fn parse(lang: &str, source: &str) -> Graph {
        let lang = LanguageRegistry::global().by_name(lang).unwrap();
        parse_source(lang, source, Path::new("test")).unwrap()
    }

    #[test]
    fn java_method_maps_to_unified_kinds() {
        let g = parse(
            "java",
            "class A { void run(String id) { query(id); } }",
        );
        assert!(!g.is_empty());
        assert_eq!(g.node(NId(0)).kind, NodeKind::SourceFile);
        assert!(g
            .node_ids()
            .any(|id| g.node(id).kind == NodeKind::ClassDeclaration));
        assert!(g
            .node_ids()
            .any(|id| g.node(id).kind == NodeKind::FunctionDeclaration));
        assert!(g.node_ids().any(|id| g.node(id).kind == NodeKind::Call));
    }

    #[test]
    fn go_handler_parameter_types_are_captured() {
        let g = parse(
            "go",
            "package main\nfunc Handle(w http.ResponseWriter, r *http.Request) {}\n",
        );
        let param_types: Vec<&str> = g
            .node_ids()
            .filter(|&id| g.node(id).kind == NodeKind::Parameter)
            .filter_map(|id| g.child_by_field(id, "type"))
            .map(|t| g.text(t))
            .collect();
        assert!(param_types.iter().any(|t| t.contains("http.Request")));
    }

    #[test]
    fn broken_source_still_yields_partial_graph() {
        let g = parse("javascript", "function f( {{{");
        assert!(!g.is_empty());
    }

    #[test]
    fn node_spans_are_one_indexed() {
        let g = parse("javascript", "let x = 1;\nlet y = 2;\n");
        let second_decl = g
            .node_ids()
            .filter(|&id| g.node(id).kind == NodeKind::LocalDeclaration)
            .nth(1)
            .unwrap();
        assert_eq!(g.node(second_decl).line, 2);
        assert_eq!(g.node(second_decl).column, 1);
    }
}
