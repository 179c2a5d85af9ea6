//! Language registry and per-language grammar bindings.
//!
//! Each supported language contributes three things: a tree-sitter
//! grammar handle, a mapping from raw grammar node kinds into the
//! unified [`NodeKind`] vocabulary, and a table of control-flow
//! walkers consumed by the CFG builder.

use once_cell::sync::OnceCell;

use crate::cfg::Walker;

pub mod csharp;
pub mod go_lang;
pub mod java;
pub mod javascript;

/// Unified node vocabulary shared by every language.
///
/// Grammar kinds that have no analysis-relevant counterpart map to
/// [`NodeKind::Other`] (structurally transparent, traversal descends
/// through them) or [`NodeKind::Unknown`] (unrecognized, logged and
/// treated as opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SourceFile,
    Block,
    ExpressionStatement,
    ParenthesizedExpression,
    FunctionDeclaration,
    Lambda,
    ClassDeclaration,
    AttributeList,
    Attribute,
    ParameterList,
    Parameter,
    If,
    For,
    While,
    DoWhile,
    Switch,
    SwitchCase,
    Try,
    CatchClause,
    FinallyClause,
    Return,
    Break,
    Continue,
    LocalDeclaration,
    VariableDeclarator,
    Assignment,
    BinaryExpression,
    Call,
    MemberAccess,
    ObjectCreation,
    ArrayCreation,
    ArgumentList,
    TemplateString,
    Identifier,
    StringLiteral,
    NumberLiteral,
    BoolLiteral,
    NullLiteral,
    Comment,
    /// Named grammar node with no dedicated mapping; children are
    /// still traversed so nothing underneath is lost.
    Other,
    /// Grammar kind the mapping table does not know at all.
    Unknown,
}

impl NodeKind {
    /// Compound statements: nodes the CFG builder dispatches a walker
    /// for instead of chaining them as plain sequence elements.
    pub fn is_compound(self) -> bool {
        matches!(
            self,
            NodeKind::If
                | NodeKind::For
                | NodeKind::While
                | NodeKind::DoWhile
                | NodeKind::Switch
                | NodeKind::Try
                | NodeKind::Block
        )
    }

    /// Expression-shaped nodes: eligible as value dependencies of a
    /// syntax step.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Call
                | NodeKind::MemberAccess
                | NodeKind::ObjectCreation
                | NodeKind::ArrayCreation
                | NodeKind::Assignment
                | NodeKind::BinaryExpression
                | NodeKind::ParenthesizedExpression
                | NodeKind::TemplateString
                | NodeKind::Identifier
                | NodeKind::StringLiteral
                | NodeKind::NumberLiteral
                | NodeKind::BoolLiteral
                | NodeKind::NullLiteral
                | NodeKind::Lambda
                | NodeKind::ArgumentList
                | NodeKind::Other
        )
    }
}

/// Per-language binding: grammar handle, kind mapping, CFG walkers.
pub trait Language: Send + Sync {
    /// Canonical registry name (`csharp`, `java`, `javascript`, `go`).
    fn name(&self) -> &'static str;

    /// File extensions claimed by this language, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// tree-sitter grammar for parsing.
    fn grammar(&self) -> tree_sitter::Language;

    /// Map a raw grammar node kind into the unified vocabulary.
    fn map_kind(&self, grammar_kind: &str) -> NodeKind;

    /// Control-flow walker table; first entry whose kind list contains
    /// the statement's kind wins.
    fn walkers(&self) -> &'static [Walker];
}

/// Global language registry, initialized once.
pub struct LanguageRegistry {
    languages: Vec<Box<dyn Language>>,
}

impl LanguageRegistry {
    fn new() -> Self {
        Self {
            languages: vec![
                Box::new(csharp::CSharp),
                Box::new(java::Java),
                Box::new(javascript::JavaScript),
                Box::new(go_lang::Go),
            ],
        }
    }

    /// Shared singleton.
    pub fn global() -> &'static LanguageRegistry {
        static REGISTRY: OnceCell<LanguageRegistry> = OnceCell::new();
        REGISTRY.get_or_init(LanguageRegistry::new)
    }

    /// Look up by canonical name.
    pub fn by_name(&self, name: &str) -> Option<&dyn Language> {
        self.languages
            .iter()
            .find(|l| l.name() == name)
            .map(|l| l.as_ref())
    }

    /// Look up by file extension (without the dot).
    pub fn by_extension(&self, ext: &str) -> Option<&dyn Language> {
        self.languages
            .iter()
            .find(|l| l.extensions().contains(&ext))
            .map(|l| l.as_ref())
    }

    /// Detect the language for a file path from its extension.
    pub fn detect(&self, path: &std::path::Path) -> Option<&dyn Language> {
        let ext = path.extension()?.to_str()?;
        self.by_extension(ext)
    }

    /// Names of every registered language.
    pub fn names(&self) -> Vec<&'static str> {
        self.languages.iter().map(|l| l.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn registry_resolves_extensions() {
        let reg = LanguageRegistry::global();
        assert_eq!(reg.by_extension("cs").unwrap().name(), "csharp");
        assert_eq!(reg.by_extension("java").unwrap().name(), "java");
        assert_eq!(reg.by_extension("mjs").unwrap().name(), "javascript");
        assert_eq!(reg.by_extension("go").unwrap().name(), "go");
        assert!(reg.by_extension("py").is_none());
    }

    #[test]
    fn detect_uses_path_extension() {
        let reg = LanguageRegistry::global();
        assert_eq!(
            reg.detect(Path::new("src/Handler.java")).unwrap().name(),
            "java"
        );
        assert!(reg.detect(Path::new("README")).is_none());
    }

    #[test]
    fn unmapped_kind_degrades_to_unknown() {
        let lang = LanguageRegistry::global().by_name("csharp").unwrap();
        assert_eq!(lang.map_kind("preproc_if"), NodeKind::Unknown);
    }
}
