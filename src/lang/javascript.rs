//! JavaScript grammar binding.

use crate::cfg::{self, Walker};
use crate::lang::{Language, NodeKind};

pub struct JavaScript;

impl Language for JavaScript {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "mjs", "cjs", "jsx"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn map_kind(&self, grammar_kind: &str) -> NodeKind {
        match grammar_kind {
            "program" => NodeKind::SourceFile,
            "statement_block" | "switch_body" | "class_body" => NodeKind::Block,
            "expression_statement" => NodeKind::ExpressionStatement,
            "parenthesized_expression" => NodeKind::ParenthesizedExpression,
            "function_declaration"
            | "function_expression"
            | "generator_function_declaration"
            | "method_definition" => NodeKind::FunctionDeclaration,
            "arrow_function" => NodeKind::Lambda,
            "class_declaration" => NodeKind::ClassDeclaration,
            "decorator" => NodeKind::Attribute,
            "formal_parameters" => NodeKind::ParameterList,
            "if_statement" => NodeKind::If,
            "for_statement" | "for_in_statement" => NodeKind::For,
            "while_statement" => NodeKind::While,
            "do_statement" => NodeKind::DoWhile,
            "switch_statement" => NodeKind::Switch,
            "switch_case" | "switch_default" => NodeKind::SwitchCase,
            "try_statement" => NodeKind::Try,
            "catch_clause" => NodeKind::CatchClause,
            "finally_clause" => NodeKind::FinallyClause,
            "return_statement" => NodeKind::Return,
            "break_statement" => NodeKind::Break,
            "continue_statement" => NodeKind::Continue,
            "variable_declaration" | "lexical_declaration" => NodeKind::LocalDeclaration,
            "variable_declarator" => NodeKind::VariableDeclarator,
            "assignment_expression" | "augmented_assignment_expression" => NodeKind::Assignment,
            "binary_expression" => NodeKind::BinaryExpression,
            "template_string" => NodeKind::TemplateString,
            "call_expression" => NodeKind::Call,
            "member_expression" => NodeKind::MemberAccess,
            "new_expression" => NodeKind::ObjectCreation,
            "array" => NodeKind::ArrayCreation,
            "arguments" => NodeKind::ArgumentList,
            "identifier" | "property_identifier" | "shorthand_property_identifier" => {
                NodeKind::Identifier
            }
            "string" => NodeKind::StringLiteral,
            "number" => NodeKind::NumberLiteral,
            "true" | "false" => NodeKind::BoolLiteral,
            "null" | "undefined" => NodeKind::NullLiteral,
            "comment" => NodeKind::Comment,
            "else_clause"
            | "object"
            | "pair"
            | "subscript_expression"
            | "ternary_expression"
            | "await_expression"
            | "template_substitution"
            | "string_fragment"
            | "spread_element" => NodeKind::Other,
            _ => NodeKind::Unknown,
        }
    }

    fn walkers(&self) -> &'static [Walker] {
        cfg::COMMON_WALKERS
    }
}
