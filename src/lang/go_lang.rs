//! Go grammar binding.

use crate::cfg::{self, Walker};
use crate::lang::{Language, NodeKind};

pub struct Go;

impl Language for Go {
    fn name(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn map_kind(&self, grammar_kind: &str) -> NodeKind {
        match grammar_kind {
            "source_file" => NodeKind::SourceFile,
            "block" => NodeKind::Block,
            "parenthesized_expression" => NodeKind::ParenthesizedExpression,
            "function_declaration" | "method_declaration" => NodeKind::FunctionDeclaration,
            "func_literal" => NodeKind::Lambda,
            "type_declaration" => NodeKind::ClassDeclaration,
            "parameter_list" => NodeKind::ParameterList,
            "parameter_declaration" | "variadic_parameter_declaration" => NodeKind::Parameter,
            "if_statement" => NodeKind::If,
            // The only loop form in the language.
            "for_statement" => NodeKind::For,
            "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
                NodeKind::Switch
            }
            "expression_case" | "type_case" | "default_case" | "communication_case" => {
                NodeKind::SwitchCase
            }
            "return_statement" => NodeKind::Return,
            "break_statement" => NodeKind::Break,
            "continue_statement" => NodeKind::Continue,
            "short_var_declaration" | "var_declaration" | "const_declaration" => {
                NodeKind::LocalDeclaration
            }
            "var_spec" | "const_spec" => NodeKind::VariableDeclarator,
            "assignment_statement" => NodeKind::Assignment,
            "binary_expression" => NodeKind::BinaryExpression,
            "call_expression" => NodeKind::Call,
            "selector_expression" => NodeKind::MemberAccess,
            "composite_literal" => NodeKind::ObjectCreation,
            "argument_list" => NodeKind::ArgumentList,
            "identifier" | "field_identifier" | "package_identifier" => NodeKind::Identifier,
            "interpreted_string_literal" | "raw_string_literal" | "rune_literal" => {
                NodeKind::StringLiteral
            }
            "int_literal" | "float_literal" | "imaginary_literal" => NodeKind::NumberLiteral,
            "true" | "false" => NodeKind::BoolLiteral,
            "nil" => NodeKind::NullLiteral,
            "comment" => NodeKind::Comment,
            "expression_list"
            | "expression_statement"
            | "index_expression"
            | "unary_expression"
            | "type_identifier"
            | "qualified_type"
            | "pointer_type"
            | "literal_value"
            | "literal_element"
            | "keyed_element"
            | "interpreted_string_literal_content"
            | "defer_statement"
            | "go_statement" => NodeKind::Other,
            _ => NodeKind::Unknown,
        }
    }

    fn walkers(&self) -> &'static [Walker] {
        cfg::COMMON_WALKERS
    }
}
