//! Java grammar binding.

use crate::cfg::{self, Walker};
use crate::lang::{Language, NodeKind};

pub struct Java;

impl Language for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn map_kind(&self, grammar_kind: &str) -> NodeKind {
        match grammar_kind {
            "program" => NodeKind::SourceFile,
            "block" | "constructor_body" | "switch_block" => NodeKind::Block,
            "expression_statement" => NodeKind::ExpressionStatement,
            "parenthesized_expression" => NodeKind::ParenthesizedExpression,
            "method_declaration" | "constructor_declaration" => NodeKind::FunctionDeclaration,
            "lambda_expression" => NodeKind::Lambda,
            "class_declaration" | "interface_declaration" | "record_declaration" => {
                NodeKind::ClassDeclaration
            }
            // Annotations live inside the modifiers node.
            "modifiers" => NodeKind::AttributeList,
            "annotation" | "marker_annotation" => NodeKind::Attribute,
            "formal_parameters" => NodeKind::ParameterList,
            "formal_parameter" | "spread_parameter" => NodeKind::Parameter,
            "if_statement" => NodeKind::If,
            "for_statement" | "enhanced_for_statement" => NodeKind::For,
            "while_statement" => NodeKind::While,
            "do_statement" => NodeKind::DoWhile,
            "switch_expression" | "switch_statement" => NodeKind::Switch,
            "switch_block_statement_group" | "switch_rule" => NodeKind::SwitchCase,
            "try_statement" | "try_with_resources_statement" => NodeKind::Try,
            "catch_clause" => NodeKind::CatchClause,
            "finally_clause" => NodeKind::FinallyClause,
            "return_statement" => NodeKind::Return,
            "break_statement" => NodeKind::Break,
            "continue_statement" => NodeKind::Continue,
            "local_variable_declaration" => NodeKind::LocalDeclaration,
            "variable_declarator" => NodeKind::VariableDeclarator,
            "assignment_expression" => NodeKind::Assignment,
            "binary_expression" => NodeKind::BinaryExpression,
            "method_invocation" => NodeKind::Call,
            "field_access" => NodeKind::MemberAccess,
            "object_creation_expression" => NodeKind::ObjectCreation,
            "array_creation_expression" | "array_initializer" => NodeKind::ArrayCreation,
            "argument_list" => NodeKind::ArgumentList,
            "identifier" => NodeKind::Identifier,
            "string_literal" | "character_literal" => NodeKind::StringLiteral,
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal"
            | "decimal_floating_point_literal" => NodeKind::NumberLiteral,
            "true" | "false" => NodeKind::BoolLiteral,
            "null_literal" => NodeKind::NullLiteral,
            "line_comment" | "block_comment" => NodeKind::Comment,
            "switch_label"
            | "superclass"
            | "super_interfaces"
            | "type_identifier"
            | "scoped_type_identifier"
            | "generic_type"
            | "array_access"
            | "cast_expression"
            | "ternary_expression"
            | "string_fragment"
            | "catch_formal_parameter"
            | "resource_specification"
            | "resource" => NodeKind::Other,
            _ => NodeKind::Unknown,
        }
    }

    fn walkers(&self) -> &'static [Walker] {
        cfg::COMMON_WALKERS
    }
}
