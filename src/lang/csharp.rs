//! C# grammar binding.

use crate::cfg::{self, Walker};
use crate::lang::{Language, NodeKind};

pub struct CSharp;

impl Language for CSharp {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_c_sharp::LANGUAGE.into()
    }

    fn map_kind(&self, grammar_kind: &str) -> NodeKind {
        match grammar_kind {
            "compilation_unit" => NodeKind::SourceFile,
            "block" | "switch_body" => NodeKind::Block,
            "expression_statement" => NodeKind::ExpressionStatement,
            "parenthesized_expression" => NodeKind::ParenthesizedExpression,
            "method_declaration" | "constructor_declaration" | "local_function_statement" => {
                NodeKind::FunctionDeclaration
            }
            "lambda_expression" | "anonymous_method_expression" => NodeKind::Lambda,
            "class_declaration" | "record_declaration" | "struct_declaration" => {
                NodeKind::ClassDeclaration
            }
            "attribute_list" => NodeKind::AttributeList,
            "attribute" => NodeKind::Attribute,
            "parameter_list" => NodeKind::ParameterList,
            "parameter" => NodeKind::Parameter,
            "if_statement" => NodeKind::If,
            "for_statement" | "foreach_statement" => NodeKind::For,
            "while_statement" => NodeKind::While,
            "do_statement" => NodeKind::DoWhile,
            "switch_statement" | "switch_expression" => NodeKind::Switch,
            "switch_section" | "switch_expression_arm" => NodeKind::SwitchCase,
            "try_statement" => NodeKind::Try,
            "catch_clause" => NodeKind::CatchClause,
            "finally_clause" => NodeKind::FinallyClause,
            "return_statement" => NodeKind::Return,
            "break_statement" => NodeKind::Break,
            "continue_statement" => NodeKind::Continue,
            "local_declaration_statement" => NodeKind::LocalDeclaration,
            "variable_declarator" => NodeKind::VariableDeclarator,
            "assignment_expression" => NodeKind::Assignment,
            "binary_expression" => NodeKind::BinaryExpression,
            "interpolated_string_expression" => NodeKind::TemplateString,
            "invocation_expression" => NodeKind::Call,
            "member_access_expression" | "qualified_name" => NodeKind::MemberAccess,
            "object_creation_expression" | "implicit_object_creation_expression" => {
                NodeKind::ObjectCreation
            }
            "array_creation_expression"
            | "implicit_array_creation_expression"
            | "initializer_expression" => NodeKind::ArrayCreation,
            "argument_list" | "bracketed_argument_list" => NodeKind::ArgumentList,
            "identifier" => NodeKind::Identifier,
            "string_literal" | "verbatim_string_literal" | "raw_string_literal" => {
                NodeKind::StringLiteral
            }
            "integer_literal" | "real_literal" | "character_literal" => NodeKind::NumberLiteral,
            "boolean_literal" => NodeKind::BoolLiteral,
            "null_literal" => NodeKind::NullLiteral,
            "comment" => NodeKind::Comment,
            // Transparent containers the reducers look through.
            "variable_declaration"
            | "case_switch_label"
            | "default_switch_label"
            | "equals_value_clause"
            | "argument"
            | "base_list"
            | "modifier"
            | "predefined_type"
            | "generic_name"
            | "element_access_expression"
            | "cast_expression"
            | "conditional_expression"
            | "await_expression"
            | "interpolation"
            | "string_literal_content"
            | "interpolated_string_text" => NodeKind::Other,
            _ => NodeKind::Unknown,
        }
    }

    fn walkers(&self) -> &'static [Walker] {
        cfg::COMMON_WALKERS
    }
}
