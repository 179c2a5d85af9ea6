//! Reduction of graph nodes into syntax steps.
//!
//! Runs one pass over the node arena in post order (children before
//! parents), so every step's dependencies already exist when it is
//! built. Unrecognized nodes degrade to [`SyntaxStep::NoOp`] with a
//! debug log instead of failing the file.

use tracing::debug;

use crate::error::ScanError;
use crate::graph::{Graph, NId};
use crate::lang::NodeKind;
use crate::syntax::{StepMeta, SyntaxGraph, SyntaxStep};

/// Build the syntax step layer for a parsed file.
pub fn build(graph: &Graph) -> SyntaxGraph {
    let mut out = SyntaxGraph::default();
    // Nodes are created in preorder, so reverse id order visits every
    // child before its parent.
    for id in graph.node_ids().collect::<Vec<_>>().into_iter().rev() {
        let step = reduce(graph, id, &mut out);
        out.insert(step);
    }
    out
}

fn reduce(graph: &Graph, id: NId, out: &mut SyntaxGraph) -> SyntaxStep {
    let node = graph.node(id);
    match node.kind {
        NodeKind::LocalDeclaration | NodeKind::VariableDeclarator => declaration(graph, id),
        NodeKind::Assignment => assignment(graph, id),
        NodeKind::Call => invocation(graph, id),
        NodeKind::ObjectCreation => instantiation(graph, id),
        NodeKind::ArrayCreation => SyntaxStep::ArrayInstantiation {
            meta: StepMeta::new(id, expression_children(graph, id)),
        },
        NodeKind::MemberAccess => member_access(graph, id),
        NodeKind::Identifier => identifier(graph, id),
        NodeKind::StringLiteral
        | NodeKind::NumberLiteral
        | NodeKind::BoolLiteral
        | NodeKind::NullLiteral => SyntaxStep::Literal {
            meta: StepMeta::leaf(id),
            value: graph.text(id).to_owned(),
        },
        // Interpolated expressions taint the whole template.
        NodeKind::TemplateString => SyntaxStep::Literal {
            meta: StepMeta::new(id, expression_children(graph, id)),
            value: graph.text(id).to_owned(),
        },
        NodeKind::BinaryExpression => SyntaxStep::BinaryOperation {
            meta: StepMeta::new(id, expression_children(graph, id)),
            operator: graph
                .child_by_field(id, "operator")
                .map(|op| graph.text(op).to_owned())
                .unwrap_or_default(),
        },
        NodeKind::Return => SyntaxStep::Return {
            meta: StepMeta::new(id, expression_children(graph, id)),
        },
        NodeKind::FunctionDeclaration | NodeKind::Lambda => method_declaration(graph, id),
        NodeKind::ClassDeclaration => class_declaration(graph, id),
        NodeKind::Parameter => parameter(graph, id),
        // Transparent wrappers keep the value flowing through them.
        NodeKind::ExpressionStatement
        | NodeKind::ParenthesizedExpression
        | NodeKind::ArgumentList
        | NodeKind::Other => SyntaxStep::NoOp {
            meta: StepMeta::new(id, expression_children(graph, id)),
        },
        NodeKind::Unknown => {
            let missing = ScanError::MissingCase {
                kind: node.grammar_kind.to_string(),
                line: node.line,
            };
            debug!(error = %missing, "degrading node to a no-op step");
            out.note_missing_case();
            SyntaxStep::NoOp {
                meta: StepMeta::leaf(id),
            }
        }
        // Control structure and structural nodes carry no value.
        _ => SyntaxStep::NoOp {
            meta: StepMeta::leaf(id),
        },
    }
}

/// Children eligible as value dependencies.
fn expression_children(graph: &Graph, id: NId) -> Vec<NId> {
    graph
        .children(id)
        .iter()
        .copied()
        .filter(|&c| graph.node(c).kind.is_expression())
        .collect()
}

fn declaration(graph: &Graph, id: NId) -> SyntaxStep {
    let node = graph.node(id);
    if node.kind == NodeKind::LocalDeclaration {
        // Prefer delegating to the inner declarator when the grammar
        // nests one (C#, Java, JS, Go var specs).
        if let Some(decl) = graph
            .descendants(id)
            .into_iter()
            .find(|&d| graph.node(d).kind == NodeKind::VariableDeclarator)
        {
            return SyntaxStep::Declaration {
                meta: StepMeta::new(id, vec![decl]),
                var: declarator_name(graph, decl).unwrap_or_default(),
                var_type: declared_type(graph, id),
            };
        }
        // Go short declarations: left identifiers, right expressions.
        if let Some(left) = graph.child_by_field(id, "left") {
            let var = graph
                .child_of_kind(left, NodeKind::Identifier)
                .map(|n| graph.text(n).to_owned())
                .unwrap_or_else(|| graph.text(left).to_owned());
            let deps = graph
                .child_by_field(id, "right")
                .map(|r| vec![r])
                .unwrap_or_default();
            return SyntaxStep::Declaration {
                meta: StepMeta::new(id, deps),
                var,
                var_type: None,
            };
        }
    }
    let var = declarator_name(graph, id).unwrap_or_default();
    let name_node = graph.child_by_field(id, "name");
    let deps = graph
        .children(id)
        .iter()
        .copied()
        .filter(|&c| Some(c) != name_node && graph.node(c).kind.is_expression())
        .collect();
    SyntaxStep::Declaration {
        meta: StepMeta::new(id, deps),
        var,
        var_type: declared_type(graph, id),
    }
}

fn declarator_name(graph: &Graph, id: NId) -> Option<String> {
    graph
        .child_by_field(id, "name")
        .or_else(|| graph.child_of_kind(id, NodeKind::Identifier))
        .map(|n| graph.text(n).to_owned())
        .filter(|s| !s.is_empty())
}

fn declared_type(graph: &Graph, id: NId) -> Option<String> {
    graph
        .child_by_field(id, "type")
        .map(|t| graph.text(t).to_owned())
        .filter(|s| !s.is_empty())
}

fn assignment(graph: &Graph, id: NId) -> SyntaxStep {
    let left = graph
        .child_by_field(id, "left")
        .or_else(|| graph.children(id).first().copied());
    let right = graph
        .child_by_field(id, "right")
        .or_else(|| graph.children(id).last().copied());
    let deps = right.map(|r| vec![r]).unwrap_or_default();

    let (var, attribute) = match left {
        Some(l) => match graph.node(l).kind {
            // `obj.field = x` keys the environment by the base object.
            NodeKind::MemberAccess => {
                let base = access_base(graph, l)
                    .map(|b| graph.text(b).to_owned())
                    .unwrap_or_else(|| graph.text(l).to_owned());
                (base, access_member_name(graph, l))
            }
            // Go assigns through an expression_list on the left.
            NodeKind::Other => {
                let var = graph
                    .child_of_kind(l, NodeKind::Identifier)
                    .map(|n| graph.text(n).to_owned())
                    .unwrap_or_else(|| graph.text(l).to_owned());
                (var, None)
            }
            _ => (graph.text(l).to_owned(), None),
        },
        None => (String::new(), None),
    };
    SyntaxStep::Assignment {
        meta: StepMeta::new(id, deps),
        var,
        attribute,
    }
}

/// Base expression node of a member access (`obj` in `obj.field`).
fn access_base(graph: &Graph, id: NId) -> Option<NId> {
    graph
        .child_by_field(id, "object")
        .or_else(|| graph.child_by_field(id, "operand"))
        .or_else(|| graph.child_by_field(id, "expression"))
        .or_else(|| graph.children(id).first().copied())
}

/// Member name of a member access (`field` in `obj.field`).
fn access_member_name(graph: &Graph, id: NId) -> Option<String> {
    graph
        .child_by_field(id, "property")
        .or_else(|| graph.child_by_field(id, "field"))
        .or_else(|| graph.child_by_field(id, "name"))
        .or_else(|| graph.children(id).last().copied())
        .map(|n| graph.text(n).to_owned())
        .filter(|s| !s.is_empty())
}

fn invocation(graph: &Graph, id: NId) -> SyntaxStep {
    let args: Vec<NId> = graph
        .children_of_kind(id, NodeKind::ArgumentList)
        .into_iter()
        .collect();

    // Java puts the callee in `object`/`name` fields on the call node
    // itself; the other grammars nest a callee child under `function`.
    if let Some(name) = graph.child_by_field(id, "name") {
        let method = graph.text(name).to_owned();
        let expression = graph
            .child_by_field(id, "object")
            .map(|o| graph.text(o).to_owned())
            .unwrap_or_default();

        if let Some(obj) = graph.child_by_field(id, "object") {
            if graph.node(obj).kind == NodeKind::Call {
                let mut deps = vec![obj];
                deps.extend(args);
                return SyntaxStep::MethodInvocationChain {
                    meta: StepMeta::new(id, deps),
                    method,
                };
            }
        }
        // Receiver taint does not flow into the call's value; only
        // argument values do. Chains are the exception above.
        return SyntaxStep::MethodInvocation {
            meta: StepMeta::new(id, args),
            method: qualify(&expression, &method),
            expression,
        };
    }

    let callee = graph
        .child_by_field(id, "function")
        .or_else(|| graph.children(id).first().copied());
    match callee.map(|c| (c, graph.node(c).kind)) {
        Some((c, NodeKind::Call)) => {
            let mut deps = vec![c];
            deps.extend(args);
            SyntaxStep::MethodInvocationChain {
                meta: StepMeta::new(id, deps),
                // Callee text of a chain is the whole prefix; keep the
                // tail segment only.
                method: graph
                    .text(c)
                    .rsplit('.')
                    .next()
                    .unwrap_or_default()
                    .to_owned(),
            }
        }
        Some((c, NodeKind::MemberAccess)) => {
            let expression = access_base(graph, c)
                .map(|b| graph.text(b).to_owned())
                .unwrap_or_default();
            let method = access_member_name(graph, c).unwrap_or_default();
            SyntaxStep::MethodInvocation {
                meta: StepMeta::new(id, args),
                method: qualify(&expression, &method),
                expression,
            }
        }
        Some((c, _)) => SyntaxStep::MethodInvocation {
            meta: StepMeta::new(id, args),
            method: graph.text(c).to_owned(),
            expression: String::new(),
        },
        None => SyntaxStep::MethodInvocation {
            meta: StepMeta::new(id, args),
            method: String::new(),
            expression: String::new(),
        },
    }
}

fn qualify(expression: &str, method: &str) -> String {
    if expression.is_empty() {
        method.to_owned()
    } else {
        format!("{expression}.{method}")
    }
}

fn instantiation(graph: &Graph, id: NId) -> SyntaxStep {
    let class_type = graph
        .child_by_field(id, "type")
        .or_else(|| graph.child_by_field(id, "constructor"))
        .map(|t| graph.text(t).to_owned())
        .unwrap_or_default();
    let mut deps = graph.children_of_kind(id, NodeKind::ArgumentList);
    if deps.is_empty() {
        deps = expression_children(graph, id);
    }
    SyntaxStep::ObjectInstantiation {
        meta: StepMeta::new(id, deps),
        class_type,
    }
}

fn member_access(graph: &Graph, id: NId) -> SyntaxStep {
    let base = access_base(graph, id);
    SyntaxStep::MemberAccess {
        meta: StepMeta::new(id, base.map(|b| vec![b]).unwrap_or_default()),
        expression: base.map(|b| graph.text(b).to_owned()).unwrap_or_default(),
        member: access_member_name(graph, id).unwrap_or_default(),
    }
}

fn identifier(graph: &Graph, id: NId) -> SyntaxStep {
    // Bare identifiers directly under a parameter list are parameters
    // (JavaScript has no dedicated parameter node).
    if graph
        .parent(id)
        .map(|p| graph.node(p).kind == NodeKind::ParameterList)
        .unwrap_or(false)
    {
        return SyntaxStep::Parameter {
            meta: StepMeta::leaf(id),
            name: graph.text(id).to_owned(),
            param_type: None,
        };
    }
    SyntaxStep::SymbolLookup {
        meta: StepMeta::leaf(id),
        symbol: graph.text(id).to_owned(),
    }
}

fn parameter(graph: &Graph, id: NId) -> SyntaxStep {
    SyntaxStep::Parameter {
        meta: StepMeta::leaf(id),
        name: declarator_name(graph, id).unwrap_or_default(),
        param_type: declared_type(graph, id),
    }
}

fn method_declaration(graph: &Graph, id: NId) -> SyntaxStep {
    let name = graph
        .child_by_field(id, "name")
        .map(|n| graph.text(n).to_owned())
        .unwrap_or_else(|| "<anonymous>".to_owned());

    let parameters = graph
        .child_of_kind(id, NodeKind::ParameterList)
        .or_else(|| graph.child_by_field(id, "parameters"))
        .map(|pl| {
            graph
                .children(pl)
                .iter()
                .copied()
                .filter(|&c| {
                    matches!(
                        graph.node(c).kind,
                        NodeKind::Parameter | NodeKind::Identifier
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    SyntaxStep::MethodDeclaration {
        meta: StepMeta::leaf(id),
        name,
        parameters,
        annotations: collect_annotations(graph, id),
    }
}

/// Annotation names attached to a declaration, either as direct
/// attribute children or nested inside an attribute-list child.
fn collect_annotations(graph: &Graph, id: NId) -> Vec<String> {
    let mut out = Vec::new();
    let mut scan = |container: NId| {
        for d in graph.descendants(container) {
            if graph.node(d).kind == NodeKind::Attribute {
                let name = annotation_name(graph.text(d));
                if !name.is_empty() {
                    out.push(name);
                }
            }
        }
    };
    scan(id);
    // C# attribute lists precede the declaration as siblings.
    if let Some(parent) = graph.parent(id) {
        let siblings = graph.children(parent);
        if let Some(pos) = siblings.iter().position(|&s| s == id) {
            for &prev in siblings[..pos].iter().rev() {
                if graph.node(prev).kind != NodeKind::AttributeList {
                    break;
                }
                scan(prev);
            }
        }
    }
    out
}

/// `[HttpGet("x")]` / `@GetMapping(...)` -> `HttpGet` / `GetMapping`.
fn annotation_name(text: &str) -> String {
    text.trim_start_matches(['[', '@'])
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '.')
        .collect()
}

fn class_declaration(graph: &Graph, id: NId) -> SyntaxStep {
    let name = graph
        .child_by_field(id, "name")
        .map(|n| graph.text(n).to_owned())
        .unwrap_or_default();

    // Base clause text differs per grammar (`: Base`, `extends Base`);
    // tokenizing it covers all of them.
    let mut bases = Vec::new();
    for &child in graph.children(id) {
        let node = graph.node(child);
        let is_base_clause = node.field.as_deref() == Some("bases")
            || node.field.as_deref() == Some("superclass")
            || matches!(
                &*node.grammar_kind,
                "base_list" | "superclass" | "super_interfaces"
            );
        if is_base_clause {
            bases.extend(
                graph
                    .text(child)
                    .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                    .filter(|t| !t.is_empty() && *t != "extends" && *t != "implements")
                    .map(str::to_owned),
            );
        }
    }
    SyntaxStep::ClassDeclaration {
        meta: StepMeta::leaf(id),
        name,
        bases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn add(g: &mut Graph, parent: Option<NId>, kind: NodeKind, text: &str) -> NId {
        g.add_node(parent, Node::new(kind, "test", None, text, 1, 1, 1))
    }

    fn add_field(g: &mut Graph, parent: NId, kind: NodeKind, field: &str, text: &str) -> NId {
        g.add_node(
            Some(parent),
            Node::new(kind, "test", Some(field), text, 1, 1, 1),
        )
    }

    #[test]
    fn declarator_reduces_to_declaration() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let decl = add(&mut g, Some(root), NodeKind::VariableDeclarator, "x = y");
        let name = add_field(&mut g, decl, NodeKind::Identifier, "name", "x");
        let value = add_field(&mut g, decl, NodeKind::Identifier, "value", "y");

        let steps = build(&g);
        match steps.step(decl).unwrap() {
            SyntaxStep::Declaration { var, meta, .. } => {
                assert_eq!(var, "x");
                assert_eq!(meta.dependencies, vec![value]);
                assert!(!meta.dependencies.contains(&name));
            }
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn call_on_member_access_carries_receiver_and_args() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let call = add(&mut g, Some(root), NodeKind::Call, "db.query(q)");
        let callee = add_field(&mut g, call, NodeKind::MemberAccess, "function", "db.query");
        add_field(&mut g, callee, NodeKind::Identifier, "object", "db");
        add_field(&mut g, callee, NodeKind::Identifier, "property", "query");
        let args = add(&mut g, Some(call), NodeKind::ArgumentList, "(q)");
        add(&mut g, Some(args), NodeKind::Identifier, "q");

        let steps = build(&g);
        match steps.step(call).unwrap() {
            SyntaxStep::MethodInvocation {
                method,
                expression,
                meta,
            } => {
                assert_eq!(method, "db.query");
                assert_eq!(expression, "db");
                assert!(meta.dependencies.contains(&args));
            }
            other => panic!("expected invocation, got {other:?}"),
        }
        assert_eq!(
            steps.step(call).unwrap().method_tail(),
            Some("query")
        );
    }

    #[test]
    fn chained_call_depends_on_inner_call() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let outer = add(&mut g, Some(root), NodeKind::Call, "a().b()");
        let inner = add_field(&mut g, outer, NodeKind::Call, "function", "a().b");
        add_field(&mut g, inner, NodeKind::Identifier, "function", "a");

        let steps = build(&g);
        match steps.step(outer).unwrap() {
            SyntaxStep::MethodInvocationChain { meta, .. } => {
                assert_eq!(meta.dependencies.first(), Some(&inner));
            }
            other => panic!("expected chain, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_degrades_to_noop() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let n = add(&mut g, Some(root), NodeKind::Unknown, "???");

        let steps = build(&g);
        assert!(matches!(steps.step(n), Some(SyntaxStep::NoOp { .. })));
        assert_eq!(steps.missing_cases(), 1);
        // Every node got a step regardless.
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn annotations_collected_from_attribute_lists() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let class = add(&mut g, Some(root), NodeKind::ClassDeclaration, "");
        let attrs = add(&mut g, Some(class), NodeKind::AttributeList, "[HttpGet]");
        add(&mut g, Some(attrs), NodeKind::Attribute, "HttpGet(\"x\")");
        let method = add(&mut g, Some(class), NodeKind::FunctionDeclaration, "");
        add_field(&mut g, method, NodeKind::Identifier, "name", "Get");

        let steps = build(&g);
        match steps.step(method).unwrap() {
            SyntaxStep::MethodDeclaration {
                name, annotations, ..
            } => {
                assert_eq!(name, "Get");
                assert_eq!(annotations, &["HttpGet".to_owned()]);
            }
            other => panic!("expected method declaration, got {other:?}"),
        }
    }
}
