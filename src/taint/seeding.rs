//! Framework-aware taint seeding.
//!
//! Request handler parameters are the input surface: anything a web
//! framework hands to user code is marked as tainted for the injection
//! findings before evaluation runs. Detection is per language and
//! purely structural (annotations, base classes, registration calls,
//! parameter types).

use tracing::debug;

use crate::findings::FindingCode;
use crate::graph::{GraphDb, NId, Shard};
use crate::lang::NodeKind;
use crate::syntax::SyntaxStep;
use crate::taint::TaintOverlay;

/// ASP.NET action attributes.
const CSHARP_HTTP_ATTRIBUTES: &[&str] = &[
    "HttpGet", "HttpPost", "HttpPut", "HttpDelete", "HttpPatch", "Route",
];

/// Spring MVC mapping annotations.
const JAVA_MAPPING_ANNOTATIONS: &[&str] = &[
    "GetMapping",
    "PostMapping",
    "PutMapping",
    "DeleteMapping",
    "PatchMapping",
    "RequestMapping",
];

/// Servlet entry points.
const JAVA_SERVLET_METHODS: &[&str] = &["doGet", "doPost", "doPut", "doDelete"];

/// Express route registration methods.
const JS_ROUTE_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "all", "use"];

/// Express application / router receiver names.
const JS_ROUTE_RECEIVERS: &[&str] = &["app", "router", "server"];

/// Seed the overlay from every shard in the database.
pub fn seed(db: &GraphDb, overlay: &mut TaintOverlay) {
    for shard in db.shards() {
        let before = overlay.len();
        match shard.language {
            "csharp" => seed_csharp(shard, overlay),
            "java" => seed_java(shard, overlay),
            "javascript" => seed_javascript(shard, overlay),
            "go" => seed_go(shard, overlay),
            _ => {}
        }
        let added = overlay.len() - before;
        if added > 0 {
            debug!(
                path = %shard.path.display(),
                marks = added,
                "seeded tainted input parameters"
            );
        }
    }
}

/// Mark every parameter node for all injection findings.
fn mark_parameters(shard: &Shard, overlay: &mut TaintOverlay, params: &[NId]) {
    for &param in params {
        for finding in FindingCode::ALL {
            if finding.is_injection() {
                overlay.mark(shard.id, param, finding);
            }
        }
    }
}

/// Whether a method declaration node sits inside a class whose bases
/// make it a request controller.
fn in_controller_class(shard: &Shard, method: NId) -> bool {
    let Some(class) = shard
        .graph
        .ancestor_where(method, |n| n.kind == NodeKind::ClassDeclaration)
    else {
        return false;
    };
    matches!(
        shard.syntax.step(class),
        Some(SyntaxStep::ClassDeclaration { bases, .. })
            if bases.iter().any(|b| b.ends_with("Controller"))
    )
}

fn seed_csharp(shard: &Shard, overlay: &mut TaintOverlay) {
    for step in shard.syntax.steps_ordered() {
        let SyntaxStep::MethodDeclaration {
            meta,
            parameters,
            annotations,
            ..
        } = step
        else {
            continue;
        };
        let attributed = annotations
            .iter()
            .any(|a| CSHARP_HTTP_ATTRIBUTES.contains(&a.as_str()));
        if attributed || in_controller_class(shard, meta.n_id) {
            mark_parameters(shard, overlay, parameters);
        }
    }
}

fn seed_java(shard: &Shard, overlay: &mut TaintOverlay) {
    for step in shard.syntax.steps_ordered() {
        let SyntaxStep::MethodDeclaration {
            name,
            parameters,
            annotations,
            ..
        } = step
        else {
            continue;
        };
        let mapped = annotations
            .iter()
            .any(|a| JAVA_MAPPING_ANNOTATIONS.contains(&a.as_str()));
        if mapped || JAVA_SERVLET_METHODS.contains(&name.as_str()) {
            mark_parameters(shard, overlay, parameters);
        }
    }
}

fn seed_javascript(shard: &Shard, overlay: &mut TaintOverlay) {
    for step in shard.syntax.steps_ordered() {
        let SyntaxStep::MethodInvocation {
            meta,
            method,
            expression,
        } = step
        else {
            continue;
        };
        let tail = method.rsplit('.').next().unwrap_or(method);
        let receiver = expression.rsplit('.').next().unwrap_or(expression);
        if !JS_ROUTE_METHODS.contains(&tail) || !JS_ROUTE_RECEIVERS.contains(&receiver) {
            continue;
        }
        // Handler functions passed as route arguments.
        for &dep in &meta.dependencies {
            if shard.graph.node(dep).kind != NodeKind::ArgumentList {
                continue;
            }
            for &arg in shard.graph.children(dep) {
                if !matches!(
                    shard.graph.node(arg).kind,
                    NodeKind::Lambda | NodeKind::FunctionDeclaration
                ) {
                    continue;
                }
                if let Some(SyntaxStep::MethodDeclaration { parameters, .. }) =
                    shard.syntax.step(arg)
                {
                    mark_parameters(shard, overlay, parameters);
                }
            }
        }
    }
}

fn seed_go(shard: &Shard, overlay: &mut TaintOverlay) {
    for step in shard.syntax.steps_ordered() {
        let SyntaxStep::MethodDeclaration { parameters, .. } = step else {
            continue;
        };
        let is_handler = parameters.iter().any(|&p| {
            matches!(
                shard.syntax.step(p),
                Some(SyntaxStep::Parameter { param_type: Some(t), .. })
                    if t.contains("http.Request")
            )
        });
        if is_handler {
            mark_parameters(shard, overlay, parameters);
        }
    }
}
