//! Candidate sink queries, one detector per finding.
//!
//! Detectors are pure functions over a read-only shard: they locate
//! call sites and instantiations of security interest and return their
//! node ids in document order. Whether a candidate becomes a finding
//! is decided by the symbolic evaluator afterwards.

use crate::eval::rules;
use crate::findings::FindingCode;
use crate::graph::{NId, Shard};
use crate::syntax::SyntaxStep;

pub struct Detector {
    pub code: FindingCode,
    pub languages: &'static [&'static str],
    /// Identifier recorded on vulnerabilities this detector produces.
    pub source_method: &'static str,
    pub find: fn(&Shard) -> Vec<NId>,
}

const ALL_LANGUAGES: &[&str] = &["csharp", "java", "javascript", "go"];

static DETECTORS: &[Detector] = &[
    Detector {
        code: FindingCode::SqlInjection,
        languages: ALL_LANGUAGES,
        source_method: "queries.sql_injection",
        find: find_sql_sinks,
    },
    Detector {
        code: FindingCode::XPathInjection,
        languages: ALL_LANGUAGES,
        source_method: "queries.xpath_injection",
        find: find_xpath_sinks,
    },
    Detector {
        code: FindingCode::OpenRedirect,
        languages: ALL_LANGUAGES,
        source_method: "queries.open_redirect",
        find: find_redirect_sinks,
    },
    Detector {
        code: FindingCode::InsecureCrypto,
        languages: ALL_LANGUAGES,
        source_method: "queries.insecure_crypto",
        find: find_crypto_uses,
    },
    Detector {
        code: FindingCode::InsecureCookie,
        languages: &["csharp", "java", "javascript"],
        source_method: "queries.insecure_cookie",
        find: find_cookie_creations,
    },
];

pub fn detectors() -> &'static [Detector] {
    DETECTORS
}

/// SQL execution callee tails per language.
fn sql_sinks(language: &str) -> &'static [&'static str] {
    match language {
        "csharp" => &[
            "ExecuteSqlCommand",
            "ExecuteSqlCommandAsync",
            "ExecuteSqlRaw",
            "ExecuteSqlRawAsync",
            "ExecuteReader",
            "ExecuteNonQuery",
            "ExecuteScalar",
            "FromSqlRaw",
        ],
        "java" => &[
            "executeQuery",
            "executeUpdate",
            "execute",
            "addBatch",
            "createNativeQuery",
        ],
        "javascript" => &["query", "execute"],
        "go" => &[
            "Exec",
            "ExecContext",
            "Query",
            "QueryContext",
            "QueryRow",
            "QueryRowContext",
        ],
        _ => &[],
    }
}

fn find_sql_sinks(shard: &Shard) -> Vec<NId> {
    let sinks = sql_sinks(shard.language);
    invocations(shard)
        .filter(|(_, tail, _)| sinks.contains(tail))
        .map(|(id, _, _)| id)
        .collect()
}

/// XPath evaluation sinks. Outside C#, the callee tails are generic
/// (`evaluate`, `compile`), so the receiver must name an XPath object.
fn find_xpath_sinks(shard: &Shard) -> Vec<NId> {
    match shard.language {
        "csharp" => invocations(shard)
            .filter(|(_, tail, _)| matches!(*tail, "SelectNodes" | "SelectSingleNode"))
            .map(|(id, _, _)| id)
            .collect(),
        _ => invocations(shard)
            .filter(|(_, tail, expression)| {
                matches!(*tail, "evaluate" | "compile" | "select" | "Compile" | "Select")
                    && expression.to_lowercase().contains("xpath")
            })
            .map(|(id, _, _)| id)
            .collect(),
    }
}

fn find_redirect_sinks(shard: &Shard) -> Vec<NId> {
    invocations(shard)
        .filter(|(_, tail, expression)| match shard.language {
            "csharp" => matches!(*tail, "Redirect" | "RedirectPermanent"),
            "java" => *tail == "sendRedirect",
            "javascript" => *tail == "redirect",
            "go" => *tail == "Redirect" && expression.contains("http"),
            _ => false,
        })
        .map(|(id, _, _)| id)
        .collect()
}

/// Weak cryptography: factories resolving to a broken algorithm and
/// provider types that are broken by construction. Shares its matching
/// logic with the evaluator rules so the two stay consistent.
fn find_crypto_uses(shard: &Shard) -> Vec<NId> {
    let mut out = Vec::new();
    for step in shard.syntax.steps_ordered() {
        match step {
            SyntaxStep::MethodInvocation { meta, method, .. }
            | SyntaxStep::MethodInvocationChain { meta, method } => {
                if rules::weak_crypto_call(&shard.graph, meta.n_id, method) {
                    out.push(meta.n_id);
                }
            }
            SyntaxStep::ObjectInstantiation { meta, class_type } => {
                if rules::weak_crypto_type(class_type) {
                    out.push(meta.n_id);
                }
            }
            _ => {}
        }
    }
    out
}

fn find_cookie_creations(shard: &Shard) -> Vec<NId> {
    let mut out = Vec::new();
    for step in shard.syntax.steps_ordered() {
        match step {
            SyntaxStep::MethodInvocation { meta, method, .. } => {
                let tail = method.rsplit('.').next().unwrap_or(method.as_str());
                if rules::creates_cookie_call(tail) {
                    out.push(meta.n_id);
                }
            }
            SyntaxStep::ObjectInstantiation { meta, class_type } => {
                if rules::creates_cookie_type(class_type) {
                    out.push(meta.n_id);
                }
            }
            _ => {}
        }
    }
    out
}

/// Invocation steps in document order as (node, callee tail, receiver).
fn invocations(shard: &Shard) -> impl Iterator<Item = (NId, &str, &str)> {
    shard.syntax.steps_ordered().into_iter().filter_map(|step| {
        match step {
            SyntaxStep::MethodInvocation {
                meta,
                method,
                expression,
            } => Some((
                meta.n_id,
                method.rsplit('.').next().unwrap_or(method.as_str()),
                expression.as_str(),
            )),
            SyntaxStep::MethodInvocationChain { meta, method } => Some((
                meta.n_id,
                method.rsplit('.').next().unwrap_or(method.as_str()),
                "",
            )),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, Node};
    use crate::lang::NodeKind;
    use crate::syntax;

    fn call_shard(language: &'static str, callee: &str, receiver: Option<&str>) -> (Shard, NId) {
        let mut g = Graph::new();
        let root = g.add_node(None, Node::new(NodeKind::SourceFile, "t", None, "", 1, 1, 1));
        let call = g.add_node(
            Some(root),
            Node::new(NodeKind::Call, "t", None, "", 2, 5, 2),
        );
        match receiver {
            Some(recv) => {
                let access = g.add_node(
                    Some(call),
                    Node::new(NodeKind::MemberAccess, "t", Some("function"), "", 2, 5, 2),
                );
                g.add_node(
                    Some(access),
                    Node::new(NodeKind::Identifier, "t", Some("object"), recv, 2, 5, 2),
                );
                g.add_node(
                    Some(access),
                    Node::new(NodeKind::Identifier, "t", Some("property"), callee, 2, 5, 2),
                );
            }
            None => {
                g.add_node(
                    Some(call),
                    Node::new(NodeKind::Identifier, "t", Some("function"), callee, 2, 5, 2),
                );
            }
        }
        g.add_node(
            Some(call),
            Node::new(NodeKind::ArgumentList, "t", None, "", 2, 5, 2),
        );
        let steps = syntax::build(&g);
        (
            Shard::new(std::path::PathBuf::from("t"), language, g, steps),
            call,
        )
    }

    #[test]
    fn sql_sink_matched_by_callee_tail() {
        let (shard, call) = call_shard("csharp", "ExecuteSqlCommand", None);
        assert_eq!(find_sql_sinks(&shard), vec![call]);

        let (shard, call) = call_shard("go", "Exec", Some("db"));
        assert_eq!(find_sql_sinks(&shard), vec![call]);

        let (shard, _) = call_shard("go", "Exec", Some("db"));
        assert!(find_redirect_sinks(&shard).is_empty());
    }

    #[test]
    fn generic_xpath_tails_require_xpath_receiver() {
        let (shard, call) = call_shard("java", "evaluate", Some("xpath"));
        assert_eq!(find_xpath_sinks(&shard), vec![call]);

        // `evaluate` on an unrelated receiver is not an XPath sink.
        let (shard, _) = call_shard("java", "evaluate", Some("engine"));
        assert!(find_xpath_sinks(&shard).is_empty());
    }

    #[test]
    fn redirect_sinks_per_language() {
        let (shard, call) = call_shard("javascript", "redirect", Some("res"));
        assert_eq!(find_redirect_sinks(&shard), vec![call]);

        let (shard, call) = call_shard("go", "Redirect", Some("http"));
        assert_eq!(find_redirect_sinks(&shard), vec![call]);

        let (shard, _) = call_shard("java", "redirect", Some("res"));
        assert!(find_redirect_sinks(&shard).is_empty());
    }

    #[test]
    fn crypto_factory_detected_by_shared_rules() {
        let (shard, call) = call_shard("go", "New", Some("md5"));
        assert_eq!(find_crypto_uses(&shard), vec![call]);

        let (shard, _) = call_shard("go", "New", Some("sha256"));
        assert!(find_crypto_uses(&shard).is_empty());
    }

    #[test]
    fn every_detector_code_is_unique() {
        let mut codes: Vec<_> = detectors().iter().map(|d| d.code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), detectors().len());
    }
}
