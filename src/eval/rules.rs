//! Specialized evaluation rules: sanitizers and per-finding method
//! effects. Each rule that fires records a named trigger on the
//! evaluation; downstream logic inspects the trigger set, not just the
//! danger flag.

use crate::findings::FindingCode;
use crate::graph::{Graph, NId};
use crate::lang::NodeKind;

pub const TRIGGER_SANITIZED: &str = "Sanitized";
pub const TRIGGER_WEAK_ALGORITHM: &str = "WeakAlgorithm";
pub const TRIGGER_INSECURE_COOKIE: &str = "InsecureCookie";
pub const TRIGGER_SECURE_ATTRIBUTE: &str = "SecureAttribute";

/// Callee tails that neutralize tainted input for a finding.
///
/// A sanitizing call short-circuits: its value is clean no matter what
/// its arguments carry.
pub fn sanitizer(finding: FindingCode, method_tail: &str) -> Option<&'static str> {
    let sanitizers: &[&str] = match finding {
        FindingCode::SqlInjection => &[
            "SqlParameterSanitize",
            "setString",
            "setInt",
            "escape",
            "escapeId",
            "sanitize",
        ],
        FindingCode::XPathInjection => &["escape", "quote", "sanitize"],
        FindingCode::OpenRedirect => &["IsLocalUrl", "isLocal", "sanitizeUrl"],
        FindingCode::InsecureCrypto | FindingCode::InsecureCookie => &[],
    };
    sanitizers
        .contains(&method_tail)
        .then_some(TRIGGER_SANITIZED)
}

/// Algorithm name fragments considered broken.
const WEAK_ALGORITHMS: &[&str] = &["md5", "sha1", "sha-1", "des", "rc4", "rc2", "3des"];

/// Factory tails that take the algorithm name as a string argument.
const ALGORITHM_FACTORIES: &[&str] = &["getInstance", "createHash", "createCipheriv"];

/// Whether a call resolves to a weak cryptographic primitive, either
/// by callee name (`md5.New`, `MD5.Create`) or by the algorithm string
/// passed to a factory (`MessageDigest.getInstance("MD5")`).
pub fn weak_crypto_call(graph: &Graph, call: NId, method: &str) -> bool {
    let tail = method.rsplit('.').next().unwrap_or(method);
    if ALGORITHM_FACTORIES.contains(&tail) {
        return literal_arguments(graph, call)
            .iter()
            .any(|lit| names_weak_algorithm(lit));
    }
    // `md5.New`, `MD5.Create`, `des.NewCipher`: the qualifier names
    // the algorithm.
    let qualifier = method
        .rsplit_once('.')
        .map(|(head, _)| head.rsplit('.').next().unwrap_or(head))
        .unwrap_or_default();
    names_weak_algorithm(qualifier)
}

/// Whether an instantiated type is a weak cryptographic provider.
pub fn weak_crypto_type(class_type: &str) -> bool {
    let lower = class_type.to_lowercase();
    lower.contains("descryptoserviceprovider")
        || lower.contains("tripledes")
        || lower.contains("rc2cryptoserviceprovider")
        || lower.contains("md5cryptoserviceprovider")
        || lower.contains("sha1managed")
}

fn names_weak_algorithm(text: &str) -> bool {
    let lower = text.to_lowercase();
    WEAK_ALGORITHMS.iter().any(|alg| {
        lower == *alg
            || lower.trim_matches(['"', '\'', '`']) == *alg
            || lower.contains(&format!("{alg}/"))
    })
}

/// Cookie-creating callee tails, per framework.
const COOKIE_CALLS: &[&str] = &["cookie", "addCookie", "Append", "SetCookie"];

/// Cookie-creating constructor type tails.
const COOKIE_TYPES: &[&str] = &["HttpCookie", "Cookie"];

pub fn creates_cookie_call(method_tail: &str) -> bool {
    COOKIE_CALLS.contains(&method_tail)
}

pub fn creates_cookie_type(class_type: &str) -> bool {
    let tail = class_type.rsplit('.').next().unwrap_or(class_type);
    // Strip generics noise before comparing.
    let tail = tail.split('<').next().unwrap_or(tail);
    COOKIE_TYPES.contains(&tail)
}

/// Whether the argument text of a cookie creation mentions a secure
/// attribute (`secure: true`, `Secure = true`, `httpOnly`). Seen as a
/// mitigation trigger alongside the cookie trigger.
pub fn mentions_secure_attribute(graph: &Graph, call: NId) -> bool {
    argument_lists(graph, call).iter().any(|&args| {
        let text = graph.text(args).to_lowercase();
        text.contains("secure") || text.contains("httponly")
    })
}

fn argument_lists(graph: &Graph, call: NId) -> Vec<NId> {
    graph.children_of_kind(call, NodeKind::ArgumentList)
}

/// String literal texts among a call's direct arguments.
fn literal_arguments(graph: &Graph, call: NId) -> Vec<String> {
    argument_lists(graph, call)
        .iter()
        .flat_map(|&args| graph.children(args))
        .filter(|&&a| graph.node(a).kind == NodeKind::StringLiteral)
        .map(|&a| graph.text(a).to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    #[test]
    fn sanitizer_lookup_is_per_finding() {
        assert_eq!(
            sanitizer(FindingCode::SqlInjection, "SqlParameterSanitize"),
            Some(TRIGGER_SANITIZED)
        );
        assert_eq!(sanitizer(FindingCode::OpenRedirect, "SqlParameterSanitize"), None);
        assert_eq!(sanitizer(FindingCode::InsecureCrypto, "escape"), None);
    }

    #[test]
    fn factory_call_with_weak_literal_is_flagged() {
        let mut g = Graph::new();
        let call = g.add_node(
            None,
            Node::new(NodeKind::Call, "test", None, "", 1, 1, 1),
        );
        let args = g.add_node(
            Some(call),
            Node::new(NodeKind::ArgumentList, "test", None, "(\"MD5\")", 1, 1, 1),
        );
        g.add_node(
            Some(args),
            Node::new(NodeKind::StringLiteral, "test", None, "\"MD5\"", 1, 1, 1),
        );
        assert!(weak_crypto_call(&g, call, "MessageDigest.getInstance"));
    }

    #[test]
    fn qualified_weak_callee_is_flagged() {
        let g = Graph::new();
        assert!(weak_crypto_call(&g, NId(0), "md5.New"));
        assert!(weak_crypto_call(&g, NId(0), "MD5.Create"));
        assert!(!weak_crypto_call(&g, NId(0), "sha256.New"));
    }

    #[test]
    fn cookie_type_matching_strips_qualifiers() {
        assert!(creates_cookie_type("HttpCookie"));
        assert!(creates_cookie_type("javax.servlet.http.Cookie"));
        assert!(!creates_cookie_type("CookieJar"));
    }
}
