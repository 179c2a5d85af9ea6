//! Bounded symbolic evaluation of candidate sinks.
//!
//! For each sink the evaluator enumerates acyclic backward CFG paths
//! from the sink's statement (bounded by [`EvalLimits`]), replays each
//! path forward with a variable environment, and ORs the per-path
//! danger verdicts. All per-path state is discarded between paths;
//! only the cumulative trigger set survives the whole evaluation.
//!
//! The model is deliberately an under-approximation: a symbol the
//! environment cannot resolve is treated as not tainted.

pub mod rules;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::EvalLimits;
use crate::findings::FindingCode;
use crate::graph::{Graph, NId, Shard};
use crate::lang::NodeKind;
use crate::syntax::SyntaxStep;
use crate::taint::TaintOverlay;

/// Outcome of evaluating one sink.
#[derive(Debug, Default)]
pub struct Evaluation {
    /// Whether any path delivers tainted input to the sink.
    pub danger: bool,
    /// Named rule triggers observed on any path.
    pub triggers: FxHashSet<&'static str>,
}

/// Evaluate a candidate sink for one finding.
pub fn evaluate(
    shard: &Shard,
    overlay: &TaintOverlay,
    finding: FindingCode,
    sink: NId,
    limits: &EvalLimits,
) -> Evaluation {
    let stmt = enclosing_statement(&shard.graph, sink);
    let seeds = parameter_seeds(shard, overlay, finding, sink);
    let paths = backward_paths(&shard.graph, stmt, limits);

    let mut evaluation = Evaluation::default();
    for path in paths {
        let mut walk = PathWalk {
            shard,
            overlay,
            finding,
            env: seeds.clone(),
            memo: FxHashMap::default(),
            triggers: FxHashSet::default(),
        };
        for &stmt in &path {
            walk.eval(stmt);
        }
        evaluation.danger |= walk.eval(sink);
        evaluation.triggers.extend(walk.triggers);
    }
    evaluation
}

/// Nearest enclosing node (possibly the sink itself) that participates
/// in the CFG. Top-level code outside any function stays as-is and is
/// replayed as a single-statement path.
fn enclosing_statement(graph: &Graph, sink: NId) -> NId {
    let participants: FxHashSet<NId> = graph
        .cfg_edges()
        .iter()
        .flat_map(|e| [e.from, e.to])
        .collect();
    if participants.contains(&sink) {
        return sink;
    }
    let mut cur = sink;
    while let Some(parent) = graph.parent(cur) {
        if participants.contains(&parent) {
            return parent;
        }
        cur = parent;
    }
    sink
}

/// Initial environment: parameters of the sink's enclosing function
/// that are marked tainted for this finding.
fn parameter_seeds(
    shard: &Shard,
    overlay: &TaintOverlay,
    finding: FindingCode,
    sink: NId,
) -> FxHashMap<String, bool> {
    let mut env = FxHashMap::default();
    let Some(func) = shard.graph.ancestor_where(sink, |n| {
        matches!(n.kind, NodeKind::FunctionDeclaration | NodeKind::Lambda)
    }) else {
        return env;
    };
    let Some(SyntaxStep::MethodDeclaration { parameters, .. }) = shard.syntax.step(func) else {
        return env;
    };
    for &param in parameters {
        if let Some(SyntaxStep::Parameter { name, .. }) = shard.syntax.step(param) {
            if overlay.is_tainted(shard.id, param, finding) && !name.is_empty() {
                env.insert(name.clone(), true);
            }
        }
    }
    env
}

/// Enumerate acyclic backward paths from `sink` over CFG predecessor
/// edges, bounded in depth and count. Returned paths run in forward
/// (execution) order and end at the sink statement.
fn backward_paths(graph: &Graph, sink: NId, limits: &EvalLimits) -> Vec<Vec<NId>> {
    let mut paths = Vec::new();
    let mut path = vec![sink];
    let mut on_path: FxHashSet<NId> = FxHashSet::default();
    on_path.insert(sink);
    // Per frame: next predecessor index, and whether the frame ever
    // extended the path. Only frames that never extended are maximal.
    let mut frames = vec![(0usize, false)];

    while let Some(&current) = path.last() {
        if paths.len() >= limits.max_paths {
            break;
        }
        let preds = graph.cfg_predecessors(current);
        let Some(fi) = frames.len().checked_sub(1) else {
            break;
        };
        let mut pushed = false;
        while frames[fi].0 < preds.len() {
            let pred = preds[frames[fi].0];
            frames[fi].0 += 1;
            if path.len() < limits.max_depth && !on_path.contains(&pred) {
                frames[fi].1 = true;
                path.push(pred);
                on_path.insert(pred);
                frames.push((0, false));
                pushed = true;
                break;
            }
        }
        if pushed {
            continue;
        }
        // Dead end: an entry statement, a cycle, or the depth bound.
        // A frame that extended earlier only closes suffixes of paths
        // already emitted deeper in, so it is skipped.
        if !frames[fi].1 {
            let mut complete = path.clone();
            complete.reverse();
            paths.push(complete);
        }
        let done = path.pop().unwrap_or(sink);
        on_path.remove(&done);
        frames.pop();
    }
    paths
}

/// Forward replay state for a single path.
struct PathWalk<'a> {
    shard: &'a Shard,
    overlay: &'a TaintOverlay,
    finding: FindingCode,
    /// Latest known danger per variable name; later assignments win.
    env: FxHashMap<String, bool>,
    /// Per-node danger within this path only.
    memo: FxHashMap<NId, bool>,
    triggers: FxHashSet<&'static str>,
}

impl PathWalk<'_> {
    fn eval(&mut self, node: NId) -> bool {
        if let Some(&cached) = self.memo.get(&node) {
            return cached;
        }
        // Break dependency cycles defensively while computing.
        self.memo.insert(node, false);
        let danger = self.eval_step(node);
        self.memo.insert(node, danger);
        danger
    }

    fn eval_deps(&mut self, node: NId) -> bool {
        let deps = self
            .shard
            .syntax
            .step(node)
            .map(|s| s.dependencies().to_vec())
            .unwrap_or_default();
        let mut danger = false;
        for dep in deps {
            danger |= self.eval(dep);
        }
        danger
    }

    fn eval_step(&mut self, node: NId) -> bool {
        let Some(step) = self.shard.syntax.step(node) else {
            return false;
        };
        match step {
            SyntaxStep::SymbolLookup { symbol, .. } => {
                self.env.get(symbol.as_str()).copied().unwrap_or(false)
            }
            SyntaxStep::Parameter { name, .. } => {
                let danger = self.overlay.is_tainted(self.shard.id, node, self.finding);
                if !name.is_empty() {
                    self.env.insert(name.clone(), danger);
                }
                danger
            }
            SyntaxStep::Declaration { var, .. } | SyntaxStep::Assignment { var, .. } => {
                let var = var.clone();
                let danger = self.eval_deps(node);
                if !var.is_empty() {
                    self.env.insert(var, danger);
                }
                danger
            }
            SyntaxStep::MethodInvocation { method, .. }
            | SyntaxStep::MethodInvocationChain { method, .. } => {
                let method = method.clone();
                self.eval_call(node, &method)
            }
            SyntaxStep::ObjectInstantiation { class_type, .. } => {
                let class_type = class_type.clone();
                self.eval_instantiation(node, &class_type)
            }
            SyntaxStep::MethodDeclaration { .. } | SyntaxStep::ClassDeclaration { .. } => false,
            _ => self.eval_deps(node),
        }
    }

    fn eval_call(&mut self, node: NId, method: &str) -> bool {
        let tail = method.rsplit('.').next().unwrap_or(method);

        // Sanitizers neutralize their arguments outright.
        if let Some(trigger) = rules::sanitizer(self.finding, tail) {
            self.triggers.insert(trigger);
            return false;
        }
        match self.finding {
            FindingCode::InsecureCrypto
                if rules::weak_crypto_call(&self.shard.graph, node, method) =>
            {
                self.triggers.insert(rules::TRIGGER_WEAK_ALGORITHM);
                true
            }
            FindingCode::InsecureCookie if rules::creates_cookie_call(tail) => {
                self.triggers.insert(rules::TRIGGER_INSECURE_COOKIE);
                if rules::mentions_secure_attribute(&self.shard.graph, node) {
                    self.triggers.insert(rules::TRIGGER_SECURE_ATTRIBUTE);
                }
                true
            }
            _ => self.eval_deps(node),
        }
    }

    fn eval_instantiation(&mut self, node: NId, class_type: &str) -> bool {
        match self.finding {
            FindingCode::InsecureCrypto if rules::weak_crypto_type(class_type) => {
                self.triggers.insert(rules::TRIGGER_WEAK_ALGORITHM);
                true
            }
            FindingCode::InsecureCookie if rules::creates_cookie_type(class_type) => {
                self.triggers.insert(rules::TRIGGER_INSECURE_COOKIE);
                if rules::mentions_secure_attribute(&self.shard.graph, node) {
                    self.triggers.insert(rules::TRIGGER_SECURE_ATTRIBUTE);
                }
                true
            }
            _ => self.eval_deps(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, Node};
    use crate::syntax;

    fn add(g: &mut Graph, parent: Option<NId>, kind: NodeKind, text: &str) -> NId {
        g.add_node(parent, Node::new(kind, "test", None, text, 1, 1, 1))
    }

    fn limits() -> EvalLimits {
        EvalLimits::default()
    }

    #[test]
    fn backward_paths_respect_cycles() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let a = add(&mut g, Some(root), NodeKind::ExpressionStatement, "a");
        let b = add(&mut g, Some(root), NodeKind::While, "b");
        let c = add(&mut g, Some(root), NodeKind::ExpressionStatement, "c");
        // a -> b -> c with a loop back edge c -> b.
        g.add_cfg_edge(a, b, EdgeKind::Next);
        g.add_cfg_edge(b, c, EdgeKind::Maybe);
        g.add_cfg_edge(c, b, EdgeKind::Maybe);

        let paths = backward_paths(&g, c, &limits());
        // The back edge cannot revisit b; exactly one acyclic path.
        assert_eq!(paths, vec![vec![a, b, c]]);
    }

    #[test]
    fn straight_line_yields_one_path_not_its_suffixes() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let a = add(&mut g, Some(root), NodeKind::ExpressionStatement, "a");
        let b = add(&mut g, Some(root), NodeKind::ExpressionStatement, "b");
        let c = add(&mut g, Some(root), NodeKind::ExpressionStatement, "c");
        g.add_cfg_edge(a, b, EdgeKind::Next);
        g.add_cfg_edge(b, c, EdgeKind::Next);

        // Replaying a suffix like [b, c] would skip any re-binding in
        // `a`, so only the full path may be emitted.
        assert_eq!(backward_paths(&g, c, &limits()), vec![vec![a, b, c]]);
    }

    #[test]
    fn backward_paths_fan_out_over_branches() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let iff = add(&mut g, Some(root), NodeKind::If, "");
        let t = add(&mut g, Some(root), NodeKind::ExpressionStatement, "t");
        let e = add(&mut g, Some(root), NodeKind::ExpressionStatement, "e");
        let join = add(&mut g, Some(root), NodeKind::Return, "r");
        g.add_cfg_edge(iff, t, EdgeKind::Maybe);
        g.add_cfg_edge(iff, e, EdgeKind::Maybe);
        g.add_cfg_edge(t, join, EdgeKind::Next);
        g.add_cfg_edge(e, join, EdgeKind::Next);
        g.add_cfg_edge(iff, join, EdgeKind::Next);

        let mut paths = backward_paths(&g, join, &limits());
        paths.sort();
        assert_eq!(paths.len(), 3);
        assert!(paths.contains(&vec![iff, t, join]));
        assert!(paths.contains(&vec![iff, e, join]));
        assert!(paths.contains(&vec![iff, join]));
    }

    #[test]
    fn path_count_is_bounded() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let sink = add(&mut g, Some(root), NodeKind::Return, "r");
        for i in 0..10 {
            let p = add(&mut g, Some(root), NodeKind::ExpressionStatement, "p");
            let _ = i;
            g.add_cfg_edge(p, sink, EdgeKind::Maybe);
        }
        let limits = EvalLimits {
            max_paths: 4,
            ..EvalLimits::default()
        };
        assert_eq!(backward_paths(&g, sink, &limits).len(), 4);
    }

    /// `query(userInput)` with a tainted parameter is dangerous;
    /// re-binding the variable to a literal first makes it clean.
    #[test]
    fn assignment_rebind_clears_taint() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let func = add(&mut g, Some(root), NodeKind::FunctionDeclaration, "");
        g.add_node(
            Some(func),
            Node::new(NodeKind::Identifier, "test", Some("name"), "handler", 1, 1, 1),
        );
        let plist = add(&mut g, Some(func), NodeKind::ParameterList, "");
        let param = add(&mut g, Some(plist), NodeKind::Parameter, "");
        g.add_node(
            Some(param),
            Node::new(NodeKind::Identifier, "test", Some("name"), "userInput", 1, 1, 1),
        );
        let body = add(&mut g, Some(func), NodeKind::Block, "");

        // userInput = "constant";
        let assign_stmt = add(&mut g, Some(body), NodeKind::ExpressionStatement, "");
        let assign = add(&mut g, Some(assign_stmt), NodeKind::Assignment, "");
        g.add_node(
            Some(assign),
            Node::new(NodeKind::Identifier, "test", Some("left"), "userInput", 2, 1, 2),
        );
        g.add_node(
            Some(assign),
            Node::new(NodeKind::StringLiteral, "test", Some("right"), "\"constant\"", 2, 1, 2),
        );

        // query(userInput);
        let call_stmt = add(&mut g, Some(body), NodeKind::ExpressionStatement, "");
        let call = add(&mut g, Some(call_stmt), NodeKind::Call, "query(userInput)");
        g.add_node(
            Some(call),
            Node::new(NodeKind::Identifier, "test", Some("function"), "query", 3, 1, 3),
        );
        let args = add(&mut g, Some(call), NodeKind::ArgumentList, "");
        add(&mut g, Some(args), NodeKind::Identifier, "userInput");

        g.add_cfg_edge(assign_stmt, call_stmt, EdgeKind::Next);

        let steps = syntax::build(&g);
        let shard = Shard::new(std::path::PathBuf::from("t"), "java", g, steps);
        let mut overlay = TaintOverlay::new();
        overlay.mark(shard.id, param, FindingCode::SqlInjection);

        // With the rebind on the path, the sink is clean.
        let eval = evaluate(&shard, &overlay, FindingCode::SqlInjection, call, &limits());
        assert!(!eval.danger);

        // Evaluating the call statement alone (no rebind replayed
        // before it) sees the tainted parameter.
        let direct = {
            let mut walk = PathWalk {
                shard: &shard,
                overlay: &overlay,
                finding: FindingCode::SqlInjection,
                env: parameter_seeds(&shard, &overlay, FindingCode::SqlInjection, call),
                memo: FxHashMap::default(),
                triggers: FxHashSet::default(),
            };
            walk.eval(call)
        };
        assert!(direct);
    }

    #[test]
    fn sanitizer_short_circuits_and_records_trigger() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "");
        let func = add(&mut g, Some(root), NodeKind::FunctionDeclaration, "");
        let plist = add(&mut g, Some(func), NodeKind::ParameterList, "");
        let param = add(&mut g, Some(plist), NodeKind::Parameter, "");
        g.add_node(
            Some(param),
            Node::new(NodeKind::Identifier, "test", Some("name"), "userInput", 1, 1, 1),
        );
        let body = add(&mut g, Some(func), NodeKind::Block, "");

        // query(SqlParameterSanitize(userInput));
        let stmt = add(&mut g, Some(body), NodeKind::ExpressionStatement, "");
        let outer = add(&mut g, Some(stmt), NodeKind::Call, "");
        g.add_node(
            Some(outer),
            Node::new(NodeKind::Identifier, "test", Some("function"), "query", 2, 1, 2),
        );
        let outer_args = add(&mut g, Some(outer), NodeKind::ArgumentList, "");
        let inner = add(&mut g, Some(outer_args), NodeKind::Call, "");
        g.add_node(
            Some(inner),
            Node::new(
                NodeKind::Identifier,
                "test",
                Some("function"),
                "SqlParameterSanitize",
                2,
                1,
                2,
            ),
        );
        let inner_args = add(&mut g, Some(inner), NodeKind::ArgumentList, "");
        add(&mut g, Some(inner_args), NodeKind::Identifier, "userInput");

        let steps = syntax::build(&g);
        let shard = Shard::new(std::path::PathBuf::from("t"), "csharp", g, steps);
        let mut overlay = TaintOverlay::new();
        overlay.mark(shard.id, param, FindingCode::SqlInjection);

        let eval = evaluate(&shard, &overlay, FindingCode::SqlInjection, outer, &limits());
        assert!(!eval.danger);
        assert!(eval.triggers.contains(rules::TRIGGER_SANITIZED));
    }
}
