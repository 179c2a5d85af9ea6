//! Control-flow graph construction.
//!
//! CFG edges are threaded through the existing node arena: statement
//! nodes gain [`EdgeKind::Next`] edges for deterministic order and
//! [`EdgeKind::Maybe`] edges for conditional branches. Construction is
//! driven by an explicit work stack rather than recursion, so deeply
//! nested sources cannot overflow.
//!
//! Each compound statement kind is handled by a walker from the
//! language's walker table; the first entry whose kind list contains
//! the statement's kind wins. A compound kind with no walker is logged
//! and treated as opaque (the sequential edge around it still exists).

pub mod walkers;

use tracing::debug;

use crate::graph::{EdgeKind, Graph, NId};
use crate::lang::{Language, NodeKind};

pub use walkers::COMMON_WALKERS;

/// One pending compound statement: the node to expand and the
/// statement control falls through to afterwards.
#[derive(Debug, Clone, Copy)]
pub struct WalkItem {
    pub node: NId,
    pub next: Option<NId>,
}

/// Walker function: expand one compound statement into CFG edges,
/// pushing nested compounds back onto the builder's stack.
pub type WalkFn = fn(&mut CfgBuilder<'_>, WalkItem);

/// Dispatch entry pairing a walker with the kinds it applies to.
pub struct Walker {
    pub kinds: &'static [NodeKind],
    pub walk: WalkFn,
}

/// Build CFG edges for every function body in the file.
pub fn build(graph: &mut Graph, lang: &dyn Language) {
    let functions: Vec<NId> = graph
        .node_ids()
        .filter(|&id| {
            matches!(
                graph.node(id).kind,
                NodeKind::FunctionDeclaration | NodeKind::Lambda
            )
        })
        .collect();

    let mut builder = CfgBuilder {
        graph,
        walkers: lang.walkers(),
        stack: Vec::new(),
    };
    for func in functions {
        builder.walk_function(func);
    }
}

/// Per-file CFG construction state.
pub struct CfgBuilder<'g> {
    pub graph: &'g mut Graph,
    walkers: &'static [Walker],
    stack: Vec<WalkItem>,
}

impl<'g> CfgBuilder<'g> {
    fn walk_function(&mut self, func: NId) {
        let Some(body) = self.graph.child_of_kind(func, NodeKind::Block) else {
            // Expression-bodied lambdas carry no statement sequence.
            return;
        };
        let stmts = self.statements_of(body);
        self.link_sequence(&stmts, None);
        while let Some(item) = self.stack.pop() {
            self.dispatch(item);
        }
    }

    fn dispatch(&mut self, item: WalkItem) {
        let kind = self.graph.node(item.node).kind;
        match self.walkers.iter().find(|w| w.kinds.contains(&kind)) {
            Some(w) => (w.walk)(self, item),
            None => {
                debug!(
                    grammar_kind = &*self.graph.node(item.node).grammar_kind,
                    line = self.graph.node(item.node).line,
                    "no walker for compound statement, treating as opaque"
                );
            }
        }
    }

    /// Non-comment children of a statement container.
    pub fn statements_of(&self, container: NId) -> Vec<NId> {
        self.graph
            .children(container)
            .iter()
            .copied()
            .filter(|&c| self.graph.node(c).kind != NodeKind::Comment)
            .collect()
    }

    /// Statement list of a branch target: a block's children, or the
    /// single statement itself when the grammar allows an unbraced
    /// branch. Wrapper nodes (e.g. an else clause) are looked through.
    pub fn branch_statements(&self, target: NId) -> Vec<NId> {
        let mut node = target;
        while self.graph.node(node).kind == NodeKind::Other {
            match self
                .graph
                .children(node)
                .iter()
                .copied()
                .find(|&c| self.graph.node(c).kind != NodeKind::Comment)
            {
                Some(inner) => node = inner,
                None => return Vec::new(),
            }
        }
        if self.graph.node(node).kind == NodeKind::Block {
            self.statements_of(node)
        } else {
            vec![node]
        }
    }

    /// Chain a statement sequence with `Next` edges, ending at `next`
    /// when given, and queue every compound statement for expansion.
    ///
    /// Statements that unconditionally enter their own body (bare
    /// blocks, try statements) do not get the chain edge; their walker
    /// routes control through the body to the follow statement.
    pub fn link_sequence(&mut self, stmts: &[NId], next: Option<NId>) {
        for (i, &stmt) in stmts.iter().enumerate() {
            let follow = stmts.get(i + 1).copied().or(next);
            let kind = self.graph.node(stmt).kind;
            if kind.is_compound() {
                self.stack.push(WalkItem { node: stmt, next: follow });
            }
            let enters_body = matches!(kind, NodeKind::Try | NodeKind::Block);
            if let (Some(f), false) = (follow, enters_body) {
                self.graph.add_cfg_edge(stmt, f, EdgeKind::Next);
            }
        }
    }

    /// `Maybe` edge into the head of a branch, then chain its body.
    pub fn link_branch(&mut self, from: NId, stmts: &[NId], next: Option<NId>) {
        if let Some(&head) = stmts.first() {
            self.graph.add_cfg_edge(from, head, EdgeKind::Maybe);
            self.link_sequence(stmts, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CfgEdge, Node};
    use crate::lang::LanguageRegistry;

    fn add(g: &mut Graph, parent: Option<NId>, kind: NodeKind, text: &str, line: usize) -> NId {
        g.add_node(parent, Node::new(kind, "test", None, text, line, 1, line))
    }

    fn has_edge(g: &Graph, from: NId, to: NId, kind: EdgeKind) -> bool {
        g.cfg_edges().contains(&CfgEdge { from, to, kind })
    }

    fn lang() -> &'static dyn Language {
        LanguageRegistry::global().by_name("java").unwrap()
    }

    #[test]
    fn straight_line_body_is_chained() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "", 1);
        let func = add(&mut g, Some(root), NodeKind::FunctionDeclaration, "", 1);
        let body = add(&mut g, Some(func), NodeKind::Block, "", 1);
        let s1 = add(&mut g, Some(body), NodeKind::ExpressionStatement, "a()", 2);
        let s2 = add(&mut g, Some(body), NodeKind::ExpressionStatement, "b()", 3);
        let s3 = add(&mut g, Some(body), NodeKind::Return, "return", 4);

        build(&mut g, lang());
        assert!(has_edge(&g, s1, s2, EdgeKind::Next));
        assert!(has_edge(&g, s2, s3, EdgeKind::Next));
        assert_eq!(g.cfg_edges().len(), 2);
    }

    #[test]
    fn if_branches_get_maybe_edges_and_converge() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "", 1);
        let func = add(&mut g, Some(root), NodeKind::FunctionDeclaration, "", 1);
        let body = add(&mut g, Some(func), NodeKind::Block, "", 1);
        let iff = add(&mut g, Some(body), NodeKind::If, "", 2);
        let after = add(&mut g, Some(body), NodeKind::Return, "return", 6);

        let then_block = g.add_node(
            Some(iff),
            Node::new(NodeKind::Block, "block", Some("consequence"), "", 2, 1, 4),
        );
        let then_stmt = add(&mut g, Some(then_block), NodeKind::ExpressionStatement, "a()", 3);
        let else_block = g.add_node(
            Some(iff),
            Node::new(NodeKind::Block, "block", Some("alternative"), "", 4, 1, 6),
        );
        let else_stmt = add(&mut g, Some(else_block), NodeKind::ExpressionStatement, "b()", 5);

        build(&mut g, lang());
        // Fallthrough around the branch plus a maybe edge into each arm.
        assert!(has_edge(&g, iff, after, EdgeKind::Next));
        assert!(has_edge(&g, iff, then_stmt, EdgeKind::Maybe));
        assert!(has_edge(&g, iff, else_stmt, EdgeKind::Maybe));
        // Both arm tails converge on the continuation.
        assert!(has_edge(&g, then_stmt, after, EdgeKind::Next));
        assert!(has_edge(&g, else_stmt, after, EdgeKind::Next));
    }

    #[test]
    fn loop_body_gets_back_edge() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "", 1);
        let func = add(&mut g, Some(root), NodeKind::FunctionDeclaration, "", 1);
        let body = add(&mut g, Some(func), NodeKind::Block, "", 1);
        let lp = add(&mut g, Some(body), NodeKind::While, "", 2);
        let after = add(&mut g, Some(body), NodeKind::Return, "return", 6);

        let loop_body = g.add_node(
            Some(lp),
            Node::new(NodeKind::Block, "block", Some("body"), "", 2, 1, 5),
        );
        let s1 = add(&mut g, Some(loop_body), NodeKind::ExpressionStatement, "a()", 3);
        let s2 = add(&mut g, Some(loop_body), NodeKind::ExpressionStatement, "b()", 4);

        build(&mut g, lang());
        assert!(has_edge(&g, lp, s1, EdgeKind::Maybe));
        assert!(has_edge(&g, s1, s2, EdgeKind::Next));
        // Tail loops back to the header, header falls through.
        assert!(has_edge(&g, s2, lp, EdgeKind::Maybe));
        assert!(has_edge(&g, lp, after, EdgeKind::Next));
    }

    #[test]
    fn try_statements_may_jump_to_catch() {
        let mut g = Graph::new();
        let root = add(&mut g, None, NodeKind::SourceFile, "", 1);
        let func = add(&mut g, Some(root), NodeKind::FunctionDeclaration, "", 1);
        let body = add(&mut g, Some(func), NodeKind::Block, "", 1);
        let tr = add(&mut g, Some(body), NodeKind::Try, "", 2);
        let after = add(&mut g, Some(body), NodeKind::Return, "return", 9);

        let try_block = g.add_node(
            Some(tr),
            Node::new(NodeKind::Block, "block", Some("body"), "", 2, 1, 5),
        );
        let t1 = add(&mut g, Some(try_block), NodeKind::ExpressionStatement, "a()", 3);
        let t2 = add(&mut g, Some(try_block), NodeKind::ExpressionStatement, "b()", 4);
        let catch = add(&mut g, Some(tr), NodeKind::CatchClause, "", 5);
        let catch_block = add(&mut g, Some(catch), NodeKind::Block, "", 5);
        let c1 = add(&mut g, Some(catch_block), NodeKind::ExpressionStatement, "h()", 6);

        build(&mut g, lang());
        assert!(has_edge(&g, tr, t1, EdgeKind::Next));
        assert!(has_edge(&g, t1, t2, EdgeKind::Next));
        // Every try statement may divert to the handler head.
        assert!(has_edge(&g, t1, c1, EdgeKind::Maybe));
        assert!(has_edge(&g, t2, c1, EdgeKind::Maybe));
        // Both exits reach the continuation.
        assert!(has_edge(&g, t2, after, EdgeKind::Next));
        assert!(has_edge(&g, c1, after, EdgeKind::Next));
        // No sequential edge skipping the try body.
        assert!(!has_edge(&g, tr, after, EdgeKind::Next));
    }
}
