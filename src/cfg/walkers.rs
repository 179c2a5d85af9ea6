//! Walkers for the compound statement shapes shared by all four
//! supported languages.

use crate::cfg::{CfgBuilder, WalkItem, Walker};
use crate::graph::{EdgeKind, NId};
use crate::lang::NodeKind;

/// Shared walker table. Languages whose control flow fits the common
/// shapes (all four currently do) reuse this table directly.
pub static COMMON_WALKERS: &[Walker] = &[
    Walker {
        kinds: &[NodeKind::If],
        walk: walk_if,
    },
    Walker {
        kinds: &[NodeKind::For, NodeKind::While, NodeKind::DoWhile],
        walk: walk_loop,
    },
    Walker {
        kinds: &[NodeKind::Switch],
        walk: walk_switch,
    },
    Walker {
        kinds: &[NodeKind::Try],
        walk: walk_try,
    },
    Walker {
        kinds: &[NodeKind::Block],
        walk: walk_block,
    },
];

/// Each arm gets a `Maybe` edge from the header and its tail converges
/// on the continuation. The header's own `Next` edge to the
/// continuation is the not-taken path, added by the sequence chain.
fn walk_if(b: &mut CfgBuilder<'_>, item: WalkItem) {
    for field in ["consequence", "alternative"] {
        if let Some(target) = b.graph.child_by_field(item.node, field) {
            let stmts = b.branch_statements(target);
            b.link_branch(item.node, &stmts, item.next);
        }
    }
    // Unbraced grammars without branch fields: fall back to block
    // children of the if node itself.
    if b.graph.child_by_field(item.node, "consequence").is_none() {
        for block in b.graph.children_of_kind(item.node, NodeKind::Block) {
            let stmts = b.statements_of(block);
            b.link_branch(item.node, &stmts, item.next);
        }
    }
}

/// `Maybe` into the body head, body tail loops back to the header with
/// a `Maybe` edge. Loop exit is the header's sequential edge.
fn walk_loop(b: &mut CfgBuilder<'_>, item: WalkItem) {
    let Some(body) = b
        .graph
        .child_by_field(item.node, "body")
        .or_else(|| b.graph.child_of_kind(item.node, NodeKind::Block))
    else {
        return;
    };
    let stmts = b.branch_statements(body);
    b.link_branch(item.node, &stmts, None);
    if let Some(&tail) = stmts.last() {
        b.graph.add_cfg_edge(tail, item.node, EdgeKind::Maybe);
    }
}

/// One `Maybe` edge per case head; every case tail converges on the
/// continuation (fallthrough between cases is not modeled).
fn walk_switch(b: &mut CfgBuilder<'_>, item: WalkItem) {
    let mut cases = b.graph.children_of_kind(item.node, NodeKind::SwitchCase);
    if cases.is_empty() {
        // Grammars that wrap cases in a body block.
        for block in b.graph.children_of_kind(item.node, NodeKind::Block) {
            cases.extend(b.graph.children_of_kind(block, NodeKind::SwitchCase));
        }
    }
    for case in cases {
        let stmts = case_statements(b, case);
        b.link_branch(item.node, &stmts, item.next);
    }
}

/// Statements of a switch case, skipping the matched value and labels.
fn case_statements(b: &CfgBuilder<'_>, case: NId) -> Vec<NId> {
    b.graph
        .children(case)
        .iter()
        .copied()
        .filter(|&c| {
            let node = b.graph.node(c);
            node.kind != NodeKind::Comment
                && node.field.as_deref() != Some("value")
                && !node.grammar_kind.ends_with("label")
        })
        .collect()
}

/// Body statements chain sequentially; each may divert to every catch
/// head. Catch tails and the body tail both reach the finally block
/// (or the continuation when there is none).
fn walk_try(b: &mut CfgBuilder<'_>, item: WalkItem) {
    let body_stmts = b
        .graph
        .child_by_field(item.node, "body")
        .or_else(|| b.graph.child_of_kind(item.node, NodeKind::Block))
        .map(|body| b.statements_of(body))
        .unwrap_or_default();

    let finally_stmts = b
        .graph
        .child_of_kind(item.node, NodeKind::FinallyClause)
        .and_then(|f| b.graph.child_of_kind(f, NodeKind::Block))
        .map(|block| b.statements_of(block))
        .unwrap_or_default();
    let after = finally_stmts.first().copied().or(item.next);

    match body_stmts.first() {
        Some(&head) => b.graph.add_cfg_edge(item.node, head, EdgeKind::Next),
        None => {
            if let Some(a) = after {
                b.graph.add_cfg_edge(item.node, a, EdgeKind::Next);
            }
        }
    }
    b.link_sequence(&body_stmts, after);

    for catch in b.graph.children_of_kind(item.node, NodeKind::CatchClause) {
        let catch_stmts = b
            .graph
            .child_of_kind(catch, NodeKind::Block)
            .map(|block| b.statements_of(block))
            .unwrap_or_default();
        if let Some(&catch_head) = catch_stmts.first() {
            for &stmt in &body_stmts {
                b.graph.add_cfg_edge(stmt, catch_head, EdgeKind::Maybe);
            }
        }
        b.link_sequence(&catch_stmts, after);
    }

    if !finally_stmts.is_empty() {
        b.link_sequence(&finally_stmts, item.next);
    }
}

/// Bare block statement: control enters unconditionally and the tail
/// continues to the follow statement.
fn walk_block(b: &mut CfgBuilder<'_>, item: WalkItem) {
    let stmts = b.statements_of(item.node);
    match stmts.first() {
        Some(&head) => {
            b.graph.add_cfg_edge(item.node, head, EdgeKind::Next);
            b.link_sequence(&stmts, item.next);
        }
        None => {
            if let Some(next) = item.next {
                b.graph.add_cfg_edge(item.node, next, EdgeKind::Next);
            }
        }
    }
}
