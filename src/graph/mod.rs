//! Unified graph model for parsed source files.
//!
//! A [`Graph`] is an arena of [`Node`]s indexed by [`NId`]. It holds two edge
//! layers over the same node set:
//!
//! - the **AST layer**: parent/child adjacency copied from the parse tree,
//! - the **CFG layer**: execution-order edges added by the control-flow
//!   walkers ([`EdgeKind::Next`] for deterministic order, [`EdgeKind::Maybe`]
//!   for conditional branches).
//!
//! Nodes are immutable once created; later passes (taint marking, symbolic
//! evaluation) attach their state in separate overlay maps keyed by `NId`
//! rather than mutating the node records. Graphs are append-only per
//! compilation unit and never delete nodes.

pub mod shard;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::lang::NodeKind;

pub use shard::{GraphDb, Shard, ShardId};

/// Node label text longer than this is not retained.
///
/// Only short labels (identifiers, literals, member-access chains, call
/// callees) are consulted by the syntax reducer and the detectors; keeping
/// the text of every statement and block would duplicate the whole source
/// once per nesting level.
const MAX_LABEL_TEXT: usize = 256;

/// Unique identifier for a node within one graph (arena index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NId(pub u32);

impl NId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Semantic kind of a CFG edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Deterministic execution order (fallthrough, sequential statement).
    Next,
    /// Conditional branch that may or may not execute: loop body, case
    /// branch, catch block, loop back edge.
    Maybe,
}

/// A CFG edge between two statement nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub from: NId,
    pub to: NId,
    pub kind: EdgeKind,
}

/// A vertex in the unified graph.
///
/// Carries the normalized kind, the raw grammar kind string (kept for
/// diagnostics on the degrade path), the source span, and the label text for
/// short nodes.
#[derive(Debug, Clone)]
pub struct Node {
    /// Normalized, language-independent kind.
    pub kind: NodeKind,
    /// Raw tree-sitter kind string, for missing-case diagnostics.
    pub grammar_kind: Box<str>,
    /// Field name this node occupies in its parent, when the grammar names it.
    pub field: Option<Box<str>>,
    /// Source text, retained only for short nodes (see [`MAX_LABEL_TEXT`]).
    text: Option<Box<str>>,
    /// 1-indexed start line.
    pub line: usize,
    /// 1-indexed start column.
    pub column: usize,
    /// 1-indexed end line.
    pub end_line: usize,
}

impl Node {
    pub fn new(
        kind: NodeKind,
        grammar_kind: &str,
        field: Option<&str>,
        text: &str,
        line: usize,
        column: usize,
        end_line: usize,
    ) -> Self {
        Self {
            kind,
            grammar_kind: grammar_kind.into(),
            field: field.map(Into::into),
            text: (text.len() <= MAX_LABEL_TEXT).then(|| text.into()),
            line,
            column,
            end_line,
        }
    }

    /// Label text of this node, empty when the text was too long to retain.
    #[inline]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Cached CFG predecessor lists for O(1) lookups during evaluation.
///
/// Built lazily on first access, after CFG construction has finished.
#[derive(Debug, Default)]
struct PredecessorCache {
    predecessors: FxHashMap<NId, Vec<NId>>,
}

/// Arena graph owning the node table, AST adjacency, and CFG edges.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    children: Vec<Vec<NId>>,
    parent: Vec<Option<NId>>,
    cfg_edges: Vec<CfgEdge>,
    pred_cache: OnceCell<PredecessorCache>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, linking it under `parent` when given. Returns its id.
    pub fn add_node(&mut self, parent: Option<NId>, node: Node) -> NId {
        let id = NId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.parent.push(parent);
        if let Some(p) = parent {
            self.children[p.index()].push(id);
        }
        id
    }

    #[inline]
    pub fn node(&self, id: NId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in creation (document) order.
    pub fn node_ids(&self) -> impl Iterator<Item = NId> + '_ {
        (0..self.nodes.len() as u32).map(NId)
    }

    #[inline]
    pub fn children(&self, id: NId) -> &[NId] {
        &self.children[id.index()]
    }

    #[inline]
    pub fn parent(&self, id: NId) -> Option<NId> {
        self.parent[id.index()]
    }

    /// Label text of a node (empty when not retained).
    #[inline]
    pub fn text(&self, id: NId) -> &str {
        self.node(id).text()
    }

    /// First child occupying the given grammar field.
    pub fn child_by_field(&self, id: NId, field: &str) -> Option<NId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.node(c).field.as_deref() == Some(field))
    }

    /// First child of the given normalized kind.
    pub fn child_of_kind(&self, id: NId, kind: NodeKind) -> Option<NId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.node(c).kind == kind)
    }

    /// All children of the given normalized kind.
    pub fn children_of_kind(&self, id: NId, kind: NodeKind) -> Vec<NId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.node(c).kind == kind)
            .collect()
    }

    /// Nearest ancestor (excluding `id` itself) matching the predicate.
    pub fn ancestor_where(&self, id: NId, pred: impl Fn(&Node) -> bool) -> Option<NId> {
        let mut cur = self.parent(id);
        while let Some(a) = cur {
            if pred(self.node(a)) {
                return Some(a);
            }
            cur = self.parent(a);
        }
        None
    }

    /// Depth-first preorder descendants of a node, excluding the node itself.
    pub fn descendants(&self, id: NId) -> Vec<NId> {
        let mut out = Vec::new();
        let mut stack: Vec<NId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    // =========================================================================
    // CFG layer
    // =========================================================================

    /// Add a CFG edge. Must only be called during construction, before any
    /// predecessor lookup has been made.
    pub fn add_cfg_edge(&mut self, from: NId, to: NId, kind: EdgeKind) {
        debug_assert!(
            self.pred_cache.get().is_none(),
            "CFG edge added after predecessor cache was built"
        );
        self.cfg_edges.push(CfgEdge { from, to, kind });
    }

    #[inline]
    pub fn cfg_edges(&self) -> &[CfgEdge] {
        &self.cfg_edges
    }

    fn build_pred_cache(&self) -> PredecessorCache {
        let mut predecessors: FxHashMap<NId, Vec<NId>> = FxHashMap::default();
        for edge in &self.cfg_edges {
            predecessors.entry(edge.to).or_default().push(edge.from);
        }
        PredecessorCache { predecessors }
    }

    /// CFG predecessors of a statement node.
    ///
    /// First call builds the cache in O(E); subsequent calls are O(1).
    pub fn cfg_predecessors(&self, id: NId) -> &[NId] {
        self.pred_cache
            .get_or_init(|| self.build_pred_cache())
            .predecessors
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a node participates in the CFG layer at all.
    pub fn in_cfg(&self, id: NId) -> bool {
        self.cfg_edges
            .iter()
            .any(|e| e.from == id || e.to == id)
    }
}
