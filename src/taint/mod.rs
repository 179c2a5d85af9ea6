//! Taint overlay: which nodes carry user-controlled input, per finding.
//!
//! Taint state lives outside the node records, keyed by shard and node
//! id, so graphs stay immutable after construction. A node can be
//! tainted for several findings at once; marking is additive and
//! idempotent.

pub mod seeding;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::findings::FindingCode;
use crate::graph::{NId, ShardId};

pub use seeding::seed;

#[derive(Debug, Default)]
pub struct TaintOverlay {
    marks: FxHashMap<(ShardId, NId), FxHashSet<FindingCode>>,
}

impl TaintOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a node as tainted input for one finding. Returns whether
    /// the mark was new.
    pub fn mark(&mut self, shard: ShardId, node: NId, finding: FindingCode) -> bool {
        self.marks.entry((shard, node)).or_default().insert(finding)
    }

    pub fn is_tainted(&self, shard: ShardId, node: NId, finding: FindingCode) -> bool {
        self.marks
            .get(&(shard, node))
            .is_some_and(|set| set.contains(&finding))
    }

    /// Findings a node is tainted for.
    pub fn findings(&self, shard: ShardId, node: NId) -> impl Iterator<Item = FindingCode> + '_ {
        self.marks
            .get(&(shard, node))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Total number of (node, finding) marks, for scan summaries.
    pub fn len(&self) -> usize {
        self.marks.values().map(FxHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
