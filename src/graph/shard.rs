//! File shards and the read-only database handed to detectors.
//!
//! One shard is built per parsed file: the node arena, the syntax
//! step layer, and CFG edges, all constructed off to the side and
//! published into the [`GraphDb`] only once complete. Readers never
//! observe a partially built shard.

use std::path::PathBuf;

use crate::graph::Graph;
use crate::syntax::SyntaxGraph;

/// Stable index of a shard inside its [`GraphDb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardId(pub u32);

impl ShardId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fully built analysis state for a single source file.
#[derive(Debug)]
pub struct Shard {
    pub id: ShardId,
    /// Path relative to the scan root, used in findings.
    pub path: PathBuf,
    /// Canonical language name from the registry.
    pub language: &'static str,
    pub graph: Graph,
    pub syntax: SyntaxGraph,
}

impl Shard {
    pub fn new(path: PathBuf, language: &'static str, graph: Graph, syntax: SyntaxGraph) -> Self {
        Self {
            // Assigned when the shard is published.
            id: ShardId(0),
            path,
            language,
            graph,
            syntax,
        }
    }
}

/// Immutable collection of shards for one scan.
#[derive(Debug, Default)]
pub struct GraphDb {
    shards: Vec<Shard>,
}

impl GraphDb {
    /// Seal a batch of built shards. Shards are ordered by path so
    /// downstream iteration is deterministic regardless of build
    /// parallelism.
    pub fn from_shards(mut shards: Vec<Shard>) -> Self {
        shards.sort_by(|a, b| a.path.cmp(&b.path));
        for (i, shard) in shards.iter_mut().enumerate() {
            shard.id = ShardId(i as u32);
        }
        Self { shards }
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    pub fn shard(&self, id: ShardId) -> &Shard {
        &self.shards[id.index()]
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Shards for one language, in path order.
    pub fn shards_for(&self, language: &str) -> impl Iterator<Item = &Shard> {
        let language = language.to_owned();
        self.shards.iter().filter(move |s| s.language == language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_shard(path: &str) -> Shard {
        Shard::new(
            PathBuf::from(path),
            "java",
            Graph::default(),
            SyntaxGraph::default(),
        )
    }

    #[test]
    fn shards_sorted_and_reindexed_on_publish() {
        let db = GraphDb::from_shards(vec![
            empty_shard("b/Second.java"),
            empty_shard("a/First.java"),
        ]);
        assert_eq!(db.shard(ShardId(0)).path, PathBuf::from("a/First.java"));
        assert_eq!(db.shard(ShardId(1)).path, PathBuf::from("b/Second.java"));
        assert_eq!(db.shards()[1].id, ShardId(1));
    }

    #[test]
    fn shards_for_filters_by_language() {
        let mut go = empty_shard("main.go");
        go.language = "go";
        let db = GraphDb::from_shards(vec![empty_shard("App.java"), go]);
        assert_eq!(db.shards_for("go").count(), 1);
        assert_eq!(db.shards_for("csharp").count(), 0);
    }
}
