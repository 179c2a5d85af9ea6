//! Confirmed finding records.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::findings::FindingCode;
use crate::graph::{NId, Shard};

/// One confirmed finding, immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Vulnerability {
    pub finding: FindingCode,
    /// Report category; line-anchored findings are always `LINES`.
    pub kind: &'static str,
    /// Path of the offending file, relative to the scan root.
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub description: &'static str,
    /// Offending source line, trimmed. Empty when the file could not
    /// be re-read at reporting time.
    pub snippet: String,
    /// Identifier of the detector that produced this record.
    pub source_method: &'static str,
}

impl Vulnerability {
    pub fn at_node(
        finding: FindingCode,
        shard: &Shard,
        sink: NId,
        source_method: &'static str,
        working_dir: &Path,
    ) -> Self {
        let node = shard.graph.node(sink);
        Self {
            finding,
            kind: "LINES",
            path: shard.path.clone(),
            line: node.line,
            column: node.column,
            description: finding.description(),
            snippet: read_snippet(working_dir, &shard.path, node.line),
            source_method,
        }
    }
}

/// Fetch the source line for the report. Reporting never fails the
/// scan: an unreadable file yields an empty snippet.
fn read_snippet(working_dir: &Path, path: &Path, line: usize) -> String {
    let full = working_dir.join(path);
    match std::fs::read_to_string(&full) {
        Ok(source) => source
            .lines()
            .nth(line.saturating_sub(1))
            .map(|l| l.trim().to_owned())
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn snippet_is_trimmed_source_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("a.java")).unwrap();
        writeln!(f, "class A {{").unwrap();
        writeln!(f, "    int x = 1;").unwrap();
        drop(f);

        let snippet = read_snippet(dir.path(), Path::new("a.java"), 2);
        assert_eq!(snippet, "int x = 1;");
    }

    #[test]
    fn missing_file_yields_empty_snippet() {
        let snippet = read_snippet(Path::new("/nonexistent"), Path::new("a.java"), 1);
        assert_eq!(snippet, "");
    }
}
