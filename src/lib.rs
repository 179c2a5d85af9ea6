//! sastre: multi-language static taint analysis.
//!
//! The pipeline parses source files into a unified graph model, layers a
//! language-independent syntax-step representation and a control-flow graph
//! on top, seeds framework input parameters as tainted, and runs per-finding
//! detectors whose candidate sinks are confirmed by a bounded symbolic
//! evaluator.
//!
//! ```no_run
//! use sastre::{scan, ScanConfig};
//!
//! let report = scan(std::path::Path::new("./src"), ScanConfig::default()).unwrap();
//! for vuln in &report.vulnerabilities {
//!     println!("{} {}:{}", vuln.finding, vuln.path.display(), vuln.line);
//! }
//! ```

pub mod cfg;
pub mod config;
pub mod error;
pub mod eval;
pub mod findings;
pub mod graph;
pub mod lang;
pub mod parse;
pub mod syntax;
pub mod taint;

use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use config::{EvalLimits, ScanConfig, ScanContext};
pub use error::{Result, ScanError};
pub use findings::{FindingCode, Vulnerability};

use graph::{GraphDb, Shard};
use lang::LanguageRegistry;
use taint::TaintOverlay;

/// Directories never worth scanning.
const DEFAULT_SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "dist",
    "build",
    "coverage",
    "vendor",
    "target",
    "bin",
    "obj",
];

/// Result of one scan invocation.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub vulnerabilities: Vec<Vulnerability>,
    /// Files successfully parsed and analyzed.
    pub files_scanned: usize,
    /// Candidate files that failed to read or parse.
    pub files_skipped: usize,
    pub duration_ms: u128,
}

/// Scan a directory tree and report confirmed findings.
///
/// Fails only on fatal conditions (unreadable root, nothing parseable);
/// per-file problems are logged and skipped.
pub fn scan(root: &Path, config: ScanConfig) -> Result<ScanReport> {
    let started = Instant::now();
    let root = root
        .canonicalize()
        .map_err(|e| ScanError::io_with_path(e, root))?;
    if let Some(lang) = &config.language {
        if LanguageRegistry::global().by_name(lang).is_none() {
            return Err(ScanError::UnsupportedLanguage(lang.clone()));
        }
    }
    let ctx = ScanContext::new(root.clone(), config);

    let files = collect_files(&root, &ctx.config);
    info!(root = %root.display(), candidates = files.len(), "scan started");

    // Shards are built off to the side in parallel and published into
    // the database only once complete.
    let shards: Vec<Shard> = files
        .par_iter()
        .filter_map(|path| match build_shard(&root, path) {
            Ok(shard) => Some(shard),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file");
                None
            }
        })
        .collect();

    if shards.is_empty() {
        return Err(ScanError::NothingToScan { root });
    }
    let files_scanned = shards.len();
    let files_skipped = files.len() - files_scanned;

    let db = GraphDb::from_shards(shards);
    let mut overlay = TaintOverlay::new();
    taint::seed(&db, &mut overlay);
    debug!(shards = db.len(), taint_marks = overlay.len(), "graph database built");

    let vulnerabilities = findings::run_detectors(&db, &overlay, &ctx, started);
    info!(
        findings = vulnerabilities.len(),
        files = files_scanned,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan finished"
    );

    Ok(ScanReport {
        vulnerabilities,
        files_scanned,
        files_skipped,
        duration_ms: started.elapsed().as_millis(),
    })
}

/// Candidate source files under the root, in sorted order.
fn collect_files(root: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    let registry = LanguageRegistry::global();
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_some_and(|t| t.is_dir())
                && DEFAULT_SKIP_DIRS.contains(&name.as_ref()))
        })
        .build()
        .filter_map(|entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "walk error");
                    return None;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                return None;
            }
            let path = entry.path();
            let lang = registry.detect(path)?;
            if let Some(wanted) = &config.language {
                if lang.name() != wanted {
                    return None;
                }
            }
            if let Ok(meta) = entry.metadata() {
                if meta.len() > config.max_file_size {
                    debug!(path = %path.display(), size = meta.len(), "file too large, skipping");
                    return None;
                }
            }
            Some(path.to_path_buf())
        })
        .collect();

    files.sort();
    if config.max_files > 0 && files.len() > config.max_files {
        files.truncate(config.max_files);
    }
    files
}

/// Parse one file and build its full shard: graph, syntax steps, CFG.
fn build_shard(root: &Path, path: &Path) -> Result<Shard> {
    let lang = LanguageRegistry::global()
        .detect(path)
        .ok_or_else(|| ScanError::UnsupportedLanguage(path.display().to_string()))?;
    let source =
        std::fs::read_to_string(path).map_err(|e| ScanError::io_with_path(e, path))?;

    let mut graph = parse::parse_source(lang, &source, path)?;
    cfg::build(&mut graph, lang);
    let steps = syntax::build(&graph);

    let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    debug!(
        path = %rel.display(),
        nodes = graph.len(),
        steps = steps.len(),
        cfg_edges = graph.cfg_edges().len(),
        "shard built"
    );
    Ok(Shard::new(rel, lang.name(), graph, steps))
}
