//! Scan configuration and explicit scan context.
//!
//! All scan-scoped state lives in [`ScanConfig`] and [`ScanContext`] structs
//! passed by reference into the pipeline. There is deliberately no
//! process-wide configuration singleton: the context is constructed once at
//! scan start and never mutated concurrently.

use std::path::PathBuf;
use std::time::Duration;

use rustc_hash::FxHashSet;

use crate::findings::FindingCode;

/// Bounds on the symbolic evaluator's backward-path enumeration.
///
/// Paths never repeat a node; these limits additionally cap how deep and how
/// wide the enumeration may go so evaluation terminates quickly even on
/// pathological control flow.
#[derive(Debug, Clone, Copy)]
pub struct EvalLimits {
    /// Maximum number of CFG nodes in a single backward path.
    pub max_depth: usize,
    /// Maximum number of distinct backward paths enumerated per sink.
    pub max_paths: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_paths: 64,
        }
    }
}

/// Configuration for a single scan invocation.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Finding codes to run. `None` runs every registered finding.
    pub checks: Option<FxHashSet<FindingCode>>,
    /// Restrict the scan to a single language (by registry name).
    pub language: Option<String>,
    /// Maximum file size in bytes; larger files are skipped.
    pub max_file_size: u64,
    /// Maximum number of files to scan (0 = unlimited).
    pub max_files: usize,
    /// Symbolic evaluator bounds.
    pub eval_limits: EvalLimits,
    /// Soft deadline for the detector phase. Detectors not yet started when
    /// the deadline passes are skipped; results already collected are kept.
    pub timeout: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            checks: None,
            language: None,
            max_file_size: 2 * 1024 * 1024,
            max_files: 0,
            eval_limits: EvalLimits::default(),
            timeout: None,
        }
    }
}

impl ScanConfig {
    /// Whether a finding is enabled under this configuration.
    #[inline]
    pub fn check_enabled(&self, code: FindingCode) -> bool {
        match &self.checks {
            Some(set) => set.contains(&code),
            None => true,
        }
    }

    /// Restrict the scan to the given finding codes.
    pub fn with_checks(mut self, codes: impl IntoIterator<Item = FindingCode>) -> Self {
        self.checks = Some(codes.into_iter().collect());
        self
    }
}

/// Scan-scoped context handed to detectors and the vulnerability formatter.
///
/// Owns the working directory used to resolve relative paths for snippet
/// rendering. Read-only for the lifetime of the scan.
#[derive(Debug, Clone)]
pub struct ScanContext {
    /// Root directory of the scan.
    pub working_dir: PathBuf,
    /// Scan configuration.
    pub config: ScanConfig,
}

impl ScanContext {
    pub fn new(working_dir: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            working_dir: working_dir.into(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_all_checks() {
        let config = ScanConfig::default();
        assert!(config.check_enabled(FindingCode::SqlInjection));
        assert!(config.check_enabled(FindingCode::InsecureCookie));
    }

    #[test]
    fn with_checks_filters() {
        let config = ScanConfig::default().with_checks([FindingCode::SqlInjection]);
        assert!(config.check_enabled(FindingCode::SqlInjection));
        assert!(!config.check_enabled(FindingCode::OpenRedirect));
    }
}
