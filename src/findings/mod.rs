//! Finding query layer: detectors locate candidate sinks, the
//! symbolic evaluator confirms them, and confirmed sinks become
//! [`Vulnerability`] records.

pub mod queries;
pub mod vulnerability;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::ScanContext;
use crate::eval::{self, Evaluation};
use crate::graph::{GraphDb, Shard};
use crate::taint::TaintOverlay;

pub use queries::{detectors, Detector};
pub use vulnerability::Vulnerability;

/// Identifiers of the supported security findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCode {
    SqlInjection,
    XPathInjection,
    OpenRedirect,
    InsecureCrypto,
    InsecureCookie,
}

impl FindingCode {
    pub const ALL: [FindingCode; 5] = [
        FindingCode::SqlInjection,
        FindingCode::XPathInjection,
        FindingCode::OpenRedirect,
        FindingCode::InsecureCrypto,
        FindingCode::InsecureCookie,
    ];

    /// Stable short code used in reports.
    pub fn code(self) -> &'static str {
        match self {
            FindingCode::SqlInjection => "F001",
            FindingCode::XPathInjection => "F021",
            FindingCode::OpenRedirect => "F100",
            FindingCode::InsecureCrypto => "F052",
            FindingCode::InsecureCookie => "F042",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FindingCode::SqlInjection => {
                "SQL statement built from user-controlled input reaches an execution sink"
            }
            FindingCode::XPathInjection => {
                "XPath query built from user-controlled input reaches an evaluation sink"
            }
            FindingCode::OpenRedirect => {
                "redirect target is taken from user-controlled input"
            }
            FindingCode::InsecureCrypto => "use of a broken or weak cryptographic algorithm",
            FindingCode::InsecureCookie => "cookie is created without secure attributes",
        }
    }

    /// Findings whose parameters get seeded as tainted input.
    pub fn is_injection(self) -> bool {
        matches!(
            self,
            FindingCode::SqlInjection | FindingCode::XPathInjection | FindingCode::OpenRedirect
        )
    }

    pub fn from_code(code: &str) -> Option<FindingCode> {
        FindingCode::ALL.iter().copied().find(|f| f.code() == code)
    }
}

impl std::fmt::Display for FindingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Run every enabled detector over every shard of its language.
///
/// Detector/shard pairs fan out across the rayon pool. A panicking
/// detector is logged and skipped; the rest of the scan continues.
/// When the configured timeout has already elapsed, remaining pairs
/// are skipped with a warning.
pub fn run_detectors(
    db: &GraphDb,
    overlay: &TaintOverlay,
    ctx: &ScanContext,
    started: Instant,
) -> Vec<Vulnerability> {
    let jobs: Vec<(&Detector, &Shard)> = detectors()
        .iter()
        .filter(|d| ctx.config.check_enabled(d.code))
        .flat_map(|d| {
            db.shards()
                .iter()
                .filter(|s| d.languages.contains(&s.language))
                .map(move |s| (d, s))
        })
        .collect();

    let mut results: Vec<Vulnerability> = jobs
        .par_iter()
        .flat_map_iter(|&(detector, shard)| {
            if let Some(timeout) = ctx.config.timeout {
                if started.elapsed() >= timeout {
                    warn!(
                        finding = %detector.code,
                        path = %shard.path.display(),
                        "scan deadline reached, skipping detector"
                    );
                    return Vec::new();
                }
            }
            match catch_unwind(AssertUnwindSafe(|| {
                run_one(detector, shard, overlay, ctx)
            })) {
                Ok(vulns) => vulns,
                Err(_) => {
                    error!(
                        finding = %detector.code,
                        path = %shard.path.display(),
                        "detector panicked, skipping"
                    );
                    Vec::new()
                }
            }
        })
        .collect();

    results.sort_by(|a, b| {
        (&a.path, a.line, a.column, a.finding).cmp(&(&b.path, b.line, b.column, b.finding))
    });
    results
}

fn run_one(
    detector: &Detector,
    shard: &Shard,
    overlay: &TaintOverlay,
    ctx: &ScanContext,
) -> Vec<Vulnerability> {
    let sinks = (detector.find)(shard);
    if sinks.is_empty() {
        return Vec::new();
    }
    debug!(
        finding = %detector.code,
        path = %shard.path.display(),
        candidates = sinks.len(),
        "evaluating candidate sinks"
    );

    let mut out = Vec::new();
    for sink in sinks {
        let evaluation = eval::evaluate(
            shard,
            overlay,
            detector.code,
            sink,
            &ctx.config.eval_limits,
        );
        if confirmed(detector.code, &evaluation) {
            out.push(Vulnerability::at_node(
                detector.code,
                shard,
                sink,
                detector.source_method,
                &ctx.working_dir,
            ));
        }
    }
    out
}

/// A candidate sink becomes a finding when its evaluation is
/// dangerous. Cookie creation is reported only when the trigger set is
/// exactly the insecure-cookie trigger; any additional trigger means a
/// mitigation was seen on the path.
fn confirmed(code: FindingCode, evaluation: &Evaluation) -> bool {
    match code {
        FindingCode::InsecureCookie => {
            evaluation.triggers.len() == 1
                && evaluation.triggers.contains(eval::rules::TRIGGER_INSECURE_COOKIE)
        }
        _ => evaluation.danger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for f in FindingCode::ALL {
            assert_eq!(FindingCode::from_code(f.code()), Some(f));
        }
        assert_eq!(FindingCode::from_code("F999"), None);
    }

    #[test]
    fn injection_findings_are_seeded() {
        assert!(FindingCode::SqlInjection.is_injection());
        assert!(FindingCode::OpenRedirect.is_injection());
        assert!(!FindingCode::InsecureCrypto.is_injection());
    }
}
