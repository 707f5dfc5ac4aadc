use std::collections::HashSet;

use crate::entity::{DetectionLevel, DetectionMeta, Finding};

/// Drop later findings that repeat an earlier `(type, lower-cased value)`.
pub fn unique_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert(f.dedup_key()))
        .collect()
}

/// Aggregate verdict over already-deduplicated findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub total_score: u32,
    pub has_critical: bool,
    pub is_sensitive: bool,
}

/// Sum the scores and compare against the level's threshold. A critical
/// finding is sensitive regardless of the threshold.
pub fn score_findings(findings: &[Finding], level: DetectionLevel) -> Verdict {
    let total_score = findings.iter().map(|f| f.score).sum();
    let has_critical = findings.iter().any(Finding::is_critical);
    Verdict {
        total_score,
        has_critical,
        is_sensitive: has_critical || total_score >= level.threshold(),
    }
}

impl Verdict {
    pub fn meta(&self, level: DetectionLevel) -> DetectionMeta {
        DetectionMeta {
            detection_level: level,
            threshold: level.threshold(),
            total_score: self.total_score,
            has_critical: self.has_critical,
        }
    }
}
