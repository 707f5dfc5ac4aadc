use tracing::debug;

use crate::catalog::CATALOG;
use crate::code_regions::CodeRegions;
use crate::entity::{DetectionLevel, DetectionResult};
use crate::redact::redact_text;
use crate::scoring::{score_findings, unique_findings};

/// Classify `text` into sensitive-entity findings and decide whether it is
/// sensitive at `level`.
///
/// Pure and synchronous. Whitespace-only input yields a vacuous result.
pub fn detect_sensitive_info(text: &str, level: DetectionLevel) -> DetectionResult {
    if text.trim().is_empty() {
        return DetectionResult::vacuous(text);
    }

    let regions = CodeRegions::scan(text);
    let findings = CATALOG
        .iter()
        .flat_map(|rule| rule.collect(text, &regions))
        .collect();
    let findings = unique_findings(findings);
    let verdict = score_findings(&findings, level);

    debug!(
        level = %level,
        findings = findings.len(),
        total_score = verdict.total_score,
        has_critical = verdict.has_critical,
        "prompt scanned"
    );

    DetectionResult {
        is_sensitive: verdict.is_sensitive,
        redacted_text: redact_text(text, &findings),
        meta: verdict.meta(level),
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[test]
    fn whitespace_is_vacuous() {
        let result = detect_sensitive_info("   \n\t", DetectionLevel::Strict);
        assert!(!result.is_sensitive);
        assert!(result.findings.is_empty());
        assert_eq!(result.redacted_text, "   \n\t");
        assert_eq!(result.meta.detection_level, DetectionLevel::Balanced);
    }

    #[test]
    fn meta_reflects_level() {
        let result = detect_sensitive_info("My age is 42", DetectionLevel::Strict);
        assert_eq!(result.meta.threshold, 1);
        assert_eq!(result.meta.total_score, 1);
        assert!(result.is_sensitive);
    }

    #[test]
    fn redacted_text_masks_unique_findings() {
        let result = detect_sensitive_info(
            "alice@example.com mentioned alice@example.com",
            DetectionLevel::Balanced,
        );
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.redacted_text, "[REDACTED_EMAIL] mentioned [REDACTED_EMAIL]");
        assert_eq!(result.meta.total_score, 4);
    }

    #[test]
    fn level_name_normalizes() {
        let result = detect_sensitive_info(
            "My name is John Doe",
            DetectionLevel::normalize(Some("nonsense")),
        );
        assert_eq!(result.meta.detection_level, DetectionLevel::Balanced);
        assert!(result.has_type(EntityType::Name));
        assert!(!result.is_sensitive);
    }

    #[test]
    fn clean_text_not_sensitive() {
        let result = detect_sensitive_info(
            "Explain the borrow checker in two sentences.",
            DetectionLevel::Strict,
        );
        assert!(result.findings.is_empty());
        assert!(!result.is_sensitive);
    }
}
