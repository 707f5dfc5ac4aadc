use gate_shield::{DetectionResult, Finding};
use tokio::sync::oneshot;

/// Most findings listed before the summary collapses to `+N more`.
pub const SUMMARY_LIMIT: usize = 6;

/// The single answer a decision surface gives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    SendAnyway,
    /// Redact the selected findings and keep editing.
    Redact(Vec<Finding>),
    TrustSite,
    Cancel,
}

/// Resolves a presentation. Every method consumes the responder, so at most
/// one outcome is delivered; dropping it counts as `Cancel`.
#[derive(Debug)]
pub struct DecisionResponder {
    tx: oneshot::Sender<DecisionOutcome>,
}

impl DecisionResponder {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<DecisionOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn respond(self, outcome: DecisionOutcome) {
        // The gate may have given up waiting.
        let _ = self.tx.send(outcome);
    }

    pub fn send_anyway(self) {
        self.respond(DecisionOutcome::SendAnyway);
    }

    pub fn redact(self, selected: Vec<Finding>) {
        self.respond(DecisionOutcome::Redact(selected));
    }

    pub fn trust_site(self) {
        self.respond(DecisionOutcome::TrustSite);
    }

    pub fn cancel(self) {
        self.respond(DecisionOutcome::Cancel);
    }
}

/// What the surface is asked to present.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub result: DetectionResult,
    /// False when no resume action exists; the surface should then omit
    /// the "send anyway" choice.
    pub can_send_anyway: bool,
}

/// External UI that renders guard decisions.
pub trait DecisionSurface {
    /// Synchronous accept/decline prompt used in warn mode.
    fn confirm(&mut self, message: &str) -> bool;

    /// Shows the blocking surface. Must not block; the answer arrives later
    /// through `responder`.
    fn present(&mut self, request: DecisionRequest, responder: DecisionResponder);
}

/// `Label: value` per finding, one per line, capped at [`SUMMARY_LIMIT`].
pub fn summarize_findings(findings: &[Finding]) -> String {
    let mut items: Vec<String> = findings
        .iter()
        .take(SUMMARY_LIMIT)
        .map(|f| format!("{}: {}", f.label, f.normalized_value))
        .collect();
    if findings.len() > SUMMARY_LIMIT {
        items.push(format!("+{} more", findings.len() - SUMMARY_LIMIT));
    }
    items.join("\n")
}

/// Warn-mode confirmation text.
pub fn confirmation_message(result: &DetectionResult) -> String {
    format!(
        "Potential private information was detected:\n\n{}\n\nScore {} (threshold {}).\n\nSend anyway?",
        summarize_findings(&result.findings),
        result.meta.total_score,
        result.meta.threshold,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_shield::{DetectionLevel, detect_sensitive_info};

    #[test]
    fn summary_caps_at_six() {
        let text = "a1@example.com a2@example.com a3@example.com a4@example.com \
                    a5@example.com a6@example.com a7@example.com a8@example.com";
        let result = detect_sensitive_info(text, DetectionLevel::Balanced);
        assert_eq!(result.findings.len(), 8);
        let summary = summarize_findings(&result.findings);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "Email: a1@example.com");
        assert_eq!(lines[6], "+2 more");
    }

    #[test]
    fn confirmation_text() {
        let result = detect_sensitive_info("My SSN is 123-45-6789", DetectionLevel::Balanced);
        let message = confirmation_message(&result);
        assert!(message.starts_with("Potential private information was detected:\n\n"));
        assert!(message.contains("Score 5 (threshold 3)."));
        assert!(message.ends_with("Send anyway?"));
    }

    #[tokio::test]
    async fn responder_delivers_once() {
        let (responder, rx) = DecisionResponder::channel();
        responder.trust_site();
        assert_eq!(rx.await.unwrap(), DecisionOutcome::TrustSite);
    }

    #[tokio::test]
    async fn dropped_responder_closes_channel() {
        let (responder, rx) = DecisionResponder::channel();
        drop(responder);
        assert!(rx.await.is_err());
    }
}
