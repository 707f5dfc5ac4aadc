use crate::entity::Finding;

/// Replace every literal occurrence of each finding's matched text with its
/// type placeholder, in the order given.
///
/// Replacement is global, so unrelated text that happens to equal a short
/// match is masked too. Each pass runs over the output of the previous one,
/// so a later finding can rewrite text an earlier pass already replaced.
pub fn redact_text(text: &str, findings: &[Finding]) -> String {
    findings.iter().fold(text.to_string(), |output, finding| {
        let source = if finding.raw_matched_text.is_empty() {
            &finding.normalized_value
        } else {
            &finding.raw_matched_text
        };
        if source.is_empty() {
            return output;
        }
        output.replace(source.as_str(), &finding.entity_type.placeholder())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    fn finding(entity_type: EntityType, raw: &str) -> Finding {
        Finding {
            entity_type,
            label: entity_type.label().into(),
            normalized_value: raw.into(),
            raw_matched_text: raw.into(),
            score: entity_type.score(),
            start_offset: 0,
            end_offset: raw.len(),
        }
    }

    #[test]
    fn replaces_all_occurrences() {
        let text = "mail a@b.co or a@b.co";
        let out = redact_text(text, &[finding(EntityType::Email, "a@b.co")]);
        assert_eq!(out, "mail [REDACTED_EMAIL] or [REDACTED_EMAIL]");
    }

    #[test]
    fn metacharacters_are_literal() {
        let text = "card (4111) 1111.1111*1111";
        let out = redact_text(text, &[finding(EntityType::CreditCard, "(4111) 1111.1111*1111")]);
        assert_eq!(out, "card [REDACTED_CREDIT_CARD]");
    }

    #[test]
    fn idempotent_on_redacted_output() {
        let findings = [
            finding(EntityType::Email, "alice@example.com"),
            finding(EntityType::Ssn, "123-45-6789"),
        ];
        let once = redact_text("alice@example.com / 123-45-6789", &findings);
        let twice = redact_text(&once, &findings);
        assert_eq!(once, twice);
    }

    #[test]
    fn short_match_over_redacts() {
        let text = "age 42, room 42";
        let out = redact_text(text, &[finding(EntityType::Age, "42")]);
        assert_eq!(out, "age [REDACTED_AGE], room [REDACTED_AGE]");
    }

    #[test]
    fn empty_selection_is_noop() {
        assert_eq!(redact_text("unchanged", &[]), "unchanged");
    }
}
