use once_cell::sync::Lazy;
use regex::{Captures, Match, Regex};
use tracing::warn;

use crate::code_regions::CodeRegions;
use crate::entity::{EntityType, Finding};
use crate::validate::{
    has_phone_context, is_valid_german_iban, looks_like_personal_name, looks_like_title_case_name,
    luhn_check, normalize_digits, normalize_german_iban, normalize_name_candidate,
};

// ---------------------------------------------------------------------------
// Rule definition
// ---------------------------------------------------------------------------

type Normalizer = fn(&str) -> String;
type ContextFilter = fn(&Finding, &str) -> bool;

/// One extraction rule of the pattern catalog.
///
/// When the pattern has capture groups, the first non-empty group is the
/// value; otherwise the whole match is.
pub struct EntityRule {
    pub entity: EntityType,
    /// Short identifier used in logs.
    pub name: &'static str,
    regex: Option<Regex>,
    /// Scan inside fenced/inline code too.
    pub scan_in_code: bool,
    normalize: Option<Normalizer>,
    filter: Option<ContextFilter>,
}

impl EntityRule {
    fn new(entity: EntityType, name: &'static str, pattern: &str) -> Self {
        Self {
            entity,
            name,
            regex: compile(name, pattern),
            scan_in_code: false,
            normalize: None,
            filter: None,
        }
    }

    fn always_scan(mut self) -> Self {
        self.scan_in_code = true;
        self
    }

    fn normalize(mut self, f: Normalizer) -> Self {
        self.normalize = Some(f);
        self
    }

    fn filter(mut self, f: ContextFilter) -> Self {
        self.filter = Some(f);
        self
    }

    /// Whether the pattern compiled. Disabled rules produce no findings.
    pub fn is_enabled(&self) -> bool {
        self.regex.is_some()
    }

    /// Run this rule over `text`, skipping matches that start inside a code
    /// region unless the rule scans code.
    pub fn collect(&self, text: &str, regions: &CodeRegions) -> Vec<Finding> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };

        let mut findings = Vec::new();
        for caps in regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if !self.scan_in_code && regions.contains(whole.start()) {
                continue;
            }

            let source = first_captured_group(&caps).unwrap_or(whole);
            let Some((start, end)) = trimmed_span(&source) else {
                continue;
            };
            let raw = &text[start..end];
            let value = match self.normalize {
                Some(normalize) => normalize(raw),
                None => raw.to_string(),
            };
            if value.is_empty() {
                continue;
            }

            let finding = Finding {
                entity_type: self.entity,
                label: self.entity.label().to_string(),
                normalized_value: value,
                raw_matched_text: raw.to_string(),
                score: self.entity.score(),
                start_offset: start,
                end_offset: end,
            };

            if self.filter.is_none_or(|keep| keep(&finding, text)) {
                findings.push(finding);
            }
        }
        findings
    }
}

fn compile(name: &'static str, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(detector = name, "pattern failed to compile, detector disabled: {e}");
            None
        }
    }
}

fn first_captured_group<'t>(caps: &Captures<'t>) -> Option<Match<'t>> {
    caps.iter()
        .skip(1)
        .flatten()
        .find(|m| !m.as_str().trim().is_empty())
}

/// Byte span of the match with surrounding whitespace removed.
fn trimmed_span(m: &Match<'_>) -> Option<(usize, usize)> {
    let s = m.as_str();
    let lead = s.len() - s.trim_start().len();
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = m.start() + lead;
    Some((start, start + trimmed.len()))
}

// ---------------------------------------------------------------------------
// Contextual filters
// ---------------------------------------------------------------------------

fn north_american_phone(finding: &Finding, text: &str) -> bool {
    let digits = normalize_digits(&finding.raw_matched_text);
    if digits.len() != 10 && digits.len() != 11 {
        return false;
    }
    has_phone_context(text, finding.start_offset, finding.end_offset)
}

fn german_phone(finding: &Finding, text: &str) -> bool {
    let digits = normalize_digits(&finding.raw_matched_text);
    if !(7..=15).contains(&digits.len()) {
        return false;
    }
    let compact: String = finding
        .raw_matched_text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '/' | '(' | ')'))
        .collect();
    if !(compact.starts_with("+49") || compact.starts_with('0')) {
        return false;
    }
    has_phone_context(text, finding.start_offset, finding.end_offset)
}

fn direct_name(finding: &Finding, _text: &str) -> bool {
    looks_like_personal_name(&finding.normalized_value)
}

fn self_intro_name(finding: &Finding, _text: &str) -> bool {
    looks_like_title_case_name(&finding.normalized_value)
}

fn plausible_age(finding: &Finding, _text: &str) -> bool {
    finding
        .normalized_value
        .parse::<u32>()
        .is_ok_and(|age| age > 0 && age < 120)
}

fn luhn_valid(finding: &Finding, _text: &str) -> bool {
    luhn_check(&finding.raw_matched_text)
}

fn eleven_digits(finding: &Finding, _text: &str) -> bool {
    finding.normalized_value.len() == 11
}

fn iban_valid(finding: &Finding, _text: &str) -> bool {
    is_valid_german_iban(&finding.normalized_value)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The ordered rule set. Order determines finding order, which decides the
/// surviving duplicate and the redaction order.
///
/// Rules over ASCII values use ASCII word boundaries (`(?-u:\b)`), so a
/// value glued to a non-ASCII letter still matches. The name rules and the
/// German address rule keep Unicode boundaries.
pub static CATALOG: Lazy<Vec<EntityRule>> = Lazy::new(|| {
    vec![
        EntityRule::new(
            EntityType::Email,
            "email",
            r"(?i)(?-u:\b)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}(?-u:\b)",
        ),
        EntityRule::new(
            EntityType::Phone,
            "phone_na",
            r"(?-u:\b)(?:\+?1[-.\s]?)?(?:\(?\d{3}\)?[-.\s]?)\d{3}[-.\s]?\d{4}(?-u:\b)",
        )
        .filter(north_american_phone),
        EntityRule::new(
            EntityType::Phone,
            "phone_de",
            r"(?:\+49|0)(?:[\s\-./()]?\d){6,14}(?-u:\b)",
        )
        .filter(german_phone),
        EntityRule::new(
            EntityType::Ssn,
            "ssn",
            r"(?-u:\b)\d{3}-\d{2}-\d{4}(?-u:\b)",
        )
        .always_scan(),
        EntityRule::new(
            EntityType::Address,
            "address_en",
            r"(?i)(?-u:\b)\d{1,5}\s+[A-Za-z0-9.\s]{3,}\s(?:Street|St|Road|Rd|Avenue|Ave|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct)\b",
        ),
        EntityRule::new(
            EntityType::Address,
            "address_de",
            r"(?i)\b(?:[\p{L}][\p{L}0-9.-]{1,40}(?:stra(?:ße|sse)|str\.)|[\p{L}][\p{L}0-9.\-\s]{1,40}\s(?:Weg|Platz|Allee|Gasse|Ring|Ufer))\s+\d{1,4}[A-Za-z]?\b",
        ),
        EntityRule::new(
            EntityType::Name,
            "name_direct",
            r"(?i)\b(?:my name is|this is|mein name ist|das ist)\s+([\p{L}][\p{L}'-]{1,30}(?:\s+[\p{L}][\p{L}'-]{1,30}){0,2})\b",
        )
        .normalize(normalize_name_candidate)
        .filter(direct_name),
        EntityRule::new(
            EntityType::Name,
            "name_self_intro",
            r"(?i)\b(?:i am|i'm|ich bin|ich hei(?:ße|sse))\s+([\p{L}][\p{L}'-]{1,30}\s+[\p{L}][\p{L}'-]{1,30}(?:\s+[\p{L}][\p{L}'-]{1,30})?)\b",
        )
        .normalize(normalize_name_candidate)
        .filter(self_intro_name),
        EntityRule::new(
            EntityType::Age,
            "age",
            r"(?i)\b(?:my age is|age\s*[:=]|mein alter ist|alter\s*[:=])\s*(\d{1,3})\b|\b(?:i am|i'm|ich bin)\s*(\d{1,3})\s*(?:years?\s*old|yo|jahre?\s*alt)\b",
        )
        .filter(plausible_age),
        EntityRule::new(
            EntityType::Dob,
            "dob",
            r"(?i)\b(?:dob|date of birth|born on|geburtsdatum|geboren am)\b[^\n\r]{0,24}?\b(\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4})\b",
        ),
        EntityRule::new(
            EntityType::CreditCard,
            "credit_card",
            r"(?-u:\b)(?:\d[ -]*?){13,16}(?-u:\b)",
        )
        .always_scan()
        .filter(luhn_valid),
        EntityRule::new(
            EntityType::NationalId,
            "steuer_id",
            r"(?i)\b(?:steuer(?:-|\s)?id|steueridentifikationsnummer)\b[^\n\r]{0,20}?\b((?:\d[\s-]?){11})\b",
        )
        .always_scan()
        .normalize(normalize_digits)
        .filter(eleven_digits),
        EntityRule::new(
            EntityType::BankAccount,
            "iban_de",
            r"(?i)(?-u:\b)DE(?:\d[\s-]?){20}(?-u:\b)",
        )
        .always_scan()
        .normalize(normalize_german_iban)
        .filter(iban_valid),
        EntityRule::new(
            EntityType::ApiKey,
            "openai_key",
            r"(?-u:\b)sk-(?:proj-)?[A-Za-z0-9_-]{20,}(?-u:\b)",
        )
        .always_scan(),
        EntityRule::new(
            EntityType::ApiKey,
            "anthropic_key",
            r"(?-u:\b)sk-ant-[A-Za-z0-9_-]{20,}(?-u:\b)",
        )
        .always_scan(),
        EntityRule::new(EntityType::ApiKey, "github_pat", r"(?-u:\b)ghp_[A-Za-z0-9]{30,}(?-u:\b)")
            .always_scan(),
        EntityRule::new(EntityType::ApiKey, "google_key", r"(?-u:\b)AIza[0-9A-Za-z_-]{35}(?-u:\b)")
            .always_scan(),
        EntityRule::new(EntityType::ApiKey, "aws_access_key", r"(?-u:\b)AKIA[0-9A-Z]{16}(?-u:\b)")
            .always_scan(),
    ]
});
