use gate_shield::*;

fn detect(text: &str, level: DetectionLevel) -> DetectionResult {
    detect_sensitive_info(text, level)
}

fn assert_type(result: &DetectionResult, entity_type: EntityType) {
    assert!(
        result.has_type(entity_type),
        "expected {entity_type}, got {:?}",
        result.findings.iter().map(|f| f.entity_type).collect::<Vec<_>>()
    );
}

#[test]
fn test_name_strict_vs_balanced() {
    let strict = detect("My name is John Doe", DetectionLevel::Strict);
    assert_type(&strict, EntityType::Name);
    assert!(strict.is_sensitive);

    let balanced = detect("My name is John Doe", DetectionLevel::Balanced);
    assert_type(&balanced, EntityType::Name);
    assert!(!balanced.is_sensitive);
}

#[test]
fn test_age() {
    let result = detect("My age is 42", DetectionLevel::Strict);
    assert_type(&result, EntityType::Age);
    assert!(result.is_sensitive);
}

#[test]
fn test_email() {
    let result = detect("Reach me at alice@example.com", DetectionLevel::Balanced);
    assert_type(&result, EntityType::Email);
    assert!(result.is_sensitive);
}

#[test]
fn test_email_with_umlaut_local_part() {
    let result = detect("Schreib an müller@example.de", DetectionLevel::Balanced);
    assert_type(&result, EntityType::Email);
    assert!(result.is_sensitive);
    assert_eq!(result.redacted_text, "Schreib an mü[REDACTED_EMAIL]");
}

#[test]
fn test_phone() {
    let result = detect("My phone number is 415-555-2671", DetectionLevel::Balanced);
    assert_type(&result, EntityType::Phone);
    assert!(result.is_sensitive);
}

#[test]
fn test_ssn() {
    let result = detect("My SSN is 123-45-6789", DetectionLevel::Balanced);
    assert_type(&result, EntityType::Ssn);
    assert!(result.is_sensitive);
    assert!(result.meta.has_critical);
}

#[test]
fn test_address() {
    let result = detect("I live at 123 Main Street", DetectionLevel::Balanced);
    assert_type(&result, EntityType::Address);
    assert!(result.is_sensitive);
}

#[test]
fn test_dob() {
    let result = detect("DOB: 01/31/1990", DetectionLevel::Balanced);
    assert_type(&result, EntityType::Dob);
    assert!(result.is_sensitive);
}

#[test]
fn test_credit_card() {
    let result = detect("Card: 4111 1111 1111 1111", DetectionLevel::Balanced);
    assert_type(&result, EntityType::CreditCard);
    assert!(result.is_sensitive);
}

#[test]
fn test_api_key() {
    let result = detect(
        "Key sk-proj-abcdefghijklmnopqrstuvwxyz0123456789",
        DetectionLevel::Balanced,
    );
    assert_type(&result, EntityType::ApiKey);
    assert!(result.is_sensitive);
}

#[test]
fn test_german_entities() {
    let cases = [
        ("Mein Name ist Max Mustermann", EntityType::Name, DetectionLevel::Strict),
        ("Ich bin 34 Jahre alt", EntityType::Age, DetectionLevel::Strict),
        ("Meine Telefonnummer ist +49 30 12345678", EntityType::Phone, DetectionLevel::Balanced),
        ("Meine Adresse ist Hauptstraße 12", EntityType::Address, DetectionLevel::Balanced),
        ("Geburtsdatum: 31.01.1990", EntityType::Dob, DetectionLevel::Balanced),
        ("Steuer-ID: 12345678901", EntityType::NationalId, DetectionLevel::Balanced),
        ("Meine IBAN ist DE89 3704 0044 0532 0130 00", EntityType::BankAccount, DetectionLevel::Balanced),
    ];
    for (text, entity_type, level) in cases {
        let result = detect(text, level);
        assert_type(&result, entity_type);
        assert!(result.is_sensitive, "{text}");
    }
}

#[test]
fn test_iban_checksum_failure_yields_nothing() {
    let result = detect("Meine IBAN ist DE88 3704 0044 0532 0130 00", DetectionLevel::Balanced);
    assert!(!result.has_type(EntityType::BankAccount));
}

#[test]
fn test_secret_inside_fenced_code() {
    let result = detect(
        "```\nconst key = \"sk-proj-abcdefghijklmnopqrstuvwxyz0123456789\";\n```",
        DetectionLevel::Balanced,
    );
    assert_type(&result, EntityType::ApiKey);
    assert!(result.is_sensitive);
}

#[test]
fn test_weak_signals_ignored_inside_fenced_code() {
    let result = detect("```\nmy age is 42\nmy name is John Doe\n```", DetectionLevel::Strict);
    assert!(!result.has_type(EntityType::Age));
    assert!(!result.has_type(EntityType::Name));
}

#[test]
fn test_duplicate_email_counted_once() {
    let result = detect(
        "alice@example.com mentioned alice@example.com",
        DetectionLevel::Balanced,
    );
    let emails = result
        .findings
        .iter()
        .filter(|f| f.entity_type == EntityType::Email)
        .count();
    assert_eq!(emails, 1);
    assert_eq!(result.meta.total_score, 4);
}

#[test]
fn test_sensitivity_invariant_holds_for_all_levels() {
    let samples = [
        "My name is John Doe",
        "My age is 42 and my name is Jane Roe",
        "call me at 415-555-2671",
        "I live at 123 Main Street",
        "SSN 123-45-6789",
        "nothing to report",
    ];
    for text in samples {
        for level in [DetectionLevel::Strict, DetectionLevel::Balanced, DetectionLevel::Lenient] {
            let result = detect(text, level);
            let total: u32 = result.findings.iter().map(|f| f.score).sum();
            let critical = result.findings.iter().any(|f| f.score >= 5);
            assert_eq!(result.meta.total_score, total);
            assert_eq!(result.meta.has_critical, critical);
            assert_eq!(result.is_sensitive, critical || total >= level.threshold());
        }
    }
}

#[test]
fn test_offsets_point_at_raw_text() {
    let text = "Hi, I'm Jürgen Groß. Mail juergen@example.de or call 415-555-2671.";
    let result = detect(text, DetectionLevel::Strict);
    assert!(!result.findings.is_empty());
    for f in &result.findings {
        assert!(f.start_offset < f.end_offset && f.end_offset <= text.len());
        assert_eq!(&text[f.start_offset..f.end_offset], f.raw_matched_text);
    }
}

#[test]
fn test_redaction_idempotent() {
    let text = "Mail alice@example.com, SSN 123-45-6789";
    let result = detect(text, DetectionLevel::Balanced);
    let again = redact_text(&result.redacted_text, &result.findings);
    assert_eq!(again, result.redacted_text);
    assert!(!result.redacted_text.contains("alice@example.com"));
}
