//! Checksum, range and shape validators applied to candidate matches.

use once_cell::sync::Lazy;
use regex::Regex;

/// Role nouns and filler words that never form part of a personal name.
const NAME_STOPWORDS: &[&str] = &[
    "a",
    "an",
    "and",
    "the",
    "or",
    "developer",
    "engineer",
    "student",
    "assistant",
    "manager",
    "founder",
    "intern",
];

/// Characters either side of a phone candidate searched for a context cue.
pub const PHONE_CONTEXT_RADIUS: usize = 24;

static NAME_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}][\p{L}'-]{1,30}$").expect("valid regex: name token"));

static TITLE_CASE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Lu}[\p{Ll}'-]{1,30}$").expect("valid regex: title-case token"));

static PHONE_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(phone|mobile|call|text|contact|tel|telefon|telefonnummer|handy|rufnummer|anrufen)\b",
    )
    .expect("valid regex: phone context")
});

// ---------------------------------------------------------------------------
// Numeric checksums
// ---------------------------------------------------------------------------

/// Luhn mod-10 check over the digits of `number_text` (separators ignored).
/// Only 13 to 16 digit runs qualify as card numbers.
pub fn luhn_check(number_text: &str) -> bool {
    let digits: Vec<u32> = number_text.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=16).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// Strip spaces and dashes, upper-case.
pub fn normalize_german_iban(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// ISO 7064 mod-97 validation of a German IBAN (`DE` + 20 digits).
pub fn is_valid_german_iban(value: &str) -> bool {
    let iban = normalize_german_iban(value);
    let bytes = iban.as_bytes();
    if bytes.len() != 22 || &bytes[..2] != b"DE" || !bytes[2..].iter().all(u8::is_ascii_digit) {
        return false;
    }

    // Move the country code and check digits to the end, then map letters
    // to two-digit numbers (A=10 .. Z=35).
    let rearranged = bytes[4..].iter().chain(&bytes[..4]);
    let mut remainder: u32 = 0;
    for &b in rearranged {
        let chunk = match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'A'..=b'Z' => u32::from(b - b'A') + 10,
            _ => return false,
        };
        remainder = if chunk >= 10 {
            (remainder * 100 + chunk) % 97
        } else {
            (remainder * 10 + chunk) % 97
        };
    }

    remainder == 1
}

/// Keep ASCII digits only.
pub fn normalize_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

// ---------------------------------------------------------------------------
// Name shapes
// ---------------------------------------------------------------------------

fn is_stopword(token: &str) -> bool {
    NAME_STOPWORDS.contains(&token.to_lowercase().as_str())
}

/// One to three letter-based tokens, none of them a role noun.
pub fn looks_like_personal_name(value: &str) -> bool {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 3 {
        return false;
    }
    if tokens.iter().any(|t| is_stopword(t)) {
        return false;
    }
    tokens.iter().all(|t| NAME_TOKEN.is_match(t))
}

/// Two or three title-case tokens, none of them a role noun.
pub fn looks_like_title_case_name(value: &str) -> bool {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() < 2 || tokens.len() > 3 {
        return false;
    }
    if tokens.iter().any(|t| is_stopword(t)) {
        return false;
    }
    tokens.iter().all(|t| TITLE_CASE_TOKEN.is_match(t))
}

/// Drop trailing role words: "John Doe developer" -> "John Doe".
pub fn normalize_name_candidate(value: &str) -> String {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    while let Some(tail) = tokens.last() {
        if !is_stopword(tail) {
            break;
        }
        tokens.pop();
    }
    tokens.join(" ")
}

// ---------------------------------------------------------------------------
// Context windows
// ---------------------------------------------------------------------------

/// Lower-cased slice of `text` extending `radius` characters either side of
/// the byte range `start..end`.
pub fn nearby_text(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].to_lowercase()
}

/// Whether a phone-related keyword appears near the candidate.
pub fn has_phone_context(text: &str, start: usize, end: usize) -> bool {
    let context = nearby_text(text, start, end, PHONE_CONTEXT_RADIUS);
    PHONE_CONTEXT.is_match(&context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luhn_accepts_test_card() {
        assert!(luhn_check("4111 1111 1111 1111"));
        assert!(luhn_check("4111-1111-1111-1111"));
        assert!(luhn_check("378282246310005"));
    }

    #[test]
    fn luhn_rejects_bad_checksum_and_length() {
        assert!(!luhn_check("4111 1111 1111 1112"));
        assert!(!luhn_check("411111111111"));
        assert!(!luhn_check("41111111111111111"));
    }

    #[test]
    fn iban_checksum() {
        assert!(is_valid_german_iban("DE89 3704 0044 0532 0130 00"));
        assert!(is_valid_german_iban("de89-3704-0044-0532-0130-00"));
        assert!(!is_valid_german_iban("DE88 3704 0044 0532 0130 00"));
        assert!(!is_valid_german_iban("GB29 NWBK 6016 1331 9268 19"));
        assert!(!is_valid_german_iban("DE89 3704 0044 0532 0130"));
    }

    #[test]
    fn iban_normalization() {
        assert_eq!(
            normalize_german_iban("de89 3704-0044 0532 0130 00"),
            "DE89370400440532013000"
        );
    }

    #[test]
    fn digits_only() {
        assert_eq!(normalize_digits("12 345-678 901"), "12345678901");
    }

    #[test]
    fn personal_name_shape() {
        assert!(looks_like_personal_name("John Doe"));
        assert!(looks_like_personal_name("müller"));
        assert!(!looks_like_personal_name("a test"));
        assert!(!looks_like_personal_name("John the Developer"));
        assert!(!looks_like_personal_name("One Two Three Four"));
        assert!(!looks_like_personal_name("R2D2"));
    }

    #[test]
    fn title_case_shape() {
        assert!(looks_like_title_case_name("Max Mustermann"));
        assert!(looks_like_title_case_name("Jürgen Groß"));
        assert!(!looks_like_title_case_name("max mustermann"));
        assert!(!looks_like_title_case_name("Max"));
        assert!(!looks_like_title_case_name("Senior Engineer"));
    }

    #[test]
    fn trailing_role_words_trimmed() {
        assert_eq!(normalize_name_candidate("John Doe developer"), "John Doe");
        assert_eq!(normalize_name_candidate("Jane Roe the intern"), "Jane Roe");
        assert_eq!(normalize_name_candidate("developer"), "");
    }

    #[test]
    fn nearby_window_is_char_based() {
        let text = "Rufnummer: 030 1234567 bitte";
        let start = text.find("030").unwrap();
        let end = start + "030 1234567".len();
        let window = nearby_text(text, start, end, 3);
        assert_eq!(window, "r: 030 1234567 bi");
    }

    #[test]
    fn nearby_window_respects_multibyte_chars() {
        let text = "ééé 555";
        let start = text.find('5').unwrap();
        let window = nearby_text(text, start, text.len(), 2);
        assert_eq!(window, "é 555");
    }

    #[test]
    fn phone_context_keywords() {
        let text = "call me at 415-555-2671";
        let start = text.find('4').unwrap();
        assert!(has_phone_context(text, start, text.len()));

        let text = "the build id is 415-555-2671";
        let start = text.find('4').unwrap();
        assert!(!has_phone_context(text, start, text.len()));
    }
}
