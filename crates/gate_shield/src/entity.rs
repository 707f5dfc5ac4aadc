use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entity types
// ---------------------------------------------------------------------------

/// Categories of sensitive information the detector classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Name,
    Age,
    Phone,
    Email,
    Address,
    Dob,
    Ssn,
    CreditCard,
    ApiKey,
    NationalId,
    BankAccount,
}

/// Findings at or above this severity force a sensitive verdict.
pub const CRITICAL_SCORE: u32 = 5;

impl EntityType {
    pub const ALL: [EntityType; 11] = [
        Self::Name,
        Self::Age,
        Self::Phone,
        Self::Email,
        Self::Address,
        Self::Dob,
        Self::Ssn,
        Self::CreditCard,
        Self::ApiKey,
        Self::NationalId,
        Self::BankAccount,
    ];

    /// Fixed severity weight of one finding of this type.
    pub fn score(self) -> u32 {
        match self {
            Self::Name | Self::Age => 1,
            Self::Phone => 3,
            Self::Email | Self::Address | Self::Dob => 4,
            Self::Ssn | Self::CreditCard | Self::ApiKey | Self::NationalId | Self::BankAccount => {
                CRITICAL_SCORE
            }
        }
    }

    pub fn is_critical(self) -> bool {
        self.score() >= CRITICAL_SCORE
    }

    /// Human-readable label shown next to a finding.
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Age => "Age",
            Self::Phone => "Phone Number",
            Self::Email => "Email",
            Self::Address => "Street Address",
            Self::Dob => "Date of Birth",
            Self::Ssn => "SSN",
            Self::CreditCard => "Credit Card",
            Self::ApiKey => "API Key",
            Self::NationalId => "National ID",
            Self::BankAccount => "Bank Account",
        }
    }

    /// Lower snake-case identifier (`credit_card`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Address => "address",
            Self::Dob => "dob",
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::ApiKey => "api_key",
            Self::NationalId => "national_id",
            Self::BankAccount => "bank_account",
        }
    }

    /// Placeholder written over a redacted span, e.g. `[REDACTED_CREDIT_CARD]`.
    pub fn placeholder(self) -> String {
        format!("[REDACTED_{self}]")
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

// ---------------------------------------------------------------------------
// Detection level
// ---------------------------------------------------------------------------

/// Named sensitivity profile controlling the aggregate-score threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionLevel {
    Strict,
    #[default]
    Balanced,
    Lenient,
}

impl DetectionLevel {
    /// Aggregate score at which soft findings become sensitive.
    pub fn threshold(self) -> u32 {
        match self {
            Self::Strict => 1,
            Self::Balanced => 3,
            Self::Lenient => 4,
        }
    }

    /// Parse a level name. Anything other than `strict` or `lenient`
    /// (including missing values) is `Balanced`.
    pub fn normalize(value: Option<&str>) -> Self {
        match value {
            Some("strict") => Self::Strict,
            Some("lenient") => Self::Lenient,
            _ => Self::Balanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Lenient => "lenient",
        }
    }
}

impl From<&str> for DetectionLevel {
    fn from(value: &str) -> Self {
        Self::normalize(Some(value))
    }
}

impl std::fmt::Display for DetectionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Findings and results
// ---------------------------------------------------------------------------

/// One classified sensitive-entity match.
///
/// `start_offset..end_offset` is the byte range of `raw_matched_text` in the
/// analysed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub label: String,
    pub normalized_value: String,
    pub raw_matched_text: String,
    pub score: u32,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Finding {
    /// Key under which repeated mentions collapse into one finding.
    pub fn dedup_key(&self) -> (EntityType, String) {
        (self.entity_type, self.normalized_value.to_lowercase())
    }

    pub fn is_critical(&self) -> bool {
        self.score >= CRITICAL_SCORE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionMeta {
    pub detection_level: DetectionLevel,
    pub threshold: u32,
    pub total_score: u32,
    pub has_critical: bool,
}

/// Outcome of running the detector over one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_sensitive: bool,
    pub findings: Vec<Finding>,
    pub redacted_text: String,
    pub meta: DetectionMeta,
}

impl DetectionResult {
    /// A non-sensitive result with no findings.
    pub fn vacuous(text: &str) -> Self {
        let level = DetectionLevel::Balanced;
        Self {
            is_sensitive: false,
            findings: Vec::new(),
            redacted_text: text.to_string(),
            meta: DetectionMeta {
                detection_level: level,
                threshold: level.threshold(),
                total_score: 0,
                has_critical: false,
            },
        }
    }

    pub fn has_type(&self, entity_type: EntityType) -> bool {
        self.findings.iter().any(|f| f.entity_type == entity_type)
    }
}
