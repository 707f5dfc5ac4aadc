pub mod catalog;
pub mod code_regions;
pub mod detector;
pub mod entity;
pub mod redact;
pub mod scoring;
pub mod validate;

// Re-export core types at crate root for convenience.
pub use code_regions::CodeRegions;
pub use detector::detect_sensitive_info;
pub use entity::{DetectionLevel, DetectionMeta, DetectionResult, EntityType, Finding};
pub use redact::redact_text;
pub use scoring::{Verdict, score_findings, unique_findings};
