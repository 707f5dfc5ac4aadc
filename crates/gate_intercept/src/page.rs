use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{Document, Scope, hostname};
use crate::locator::ElementLocator;

/// Hosts of known AI-chat providers, matched exactly or as a parent domain.
pub const KNOWN_PROVIDER_HOSTS: &[&str] = &[
    "chat.openai.com",
    "chatgpt.com",
    "claude.ai",
    "gemini.google.com",
    "copilot.microsoft.com",
    "perplexity.ai",
    "poe.com",
    "you.com",
    "character.ai",
    "meta.ai",
    "chat.mistral.ai",
    "grok.com",
];

static GROK_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/i/grok\b").expect("valid regex: GROK_PATH"));

static ASSISTANT_TITLE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(chatgpt|claude|gemini|copilot|perplexity|grok|assistant|ai chat|llm)\b")
        .expect("valid regex: ASSISTANT_TITLE_HINT")
});

/// A host whose chat surface lives under a specific path.
pub struct PathRule {
    pub host: &'static str,
    pub path: &'static Lazy<Regex>,
}

pub static PATH_RULES: &[PathRule] = &[
    PathRule {
        host: "x.com",
        path: &GROK_PATH,
    },
    PathRule {
        host: "www.x.com",
        path: &GROK_PATH,
    },
];

pub fn is_known_provider_host(host: &str) -> bool {
    let host = gate_core::normalize_host(host);
    KNOWN_PROVIDER_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{known}")))
}

pub fn is_known_provider_path(host: &str, path: &str) -> bool {
    let host = gate_core::normalize_host(host);
    PATH_RULES
        .iter()
        .any(|rule| rule.host == host && rule.path.is_match(path))
}

/// Decides whether a page is an AI-chat surface worth guarding.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageClassifier {
    locator: ElementLocator,
}

impl PageClassifier {
    pub fn new(locator: ElementLocator) -> Self {
        Self { locator }
    }

    /// Known hosts and path rules always qualify. Otherwise the page needs a
    /// locatable prompt input and an assistant-like title or first heading.
    pub fn is_ai_chat_surface(&self, doc: &dyn Document) -> bool {
        let host = hostname(doc);
        if is_known_provider_host(&host) || is_known_provider_path(&host, doc.location().path()) {
            return true;
        }

        let has_prompt_input = self
            .locator
            .find_prompt_input(doc, Scope::Document, doc.active_element())
            .is_some();
        if !has_prompt_input {
            return false;
        }

        let header = [Some(doc.title()), doc.first_heading_text()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        ASSISTANT_TITLE_HINT.is_match(&header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_hosts_and_subdomains() {
        assert!(is_known_provider_host("claude.ai"));
        assert!(is_known_provider_host("www.perplexity.ai"));
        assert!(is_known_provider_host("  ChatGPT.com "));
        assert!(!is_known_provider_host("notclaude.ai"));
        assert!(!is_known_provider_host("example.com"));
    }

    #[test]
    fn grok_path_rule() {
        assert!(is_known_provider_path("x.com", "/i/grok"));
        assert!(is_known_provider_path("www.x.com", "/i/grok?conversation=1"));
        assert!(is_known_provider_path("x.com", "/I/Grok/share"));
        assert!(!is_known_provider_path("x.com", "/home"));
        assert!(!is_known_provider_path("x.com", "/i/grokker"));
        assert!(!is_known_provider_path("mobile.x.com", "/i/grok"));
    }

    #[test]
    fn title_hint() {
        assert!(ASSISTANT_TITLE_HINT.is_match("acme ai chat"));
        assert!(ASSISTANT_TITLE_HINT.is_match("internal llm portal"));
        assert!(!ASSISTANT_TITLE_HINT.is_match("contact us"));
    }
}
