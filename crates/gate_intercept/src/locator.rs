use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::dom::{Document, ElementDescriptor, ElementTag, NodeId, PromptField, Scope};

// ---------------------------------------------------------------------------
// Keyword sets
// ---------------------------------------------------------------------------

pub static PROMPT_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(prompt|message|chat|ask|question|assistant|composer)\b")
        .expect("valid regex: PROMPT_HINT")
});

static SEND_CONTROL_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(send|submit|ask|message|prompt|chat|up-arrow)\b")
        .expect("valid regex: SEND_CONTROL_HINT")
});

static SEND_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsend\b").expect("valid regex: SEND_WORD"));

const VALUE_SCORE_CAP: usize = 300;
const EVENT_TARGET_BONUS: u32 = 120;
const ACTIVE_ELEMENT_BONUS: u32 = 80;
const PROMPT_HINT_BONUS: u32 = 40;
const IN_FORM_BONUS: u32 = 15;
const EDITABLE_BONUS: u32 = 10;
const SEND_WORD_BONUS: u32 = 50;
const SAME_FORM_BONUS: u32 = 30;

// ---------------------------------------------------------------------------
// Pure scoring over descriptors
// ---------------------------------------------------------------------------

/// Visible text area, prompt-hinted text/search input, or editable region
/// that is hinted or declares a textbox role / multi-line aria attribute.
pub fn is_prompt_input_candidate(desc: &ElementDescriptor) -> bool {
    if !desc.render.is_visible() {
        return false;
    }
    match desc.tag {
        ElementTag::TextArea => true,
        ElementTag::Input => {
            matches!(desc.input_type().as_str(), "text" | "search")
                && PROMPT_HINT.is_match(&desc.hints.joined())
        }
        _ if desc.content_editable => {
            PROMPT_HINT.is_match(&desc.hints.joined())
                || desc.role_is("textbox")
                || desc.aria_multiline
        }
        _ => false,
    }
}

/// Who is asking: the element the event fired on and the focused element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateContext {
    pub event_target: Option<NodeId>,
    pub active_element: Option<NodeId>,
}

pub fn score_prompt_candidate(desc: &ElementDescriptor, ctx: &CandidateContext) -> u32 {
    let mut score = desc.value.trim().chars().count().min(VALUE_SCORE_CAP) as u32;
    if ctx.event_target == Some(desc.node) {
        score += EVENT_TARGET_BONUS;
    }
    if ctx.active_element == Some(desc.node) {
        score += ACTIVE_ELEMENT_BONUS;
    }
    if PROMPT_HINT.is_match(&desc.hints.joined()) {
        score += PROMPT_HINT_BONUS;
    }
    if desc.form.is_some() {
        score += IN_FORM_BONUS;
    }
    if desc.content_editable {
        score += EDITABLE_BONUS;
    }
    score
}

/// Highest-scoring candidate; ties go to the earlier entry in the pool.
pub fn best_prompt_candidate<'a>(
    pool: &'a [ElementDescriptor],
    ctx: &CandidateContext,
) -> Option<&'a ElementDescriptor> {
    highest(
        pool.iter()
            .filter(|d| is_prompt_input_candidate(d))
            .map(|d| (d, score_prompt_candidate(d, ctx))),
    )
}

fn matches_send_shape(desc: &ElementDescriptor) -> bool {
    let is_button = desc.tag == ElementTag::Button;
    let type_attr = desc.type_attr.as_deref().map(str::to_lowercase);
    let aria = desc.hints.aria_label.as_deref().map(str::to_lowercase);
    let aria_has = |word: &str| aria.as_deref().is_some_and(|a| a.contains(word));

    (is_button && type_attr.as_deref() == Some("submit"))
        || (desc.tag == ElementTag::Input && type_attr.as_deref() == Some("submit"))
        || (is_button && desc.hints.test_id.as_deref().is_some_and(|t| t.contains("send")))
        || (is_button && (aria_has("send") || aria_has("submit")))
        || (desc.role_is("button") && aria_has("send"))
        || (is_button
            && desc
                .hints
                .class
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains("send")))
}

/// Visible, enabled control with a known send shape or a send-like hint.
pub fn is_send_control(desc: &ElementDescriptor) -> bool {
    if !desc.render.is_visible() || desc.is_disabled() {
        return false;
    }
    matches_send_shape(desc) || SEND_CONTROL_HINT.is_match(&desc.hints.joined())
}

pub fn score_send_control(desc: &ElementDescriptor, prompt_form: Option<NodeId>) -> u32 {
    let mut score = 0;
    if SEND_WORD.is_match(&desc.hints.joined()) {
        score += SEND_WORD_BONUS;
    }
    if prompt_form.is_some() && desc.form == prompt_form {
        score += SAME_FORM_BONUS;
    }
    score
}

pub fn best_send_control<'a>(
    pool: &'a [ElementDescriptor],
    prompt_form: Option<NodeId>,
) -> Option<&'a ElementDescriptor> {
    highest(
        pool.iter()
            .filter(|d| is_send_control(d))
            .map(|d| (d, score_send_control(d, prompt_form))),
    )
}

fn highest<'a>(
    scored: impl Iterator<Item = (&'a ElementDescriptor, u32)>,
) -> Option<&'a ElementDescriptor> {
    let mut best: Option<(&ElementDescriptor, u32)> = None;
    for (desc, score) in scored {
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((desc, score));
        }
    }
    best.map(|(desc, _)| desc)
}

// ---------------------------------------------------------------------------
// Document-facing locator
// ---------------------------------------------------------------------------

/// Finds the prompt field and its send control in a live document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementLocator;

impl ElementLocator {
    pub fn new() -> Self {
        Self
    }

    /// Pool = event target, focused element, then text-entry elements in
    /// `scope`, without repeats.
    pub fn find_prompt_input(
        &self,
        doc: &dyn Document,
        scope: Scope,
        event_target: Option<NodeId>,
    ) -> Option<PromptField> {
        let ctx = CandidateContext {
            event_target,
            active_element: doc.active_element(),
        };

        let mut ids: Vec<NodeId> = Vec::new();
        for id in [ctx.event_target, ctx.active_element]
            .into_iter()
            .flatten()
            .chain(doc.text_entry_elements(scope))
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let pool: Vec<ElementDescriptor> = ids.into_iter().filter_map(|id| doc.describe(id)).collect();

        let best = best_prompt_candidate(&pool, &ctx)?;
        debug!(node = best.node.0, candidates = pool.len(), "Located prompt input");
        PromptField::from_descriptor(best)
    }

    /// Searches `scope` first, then the whole document.
    pub fn find_prompt_input_or_document(
        &self,
        doc: &dyn Document,
        scope: Scope,
        event_target: Option<NodeId>,
    ) -> Option<PromptField> {
        self.find_prompt_input(doc, scope, event_target).or_else(|| match scope {
            Scope::Document => None,
            Scope::Within(_) => self.find_prompt_input(doc, Scope::Document, event_target),
        })
    }

    /// Best send control near the prompt field.
    pub fn find_send_control(&self, doc: &dyn Document, prompt: Option<&PromptField>) -> Option<NodeId> {
        let scope = Scope::from(prompt.and_then(|p| doc.closest_composer(p.node())));
        let prompt_form = prompt.and_then(|p| p.form(doc));
        let pool: Vec<ElementDescriptor> = doc
            .button_elements(scope)
            .into_iter()
            .filter_map(|id| doc.describe(id))
            .collect();
        best_send_control(&pool, prompt_form).map(|d| d.node)
    }

    /// The editable surface an Enter key landed on: a text area, an input or
    /// an editable region.
    pub fn field_at(&self, doc: &dyn Document, node: NodeId) -> Option<PromptField> {
        doc.describe(node)
            .as_ref()
            .and_then(PromptField::from_descriptor)
    }

    /// Submits the prompt's form, else clicks its best send control.
    /// Returns false when neither exists.
    pub fn trigger_send_for_prompt(&self, doc: &mut dyn Document, prompt: &PromptField) -> bool {
        if let Some(form) = prompt.form(doc) {
            doc.request_submit(form);
            return true;
        }
        match self.find_send_control(doc, Some(prompt)) {
            Some(button) => {
                doc.click(button);
                true
            }
            None => false,
        }
    }
}
