use std::sync::Arc;

use gate_core::{GateError, PolicyMode, Settings, SettingsCache, SettingsPatch, SettingsStore};
use gate_shield::{DetectionResult, detect_sensitive_info, redact_text};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::bypass::{BypassToken, Clock, SystemClock};
use crate::dom::{Document, NodeId, PromptField, Scope, hostname};
use crate::locator::{ElementLocator, is_send_control};
use crate::page::PageClassifier;
use crate::surface::{
    DecisionOutcome, DecisionRequest, DecisionResponder, DecisionSurface, confirmation_message,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A user action captured ahead of the page's own handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardTrigger {
    /// Form submission, with the submitting control if known.
    Submit {
        form: NodeId,
        submitter: Option<NodeId>,
    },
    /// Click on any element; only send controls are guarded.
    Click { target: NodeId },
    KeyDown {
        target: NodeId,
        key: String,
        shift: bool,
        composing: bool,
    },
}

impl GuardTrigger {
    pub fn enter(target: NodeId) -> Self {
        Self::KeyDown {
            target,
            key: "Enter".into(),
            shift: false,
            composing: false,
        }
    }
}

/// Re-executes the user's original intent after "send anyway".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    RequestSubmit(NodeId),
    /// Trigger send for the prompt, falling back to clicking `fallback`.
    TriggerSend {
        prompt: PromptField,
        fallback: Option<NodeId>,
    },
}

struct Captured {
    field: Option<PromptField>,
    /// The send control a click landed on.
    button: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Idle,
    ModalOpen,
}

/// What the host should do with the captured event.
#[derive(Debug)]
pub enum GuardVerdict {
    /// Not a guard trigger.
    Ignore,
    /// Let the event through unmodified.
    Allow,
    /// A decision surface is open; swallow the event.
    Suppress,
    /// Prevent default and stop propagation.
    Block,
    /// Blocked, and the decision surface is showing.
    Held(PendingDecision),
}

impl GuardVerdict {
    /// Whether the host must prevent default and stop propagation.
    pub fn blocks_event(&self) -> bool {
        matches!(self, Self::Suppress | Self::Block | Self::Held(_))
    }
}

/// A presented decision waiting for the surface's answer.
///
/// The gate stays in `ModalOpen` until the decision is passed to
/// [`InterceptionGate::settle`]. A host that drops it instead (page
/// navigation, surface torn down) must call [`InterceptionGate::abandon`].
#[derive(Debug)]
pub struct PendingDecision {
    receiver: oneshot::Receiver<DecisionOutcome>,
    field: PromptField,
    resume: ResumeAction,
    result: DetectionResult,
}

impl PendingDecision {
    pub fn result(&self) -> &DetectionResult {
        &self.result
    }

    pub fn field(&self) -> PromptField {
        self.field
    }

    /// Waits for the surface. A dropped responder reads as `Cancel`.
    pub async fn decided(self) -> Decided {
        let outcome = self.receiver.await.unwrap_or(DecisionOutcome::Cancel);
        Decided {
            outcome,
            field: self.field,
            resume: self.resume,
        }
    }
}

/// A decision ready to be settled by the gate.
#[derive(Debug)]
pub struct Decided {
    pub outcome: DecisionOutcome,
    field: PromptField,
    resume: ResumeAction,
}

/// What settling a decision did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Bypass armed and the original action re-run.
    Resent,
    /// The field was rewritten; false when nothing was selected.
    Redacted(bool),
    /// The host was added to the trusted list; `None` when it was empty or
    /// already trusted.
    Trusted(Option<String>),
    Cancelled,
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// The interception state machine.
pub struct InterceptionGate<S: DecisionSurface> {
    cache: SettingsCache,
    store: Arc<dyn SettingsStore>,
    surface: S,
    locator: ElementLocator,
    classifier: PageClassifier,
    bypass: BypassToken,
    clock: Arc<dyn Clock>,
    state: GateState,
}

impl<S: DecisionSurface> InterceptionGate<S> {
    pub fn new(cache: SettingsCache, store: Arc<dyn SettingsStore>, surface: S) -> Self {
        let locator = ElementLocator::new();
        Self {
            cache,
            store,
            surface,
            locator,
            classifier: PageClassifier::new(locator),
            bypass: BypassToken::default(),
            clock: Arc::new(SystemClock),
            state: GateState::Idle,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.cache.snapshot()
    }

    /// Runs the guard check for one captured event.
    pub fn handle(&mut self, trigger: &GuardTrigger, doc: &dyn Document) -> GuardVerdict {
        let Some(captured) = self.resolve_trigger(trigger, doc) else {
            return GuardVerdict::Ignore;
        };

        if self.state == GateState::ModalOpen {
            debug!("Decision surface open, suppressing trigger");
            return GuardVerdict::Suppress;
        }

        if self.bypass.take(self.clock.now()) {
            debug!("Bypass token consumed");
            return GuardVerdict::Allow;
        }

        // Fail open when no prompt field can be found.
        let Some(field) = captured.field else {
            return GuardVerdict::Allow;
        };

        let settings = self.cache.snapshot();
        if !self.should_check(&settings, doc) {
            return GuardVerdict::Allow;
        }

        let value = field.value(doc);
        let text = value.trim();
        if text.is_empty() {
            return GuardVerdict::Allow;
        }

        let result = detect_sensitive_info(text, settings.detection_level);
        if !result.is_sensitive {
            return GuardVerdict::Allow;
        }

        match settings.mode {
            PolicyMode::Warn => {
                let proceed = self.surface.confirm(&confirmation_message(&result));
                info!(
                    findings = result.findings.len(),
                    score = result.meta.total_score,
                    proceed,
                    "Warn-mode confirmation answered"
                );
                if proceed {
                    GuardVerdict::Allow
                } else {
                    GuardVerdict::Block
                }
            }
            PolicyMode::Block => {
                info!(
                    findings = result.findings.len(),
                    score = result.meta.total_score,
                    critical = result.meta.has_critical,
                    "Sensitive prompt blocked"
                );
                self.state = GateState::ModalOpen;
                let resume = match trigger {
                    GuardTrigger::Submit { form, .. } => ResumeAction::RequestSubmit(*form),
                    _ => ResumeAction::TriggerSend {
                        prompt: field,
                        fallback: captured.button,
                    },
                };
                let (responder, receiver) = DecisionResponder::channel();
                self.surface.present(
                    DecisionRequest {
                        result: result.clone(),
                        can_send_anyway: true,
                    },
                    responder,
                );
                GuardVerdict::Held(PendingDecision {
                    receiver,
                    field,
                    resume,
                    result,
                })
            }
        }
    }

    /// Applies the surface's answer. The surface is closed before anything
    /// else happens, so a failed trust write leaves the gate idle.
    pub async fn settle(
        &mut self,
        decided: Decided,
        doc: &mut dyn Document,
    ) -> Result<Resolution, GateError> {
        self.state = GateState::Idle;
        match decided.outcome {
            DecisionOutcome::SendAnyway => {
                self.bypass.arm(self.clock.now());
                self.resume(decided.resume, doc);
                info!("Sending once without further checks");
                Ok(Resolution::Resent)
            }
            DecisionOutcome::Redact(selected) => {
                if selected.is_empty() {
                    return Ok(Resolution::Redacted(false));
                }
                let current = decided.field.value(doc);
                let next = redact_text(&current, &selected);
                decided.field.set_value(doc, &next);
                info!(redacted = selected.len(), "Prompt redacted");
                Ok(Resolution::Redacted(true))
            }
            DecisionOutcome::TrustSite => {
                let host = hostname(doc);
                self.trust_host(&host).await.map(Resolution::Trusted)
            }
            DecisionOutcome::Cancel => Ok(Resolution::Cancelled),
        }
    }

    /// Returns to `Idle` without settling, dropping any armed bypass.
    pub fn abandon(&mut self) {
        if self.state == GateState::ModalOpen {
            debug!("Pending decision abandoned");
        }
        self.state = GateState::Idle;
        self.bypass.clear();
    }

    /// Appends `host` to the trusted list in the store and the cache.
    pub async fn trust_host(&mut self, host: &str) -> Result<Option<String>, GateError> {
        let host = gate_core::normalize_host(host);
        let current = self.cache.snapshot();
        if host.is_empty() || current.is_trusted_host(&host) {
            return Ok(None);
        }

        let mut trusted_hosts = current.trusted_hosts.clone();
        trusted_hosts.push(host.clone());
        self.store
            .set(SettingsPatch::default().trusted_hosts(&trusted_hosts))
            .await?;
        self.cache.replace(Settings {
            trusted_hosts,
            ..(*current).clone()
        });
        info!(host = %host, "Host trusted");
        Ok(Some(host))
    }

    fn should_check(&self, settings: &Settings, doc: &dyn Document) -> bool {
        if !settings.enabled {
            return false;
        }
        if settings.is_trusted_host(&hostname(doc)) {
            return false;
        }
        self.classifier.is_ai_chat_surface(doc)
    }

    /// Locates the prompt field and, for clicks, the send control. `None`
    /// means the event is not a guard trigger at all.
    fn resolve_trigger(&self, trigger: &GuardTrigger, doc: &dyn Document) -> Option<Captured> {
        match trigger {
            GuardTrigger::Submit { form, submitter } => {
                let target = submitter.or_else(|| doc.active_element());
                let field = self
                    .locator
                    .find_prompt_input_or_document(doc, Scope::Within(*form), target);
                Some(Captured {
                    field,
                    button: None,
                })
            }
            GuardTrigger::Click { target } => {
                if doc.is_within_decision_surface(*target) {
                    return None;
                }
                let button = doc.closest_button(*target)?;
                let desc = doc.describe(button)?;
                if !is_send_control(&desc) {
                    return None;
                }
                let field = self.locator.find_prompt_input_or_document(
                    doc,
                    Scope::from(desc.form),
                    doc.active_element(),
                );
                Some(Captured {
                    field,
                    button: Some(button),
                })
            }
            GuardTrigger::KeyDown {
                target,
                key,
                shift,
                composing,
            } => {
                if key != "Enter" || *shift || *composing {
                    return None;
                }
                let field = self.locator.field_at(doc, *target)?;
                Some(Captured {
                    field: Some(field),
                    button: None,
                })
            }
        }
    }

    fn resume(&self, action: ResumeAction, doc: &mut dyn Document) {
        match action {
            ResumeAction::RequestSubmit(form) => doc.request_submit(form),
            ResumeAction::TriggerSend { prompt, fallback } => {
                if !self.locator.trigger_send_for_prompt(doc, &prompt)
                    && let Some(button) = fallback
                {
                    doc.click(button);
                }
            }
        }
    }
}
