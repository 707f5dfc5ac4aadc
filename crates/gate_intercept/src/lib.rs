pub mod bypass;
pub mod dom;
pub mod gate;
pub mod locator;
pub mod page;
pub mod surface;

pub use bypass::{BYPASS_WINDOW, BypassToken, Clock, ManualClock, SystemClock};
pub use dom::{Document, ElementDescriptor, ElementHints, ElementTag, NodeId, PromptField, RenderState, Scope};
pub use gate::{
    Decided, GateState, GuardTrigger, GuardVerdict, InterceptionGate, PendingDecision, Resolution,
    ResumeAction,
};
pub use locator::ElementLocator;
pub use page::PageClassifier;
pub use surface::{
    DecisionOutcome, DecisionRequest, DecisionResponder, DecisionSurface, confirmation_message,
    summarize_findings,
};
