//! Document abstraction the gate runs against.
//!
//! A host (browser bridge, webview, test double) implements [`Document`] and
//! hands the gate plain [`ElementDescriptor`] snapshots. All heuristics in
//! [`crate::locator`] work on descriptors only.

use url::Url;

/// Opaque handle to an element in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// The element kinds the gate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementTag {
    TextArea,
    Input,
    Button,
    Form,
    Other,
}

/// Query root for candidate searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Within(NodeId),
}

impl From<Option<NodeId>> for Scope {
    fn from(node: Option<NodeId>) -> Self {
        node.map_or(Scope::Document, Scope::Within)
    }
}

/// Attribute and text hints used for keyword matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementHints {
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub title: Option<String>,
    pub test_id: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
    pub text: Option<String>,
}

impl ElementHints {
    /// Non-empty hints joined by a space, lower-cased.
    pub fn joined(&self) -> String {
        [
            &self.placeholder,
            &self.aria_label,
            &self.title,
            &self.test_id,
            &self.name,
            &self.id,
            &self.class,
            &self.text,
        ]
        .into_iter()
        .filter_map(|h| h.as_deref())
        .filter(|h| !h.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

/// Computed rendering state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub has_client_rects: bool,
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub opacity_zero: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            has_client_rects: true,
            display_none: false,
            visibility_hidden: false,
            opacity_zero: false,
        }
    }
}

impl RenderState {
    pub fn hidden() -> Self {
        Self {
            display_none: true,
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.has_client_rects && !self.display_none && !self.visibility_hidden && !self.opacity_zero
    }
}

/// Immutable snapshot of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub node: NodeId,
    pub tag: ElementTag,
    /// Raw `type` attribute, if present.
    pub type_attr: Option<String>,
    pub content_editable: bool,
    pub role: Option<String>,
    pub aria_multiline: bool,
    pub aria_disabled: bool,
    pub disabled: bool,
    pub hints: ElementHints,
    pub render: RenderState,
    /// Current text: the field value for text areas and inputs, the
    /// rendered text for editable regions.
    pub value: String,
    /// Nearest enclosing form.
    pub form: Option<NodeId>,
}

impl ElementDescriptor {
    pub fn new(node: NodeId, tag: ElementTag) -> Self {
        Self {
            node,
            tag,
            type_attr: None,
            content_editable: false,
            role: None,
            aria_multiline: false,
            aria_disabled: false,
            disabled: false,
            hints: ElementHints::default(),
            render: RenderState::default(),
            value: String::new(),
            form: None,
        }
    }

    /// Effective input type: a missing attribute reads as `text`.
    pub fn input_type(&self) -> String {
        self.type_attr
            .as_deref()
            .unwrap_or("text")
            .to_lowercase()
    }

    pub fn role_is(&self, role: &str) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled || self.aria_disabled
    }
}

/// Host document operations the gate needs.
pub trait Document {
    fn location(&self) -> &Url;

    fn title(&self) -> String;

    /// Text of the first `h1`/`h2`.
    fn first_heading_text(&self) -> Option<String>;

    fn active_element(&self) -> Option<NodeId>;

    fn describe(&self, node: NodeId) -> Option<ElementDescriptor>;

    /// Text areas, text/search inputs and editable regions in `scope`, in
    /// that order.
    fn text_entry_elements(&self, scope: Scope) -> Vec<NodeId>;

    /// Buttons, `role=button` elements and submit inputs in `scope`.
    fn button_elements(&self, scope: Scope) -> Vec<NodeId>;

    /// Nearest composer-like ancestor: a form, an element whose test-id or
    /// class mentions `composer`, or the main region.
    fn closest_composer(&self, node: NodeId) -> Option<NodeId>;

    /// Nearest button, `role=button` or submit input, including `node`.
    fn closest_button(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` belongs to the decision surface the gate opened.
    fn is_within_decision_surface(&self, _node: NodeId) -> bool {
        false
    }

    fn input_value(&self, node: NodeId) -> String;

    fn set_input_value(&mut self, node: NodeId, value: &str);

    fn inner_text(&self, node: NodeId) -> String;

    fn set_text_content(&mut self, node: NodeId, value: &str);

    /// Fire a bubbling `input` event on `node`.
    fn dispatch_input(&mut self, node: NodeId, data: Option<&str>);

    fn request_submit(&mut self, form: NodeId);

    fn click(&mut self, node: NodeId);
}

/// Location helpers shared by the classifier and the gate.
pub fn hostname(doc: &dyn Document) -> String {
    gate_core::normalize_host(doc.location().host_str().unwrap_or_default())
}

/// A text field the gate can read and rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptField {
    /// Text area or single-line input.
    PlainTextField(NodeId),
    /// Content-editable region.
    RichEditableRegion(NodeId),
}

impl PromptField {
    /// Text areas and inputs are plain; any other editable element is rich.
    pub fn from_descriptor(desc: &ElementDescriptor) -> Option<Self> {
        match desc.tag {
            ElementTag::TextArea | ElementTag::Input => Some(Self::PlainTextField(desc.node)),
            _ if desc.content_editable => Some(Self::RichEditableRegion(desc.node)),
            _ => None,
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            Self::PlainTextField(node) | Self::RichEditableRegion(node) => *node,
        }
    }

    pub fn value(&self, doc: &dyn Document) -> String {
        match self {
            Self::PlainTextField(node) => doc.input_value(*node),
            Self::RichEditableRegion(node) => doc.inner_text(*node),
        }
    }

    /// Rewrites the text and notifies the page with an input event.
    pub fn set_value(&self, doc: &mut dyn Document, value: &str) {
        match self {
            Self::PlainTextField(node) => {
                doc.set_input_value(*node, value);
                doc.dispatch_input(*node, None);
            }
            Self::RichEditableRegion(node) => {
                if !self.is_editable(doc) {
                    return;
                }
                doc.set_text_content(*node, value);
                doc.dispatch_input(*node, Some(value));
            }
        }
    }

    pub fn is_editable(&self, doc: &dyn Document) -> bool {
        match doc.describe(self.node()) {
            Some(desc) => match self {
                Self::PlainTextField(_) => !desc.disabled,
                Self::RichEditableRegion(_) => desc.content_editable,
            },
            None => false,
        }
    }

    pub fn form(&self, doc: &dyn Document) -> Option<NodeId> {
        doc.describe(self.node()).and_then(|d| d.form)
    }
}
