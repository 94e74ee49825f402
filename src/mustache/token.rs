//! Template tokens and the section tree.

use expressions_core::Position;

/// Kinds of template tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MustacheTokenKind {
    /// Literal text.
    Value,
    /// `{{{name}}}`, rendered as is.
    Variable,
    /// `{{name}}`, rendered HTML-escaped.
    EscapedVariable,
    /// `{{#name}}` or `{{#if name}}`
    Section,
    /// `{{^name}}` or `{{#unless name}}`
    InvertedSection,
    /// `{{/name}}` or `{{/}}`
    SectionEnd,
    /// `{{! ... }}`
    Comment,
    /// `{{> name}}`
    Partial,
}

/// A template token.
#[derive(Debug, Clone, PartialEq)]
pub struct MustacheToken {
    pub kind: MustacheTokenKind,
    /// Literal text, or the referenced name. `None` for a bare `{{/}}`.
    pub value: Option<String>,
    /// `if`/`unless` for sections opened with a helper.
    pub helper: Option<String>,
    pub position: Position,
}

impl MustacheToken {
    pub fn new(kind: MustacheTokenKind, value: Option<String>, position: Position) -> Self {
        Self {
            kind,
            value,
            helper: None,
            position,
        }
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.position.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.position.column
    }

    /// The text or name, empty when absent.
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    /// Whether a `{{/name}}` closes this section (a bare end always does).
    pub fn is_closed_by(&self, end: &MustacheToken) -> bool {
        let Some(name) = end.value.as_deref() else {
            return true;
        };
        match &self.helper {
            Some(helper) => helper.eq_ignore_ascii_case(name),
            None => self.text().eq_ignore_ascii_case(name),
        }
    }
}

/// Index of a node in a [`MustacheTree`].
pub type NodeId = usize;

/// A tree node. Only the root has no token.
#[derive(Debug, Clone, PartialEq)]
pub struct MustacheNode {
    pub token: Option<MustacheToken>,
    pub children: Vec<NodeId>,
}

/// Section tree stored as an arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct MustacheTree {
    nodes: Vec<MustacheNode>,
}

impl MustacheTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![MustacheNode {
                token: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append a node under `parent` and return its id.
    pub fn add(&mut self, parent: NodeId, token: MustacheToken) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MustacheNode {
            token: Some(token),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &MustacheNode {
        &self.nodes[id]
    }

    #[inline]
    pub fn root(&self) -> &MustacheNode {
        &self.nodes[Self::ROOT]
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

impl Default for MustacheTree {
    fn default() -> Self {
        Self::new()
    }
}
