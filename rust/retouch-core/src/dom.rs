//! The host document model.
//!
//! Everything in this crate talks to the page through [`Dom`]. The browser
//! implementation lives in `retouch-extension` and drives `web-sys`; the
//! in-memory [`MemoryDom`](crate::helpers::MemoryDom) backs the native tests.
//!
//! The trait is deliberately shaped around *handles*: nodes and documents are
//! cheap, clonable references owned by the host, and all queries go through
//! the [`Dom`] value. Node identity is whatever the host says it is, which is
//! why membership tracking goes through [`NodeSet`] rather than `Hash`.

use crate::{DomError, Offset, Rect};

/// Tag name of the text-area-like control.
pub const TEXTAREA_TAG: &str = "textarea";

/// Tag name of an inline frame.
pub const FRAME_TAG: &str = "iframe";

/// Attribute that marks an element as content-editable.
pub const CONTENT_EDITABLE_ATTRIBUTE: &str = "contenteditable";

/// Computed visibility of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    /// `display: none`
    pub display_none: bool,
    /// `visibility: hidden`
    pub hidden: bool,
}

impl Visibility {
    /// A fully visible element.
    pub const VISIBLE: Visibility = Visibility {
        display_none: false,
        hidden: false,
    };

    /// Whether the element renders at all.
    pub fn is_visible(&self) -> bool {
        !self.display_none && !self.hidden
    }
}

/// An identity-keyed set of host nodes.
///
/// Membership must be by node identity, never by structural equality, and
/// must not keep nodes alive on hosts that can express that (the browser
/// implementation is a `WeakSet`).
pub trait NodeSet<Node> {
    /// Whether the node is in the set.
    fn contains(&self, node: &Node) -> bool;

    /// Add the node; returns `false` if it was already present.
    fn insert(&mut self, node: &Node) -> bool;
}

/// Read/write access to a host document tree, including nested frames.
pub trait Dom: Clone + 'static {
    /// A node handle.
    type Node: Clone + 'static;
    /// A document handle.
    type Document: Clone + 'static;
    /// Identity set over [`Dom::Node`].
    type NodeSet: NodeSet<Self::Node> + 'static;
    /// A live mutation subscription, ended by [`Dom::disconnect`].
    type Observer: 'static;

    /// A fresh, empty identity set.
    fn node_set(&self) -> Self::NodeSet;

    /// The top-level document of the page.
    fn top_document(&self) -> Self::Document;

    /// The document's root element (`<html>`).
    fn document_element(&self, document: &Self::Document) -> Option<Self::Node>;

    /// The document's `<body>`.
    fn body(&self, document: &Self::Document) -> Option<Self::Node>;

    /// Whether the node is an element (as opposed to text, comments, ...).
    fn is_element(&self, node: &Self::Node) -> bool;

    /// The element's tag name, in any case.
    fn tag_name(&self, node: &Self::Node) -> String;

    /// The host's own content-editable state, including inheritance.
    fn is_content_editable(&self, node: &Self::Node) -> bool;

    /// Read an attribute.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Write an attribute.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    /// The parent element, if the parent is an element.
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// The document that owns the node.
    fn owner_document(&self, node: &Self::Node) -> Option<Self::Document>;

    /// Descendants of `scope` that are `textarea` or `[contenteditable="true"]`,
    /// in document order. `scope` itself is not included.
    fn editable_candidates(&self, scope: &Self::Node) -> Vec<Self::Node>;

    /// Descendant `iframe` elements of `scope`, in document order.
    fn frames(&self, scope: &Self::Node) -> Vec<Self::Node>;

    /// The document loaded in a frame element.
    ///
    /// `Ok(None)` means the frame has no document yet; an error means the
    /// document exists but belongs to another origin.
    fn frame_document(&self, frame: &Self::Node) -> Result<Option<Self::Document>, DomError>;

    /// The frame element hosting this document, if it is not the top document.
    fn frame_element(&self, document: &Self::Document) -> Option<Self::Node>;

    /// Bounding rectangle relative to the owning document's viewport.
    fn bounding_rect(&self, node: &Self::Node) -> Rect;

    /// The document's current scroll offsets.
    fn scroll_offset(&self, document: &Self::Document) -> Offset;

    /// The document root's client-edge offsets (`clientLeft`/`clientTop`).
    fn client_edge(&self, document: &Self::Document) -> Offset;

    /// Computed visibility of an element.
    fn visibility(&self, node: &Self::Node) -> Visibility;

    /// The value of a text-area-like control, `None` for other elements.
    fn text_value(&self, node: &Self::Node) -> Option<String>;

    /// Replace the value of a text-area-like control.
    fn set_text_value(&self, node: &Self::Node, value: &str) -> Result<(), DomError>;

    /// Rendered text of an element.
    fn inner_text(&self, node: &Self::Node) -> String;

    /// Replace the children of an element with a single run of text.
    fn set_inner_text(&self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    /// Subscribe to nodes added anywhere under `target`.
    ///
    /// The host delivers additions in batches, asynchronously with respect to
    /// the mutation that caused them; `on_added` is never invoked from inside
    /// this call.
    fn observe_additions(
        &self,
        target: &Self::Node,
        on_added: Box<dyn FnMut(Vec<Self::Node>)>,
    ) -> Result<Self::Observer, DomError>;

    /// End a subscription created by [`Dom::observe_additions`].
    fn disconnect(&self, observer: Self::Observer);

    /// Show a blocking acknowledgment to the user.
    fn acknowledge(&self, message: &str);
}

/// Whether the element's tag is `textarea`.
pub fn is_text_area<D: Dom>(dom: &D, node: &D::Node) -> bool {
    dom.tag_name(node).eq_ignore_ascii_case(TEXTAREA_TAG)
}

/// Whether the element's tag is `iframe`.
pub fn is_frame<D: Dom>(dom: &D, node: &D::Node) -> bool {
    dom.is_element(node) && dom.tag_name(node).eq_ignore_ascii_case(FRAME_TAG)
}
