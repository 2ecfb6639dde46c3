use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
    rc::Rc,
};

use crate::{
    CONTENT_EDITABLE_ATTRIBUTE, Dom, DomError, FRAME_TAG, NodeSet, Offset, Rect, TEXTAREA_TAG,
    Visibility,
};

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Handle to a document in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(usize);

/// Handle to a mutation subscription in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryObserver(usize);

/// [`NodeSet`] keyed by [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct MemoryNodeSet(HashSet<NodeId>);

impl NodeSet<NodeId> for MemoryNodeSet {
    fn contains(&self, node: &NodeId) -> bool {
        self.0.contains(node)
    }

    fn insert(&mut self, node: &NodeId) -> bool {
        self.0.insert(*node)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String },
    Text { text: String },
}

#[derive(Debug, Clone, Copy)]
enum FrameContent {
    Loaded(DocumentId),
    CrossOrigin,
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    document: DocumentId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    rect: Rect,
    visibility: Visibility,
    value: String,
    frame: Option<FrameContent>,
}

#[derive(Debug)]
struct DocumentData {
    root: NodeId,
    body: NodeId,
    scroll: Offset,
    client_edge: Offset,
    host_frame: Option<NodeId>,
}

type AdditionCallback = Rc<RefCell<Box<dyn FnMut(Vec<NodeId>)>>>;

struct ObserverSlot {
    target: NodeId,
    callback: AdditionCallback,
    connected: bool,
}

#[derive(Default)]
struct Tree {
    nodes: Vec<NodeData>,
    documents: Vec<DocumentData>,
    observers: Vec<ObserverSlot>,
    pending: Vec<(usize, NodeId)>,
    acknowledgments: Vec<String>,
}

impl Tree {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn create_node(&mut self, document: DocumentId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            document,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            rect: Rect::default(),
            visibility: Visibility::VISIBLE,
            value: String::new(),
            frame: None,
        });
        id
    }

    fn create_document(&mut self, host_frame: Option<NodeId>) -> DocumentId {
        let document = DocumentId(self.documents.len());
        let root = self.create_node(
            document,
            NodeKind::Element {
                tag: "html".into(),
            },
        );
        let body = self.create_node(
            document,
            NodeKind::Element {
                tag: "body".into(),
            },
        );
        self.node_mut(root).children.push(body);
        self.node_mut(body).parent = Some(root);
        self.documents.push(DocumentData {
            root,
            body,
            scroll: Offset::ZERO,
            client_edge: Offset::ZERO,
            host_frame,
        });
        document
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text { .. } => None,
        }
    }

    fn has_tag(&self, id: NodeId, expected: &str) -> bool {
        self.tag(id)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(expected))
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.node(scope).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            found.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        found
    }

    fn content_editable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.tag(node).is_none() {
                return false;
            }
            match self.node(node).attributes.get(CONTENT_EDITABLE_ATTRIBUTE) {
                Some(value) if value.eq_ignore_ascii_case("false") => return false,
                Some(value)
                    if value.is_empty()
                        || value.eq_ignore_ascii_case("true")
                        || value.eq_ignore_ascii_case("plaintext-only") =>
                {
                    return true;
                }
                _ => current = self.node(node).parent,
            }
        }
        false
    }

    fn text_of(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Text { text } => text.clone(),
            NodeKind::Element { .. } => self
                .node(id)
                .children
                .iter()
                .map(|child| self.text_of(*child))
                .collect(),
        }
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node(child).parent {
            self.node_mut(parent).children.retain(|id| *id != child);
            self.node_mut(child).parent = None;
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);

        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.connected && self.is_inclusive_ancestor(slot.target, parent))
            .map(|(index, _)| index)
            .collect();
        for index in interested {
            self.pending.push((index, child));
        }
    }
}

/// An in-memory document tree with frames, geometry, visibility and batched
/// mutation delivery.
///
/// Mutations are queued and only delivered to observers by [`MemoryDom::flush`],
/// mirroring how browsers hand mutation records to observers after the
/// current task.
#[derive(Clone)]
pub struct MemoryDom {
    tree: Rc<RefCell<Tree>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// A page with an empty top-level document.
    pub fn new() -> Self {
        let mut tree = Tree::default();
        tree.create_document(None);
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    pub fn body_of(&self, document: DocumentId) -> NodeId {
        self.tree.borrow().documents[document.0].body
    }

    pub fn document_of(&self, node: NodeId) -> DocumentId {
        self.tree.borrow().node(node).document
    }

    /// A detached element owned by `document`.
    pub fn create_element(&self, document: DocumentId, tag: &str) -> NodeId {
        self.tree
            .borrow_mut()
            .create_node(document, NodeKind::Element { tag: tag.into() })
    }

    /// Insert `child` as the last child of `parent`, queueing the addition for
    /// any observer watching an ancestor of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.tree.borrow_mut().append_child(parent, child);
    }

    /// Remove a node from its parent.
    pub fn detach(&self, node: NodeId) {
        self.tree.borrow_mut().detach(node);
    }

    pub fn append_element(&self, parent: NodeId, tag: &str) -> NodeId {
        let element = self.create_element(self.document_of(parent), tag);
        self.append_child(parent, element);
        element
    }

    pub fn append_text(&self, parent: NodeId, text: &str) -> NodeId {
        let document = self.document_of(parent);
        let node = self
            .tree
            .borrow_mut()
            .create_node(document, NodeKind::Text { text: text.into() });
        self.append_child(parent, node);
        node
    }

    /// A detached, same-origin frame element owned by `document`, with its own
    /// empty document loaded.
    pub fn create_frame(&self, document: DocumentId) -> (NodeId, DocumentId) {
        let frame = self.create_element(document, FRAME_TAG);
        let mut tree = self.tree.borrow_mut();
        let content = tree.create_document(Some(frame));
        tree.node_mut(frame).frame = Some(FrameContent::Loaded(content));
        (frame, content)
    }

    pub fn append_frame(&self, parent: NodeId) -> (NodeId, DocumentId) {
        let (frame, content) = self.create_frame(self.document_of(parent));
        self.append_child(parent, frame);
        (frame, content)
    }

    /// A detached frame element whose document belongs to another origin.
    pub fn create_cross_origin_frame(&self, document: DocumentId) -> NodeId {
        let frame = self.create_element(document, FRAME_TAG);
        self.tree.borrow_mut().node_mut(frame).frame = Some(FrameContent::CrossOrigin);
        frame
    }

    pub fn append_cross_origin_frame(&self, parent: NodeId) -> NodeId {
        let frame = self.create_cross_origin_frame(self.document_of(parent));
        self.append_child(parent, frame);
        frame
    }

    pub fn set_attribute_value(&self, node: NodeId, name: &str, value: &str) {
        self.tree
            .borrow_mut()
            .node_mut(node)
            .attributes
            .insert(name.into(), value.into());
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        self.tree.borrow_mut().node_mut(node).attributes.remove(name);
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.tree.borrow_mut().node_mut(node).rect = rect;
    }

    pub fn set_visibility(&self, node: NodeId, visibility: Visibility) {
        self.tree.borrow_mut().node_mut(node).visibility = visibility;
    }

    pub fn set_value(&self, node: NodeId, value: &str) {
        self.tree.borrow_mut().node_mut(node).value = value.into();
    }

    pub fn set_scroll(&self, document: DocumentId, scroll: Offset) {
        self.tree.borrow_mut().documents[document.0].scroll = scroll;
    }

    pub fn set_client_edge(&self, document: DocumentId, edge: Offset) {
        self.tree.borrow_mut().documents[document.0].client_edge = edge;
    }

    /// Children of a node, in order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.borrow().node(node).children.clone()
    }

    /// Every acknowledgment shown so far.
    pub fn acknowledgments(&self) -> Vec<String> {
        self.tree.borrow().acknowledgments.clone()
    }

    /// Subscriptions that have not been disconnected.
    pub fn live_observer_count(&self) -> usize {
        self.tree
            .borrow()
            .observers
            .iter()
            .filter(|slot| slot.connected)
            .count()
    }

    /// Whether mutations are waiting to be delivered.
    pub fn has_pending_mutations(&self) -> bool {
        !self.tree.borrow().pending.is_empty()
    }

    /// Deliver every queued addition, one batch per observer.
    ///
    /// Mutations made by the callbacks themselves are queued for the next
    /// flush. Returns the number of batches delivered.
    pub fn flush(&self) -> usize {
        let batches: Vec<(AdditionCallback, Vec<NodeId>)> = {
            let mut tree = self.tree.borrow_mut();
            let pending = std::mem::take(&mut tree.pending);

            let mut grouped: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
            for (observer, node) in pending {
                grouped.entry(observer).or_default().push(node);
            }

            grouped
                .into_iter()
                .filter(|(observer, _)| tree.observers[*observer].connected)
                .map(|(observer, nodes)| (tree.observers[observer].callback.clone(), nodes))
                .collect()
        };

        let delivered = batches.len();
        for (callback, nodes) in batches {
            let mut callback = callback.borrow_mut();
            (*callback)(nodes);
        }
        delivered
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;
    type Document = DocumentId;
    type NodeSet = MemoryNodeSet;
    type Observer = MemoryObserver;

    fn node_set(&self) -> Self::NodeSet {
        MemoryNodeSet::default()
    }

    fn top_document(&self) -> DocumentId {
        DocumentId(0)
    }

    fn document_element(&self, document: &DocumentId) -> Option<NodeId> {
        self.tree
            .borrow()
            .documents
            .get(document.0)
            .map(|data| data.root)
    }

    fn body(&self, document: &DocumentId) -> Option<NodeId> {
        self.tree
            .borrow()
            .documents
            .get(document.0)
            .map(|data| data.body)
    }

    fn is_element(&self, node: &NodeId) -> bool {
        self.tree.borrow().tag(*node).is_some()
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.tree
            .borrow()
            .tag(*node)
            .map(str::to_string)
            .unwrap_or_else(|| "#text".into())
    }

    fn is_content_editable(&self, node: &NodeId) -> bool {
        self.tree.borrow().content_editable(*node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree.borrow().node(*node).attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if !self.is_element(node) {
            return Err(DomError::Host("attributes require an element".into()));
        }
        self.set_attribute_value(*node, name, value);
        Ok(())
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.node(*node)
            .parent
            .filter(|parent| tree.tag(*parent).is_some())
    }

    fn owner_document(&self, node: &NodeId) -> Option<DocumentId> {
        Some(self.document_of(*node))
    }

    fn editable_candidates(&self, scope: &NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        tree.descendants(*scope)
            .into_iter()
            .filter(|id| {
                tree.has_tag(*id, TEXTAREA_TAG)
                    || (tree.tag(*id).is_some()
                        && tree
                            .node(*id)
                            .attributes
                            .get(CONTENT_EDITABLE_ATTRIBUTE)
                            .is_some_and(|value| value == "true"))
            })
            .collect()
    }

    fn frames(&self, scope: &NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        tree.descendants(*scope)
            .into_iter()
            .filter(|id| tree.has_tag(*id, FRAME_TAG))
            .collect()
    }

    fn frame_document(&self, frame: &NodeId) -> Result<Option<DocumentId>, DomError> {
        match self.tree.borrow().node(*frame).frame {
            Some(FrameContent::Loaded(document)) => Ok(Some(document)),
            Some(FrameContent::CrossOrigin) => Err(DomError::FrameInaccessible(
                "blocked a frame with a different origin".into(),
            )),
            None => Ok(None),
        }
    }

    fn frame_element(&self, document: &DocumentId) -> Option<NodeId> {
        self.tree.borrow().documents[document.0].host_frame
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.tree.borrow().node(*node).rect
    }

    fn scroll_offset(&self, document: &DocumentId) -> Offset {
        self.tree.borrow().documents[document.0].scroll
    }

    fn client_edge(&self, document: &DocumentId) -> Offset {
        self.tree.borrow().documents[document.0].client_edge
    }

    fn visibility(&self, node: &NodeId) -> Visibility {
        self.tree.borrow().node(*node).visibility
    }

    fn text_value(&self, node: &NodeId) -> Option<String> {
        let tree = self.tree.borrow();
        tree.has_tag(*node, TEXTAREA_TAG)
            .then(|| tree.node(*node).value.clone())
    }

    fn set_text_value(&self, node: &NodeId, value: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        if !tree.has_tag(*node, TEXTAREA_TAG) {
            return Err(DomError::Host("only text areas carry a value".into()));
        }
        tree.node_mut(*node).value = value.into();
        Ok(())
    }

    fn inner_text(&self, node: &NodeId) -> String {
        self.tree.borrow().text_of(*node)
    }

    fn set_inner_text(&self, node: &NodeId, text: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        if tree.tag(*node).is_none() {
            return Err(DomError::Host("inner text requires an element".into()));
        }
        for child in tree.node(*node).children.clone() {
            tree.detach(child);
        }
        let document = tree.node(*node).document;
        let text_node = tree.create_node(document, NodeKind::Text { text: text.into() });
        tree.append_child(*node, text_node);
        Ok(())
    }

    fn observe_additions(
        &self,
        target: &NodeId,
        on_added: Box<dyn FnMut(Vec<NodeId>)>,
    ) -> Result<MemoryObserver, DomError> {
        let mut tree = self.tree.borrow_mut();
        let id = MemoryObserver(tree.observers.len());
        tree.observers.push(ObserverSlot {
            target: *target,
            callback: Rc::new(RefCell::new(on_added)),
            connected: true,
        });
        Ok(id)
    }

    fn disconnect(&self, observer: MemoryObserver) {
        if let Some(slot) = self.tree.borrow_mut().observers.get_mut(observer.0) {
            slot.connected = false;
        }
    }

    fn acknowledge(&self, message: &str) {
        self.tree
            .borrow_mut()
            .acknowledgments
            .push(message.to_string());
    }
}
