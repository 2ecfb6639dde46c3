//! [`Dom`] over `web-sys`.
//!
//! Nodes from same-origin frames belong to another JS realm, so `instanceof`
//! checks (`dyn_ref`, `dyn_into`) fail for them. Everything here classifies
//! nodes by `nodeType`/`tagName` and casts with `unchecked_ref`.

use js_sys::{Array, Function, Object, Reflect, WeakSet};
use retouch_core::{Dom, DomError, NodeSet, Offset, Rect, Visibility, first_nonzero, is_text_area};
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue, prelude::Closure};
use web_sys::{
    Document, Element, EventTarget, HtmlElement, HtmlIFrameElement, HtmlTextAreaElement,
    MutationObserver, MutationObserverInit, MutationRecord, Node, Window,
};

const CANDIDATE_SELECTOR: &str = "textarea, [contenteditable=\"true\"]";
const FRAME_SELECTOR: &str = "iframe";

/// Convert a thrown JS value into a [`DomError`].
pub fn host_error(value: JsValue) -> DomError {
    DomError::Host(describe(&value))
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Identity set of DOM nodes that does not keep them alive.
pub struct WebNodeSet(WeakSet);

impl NodeSet<Node> for WebNodeSet {
    fn contains(&self, node: &Node) -> bool {
        self.0.has(node.unchecked_ref::<Object>())
    }

    fn insert(&mut self, node: &Node) -> bool {
        let object = node.unchecked_ref::<Object>();
        if self.0.has(object) {
            return false;
        }
        self.0.add(object);
        true
    }
}

/// A live `MutationObserver` together with the callback it invokes.
pub struct WebObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

/// The page the content script runs in.
#[derive(Clone, Debug)]
pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    /// Bind to the current global window.
    pub fn new() -> Result<Self, DomError> {
        let window =
            web_sys::window().ok_or_else(|| DomError::Host("no global window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| DomError::Host("window has no document".into()))?;
        Ok(Self { window, document })
    }

    /// The top-level window.
    pub fn window(&self) -> &Window {
        &self.window
    }

    fn element<'a>(&self, node: &'a Node) -> Option<&'a Element> {
        (node.node_type() == Node::ELEMENT_NODE).then(|| node.unchecked_ref::<Element>())
    }

    fn query_all(&self, scope: &Node, selector: &str) -> Vec<Node> {
        let Some(element) = self.element(scope) else {
            return Vec::new();
        };
        match element.query_selector_all(selector) {
            Ok(list) => (0..list.length()).filter_map(|index| list.item(index)).collect(),
            Err(error) => {
                warn!(error = %describe(&error), selector, "Query failed");
                Vec::new()
            }
        }
    }
}

impl Dom for WebDom {
    type Node = Node;
    type Document = Document;
    type NodeSet = WebNodeSet;
    type Observer = WebObserver;

    fn node_set(&self) -> WebNodeSet {
        WebNodeSet(WeakSet::new())
    }

    fn top_document(&self) -> Document {
        self.document.clone()
    }

    fn document_element(&self, document: &Document) -> Option<Node> {
        document.document_element().map(Node::from)
    }

    fn body(&self, document: &Document) -> Option<Node> {
        document.body().map(Node::from)
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn tag_name(&self, node: &Node) -> String {
        match self.element(node) {
            Some(element) => element.tag_name(),
            None => node.node_name(),
        }
    }

    fn is_content_editable(&self, node: &Node) -> bool {
        self.element(node)
            .map(|element| element.unchecked_ref::<HtmlElement>().is_content_editable())
            .unwrap_or(false)
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
        let element = self
            .element(node)
            .ok_or_else(|| DomError::Host(format!("cannot set {name} on a non-element")))?;
        element.set_attribute(name, value).map_err(host_error)
    }

    fn parent_element(&self, node: &Node) -> Option<Node> {
        node.parent_element().map(Node::from)
    }

    fn owner_document(&self, node: &Node) -> Option<Document> {
        node.owner_document()
    }

    fn editable_candidates(&self, scope: &Node) -> Vec<Node> {
        self.query_all(scope, CANDIDATE_SELECTOR)
    }

    fn frames(&self, scope: &Node) -> Vec<Node> {
        self.query_all(scope, FRAME_SELECTOR)
    }

    fn frame_document(&self, frame: &Node) -> Result<Option<Document>, DomError> {
        let frame = frame.unchecked_ref::<HtmlIFrameElement>();
        if let Some(document) = frame.content_document() {
            return Ok(Some(document));
        }

        // `contentDocument` is null both before load and across origins;
        // reading `document` off the window tells them apart.
        let Some(window) = frame.content_window() else {
            return Ok(None);
        };
        let document = Reflect::get(&window, &JsValue::from_str("document"))
            .map_err(|error| DomError::FrameInaccessible(describe(&error)))?;
        if document.is_null() || document.is_undefined() {
            Ok(None)
        } else {
            Ok(Some(document.unchecked_into()))
        }
    }

    fn frame_element(&self, document: &Document) -> Option<Node> {
        let window = document.default_view()?;
        window.frame_element().ok().flatten().map(Node::from)
    }

    fn bounding_rect(&self, node: &Node) -> Rect {
        match self.element(node) {
            Some(element) => {
                let rect = element.get_bounding_client_rect();
                Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
            }
            None => Rect::default(),
        }
    }

    fn scroll_offset(&self, document: &Document) -> Offset {
        let window = document.default_view();
        let root = document.document_element();
        let body = document.body();

        let x = first_nonzero(&[
            window.as_ref().and_then(|w| w.page_x_offset().ok()).unwrap_or(0.0),
            root.as_ref().map(|r| f64::from(r.scroll_left())).unwrap_or(0.0),
            body.as_ref().map(|b| f64::from(b.scroll_left())).unwrap_or(0.0),
        ]);
        let y = first_nonzero(&[
            window.as_ref().and_then(|w| w.page_y_offset().ok()).unwrap_or(0.0),
            root.as_ref().map(|r| f64::from(r.scroll_top())).unwrap_or(0.0),
            body.as_ref().map(|b| f64::from(b.scroll_top())).unwrap_or(0.0),
        ]);
        Offset::new(x, y)
    }

    fn client_edge(&self, document: &Document) -> Offset {
        document
            .document_element()
            .map(|root| Offset::new(f64::from(root.client_left()), f64::from(root.client_top())))
            .unwrap_or(Offset::ZERO)
    }

    fn visibility(&self, node: &Node) -> Visibility {
        let Some(element) = self.element(node) else {
            return Visibility::VISIBLE;
        };
        let window = node
            .owner_document()
            .and_then(|document| document.default_view())
            .unwrap_or_else(|| self.window.clone());

        match window.get_computed_style(element) {
            Ok(Some(style)) => Visibility {
                display_none: style.get_property_value("display").ok().as_deref() == Some("none"),
                hidden: style.get_property_value("visibility").ok().as_deref() == Some("hidden"),
            },
            _ => Visibility::VISIBLE,
        }
    }

    fn text_value(&self, node: &Node) -> Option<String> {
        is_text_area(self, node).then(|| node.unchecked_ref::<HtmlTextAreaElement>().value())
    }

    fn set_text_value(&self, node: &Node, value: &str) -> Result<(), DomError> {
        if !is_text_area(self, node) {
            return Err(DomError::Host(format!(
                "{} has no value to set",
                self.tag_name(node)
            )));
        }
        node.unchecked_ref::<HtmlTextAreaElement>().set_value(value);
        Ok(())
    }

    fn inner_text(&self, node: &Node) -> String {
        match self.element(node) {
            Some(element) => element.unchecked_ref::<HtmlElement>().inner_text(),
            None => node.text_content().unwrap_or_default(),
        }
    }

    fn set_inner_text(&self, node: &Node, text: &str) -> Result<(), DomError> {
        match self.element(node) {
            Some(element) => {
                element.unchecked_ref::<HtmlElement>().set_inner_text(text);
                Ok(())
            }
            None => {
                node.set_text_content(Some(text));
                Ok(())
            }
        }
    }

    fn observe_additions(
        &self,
        target: &Node,
        mut on_added: Box<dyn FnMut(Vec<Node>)>,
    ) -> Result<WebObserver, DomError> {
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                let mut added = Vec::new();
                for record in records.iter() {
                    let nodes = record.unchecked_into::<MutationRecord>().added_nodes();
                    added.extend((0..nodes.length()).filter_map(|index| nodes.item(index)));
                }
                if !added.is_empty() {
                    on_added(added);
                }
            },
        );

        let observer =
            MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(host_error)?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer
            .observe_with_options(target, &options)
            .map_err(host_error)?;

        Ok(WebObserver {
            observer,
            _callback: callback,
        })
    }

    fn disconnect(&self, observer: WebObserver) {
        observer.observer.disconnect();
    }

    fn acknowledge(&self, message: &str) {
        if let Err(error) = self.window.alert_with_message(message) {
            warn!(error = %describe(&error), "Failed to show acknowledgment");
        }
    }
}

/// Create an HTML element in `document`.
pub fn create_html_element(document: &Document, tag: &str) -> Result<HtmlElement, DomError> {
    document
        .create_element(tag)
        .map(|element| element.unchecked_into::<HtmlElement>())
        .map_err(host_error)
}

/// Set inline style properties on an element.
pub fn set_styles(element: &HtmlElement, properties: &[(&str, &str)]) -> Result<(), DomError> {
    let style = element.style();
    for (name, value) in properties {
        style.set_property(name, value).map_err(host_error)?;
    }
    Ok(())
}

/// An event listener registered on a target, removed again by
/// [`EventBinding::unbind`].
///
/// The binding does not own the closure behind `callback`; whoever holds the
/// binding must keep that closure alive until it is unbound.
pub struct EventBinding {
    target: EventTarget,
    event: &'static str,
    callback: Function,
}

impl EventBinding {
    pub fn bind<T: ?Sized>(
        target: &EventTarget,
        event: &'static str,
        closure: &Closure<T>,
    ) -> Result<Self, DomError> {
        let callback = closure.as_ref().unchecked_ref::<Function>().clone();
        target
            .add_event_listener_with_callback(event, &callback)
            .map_err(host_error)?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }

    pub fn unbind(&self) {
        if let Err(error) = self
            .target
            .remove_event_listener_with_callback(self.event, &self.callback)
        {
            warn!(error = %describe(&error), event = self.event, "Failed to remove listener");
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;
    use retouch_core::is_editable_surface;
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;
    use crate::testing::{append, append_to_body, frame_body, page, settle};

    #[wasm_bindgen_test]
    fn it_tracks_nodes_by_identity() {
        let dom = page();
        let first = append_to_body(&dom, "textarea");
        let second = append_to_body(&dom, "textarea");
        let first_node: Node = first.clone().into();
        let second_node: Node = second.clone().into();

        let mut set = dom.node_set();
        assert!(set.insert(&first_node));
        assert!(!set.insert(&first.clone().into()));
        assert!(set.contains(&first_node));
        assert!(!set.contains(&second_node));

        first.remove();
        second.remove();
    }

    #[wasm_bindgen_test]
    fn it_treats_nested_content_editables_as_one_surface() {
        let dom = page();
        let document = dom.top_document();
        let editor = append_to_body(&dom, "div");
        editor.set_attribute("contenteditable", "true").unwrap();
        let paragraph = append(&document, &editor, "p");
        let opted_out = append_to_body(&dom, "div");
        opted_out.set_attribute("contenteditable", "false").unwrap();

        assert!(dom.is_content_editable(&paragraph));
        assert!(is_editable_surface(&dom, &editor.clone().into()));
        assert!(!is_editable_surface(&dom, &paragraph.into()));
        assert!(!is_editable_surface(&dom, &opted_out.clone().into()));

        editor.remove();
        opted_out.remove();
    }

    #[wasm_bindgen_test]
    fn it_reads_blank_same_origin_frames() {
        let dom = page();
        let frame = append_to_body(&dom, "iframe");
        let (_, body) = frame_body(&frame);

        let document = dom
            .frame_document(&frame.clone().into())
            .unwrap()
            .expect("blank frame has a document");

        assert_eq!(dom.body(&document), Some(body));
        assert_eq!(dom.frame_element(&document), Some(frame.clone().into()));

        frame.remove();
    }

    #[wasm_bindgen_test]
    async fn it_delivers_one_batch_per_mutation_tick() {
        let dom = page();
        let document = dom.top_document();
        let container = append_to_body(&dom, "div");
        let batches: Rc<RefCell<Vec<Vec<Node>>>> = Rc::default();

        let observer = {
            let batches = batches.clone();
            dom.observe_additions(
                &container.clone().into(),
                Box::new(move |nodes| batches.borrow_mut().push(nodes)),
            )
            .unwrap()
        };

        let first = append(&document, &container, "div");
        let nested = append(&document, &first, "textarea");
        let second = append(&document, &container, "div");
        settle().await;

        let batches = batches.borrow().clone();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![Node::from(first), Node::from(nested), Node::from(second)]
        );

        dom.disconnect(observer);
        container.remove();
    }
}
