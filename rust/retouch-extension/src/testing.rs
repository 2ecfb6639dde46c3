//! Page fixtures for the in-browser tests.

use js_sys::Promise;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlElement, HtmlIFrameElement, Node};

use crate::web::{WebDom, create_html_element};

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

/// Wait one macrotask, so pending mutation records and spawned futures have
/// been delivered.
pub async fn settle() {
    let promise = Promise::new(&mut |resolve, _reject| {
        web_sys::window()
            .expect("tests run in a window")
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
            .expect("timer is scheduled");
    });
    JsFuture::from(promise).await.expect("timer resolves");
}

pub fn page() -> WebDom {
    WebDom::new().expect("tests run in a page")
}

/// Create `tag` in `document` and append it to `parent`.
pub fn append(document: &Document, parent: &Node, tag: &str) -> HtmlElement {
    let element = create_html_element(document, tag).expect("element is created");
    parent.append_child(&element).expect("element is appended");
    element
}

/// Create `tag` and append it to the top document's body.
pub fn append_to_body(dom: &WebDom, tag: &str) -> HtmlElement {
    let document = dom.window().document().expect("window has a document");
    let body = document.body().expect("document has a body");
    append(&document, &body, tag)
}

/// How many elements in `document` match `selector`.
pub fn count(document: &Document, selector: &str) -> u32 {
    document
        .query_selector_all(selector)
        .expect("selector is valid")
        .length()
}

/// The body of a same-origin frame.
pub fn frame_body(frame: &HtmlElement) -> (Document, Node) {
    let document = frame
        .unchecked_ref::<HtmlIFrameElement>()
        .content_document()
        .expect("blank frames are same-origin");
    let body = document.body().expect("blank frames have a body");
    (document, body.into())
}
