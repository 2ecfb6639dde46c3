//! The per-surface correction button.

use std::rc::Rc;

use js_sys::Array;
use retouch_core::{
    Affordance, AffordanceFactory, CorrectionService, Corrector, Dom, DomError, Preview,
    RequestSequence, RetouchError, Size, absolute_rect, anchor_bottom_right,
};
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue, prelude::Closure};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, EventTarget, HtmlElement, MouseEvent, Node, ResizeObserver};

use crate::web::{EventBinding, WebDom, create_html_element, host_error, set_styles};

/// Class carried by every correction button.
pub const BUTTON_CLASS: &str = "retouch-correction-button";

/// Window events that move a surface relative to the page.
const REPOSITION_EVENTS: [&str; 2] = ["resize", "scroll"];

/// Builds a [`CorrectionButton`] for each surface the watcher attaches to.
pub struct ButtonFactory<S, P>
where
    S: CorrectionService + 'static,
    P: Preview<WebDom> + 'static,
{
    dom: WebDom,
    corrector: Rc<Corrector<WebDom, S, P>>,
    label: String,
    z_index: u32,
}

impl<S, P> ButtonFactory<S, P>
where
    S: CorrectionService + 'static,
    P: Preview<WebDom> + 'static,
{
    pub fn new(
        dom: WebDom,
        corrector: Corrector<WebDom, S, P>,
        label: impl Into<String>,
        z_index: u32,
    ) -> Self {
        Self {
            dom,
            corrector: Rc::new(corrector),
            label: label.into(),
            z_index,
        }
    }
}

impl<S, P> AffordanceFactory<WebDom> for ButtonFactory<S, P>
where
    S: CorrectionService + 'static,
    P: Preview<WebDom> + 'static,
{
    type Affordance = CorrectionButton;

    fn create(&self, surface: &Node, context: &Document) -> Result<CorrectionButton, RetouchError> {
        let document = self.dom.top_document();
        let body = document.body().ok_or(DomError::MissingBody)?;

        let element = create_html_element(&document, "button")?;
        element.set_text_content(Some(&self.label));
        element.set_class_name(BUTTON_CLASS);
        element.set_attribute("type", "button").map_err(host_error)?;
        let z_index = self.z_index.to_string();
        set_styles(
            &element,
            &[
                ("position", "absolute"),
                ("z-index", &z_index),
                ("cursor", "pointer"),
            ],
        )?;

        let on_click = click_handler(self.corrector.clone(), surface.clone());
        let reposition = {
            let dom = self.dom.clone();
            let surface = surface.clone();
            let element = element.clone();
            Closure::<dyn FnMut()>::new(move || position(&dom, &surface, &element))
        };
        let on_resize = {
            let dom = self.dom.clone();
            let surface = surface.clone();
            let element = element.clone();
            Closure::<dyn FnMut(Array, ResizeObserver)>::new(
                move |_entries: Array, _observer: ResizeObserver| {
                    position(&dom, &surface, &element)
                },
            )
        };

        // From here on every registration lives in `button`, so dropping it
        // on an early return undoes whatever was already installed.
        let mut button = CorrectionButton {
            element,
            bindings: Vec::new(),
            resize_observer: None,
            on_click,
            reposition,
            on_resize,
            disposed: false,
        };

        button.bindings.push(EventBinding::bind(
            button.element.unchecked_ref::<EventTarget>(),
            "click",
            &button.on_click,
        )?);

        for window in reposition_targets(&self.dom, context) {
            for event in REPOSITION_EVENTS {
                button
                    .bindings
                    .push(EventBinding::bind(&window, event, &button.reposition)?);
            }
        }

        let observer =
            ResizeObserver::new(button.on_resize.as_ref().unchecked_ref()).map_err(host_error)?;
        observer.observe(surface.unchecked_ref::<Element>());
        button.resize_observer = Some(observer);

        body.append_child(&button.element).map_err(host_error)?;
        position(&self.dom, surface, &button.element);
        debug!(bindings = button.bindings.len(), "Correction button attached");

        Ok(button)
    }
}

/// A floating button anchored to the bottom-right corner of its surface.
///
/// Owns its element, its listeners and its resize observer; all of them go
/// away on [`Affordance::dispose`] or when the button is dropped.
pub struct CorrectionButton {
    element: HtmlElement,
    bindings: Vec<EventBinding>,
    resize_observer: Option<ResizeObserver>,
    on_click: Closure<dyn FnMut(MouseEvent)>,
    reposition: Closure<dyn FnMut()>,
    on_resize: Closure<dyn FnMut(Array, ResizeObserver)>,
    disposed: bool,
}

impl CorrectionButton {
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl Affordance for CorrectionButton {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for binding in self.bindings.drain(..) {
            binding.unbind();
        }
        if let Some(observer) = self.resize_observer.take() {
            observer.disconnect();
        }
        self.element.remove();
    }
}

impl Drop for CorrectionButton {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn click_handler<S, P>(
    corrector: Rc<Corrector<WebDom, S, P>>,
    surface: Node,
) -> Closure<dyn FnMut(MouseEvent)>
where
    S: CorrectionService + 'static,
    P: Preview<WebDom> + 'static,
{
    let sequence = RequestSequence::new();

    Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        event.prevent_default();
        event.stop_propagation();

        let ticket = sequence.issue();
        let corrector = corrector.clone();
        let sequence = sequence.clone();
        let surface = surface.clone();

        spawn_local(async move {
            match corrector.correct(&surface, &sequence, ticket).await {
                Ok(outcome) => debug!(?outcome, "Correction finished"),
                Err(error) => debug!(%error, "Correction did not complete"),
            }
        });
    })
}

/// The top window, plus the surface's own window when it lives in a frame.
fn reposition_targets(dom: &WebDom, context: &Document) -> Vec<EventTarget> {
    let top = dom.window().clone();
    let mut targets = vec![EventTarget::from(top.clone())];

    if let Some(own) = context.default_view() {
        let same = AsRef::<JsValue>::as_ref(&own) == AsRef::<JsValue>::as_ref(&top);
        if !same {
            targets.push(EventTarget::from(own));
        }
    }
    targets
}

fn position(dom: &WebDom, surface: &Node, button: &HtmlElement) {
    let rect = absolute_rect(dom, surface);
    let size = Size::new(
        f64::from(button.offset_width()),
        f64::from(button.offset_height()),
    );
    let point = anchor_bottom_right(rect, size);

    if let Err(error) = set_styles(
        button,
        &[
            ("left", &format!("{}px", point.x)),
            ("top", &format!("{}px", point.y)),
        ],
    ) {
        warn!(%error, "Failed to position correction button");
    }
}
