//! The floating diff preview.
//!
//! One [`DiffPanel`] is shared by every correction button on the page. It is
//! built on first use, refilled and moved next to the target surface on each
//! [`Preview::present`], and hidden again by its close button or by a click
//! anywhere outside it.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use retouch_core::{
    ADDED_CLASS, DiffSegment, Dom, DomError, Preview, REMOVED_CLASS, RetouchError, Size,
    Viewport, absolute_rect, place_panel, render_markup,
};
use tracing::debug;
use wasm_bindgen::{JsCast, prelude::Closure};
use web_sys::{Document, EventTarget, HtmlElement, MouseEvent, Node};

use crate::web::{EventBinding, WebDom, create_html_element, host_error, set_styles};

/// Gap between the panel and the surface it describes.
pub const PANEL_GAP: f64 = 8.0;

const PANEL_CLASS: &str = "retouch-diff-panel";
const STYLESHEET_ID: &str = "retouch-diff-style";

struct Mounted {
    root: HtmlElement,
    content: HtmlElement,
    bindings: Vec<EventBinding>,
    _on_close: Closure<dyn FnMut(MouseEvent)>,
    _on_outside: Closure<dyn FnMut(MouseEvent)>,
}

struct PanelState {
    dom: WebDom,
    z_index: u32,
    mounted: RefCell<Option<Mounted>>,
}

impl Drop for PanelState {
    fn drop(&mut self) {
        if let Some(mounted) = self.mounted.get_mut().take() {
            for binding in &mounted.bindings {
                binding.unbind();
            }
            mounted.root.remove();
        }
    }
}

/// Shared, lazily built diff preview panel.
#[derive(Clone)]
pub struct DiffPanel {
    inner: Rc<PanelState>,
}

impl DiffPanel {
    pub fn new(dom: WebDom, z_index: u32) -> Self {
        Self {
            inner: Rc::new(PanelState {
                dom,
                z_index,
                mounted: RefCell::new(None),
            }),
        }
    }

    /// Whether the panel is currently shown.
    pub fn is_open(&self) -> bool {
        self.inner
            .mounted
            .borrow()
            .as_ref()
            .and_then(|mounted| mounted.root.style().get_property_value("display").ok())
            .is_some_and(|display| display != "none")
    }

    /// Hide the panel. Its contents stay until the next preview.
    pub fn dismiss(&self) {
        hide(&self.inner);
    }

    fn ensure_mounted(&self) -> Result<(), DomError> {
        if self.inner.mounted.borrow().is_some() {
            return Ok(());
        }

        let document = self.inner.dom.top_document();
        let body = document.body().ok_or(DomError::MissingBody)?;
        install_stylesheet(&document)?;

        let root = create_html_element(&document, "div")?;
        root.set_class_name(PANEL_CLASS);
        let z_index = self.inner.z_index.to_string();
        set_styles(
            &root,
            &[
                ("display", "none"),
                ("position", "absolute"),
                ("z-index", &z_index),
                ("max-width", "480px"),
                ("padding", "8px 12px"),
                ("background", "#fff"),
                ("color", "#222"),
                ("border", "1px solid #bbb"),
                ("border-radius", "4px"),
                ("box-shadow", "0 2px 8px rgba(0, 0, 0, 0.2)"),
                ("font", "14px/1.4 sans-serif"),
                ("white-space", "pre-wrap"),
            ],
        )?;

        let close = create_html_element(&document, "button")?;
        close.set_text_content(Some("×"));
        close.set_attribute("type", "button").map_err(host_error)?;
        close.set_attribute("aria-label", "Close").map_err(host_error)?;
        set_styles(
            &close,
            &[
                ("float", "right"),
                ("margin-left", "8px"),
                ("border", "none"),
                ("background", "none"),
                ("cursor", "pointer"),
            ],
        )?;

        let content = create_html_element(&document, "div")?;
        root.append_child(&close).map_err(host_error)?;
        root.append_child(&content).map_err(host_error)?;

        let state = Rc::downgrade(&self.inner);
        let on_close = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            event.stop_propagation();
            if let Some(state) = state.upgrade() {
                hide(&state);
            }
        });

        let state = Rc::downgrade(&self.inner);
        let on_outside = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            dismiss_if_outside(&state, &event);
        });

        let bindings = vec![
            EventBinding::bind(close.unchecked_ref::<EventTarget>(), "click", &on_close)?,
            EventBinding::bind(document.unchecked_ref::<EventTarget>(), "click", &on_outside)?,
        ];

        body.append_child(&root).map_err(host_error)?;
        debug!("Diff panel mounted");

        *self.inner.mounted.borrow_mut() = Some(Mounted {
            root,
            content,
            bindings,
            _on_close: on_close,
            _on_outside: on_outside,
        });
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        let dom = &self.inner.dom;
        let window = dom.window();
        let scroll = dom.scroll_offset(&dom.top_document());
        let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport {
            scroll,
            size: Size::new(width, height),
        }
    }
}

impl Preview<WebDom> for DiffPanel {
    fn present(&self, surface: &Node, segments: &[DiffSegment]) -> Result<(), RetouchError> {
        self.ensure_mounted()?;

        let mounted = self.inner.mounted.borrow();
        let Some(mounted) = mounted.as_ref() else {
            return Err(RetouchError::Presentation("diff panel is not mounted".into()));
        };

        mounted.content.set_inner_html(&render_markup(segments));
        set_styles(&mounted.root, &[("display", "block")])?;

        let target = absolute_rect(&self.inner.dom, surface);
        let size = Size::new(
            f64::from(mounted.root.offset_width()),
            f64::from(mounted.root.offset_height()),
        );
        let position = place_panel(target, size, self.viewport(), PANEL_GAP);
        set_styles(
            &mounted.root,
            &[
                ("left", &format!("{}px", position.x)),
                ("top", &format!("{}px", position.y)),
            ],
        )?;

        debug!(segments = segments.len(), "Diff panel shown");
        Ok(())
    }
}

fn hide(state: &PanelState) {
    if let Some(mounted) = state.mounted.borrow().as_ref() {
        if let Err(error) = set_styles(&mounted.root, &[("display", "none")]) {
            debug!(%error, "Failed to hide diff panel");
        }
    }
}

fn dismiss_if_outside(state: &Weak<PanelState>, event: &MouseEvent) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let inside = {
        let mounted = state.mounted.borrow();
        let Some(mounted) = mounted.as_ref() else {
            return;
        };
        let target = event.target().map(|target| target.unchecked_into::<Node>());
        mounted.root.contains(target.as_ref())
    };
    if !inside {
        hide(&state);
    }
}

fn install_stylesheet(document: &Document) -> Result<(), DomError> {
    if document.get_element_by_id(STYLESHEET_ID).is_some() {
        return Ok(());
    }
    let Some(head) = document.head() else {
        return Ok(());
    };

    let style = create_html_element(document, "style")?;
    style.set_id(STYLESHEET_ID);
    style.set_text_content(Some(&format!(
        ".{ADDED_CLASS} {{ background: #d7f5dd; color: #0b5d1e; }}\n\
         .{REMOVED_CLASS} {{ background: #fbe0e0; color: #8a1c1c; text-decoration: line-through; }}"
    )));
    head.append_child(&style).map_err(host_error)?;
    Ok(())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use pretty_assertions::assert_eq;
    use retouch_core::SegmentKind;
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;
    use crate::testing::{append_to_body, count, page};

    fn segments() -> Vec<DiffSegment> {
        vec![
            DiffSegment::new(SegmentKind::Unchanged, "The "),
            DiffSegment::new(SegmentKind::Removed, "cat"),
            DiffSegment::new(SegmentKind::Added, "dog"),
        ]
    }

    #[wasm_bindgen_test]
    fn it_shows_the_diff_next_to_the_surface() {
        let dom = page();
        let document = dom.top_document();
        let surface = append_to_body(&dom, "textarea");
        let panel = DiffPanel::new(dom.clone(), 10);
        assert!(!panel.is_open());

        panel.present(&surface.clone().into(), &segments()).unwrap();

        assert!(panel.is_open());
        assert_eq!(count(&document, &format!(".{PANEL_CLASS}")), 1);
        assert_eq!(count(&document, &format!(".{PANEL_CLASS} .{REMOVED_CLASS}")), 1);
        assert_eq!(count(&document, &format!(".{PANEL_CLASS} .{ADDED_CLASS}")), 1);
        assert!(document.get_element_by_id(STYLESHEET_ID).is_some());

        panel.present(&surface.clone().into(), &segments()).unwrap();
        assert_eq!(count(&document, &format!(".{PANEL_CLASS}")), 1);

        panel.dismiss();
        assert!(!panel.is_open());

        drop(panel);
        assert_eq!(count(&document, &format!(".{PANEL_CLASS}")), 0);
        surface.remove();
    }

    #[wasm_bindgen_test]
    fn it_dismisses_on_clicks_outside_the_panel() {
        let dom = page();
        let document = dom.top_document();
        let surface = append_to_body(&dom, "textarea");
        let panel = DiffPanel::new(dom.clone(), 10);
        panel.present(&surface.clone().into(), &segments()).unwrap();

        let root = document
            .query_selector(&format!(".{PANEL_CLASS}"))
            .unwrap()
            .expect("panel is mounted")
            .unchecked_into::<HtmlElement>();
        root.click();
        assert!(panel.is_open());

        surface.click();
        assert!(!panel.is_open());

        drop(panel);
        surface.remove();
    }
}
