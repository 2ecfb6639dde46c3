//! Continuous discovery of editable surfaces.
//!
//! A [`SurfaceWatcher`] is created once per page load. [`SurfaceWatcher::start`]
//! attaches to everything already present in the top document and its
//! accessible frames, then keeps one mutation observer per document for as
//! long as the page lives. Every newly added element goes through the same
//! three checks regardless of which document it landed in:
//!
//! 1. it is (or contains) a frame, so frames are discovered again;
//! 2. it is itself an editable surface;
//! 3. it contains editable surfaces.
//!
//! All bookkeeping (processed surfaces, watched frames, observers and
//! affordances) is owned by the watcher instance.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use tracing::{debug, info, warn};

use crate::{
    Affordance, AffordanceFactory, Attachment, AttachmentRegistry, DEFAULT_MARKER_ATTRIBUTE, Dom,
    DomError, NodeSet, RetouchError, is_editable_surface, is_frame,
};

struct WatcherState<D: Dom, F: AffordanceFactory<D>> {
    dom: D,
    factory: F,
    registry: RefCell<AttachmentRegistry<D>>,
    frames: RefCell<D::NodeSet>,
    observers: RefCell<Vec<D::Observer>>,
    affordances: RefCell<Vec<F::Affordance>>,
}

/// Discovers editable surfaces in a page and its frames, attaching one
/// affordance to each.
///
/// The watcher is a cheap handle; clones share the same state.
pub struct SurfaceWatcher<D, F>
where
    D: Dom,
    F: AffordanceFactory<D> + 'static,
{
    inner: Rc<WatcherState<D, F>>,
}

impl<D, F> Clone for SurfaceWatcher<D, F>
where
    D: Dom,
    F: AffordanceFactory<D> + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D, F> SurfaceWatcher<D, F>
where
    D: Dom,
    F: AffordanceFactory<D> + 'static,
{
    /// A watcher that marks surfaces with [`DEFAULT_MARKER_ATTRIBUTE`].
    pub fn new(dom: D, factory: F) -> Self {
        Self::with_marker(dom, factory, DEFAULT_MARKER_ATTRIBUTE)
    }

    /// A watcher that marks processed surfaces with the given attribute.
    pub fn with_marker(dom: D, factory: F, marker: impl Into<String>) -> Self {
        let registry = RefCell::new(AttachmentRegistry::new(&dom, marker));
        let frames = RefCell::new(dom.node_set());
        Self {
            inner: Rc::new(WatcherState {
                dom,
                factory,
                registry,
                frames,
                observers: RefCell::new(Vec::new()),
                affordances: RefCell::new(Vec::new()),
            }),
        }
    }

    fn from_state(inner: Rc<WatcherState<D, F>>) -> Self {
        Self { inner }
    }

    pub fn dom(&self) -> &D {
        &self.inner.dom
    }

    /// Observe the top document, then attach to everything already present
    /// in it and in its accessible frames.
    pub fn start(&self) -> Result<(), RetouchError> {
        let top = self.inner.dom.top_document();

        self.observe(&top)?;
        let attached = self.scan(&top);
        self.discover_frames(&top);

        info!(
            attached,
            total = self.affordance_count(),
            "Surface watcher started"
        );
        Ok(())
    }

    /// Attach to every qualifying surface currently in `document`.
    ///
    /// Returns how many new affordances were created.
    pub fn scan(&self, document: &D::Document) -> usize {
        let dom = &self.inner.dom;
        let Some(root) = dom.document_element(document) else {
            return 0;
        };

        let mut attached = 0;
        for candidate in std::iter::once(root.clone()).chain(dom.editable_candidates(&root)) {
            if is_editable_surface(dom, &candidate) && self.attach(&candidate, document) {
                attached += 1;
            }
        }
        attached
    }

    /// Visit every frame under `document` that is not watched yet.
    ///
    /// An accessible frame is recorded, scanned, observed and searched for
    /// frames of its own. An inaccessible one is skipped.
    pub fn discover_frames(&self, document: &D::Document) {
        let dom = &self.inner.dom;
        let Some(root) = dom.document_element(document) else {
            return;
        };

        for frame in dom.frames(&root) {
            self.visit_frame(&frame);
        }
    }

    fn visit_frame(&self, frame: &D::Node) {
        if self.is_frame_watched(frame) {
            return;
        }

        let frame_document = match self.inner.dom.frame_document(frame) {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!("Frame has no document yet");
                return;
            }
            Err(error) => {
                debug!(%error, "Cannot access frame");
                return;
            }
        };

        self.inner.frames.borrow_mut().insert(frame);

        let attached = self.scan(&frame_document);
        debug!(attached, "Scanned frame document");

        if let Err(error) = self.observe(&frame_document) {
            warn!(%error, "Failed to observe frame document");
        }

        self.discover_frames(&frame_document);
    }

    /// Process one batch of nodes added under `context`'s body.
    pub fn handle_additions(&self, context: &D::Document, nodes: Vec<D::Node>) {
        let dom = &self.inner.dom;

        for node in nodes {
            if !dom.is_element(&node) {
                continue;
            }

            if is_frame(dom, &node) || !dom.frames(&node).is_empty() {
                self.discover_frames(context);
            }

            if is_editable_surface(dom, &node) {
                self.attach(&node, context);
            }

            for child in dom.editable_candidates(&node) {
                if is_editable_surface(dom, &child) {
                    self.attach(&child, context);
                }
            }
        }
    }

    fn observe(&self, document: &D::Document) -> Result<(), RetouchError> {
        let dom = &self.inner.dom;
        let body = dom.body(document).ok_or(DomError::MissingBody)?;

        let state: Weak<WatcherState<D, F>> = Rc::downgrade(&self.inner);
        let context = document.clone();
        let observer = dom.observe_additions(
            &body,
            Box::new(move |nodes| {
                if let Some(state) = state.upgrade() {
                    SurfaceWatcher::from_state(state).handle_additions(&context, nodes);
                }
            }),
        )?;

        self.inner.observers.borrow_mut().push(observer);
        Ok(())
    }

    /// Returns whether a new affordance was created.
    fn attach(&self, surface: &D::Node, context: &D::Document) -> bool {
        let dom = &self.inner.dom;
        let decision = self.inner.registry.borrow_mut().try_attach(dom, surface);

        match decision {
            Ok(Attachment::Proceed) => match self.inner.factory.create(surface, context) {
                Ok(affordance) => {
                    self.inner.affordances.borrow_mut().push(affordance);
                    debug!("Attached correction affordance");
                    true
                }
                Err(error) => {
                    warn!(%error, "Failed to create correction affordance");
                    false
                }
            },
            Ok(Attachment::AlreadyAttached | Attachment::Hidden) => false,
            Err(error) => {
                warn!(%error, "Failed to record surface attachment");
                false
            }
        }
    }

    /// Number of live affordances.
    pub fn affordance_count(&self) -> usize {
        self.inner.affordances.borrow().len()
    }

    /// Number of live mutation observers (top document plus watched frames).
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Whether the frame already has a dedicated observer.
    pub fn is_frame_watched(&self, frame: &D::Node) -> bool {
        self.inner.frames.borrow().contains(frame)
    }

    /// Whether the surface has been processed, whether or not it got an
    /// affordance.
    pub fn is_processed(&self, surface: &D::Node) -> bool {
        self.inner
            .registry
            .borrow()
            .is_processed(&self.inner.dom, surface)
    }

    /// Disconnect every observer and dispose every affordance.
    ///
    /// Nothing calls this during a page's lifetime; affordances stay attached
    /// until the page unloads.
    pub fn shutdown(&self) {
        let observers: Vec<D::Observer> = self.inner.observers.borrow_mut().drain(..).collect();
        for observer in observers {
            self.inner.dom.disconnect(observer);
        }

        let affordances: Vec<F::Affordance> =
            self.inner.affordances.borrow_mut().drain(..).collect();
        for mut affordance in affordances {
            affordance.dispose();
        }

        info!("Surface watcher shut down");
    }
}
