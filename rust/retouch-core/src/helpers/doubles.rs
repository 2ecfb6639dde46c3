use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{DocumentId, MemoryDom, NodeId};
use crate::{
    Affordance, AffordanceFactory, CorrectionService, DiffSegment, Dom, Preview, RetouchError,
    ServiceError,
};

/// Attribute carried by the stand-in controls [`RecordingFactory`] inserts.
pub const CONTROL_ATTRIBUTE: &str = "data-retouch-control";

#[derive(Default)]
struct FactoryLog {
    created: Vec<NodeId>,
    disposed: usize,
    failing: Option<NodeId>,
}

/// [`AffordanceFactory`] for [`MemoryDom`] that inserts a `<button>` into the
/// top document body for every surface and records what it did.
#[derive(Clone)]
pub struct RecordingFactory {
    dom: MemoryDom,
    log: Rc<RefCell<FactoryLog>>,
}

impl RecordingFactory {
    pub fn new(dom: &MemoryDom) -> Self {
        Self {
            dom: dom.clone(),
            log: Rc::default(),
        }
    }

    /// A factory that refuses to build an affordance for `surface`.
    pub fn failing_for(dom: &MemoryDom, surface: NodeId) -> Self {
        let factory = Self::new(dom);
        factory.log.borrow_mut().failing = Some(surface);
        factory
    }

    /// Surfaces that received an affordance, in attachment order.
    pub fn created(&self) -> Vec<NodeId> {
        self.log.borrow().created.clone()
    }

    /// How many affordances were created for `surface`.
    pub fn count_for(&self, surface: NodeId) -> usize {
        self.log
            .borrow()
            .created
            .iter()
            .filter(|id| **id == surface)
            .count()
    }

    /// How many affordances have been disposed.
    pub fn disposed(&self) -> usize {
        self.log.borrow().disposed
    }

    /// Stand-in controls currently in the top document body.
    pub fn controls(&self) -> Vec<NodeId> {
        let body = self.dom.body_of(self.dom.top_document());
        self.dom
            .children(body)
            .into_iter()
            .filter(|child| self.dom.attribute(child, CONTROL_ATTRIBUTE).is_some())
            .collect()
    }
}

/// The stand-in control built by [`RecordingFactory`].
pub struct RecordedAffordance {
    dom: MemoryDom,
    control: NodeId,
    log: Rc<RefCell<FactoryLog>>,
}

impl Affordance for RecordedAffordance {
    fn dispose(&mut self) {
        self.dom.detach(self.control);
        self.log.borrow_mut().disposed += 1;
    }
}

impl AffordanceFactory<MemoryDom> for RecordingFactory {
    type Affordance = RecordedAffordance;

    fn create(
        &self,
        surface: &NodeId,
        _context: &DocumentId,
    ) -> Result<RecordedAffordance, RetouchError> {
        if self.log.borrow().failing == Some(*surface) {
            return Err(RetouchError::Presentation("scripted failure".into()));
        }

        // Controls always live in the top document, whichever document the
        // surface came from.
        let body = self.dom.body_of(self.dom.top_document());
        let control = self.dom.append_element(body, "button");
        self.dom
            .set_attribute_value(control, CONTROL_ATTRIBUTE, &format!("{surface:?}"));

        self.log.borrow_mut().created.push(*surface);
        Ok(RecordedAffordance {
            dom: self.dom.clone(),
            control,
            log: self.log.clone(),
        })
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<String, ServiceError>>,
    requests: Vec<String>,
}

/// [`CorrectionService`] that replays a fixed sequence of answers.
#[derive(Clone, Default)]
pub struct ScriptedService {
    script: Arc<Mutex<Script>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer.
    pub fn then_respond(self, corrected: &str) -> Self {
        self.push(Ok(corrected.to_string()));
        self
    }

    /// Queue a failure.
    pub fn then_fail(self, error: ServiceError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, response: Result<String, ServiceError>) {
        if let Ok(mut script) = self.script.lock() {
            script.responses.push_back(response);
        }
    }

    /// Every text sent to the service so far.
    pub fn requests(&self) -> Vec<String> {
        self.script
            .lock()
            .map(|script| script.requests.clone())
            .unwrap_or_default()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl CorrectionService for ScriptedService {
    async fn correct(&self, text: &str) -> Result<String, ServiceError> {
        let mut script = self
            .script
            .lock()
            .map_err(|e| ServiceError::Unreachable(e.to_string()))?;
        script.requests.push(text.to_string());
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Unreachable("no scripted response".into())))
    }
}

#[derive(Default)]
struct PreviewLog {
    presented: Vec<(NodeId, Vec<DiffSegment>)>,
    failing: bool,
}

/// [`Preview`] for [`MemoryDom`] that records what it was asked to show.
#[derive(Clone, Default)]
pub struct RecordingPreview {
    log: Rc<RefCell<PreviewLog>>,
}

impl RecordingPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// A preview that always fails to present.
    pub fn failing() -> Self {
        let preview = Self::default();
        preview.log.borrow_mut().failing = true;
        preview
    }

    pub fn presented(&self) -> Vec<(NodeId, Vec<DiffSegment>)> {
        self.log.borrow().presented.clone()
    }
}

impl Preview<MemoryDom> for RecordingPreview {
    fn present(&self, surface: &NodeId, segments: &[DiffSegment]) -> Result<(), RetouchError> {
        let mut log = self.log.borrow_mut();
        if log.failing {
            return Err(RetouchError::Presentation("scripted preview failure".into()));
        }
        log.presented.push((*surface, segments.to_vec()));
        Ok(())
    }
}
