//! At-most-once attachment bookkeeping.
//!
//! Two signals record that a surface has been processed: an identity set that
//! lives as long as the registry, and a marker attribute written onto the
//! element. Either one is enough to skip the surface. The marker survives a
//! lost registry (a frame document scanned again by a fresh watcher, say), the
//! set survives a page script that strips attributes.

use tracing::debug;

use crate::{Dom, DomError, NodeSet};

/// Default marker attribute written onto processed surfaces.
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-has-correction-button";

/// The registry's verdict for one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// First sighting of a visible surface; the caller should build an affordance.
    Proceed,
    /// Already processed earlier.
    AlreadyAttached,
    /// First sighting, but the surface is not rendered. It is recorded as
    /// processed and receives no affordance.
    Hidden,
}

impl Attachment {
    /// Whether an affordance should be created.
    pub fn proceeds(&self) -> bool {
        matches!(self, Attachment::Proceed)
    }
}

/// Tracks which surfaces have been processed.
pub struct AttachmentRegistry<D: Dom> {
    seen: D::NodeSet,
    marker: String,
}

impl<D: Dom> AttachmentRegistry<D> {
    pub fn new(dom: &D, marker: impl Into<String>) -> Self {
        Self {
            seen: dom.node_set(),
            marker: marker.into(),
        }
    }

    /// The marker attribute this registry writes.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether either signal says the surface was already processed.
    pub fn is_processed(&self, dom: &D, surface: &D::Node) -> bool {
        self.seen.contains(surface) || dom.attribute(surface, &self.marker).is_some()
    }

    /// Record the surface as processed and decide whether it gets an affordance.
    pub fn try_attach(&mut self, dom: &D, surface: &D::Node) -> Result<Attachment, DomError> {
        if self.is_processed(dom, surface) {
            return Ok(Attachment::AlreadyAttached);
        }

        self.seen.insert(surface);
        dom.set_attribute(surface, &self.marker, "true")?;

        let visibility = dom.visibility(surface);
        if !visibility.is_visible() {
            debug!(
                display_none = visibility.display_none,
                hidden = visibility.hidden,
                "Skipping hidden surface"
            );
            return Ok(Attachment::Hidden);
        }

        Ok(Attachment::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Visibility;
    use crate::helpers::MemoryDom;

    fn registry(dom: &MemoryDom) -> AttachmentRegistry<MemoryDom> {
        AttachmentRegistry::new(dom, DEFAULT_MARKER_ATTRIBUTE)
    }

    #[test]
    fn it_proceeds_exactly_once_per_surface() -> Result<()> {
        let dom = MemoryDom::new();
        let textarea = dom.append_element(dom.body_of(dom.top_document()), "textarea");
        let mut registry = registry(&dom);

        assert_eq!(registry.try_attach(&dom, &textarea)?, Attachment::Proceed);
        assert_eq!(
            registry.try_attach(&dom, &textarea)?,
            Attachment::AlreadyAttached
        );
        assert_eq!(
            dom.attribute(&textarea, DEFAULT_MARKER_ATTRIBUTE),
            Some("true".to_string())
        );
        Ok(())
    }

    #[test]
    fn it_respects_a_marker_left_by_an_earlier_registry() -> Result<()> {
        let dom = MemoryDom::new();
        let textarea = dom.append_element(dom.body_of(dom.top_document()), "textarea");

        assert!(registry(&dom).try_attach(&dom, &textarea)?.proceeds());
        assert_eq!(
            registry(&dom).try_attach(&dom, &textarea)?,
            Attachment::AlreadyAttached
        );
        Ok(())
    }

    #[test]
    fn it_respects_its_identity_set_when_the_marker_is_stripped() -> Result<()> {
        let dom = MemoryDom::new();
        let textarea = dom.append_element(dom.body_of(dom.top_document()), "textarea");
        let mut registry = registry(&dom);

        registry.try_attach(&dom, &textarea)?;
        dom.remove_attribute(textarea, DEFAULT_MARKER_ATTRIBUTE);

        assert_eq!(
            registry.try_attach(&dom, &textarea)?,
            Attachment::AlreadyAttached
        );
        Ok(())
    }

    #[test]
    fn it_marks_hidden_surfaces_without_proceeding() -> Result<()> {
        let dom = MemoryDom::new();
        let body = dom.body_of(dom.top_document());
        let collapsed = dom.append_element(body, "textarea");
        dom.set_visibility(
            collapsed,
            Visibility {
                display_none: true,
                hidden: false,
            },
        );
        let invisible = dom.append_element(body, "textarea");
        dom.set_visibility(
            invisible,
            Visibility {
                display_none: false,
                hidden: true,
            },
        );
        let mut registry = registry(&dom);

        assert_eq!(registry.try_attach(&dom, &collapsed)?, Attachment::Hidden);
        assert_eq!(registry.try_attach(&dom, &invisible)?, Attachment::Hidden);
        assert!(registry.is_processed(&dom, &collapsed));

        dom.set_visibility(collapsed, Visibility::VISIBLE);
        assert_eq!(
            registry.try_attach(&dom, &collapsed)?,
            Attachment::AlreadyAttached
        );
        Ok(())
    }
}
