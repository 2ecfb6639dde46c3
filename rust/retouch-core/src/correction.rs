//! What happens when a correction affordance is activated.

use tracing::{debug, error, info, warn};

use crate::{
    CorrectionService, DiffSegment, Dom, Presentation, RequestSequence, RetouchError, Ticket,
    diff_words, is_text_area,
};

/// Acknowledgment shown when the service finds nothing to change.
pub const NO_CORRECTIONS_MESSAGE: &str = "No corrections found.";

/// Shows a word-level diff next to a surface.
pub trait Preview<D: Dom> {
    fn present(&self, surface: &D::Node, segments: &[DiffSegment]) -> Result<(), RetouchError>;
}

/// Result of one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionOutcome {
    /// The surface now holds the corrected text.
    Applied {
        original: String,
        corrected: String,
        previewed: bool,
    },
    /// The service returned the text unchanged (or nothing at all).
    Unchanged,
    /// A later activation of the same affordance was issued while this one
    /// was in flight; its response was dropped.
    Superseded,
}

/// The current text of a surface: a text area's value, the rendered text of
/// a content-editable element, or nothing.
pub fn read_surface_text<D: Dom>(dom: &D, surface: &D::Node) -> String {
    if is_text_area(dom, surface) {
        dom.text_value(surface).unwrap_or_default()
    } else if dom.is_content_editable(surface) {
        dom.inner_text(surface)
    } else {
        String::new()
    }
}

/// Replace the text of a surface the same way [`read_surface_text`] reads it.
pub fn write_surface_text<D: Dom>(
    dom: &D,
    surface: &D::Node,
    text: &str,
) -> Result<(), RetouchError> {
    if is_text_area(dom, surface) {
        dom.set_text_value(surface, text)?;
    } else if dom.is_content_editable(surface) {
        dom.set_inner_text(surface, text)?;
    }
    Ok(())
}

/// Runs the extract / correct / apply flow for any surface.
pub struct Corrector<D, S, P>
where
    D: Dom,
    S: CorrectionService,
    P: Preview<D>,
{
    dom: D,
    service: S,
    preview: P,
    presentation: Presentation,
}

impl<D, S, P> Corrector<D, S, P>
where
    D: Dom,
    S: CorrectionService,
    P: Preview<D>,
{
    pub fn new(dom: D, service: S, preview: P, presentation: Presentation) -> Self {
        Self {
            dom,
            service,
            preview,
            presentation,
        }
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Correct the surface's current text.
    ///
    /// `ticket` must come from `sequence`; if another ticket was issued by the
    /// time the service answers, the answer is discarded. Service failures are
    /// logged and returned, and leave the surface untouched.
    pub async fn correct(
        &self,
        surface: &D::Node,
        sequence: &RequestSequence,
        ticket: Ticket,
    ) -> Result<CorrectionOutcome, RetouchError> {
        let original = read_surface_text(&self.dom, surface);
        debug!(len = original.len(), "Requesting correction");

        let corrected = match self.service.correct(&original).await {
            Ok(corrected) => corrected,
            Err(e) => {
                error!(error = %e, "Correction request failed");
                return Err(e.into());
            }
        };

        if !sequence.is_current(ticket) {
            debug!("Dropping superseded correction");
            return Ok(CorrectionOutcome::Superseded);
        }

        if corrected.is_empty() || corrected == original {
            self.dom.acknowledge(NO_CORRECTIONS_MESSAGE);
            return Ok(CorrectionOutcome::Unchanged);
        }

        let mut previewed = false;
        if self.presentation == Presentation::Preview {
            let segments = diff_words(&original, &corrected);
            match self.preview.present(surface, &segments) {
                Ok(()) => previewed = true,
                Err(error) => warn!(%error, "Failed to present correction preview"),
            }
        }

        write_surface_text(&self.dom, surface, &corrected)?;
        info!(previewed, "Text corrected");

        Ok(CorrectionOutcome::Applied {
            original,
            corrected,
            previewed,
        })
    }
}
