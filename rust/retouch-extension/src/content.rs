//! Assembly of the running content script.

use retouch_core::{
    Corrector, HttpCorrectionService, LogLevel, RetouchConfig, RetouchError, SurfaceWatcher,
};
use tracing::info;

use crate::{button::ButtonFactory, logging, panel::DiffPanel, web::WebDom};

/// Start watching the page for editable surfaces.
///
/// `config` is an optional JSON document of [`RetouchConfig`] overrides.
/// The watcher stays alive for the rest of the page's lifetime.
pub fn run(config: Option<&str>) -> Result<(), RetouchError> {
    let config = match RetouchConfig::from_optional_json(config) {
        Ok(config) => config,
        Err(error) => {
            logging::init(LogLevel::default());
            return Err(error.into());
        }
    };
    logging::init(config.log_level);

    let dom = WebDom::new()?;
    let service = HttpCorrectionService::new(&config.endpoint)?;
    let panel = DiffPanel::new(dom.clone(), config.z_index);
    let corrector = Corrector::new(dom.clone(), service, panel, config.presentation);
    let factory = ButtonFactory::new(dom.clone(), corrector, config.label.clone(), config.z_index);

    let watcher = SurfaceWatcher::with_marker(dom, factory, config.marker_attribute.clone());
    watcher.start()?;

    info!(
        endpoint = %config.endpoint,
        presentation = ?config.presentation,
        "Content script running"
    );

    // Mutation callbacks only hold weak references to the watcher.
    std::mem::forget(watcher);
    Ok(())
}
