//! Content script entry point for the retouch extension.
//!
//! Compiled to WASM and injected into the top frame of every page. It finds
//! editable surfaces in the page and its same-origin frames and attaches a
//! correction button to each.
//!
//! # Configuration
//!
//! Overrides are baked in at build time through the `RETOUCH_CONFIG`
//! environment variable, a JSON object such as
//! `{ "presentation": "preview", "log_level": "debug" }`.

fn main() {
    // Nothing to watch outside a browser.
    #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
    {
        console_error_panic_hook::set_once();

        if let Err(error) = retouch_extension::content::run(option_env!("RETOUCH_CONFIG")) {
            tracing::error!(%error, "Content script failed to start");
        }
    }
}
