//! WASM entry point for the extension popup.
//!
//! Mounts [`CorrectionProbe`] to the popup body so the correction service can
//! be tried without a page.

use leptos::prelude::*;
use retouch_core::RetouchConfig;
use retouch_extension::components::CorrectionProbe;

fn main() {
    #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
    console_error_panic_hook::set_once();

    let endpoint = RetouchConfig::from_optional_json(option_env!("RETOUCH_CONFIG"))
        .unwrap_or_default()
        .endpoint;

    mount_to_body(move || view! { <CorrectionProbe endpoint=endpoint /> });
}
