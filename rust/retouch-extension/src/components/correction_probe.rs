//! A manual check against the correction service, independent of any page.

use leptos::prelude::*;
use retouch_core::{CorrectionService, HttpCorrectionService};

/// Run one correction and describe the result for display.
pub async fn check_text<S: CorrectionService>(service: &S, text: &str) -> String {
    match service.correct(text).await {
        Ok(corrected) => format!("Corrected: {corrected}"),
        Err(error) => error.to_string(),
    }
}

/// Text box, "Check" button and result line.
#[component]
pub fn CorrectionProbe(
    /// URL of the correction endpoint.
    #[prop(into)]
    endpoint: String,
) -> impl IntoView {
    let text = RwSignal::new(String::new());
    let result = RwSignal::new(Option::<String>::None);
    let pending = RwSignal::new(false);

    let check = move |_: leptos::ev::MouseEvent| {
        let input = text.get_untracked();
        let service = HttpCorrectionService::new(&endpoint);
        pending.set(true);

        leptos::task::spawn_local(async move {
            let message = match service {
                Ok(service) => check_text(&service, &input).await,
                Err(error) => error.to_string(),
            };
            result.set(Some(message));
            pending.set(false);
        });
    };

    view! {
        <div class="correction-probe">
            <textarea
                id="testText"
                rows="6"
                prop:value=move || text.get()
                on:input=move |event| text.set(event_target_value(&event))
            />
            <button
                id="checkBtn"
                disabled=move || pending.get()
                on:click=check
            >
                "Check"
            </button>
            <div id="result">
                {move || result.get().map(|message| view! { <p>{message}</p> })}
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use retouch_core::ServiceError;
    use retouch_core::helpers::ScriptedService;

    use super::*;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::wasm_bindgen_test;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_prefixes_the_corrected_text() {
        let service = ScriptedService::new().then_respond("Their going home.");

        let message = check_text(&service, "Thier going home.").await;

        assert_eq!(message, "Corrected: Their going home.");
        assert_eq!(service.requests(), vec!["Thier going home.".to_string()]);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_shows_the_error_when_the_service_fails() {
        let service = ScriptedService::new().then_fail(ServiceError::Status(503));

        let message = check_text(&service, "anything").await;

        assert_eq!(message, "Correction service returned status 503");
    }
}
