//! Browser layer of the retouch extension.
//!
//! `retouch-extension` wires [`retouch_core`] to a real page. It implements
//! the [`Dom`](retouch_core::Dom) host abstraction over `web-sys`, supplies
//! the floating correction button and the diff panel, and routes `tracing`
//! output to the browser console.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────── top document ───────────────────────────┐
//! │  SurfaceWatcher<WebDom, ButtonFactory>                             │
//! │    │ scan + MutationObserver per document                          │
//! │    │   ──▸ <textarea> / [contenteditable]                          │
//! │    ▼                                                               │
//! │  CorrectionButton (one per surface, appended to the top body)      │
//! │    │ click ──▸ Corrector ──▸ HttpCorrectionService (POST { text }) │
//! │    │                 │                                             │
//! │    │                 └──▸ DiffPanel (preview mode only)            │
//! │    ▼                                                               │
//! │  surface text replaced                                             │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - **[`web`]**: `WebDom`, the `web-sys` implementation of `Dom`.
//! - **[`button`]**: the per-surface correction button.
//! - **[`panel`]**: the shared diff preview panel.
//! - **[`logging`]**: a `tracing-subscriber` writer backed by `console`.
//! - **[`content`]**: assembles the above into the running content script.
//! - **[`components`]**: the Leptos popup used to try the service by hand.
//!
//! # Entry points
//!
//! - **`content`** binary: injected into the top frame of every page by the
//!   extension manifest; calls `content::run`. Same-origin frames are
//!   reached from there.
//! - **`popup`** binary: mounts [`components::CorrectionProbe`].

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod web;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod button;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod panel;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod logging;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod content;

pub mod components;

#[cfg(all(test, target_arch = "wasm32", target_os = "unknown"))]
mod testing;
