//! Host-independent core of the retouch content script.
//!
//! The crate finds editable surfaces in a page and its frames, attaches one
//! correction affordance to each, and runs the correction round-trip when one
//! is activated. It never touches a real browser: every DOM access goes
//! through the [`Dom`] trait, implemented over `web-sys` by
//! `retouch-extension` and in memory by [`helpers::MemoryDom`].
//!
//! # Modules
//!
//! - **[`geometry`]**: absolute positions across nested frames, and the
//!   placement rules for the button and the diff panel.
//! - **[`classify`]**: the outermost-editable-ancestor rule.
//! - **[`registry`]**: at-most-once attachment per surface.
//! - **[`watcher`]**: initial scan plus continuous mutation-driven discovery.
//! - **[`correction`]**: extract, correct, preview and apply.
//! - **[`diff`]**: word-level diff and its HTML rendering.
//! - **[`service`]**: the HTTP correction client.

mod error;
pub use error::*;

mod dom;
pub use dom::*;

pub mod geometry;
pub use geometry::*;

pub mod classify;
pub use classify::*;

pub mod registry;
pub use registry::*;

mod affordance;
pub use affordance::*;

pub mod watcher;
pub use watcher::*;

pub mod diff;
pub use diff::*;

pub mod service;
pub use service::*;

pub mod correction;
pub use correction::*;

mod config;
pub use config::*;

#[cfg(any(test, feature = "helpers"))]
pub mod helpers;
