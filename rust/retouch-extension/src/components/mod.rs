//! Leptos UI for the extension popup.
//!
//! ```text
//! CorrectionProbe
//! ├── textarea      (text to check)
//! ├── "Check"       (sends it to the correction service)
//! └── result        ("Corrected: ..." or the error)
//! ```

mod correction_probe;

pub use correction_probe::*;
