//! Test doubles: an in-memory DOM plus scripted collaborators.
//!
//! Enabled for this crate's own tests and, through the `helpers` feature, for
//! downstream crates and integration tests.

mod memory;
pub use memory::*;

mod doubles;
pub use doubles::*;
