//! Tests for the interpreter core
//!
//! Organized by component

mod helpers;
mod loader_tests;
mod registry_tests;
