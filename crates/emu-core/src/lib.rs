//! Core traits for instruction-accurate emulation.
//!
//! Components expose their architectural state through [`Observable`] so a
//! front-end can examine a running machine without disturbing it.

mod observable;

pub use observable::{Observable, Value};
