//! Core data model: bindings and GRUU entries (§3).

pub mod binding;
pub mod gruu;

pub use binding::{Binding, BindingClass, BindingFlags, Expiry};
pub use gruu::GruuEntry;
