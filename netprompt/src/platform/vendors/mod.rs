//! Built-in platform definitions.

pub mod datacom;
pub mod generic;
