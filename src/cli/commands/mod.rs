//! CLI command implementations.

pub mod document;
pub mod image;
pub mod serve;
pub mod site;
