//! Service layer for draftpress business logic.
//!
//! Content transforms and the operations that span more than one
//! repository live here. Services can be used by the CLI or the web server.

pub mod content;
pub mod publish;
pub mod rebuild;

pub use publish::PublishService;
pub use rebuild::{RebuildOutcome, SiteRebuilder};
