//! draftpress - blog draft lifecycle management.
//!
//! Documents move through a flat-file store laid out under a project root:
//! imported drafts land in `admin/pending`, processed drafts (with generated
//! front matter) live in `admin/processed`, and published posts are written
//! to `content/posts` for an external static-site build to pick up.
//!
//! The crate is organised as:
//! - [`models`]: document and image asset records
//! - [`repository`]: the storage layout and the document and image stores
//! - [`services`]: content transforms, publishing and the rebuild hook
//! - [`server`]: the JSON HTTP API
//! - [`config`]: settings resolution
//! - [`cli`]: the command-line entry points

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod server;
pub mod services;
