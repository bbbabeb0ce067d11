//! Data models for documents and image assets.

mod document;
mod image;

pub use document::{
    Document, DocumentSource, DocumentStatus, FrontMatter, ImageRef, InlineImage, MetadataPatch,
};
pub use image::{ImageAsset, ImageCategory, NewImage};
