//! Remote persistence of mirrored posts
//!
//! [`document`] renders an [`tgmirror_types::ExtractedPost`] into a front
//! matter document, [`client`] commits it to the repository files API.

pub mod client;
pub mod config;
pub mod document;
pub mod error;

pub use client::StoreClient;
pub use config::StoreConfig;
pub use document::{parse_document, FrontMatter, PostDocument, StoreAction};
pub use error::{DocumentError, StoreError};
