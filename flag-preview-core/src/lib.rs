#![doc = "flag-preview-core: core logic library for flag-preview."]

//! This crate resolves Contentstack content references stored in feature-flag
//! variations, fetches them from the delivery API and normalizes them into
//! preview records for a flag-management UI.
//!
//! # Modules
//! - [`lookup`]: content-type discovery for entries without a content type.
//! - [`client`]: the [`client::DeliveryApi`] seam and its `reqwest` implementation.
//! - [`fetch`]: one-call retrieval of an `entry`/`asset` payload.
//! - [`normalize`]: payload → [`model::PreviewRecord`].
//! - [`preview`]: the resolve → fetch → normalize pipeline.
//! - [`handler`]: framework-agnostic handling of flag-preview requests.
//!
//! All network calls are sequential and request-scoped; nothing is cached.

pub mod client;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod lookup;
pub mod model;
pub mod normalize;
pub mod preview;

pub use error::{ErrorKind, PreviewError};
