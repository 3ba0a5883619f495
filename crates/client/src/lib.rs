//! Client code for hubble.
//!
//! This crate provides the HTTP fetch pipeline, metadata and image-size
//! extraction, and the resolution strategies the server exposes.

pub mod fetch;
pub mod image;
pub mod meta;
pub mod strategy;

pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use image::{ImageSize, image_size};
pub use meta::{PageMeta, extract_meta};
pub use strategy::{ImageInfo, ImageResolver, MetaInfo, MetaResolver, MimeInfo, MimeResolver};
