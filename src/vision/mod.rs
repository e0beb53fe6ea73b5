//! Image normalization for the multipart upload transport.
//!
//! Uploads whose declared content type or filename extension names a
//! HEIC/HEIF container are decoded and re-encoded as JPEG before they are
//! forwarded; everything else passes through untouched. The JSON transport
//! never goes through this module.
//!
//! # Submodules
//!
//! - `models`: Upload types, the difficult-format allow-lists and filename rules.
//! - `normalize`: Decode/re-encode logic.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod models;
pub mod normalize;

pub use models::{ConvertedImage, ImageUpload};
pub use normalize::{normalize, normalize_upload};
