//! Korean label enrichment for upstream analysis results.
//!
//! The upstream speaks in enumerated codes (`oval`, `summer`, `warm`,
//! `NO_FACE`, ...). This module adds `*_ko` companions next to them without
//! touching the original fields, so machine consumers keep working.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod mapper;
pub mod tables;

pub use mapper::{empty_response, localize, wants_localization, EMPTY_RESPONSE_CODE, STATUS_OK, TARGET_LANGUAGE};
