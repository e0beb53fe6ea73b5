// Upstream analysis service client module
// Author: kelexine (https://github.com/kelexine)

mod client;

pub use client::AnalysisClient;

use axum::http::HeaderMap;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// The two analyses offered by the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    PersonalColor,
    FaceShape,
}

impl Analysis {
    pub fn json_path(&self) -> &'static str {
        match self {
            Analysis::PersonalColor => "/analyze",
            Analysis::FaceShape => "/face-shape",
        }
    }

    pub fn file_path(&self) -> &'static str {
        match self {
            Analysis::PersonalColor => "/analyze/file",
            Analysis::FaceShape => "/face-shape/file",
        }
    }

    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Analysis::PersonalColor => "personal_color",
            Analysis::FaceShape => "face_shape",
        }
    }

    /// Filename and content type for a file part that arrived without them.
    fn part_defaults(&self) -> (&'static str, &'static str) {
        match self {
            Analysis::PersonalColor => ("upload.bin", "application/octet-stream"),
            Analysis::FaceShape => ("upload.jpg", "image/jpeg"),
        }
    }
}

/// Correlation and locale headers relayed to the upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayHeaders {
    pub trace_id: Option<String>,
    pub accept_language: Option<String>,
}

impl RelayHeaders {
    pub fn new(trace_id: Option<String>, accept_language: Option<String>) -> Self {
        Self {
            trace_id: non_blank(trace_id),
            accept_language: non_blank(accept_language),
        }
    }

    /// Pick the relay headers out of an inbound request.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self::new(read(TRACE_ID_HEADER), read(axum::http::header::ACCEPT_LANGUAGE.as_str()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Query flags of the multipart transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOptions {
    pub debug: bool,
    pub exif_correction: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            debug: false,
            exif_correction: true,
        }
    }
}
