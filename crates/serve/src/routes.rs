//! Route handlers

use crate::ServeState;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::fmt::Write as _;
use tower::ServiceExt;
use tower_http::services::ServeFile;

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadQuery {
    /// Overrides the attachment file name
    name: Option<String>,
}

/// `GET /:name`
pub(crate) async fn download(
    State(state): State<ServeState>,
    Path(name): Path<String>,
    Query(query): Query<DownloadQuery>,
    request: Request,
) -> Response {
    let Some(path) = state.artifacts.get(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !path.is_file() {
        tracing::debug!(name = %name, path = %path.display(), "artifact missing");
        return StatusCode::NOT_FOUND.into_response();
    }

    let filename = query
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| path.file_name().map(|f| f.to_string_lossy().into_owned()))
        .unwrap_or(name);

    let mut response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };

    if response.status().is_success() {
        if let Ok(value) = HeaderValue::from_str(&content_disposition(&filename)) {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }
    response
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
pub(crate) fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut value = format!("attachment; filename=\"{fallback}\"");
    if fallback != filename {
        value.push_str("; filename*=UTF-8''");
        for byte in filename.bytes() {
            if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
                value.push(char::from(byte));
            } else {
                let _ = write!(value, "%{byte:02X}");
            }
        }
    }
    value
}
