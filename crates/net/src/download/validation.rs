//! URL validation and HTTP response validation for downloads

use arcdl_errors::{Error, NetworkError};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_RANGE};
use reqwest::StatusCode;
use url::Url;

/// Validate URL and check for supported protocols
///
/// # Errors
///
/// Returns `InvalidUrl` if the string does not parse and
/// `UnsupportedProtocol` for anything but http and https.
pub fn validate_url(url: &str) -> Result<Url, Error> {
    let parsed = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(NetworkError::UnsupportedProtocol {
            protocol: scheme.to_string(),
        }
        .into()),
    }
}

/// Parsed `Content-Range` header
///
/// `bytes 100-199/1000` has a start, end and total; `bytes */1000` (sent
/// with 416) only a total; `bytes 0-99/*` has no total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub range: Option<(u64, u64)>,
    pub total: Option<u64>,
}

impl ContentRange {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.trim().strip_prefix("bytes")?.trim_start();
        let (range, total) = rest.split_once('/')?;

        let total = match total.trim() {
            "*" => None,
            t => Some(t.parse().ok()?),
        };
        let range = match range.trim() {
            "*" => None,
            r => {
                let (start, end) = r.split_once('-')?;
                let start: u64 = start.trim().parse().ok()?;
                let end: u64 = end.trim().parse().ok()?;
                if end < start {
                    return None;
                }
                Some((start, end))
            }
        };
        Some(Self { range, total })
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
    }
}

/// `Content-Length` read from the header itself
///
/// Read from the header rather than the body size hint, which is zero for
/// HEAD responses.
pub(super) fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// How a server answered a `Range: bytes=<offset>-` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RangeOutcome {
    /// 206 starting at the requested offset; append the body
    Honoured { total: Option<u64> },
    /// 200 with the whole body; stream from byte 0 into a fresh file
    Ignored { total: Option<u64> },
    /// 416 reporting a size equal to the offset; the partial file is complete
    AlreadyComplete,
    /// 416 for any other size, or a 206 for the wrong range; start over
    Restart,
}

/// Classify the response to a range request
///
/// # Errors
///
/// Returns `HttpError` for any status other than 200, 206 and 416.
pub(super) fn classify_range_response(
    status: StatusCode,
    headers: &HeaderMap,
    offset: u64,
) -> Result<RangeOutcome, Error> {
    let content_range = ContentRange::from_headers(headers);

    match status {
        StatusCode::PARTIAL_CONTENT => match content_range {
            Some(ContentRange {
                range: Some((start, _)),
                total,
            }) if start == offset => Ok(RangeOutcome::Honoured {
                total: total.or_else(|| content_length(headers).map(|len| offset + len)),
            }),
            Some(_) => Ok(RangeOutcome::Restart),
            None => Ok(RangeOutcome::Honoured {
                total: content_length(headers).map(|len| offset + len),
            }),
        },
        StatusCode::OK => Ok(RangeOutcome::Ignored {
            total: content_length(headers),
        }),
        StatusCode::RANGE_NOT_SATISFIABLE => match content_range.and_then(|cr| cr.total) {
            Some(total) if total == offset => Ok(RangeOutcome::AlreadyComplete),
            _ => Ok(RangeOutcome::Restart),
        },
        other => Err(status_error(other)),
    }
}

/// Require a 2xx status for a plain GET
pub(super) fn ensure_success(status: StatusCode) -> Result<(), Error> {
    if status.is_success() {
        Ok(())
    } else {
        Err(status_error(status))
    }
}

fn status_error(status: StatusCode) -> Error {
    NetworkError::HttpError {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    }
    .into()
}
