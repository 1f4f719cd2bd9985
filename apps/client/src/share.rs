//! Shareable result links: `{origin}/result/{resultId}`.

use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::errors::AppError;

const RESULT_SEGMENT: &str = "result";

/// Builds the public link for a result. The id is percent-encoded as one path segment.
pub fn share_link(origin: &str, result_id: &str) -> Result<String, AppError> {
    if result_id.is_empty() {
        return Err(AppError::Validation("Result ID is required".to_string()));
    }

    let mut url = Url::parse(origin.trim_end_matches('/')).map_err(|e| {
        AppError::Validation(format!("Invalid application origin '{origin}': {e}"))
    })?;
    url.path_segments_mut()
        .map_err(|_| AppError::Validation(format!("Origin '{origin}' cannot carry a path")))?
        .pop_if_empty()
        .extend([RESULT_SEGMENT, result_id]);

    Ok(url.to_string())
}

/// Accepts a share link or a bare result id and returns the id.
pub fn result_id_from_link(input: &str) -> Result<String, AppError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::Validation("Result ID is required".to_string()));
    }

    // Ids may contain ':', so only web URLs count as links.
    let url = match Url::parse(input) {
        Ok(url) if url.has_host() || matches!(url.scheme(), "http" | "https") => url,
        _ => return Ok(input.to_string()),
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [.., RESULT_SEGMENT, id] => decode_segment(id),
        _ => Err(AppError::Validation(format!("'{input}' is not a result link"))),
    }
}

fn decode_segment(segment: &str) -> Result<String, AppError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|id| id.into_owned())
        .map_err(|_| AppError::Validation(format!("Result ID '{segment}' is not valid UTF-8")))
}
