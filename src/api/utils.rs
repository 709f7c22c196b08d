//! API utility functions
//!
//! Stateless helpers for decoding write requests, kept out of the handlers so
//! they can be unit tested.

use axum::http::{HeaderMap, header};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

/// Parses and validates Content-Type header for application/json
///
/// Accepts `application/json`, optionally with a charset parameter. Rejects
/// lookalikes such as `application/jsonp` or `text/json`.
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        ApiError::InvalidPayload(format!("invalid Content-Type: {}", content_type))
    })?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Checks headers, reads the body under `max_size` and decodes it as JSON
///
/// Reading stops as soon as `max_size` is exceeded. Decompression is handled
/// by `RequestDecompressionLayer` before this runs, so the limit applies to
/// the decompressed bytes.
pub async fn read_json_body<T: DeserializeOwned>(
    headers: &HeaderMap,
    body: axum::body::Body,
    max_size: usize,
) -> Result<T, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;
    parse_content_type(content_type)?;

    let data = Limited::new(body, max_size)
        .collect()
        .await
        .map_err(|err| {
            if err.is::<LengthLimitError>() {
                ApiError::PayloadTooLarge(max_size)
            } else {
                ApiError::InvalidPayload(err.to_string())
            }
        })?
        .to_bytes();

    Ok(serde_json::from_slice(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde::Deserialize;

    #[test]
    fn test_parse_content_type_valid() {
        assert!(parse_content_type("application/json").is_ok());
        assert!(parse_content_type("application/json; charset=utf-8").is_ok());
        assert!(parse_content_type("application/json; charset=UTF-8").is_ok());
    }

    #[test]
    fn test_parse_content_type_invalid() {
        assert!(parse_content_type("application/jsonp").is_err());
        assert!(parse_content_type("text/json").is_err());
        assert!(parse_content_type("text/plain").is_err());
        assert!(parse_content_type("invalid").is_err());
        assert!(parse_content_type("").is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u32,
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    #[tokio::test]
    async fn test_read_json_body() {
        let probe: Probe = read_json_body(&json_headers(), r#"{"value": 7}"#.into(), 1024)
            .await
            .unwrap();
        assert_eq!(probe.value, 7);
    }

    #[tokio::test]
    async fn test_read_json_body_stops_at_limit_on_streamed_body() {
        // Chunks keep coming after the limit; reading must give up early.
        let chunks = (0..1024).map(|_| Ok::<_, std::io::Error>(vec![b' '; 1024]));
        let body = axum::body::Body::from_stream(futures::stream::iter(chunks));

        let result = read_json_body::<Probe>(&json_headers(), body, 4096).await;
        assert!(matches!(result, Err(ApiError::PayloadTooLarge(4096))));
    }

    #[tokio::test]
    async fn test_read_json_body_rejections() {
        let missing = read_json_body::<Probe>(&HeaderMap::new(), "{}".into(), 1024).await;
        assert!(matches!(missing, Err(ApiError::InvalidPayload(_))));

        let too_big =
            read_json_body::<Probe>(&json_headers(), r#"{"value": 7}"#.into(), 4).await;
        assert!(matches!(too_big, Err(ApiError::PayloadTooLarge(4))));

        let exact = read_json_body::<Probe>(&json_headers(), r#"{"value":7}"#.into(), 11).await;
        assert_eq!(exact.unwrap().value, 7);

        let malformed = read_json_body::<Probe>(&json_headers(), "{".into(), 1024).await;
        assert!(matches!(malformed, Err(ApiError::InvalidPayload(_))));
    }
}
