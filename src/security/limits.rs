//! Request body limits.
//!
//! The guard buffers the body to inspect it; the buffer is capped at the
//! configured size and anything larger is answered with 413. Any other
//! failure to read the body is a 400.

use std::error::Error as StdError;

use axum::body::{Body, Bytes};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;

use crate::error::ApiError;

/// Read the whole body, refusing more than `limit` bytes.
pub async fn buffer_body(body: Body, limit: usize) -> Result<Bytes, Response> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeded_limit(&e) {
            tracing::warn!(limit, "Request body too large");
            ApiError::PayloadTooLarge(limit).into_response()
        } else {
            tracing::warn!(error = %e, "Failed to read request body");
            ApiError::BadRequest("Failed to read request body".to_string()).into_response()
        }
    })
}

/// True when the length cap, not the body stream, ended the read.
fn exceeded_limit(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use futures_util::stream;

    #[tokio::test]
    async fn test_within_limit() {
        let bytes = buffer_body(Body::from("hello"), 5).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_over_limit() {
        let res = buffer_body(Body::from("hello!"), 5).await.unwrap_err();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_broken_stream_is_bad_request() {
        let chunks = vec![
            Ok(Bytes::from_static(b"hel")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer went away")),
        ];
        let body = Body::from_stream(stream::iter(chunks));

        let res = buffer_body(body, 1024).await.unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
