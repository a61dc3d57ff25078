//! Conversions between hyper messages and replay types

use std::fmt::Display;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderMap, HOST};
use hyper::http::uri::PathAndQuery;
use hyper::{Request, Response, StatusCode, Uri};

use crate::interceptor::MockResponse;
use crate::live_call::{LiveCall, RequestDescriptor, RequestOptions};
use crate::profile::Headers;
use crate::{Result, TundraError};

/// Turn an intercepted hyper request into a live call
///
/// Repeated header names are joined with `", "`. An empty body becomes
/// `None`. Origin-form targets (`/path`) are resolved against the `Host`
/// header as `http://<host>/path`.
///
/// # Errors
///
/// Returns error if the body exceeds `max_body_size`, cannot be read, or
/// a header or the body is not valid UTF-8
pub async fn live_call_from_request<B>(request: Request<B>, max_body_size: usize) -> Result<LiveCall>
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = request.into_parts();

    let mut headers = Headers::new();
    for (name, value) in &parts.headers {
        let value = value.to_str().map_err(|e| {
            TundraError::InvalidRequest(format!("Header '{name}' is not valid UTF-8: {e}"))
        })?;

        headers
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let url = request_url(&parts.uri, &parts.headers);

    let bytes = read_body(body, max_body_size).await?;
    let body = if bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
            TundraError::InvalidRequest(format!("Body is not valid UTF-8: {e}"))
        })?)
    };

    Ok(LiveCall::Combined(RequestDescriptor {
        url,
        options: RequestOptions {
            method: Some(parts.method.to_string()),
            body,
            headers,
        },
    }))
}

fn request_url(uri: &Uri, headers: &HeaderMap) -> String {
    if uri.authority().is_some() {
        return uri.to_string();
    }

    let path = uri.path_and_query().map_or("/", PathAndQuery::as_str);
    match headers.get(HOST).and_then(|host| host.to_str().ok()) {
        Some(host) if !host.is_empty() => format!("http://{host}{path}"),
        _ => uri.to_string(),
    }
}

/// Build the hyper response served for a matched call
///
/// # Errors
///
/// Returns error if the status code or a header is not valid HTTP
pub fn into_hyper_response(mock: &MockResponse) -> Result<Response<Full<Bytes>>> {
    let status = StatusCode::from_u16(mock.status)
        .map_err(|e| TundraError::Other(format!("Invalid status {}: {e}", mock.status)))?;

    let mut builder = Response::builder().status(status);
    for (name, value) in &mock.headers {
        builder = builder.header(name, value);
    }

    let body = mock.body.clone().map(Bytes::from).unwrap_or_default();

    builder
        .body(Full::new(body))
        .map_err(|e| TundraError::Other(format!("Failed to build response: {e}")))
}

/// Read a body, enforcing a size limit
///
/// # Errors
///
/// Returns error if body is too large or read fails
pub async fn read_body<B>(body: B, max_size: usize) -> Result<Bytes>
where
    B: Body,
    B::Error: Display,
{
    let collected = body
        .collect()
        .await
        .map_err(|e| TundraError::Other(format!("Failed to read body: {e}")))?;

    let bytes = collected.to_bytes();

    if bytes.len() > max_size {
        return Err(TundraError::DataTooLarge {
            size: bytes.len(),
            limit: max_size,
        });
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingConfig;
    use crate::network::MAX_BODY_SIZE;
    use crate::profile::{ProfileEntry, RecordedRequest, RecordedResponse};
    use crate::replay::Replayer;
    use http_body_util::Empty;

    #[tokio::test]
    async fn test_live_call_from_request() {
        let request = Request::builder()
            .method("POST")
            .uri("http://api.test/login")
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(r#"{"user":"a"}"#)))
            .unwrap();

        let call = live_call_from_request(request, 1024).await.unwrap().normalize();
        let options = call.options.unwrap();

        assert_eq!(call.url, "http://api.test/login");
        assert_eq!(options.method.as_deref(), Some("POST"));
        assert_eq!(options.body.as_deref(), Some(r#"{"user":"a"}"#));
        assert_eq!(options.headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_repeated_headers_joined() {
        let request = Request::builder()
            .uri("/a")
            .header("Accept", "text/plain")
            .header("Accept", "application/json")
            .body(Empty::<Bytes>::new())
            .unwrap();

        let call = live_call_from_request(request, 1024).await.unwrap().normalize();
        let options = call.options.unwrap();

        assert_eq!(options.headers["accept"], "text/plain, application/json");
        assert!(options.body.is_none());
        assert_eq!(options.method.as_deref(), Some("GET"));
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let request = Request::builder()
            .uri("/a")
            .body(Full::new(Bytes::from("test data that is too long")))
            .unwrap();

        let result = live_call_from_request(request, 5).await;
        assert!(matches!(result, Err(TundraError::DataTooLarge { limit: 5, .. })));
    }

    #[tokio::test]
    async fn test_invalid_utf8_body() {
        let request = Request::builder()
            .uri("/a")
            .body(Full::new(Bytes::from_static(&[0xff, 0xfe])))
            .unwrap();

        let result = live_call_from_request(request, 1024).await;
        assert!(matches!(result, Err(TundraError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_origin_form_resolved_against_host() {
        let request = Request::builder()
            .uri("/x?page=2")
            .header("host", "api.test")
            .body(Empty::<Bytes>::new())
            .unwrap();

        let call = live_call_from_request(request, MAX_BODY_SIZE).await.unwrap();
        assert_eq!(call.normalize().url, "http://api.test/x?page=2");
    }

    #[tokio::test]
    async fn test_origin_form_without_host_kept() {
        let request = Request::builder()
            .uri("/x")
            .body(Empty::<Bytes>::new())
            .unwrap();

        let call = live_call_from_request(request, MAX_BODY_SIZE).await.unwrap();
        assert_eq!(call.normalize().url, "/x");
    }

    #[tokio::test]
    async fn test_server_side_request_replayed() {
        let profile = vec![ProfileEntry::new(
            RecordedRequest::new("GET", "http://api.test/x"),
            RecordedResponse::new(200, Some("recorded".to_string())),
        )];
        let mut replayer = Replayer::new();
        replayer.load(&profile, MatchingConfig::default().debugging(false));

        let request = Request::builder()
            .uri("/x")
            .header("host", "api.test")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let call = live_call_from_request(request, MAX_BODY_SIZE).await.unwrap();

        let mock = replayer.handle(&call).await.unwrap();
        let response = into_hyper_response(&mock).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response.into_body(), MAX_BODY_SIZE).await.unwrap();
        assert_eq!(body, Bytes::from("recorded"));
    }

    #[test]
    fn test_into_hyper_response() {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        let mock = MockResponse {
            status: 201,
            headers,
            body: Some("created".to_string()),
        };

        let response = into_hyper_response(&mock).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "text/plain");
    }

    #[test]
    fn test_into_hyper_response_invalid_status() {
        let mock = MockResponse {
            status: 42,
            headers: Headers::new(),
            body: None,
        };

        assert!(into_hyper_response(&mock).is_err());
    }
}
