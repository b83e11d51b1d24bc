//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body size checks, body decoding,
//! route matching, handler invocation and access logging.

use chrono::Utc;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, REFERER, USER_AGENT};
use hyper::{HeaderMap, Method, Request, Response, Uri};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::decode::{decode_body, BodyFormat};
use super::error::ApiError;
use super::tasks::{self, TaskRequest};
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{extract_query_params, Router};
use crate::store::Store;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let http_config = &state.config.http;
    let logging = &state.config.logging;

    let mut entry = access_entry(&req, peer_addr);
    logger::log_headers_count(req.headers().len(), logging.show_headers);

    let mut response = if *req.method() == Method::OPTIONS && http_config.enable_cors {
        http::build_options_response()
    } else if let Some(err) = check_body_size(req.headers(), http_config.max_body_size) {
        err.into_response()
    } else {
        let (parts, body) = req.into_parts();
        match read_body(body, http_config.max_body_size).await {
            Ok(bytes) => {
                dispatch(
                    &parts.method,
                    request_target(&parts.uri),
                    header_str(&parts.headers, CONTENT_TYPE.as_str()),
                    &bytes,
                    &state.router,
                    &state.store,
                )
                .await
            }
            Err(err) => err.into_response(),
        }
    };

    http::finalize_response(&mut response, &http_config.server_name, http_config.enable_cors);

    if logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.access_log_format);
    }

    Ok(response)
}

/// Decode the body, match the route and run its handler.
///
/// Unmatched requests get a 404 `{"message":"Route not found!"}`.
pub async fn dispatch(
    method: &Method,
    target: &str,
    content_type: Option<&str>,
    body: &[u8],
    router: &Router,
    store: &Store,
) -> Response<Full<Bytes>> {
    let payload = decode_body(BodyFormat::from_content_type(content_type), body, Utc::now());

    let Some((route, matched)) = router.dispatch(method, target) else {
        logger::log_route_not_found(method.as_str(), target);
        return ApiError::RouteNotFound.into_response();
    };

    let request = TaskRequest {
        params: matched.params,
        query: extract_query_params(matched.query.as_deref()),
        body: payload,
    };

    match tasks::handle(route.action, request, store).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Reject early when Content-Length already exceeds the limit
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<ApiError> {
    let size_str = header_str(headers, "content-length")?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(ApiError::PayloadTooLarge)
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
        _ => None,
    }
}

/// Collect the body, enforcing the limit for chunked uploads as well
async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(ApiError::PayloadTooLarge),
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(ApiError::BodyRead)
        }
    }
}

/// Path plus query string, as matched by route patterns
fn request_target(uri: &Uri) -> &str {
    uri.path_and_query()
        .map_or_else(|| uri.path(), hyper::http::uri::PathAndQuery::as_str)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn access_entry(req: &Request<Incoming>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header_str(req.headers(), REFERER.as_str()).map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), USER_AGENT.as_str()).map(ToString::to_string);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use serde_json::Value;

    struct Harness {
        _dir: tempfile::TempDir,
        store: Store,
        router: Router,
    }

    impl Harness {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = Store::open(dir.path().join("db.json")).await;
            Self {
                _dir: dir,
                store,
                router: Router::tasks(),
            }
        }

        async fn call_with(
            &self,
            method: Method,
            target: &str,
            content_type: Option<&str>,
            body: &str,
        ) -> (StatusCode, Value) {
            let response = dispatch(
                &method,
                target,
                content_type,
                body.as_bytes(),
                &self.router,
                &self.store,
            )
            .await;
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn call(&self, method: Method, target: &str, body: &str) -> (StatusCode, Value) {
            self.call_with(method, target, Some("application/json"), body)
                .await
        }

        async fn list(&self, target: &str) -> Vec<Value> {
            let (status, body) = self.call(Method::GET, target, "").await;
            assert_eq!(status, StatusCode::OK);
            body.as_array().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let h = Harness::new().await;

        let (status, body) = h
            .call(Method::POST, "/tasks", r#"{"title":"A","description":"B"}"#)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, Value::Null);

        let found = h.list("/tasks?search=A").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["title"], "A");
        assert!(found[0]["completed_at"].is_null());
        let id = found[0]["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let (status, _) = h
            .call(Method::PATCH, &format!("/tasks/{id}/complete"), "")
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let all = h.list("/tasks").await;
        assert!(!all[0]["completed_at"].is_null());
        assert_eq!(all[0]["title"], "A");
        assert_eq!(all[0]["description"], "B");

        let (status, _) = h.call(Method::DELETE, &format!("/tasks/{id}"), "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.list("/tasks").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_title_and_description() {
        let h = Harness::new().await;

        for body in [r#"{"title":"A"}"#, r#"{"title":"","description":"B"}"#, "", "not json"] {
            let (status, body) = h.call(Method::POST, "/tasks", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "title and description are required");
        }
        assert!(h.list("/tasks").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_tasks_inserts_in_bulk() {
        let h = Harness::new().await;

        let (status, _) = h
            .call(
                Method::POST,
                "/tasks",
                r#"{"tasks":[{"title":"one","description":"1"},{"title":"two","description":"2"}]}"#,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let all = h.list("/tasks").await;
        assert_eq!(all.len(), 2);
        assert_ne!(all[0]["id"], all[1]["id"]);
        assert_eq!(all[1]["title"], "two");
    }

    #[tokio::test]
    async fn test_search_matches_title_or_description() {
        let h = Harness::new().await;
        for (title, description) in [("Buy milk", "groceries"), ("Fix bike", "tyre"), ("Call", "BUY stamps")] {
            h.call(
                Method::POST,
                "/tasks",
                &serde_json::json!({ "title": title, "description": description }).to_string(),
            )
            .await;
        }

        let found = h.list("/tasks?search=buy").await;
        let titles: Vec<_> = found.iter().map(|t| t["title"].as_str().unwrap()).collect();
        assert_eq!(titles, ["Buy milk", "Call"]);

        assert_eq!(h.list("/tasks?search=").await.len(), 3);
        assert_eq!(h.list("/tasks?other=x").await.len(), 3);
        assert!(h.list("/tasks?search=nothing").await.is_empty());
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let h = Harness::new().await;
        h.call(Method::POST, "/tasks", r#"{"title":"A","description":"B"}"#)
            .await;
        let id = h.list("/tasks").await[0]["id"].as_str().unwrap().to_string();

        let (status, _) = h
            .call(Method::PUT, &format!("/tasks/{id}"), r#"{"title":"A2"}"#)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = h
            .call(
                Method::PUT,
                &format!("/tasks/{id}"),
                r#"{"title":"","description":"B2"}"#,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let task = &h.list("/tasks").await[0];
        assert_eq!(task["title"], "A2");
        assert_eq!(task["description"], "B2");
    }

    #[tokio::test]
    async fn test_update_errors() {
        let h = Harness::new().await;

        let (status, body) = h.call(Method::PUT, "/tasks/abc", r#"{"title":""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "title or description is required");

        let (status, body) = h.call(Method::PUT, "/tasks/abc", r#"{"title":"x"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Task not found");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_404() {
        let h = Harness::new().await;

        let (status, body) = h.call(Method::DELETE, "/tasks/missing", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "message": "Task not found" }));

        let (status, body) = h.call(Method::PATCH, "/tasks/missing/complete", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Task not found");
    }

    #[tokio::test]
    async fn test_unmatched_route() {
        let h = Harness::new().await;

        for (method, target) in [
            (Method::GET, "/projects"),
            (Method::PATCH, "/tasks"),
            (Method::GET, "/tasks/"),
            (Method::DELETE, "/tasks/UPPER"),
        ] {
            let (status, body) = h.call(method, target, "").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["message"], "Route not found!");
        }
    }

    #[tokio::test]
    async fn test_populate_from_csv() {
        let h = Harness::new().await;
        let csv = "title,description\nTask 01,Desc 01\nTask 02,Desc 02\n";

        let (status, _) = h
            .call_with(
                Method::POST,
                "/tasks/populate",
                Some("multipart/form-data; boundary=----x"),
                csv,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let all = h.list("/tasks").await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["title"], "Task 01");
        assert_eq!(all[1]["description"], "Desc 02");
        assert!(all.iter().all(|t| t["completed_at"].is_null()));
    }

    #[tokio::test]
    async fn test_populate_requires_tasks() {
        let h = Harness::new().await;

        let (status, body) = h
            .call(Method::POST, "/tasks/populate", r#"{"title":"A","description":"B"}"#)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "tasks are required");
    }

    #[test]
    fn test_check_body_size() {
        let mut headers = HeaderMap::new();
        assert!(check_body_size(&headers, 10).is_none());

        headers.insert("content-length", "11".parse().unwrap());
        assert!(matches!(
            check_body_size(&headers, 10),
            Some(ApiError::PayloadTooLarge)
        ));

        headers.insert("content-length", "10".parse().unwrap());
        assert!(check_body_size(&headers, 10).is_none());

        headers.insert("content-length", "ten".parse().unwrap());
        assert!(check_body_size(&headers, 10).is_none());
    }

    #[tokio::test]
    async fn test_read_body_enforces_limit_without_content_length() {
        let over = Full::new(Bytes::from(vec![b'x'; 11]));
        assert!(matches!(
            read_body(over, 10).await,
            Err(ApiError::PayloadTooLarge)
        ));

        let exact = Full::new(Bytes::from(vec![b'x'; 10]));
        assert_eq!(read_body(exact, 10).await.unwrap().len(), 10);

        let empty = Full::new(Bytes::new());
        assert!(read_body(empty, 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_request_target_keeps_query() {
        let uri: Uri = "/tasks?search=a".parse().unwrap();
        assert_eq!(request_target(&uri), "/tasks?search=a");

        let uri: Uri = "http://localhost:3333/tasks".parse().unwrap();
        assert_eq!(request_target(&uri), "/tasks");
    }
}
