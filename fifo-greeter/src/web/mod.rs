//! Web server module.
//!
//! Routes:
//! - `GET /api/hello`: greeting with the configured version
//! - `POST /api/send-message`: enqueue a key/value payload
//! - `GET /actuator/health`: load balancer health check

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, hello, send_message, ApiError, AppState, HealthResponse, HelloResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/hello", get(hello))
        .route("/api/send-message", post(send_message))
        .route("/actuator/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::message::Message;
    use crate::queue::{
        InMemoryQueue, Listener, MessageQueue, Publisher, QueueError, Subscription,
    };
    use crate::Config;

    fn config() -> Config {
        Config {
            app_version: "1.2.3".to_string(),
            queue_name: "test-queue.fifo".to_string(),
            ..Config::default()
        }
    }

    fn app_with(queue: Arc<dyn MessageQueue>) -> Router {
        router(AppState::new(config(), Publisher::new(queue)))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/send-message")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    /// Backend whose publish always fails.
    struct Unreachable;

    #[async_trait]
    impl MessageQueue for Unreachable {
        async fn publish(&self, queue: &str, _body: Vec<u8>) -> Result<String, QueueError> {
            Err(QueueError::Rejected {
                queue: queue.to_string(),
            })
        }

        async fn subscribe(
            &self,
            queue: &str,
            _listener: Arc<dyn Listener>,
        ) -> Result<Subscription, QueueError> {
            Err(QueueError::Rejected {
                queue: queue.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_hello_reports_version() {
        let app = app_with(Arc::new(InMemoryQueue::new()));
        let response = app
            .oneshot(Request::get("/api/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body, serde_json::json!({"message": "hello world: v1.2.3"}));
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Arc::new(InMemoryQueue::new()));
        let response = app
            .oneshot(Request::get("/actuator/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, br#"{"status":"UP"}"#);
    }

    #[tokio::test]
    async fn test_send_message_enqueues_body() {
        let queue = InMemoryQueue::new();
        let app = app_with(Arc::new(queue.clone()));

        let response = app.oneshot(post_json(r#"{"a":"b"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(body_bytes(response).await.is_empty());

        let pending = queue.pending("test-queue.fifo").await;
        assert_eq!(pending.len(), 1);
        let expected: Message = [("a", "b")].into_iter().collect();
        assert_eq!(Message::from_json(&pending[0].body).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_send_empty_object() {
        let queue = InMemoryQueue::new();
        let app = app_with(Arc::new(queue.clone()));

        let response = app.oneshot(post_json("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let pending = queue.pending("test-queue.fifo").await;
        assert_eq!(pending[0].body, b"{}");
    }

    #[tokio::test]
    async fn test_send_message_backend_failure_is_generic_500() {
        let app = app_with(Arc::new(Unreachable));

        let response = app.oneshot(post_json(r#"{"a":"b"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": 500, "error": "Internal Server Error"})
        );
    }

    #[tokio::test]
    async fn test_send_message_rejects_non_string_values() {
        let queue = InMemoryQueue::new();
        let app = app_with(Arc::new(queue.clone()));

        let response = app.oneshot(post_json(r#"{"a":1}"#)).await.unwrap();

        assert!(response.status().is_client_error());
        assert!(queue.pending("test-queue.fifo").await.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_requires_json_content_type() {
        let queue = InMemoryQueue::new();
        let app = app_with(Arc::new(queue.clone()));

        let request = Request::builder()
            .method("POST")
            .uri("/api/send-message")
            .body(Body::from(r#"{"a":"b"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(queue.pending("test-queue.fifo").await.is_empty());
    }
}
