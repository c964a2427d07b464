//! API route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{contact, health, indexnow, projects};
use crate::middleware::cors_layer;
use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/projects", project_routes())
        .route("/indexnow", get(indexnow::info).post(indexnow::submit))
        .route("/contact", post(contact::submit))
}

fn project_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(projects::list_projects))
        .route("/slugs", get(projects::list_slugs))
        .route("/{slug}", get(projects::get_project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use atelier_core::cms::queries;
    use atelier_core::config::{ContactConfig, IndexNowConfig};
    use atelier_core::contact::{MailError, OutgoingEmail};
    use atelier_core::fetch::{Backoff, QueryCache, ResilientFetcher};
    use atelier_core::{CmsError, ContentSource, IndexNowClient, Mailer, QueryParams, RateLimiter};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Answers each known query with a fixed value; `None` means the API is down
    struct StubSource {
        answers: HashMap<&'static str, Option<Value>>,
    }

    #[async_trait]
    impl ContentSource for StubSource {
        async fn query(&self, query: &str, _params: &QueryParams) -> Result<Value, CmsError> {
            match self.answers.get(query) {
                Some(Some(value)) => Ok(value.clone()),
                Some(None) => Err(CmsError::ServerError("unavailable".to_string())),
                None => Ok(Value::Null),
            }
        }
    }

    /// Keeps every email it is asked to send, or refuses them all
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Rejected {
                    status: 500,
                    body: "down".to_string(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn app(answers: Vec<(&'static str, Option<Value>)>) -> Router {
        create_router(Arc::new(state(answers)))
    }

    fn app_with_mailer(mailer: Arc<RecordingMailer>) -> Router {
        let mailer: Arc<dyn Mailer> = mailer;
        let state = state(vec![]).with_contact(ContactConfig::default(), Some(mailer));
        create_router(Arc::new(state))
    }

    fn state(answers: Vec<(&'static str, Option<Value>)>) -> AppState {
        let source = StubSource {
            answers: answers.into_iter().collect(),
        };
        let fetcher = ResilientFetcher::new(Arc::new(source), Arc::new(QueryCache::default()))
            .with_backoff(Backoff::none());
        let rate_limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(60)));
        let indexnow = IndexNowClient::new(IndexNowConfig {
            endpoints: vec![],
            ..IndexNowConfig::default()
        })
        .unwrap();

        AppState::new(fetcher, rate_limiter, indexnow)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, cache_control, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str, client: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", client)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn design(id: &str, title: &str, slug: &str) -> Value {
        json!({ "_id": id, "title": title, "slug": { "current": slug }, "year": 2021 })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = send(app(vec![]), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_list_projects() {
        let designs = json!([design("a", "Woven Light", "woven-light"), design("b", "Tide", "tide")]);
        let (status, cache, body) =
            send(app(vec![(queries::DESIGNS_FOR_HOME, Some(designs))]), get_request("/api/projects")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("public, s-maxage=300, stale-while-revalidate=600"));
        assert_eq!(body["designs"].as_array().unwrap().len(), 2);
        assert_eq!(body["designs"][0]["slug"]["current"], "woven-light");
    }

    #[tokio::test]
    async fn test_list_projects_tolerates_null_fields() {
        let designs = json!([
            { "_id": "a", "title": "Woven Light", "slug": { "current": "woven-light" }, "featured": null, "materials": null, "gallery": null, "image": null },
            design("b", "Tide", "tide"),
        ]);
        let (status, _, body) =
            send(app(vec![(queries::DESIGNS_FOR_HOME, Some(designs))]), get_request("/api/projects")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["designs"].as_array().unwrap().len(), 2);
        assert_eq!(body["designs"][0]["featured"], false);
    }

    #[tokio::test]
    async fn test_list_projects_empty_and_unavailable() {
        let (status, _, body) =
            send(app(vec![(queries::DESIGNS_FOR_HOME, Some(json!([])))]), get_request("/api/projects")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "designs": [] }));

        let (status, _, body) = send(app(vec![]), get_request("/api/projects")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "designs": [] }));

        let (status, cache, body) =
            send(app(vec![(queries::DESIGNS_FOR_HOME, None)]), get_request("/api/projects")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(cache, None);
        assert_eq!(body, json!({ "error": "Failed to fetch projects", "designs": [] }));
    }

    #[tokio::test]
    async fn test_get_project_with_navigation() {
        let navigation = json!({
            "current": { "_id": "b", "title": "Tide", "slug": { "current": "tide" }, "order": 2 },
            "previous": { "_id": "a", "title": "Woven Light", "slug": { "current": "woven-light" } },
            "next": null,
        });
        let app = app(vec![
            (queries::PROJECT_BY_SLUG, Some(design("b", "Tide", "tide"))),
            (queries::PROJECT_NAVIGATION, Some(navigation)),
        ]);

        let (status, cache, body) = send(app, get_request("/api/projects/tide")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("public, s-maxage=600, stale-while-revalidate=1200"));
        assert_eq!(body["project"]["title"], "Tide");
        assert_eq!(body["previousProject"], json!({ "slug": "woven-light", "title": "Woven Light" }));
        assert_eq!(body["nextProject"], Value::Null);
    }

    #[tokio::test]
    async fn test_get_project_survives_navigation_outage() {
        let app = app(vec![
            (queries::PROJECT_BY_SLUG, Some(design("b", "Tide", "tide"))),
            (queries::PROJECT_NAVIGATION, None),
        ]);

        let (status, _, body) = send(app, get_request("/api/projects/tide")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["previousProject"], Value::Null);
        assert_eq!(body["nextProject"], Value::Null);
    }

    #[tokio::test]
    async fn test_get_project_errors() {
        let (status, _, body) = send(app(vec![]), get_request("/api/projects/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Project not found" }));

        let (status, _, body) =
            send(app(vec![(queries::PROJECT_BY_SLUG, None)]), get_request("/api/projects/tide")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch project", "project": null }));

        let long = format!("/api/projects/{}", "a".repeat(200));
        let (status, _, _) = send(app(vec![]), get_request(&long)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_slugs() {
        let records = json!([
            { "slug": "woven-light", "_updatedAt": "2024-01-01T00:00:00Z" },
            { "slug": null, "_updatedAt": "2024-01-02T00:00:00Z" },
            { "slug": "tide", "_updatedAt": "2024-01-03T00:00:00Z" },
        ]);
        let (status, cache, body) =
            send(app(vec![(queries::ALL_SLUGS, Some(records))]), get_request("/api/projects/slugs")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("public, s-maxage=300, stale-while-revalidate=600"));
        assert_eq!(body, json!({ "slugs": [{ "slug": "woven-light" }, { "slug": "tide" }] }));
    }

    #[tokio::test]
    async fn test_list_slugs_empty_and_unavailable() {
        let (status, _, body) =
            send(app(vec![(queries::ALL_SLUGS, Some(json!([])))]), get_request("/api/projects/slugs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "slugs": [] }));

        let (status, _, body) = send(app(vec![(queries::ALL_SLUGS, None)]), get_request("/api/projects/slugs")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch slugs", "slugs": [] }));
    }

    #[tokio::test]
    async fn test_indexnow_info() {
        let (status, _, body) = send(app(vec![]), get_request("/api/indexnow")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "IndexNow");
        assert_eq!(body["key"], "indexnow-idaromme");
    }

    #[tokio::test]
    async fn test_indexnow_validation() {
        let (status, _, body) = send(app(vec![]), post_json("/api/indexnow", "{}", "1.1.1.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("No URLs provided"));

        let (status, _, body) = send(app(vec![]), post_json("/api/indexnow", "{not json", "1.1.1.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");

        let payload = r#"{"urls":["https://idaromme.dk/a","https://evil.com/b"]}"#;
        let (status, _, body) = send(app(vec![]), post_json("/api/indexnow", payload, "1.1.1.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["invalidUrls"], json!(["https://evil.com/b"]));
    }

    #[tokio::test]
    async fn test_indexnow_submission_summary() {
        let payload = r#"{"url":"https://idaromme.dk/a","urls":["https://www.idaromme.dk/b","https://idaromme.dk/a"]}"#;
        let (status, _, body) = send(app(vec![]), post_json("/api/indexnow", payload, "1.1.1.1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["submitted"], json!(["https://idaromme.dk/a", "https://www.idaromme.dk/b"]));
        // No endpoints configured, so nothing could succeed
        assert_eq!(body["success"], false);
        assert_eq!(body["results"], json!([]));
    }

    #[tokio::test]
    async fn test_indexnow_ignores_non_array_urls() {
        let payload = r#"{"url":"https://idaromme.dk/a","urls":"https://evil.com/b"}"#;
        let (status, _, body) = send(app(vec![]), post_json("/api/indexnow", payload, "1.1.1.1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["submitted"], json!(["https://idaromme.dk/a"]));
    }

    #[tokio::test]
    async fn test_indexnow_rate_limit() {
        let app = app(vec![]);
        for _ in 0..5 {
            let (status, _, _) = send(app.clone(), post_json("/api/indexnow", "{}", "9.9.9.9")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let response = app
            .clone()
            .oneshot(post_json("/api/indexnow", "{}", "9.9.9.9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = response.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!((1..=60).contains(&retry_after));

        // Other clients are unaffected
        let (status, _, _) = send(app, post_json("/api/indexnow", "{}", "8.8.8.8")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    const CONTACT: &str = r#"{"name":"Ida","email":"ida@example.dk","message":"Could we talk about a commission?"}"#;

    #[tokio::test]
    async fn test_contact_sends_sanitised_email() {
        let mailer = RecordingMailer::new(false);
        let payload = r#"{"name":"<b>Ida</b>","email":"ida@example.dk","message":"Could we talk about a commission?"}"#;
        let (status, _, body) =
            send(app_with_mailer(mailer.clone()), post_json("/api/contact", payload, "1.1.1.1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "Your message has been sent successfully!" }));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec![ContactConfig::default().to]);
        assert_eq!(sent[0].subject, "New Contact Form Message from &lt;b&gt;Ida&lt;&#x2F;b&gt;");
    }

    #[tokio::test]
    async fn test_contact_validation_errors() {
        let mailer = RecordingMailer::new(false);
        let app = app_with_mailer(mailer.clone());

        let payload = r#"{"name":"Ida","email":"not-an-email","message":"Could we talk about a commission?"}"#;
        let (status, _, body) = send(app.clone(), post_json("/api/contact", payload, "1.1.1.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid email address" }));

        let payload = r#"{"name":"Ida","email":"ida@example.dk","message":"hi"}"#;
        let (status, _, body) = send(app.clone(), post_json("/api/contact", payload, "1.1.1.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message must be at least 10 characters");

        let (status, _, body) = send(app, post_json("/api/contact", "{oops", "1.1.1.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");

        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contact_without_mailer_is_unavailable() {
        let (status, _, body) = send(app(vec![]), post_json("/api/contact", CONTACT, "1.1.1.1")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Contact form is temporarily unavailable. Please try again later.");
    }

    #[tokio::test]
    async fn test_contact_delivery_failure() {
        let (status, _, body) =
            send(app_with_mailer(RecordingMailer::new(true)), post_json("/api/contact", CONTACT, "1.1.1.1")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to send message. Please try again.");
    }

    #[tokio::test]
    async fn test_contact_rate_limit_is_separate_from_indexnow() {
        let mailer = RecordingMailer::new(false);
        let app = app_with_mailer(mailer.clone());
        for _ in 0..5 {
            let (status, _, _) = send(app.clone(), post_json("/api/contact", CONTACT, "7.7.7.7")).await;
            assert_eq!(status, StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(post_json("/api/contact", CONTACT, "7.7.7.7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(mailer.sent.lock().unwrap().len(), 5);

        let (status, _, _) = send(app, post_json("/api/indexnow", "{}", "7.7.7.7")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
