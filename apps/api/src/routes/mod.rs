pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .route("/health", get(health::health_handler))
        // Screening API
        .route("/api/v1/screening", post(handlers::handle_screen))
        .route(
            "/api/v1/skills/extract",
            post(handlers::handle_extract_skills),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::screening::embeddings::EmbeddingClient;
    use crate::screening::pipeline::Screener;

    const BOUNDARY: &str = "screening-test-boundary";

    const RESUME: &str = "Jane Q Doe\njane@example.com\n\
        Frontend engineer with 5 years experience building React and TypeScript apps, \
        writing Jest suites and deploying to AWS. B.Sc. in Computer Science. \
        Mentored juniors, led migrations and owned the design system end to end.";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str),
    }

    fn multipart_body(parts: &[Part<'_>]) -> String {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match part {
                Part::Text(name, value) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    ));
                }
                Part::File(name, filename, content) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: text/plain\r\n\r\n{content}\r\n"
                    ));
                }
            }
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn app(config: Config) -> Router {
        let screener = Screener::new(None, EmbeddingClient::disabled(), config.screening());
        build_router(AppState {
            config,
            screener: Arc::new(screener),
        })
    }

    async fn post_screening(app: Router, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/screening")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Config::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_screening_returns_ranked_batch() {
        let (status, body) = post_screening(
            app(Config::default()),
            &[
                Part::Text("jobDescription", "Frontend role: React, TypeScript, Jest. 4-7 years."),
                Part::Text("title", "Frontend Engineer"),
                Part::File("resumes", "tiny.txt", "too short"),
                Part::File("resumes", "jane.txt", RESUME),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["title"], "Frontend Engineer");
        let candidates = body["candidates"].as_array().unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0]["originalFilename"], "jane.txt");
        assert_eq!(candidates[0]["status"], "screened");
        assert_eq!(candidates[0]["scores"]["experienceFit"], 1.0);
        assert_eq!(candidates[1]["status"], "error");
        assert_eq!(candidates[1]["error"], "empty_or_unparsable_text_pdf");
        assert!(candidates[1].get("scores").is_none());
    }

    #[tokio::test]
    async fn test_missing_title_uses_default() {
        let (status, body) = post_screening(
            app(Config::default()),
            &[
                Part::Text("jobDescription", "React developer"),
                Part::File("resumes", "jane.txt", RESUME),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["title"], "Untitled Job");
    }

    #[tokio::test]
    async fn test_empty_job_description_is_rejected() {
        let (status, body) = post_screening(
            app(Config::default()),
            &[
                Part::Text("jobDescription", "   "),
                Part::File("resumes", "jane.txt", RESUME),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_no_files_is_rejected() {
        let (status, _) = post_screening(
            app(Config::default()),
            &[Part::Text("jobDescription", "React developer")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_too_many_files_is_rejected() {
        let config = Config {
            max_files: 1,
            ..Config::default()
        };
        let (status, _) = post_screening(
            app(config),
            &[
                Part::Text("jobDescription", "React developer"),
                Part::File("resumes", "a.txt", RESUME),
                Part::File("resumes", "b.txt", RESUME),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let config = Config {
            max_file_bytes: 64,
            ..Config::default()
        };
        let (status, body) = post_screening(
            app(config),
            &[
                Part::Text("jobDescription", "React developer"),
                Part::File("resumes", "jane.txt", RESUME),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_extract_skills_endpoint() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/skills/extract")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "We need React, Docker and payroll experience"}"#))
            .unwrap();
        let response = app(Config::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["skills"], serde_json::json!(["react", "docker", "payroll"]));
    }
}
