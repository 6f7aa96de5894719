mod analysis;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use wykra_analysis::{AnalysisError, AnalysisOrchestrator};
use wykra_core::{Environment, ErrorKind};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub env: Environment,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    environment: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                stage: None,
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// Envelope for a failed analysis, carrying its kind and stage.
    pub fn from_analysis(request_id: impl Into<String>, err: &AnalysisError) -> Self {
        let mut api_error = Self::new(request_id, err.kind().code(), err.cause());
        api_error.error.stage = Some(err.stage().as_str().to_owned());
        api_error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (status_for(&self.error.code), Json(self)).into_response()
    }
}

pub(super) fn status_for(code: &str) -> StatusCode {
    let kinds = [
        (ErrorKind::InvalidHandle, StatusCode::BAD_REQUEST),
        (ErrorKind::ProviderUnavailable, StatusCode::BAD_GATEWAY),
        (ErrorKind::ScrapeFailed, StatusCode::BAD_GATEWAY),
        (ErrorKind::MalformedProfileData, StatusCode::BAD_GATEWAY),
        (ErrorKind::InsightParseError, StatusCode::BAD_GATEWAY),
        (ErrorKind::JobTimeout, StatusCode::GATEWAY_TIMEOUT),
        (ErrorKind::AnalysisUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        (ErrorKind::ConfigurationError, StatusCode::INTERNAL_SERVER_ERROR),
    ];
    kinds
        .iter()
        .find(|(kind, _)| kind.code() == code)
        .map_or(StatusCode::INTERNAL_SERVER_ERROR, |(_, status)| *status)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/instagram/analysis",
            get(analysis::analyze_profile),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            environment: state.env.to_string(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wykra_brightdata::{BrightDataClient, PollSettings};
    use wykra_core::{BackoffPolicy, LlmBackend};
    use wykra_insight::{build_gateway, AgentConfig, GatewayConfig, InsightAgent};

    fn test_app(brightdata: &MockServer, llm: &MockServer) -> Router {
        let poll = PollSettings::new(
            Duration::from_millis(10),
            Duration::from_millis(40),
            Duration::from_millis(500),
        );
        let scraper =
            BrightDataClient::with_base_url("bd-token", "gd_test", 5, poll, &brightdata.uri())
                .expect("scraper");
        let gateway = build_gateway(&GatewayConfig {
            backend: LlmBackend::OpenAi,
            api_key: "sk-test".to_owned(),
            base_url: Some(llm.uri()),
            site_url: None,
            timeout: Duration::from_secs(5),
        })
        .expect("gateway");
        let agent = InsightAgent::new(
            gateway,
            AgentConfig {
                backend: LlmBackend::OpenAi,
                model: "test/model".to_owned(),
                timeout: Duration::from_secs(5),
                max_retries: 0,
                retry_backoff: BackoffPolicy::new(
                    Duration::from_millis(1),
                    Duration::from_millis(5),
                ),
                repair_attempts: 1,
                temperature: 0.0,
                max_tokens: 512,
            },
        );

        build_app(AppState {
            orchestrator: Arc::new(AnalysisOrchestrator::new(scraper, agent)),
            env: Environment::Test,
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).expect("json parse");
        (status, request_id, json)
    }

    #[test]
    fn error_kinds_map_to_http_statuses() {
        assert_eq!(status_for("invalid_handle"), StatusCode::BAD_REQUEST);
        assert_eq!(status_for("provider_unavailable"), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for("scrape_failed"), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for("malformed_profile_data"), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for("insight_parse_error"), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for("job_timeout"), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for("analysis_unavailable"),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for("configuration_error"),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_for("nonsense"), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn plain_api_error_omits_stage() {
        let json = serde_json::to_value(ApiError::new("req-1", "invalid_handle", "bad"))
            .expect("serialize");
        assert!(json["error"].get("stage").is_none());
        assert_eq!(json["meta"]["request_id"], "req-1");
    }

    #[tokio::test]
    async fn health_reports_environment_and_request_id() {
        let brightdata = MockServer::start().await;
        let llm = MockServer::start().await;

        let (status, request_id, json) = get_json(test_app(&brightdata, &llm), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["environment"], "test");
        let request_id = request_id.expect("x-request-id header");
        assert_eq!(json["meta"]["request_id"], request_id.as_str());
    }

    #[tokio::test]
    async fn caller_request_id_is_echoed() {
        let brightdata = MockServer::start().await;
        let llm = MockServer::start().await;

        let response = test_app(&brightdata, &llm)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(REQUEST_ID_HEADER, "trace-abc")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).map(|v| v.as_bytes()),
            Some(b"trace-abc".as_slice())
        );
    }

    #[tokio::test]
    async fn missing_profile_is_invalid_handle() {
        let brightdata = MockServer::start().await;
        let llm = MockServer::start().await;

        let (status, _, json) =
            get_json(test_app(&brightdata, &llm), "/api/v1/instagram/analysis").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_handle");
        assert_eq!(json["error"]["stage"], "received");
    }

    #[tokio::test]
    async fn malformed_handle_is_rejected_without_scraping() {
        let brightdata = MockServer::start().await;
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&brightdata)
            .await;

        let (status, _, json) = get_json(
            test_app(&brightdata, &llm),
            "/api/v1/instagram/analysis?profile=not%20a%20handle",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_handle");
    }

    #[tokio::test]
    async fn provider_outage_is_bad_gateway_at_scraping() {
        let brightdata = MockServer::start().await;
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/datasets/v3/trigger"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&brightdata)
            .await;

        let (status, _, json) = get_json(
            test_app(&brightdata, &llm),
            "/api/v1/instagram/analysis?profile=chef_ana",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["code"], "provider_unavailable");
        assert_eq!(json["error"]["stage"], "scraping");
    }

    #[tokio::test]
    async fn successful_analysis_is_wrapped_in_data_envelope() {
        let brightdata = MockServer::start().await;
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/datasets/v3/trigger"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"snapshot_id": "s_1"})),
            )
            .mount(&brightdata)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/v3/progress/s_1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ready"})),
            )
            .mount(&brightdata)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/v3/snapshot/s_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "account": "chef_ana",
                "biography": "Home cook, Barcelona",
                "followers": 5400
            }])))
            .mount(&brightdata)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content":
                    "{\"summary\": \"Home cook.\", \"tags\": [\"food\"], \"confidence\": \"medium\"}"}}]
            })))
            .mount(&llm)
            .await;

        let (status, _, json) = get_json(
            test_app(&brightdata, &llm),
            "/api/v1/instagram/analysis?profile=@chef_ana",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["handle"], "chef_ana");
        assert_eq!(json["data"]["tags"], serde_json::json!(["food"]));
        assert_eq!(json["data"]["confidence"], "medium");
        assert!(json["meta"]["timestamp"].is_string());
    }
}
