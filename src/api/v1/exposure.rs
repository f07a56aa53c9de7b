//! Exposure endpoint
//!
//! Stand-in for the host request pipeline: the body carries the request
//! context, the assignment token travels in a cookie.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::Json;
use crate::domain::exposure::{RequestContext, TokenJar};

/// Lifetime of the token cookie, one year
const TOKEN_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// POST /v1/exposure
pub async fn evaluate_exposure(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(context): Json<RequestContext>,
) -> Response {
    let incoming = read_cookie(&headers, &state.token_cookie)
        .map(|raw| state.codec.decode(raw))
        .unwrap_or_default();

    let mut jar = TokenJar::new(incoming);
    let decision = state.evaluator.decide(&context, &mut jar).await;

    debug!(
        client_id = %context.client_id,
        outcome = decision.outcome(),
        token_written = jar.has_writes(),
        "Exposure evaluated"
    );

    let mut response = Json(decision).into_response();

    if jar.has_writes() {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            state.token_cookie,
            state.codec.encode(&jar.merged()),
            TOKEN_MAX_AGE_SECS
        );

        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Assignment token is not a valid cookie value"),
        }
    }

    response
}

/// Find a cookie value across all `Cookie` headers
fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::router::create_router_with_state;
    use crate::domain::content::{ContentItem, DeviceId, ItemId};
    use crate::domain::experiment::{
        ExperimentDefinition, ExperimentId, ExperimentStatus, Variable, VariantValue,
    };
    use crate::{create_app_state, AppConfig, SeedData};

    const HOME_VISITOR: &str =
        r#"{"item_id": "home", "client_id": "visitor-1", "session": {"active": true}}"#;

    fn seed(missing_datasource: bool) -> SeedData {
        let mut experiment = ExperimentDefinition::new(
            ExperimentId::new("hero-test").unwrap(),
            "Hero",
            ItemId::new("home").unwrap(),
            DeviceId::default(),
        )
        .with_variable(
            Variable::new("hero", "Hero")
                .with_value(
                    VariantValue::new("a", "A").with_datasource(ItemId::new("hero-a").unwrap()),
                )
                .with_value(
                    VariantValue::new("b", "B").with_datasource(ItemId::new("hero-b").unwrap()),
                ),
        );
        experiment.start().unwrap();

        let mut items = vec![
            ContentItem::new(ItemId::new("home").unwrap(), "Home"),
            ContentItem::new(ItemId::new("hero-a").unwrap(), "Hero A"),
        ];
        if !missing_datasource {
            items.push(ContentItem::new(ItemId::new("hero-b").unwrap(), "Hero B"));
        }

        SeedData {
            items,
            experiments: vec![experiment],
        }
    }

    async fn app(seed: SeedData) -> (axum::Router, crate::api::AppState) {
        let state = create_app_state(&AppConfig::default(), seed).await.unwrap();
        (create_router_with_state(state.clone()), state)
    }

    fn request(body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/exposure")
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session=abc; pmp_ct=hero-test:AQ; other=1"),
        );

        assert_eq!(read_cookie(&headers, "pmp_ct"), Some("hero-test:AQ"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn test_fresh_exposure_sets_cookie() {
        let (router, _) = app(seed(false)).await;

        let response = router
            .oneshot(request(HOME_VISITOR, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = set_cookie(&response).unwrap();
        assert!(cookie.starts_with("pmp_ct=hero-test:"));

        let body = json_body(response).await;
        assert_eq!(body["decision"], "exposed");
        assert_eq!(body["source"], "fresh");
        assert_eq!(body["experiment_id"], "hero-test");
    }

    #[tokio::test]
    async fn test_sticky_cookie_is_reused() {
        let (router, _) = app(seed(false)).await;

        // "AQ" is base64 for [1]
        let response = router
            .oneshot(request(
                HOME_VISITOR,
                Some("pmp_ct=hero-test:AQ"),
            ))
            .await
            .unwrap();

        assert_eq!(
            set_cookie(&response).unwrap().split(';').next(),
            Some("pmp_ct=hero-test:AQ")
        );

        let body = json_body(response).await;
        assert_eq!(body["source"], "sticky");
        assert_eq!(body["combination"]["indices"], serde_json::json!([1]));
    }

    #[tokio::test]
    async fn test_no_item_means_no_experiment_and_no_cookie() {
        let (router, _) = app(seed(false)).await;

        let response = router
            .oneshot(request(r#"{"client_id": "visitor-1"}"#, None))
            .await
            .unwrap();

        assert!(set_cookie(&response).is_none());
        let body = json_body(response).await;
        assert_eq!(body["decision"], "no_experiment");
    }

    #[tokio::test]
    async fn test_unreported_session_is_not_exposed() {
        let (router, state) = app(seed(false)).await;

        let response = router
            .oneshot(request(r#"{"item_id": "home", "client_id": "visitor-1"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookie(&response).is_none());
        let body = json_body(response).await;
        assert_eq!(body["decision"], "no_experiment");
        assert!(state.tracker.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broken_datasource_clears_cookie_and_suspends() {
        let (router, state) = app(seed(true)).await;

        // "AQ" selects value "b" whose datasource is missing
        let response = router
            .oneshot(request(
                HOME_VISITOR,
                Some("pmp_ct=hero-test:AQ"),
            ))
            .await
            .unwrap();

        assert_eq!(
            set_cookie(&response).unwrap().split(';').next(),
            Some("pmp_ct=hero-test:-")
        );
        let body = json_body(response).await;
        assert_eq!(body["decision"], "suppressed");

        let experiment = state.experiment_service.get("hero-test").await.unwrap().unwrap();
        assert_eq!(experiment.status(), ExperimentStatus::Suspended);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let (router, _) = app(seed(false)).await;

        let response = router
            .oneshot(request(r#"{"item_id": "not valid"}"#, None))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        let body = json_body(response).await;
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }
}
