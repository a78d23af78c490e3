mod common;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
};
use helpdesk_api::routes::{create_api_router, health::health_check};
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_ok() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = serde_json::to_value(response.0.data.expect("health data"))?;
    assert_eq!(data["status"], "ok");
    assert_eq!(data["database"], "up");
    Ok(())
}

#[tokio::test]
async fn health_is_reachable_under_api_prefix() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let app = axum::Router::new()
        .nest("/api", create_api_router())
        .with_state(state);

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
