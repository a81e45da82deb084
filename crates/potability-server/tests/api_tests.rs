//! Integration tests for the potability API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ndarray::Array2;
use potability_lib::training::{train, Dataset, TrainingVariant};
use potability_lib::{resolve, FeatureRow, Potability, ServiceMetrics, StructuredLogger};
use potability_server::{create_router, ServingContext};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Synthetic samples: potable when pH is close to neutral
fn synthetic_dataset(rows: usize) -> Dataset {
    let mut x = Array2::<f64>::zeros((rows, 9));
    let mut y = Vec::with_capacity(rows);
    for i in 0..rows {
        let t = i as f64 / rows as f64;
        let ph = 4.0 + 6.0 * t;
        let base = [ph, 200.0, 20000.0 - 400.0 * t, 7.0, 330.0, 420.0, 14.0, 66.0, 4.0];
        for (j, value) in base.iter().enumerate() {
            x[[i, j]] = value + ((i * 5 + j) % 7) as f64 * 0.1;
        }
        if i % 5 == 0 {
            x[[i, 4]] = f64::NAN;
        }
        y.push(if (6.5..=8.5).contains(&ph) {
            Potability::Potable
        } else {
            Potability::NotPotable
        });
    }
    Dataset::new(x, y).unwrap()
}

fn setup_test_app(variant: TrainingVariant) -> (Router, Arc<ServingContext>) {
    let dir = TempDir::new().unwrap();
    train(variant, &synthetic_dataset(90), dir.path()).unwrap();
    let bundle = resolve(dir.path()).unwrap();

    let ctx = Arc::new(ServingContext::new(
        bundle,
        ServiceMetrics::new(),
        StructuredLogger::new("api-tests"),
    ));
    (create_router(ctx.clone()), ctx)
}

fn example_body() -> Value {
    json!({
        "ph": 7.0,
        "Hardness": 200.0,
        "Solids": 20000.0,
        "Chloramines": 7.0,
        "Sulfate": 300.0,
        "Conductivity": 400.0,
        "Organic_carbon": 10.0,
        "Trihalomethanes": 60.0,
        "Turbidity": 4.0
    })
}

fn post_predict(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_home_reports_running() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Advanced);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("running"));
}

#[tokio::test]
async fn test_predict_returns_label_and_result() {
    let (app, ctx) = setup_test_app(TrainingVariant::Advanced);

    let response = app
        .oneshot(post_predict(example_body().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 2);

    let row = FeatureRow::from_named(example_body().as_object().unwrap()).unwrap();
    let expected = ctx.predictor().predict_row(&row).unwrap();
    assert_eq!(body["prediction"], expected.label.label());
    assert_eq!(body["result"], expected.label.as_str());
}

#[tokio::test]
async fn test_predict_accepts_null_as_missing() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Deep);

    let mut body = example_body();
    body["Sulfate"] = Value::Null;
    let response = app.oneshot(post_predict(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let label = body["prediction"].as_u64().unwrap();
    assert!(label == 0 || label == 1);
}

#[tokio::test]
async fn test_predict_missing_column_is_422() {
    let (app, ctx) = setup_test_app(TrainingVariant::Advanced);

    let mut body = example_body();
    body.as_object_mut().unwrap().remove("ph");
    let response = app.oneshot(post_predict(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("ph"));
    assert_eq!(ctx.predictor().stats().total_calls, 0);
}

#[tokio::test]
async fn test_predict_renamed_column_is_422() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Advanced);

    let mut body = example_body();
    let object = body.as_object_mut().unwrap();
    let value = object.remove("Turbidity").unwrap();
    object.insert("turbidity_ntu".to_string(), value);
    let response = app.oneshot(post_predict(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("turbidity_ntu"));
}

#[tokio::test]
async fn test_predict_non_numeric_is_422() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Advanced);

    let mut body = example_body();
    body["Solids"] = json!("lots");
    let response = app.oneshot(post_predict(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_malformed_json_is_400() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Advanced);

    let response = app
        .oneshot(post_predict("{\"ph\": ".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_healthz_reports_loaded_bundle() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Deep);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = json_body(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["profile"], "deep");
    assert_eq!(health["polynomial"], true);
    assert_eq!(health["features_out"], 54);
    assert_eq!(health["variant"], "deep");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_service_metrics() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Advanced);

    let response = app
        .clone()
        .oneshot(post_predict(example_body().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("potability_rows_scored_total"));
    assert!(text.contains("potability_prediction_latency_seconds"));
    assert!(text.contains("potability_bundle_info"));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (app, _ctx) = setup_test_app(TrainingVariant::Advanced);

    let response = app
        .oneshot(Request::builder().uri("/unknown").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
