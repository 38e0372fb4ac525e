//! HTTP inference endpoint over a loaded forest.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cerrado_rf::{RandomForest, RfError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Number of nutrient readings the endpoint accepts.
pub const N_NUTRIENTS: usize = 7;

/// Request keys, in [`NutrientSample::values`] order.
pub const REQUEST_FIELDS: [&str; N_NUTRIENTS] = ["N", "P", "K", "Ca", "Mg", "Fe", "Mn"];

/// Shared, read-only server state.
#[derive(Debug, Clone)]
pub struct AppState {
    forest: Arc<RandomForest>,
    /// `layout[i]` is the request field feeding model feature `i`.
    layout: [usize; N_NUTRIENTS],
}

/// A model feature belongs to request key `key` when it is named `key`,
/// optionally followed by a parenthesised unit: `N(g kg-1)`.
fn feature_matches(feature: &str, key: &str) -> bool {
    feature
        .strip_prefix(key)
        .is_some_and(|unit| unit.is_empty() || unit.trim_start().starts_with('('))
}

impl AppState {
    /// Wrap a fitted forest for serving.
    ///
    /// Each model feature is matched by name to one request field, so the
    /// model's feature order is free.
    ///
    /// # Errors
    ///
    /// Fails unless the forest has exactly seven features that pair one to
    /// one with [`REQUEST_FIELDS`].
    pub fn new(forest: RandomForest) -> Result<Self> {
        let names = forest.feature_names();
        if names.len() != N_NUTRIENTS {
            bail!(
                "model has {} features ({}), the endpoint needs {N_NUTRIENTS}",
                names.len(),
                names.join(", ")
            );
        }

        let mut layout = [0; N_NUTRIENTS];
        let mut taken = [false; N_NUTRIENTS];
        for (slot, name) in names.iter().enumerate() {
            let Some(field) = REQUEST_FIELDS.iter().position(|key| feature_matches(name, key)) else {
                bail!(
                    "model feature {name:?} matches none of the request fields {}",
                    REQUEST_FIELDS.join(", ")
                );
            };
            if std::mem::replace(&mut taken[field], true) {
                bail!(
                    "request field {} matches more than one model feature",
                    REQUEST_FIELDS[field]
                );
            }
            layout[slot] = field;
        }
        debug!(?layout, "request fields mapped to model features");

        Ok(Self {
            forest: Arc::new(forest),
            layout,
        })
    }

    fn features(&self, sample: &NutrientSample) -> [f64; N_NUTRIENTS] {
        let values = sample.values();
        self.layout.map(|field| values[field])
    }
}

/// Request body: one reading per nutrient.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NutrientSample {
    /// Nitrogen.
    #[serde(rename = "N")]
    pub nitrogen: f64,
    /// Phosphorus.
    #[serde(rename = "P")]
    pub phosphorus: f64,
    /// Potassium.
    #[serde(rename = "K")]
    pub potassium: f64,
    /// Calcium.
    #[serde(rename = "Ca")]
    pub calcium: f64,
    /// Magnesium.
    #[serde(rename = "Mg")]
    pub magnesium: f64,
    /// Iron.
    #[serde(rename = "Fe")]
    pub iron: f64,
    /// Manganese.
    #[serde(rename = "Mn")]
    pub manganese: f64,
}

impl NutrientSample {
    /// Readings in [`REQUEST_FIELDS`] order.
    #[must_use]
    pub fn values(&self) -> [f64; N_NUTRIENTS] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.calcium,
            self.magnesium,
            self.iron,
            self.manganese,
        ]
    }
}

#[derive(Debug, Serialize)]
struct PredictionResponse {
    #[serde(rename = "Predicted Physiognomy")]
    physiognomy: String,
}

/// Request failures, rendered as `{"error": true, "message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The body was not a valid sample.
    #[error(transparent)]
    Body(#[from] JsonRejection),

    /// The forest rejected the sample.
    #[error(transparent)]
    Prediction(#[from] RfError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Body(rejection) => (rejection.status(), rejection.body_text()),
            ServerError::Prediction(
                e @ (RfError::NonFiniteValue { .. } | RfError::PredictionFeatureMismatch { .. }),
            ) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ServerError::Prediction(e) => {
                error!(detail = %e, "prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "prediction failed".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": true,
            "message": message,
        }));
        (status, body).into_response()
    }
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Json<NutrientSample>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServerError> {
    let Json(sample) = body.inspect_err(|e| warn!(error = %e, "rejected request body"))?;
    let label = state.forest.predict_label(&state.features(&sample))?;
    Ok(Json(PredictionResponse {
        physiognomy: label.to_string(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "n_trees": state.forest.n_trees(),
        "n_features": state.forest.n_features(),
        "classes": state.forest.class_names(),
    }))
}

/// Build the router: `POST /rfcprediction/` and `GET /health`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/rfcprediction/", post(predict))
        .route("/rfcprediction", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Fails if the address cannot be bound or the server stops abnormally.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "cannot listen for ctrl-c; stopping"),
    }
}
