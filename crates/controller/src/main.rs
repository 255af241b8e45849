use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use shared::{
    domain::{ButtonId, DeviceField, DeviceState},
    error::{ApiError, ErrorCode},
    protocol::{
        DeviceUpdateAck, RotateRequest, SetValueRequest, StepperActionResponse, StepperEnvelope,
        DEVICES_PATH, STEPPER_PATH, STEPPER_ROTATE_PATH,
    },
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings();
    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;

    let app = build_router(Arc::new(AppState::default()));

    info!(%addr, "controller simulator listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(DEVICES_PATH, get(list_devices))
        .route(&format!("{DEVICES_PATH}/:device"), post(update_device))
        .route(STEPPER_PATH, get(stepper_status))
        .route(&format!("{STEPPER_PATH}/button/:button_id"), post(press_button))
        .route(STEPPER_ROTATE_PATH, post(rotate_stepper))
        .with_state(state)
}

fn rejected(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiError>) {
    let error = ApiError::new(code, message);
    warn!(%status, message = %error.message, "request rejected");
    (status, Json(error))
}

fn validation(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    rejected(StatusCode::BAD_REQUEST, ErrorCode::Validation, message)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_devices(State(state): State<Arc<AppState>>) -> Json<DeviceState> {
    Json(*state.devices.lock().await)
}

async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(device): Path<String>,
    payload: Result<Json<SetValueRequest>, JsonRejection>,
) -> ApiResult<DeviceUpdateAck> {
    let field = device
        .parse::<DeviceField>()
        .map_err(|e| validation(e.to_string()))?;
    let Json(request) = payload.map_err(|e| validation(e.body_text()))?;

    let value = state.set_field(field, request.value).await.map_err(|error| {
        warn!(device = %field, message = %error.message, "device update rejected");
        (StatusCode::BAD_REQUEST, Json(error))
    })?;
    info!(device = %field, ?value, "device updated");
    Ok(Json(DeviceUpdateAck {
        device: field.as_str().to_string(),
        value,
    }))
}

async fn stepper_status(State(state): State<Arc<AppState>>) -> Json<StepperEnvelope> {
    Json(StepperEnvelope {
        stepper: *state.stepper.lock().await,
    })
}

async fn press_button(
    State(state): State<Arc<AppState>>,
    Path(button_id): Path<u32>,
) -> ApiResult<StepperActionResponse> {
    let (stepper, action) = state
        .press(ButtonId(button_id), Utc::now())
        .await
        .map_err(|error| rejected(StatusCode::NOT_FOUND, error.code, error.message))?;
    info!(button = button_id, rotation = stepper.rotation, "stepper preset applied");
    Ok(Json(StepperActionResponse { stepper, action }))
}

async fn rotate_stepper(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RotateRequest>, JsonRejection>,
) -> ApiResult<StepperActionResponse> {
    let Json(request) = payload.map_err(|e| validation(e.body_text()))?;
    let stepper = state
        .spin(request.direction, request.degrees, Utc::now())
        .await;
    info!(
        direction = %request.direction,
        degrees = request.degrees,
        rotation = stepper.rotation,
        "stepper rotated"
    );
    Ok(Json(StepperActionResponse {
        stepper,
        action: format!("rotate {} {}°", request.direction, request.degrees),
    }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
