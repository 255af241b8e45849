//! Request/response access to the controller's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ButtonId, DeviceField, DeviceState, Direction, MotorState, Switch},
    protocol::{
        button_path, device_path, FieldValue, RotateRequest, SetValueRequest,
        StepperActionResponse, StepperEnvelope, DEVICES_PATH, STEPPER_PATH, STEPPER_ROTATE_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::error::{GatewayError, SessionSetupError};

/// Read side shared by every panel: fetch the full authoritative state.
#[async_trait]
pub trait StateSource<S>: Send + Sync {
    async fn fetch_state(&self) -> Result<S, GatewayError>;
}

#[async_trait]
pub trait DeviceGateway: StateSource<DeviceState> {
    async fn set_boolean(&self, switch: Switch, value: bool) -> Result<(), GatewayError>;
    /// `value` must already be clamped by the caller.
    async fn set_thermostat(&self, value: i32) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait MotorGateway: StateSource<MotorState> {
    async fn press_button(&self, button: ButtonId) -> Result<MotorState, GatewayError>;
    async fn rotate(&self, direction: Direction, degrees: u32) -> Result<MotorState, GatewayError>;
}

#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(server_url: &str) -> Result<Self, SessionSetupError> {
        Self::with_timeout(server_url, None)
    }

    pub fn with_timeout(
        server_url: &str,
        request_timeout: Option<Duration>,
    ) -> Result<Self, SessionSetupError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(builder.build()?, server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, SessionSetupError> {
        let parsed = Url::parse(server_url.trim()).map_err(|source| {
            SessionSetupError::InvalidServerUrl {
                url: server_url.to_string(),
                source,
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SessionSetupError::UnsupportedScheme(server_url.to_string()));
        }
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::transport(operation, e.to_string()))?;
        let status = response.status();
        debug!(operation, %status, "controller responded");
        response
            .error_for_status()
            .map_err(|e| GatewayError::transport(operation, e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::transport(operation, e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| GatewayError::protocol(operation, e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, GatewayError> {
        let response = self.send(operation, self.request(Method::GET, path)).await?;
        Self::decode(operation, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError> {
        let response = self.post(operation, path, body).await?;
        Self::decode(operation, response).await
    }

    async fn post<B: Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut request = self.request(Method::POST, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(operation, request).await
    }

    async fn write_field(
        &self,
        operation: &'static str,
        field: DeviceField,
        value: FieldValue,
    ) -> Result<(), GatewayError> {
        // Response body is not part of the contract; only the status matters.
        self.post(operation, &device_path(field), Some(&SetValueRequest { value }))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl StateSource<DeviceState> for HttpGateway {
    async fn fetch_state(&self) -> Result<DeviceState, GatewayError> {
        self.get_json("fetch device states", DEVICES_PATH).await
    }
}

#[async_trait]
impl DeviceGateway for HttpGateway {
    async fn set_boolean(&self, switch: Switch, value: bool) -> Result<(), GatewayError> {
        self.write_field(
            "update device",
            DeviceField::Switch(switch),
            FieldValue::Bool(value),
        )
        .await
    }

    async fn set_thermostat(&self, value: i32) -> Result<(), GatewayError> {
        self.write_field(
            "update thermostat",
            DeviceField::Thermostat,
            FieldValue::Integer(i64::from(value)),
        )
        .await
    }
}

#[async_trait]
impl StateSource<MotorState> for HttpGateway {
    async fn fetch_state(&self) -> Result<MotorState, GatewayError> {
        let envelope: StepperEnvelope = self.get_json("fetch stepper state", STEPPER_PATH).await?;
        Ok(envelope.stepper)
    }
}

#[async_trait]
impl MotorGateway for HttpGateway {
    async fn press_button(&self, button: ButtonId) -> Result<MotorState, GatewayError> {
        let response: StepperActionResponse = self
            .post_json("press stepper button", &button_path(button), None::<&()>)
            .await?;
        debug!(%button, action = %response.action, "stepper button acknowledged");
        Ok(response.stepper)
    }

    async fn rotate(&self, direction: Direction, degrees: u32) -> Result<MotorState, GatewayError> {
        let body = RotateRequest { direction, degrees };
        let response: StepperActionResponse = self
            .post_json("rotate stepper", STEPPER_ROTATE_PATH, Some(&body))
            .await?;
        debug!(%direction, degrees, action = %response.action, "stepper rotation acknowledged");
        Ok(response.stepper)
    }
}
