use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::{
    devices::DevicePanel,
    error::SessionSetupError,
    gateway::{DeviceGateway, HttpGateway, MotorGateway},
    motor::{default_motor_options, MotorPanel},
    sync::{AlertSink, LogAlertSink, RefreshOutcome, SyncOptions},
};

/// Controller address compiled into the binary; overridable at runtime.
pub const DEFAULT_SERVER_URL: &str = match option_env!("PANEL_SERVER_URL") {
    Some(url) => url,
    None => "http://127.0.0.1:5000",
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub server_url: String,
    pub request_timeout: Option<Duration>,
    pub devices: SyncOptions,
    pub motor: SyncOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: None,
            devices: SyncOptions::default(),
            motor: default_motor_options(),
        }
    }
}

/// Owns the one store per panel for the lifetime of a client session.
pub struct ControlSession {
    pub devices: DevicePanel,
    pub motor: MotorPanel,
}

impl ControlSession {
    pub fn connect(
        options: &SessionOptions,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Self, SessionSetupError> {
        let gateway = Arc::new(HttpGateway::with_timeout(
            &options.server_url,
            options.request_timeout,
        )?);
        info!(server_url = gateway.base_url(), "control session created");
        Ok(Self::with_gateway(gateway, options, alerts))
    }

    pub fn with_gateway<G>(gateway: Arc<G>, options: &SessionOptions, alerts: Arc<dyn AlertSink>) -> Self
    where
        G: DeviceGateway + MotorGateway + 'static,
    {
        Self {
            devices: DevicePanel::new(gateway.clone(), options.devices, alerts.clone()),
            motor: MotorPanel::new(gateway, options.motor, alerts),
        }
    }

    pub fn with_default_alerts(options: &SessionOptions) -> Result<Self, SessionSetupError> {
        Self::connect(options, Arc::new(LogAlertSink))
    }

    /// Initial hydration of both panels, run once when the session starts.
    pub async fn start(&self) -> (RefreshOutcome, RefreshOutcome) {
        futures::join!(self.devices.refresh(), self.motor.refresh())
    }
}
