//! In-process gateway double and alert recorder shared by the unit tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex as StdMutex,
};

use async_trait::async_trait;
use shared::domain::{normalize_rotation, ButtonId, DeviceState, Direction, MotorState, Switch};
use tokio::sync::{Mutex, Notify};

use crate::{
    error::GatewayError,
    gateway::{DeviceGateway, MotorGateway, StateSource},
    sync::AlertSink,
};

/// Parks a gateway call until the test releases it.
#[derive(Default)]
pub(crate) struct Gate {
    arrived: Notify,
    release: Notify,
}

impl Gate {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) async fn wait_arrival(&self) {
        self.arrived.notified().await;
    }

    pub(crate) fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.arrived.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GatewayCall {
    FetchDevices,
    FetchMotor,
    SetBoolean(Switch, bool),
    SetThermostat(i32),
    PressButton(ButtonId),
    Rotate(Direction, u32),
}

/// Controller stand-in holding authoritative state in memory.
pub(crate) struct ScriptedGateway {
    pub(crate) remote_devices: Mutex<DeviceState>,
    pub(crate) remote_motor: Mutex<MotorState>,
    pub(crate) fail_commands: AtomicBool,
    pub(crate) fail_fetches: AtomicBool,
    /// When set, motor commands return this instead of simulating rotation.
    pub(crate) motor_reply: Mutex<Option<MotorState>>,
    pub(crate) calls: Mutex<Vec<GatewayCall>>,
    command_gate: Option<Arc<Gate>>,
    fetch_gate: Option<Arc<Gate>>,
    clock: Mutex<f64>,
}

impl ScriptedGateway {
    pub(crate) fn new(remote_devices: DeviceState) -> Self {
        Self {
            remote_devices: Mutex::new(remote_devices),
            remote_motor: Mutex::new(MotorState::default()),
            fail_commands: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            motor_reply: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            command_gate: None,
            fetch_gate: None,
            clock: Mutex::new(1_700_000_000.0),
        }
    }

    pub(crate) fn with_command_gate(mut self, gate: Arc<Gate>) -> Self {
        self.command_gate = Some(gate);
        self
    }

    pub(crate) fn with_fetch_gate(mut self, gate: Arc<Gate>) -> Self {
        self.fetch_gate = Some(gate);
        self
    }

    pub(crate) fn failing_commands(self) -> Self {
        self.fail_commands.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn set_fetch_failure(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub(crate) async fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: GatewayCall) {
        self.calls.lock().await.push(call);
    }

    async fn command_checkpoint(&self, operation: &'static str) -> Result<(), GatewayError> {
        if let Some(gate) = &self.command_gate {
            gate.pass().await;
        }
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(GatewayError::transport(
                operation,
                "HTTP status server error (500 Internal Server Error)",
            ));
        }
        Ok(())
    }

    async fn fetch_checkpoint(&self, operation: &'static str) -> Result<(), GatewayError> {
        if let Some(gate) = &self.fetch_gate {
            gate.pass().await;
        }
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(GatewayError::transport(operation, "connection refused"));
        }
        Ok(())
    }

    async fn spin(&self, direction: Direction, degrees: u32) -> MotorState {
        if let Some(reply) = *self.motor_reply.lock().await {
            return reply;
        }
        let mut clock = self.clock.lock().await;
        *clock += 1.0;
        let mut motor = self.remote_motor.lock().await;
        motor.running = true;
        motor.direction = direction;
        motor.rotation = normalize_rotation(
            i64::from(motor.rotation) + direction.signum() * i64::from(degrees),
        );
        motor.last_command_time = *clock;
        *motor
    }
}

#[async_trait]
impl StateSource<DeviceState> for ScriptedGateway {
    async fn fetch_state(&self) -> Result<DeviceState, GatewayError> {
        self.record(GatewayCall::FetchDevices).await;
        // Snapshot first: a held fetch models a response already on the wire.
        let snapshot = *self.remote_devices.lock().await;
        self.fetch_checkpoint("fetch device states").await?;
        Ok(snapshot)
    }
}

#[async_trait]
impl DeviceGateway for ScriptedGateway {
    async fn set_boolean(&self, switch: Switch, value: bool) -> Result<(), GatewayError> {
        self.record(GatewayCall::SetBoolean(switch, value)).await;
        self.command_checkpoint("update device").await?;
        self.remote_devices.lock().await.set_switch(switch, value);
        Ok(())
    }

    async fn set_thermostat(&self, value: i32) -> Result<(), GatewayError> {
        self.record(GatewayCall::SetThermostat(value)).await;
        self.command_checkpoint("update thermostat").await?;
        self.remote_devices.lock().await.thermostat = value;
        Ok(())
    }
}

#[async_trait]
impl StateSource<MotorState> for ScriptedGateway {
    async fn fetch_state(&self) -> Result<MotorState, GatewayError> {
        self.record(GatewayCall::FetchMotor).await;
        let snapshot = *self.remote_motor.lock().await;
        self.fetch_checkpoint("fetch stepper state").await?;
        Ok(snapshot)
    }
}

#[async_trait]
impl MotorGateway for ScriptedGateway {
    async fn press_button(&self, button: ButtonId) -> Result<MotorState, GatewayError> {
        self.record(GatewayCall::PressButton(button)).await;
        self.command_checkpoint("press stepper button").await?;
        let Some(preset) = button.preset() else {
            return Err(GatewayError::transport(
                "press stepper button",
                "HTTP status client error (404 Not Found)",
            ));
        };
        Ok(self.spin(preset.direction, preset.degrees).await)
    }

    async fn rotate(&self, direction: Direction, degrees: u32) -> Result<MotorState, GatewayError> {
        self.record(GatewayCall::Rotate(direction, degrees)).await;
        self.command_checkpoint("rotate stepper").await?;
        Ok(self.spin(direction, degrees).await)
    }
}

#[derive(Default)]
pub(crate) struct RecordingAlerts {
    alerts: StdMutex<Vec<(String, String)>>,
}

impl RecordingAlerts {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.alerts
            .lock()
            .expect("alerts lock")
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .expect("alerts lock")
            .push((title.to_string(), message.to_string()));
    }
}

/// The panel-1 scenario state: light off, 21°C, camera on, speaker off, door locked.
pub(crate) fn scenario_devices() -> DeviceState {
    DeviceState {
        light: false,
        thermostat: 21,
        camera: true,
        speaker: false,
        door_lock: true,
    }
}
