use chrono::{DateTime, Utc};
use shared::{
    domain::{
        clamp_thermostat, normalize_rotation, ButtonId, DeviceField, DeviceState, Direction,
        MotorState,
    },
    error::{ApiError, ErrorCode},
    protocol::FieldValue,
};
use tokio::sync::Mutex;

/// In-memory stand-in for the controller hardware.
#[derive(Debug, Default)]
pub(crate) struct AppState {
    pub(crate) devices: Mutex<DeviceState>,
    pub(crate) stepper: Mutex<MotorState>,
}

impl AppState {
    /// Writes one field and returns the value actually stored.
    pub(crate) async fn set_field(
        &self,
        field: DeviceField,
        value: FieldValue,
    ) -> Result<FieldValue, ApiError> {
        let mut devices = self.devices.lock().await;
        match (field, value) {
            (DeviceField::Switch(switch), FieldValue::Bool(on)) => {
                devices.set_switch(switch, on);
                Ok(FieldValue::Bool(on))
            }
            (DeviceField::Thermostat, FieldValue::Integer(requested)) => {
                devices.thermostat = clamp_thermostat(requested);
                Ok(FieldValue::Integer(i64::from(devices.thermostat)))
            }
            (DeviceField::Switch(_), FieldValue::Integer(_)) => Err(ApiError::new(
                ErrorCode::Validation,
                format!("{field} expects a boolean value"),
            )),
            (DeviceField::Thermostat, FieldValue::Bool(_)) => Err(ApiError::new(
                ErrorCode::Validation,
                "thermostat expects an integer value",
            )),
        }
    }

    pub(crate) async fn press(
        &self,
        button: ButtonId,
        now: DateTime<Utc>,
    ) -> Result<(MotorState, String), ApiError> {
        let preset = button.preset().ok_or_else(|| {
            ApiError::new(ErrorCode::NotFound, format!("no preset for button {button}"))
        })?;
        let stepper = self.spin(preset.direction, preset.degrees, now).await;
        Ok((stepper, preset.to_string()))
    }

    /// Rotation compounds on top of the current position.
    pub(crate) async fn spin(
        &self,
        direction: Direction,
        degrees: u32,
        now: DateTime<Utc>,
    ) -> MotorState {
        let mut stepper = self.stepper.lock().await;
        stepper.running = true;
        stepper.direction = direction;
        stepper.rotation = normalize_rotation(
            i64::from(stepper.rotation) + direction.signum() * i64::from(degrees),
        );
        stepper.last_command_time = now.timestamp_millis() as f64 / 1000.0;
        *stepper
    }
}
