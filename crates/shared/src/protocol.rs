use serde::{Deserialize, Serialize};

use crate::domain::{ButtonId, DeviceField, Direction, MotorState};

pub const DEVICES_PATH: &str = "/api/devices";
pub const STEPPER_PATH: &str = "/api/stepper";
pub const STEPPER_ROTATE_PATH: &str = "/api/stepper/rotate";

pub fn device_path(field: DeviceField) -> String {
    format!("{DEVICES_PATH}/{field}")
}

pub fn button_path(button: ButtonId) -> String {
    format!("{STEPPER_PATH}/button/{button}")
}

/// Value carried by a device write; booleans for switches, integers for the thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetValueRequest {
    pub value: FieldValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceUpdateAck {
    pub device: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepperEnvelope {
    pub stepper: MotorState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepperActionResponse {
    pub stepper: MotorState,
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateRequest {
    pub direction: Direction,
    pub degrees: u32,
}
