use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseDomainError;

pub const THERMOSTAT_MIN: i32 = 16;
pub const THERMOSTAT_MAX: i32 = 30;
pub const THERMOSTAT_DEFAULT: i32 = 21;
pub const FULL_TURN_DEGREES: i32 = 360;

/// Clamps a requested thermostat setting into `[THERMOSTAT_MIN, THERMOSTAT_MAX]`.
pub fn clamp_thermostat(value: i64) -> i32 {
    value.clamp(i64::from(THERMOSTAT_MIN), i64::from(THERMOSTAT_MAX)) as i32
}

/// Reduces an arbitrary angle into `[0, 360)`.
pub fn normalize_rotation(degrees: i64) -> i32 {
    degrees.rem_euclid(i64::from(FULL_TURN_DEGREES)) as i32
}

/// On/off devices on the home panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Switch {
    Light,
    Camera,
    Speaker,
    DoorLock,
}

impl Switch {
    pub const ALL: [Switch; 4] = [
        Switch::Light,
        Switch::Camera,
        Switch::Speaker,
        Switch::DoorLock,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Switch::Light => "light",
            Switch::Camera => "camera",
            Switch::Speaker => "speaker",
            Switch::DoorLock => "doorLock",
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Switch {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Switch::ALL
            .into_iter()
            .find(|switch| {
                switch.as_str().eq_ignore_ascii_case(wanted)
                    || (*switch == Switch::DoorLock
                        && (wanted.eq_ignore_ascii_case("door_lock")
                            || wanted.eq_ignore_ascii_case("door-lock")))
            })
            .ok_or_else(|| ParseDomainError::UnknownDevice(wanted.to_string()))
    }
}

/// Addressable field of [`DeviceState`]; doubles as the `{device}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceField {
    Switch(Switch),
    Thermostat,
}

impl DeviceField {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceField::Switch(switch) => switch.as_str(),
            DeviceField::Thermostat => "thermostat",
        }
    }
}

impl fmt::Display for DeviceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceField {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("thermostat") {
            return Ok(DeviceField::Thermostat);
        }
        s.parse().map(DeviceField::Switch)
    }
}

impl From<Switch> for DeviceField {
    fn from(value: Switch) -> Self {
        DeviceField::Switch(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub light: bool,
    pub thermostat: i32,
    pub camera: bool,
    pub speaker: bool,
    pub door_lock: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            light: false,
            thermostat: THERMOSTAT_DEFAULT,
            camera: true,
            speaker: false,
            door_lock: true,
        }
    }
}

impl DeviceState {
    pub fn switch(&self, switch: Switch) -> bool {
        match switch {
            Switch::Light => self.light,
            Switch::Camera => self.camera,
            Switch::Speaker => self.speaker,
            Switch::DoorLock => self.door_lock,
        }
    }

    pub fn set_switch(&mut self, switch: Switch, on: bool) {
        match switch {
            Switch::Light => self.light = on,
            Switch::Camera => self.camera = on,
            Switch::Speaker => self.speaker = on,
            Switch::DoorLock => self.door_lock = on,
        }
    }

    pub fn active_switches(&self) -> usize {
        Switch::ALL
            .into_iter()
            .filter(|switch| self.switch(*switch))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "CW")]
    Clockwise,
    #[serde(rename = "CCW")]
    CounterClockwise,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Clockwise => "CW",
            Direction::CounterClockwise => "CCW",
        }
    }

    /// Sign applied to a rotation in this direction.
    pub fn signum(self) -> i64 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cw" | "clockwise" => Ok(Direction::Clockwise),
            "ccw" | "counterclockwise" | "counter-clockwise" => Ok(Direction::CounterClockwise),
            other => Err(ParseDomainError::UnknownDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorState {
    pub running: bool,
    pub direction: Direction,
    pub rotation: i32,
    /// Seconds since the Unix epoch, as reported by the controller.
    pub last_command_time: f64,
}

impl MotorState {
    pub fn last_command_at(&self) -> Option<DateTime<Utc>> {
        if !self.last_command_time.is_finite() || self.last_command_time <= 0.0 {
            return None;
        }
        let millis = (self.last_command_time * 1000.0).round() as i64;
        Utc.timestamp_millis_opt(millis).single()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ButtonId(pub u32);

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed rotation bound to a panel button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub button: ButtonId,
    pub direction: Direction,
    pub degrees: u32,
}

pub const PRESETS: [Preset; 3] = [
    Preset {
        button: ButtonId(1),
        direction: Direction::Clockwise,
        degrees: 90,
    },
    Preset {
        button: ButtonId(2),
        direction: Direction::CounterClockwise,
        degrees: 90,
    },
    Preset {
        button: ButtonId(3),
        direction: Direction::Clockwise,
        degrees: 180,
    },
];

impl ButtonId {
    /// Display-side label for the button; the controller owns the real mapping.
    pub fn preset(self) -> Option<Preset> {
        PRESETS.into_iter().find(|preset| preset.button == self)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Button {}: {} {}°",
            self.button, self.direction, self.degrees
        )
    }
}
