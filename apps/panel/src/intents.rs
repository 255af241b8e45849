use std::{fmt, str::FromStr};

use client_core::{CommandOutcome, ControlSession, RefreshOutcome};
use shared::domain::{ButtonId, Direction, Switch};

pub const SHELL_HELP: &str = "\
commands:
  toggle <light|camera|speaker|doorLock>
  thermostat <+n|-n>        adjust by n degrees
  thermostat set <n>
  press <button>
  rotate <CW|CCW> <degrees>
  refresh | status | help | quit";

/// One user intent, as typed in the shell or given as a subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Toggle(Switch),
    AdjustThermostat(i64),
    SetThermostat(i64),
    Press(ButtonId),
    Rotate(Direction, u32),
    Refresh,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Command(CommandOutcome),
    Refreshed {
        devices: RefreshOutcome,
        motor: RefreshOutcome,
    },
    Nothing,
}

impl Dispatched {
    pub fn succeeded(self) -> bool {
        match self {
            Dispatched::Command(outcome) => outcome.is_committed(),
            Dispatched::Refreshed { devices, motor } => {
                devices != RefreshOutcome::Failed && motor != RefreshOutcome::Failed
            }
            Dispatched::Nothing => true,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Toggle(switch) => write!(f, "toggle {switch}"),
            Intent::AdjustThermostat(delta) => write!(f, "thermostat {delta:+}"),
            Intent::SetThermostat(value) => write!(f, "thermostat set {value}"),
            Intent::Press(button) => write!(f, "press {button}"),
            Intent::Rotate(direction, degrees) => write!(f, "rotate {direction} {degrees}"),
            Intent::Refresh => f.write_str("refresh"),
            Intent::Status => f.write_str("status"),
            Intent::Help => f.write_str("help"),
            Intent::Quit => f.write_str("quit"),
        }
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let intent = match words.as_slice() {
            ["toggle", device] => Intent::Toggle(device.parse().map_err(|e| format!("{e}"))?),
            ["thermostat", "set", value] => Intent::SetThermostat(number(value)?),
            ["thermostat", delta] => Intent::AdjustThermostat(number(delta)?),
            ["press", button] => Intent::Press(ButtonId(number(button)?)),
            ["rotate", direction, degrees] => Intent::Rotate(
                direction.parse().map_err(|e| format!("{e}"))?,
                number(degrees)?,
            ),
            ["refresh"] => Intent::Refresh,
            ["status"] => Intent::Status,
            ["help"] | ["?"] => Intent::Help,
            ["quit"] | ["exit"] => Intent::Quit,
            [] => return Err("empty command".to_string()),
            _ => return Err(format!("unrecognized command '{line}'; type help")),
        };
        Ok(intent)
    }
}

fn number<T: FromStr>(raw: &str) -> Result<T, String>
where
    T::Err: fmt::Display,
{
    raw.trim_start_matches('+')
        .parse()
        .map_err(|e| format!("invalid number '{raw}': {e}"))
}

/// Runs `intent` against the session. Display-only intents do nothing here.
pub async fn dispatch(session: &ControlSession, intent: Intent) -> Dispatched {
    let outcome = match intent {
        Intent::Toggle(switch) => session.devices.toggle(switch).await,
        Intent::AdjustThermostat(delta) => session.devices.adjust_thermostat(delta).await,
        Intent::SetThermostat(value) => session.devices.set_thermostat(value).await,
        Intent::Press(button) => session.motor.press_button(button).await,
        Intent::Rotate(direction, degrees) => session.motor.rotate(direction, degrees).await,
        Intent::Refresh => {
            let (devices, motor) = session.start().await;
            return Dispatched::Refreshed { devices, motor };
        }
        Intent::Status | Intent::Help | Intent::Quit => return Dispatched::Nothing,
    };
    Dispatched::Command(outcome)
}

#[cfg(test)]
#[path = "tests/intents_tests.rs"]
mod tests;
