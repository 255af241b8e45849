//! Plain-text views of the two panels.

use std::fmt::Write as _;

use client_core::{ControlSession, SyncStatus};
use shared::domain::{DeviceState, MotorState, Switch, PRESETS};

pub fn devices_view(session: &ControlSession) -> String {
    render_devices(&session.devices.state(), &session.devices.status())
}

pub fn motor_view(session: &ControlSession) -> String {
    render_motor(&session.motor.state(), &session.motor.status())
}

pub fn render_devices(state: &DeviceState, status: &SyncStatus) -> String {
    let mut out = String::from("Devices");
    out.push_str(&status_suffix(status));
    out.push('\n');
    for switch in Switch::ALL {
        let label = switch_label(switch, state.switch(switch));
        let _ = writeln!(out, "  {:<11}{label}", switch.as_str());
    }
    let _ = writeln!(out, "  {:<11}{}°C", "thermostat", state.thermostat);
    let _ = write!(out, "  {}/{} switches on", state.active_switches(), Switch::ALL.len());
    out
}

pub fn render_motor(state: &MotorState, status: &SyncStatus) -> String {
    let mut out = String::from("Stepper");
    out.push_str(&status_suffix(status));
    out.push('\n');
    let _ = writeln!(
        out,
        "  {} {} at {}°",
        if state.running { "running" } else { "idle" },
        state.direction,
        state.rotation
    );
    match state.last_command_at() {
        Some(at) => {
            let _ = writeln!(out, "  last command {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => out.push_str("  no command yet\n"),
    }
    let presets: Vec<String> = PRESETS.iter().map(ToString::to_string).collect();
    let _ = write!(out, "  {}", presets.join(" | "));
    out
}

fn switch_label(switch: Switch, on: bool) -> &'static str {
    match (switch, on) {
        (Switch::DoorLock, true) => "locked",
        (Switch::DoorLock, false) => "unlocked",
        (_, true) => "on",
        (_, false) => "off",
    }
}

fn status_suffix(status: &SyncStatus) -> String {
    let mut parts = Vec::new();
    if status.is_loading() {
        parts.push("loading".to_string());
    }
    if status.in_flight > 0 {
        parts.push(format!("{} pending", status.in_flight));
    }
    if let Some(failure) = &status.last_failure {
        parts.push(format!("last {} failed: {}", failure.label, failure.error));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parts.join(", "))
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
