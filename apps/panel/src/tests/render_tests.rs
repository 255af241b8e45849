use super::*;
use client_core::{GatewayError, SyncFailure};
use shared::domain::Direction;

#[test]
fn device_view_lists_every_switch_and_the_setpoint() {
    let view = render_devices(&DeviceState::default(), &SyncStatus::default());

    assert_eq!(
        view,
        "Devices\n  light      off\n  camera     on\n  speaker    off\n  doorLock   locked\n  thermostat 21°C\n  2/4 switches on"
    );
}

#[test]
fn status_suffix_reports_loading_and_failures() {
    let status = SyncStatus {
        refreshing: 1,
        in_flight: 2,
        last_failure: Some(SyncFailure {
            command: None,
            label: "refresh".to_string(),
            error: GatewayError::transport("fetch device states", "connection refused"),
        }),
    };

    let first_line = render_devices(&DeviceState::default(), &status)
        .lines()
        .next()
        .map(str::to_string)
        .expect("header");

    assert_eq!(
        first_line,
        "Devices [loading, 2 pending, last refresh failed: fetch device states failed: connection refused]"
    );
}

#[test]
fn motor_view_shows_position_and_command_time() {
    let state = MotorState {
        running: true,
        direction: Direction::CounterClockwise,
        rotation: 270,
        last_command_time: 1_700_000_000.0,
    };

    let view = render_motor(&state, &SyncStatus::default());

    assert!(view.starts_with("Stepper\n  running CCW at 270°\n"), "{view}");
    assert!(view.contains("last command 2023-11-14 22:13:20 UTC"), "{view}");
    assert!(view.ends_with("Button 1: CW 90° | Button 2: CCW 90° | Button 3: CW 180°"));
}

#[test]
fn idle_motor_without_history() {
    let view = render_motor(&MotorState::default(), &SyncStatus::default());
    assert!(view.contains("idle CW at 0°"));
    assert!(view.contains("no command yet"));
}
