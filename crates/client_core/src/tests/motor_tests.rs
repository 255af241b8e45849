use super::*;
use crate::test_support::{scenario_devices, Gate, GatewayCall, RecordingAlerts, ScriptedGateway};

fn motor_panel(
    gateway: ScriptedGateway,
    options: SyncOptions,
) -> (Arc<MotorPanel>, Arc<ScriptedGateway>, Arc<RecordingAlerts>) {
    let gateway = Arc::new(gateway);
    let alerts = Arc::new(RecordingAlerts::default());
    let panel = Arc::new(MotorPanel::new(gateway.clone(), options, alerts.clone()));
    (panel, gateway, alerts)
}

#[tokio::test]
async fn store_is_untouched_until_the_controller_answers() {
    let gate = Gate::new();
    let (panel, _gateway, _alerts) = motor_panel(
        ScriptedGateway::new(scenario_devices()).with_command_gate(gate.clone()),
        default_motor_options(),
    );
    let before = panel.state();
    let rx = panel.subscribe();

    let task = tokio::spawn({
        let panel = panel.clone();
        async move { panel.press_button(ButtonId(1)).await }
    });
    gate.wait_arrival().await;

    assert_eq!(panel.state(), before);
    assert!(!rx.has_changed().expect("alive"));
    assert_eq!(panel.status().in_flight, 1);
    assert!(!panel.status().is_loading());

    gate.release();
    assert_eq!(task.await.expect("join"), CommandOutcome::Committed);
    assert!(rx.has_changed().expect("alive"));
}

#[tokio::test]
async fn button_response_replaces_state_verbatim() {
    let (panel, gateway, _alerts) = motor_panel(
        ScriptedGateway::new(scenario_devices()),
        default_motor_options(),
    );
    let reply = MotorState {
        running: true,
        direction: Direction::Clockwise,
        rotation: 90,
        last_command_time: 1_714_000_000.25,
    };
    *gateway.motor_reply.lock().await = Some(reply);

    assert_eq!(panel.press_button(ButtonId(1)).await, CommandOutcome::Committed);

    assert_eq!(panel.state(), reply);
    assert_eq!(gateway.calls().await, vec![GatewayCall::PressButton(ButtonId(1))]);
}

#[tokio::test]
async fn rotations_compound_across_commands() {
    let (panel, _gateway, _alerts) = motor_panel(
        ScriptedGateway::new(scenario_devices()),
        default_motor_options(),
    );

    panel.press_button(ButtonId(3)).await;
    assert_eq!(panel.state().rotation, 180);
    panel.press_button(ButtonId(3)).await;
    assert_eq!(panel.state().rotation, 0);
    panel.press_button(ButtonId(2)).await;
    assert_eq!(panel.state().rotation, 270);
    assert_eq!(panel.state().direction, Direction::CounterClockwise);

    panel.rotate(Direction::Clockwise, 45).await;
    let state = panel.state();
    assert_eq!(state.rotation, 315);
    assert_eq!(state.direction, Direction::Clockwise);
    assert!(state.running);
    assert!(state.last_command_at().is_some());
}

#[tokio::test]
async fn failed_command_surfaces_without_refetch() {
    let (panel, gateway, alerts) = motor_panel(
        ScriptedGateway::new(scenario_devices()).failing_commands(),
        default_motor_options(),
    );
    let before = panel.state();

    assert_eq!(panel.press_button(ButtonId(1)).await, CommandOutcome::Failed);

    assert_eq!(panel.state(), before);
    assert_eq!(gateway.calls().await, vec![GatewayCall::PressButton(ButtonId(1))]);
    assert_eq!(
        alerts.messages(),
        vec!["Failed to send button 1 command".to_string()]
    );
    let status = panel.status();
    assert_eq!(status.in_flight, 0);
    let failure = status.last_failure.expect("failure");
    assert_eq!(failure.label, "send button 1 command");
    assert_eq!(failure.error.operation(), "press stepper button");
}

#[tokio::test]
async fn resync_policy_refetches_after_a_failed_rotation() {
    let (panel, gateway, alerts) = motor_panel(
        ScriptedGateway::new(scenario_devices()).failing_commands(),
        SyncOptions::default(),
    );
    *gateway.remote_motor.lock().await = MotorState {
        rotation: 135,
        ..MotorState::default()
    };

    assert_eq!(
        panel.rotate(Direction::CounterClockwise, 10).await,
        CommandOutcome::Resynchronized
    );

    assert_eq!(panel.state().rotation, 135);
    assert_eq!(
        gateway.calls().await,
        vec![
            GatewayCall::Rotate(Direction::CounterClockwise, 10),
            GatewayCall::FetchMotor
        ]
    );
    assert_eq!(alerts.messages(), vec!["Failed to rotate CCW 10°".to_string()]);
}

#[tokio::test]
async fn unknown_button_is_reported() {
    let (panel, _gateway, alerts) = motor_panel(
        ScriptedGateway::new(scenario_devices()),
        default_motor_options(),
    );

    assert_eq!(panel.press_button(ButtonId(9)).await, CommandOutcome::Failed);
    assert_eq!(panel.state(), MotorState::default());
    assert_eq!(
        alerts.messages(),
        vec!["Failed to send button 9 command".to_string()]
    );
}

#[tokio::test]
async fn refresh_wraps_out_of_range_rotation() {
    let (panel, gateway, _alerts) = motor_panel(
        ScriptedGateway::new(scenario_devices()),
        default_motor_options(),
    );
    *gateway.remote_motor.lock().await = MotorState {
        rotation: -90,
        ..MotorState::default()
    };

    assert_eq!(panel.refresh().await, RefreshOutcome::Updated);
    assert_eq!(panel.state().rotation, 270);
}
