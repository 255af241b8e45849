//! Stepper motor panel. Rotation compounds on the controller, so nothing is
//! written locally until the controller answers.

use std::{convert::Infallible, sync::Arc};

use shared::domain::{normalize_rotation, ButtonId, Direction, MotorState};
use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::{
    gateway::MotorGateway,
    store::{PanelState, StateStore},
    sync::{
        AlertSink, CommandOutcome, FailurePolicy, RefreshOutcome, SyncCore, SyncEvent,
        SyncOptions, SyncStatus,
    },
};

impl PanelState for MotorState {
    // No optimistic edits exist for the motor.
    type Field = Infallible;
    type Patch = Infallible;

    fn merge(&mut self, patch: &Infallible) {
        match *patch {}
    }

    fn patched_fields(patch: &Infallible) -> Vec<Infallible> {
        match *patch {}
    }

    fn copy_field(&mut self, _source: &Self, field: Infallible) {
        match field {}
    }

    fn normalize(&mut self) {
        self.rotation = normalize_rotation(i64::from(self.rotation));
    }
}

/// Motor defaults keep failures local: no re-fetch after a rejected command.
pub fn default_motor_options() -> SyncOptions {
    SyncOptions {
        failure_policy: FailurePolicy::Surface,
        ..SyncOptions::default()
    }
}

pub struct MotorPanel {
    core: SyncCore<MotorState>,
    gateway: Arc<dyn MotorGateway>,
}

impl MotorPanel {
    pub fn new<G>(gateway: Arc<G>, options: SyncOptions, alerts: Arc<dyn AlertSink>) -> Self
    where
        G: MotorGateway + 'static,
    {
        let store = Arc::new(StateStore::new(MotorState::default()));
        let core = SyncCore::new("motor", store, gateway.clone(), options, alerts);
        Self { core, gateway }
    }

    pub fn state(&self) -> MotorState {
        self.core.store().get()
    }

    pub fn store(&self) -> &Arc<StateStore<MotorState>> {
        self.core.store()
    }

    pub fn subscribe(&self) -> watch::Receiver<MotorState> {
        self.core.store().subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.core.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.core.subscribe_status()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.core.subscribe_events()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.core.refresh().await
    }

    pub async fn press_button(&self, button: ButtonId) -> CommandOutcome {
        match button.preset() {
            Some(preset) => info!(%preset, "stepper button pressed"),
            None => info!(%button, "stepper button pressed (no local preset)"),
        }
        self.core
            .authoritative_command(
                format!("send button {button} command"),
                self.gateway.press_button(button),
            )
            .await
    }

    pub async fn rotate(&self, direction: Direction, degrees: u32) -> CommandOutcome {
        info!(%direction, degrees, "stepper rotation requested");
        self.core
            .authoritative_command(
                format!("rotate {direction} {degrees}°"),
                self.gateway.rotate(direction, degrees),
            )
            .await
    }
}

#[cfg(test)]
#[path = "tests/motor_tests.rs"]
mod tests;
