//! Home device panel: four switches and a thermostat.

use std::sync::Arc;

use shared::domain::{clamp_thermostat, DeviceField, DeviceState, Switch};
use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::{
    gateway::DeviceGateway,
    store::{PanelState, StateStore},
    sync::{
        AlertSink, CommandOutcome, RefreshOutcome, SyncCore, SyncEvent, SyncOptions, SyncStatus,
    },
};

/// Single-field optimistic edit of [`DeviceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePatch {
    Switch(Switch, bool),
    Thermostat(i32),
}

impl PanelState for DeviceState {
    type Field = DeviceField;
    type Patch = DevicePatch;

    fn merge(&mut self, patch: &DevicePatch) {
        match *patch {
            DevicePatch::Switch(switch, on) => self.set_switch(switch, on),
            DevicePatch::Thermostat(value) => self.thermostat = value,
        }
    }

    fn patched_fields(patch: &DevicePatch) -> Vec<DeviceField> {
        match *patch {
            DevicePatch::Switch(switch, _) => vec![DeviceField::Switch(switch)],
            DevicePatch::Thermostat(_) => vec![DeviceField::Thermostat],
        }
    }

    fn copy_field(&mut self, source: &Self, field: DeviceField) {
        match field {
            DeviceField::Switch(switch) => self.set_switch(switch, source.switch(switch)),
            DeviceField::Thermostat => self.thermostat = source.thermostat,
        }
    }

    fn normalize(&mut self) {
        self.thermostat = clamp_thermostat(i64::from(self.thermostat));
    }
}

pub struct DevicePanel {
    core: SyncCore<DeviceState>,
    gateway: Arc<dyn DeviceGateway>,
}

impl DevicePanel {
    pub fn new<G>(gateway: Arc<G>, options: SyncOptions, alerts: Arc<dyn AlertSink>) -> Self
    where
        G: DeviceGateway + 'static,
    {
        let store = Arc::new(StateStore::new(DeviceState::default()));
        let core = SyncCore::new("devices", store, gateway.clone(), options, alerts);
        Self { core, gateway }
    }

    pub fn state(&self) -> DeviceState {
        self.core.store().get()
    }

    pub fn store(&self) -> &Arc<StateStore<DeviceState>> {
        self.core.store()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceState> {
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

    /// Flips `switch`, showing the new value before the controller confirms it.
    pub async fn toggle(&self, switch: Switch) -> CommandOutcome {
        let value = !self.state().switch(switch);
        info!(device = %switch, value, "toggle requested");
        self.core
            .optimistic_command(
                switch.as_str(),
                DevicePatch::Switch(switch, value),
                self.gateway.set_boolean(switch, value),
            )
            .await
    }

    pub async fn adjust_thermostat(&self, delta: i64) -> CommandOutcome {
        let current = i64::from(self.state().thermostat);
        self.set_thermostat(current.saturating_add(delta)).await
    }

    /// Requests `value`, clamped to the thermostat range before it is shown or sent.
    pub async fn set_thermostat(&self, value: i64) -> CommandOutcome {
        let value = clamp_thermostat(value);
        info!(value, "thermostat change requested");
        self.core
            .optimistic_command(
                DeviceField::Thermostat.as_str(),
                DevicePatch::Thermostat(value),
                self.gateway.set_thermostat(value),
            )
            .await
    }
}

#[cfg(test)]
#[path = "tests/devices_tests.rs"]
mod tests;
