//! Panel-agnostic optimistic command and reconciliation protocol.

use std::{
    fmt,
    future::Future,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::{
    error::GatewayError,
    gateway::StateSource,
    store::{PanelState, StateStore, Ticket, WriteResult},
};

const ALERT_TITLE: &str = "Error";
const REFRESH_FAILED_MESSAGE: &str = "Failed to connect to the server";

/// What a panel does after a command is rejected or lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Re-fetch the full state and replace the store with it.
    #[default]
    Resync,
    /// Report the failure and leave authoritative state alone; optimistic
    /// edits made by the failed command are undone.
    Surface,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resync" => Ok(Self::Resync),
            "surface" => Ok(Self::Surface),
            other => Err(format!(
                "unknown failure policy '{other}', expected resync or surface"
            )),
        }
    }
}

/// How authoritative responses are ordered against concurrent writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Whatever resolves last overwrites the store.
    #[default]
    LastResolvedWins,
    /// Responses to older requests never overwrite newer writes.
    Sequenced,
}

impl FromStr for ResponseOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "lastresolvedwins" => Ok(Self::LastResolvedWins),
            "sequenced" => Ok(Self::Sequenced),
            other => Err(format!(
                "unknown response ordering '{other}', expected last-resolved-wins or sequenced"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    pub failure_policy: FailurePolicy,
    pub ordering: ResponseOrdering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    Pending,
    Committed,
    Failed,
}

/// Terminal result of a user intent, as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Committed,
    /// The command failed and the store was reloaded from the controller.
    Resynchronized,
    /// The command failed and its optimistic edits were undone locally.
    RolledBack,
    /// The command failed and the store was left as it was.
    Failed,
}

impl CommandOutcome {
    pub fn is_committed(self) -> bool {
        self == Self::Committed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    Unchanged,
    /// The response was older than state already applied and was dropped.
    Superseded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub command: Option<CommandId>,
    pub label: String,
    pub error: GatewayError,
}

/// Advisory status for display; nothing is gated on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub refreshing: usize,
    pub in_flight: usize,
    pub last_failure: Option<SyncFailure>,
}

impl SyncStatus {
    pub fn is_loading(&self) -> bool {
        self.refreshing > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Command {
        id: CommandId,
        label: String,
        phase: CommandPhase,
    },
    Refreshed(RefreshOutcome),
}

/// Where user-facing failure notices go.
pub trait AlertSink: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, title: &str, message: &str) {
        warn!(title, message, "alert");
    }
}

pub struct SyncCore<S: PanelState> {
    panel: &'static str,
    store: Arc<StateStore<S>>,
    source: Arc<dyn StateSource<S>>,
    options: SyncOptions,
    alerts: Arc<dyn AlertSink>,
    status: watch::Sender<SyncStatus>,
    events: broadcast::Sender<SyncEvent>,
    next_command: AtomicU64,
}

impl<S: PanelState> SyncCore<S> {
    pub fn new(
        panel: &'static str,
        store: Arc<StateStore<S>>,
        source: Arc<dyn StateSource<S>>,
        options: SyncOptions,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        let (events, _) = broadcast::channel(256);
        Self {
            panel,
            store,
            source,
            options,
            alerts,
            status,
            events,
            next_command: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &Arc<StateStore<S>> {
        &self.store
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Unconditional fetch-and-replace.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.fetch_and_replace(true).await
    }

    /// Resync after a failed command; the command's failure stays recorded.
    async fn resync(&self) -> RefreshOutcome {
        self.fetch_and_replace(false).await
    }

    async fn fetch_and_replace(&self, manual: bool) -> RefreshOutcome {
        self.status.send_modify(|status| status.refreshing += 1);
        let issued = self.store.issue_ticket();
        let outcome = match self.source.fetch_state().await {
            Ok(state) => {
                let outcome = match self.write_authoritative(state, issued) {
                    WriteResult::Changed => RefreshOutcome::Updated,
                    WriteResult::Unchanged => RefreshOutcome::Unchanged,
                    WriteResult::Stale => RefreshOutcome::Superseded,
                };
                if manual {
                    self.status.send_modify(|status| status.last_failure = None);
                }
                outcome
            }
            Err(error) => {
                warn!(panel = self.panel, %error, "refresh failed");
                self.alerts.alert(ALERT_TITLE, REFRESH_FAILED_MESSAGE);
                if manual {
                    self.record_failure("refresh", error);
                }
                RefreshOutcome::Failed
            }
        };
        self.status
            .send_modify(|status| status.refreshing = status.refreshing.saturating_sub(1));
        debug!(panel = self.panel, ?outcome, "refresh finished");
        let _ = self.events.send(SyncEvent::Refreshed(outcome));
        outcome
    }

    /// Applies `patch` immediately, then awaits `send`. The optimistic value
    /// stays in place when `send` succeeds.
    pub async fn optimistic_command<F>(
        &self,
        label: impl Into<String>,
        patch: S::Patch,
        send: F,
    ) -> CommandOutcome
    where
        F: Future<Output = Result<(), GatewayError>>,
    {
        let label = label.into();
        let id = self.begin(&label);
        let previous = self.store.get();
        let ticket = self.store.apply_optimistic(&patch);
        debug!(panel = self.panel, command = %id, ?patch, "optimistic write applied");

        match send.await {
            Ok(()) => {
                self.finish(id, &label, CommandPhase::Committed, None);
                CommandOutcome::Committed
            }
            Err(error) => {
                warn!(panel = self.panel, command = %id, %label, %error, "command failed");
                self.alerts
                    .alert(ALERT_TITLE, &format!("Failed to update {label}"));
                self.finish(id, &label, CommandPhase::Failed, Some(error));
                match self.options.failure_policy {
                    FailurePolicy::Resync => {
                        self.resync_or_rollback(ticket, &previous, &patch).await
                    }
                    FailurePolicy::Surface => {
                        self.store.rollback(ticket, &previous, &patch);
                        CommandOutcome::RolledBack
                    }
                }
            }
        }
    }

    /// Awaits `send` and replaces the store with the state it returns. Nothing
    /// is written before the response arrives.
    pub async fn authoritative_command<F>(&self, label: impl Into<String>, send: F) -> CommandOutcome
    where
        F: Future<Output = Result<S, GatewayError>>,
    {
        let label = label.into();
        let id = self.begin(&label);
        let issued = self.store.issue_ticket();

        match send.await {
            Ok(state) => {
                if self.write_authoritative(state, issued) == WriteResult::Stale {
                    info!(panel = self.panel, command = %id, "response superseded by a newer one");
                }
                self.finish(id, &label, CommandPhase::Committed, None);
                CommandOutcome::Committed
            }
            Err(error) => {
                warn!(panel = self.panel, command = %id, %label, %error, "command failed");
                self.alerts.alert(ALERT_TITLE, &format!("Failed to {label}"));
                self.finish(id, &label, CommandPhase::Failed, Some(error));
                match self.options.failure_policy {
                    FailurePolicy::Resync => match self.resync().await {
                        RefreshOutcome::Failed => CommandOutcome::Failed,
                        _ => CommandOutcome::Resynchronized,
                    },
                    FailurePolicy::Surface => CommandOutcome::Failed,
                }
            }
        }
    }

    async fn resync_or_rollback(
        &self,
        ticket: Ticket,
        previous: &S,
        patch: &S::Patch,
    ) -> CommandOutcome {
        match self.resync().await {
            RefreshOutcome::Failed => {
                let restored = self.store.rollback(ticket, previous, patch);
                info!(
                    panel = self.panel,
                    restored = restored.len(),
                    "resync failed; optimistic edits rolled back"
                );
                CommandOutcome::RolledBack
            }
            _ => CommandOutcome::Resynchronized,
        }
    }

    fn write_authoritative(&self, state: S, issued: Ticket) -> WriteResult {
        match self.options.ordering {
            ResponseOrdering::LastResolvedWins => self.store.replace(state),
            ResponseOrdering::Sequenced => self.store.replace_sequenced(state, issued),
        }
    }

    fn begin(&self, label: &str) -> CommandId {
        let id = CommandId(self.next_command.fetch_add(1, Ordering::Relaxed));
        self.status.send_modify(|status| status.in_flight += 1);
        let _ = self.events.send(SyncEvent::Command {
            id,
            label: label.to_string(),
            phase: CommandPhase::Pending,
        });
        id
    }

    fn finish(&self, id: CommandId, label: &str, phase: CommandPhase, error: Option<GatewayError>) {
        self.status.send_modify(|status| {
            status.in_flight = status.in_flight.saturating_sub(1);
            status.last_failure = error.map(|error| SyncFailure {
                command: Some(id),
                label: label.to_string(),
                error,
            });
        });
        let _ = self.events.send(SyncEvent::Command {
            id,
            label: label.to_string(),
            phase,
        });
    }

    fn record_failure(&self, label: &str, error: GatewayError) {
        self.status.send_modify(|status| {
            status.last_failure = Some(SyncFailure {
                command: None,
                label: label.to_string(),
                error,
            });
        });
    }
}
