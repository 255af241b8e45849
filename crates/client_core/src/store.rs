//! In-memory panel state shared with the presentation layer.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tokio::sync::watch;

/// A panel's state record and the shape of its optimistic edits.
pub trait PanelState: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    type Field: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    /// Shallow-merges `patch` into `self`.
    fn merge(&mut self, patch: &Self::Patch);

    fn patched_fields(patch: &Self::Patch) -> Vec<Self::Field>;

    /// Overwrites `field` in `self` with the value held by `source`.
    fn copy_field(&mut self, source: &Self, field: Self::Field);

    /// Brings the record back into its value domain. Runs on every store write.
    fn normalize(&mut self) {}
}

/// Monotonic stamp taken by every write and every outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Changed,
    Unchanged,
    /// A newer authoritative write already landed; nothing was applied.
    Stale,
}

impl WriteResult {
    fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Changed
        } else {
            Self::Unchanged
        }
    }
}

struct Ledger<F> {
    last_ticket: u64,
    optimistic: HashMap<F, Ticket>,
    last_authoritative: Option<Ticket>,
}

impl<F: Copy + Eq + Hash> Ledger<F> {
    fn issue(&mut self) -> Ticket {
        self.last_ticket += 1;
        Ticket(self.last_ticket)
    }
}

pub struct StateStore<S: PanelState> {
    state: watch::Sender<S>,
    ledger: Mutex<Ledger<S::Field>>,
}

impl<S: PanelState> StateStore<S> {
    pub fn new(mut initial: S) -> Self {
        initial.normalize();
        let (state, _) = watch::channel(initial);
        Self {
            state,
            ledger: Mutex::new(Ledger {
                last_ticket: 0,
                optimistic: HashMap::new(),
                last_authoritative: None,
            }),
        }
    }

    pub fn get(&self) -> S {
        self.state.borrow().clone()
    }

    /// Receiver that wakes after every write that changed the state.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// Stamps an outgoing request so its response can be ordered against other writes.
    pub fn issue_ticket(&self) -> Ticket {
        self.ledger().issue()
    }

    /// Ticket of the most recent optimistic write still covering `field`.
    pub fn optimistic_ticket(&self, field: S::Field) -> Option<Ticket> {
        self.ledger().optimistic.get(&field).copied()
    }

    pub fn apply_optimistic(&self, patch: &S::Patch) -> Ticket {
        let mut ledger = self.ledger();
        let ticket = ledger.issue();
        for field in S::patched_fields(patch) {
            ledger.optimistic.insert(field, ticket);
        }
        self.state.send_if_modified(|state| {
            let before = state.clone();
            state.merge(patch);
            state.normalize();
            *state != before
        });
        ticket
    }

    /// Wholesale authoritative replacement; discards every optimistic guess.
    pub fn replace(&self, full: S) -> WriteResult {
        let mut ledger = self.ledger();
        let ticket = ledger.issue();
        ledger.optimistic.clear();
        ledger.last_authoritative = Some(ticket);
        WriteResult::from_changed(self.write(full))
    }

    /// Authoritative replacement ordered by the ticket taken when the request went out.
    ///
    /// Responses older than the last applied authoritative write are dropped.
    /// Fields carrying an optimistic write issued after `issued` keep their
    /// local value.
    pub fn replace_sequenced(&self, full: S, issued: Ticket) -> WriteResult {
        let mut ledger = self.ledger();
        if ledger.last_authoritative.is_some_and(|last| last > issued) {
            return WriteResult::Stale;
        }
        let mut next = full;
        {
            let current = self.state.borrow();
            for (field, ticket) in &ledger.optimistic {
                if *ticket > issued {
                    next.copy_field(&current, *field);
                }
            }
        }
        ledger.optimistic.retain(|_, ticket| *ticket > issued);
        ledger.last_authoritative = Some(issued);
        WriteResult::from_changed(self.write(next))
    }

    /// Restores the fields written under `ticket` from `previous`, skipping any
    /// field that a later write has claimed since. Returns the restored fields.
    pub fn rollback(&self, ticket: Ticket, previous: &S, patch: &S::Patch) -> Vec<S::Field> {
        let mut ledger = self.ledger();
        let restorable: Vec<S::Field> = S::patched_fields(patch)
            .into_iter()
            .filter(|field| ledger.optimistic.get(field) == Some(&ticket))
            .collect();
        if restorable.is_empty() {
            return restorable;
        }
        for field in &restorable {
            ledger.optimistic.remove(field);
        }
        self.state.send_if_modified(|state| {
            let before = state.clone();
            for field in &restorable {
                state.copy_field(previous, *field);
            }
            state.normalize();
            *state != before
        });
        restorable
    }

    fn write(&self, mut next: S) -> bool {
        next.normalize();
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        })
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger<S::Field>> {
        // The ledger holds plain counters; a panic mid-update cannot leave it inconsistent.
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: PanelState + Default> Default for StateStore<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: PanelState> fmt::Debug for StateStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
